//! An accumulator that keeps every metric in memory.

use std::sync::{Mutex, PoisonError};

use query_engine_execution::accumulator::Accumulator;
use query_engine_execution::value::{Fields, Tags};

/// One emitted row.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub measurement: String,
    pub fields: Fields,
    pub tags: Tags,
}

#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    metrics: Mutex<Vec<Metric>>,
}

impl MemoryAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, in emission order.
    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rows emitted by the statement called `name`.
    pub fn for_statement(&self, name: &str) -> Vec<Metric> {
        self.metrics()
            .into_iter()
            .filter(|metric| metric.tags.get("func").map(String::as_str) == Some(name))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_fields(&self, measurement: &str, fields: Fields, tags: Tags) {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Metric {
                measurement: measurement.to_string(),
                fields,
                tags,
            });
    }
}
