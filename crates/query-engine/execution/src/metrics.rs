//! Metrics setup and update for the collector itself.

use prometheus::{Histogram, HistogramOpts, IntCounter};

/// The collector's own counters, registered once and shared by every cycle.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub gather_total: IntCounter,
    pub statement_total: IntCounter,
    pub statement_error_total: IntCounter,
    pub statement_timeout_total: IntCounter,
    pub rows_emitted_total: IntCounter,
    pub gather_duration_seconds: Histogram,
}

impl Metrics {
    /// Set up counters and gauges used to produce Prometheus metrics
    pub fn initialize(
        metrics_registry: &mut prometheus::Registry,
    ) -> Result<Self, prometheus::Error> {
        let gather_total = add_int_counter_metric(
            metrics_registry,
            "sqlgather_gather_total",
            "Total collection cycles started.",
        )?;

        let statement_total = add_int_counter_metric(
            metrics_registry,
            "sqlgather_statement_total",
            "Total statements run.",
        )?;

        let statement_error_total = add_int_counter_metric(
            metrics_registry,
            "sqlgather_statement_error_total",
            "Total statements that failed, including timeouts.",
        )?;

        let statement_timeout_total = add_int_counter_metric(
            metrics_registry,
            "sqlgather_statement_timeout_total",
            "Total statements that did not finish within the statement timeout.",
        )?;

        let rows_emitted_total = add_int_counter_metric(
            metrics_registry,
            "sqlgather_rows_emitted_total",
            "Total rows handed to the accumulator.",
        )?;

        let gather_duration_seconds = add_histogram_metric(
            metrics_registry,
            "sqlgather_gather_duration_seconds",
            "Wall-clock duration of a collection cycle, in seconds.",
        )?;

        Ok(Metrics {
            gather_total,
            statement_total,
            statement_error_total,
            statement_timeout_total,
            rows_emitted_total,
            gather_duration_seconds,
        })
    }
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<IntCounter, prometheus::Error> {
    let int_counter =
        IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new histogram metric and register it with the provided Prometheus Registry
fn add_histogram_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<Histogram, prometheus::Error> {
    let histogram = Histogram::with_opts(HistogramOpts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(histogram.clone()))?;
    Ok(histogram)
}
