//! A collector that runs named SQL statements against one database instance and turns every
//! result row into a metric.
//!
//! A [`connector::Gatherer`] is created once at startup and its `gather` entry point is called
//! once per collection interval.

pub mod connector;
pub mod error;
pub mod exposition;
pub mod line_protocol;
pub mod state;
