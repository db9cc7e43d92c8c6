//! Concurrent execution of catalog statements against a database.
//!
//! Every statement runs in its own task, bounded by a per-statement timeout. Result rows are
//! converted into tags and fields and handed to an [`accumulator::Accumulator`] as they stream
//! in.

pub mod accumulator;
pub mod convert;
pub mod database;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod postgres;
pub mod value;
