//! Test doubles and helpers shared by the integration tests.

pub mod accumulator;
pub mod database;
pub mod deployment;
pub mod fixtures;

/// Route `tracing` output through `env_logger` so `RUST_LOG` works in tests.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
