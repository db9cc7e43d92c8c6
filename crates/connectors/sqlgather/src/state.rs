//! Long-lived state used by the collector.
//!
//! This is initialized on startup.

use thiserror::Error;

use query_engine_execution::metrics;
use sqlgather_configuration::{Configuration, ConnectionIdentity, IdentityError};

/// State for our collector.
#[derive(Debug, Clone)]
pub struct State {
    pub metrics: metrics::Metrics,
    pub identity: ConnectionIdentity,
}

/// Derive the connection identity and register metrics.
///
/// A connection URI that does not have the expected shape is an initialization error: no
/// statement can be tagged without it.
pub fn create_state(
    configuration: &Configuration,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let identity = ConnectionIdentity::parse(&configuration.connection_uri)?
        .with_instance_label(configuration.instance_label.as_deref());

    let metrics = metrics::Metrics::initialize(metrics_registry)
        .map_err(InitializationError::MetricsError)?;

    Ok(State { metrics, identity })
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
    #[error("{0}")]
    Identity(#[from] IdentityError),
}
