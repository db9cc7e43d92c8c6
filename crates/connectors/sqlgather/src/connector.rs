//! The collection entry point.
//!
//! Each call to [`Gatherer::gather`] builds a fresh statement catalog, opens one connection,
//! runs every statement concurrently, closes the connection and reports every failure at once.
//! Calls never overlap: a second call waits until the first one has finished.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info_span, Instrument};

use query_engine_execution::accumulator::Accumulator;
use query_engine_execution::database::{Connect, Connection};
use query_engine_execution::engine::{execute_catalog, ExecutionContext};
use query_engine_execution::metrics::Metrics;
use query_engine_execution::postgres::Postgres;
use query_engine_metadata::metadata::{load_catalog, LoadedCatalog};
use sqlgather_configuration::{Configuration, ConnectionIdentity};

use crate::error::{GatherError, MultiError};
use crate::state::{self, InitializationError, State};

/// Where an invocation currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LoadingCatalog,
    Connecting,
    Executing,
    Closed,
}

/// Runs collection cycles against one database instance.
pub struct Gatherer<D: Connect = Postgres> {
    configuration: Arc<Configuration>,
    state: State,
    database: D,
    phase: Mutex<Phase>,
}

impl Gatherer<Postgres> {
    /// Create a collector for a PostgreSQL database.
    pub fn new(
        configuration: Configuration,
        metrics_registry: &mut prometheus::Registry,
    ) -> Result<Self, InitializationError> {
        Self::with_database(configuration, Postgres, metrics_registry)
    }
}

impl<D: Connect> Gatherer<D> {
    pub fn with_database(
        configuration: Configuration,
        database: D,
        metrics_registry: &mut prometheus::Registry,
    ) -> Result<Self, InitializationError> {
        let state = state::create_state(&configuration, metrics_registry)?;
        Ok(Gatherer {
            configuration: Arc::new(configuration),
            state,
            database,
            phase: Mutex::new(Phase::Idle),
        })
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.state.identity
    }

    pub fn metrics(&self) -> &Metrics {
        &self.state.metrics
    }

    /// Run one collection cycle, emitting rows into `accumulator`.
    pub async fn gather(&self, accumulator: Arc<dyn Accumulator>) -> Result<(), GatherError> {
        let mut phase = self.phase.lock().await;

        let metrics = &self.state.metrics;
        metrics.gather_total.inc();
        let timer = metrics.gather_duration_seconds.start_timer();

        let result = self
            .run_cycle(&mut *phase, accumulator)
            .instrument(info_span!("gather", host = %self.state.identity.host))
            .await;

        timer.observe_duration();
        transition(&mut *phase, Phase::Idle);
        result
    }

    async fn run_cycle(
        &self,
        phase: &mut Phase,
        accumulator: Arc<dyn Accumulator>,
    ) -> Result<(), GatherError> {
        transition(phase, Phase::LoadingCatalog);
        let LoadedCatalog {
            catalog,
            errors: file_errors,
        } = load_catalog(&self.configuration.files)
            .instrument(info_span!("Load statement catalog"))
            .await;

        transition(phase, Phase::Connecting);
        let connection = match self
            .database
            .connect(&self.state.identity)
            .instrument(info_span!("Connect"))
            .await
        {
            Ok(connection) => Arc::new(connection),
            Err(source) => {
                return Err(GatherError::Connect {
                    host: self.state.identity.host.clone(),
                    source,
                    files: file_errors,
                })
            }
        };

        transition(phase, Phase::Executing);
        let context = ExecutionContext {
            identity: Arc::new(self.state.identity.clone()),
            accumulator,
            metrics: self.state.metrics.clone(),
            statement_timeout: self.configuration.statement_timeout,
        };
        let outcomes = execute_catalog(&connection, &catalog, &context)
            .instrument(info_span!(
                "Execute statements",
                statements = catalog.statement_count()
            ))
            .await;

        // every statement task has been joined, so this is the last handle
        match Arc::try_unwrap(connection) {
            Ok(connection) => connection.close().await,
            Err(_) => tracing::warn!("connection still in use after all statements finished"),
        }
        transition(phase, Phase::Closed);

        let errors = MultiError {
            files: file_errors,
            statements: outcomes.into_iter().filter_map(Result::err).collect(),
        };
        if errors.is_empty() {
            Ok(())
        } else {
            Err(GatherError::Collection(errors))
        }
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    tracing::debug!(from = ?*phase, to = ?next, "phase transition");
    *phase = next;
}
