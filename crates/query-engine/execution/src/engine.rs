//! Run every statement of a catalog concurrently against one connection.
//!
//! Each statement gets its own task and its own deadline. A statement that fails or times out
//! produces an error outcome; it never stops its siblings. When a deadline passes, the engine
//! stops reading that statement's rows, but the query itself is not cancelled on the server:
//! cancelling through a connection shared by several statements could cancel the wrong one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use query_engine_metadata::metadata::StatementCatalog;
use sqlgather_configuration::ConnectionIdentity;
use tokio::task::JoinSet;
use tracing::{info_span, Instrument};

use crate::accumulator::{Accumulator, FUNC_TAG, MEASUREMENT};
use crate::convert::convert_row;
use crate::database::{Connection, QueryRows};
use crate::error::{StatementError, StatementLabel};
use crate::metrics::Metrics;

/// Everything a statement task needs besides the connection.
#[derive(Clone)]
pub struct ExecutionContext {
    pub identity: Arc<ConnectionIdentity>,
    pub accumulator: Arc<dyn Accumulator>,
    pub metrics: Metrics,
    pub statement_timeout: Duration,
}

impl ExecutionContext {
    fn label(&self, name: &str) -> StatementLabel {
        StatementLabel {
            host: self.identity.host.clone(),
            instance: self.identity.instance.clone(),
            name: name.to_string(),
        }
    }
}

/// The outcome of one statement: the number of rows emitted, or why it failed.
pub type StatementOutcome = Result<u64, StatementError>;

/// Run every statement in the catalog and wait for all of them.
///
/// Exactly one outcome is returned per statement, in completion order.
pub async fn execute_catalog<C: Connection>(
    connection: &Arc<C>,
    catalog: &StatementCatalog,
    context: &ExecutionContext,
) -> Vec<StatementOutcome> {
    let expected = catalog.statement_count();
    let mut outcomes = Vec::with_capacity(expected);
    let mut tasks = JoinSet::new();
    let mut names = HashMap::with_capacity(expected);

    for (name, sql) in catalog.statements() {
        let connection = Arc::clone(connection);
        let context = context.clone();
        let name = name.to_string();
        let sql = sql.to_string();
        let span = info_span!("statement", name = %name);

        let task_name = name.clone();
        let handle = tasks.spawn(
            async move { execute_with_timeout(connection.as_ref(), &task_name, &sql, &context).await }
                .instrument(span),
        );
        names.insert(handle.id(), name);
    }

    while let Some(joined) = tasks.join_next().await {
        let outcome = joined.unwrap_or_else(|join_error| {
            let name = names.remove(&join_error.id()).unwrap_or_default();
            Err(StatementError::Aborted {
                label: context.label(&name),
                message: join_error.to_string(),
            })
        });
        record_outcome(&outcome, &context.metrics);
        outcomes.push(outcome);
    }

    debug_assert_eq!(outcomes.len(), expected);
    outcomes
}

/// Race one statement against its deadline.
async fn execute_with_timeout<C: Connection>(
    connection: &C,
    name: &str,
    sql: &str,
    context: &ExecutionContext,
) -> StatementOutcome {
    match tokio::time::timeout(
        context.statement_timeout,
        execute_statement(connection, name, sql, context),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(StatementError::Timeout {
            label: context.label(name),
            timeout: context.statement_timeout,
        }),
    }
}

/// Submit one statement and emit each of its rows as it arrives.
///
/// A row that cannot be scanned or converted stops the statement; rows already emitted stay
/// emitted.
pub async fn execute_statement<C: Connection>(
    connection: &C,
    name: &str,
    sql: &str,
    context: &ExecutionContext,
) -> StatementOutcome {
    let QueryRows { columns, mut rows } =
        connection
            .query(sql)
            .await
            .map_err(|source| StatementError::Query {
                label: context.label(name),
                source,
            })?;

    let mut emitted = 0;
    while let Some(row) = rows.next().await {
        let values = row.map_err(|source| StatementError::Scan {
            label: context.label(name),
            source,
        })?;

        let (mut tags, fields) = convert_row(&columns, values, &context.identity).map_err(
            |source| StatementError::Convert {
                label: context.label(name),
                source,
            },
        )?;

        tags.insert(FUNC_TAG.to_string(), name.to_string());
        context.accumulator.add_fields(MEASUREMENT, fields, tags);
        context.metrics.rows_emitted_total.inc();
        emitted += 1;
    }

    Ok(emitted)
}

fn record_outcome(outcome: &StatementOutcome, metrics: &Metrics) {
    metrics.statement_total.inc();
    match outcome {
        Ok(rows) => tracing::debug!(rows, "statement finished"),
        Err(error) => {
            metrics.statement_error_total.inc();
            if error.is_timeout() {
                metrics.statement_timeout_total.inc();
            }
            tracing::error!(
                statement = %error.label().name,
                error = %error,
                "statement failed"
            );
        }
    }
}
