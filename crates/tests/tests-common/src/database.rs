//! A scripted database.
//!
//! Every statement is looked up by its exact SQL text; SQL that was not scripted fails with a
//! query error. Delays use `tokio::time`, so tests can run with a paused clock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use query_engine_execution::database::{
    Connect, Connection, DatabaseError, QueryRows, ScannedRow,
};
use query_engine_execution::value::ColumnValue;
use sqlgather_configuration::ConnectionIdentity;

/// How one SQL text behaves.
#[derive(Debug, Clone, Default)]
pub struct FakeStatement {
    pub columns: Vec<String>,
    pub rows: Vec<Result<ScannedRow, String>>,
    /// Time before the columns are known.
    pub delay: Duration,
    /// Time before each row.
    pub row_delay: Duration,
    /// Fail at submission with this message.
    pub error: Option<String>,
}

impl FakeStatement {
    pub fn returning(columns: &[&str], rows: Vec<ScannedRow>) -> Self {
        FakeStatement {
            columns: columns.iter().map(|column| (*column).to_string()).collect(),
            rows: rows.into_iter().map(Ok).collect(),
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        FakeStatement {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Fail while scanning, after the rows scripted so far.
    pub fn then_fail_scan(mut self, message: &str) -> Self {
        self.rows.push(Err(message.to_string()));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_row_delay(mut self, row_delay: Duration) -> Self {
        self.row_delay = row_delay;
        self
    }
}

/// A single-column integer row.
pub fn integer_row(value: i64) -> ScannedRow {
    vec![Some(ColumnValue::Integer(value))]
}

/// Connection bookkeeping, shared between a [`FakeDatabase`] and the test.
#[derive(Debug, Default)]
pub struct ConnectionCounters {
    opened: AtomicUsize,
    closed: AtomicUsize,
    open: AtomicUsize,
    max_open: AtomicUsize,
}

impl ConnectionCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// The most connections that were ever open at the same time.
    pub fn max_open(&self) -> usize {
        self.max_open.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeDatabase {
    statements: Arc<HashMap<String, FakeStatement>>,
    connect_error: Option<String>,
    counters: Arc<ConnectionCounters>,
}

impl FakeDatabase {
    pub fn new<'a>(statements: impl IntoIterator<Item = (&'a str, FakeStatement)>) -> Self {
        FakeDatabase {
            statements: Arc::new(
                statements
                    .into_iter()
                    .map(|(sql, statement)| (sql.to_string(), statement))
                    .collect(),
            ),
            ..Self::default()
        }
    }

    /// A database that refuses every connection.
    pub fn unreachable(message: &str) -> Self {
        FakeDatabase {
            connect_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn counters(&self) -> Arc<ConnectionCounters> {
        Arc::clone(&self.counters)
    }
}

#[async_trait]
impl Connect for FakeDatabase {
    type Connection = FakeConnection;

    async fn connect(&self, _identity: &ConnectionIdentity) -> Result<FakeConnection, DatabaseError> {
        if let Some(message) = &self.connect_error {
            return Err(DatabaseError::Other(message.clone()));
        }

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        let open = self.counters.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_open.fetch_max(open, Ordering::SeqCst);

        Ok(FakeConnection {
            statements: Arc::clone(&self.statements),
            counters: Arc::clone(&self.counters),
        })
    }
}

pub struct FakeConnection {
    statements: Arc<HashMap<String, FakeStatement>>,
    counters: Arc<ConnectionCounters>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError> {
        let Some(statement) = self.statements.get(sql).cloned() else {
            return Err(DatabaseError::Other(format!("unknown statement: {sql}")));
        };

        tokio::time::sleep(statement.delay).await;
        if let Some(message) = statement.error {
            return Err(DatabaseError::Other(message));
        }

        let row_delay = statement.row_delay;
        let rows = futures::stream::iter(statement.rows)
            .then(move |row| async move {
                tokio::time::sleep(row_delay).await;
                row.map_err(DatabaseError::Other)
            })
            .boxed();

        Ok(QueryRows {
            columns: statement.columns,
            rows,
        })
    }

    async fn close(self) {
        self.counters.open.fetch_sub(1, Ordering::SeqCst);
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}
