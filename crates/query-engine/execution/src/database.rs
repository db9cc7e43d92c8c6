//! The database as seen by the execution engine.
//!
//! A [`Connect`] opens one [`Connection`] per collection cycle. The connection is shared by
//! every statement task of that cycle, so queries go through `&self`.

use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlgather_configuration::ConnectionIdentity;
use thiserror::Error;

use crate::value::ColumnValue;

/// One scanned row; `None` is SQL NULL. Values line up with [`QueryRows::columns`].
pub type ScannedRow = Vec<Option<ColumnValue>>;

/// The rows of a statement, streamed in the order the database returns them.
pub type RowStream = BoxStream<'static, Result<ScannedRow, DatabaseError>>;

/// A submitted statement: its column names and its rows.
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: RowStream,
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("invalid connection parameter {parameter}: {message}")]
    InvalidConnectionParameter { parameter: String, message: String },
    #[error("{0}")]
    Postgres(#[from] tokio_postgres::Error),
    #[error("unable to decode column {column}: {message}")]
    Decode { column: String, message: String },
    #[error("{0}")]
    Other(String),
}

/// Opens connections.
#[async_trait]
pub trait Connect: Send + Sync {
    type Connection: Connection;

    async fn connect(&self, identity: &ConnectionIdentity)
        -> Result<Self::Connection, DatabaseError>;
}

/// An open connection that can run several queries at once.
#[async_trait]
pub trait Connection: Send + Sync + Sized + 'static {
    /// Submit a statement. Rows are scanned lazily as the stream is polled.
    async fn query(&self, sql: &str) -> Result<QueryRows, DatabaseError>;

    /// Close the connection once every statement is done with it.
    async fn close(self);
}
