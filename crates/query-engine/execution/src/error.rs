//! Errors produced while running a statement.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::convert::ConvertError;
use crate::database::DatabaseError;

/// Where a statement ran, used to label every failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementLabel {
    pub host: String,
    pub instance: String,
    pub name: String,
}

impl fmt::Display for StatementLabel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "host={} instance={} func={}",
            self.host, self.instance, self.name
        )
    }
}

/// A single statement failed. Sibling statements are unaffected.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("gather {label} error, {source}")]
    Query {
        label: StatementLabel,
        #[source]
        source: DatabaseError,
    },
    #[error("gather {label} scan error, {source}")]
    Scan {
        label: StatementLabel,
        #[source]
        source: DatabaseError,
    },
    #[error("gather {label} parse row error, {source}")]
    Convert {
        label: StatementLabel,
        #[source]
        source: ConvertError,
    },
    #[error("gather {label} timeout after {}s", timeout.as_secs_f64())]
    Timeout {
        label: StatementLabel,
        timeout: Duration,
    },
    #[error("gather {label} aborted, {message}")]
    Aborted {
        label: StatementLabel,
        message: String,
    },
}

impl StatementError {
    pub fn label(&self) -> &StatementLabel {
        match self {
            StatementError::Query { label, .. }
            | StatementError::Scan { label, .. }
            | StatementError::Convert { label, .. }
            | StatementError::Timeout { label, .. }
            | StatementError::Aborted { label, .. } => label,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, StatementError::Timeout { .. })
    }
}
