//! Errors reported by a collection cycle.

use std::fmt;

use query_engine_execution::database::DatabaseError;
use query_engine_execution::error::StatementError;
use query_engine_metadata::metadata::FileReadError;
use thiserror::Error;

/// Why a collection cycle reported failure.
///
/// Rows may already have been emitted even when a cycle fails.
#[derive(Debug, Error)]
pub enum GatherError {
    #[error("unable to connect to host={host}: {source}{}", FileErrors(files))]
    Connect {
        host: String,
        #[source]
        source: DatabaseError,
        /// Statement files that could not be read before connecting.
        files: Vec<FileReadError>,
    },
    #[error("{0}")]
    Collection(MultiError),
}

/// Every failure of a cycle: unreadable statement files and failed statements.
#[derive(Debug, Default)]
pub struct MultiError {
    pub files: Vec<FileReadError>,
    pub statements: Vec<StatementError>,
}

impl MultiError {
    pub fn len(&self) -> usize {
        self.files.len() + self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn timeouts(&self) -> usize {
        self.statements
            .iter()
            .filter(|error| error.is_timeout())
            .count()
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} collection errors:", self.len())?;
        write!(f, "{}", FileErrors(&self.files))?;
        for error in &self.statements {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

/// Renders file errors as indented lines, or nothing.
struct FileErrors<'a>(&'a [FileReadError]);

impl fmt::Display for FileErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for error in self.0 {
            write!(f, "\n  {error}")?;
        }
        Ok(())
    }
}
