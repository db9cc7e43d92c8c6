//! The statement catalog and its file format.
//!
//! A statement file is a sequence of records separated by `;;`. Each record is
//! `name::SQL`, with surrounding whitespace trimmed from both halves. Several records may
//! share a name, in which case every statement runs under that name. A name starting with `#`
//! disables every statement registered under it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

pub const RECORD_SEPARATOR: &str = ";;";
pub const NAME_SEPARATOR: &str = "::";
pub const DISABLED_PREFIX: &str = "#";

/// Statement bodies grouped by statement name, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementCatalog(pub BTreeMap<String, Vec<String>>);

impl StatementCatalog {
    pub fn empty() -> Self {
        StatementCatalog(BTreeMap::new())
    }

    /// Add every record found in `contents`.
    ///
    /// Records that are not `name::SQL` are logged and skipped, as are records with an empty
    /// name or body.
    pub fn extend_from_str(&mut self, contents: &str) {
        for record in contents.split(RECORD_SEPARATOR) {
            if record.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = record.split(NAME_SEPARATOR).collect();
            let [name, body] = parts.as_slice() else {
                tracing::info!(statement = record, "statement format error");
                continue;
            };

            let (name, body) = (name.trim(), body.trim());
            if name.is_empty() || body.is_empty() {
                continue;
            }

            self.0
                .entry(name.to_string())
                .or_default()
                .push(body.to_string());
        }
    }

    /// Drop every entry whose name marks it as disabled.
    pub fn remove_disabled(&mut self) {
        self.0.retain(|name, _| !name.starts_with(DISABLED_PREFIX));
    }

    /// Every (name, SQL) pair in the catalog.
    pub fn statements(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|(name, bodies)| {
            bodies
                .iter()
                .map(move |body| (name.as_str(), body.as_str()))
        })
    }

    /// Total number of statements across all names.
    pub fn statement_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A statement file could not be read.
#[derive(Debug, Error)]
#[error("unable to read statement file {}: {source}", path.display())]
pub struct FileReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The result of reading every statement file.
///
/// Files that could not be read do not stop the others from loading.
#[derive(Debug, Default)]
pub struct LoadedCatalog {
    pub catalog: StatementCatalog,
    pub errors: Vec<FileReadError>,
}

/// Read each file in order and build a fresh catalog from their contents.
pub async fn load_catalog(files: &[impl AsRef<Path>]) -> LoadedCatalog {
    let mut catalog = StatementCatalog::empty();
    let mut errors = Vec::with_capacity(files.len());

    for file in files {
        let path = file.as_ref();
        match fs::read_to_string(path).await {
            Ok(contents) => catalog.extend_from_str(&contents),
            Err(source) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "unable to read statement file"
                );
                errors.push(FileReadError {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    // disabling is by name, across all files
    catalog.remove_disabled();

    LoadedCatalog { catalog, errors }
}
