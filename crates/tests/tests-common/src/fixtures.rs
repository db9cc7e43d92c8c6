//! Statement files and configurations for tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlgather_configuration::Configuration;

pub const CONNECTION_URI: &str = "scott/tiger@db.example.com:5432/metrics/metrics1";

/// Write a statement file into `dir` and return its path.
pub fn write_statement_file(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    fs::write(&path, contents).expect("write statement file");
    path
}

/// A runtime configuration for `files` with a ten second statement timeout.
pub fn configuration(files: Vec<PathBuf>) -> Configuration {
    Configuration {
        connection_uri: CONNECTION_URI.to_string(),
        files,
        statement_timeout: Duration::from_secs(10),
        instance_label: None,
    }
}
