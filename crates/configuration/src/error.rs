//! Errors that can occur while reading and interpreting the configuration.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("empty connection URI in {file_path}")]
    EmptyConnectionUri { file_path: PathBuf },
    #[error("unsupported configuration version {version} in {file_path}")]
    UnsupportedVersion { file_path: PathBuf, version: u32 },
    #[error("I/O error on {file_path}: {source}")]
    IoError {
        file_path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("invalid connection URI: {message}")]
    MissingEnvironmentVariable { file_path: PathBuf, message: String },
    #[error("sqlSeconds must be greater than zero")]
    ZeroStatementTimeout,
}

/// The connection URI does not have the `user/password@host:port/service/instance` shape.
///
/// Every statement is tagged with the identity derived from the URI, so there is nothing useful
/// the collector can do without it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("connection uri {uri} config error: expected exactly one '@'")]
    MissingAt { uri: String },
    #[error("connection uri {uri} {segment} config error: expected user/password")]
    MalformedCredentials { uri: String, segment: String },
    #[error("connection uri {uri} {segment} config error: expected host:port/service/instance")]
    MalformedAddress { uri: String, segment: String },
    #[error("connection uri {uri} {segment} config error: expected port/service/instance")]
    MalformedTarget { uri: String, segment: String },
    #[error("connection uri {uri} config error: host is empty")]
    EmptyHost { uri: String },
}
