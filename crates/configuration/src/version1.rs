//! The version 1 configuration file format.

use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::ParseConfigurationError;
use crate::values::{ConnectionUri, Secret};

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const DEFAULT_CONNECTION_URI_VARIABLE: &str = "SQLGATHER_CONNECTION_URI";
pub const DEFAULT_STATEMENT_FILE: &str = "default.sql";
pub const DEFAULT_SQL_SECONDS: u64 = 10;

/// Initial configuration, as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    /// Connection string in the form `user/password@host:port/service/instance`.
    /// Every emitted metric is tagged with its host, port, service and instance.
    pub connection_uri: ConnectionUri,
    /// Statement definition files, relative to the configuration directory.
    /// Each file holds records of the form `name::SQL;;`. Names starting with `#` are ignored.
    #[serde(default = "default_files")]
    pub files: Vec<PathBuf>,
    /// Maximum number of seconds a single statement may run.
    #[serde(default = "default_sql_seconds")]
    pub sql_seconds: u64,
    /// Fixed label used for the `orainstance` tag instead of the instance in the connection URI.
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_label: Option<String>,
}

fn default_files() -> Vec<PathBuf> {
    vec![PathBuf::from(DEFAULT_STATEMENT_FILE)]
}

fn default_sql_seconds() -> u64 {
    DEFAULT_SQL_SECONDS
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            connection_uri: ConnectionUri(Secret::FromEnvironment {
                variable: DEFAULT_CONNECTION_URI_VARIABLE.into(),
            }),
            files: default_files(),
            sql_seconds: DEFAULT_SQL_SECONDS,
            instance_label: None,
        }
    }
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents = fs::read_to_string(&configuration_file)
        .await
        .map_err(|source| ParseConfigurationError::IoError {
            file_path: configuration_file.clone(),
            source,
        })?;

    let mut parsed_config: ParsedConfiguration =
        serde_json::from_str(&configuration_file_contents).map_err(|error| {
            ParseConfigurationError::ParseError {
                file_path: configuration_file.clone(),
                line: error.line(),
                column: error.column(),
                message: error.to_string(),
            }
        })?;

    if parsed_config.version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion {
            file_path: configuration_file,
            version: parsed_config.version,
        });
    }

    if let ConnectionUri(Secret::Plain(uri)) = &parsed_config.connection_uri {
        if uri.trim().is_empty() {
            return Err(ParseConfigurationError::EmptyConnectionUri {
                file_path: configuration_file,
            });
        }
    }

    // statement files are relative to the configuration directory
    for file in &mut parsed_config.files {
        if file.is_relative() {
            *file = configuration_dir.as_ref().join(&*file);
        }
    }

    Ok(parsed_config)
}

/// The sample configuration file, with the connection URI read from the environment.
pub fn sample_configuration() -> Result<String, serde_json::Error> {
    let sample = serde_json::to_string_pretty(&ParsedConfiguration::initial())?;
    Ok(sample + "\n")
}
