//! Configuration for the collector.

use std::path::PathBuf;
use std::time::Duration;

use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, Secret};
use crate::version1::{ParsedConfiguration, CONFIGURATION_FILENAME};

/// The 'Configuration' type collects all the information necessary to run a collection cycle.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which resolves secrets against the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub connection_uri: String,
    pub files: Vec<PathBuf>,
    pub statement_timeout: Duration,
    pub instance_label: Option<String>,
}

/// Resolve a parsed configuration into the runtime configuration.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: &impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = match parsed_config.connection_uri {
        ConnectionUri(Secret::Plain(uri)) => Ok(uri),
        ConnectionUri(Secret::FromEnvironment { variable }) => environment
            .read(&variable)
            .map_err(|error| MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                file_path: CONFIGURATION_FILENAME.into(),
                message: error.to_string(),
            }),
    }?;

    if parsed_config.sql_seconds == 0 {
        return Err(MakeRuntimeConfigurationError::ZeroStatementTimeout);
    }

    Ok(Configuration {
        connection_uri,
        files: parsed_config.files,
        statement_timeout: Duration::from_secs(parsed_config.sql_seconds),
        instance_label: parsed_config.instance_label,
    })
}
