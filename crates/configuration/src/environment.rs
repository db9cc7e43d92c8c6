//! Access to the environment the configuration is resolved against.

use std::collections::HashMap;

/// Somewhere to look up variables referenced by the configuration.
pub trait Environment {
    fn read(&self, variable: &str) -> Result<String, Error>;
}

/// Variables set on the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn read(&self, variable: &str) -> Result<String, Error> {
        std::env::var(variable).map_err(|_| Error::NonExistentVariable(variable.to_string()))
    }
}

impl Environment for HashMap<String, String> {
    fn read(&self, variable: &str) -> Result<String, Error> {
        self.get(variable)
            .cloned()
            .ok_or_else(|| Error::NonExistentVariable(variable.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the environment variable {0} is not set")]
    NonExistentVariable(String),
}
