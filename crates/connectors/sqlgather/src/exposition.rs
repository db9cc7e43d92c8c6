//! Prometheus text exposition of the collector's own metrics.

use std::path::{Path, PathBuf};

use prometheus::{Encoder, Registry, TextEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpositionError {
    #[error("unable to encode metrics: {0}")]
    Encode(#[from] prometheus::Error),
    #[error("encoded metrics are not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("unable to write metrics file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every metric in `registry`, in the Prometheus text format.
pub fn metrics_text(registry: &Registry) -> Result<String, ExpositionError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Replace `path` with the current metrics.
///
/// The file is written next to `path` and renamed over it, so a reader never sees a partial file.
pub async fn write_metrics_file(registry: &Registry, path: &Path) -> Result<(), ExpositionError> {
    let text = metrics_text(registry)?;

    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = PathBuf::from(staging);

    tokio::fs::write(&staging, text)
        .await
        .map_err(|source| ExpositionError::Io {
            path: staging.clone(),
            source,
        })?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|source| ExpositionError::Io {
            path: path.to_path_buf(),
            source,
        })
}
