pub mod file;
pub mod http;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::shared::config::{resolve_source_path, SourceConfig};

pub use file::FileExportSource;
pub use http::HttpExportSource;

/// Ошибки получения выгрузки
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Export endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Cannot read export file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Export payload is empty")]
    EmptyPayload,
}

/// Трейт для источника CSV-выгрузки
#[async_trait]
pub trait ExportSource: Send + Sync {
    /// Human-readable location, used in logs
    fn describe(&self) -> String;

    /// Fetch the current payload text
    async fn fetch(&self) -> Result<String, SourceError>;
}

/// Builds the source named in `[source]`; a file path takes precedence over a URL.
pub fn from_config(config: &SourceConfig) -> anyhow::Result<Arc<dyn ExportSource>> {
    if let Some(path) = &config.path {
        let resolved = resolve_source_path(path);
        tracing::info!("Export source: file {}", resolved.display());
        return Ok(Arc::new(FileExportSource::new(resolved)));
    }

    match &config.url {
        Some(url) => {
            tracing::info!("Export source: {}", url);
            let source = HttpExportSource::new(
                url.clone(),
                Duration::from_secs(config.request_timeout_seconds),
            )?;
            Ok(Arc::new(source))
        }
        None => anyhow::bail!("no export source configured"),
    }
}
