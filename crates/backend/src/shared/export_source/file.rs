use async_trait::async_trait;
use std::path::PathBuf;

use super::{ExportSource, SourceError};

/// Reads the export from a local file (offline runs, fixtures)
pub struct FileExportSource {
    path: PathBuf,
}

impl FileExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ExportSource for FileExportSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        if text.trim().is_empty() {
            return Err(SourceError::EmptyPayload);
        }
        Ok(text)
    }
}
