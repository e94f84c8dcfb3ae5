use async_trait::async_trait;
use std::time::Duration;

use super::{ExportSource, SourceError};

/// Клиент для получения CSV-выгрузки по HTTP
pub struct HttpExportSource {
    url: String,
    client: reqwest::Client,
}

impl HttpExportSource {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl ExportSource for HttpExportSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "text/csv")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Err(SourceError::EmptyPayload);
        }

        tracing::debug!("Fetched {} bytes from {}", text.len(), self.url);
        Ok(text)
    }
}
