use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument, warn};

use super::{parse_transactions, SourceReader};
use crate::error::ExtractionError;
use crate::types::RawTransaction;

/// Fetches the transaction file over HTTP, either from a plain URL or from a
/// bucket/key pair resolved path-style against an object-store endpoint.
pub struct ObjectStoreReader {
    client: reqwest::Client,
    url: String,
    token: Option<String>,
}

impl ObjectStoreReader {
    pub fn new(
        url: impl Into<String>,
        token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    pub fn for_object(
        endpoint: &str,
        bucket: &str,
        key: &str,
        token: Option<String>,
        timeout_seconds: u64,
    ) -> Result<Self, ExtractionError> {
        Self::new(object_url(endpoint, bucket, key), token, timeout_seconds)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

pub fn object_url(endpoint: &str, bucket: &str, key: &str) -> String {
    format!(
        "{}/{}/{}",
        endpoint.trim_end_matches('/'),
        bucket,
        key.trim_start_matches('/')
    )
}

#[async_trait]
impl SourceReader for ObjectStoreReader {
    fn location(&self) -> String {
        self.url.clone()
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn read(&self) -> Result<Vec<RawTransaction>, ExtractionError> {
        info!("Extracting transactions from object store");
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Object store responded with status {}", status.as_u16());
            return Err(ExtractionError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().await?;
        let rows = parse_transactions(&bytes)?;
        info!("Extracted {} transactions", rows.len());
        Ok(rows)
    }
}
