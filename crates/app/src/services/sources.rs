use std::path::{Path, PathBuf};
use std::time::Duration;

use aggregate::parse_records;
use async_trait::async_trait;
use metrics_core::EventRecord;
use tracing::debug;

use crate::error::{AppError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where raw event batches come from.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    fn describe(&self) -> String;

    async fn fetch(&self) -> Result<Vec<EventRecord>>;
}

#[derive(Clone, Debug)]
pub struct HttpSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSource {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("metrics-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl MetricsSource for HttpSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<EventRecord>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        let body = response.text().await?;
        debug!(url = %self.url, bytes = body.len(), "fetched metrics payload");
        Ok(parse_records(&body)?)
    }
}

/// Reads a `metrics.json` snapshot from disk on every fetch.
#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MetricsSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch(&self) -> Result<Vec<EventRecord>> {
        let body = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_records(&body)?)
    }
}
