use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("fetch error: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("endpoint {url} answered {status}")]
    Status { status: u16, url: String },
    #[error("aggregate error: {0}")]
    Aggregate(#[from] aggregate::AggregateError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    InvalidInput(String),
    #[error("render error: {0}")]
    Render(String),
}

impl AppError {
    /// Transport-level failures; the previous view stays on screen.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Status { .. } | Self::Io(_))
    }

    pub fn is_malformed_batch(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
