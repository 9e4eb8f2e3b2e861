use thiserror::Error;

/// Errors emitted while aggregating a batch of records.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("malformed record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("invalid zone policy: {0}")]
    InvalidZone(String),
    #[error("invalid window: {0}")]
    InvalidWindow(String),
}

impl AggregateError {
    pub(crate) fn malformed(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregateError>;
