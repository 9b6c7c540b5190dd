use crate::storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    /// Rejected before touching storage; nothing was written
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] StorageError),
}

impl MetricsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        MetricsError::InvalidInput(message.into())
    }
}

pub type MetricsResult<T> = Result<T, MetricsError>;
