use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached
    #[error("connection error: {0}")]
    Connection(String),

    /// The backing store rejected or failed the command
    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}
