//! Ledger error types

/// Ledger error types
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("No points entry for key: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl LedgerError {
    /// Whether this is the typed not-found condition (as opposed to a
    /// storage or codec failure).
    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
