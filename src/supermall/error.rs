use crate::model::Collection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Item not found: {id} in {collection}")]
    NotFound { collection: Collection, id: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage quota exceeded writing '{key}' ({needed} bytes, {available} available)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        available: usize,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

/// Coarse classification used by callers that branch on failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Storage,
    Usage,
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Io(_)
            | StoreError::Serialization(_)
            | StoreError::QuotaExceeded { .. }
            | StoreError::Store(_) => ErrorKind::Storage,
            StoreError::UnknownCollection(_) | StoreError::InvalidPayload(_) => ErrorKind::Usage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
