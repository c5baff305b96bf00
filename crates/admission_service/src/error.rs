use std::time::Duration;

use thiserror::Error;

use admission_core::DomainError;

use crate::ports::{BlobError, ProviderError, StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("Payment provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Upload of {field} timed out after {after:?}")]
    UploadTimeout { field: String, after: Duration },

    #[error("Stored document is malformed: {0}")]
    Corrupt(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Domain(DomainError::Validation(vec![message.into()]))
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(e: serde_json::Error) -> Self {
        ServiceError::Corrupt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
