use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("You have already applied this form. Check in your profile page.")]
    AlreadySubmitted,

    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("Upload rejected: {0}")]
    Upload(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
