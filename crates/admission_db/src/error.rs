use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Stored document is malformed: {0}")]
    Document(String),
}

pub type Result<T> = std::result::Result<T, Error>;
