use thiserror::Error;

/// Result type alias shared by the store and engine crates.
pub type Result<T> = std::result::Result<T, UjamaaError>;

#[derive(Error, Debug)]
pub enum UjamaaError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown member: {0}")]
    UnknownMember(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
