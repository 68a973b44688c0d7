use thiserror::Error;

#[derive(Debug, Error)]
pub enum InboxError {
    /// A targeted update or lookup matched no row. Collection reads never
    /// produce this; they return empty vectors.
    #[error("not found")]
    NotFound,

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] anyhow::Error),

    #[error("malformed timestamp '{raw}'")]
    MalformedTimestamp { raw: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, InboxError>;
