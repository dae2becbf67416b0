use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharedError {
    #[error("Unknown media type: {0}")]
    UnknownMediaType(String),

    #[error("Unknown watch status: {0}")]
    UnknownWatchStatus(String),
}
