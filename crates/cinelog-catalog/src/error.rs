use thiserror::Error;

/// Errors produced while talking to the remote catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No bearer token configured; nothing was sent.
    #[error("TMDB_TOKEN is not set")]
    MissingToken,

    /// The catalog has no such title.
    #[error("Title not found in catalog")]
    NotFound,

    /// The catalog answered with a non-success status.
    #[error("Catalog responded with HTTP {0}")]
    Status(u16),

    /// Transport or body decoding failure.
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Rejected before sending (e.g. blank search query).
    #[error("Invalid catalog request: {0}")]
    InvalidRequest(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CatalogError>;
