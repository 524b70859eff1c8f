use thiserror::Error;

/// Errors surfaced by backend store implementations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    #[error("not authenticated")]
    Unauthorized,

    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl BackendError {
    /// True when the error means the requested record does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}
