//! Chain client errors.

use thiserror::Error;

/// Errors that can occur when talking to the chain service.
#[derive(Debug, Error)]
pub enum ChainError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured base URL cannot carry a path.
    #[error("invalid chain service url: {0}")]
    InvalidUrl(String),

    /// The service returned a non-2xx, non-404 response.
    #[error("unexpected response from chain service: {0}")]
    UnexpectedResponse(String),
}
