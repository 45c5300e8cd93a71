//! Backend API errors.

use thiserror::Error;

/// Errors that can occur when talking to the POS backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The lookup endpoint answered with a non-success status.
    #[error("Product not found (HTTP {status})")]
    NotFound {
        /// HTTP status returned by the backend.
        status: u16,
    },

    /// The backend processed the sale and reported a failure.
    #[error("Sale rejected by backend: {0}")]
    Rejected(String),

    /// HTTP request failed (connection refused, timeout, ...).
    #[error("Backend request failed: {0}")]
    Request(String),

    /// The response body could not be decoded.
    #[error("Backend response error: {0}")]
    Response(String),

    /// An endpoint URL could not be built from the base URL.
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ApiError {
    /// Whether the failure happened below the application protocol, i.e. the
    /// backend never gave a usable answer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Request(_) | Self::Response(_) | Self::InvalidUrl(_) | Self::Client(_)
        )
    }
}
