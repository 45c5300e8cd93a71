//! Register-level error type.
//!
//! Cart and backend failures the cashier should see are reported as
//! [`Notice`](crate::Notice)s, not errors. `RegisterError` covers the failures
//! that stop the register itself.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Errors that stop the register front end.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Backend client could not be created or failed outright.
    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    /// Cart view failed to render.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// Terminal input/output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
