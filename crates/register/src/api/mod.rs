//! POS backend API.
//!
//! Two endpoints are used:
//! - `GET /api/producto/buscar/{barcode}` - product lookup
//! - `POST /api/venta/registrar` - sale submission
//!
//! [`PosBackend`] is the seam the register session talks to; [`PosApiClient`]
//! is the `reqwest` implementation.

mod client;
mod error;
mod types;

use std::future::Future;

use caja_core::Product;

pub use client::PosApiClient;
pub use error::ApiError;
pub use types::{SaleConfirmation, SaleReference, SaleRequest, SaleResponse};

/// Backend operations needed by the register.
pub trait PosBackend {
    /// Look up a product by barcode.
    ///
    /// Resolves to [`ApiError::NotFound`] when the backend answers with a
    /// non-success status.
    fn lookup_product(
        &self,
        barcode: &str,
    ) -> impl Future<Output = Result<Product, ApiError>> + Send;

    /// Register a sale.
    ///
    /// Resolves to [`ApiError::Rejected`] when the backend reports failure.
    fn register_sale(
        &self,
        sale: &SaleRequest,
    ) -> impl Future<Output = Result<SaleConfirmation, ApiError>> + Send;
}
