//! `reqwest` client for the POS backend.

use caja_core::Product;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use super::types::{SaleConfirmation, SaleRequest, SaleResponse};
use super::{ApiError, PosBackend};
use crate::config::RegisterConfig;

/// Path segments of the product lookup endpoint (barcode is appended).
const LOOKUP_PATH: [&str; 3] = ["api", "producto", "buscar"];
/// Path segments of the sale registration endpoint.
const SALE_PATH: [&str; 3] = ["api", "venta", "registrar"];

/// HTTP client for the POS backend.
///
/// No retries: every call is a single request whose failure is reported to
/// the caller as-is.
#[derive(Debug, Clone)]
pub struct PosApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL the endpoint paths are appended to.
    base_url: Url,
}

impl PosApiClient {
    /// Create a client from the register configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &RegisterConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Get the backend base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append percent-encoded path segments to the base URL.
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Look up a product by barcode.
    ///
    /// # Errors
    ///
    /// - [`ApiError::NotFound`] for any non-success status.
    /// - [`ApiError::Request`] / [`ApiError::Response`] when the backend is
    ///   unreachable or the body is not a product.
    #[instrument(skip(self))]
    pub async fn lookup_product(&self, barcode: &str) -> Result<Product, ApiError> {
        let url = self.endpoint(LOOKUP_PATH.into_iter().chain([barcode]))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "Product lookup returned no product");
            return Err(ApiError::NotFound {
                status: status.as_u16(),
            });
        }

        let product: Product = response
            .json()
            .await
            .map_err(|e| ApiError::Response(e.to_string()))?;

        debug!(product_id = %product.id, stock = product.stock_quantity, "Product found");
        Ok(product)
    }

    /// Register a sale.
    ///
    /// The response body is decoded whatever the HTTP status, since the
    /// backend reports failures as `500` with a JSON body.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Rejected`] when the backend reports `success: false`.
    /// - [`ApiError::Request`] / [`ApiError::Response`] when the backend is
    ///   unreachable or the body cannot be decoded.
    #[instrument(skip(self, sale), fields(lines = sale.lines.len(), total = %sale.total))]
    pub async fn register_sale(&self, sale: &SaleRequest) -> Result<SaleConfirmation, ApiError> {
        let url = self.endpoint(SALE_PATH)?;

        let response = self
            .client
            .post(url)
            .json(sale)
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        let result: SaleResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Response(e.to_string()))?;

        let confirmation = SaleConfirmation::try_from(result);
        match &confirmation {
            Ok(confirmation) => debug!(reference = ?confirmation.reference, "Sale registered"),
            Err(e) => warn!(status = status.as_u16(), error = %e, "Backend rejected sale"),
        }
        confirmation
    }
}

impl PosBackend for PosApiClient {
    async fn lookup_product(&self, barcode: &str) -> Result<Product, ApiError> {
        Self::lookup_product(self, barcode).await
    }

    async fn register_sale(&self, sale: &SaleRequest) -> Result<SaleConfirmation, ApiError> {
        Self::register_sale(self, sale).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> PosApiClient {
        PosApiClient::new(&RegisterConfig::with_base_url(base).expect("valid URL"))
            .expect("client builds")
    }

    #[test]
    fn test_lookup_endpoint_encodes_barcode_as_one_segment() {
        let api = client("http://127.0.0.1:5000");
        let url = api
            .endpoint(LOOKUP_PATH.into_iter().chain(["75/01 ?"]))
            .expect("url");
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/producto/buscar/75%2F01%20%3F"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let api = client("https://pos.example.com/tienda/");
        let url = api.endpoint(SALE_PATH).expect("url");
        assert_eq!(
            url.as_str(),
            "https://pos.example.com/tienda/api/venta/registrar"
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_request_error() {
        // Bind then drop a listener so the port is known to be closed.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("local addr").port()
        };
        let api = client(&format!("http://127.0.0.1:{port}"));
        let err = api.lookup_product("123").await.expect_err("no backend");
        assert!(err.is_transport(), "unexpected error: {err}");
    }
}
