//! Register session: the cart manager.
//!
//! A [`RegisterSession`] owns the cart for one register screen. It is never
//! shared between screens and is discarded with them.
//!
//! # Request guarding
//!
//! While a backend request is pending the session is *busy*: a second lookup
//! or submission is refused with [`Notice::RequestInFlight`], and cart edits
//! are refused too so the submitted snapshot is the one that gets cleared.
//! Sale submission is exposed in two phases ([`RegisterSession::begin_submit`]
//! and [`RegisterSession::finish_submit`]) so callers that drive the request
//! themselves see the same guard.
//!
//! [`RegisterSession::lookup_product`] and [`RegisterSession::submit_sale`]
//! are cancel-safe: dropping either future before it resolves releases the
//! session. A cancelled sale leaves the cart as it was.

use caja_core::{
    AddOutcome, Cart, CartError, CartLine, CurrencyCode, Price, Product, ProductId, QuantityUpdate,
};
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::api::{ApiError, PosBackend, SaleConfirmation, SaleReference, SaleRequest};
use crate::notice::Notice;
use crate::render::CartView;

/// Which request the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Lookup,
    Sale,
}

/// Releases the session when a request future is dropped mid-flight.
struct PendingReset<'a> {
    pending: &'a mut Option<Pending>,
    armed: bool,
}

impl<'a> PendingReset<'a> {
    fn new(pending: &'a mut Option<Pending>) -> Self {
        Self {
            pending,
            armed: true,
        }
    }

    /// The request resolved; leave the marker for the caller to settle.
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingReset<'_> {
    fn drop(&mut self) {
        if self.armed
            && let Some(pending) = self.pending.take()
        {
            debug!(?pending, "Pending request released");
        }
    }
}

/// Result of [`RegisterSession::lookup_product`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Empty barcode; nothing happened.
    Skipped,
    /// Another request is pending; nothing happened.
    Busy(Notice),
    /// The product was found and offered to the cart.
    ///
    /// `notice` is set when the cart refused it for stock reasons.
    Found {
        product: Product,
        notice: Option<Notice>,
    },
    /// The lookup failed; the notice is also the session's error banner.
    Failed(Notice),
}

/// A sale the backend accepted, with the cart contents it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleReceipt {
    pub reference: Option<SaleReference>,
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub completed_at: DateTime<Utc>,
}

/// Result of a sale submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleOutcome {
    /// No request was sent (empty cart or another request pending).
    Blocked(Notice),
    /// The sale was registered and the cart cleared.
    Completed(SaleReceipt),
    /// The backend refused the sale; the cart is unchanged.
    Rejected { reason: String },
    /// The backend could not be reached; the cart is unchanged.
    ConnectionFailed,
}

impl SaleOutcome {
    /// Message to show the cashier.
    #[must_use]
    pub fn notice(&self) -> Notice {
        match self {
            Self::Blocked(notice) => notice.clone(),
            Self::Completed(receipt) => Notice::SaleRegistered {
                reference: receipt.reference.clone(),
            },
            Self::Rejected { reason } => Notice::SaleRejected {
                reason: reason.clone(),
            },
            Self::ConnectionFailed => Notice::SaleConnectionFailed,
        }
    }
}

/// Cart manager for one register screen.
#[derive(Debug)]
pub struct RegisterSession<B> {
    id: Uuid,
    backend: B,
    cart: Cart,
    pending: Option<Pending>,
    banner: Option<Notice>,
}

impl<B: PosBackend> RegisterSession<B> {
    /// Start a session with an empty cart.
    #[must_use]
    pub fn new(backend: B, currency: CurrencyCode) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            cart: Cart::new(currency),
            pending: None,
            banner: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Error banner currently shown, if any.
    #[must_use]
    pub const fn banner(&self) -> Option<&Notice> {
        self.banner.as_ref()
    }

    /// Whether a backend request is pending.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Rebuild the cart view from the current state.
    #[must_use]
    pub fn render(&self) -> CartView {
        CartView::from(&self.cart)
    }

    /// Look up a barcode and add the product to the cart.
    ///
    /// An empty (or whitespace-only) barcode is a no-op. Otherwise the error
    /// banner is cleared and set again only if this lookup fails.
    #[instrument(skip(self), fields(session = %self.id))]
    pub async fn lookup_product(&mut self, barcode: &str) -> LookupOutcome {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return LookupOutcome::Skipped;
        }
        if self.pending.is_some() {
            return LookupOutcome::Busy(Notice::RequestInFlight);
        }

        self.banner = None;
        self.pending = Some(Pending::Lookup);
        let result = {
            let _reset = PendingReset::new(&mut self.pending);
            self.backend.lookup_product(barcode).await
        };

        match result {
            Ok(product) => {
                let notice = self.add_to_cart(&product);
                LookupOutcome::Found { product, notice }
            }
            Err(e) => {
                let notice = match e {
                    ApiError::NotFound { .. } | ApiError::Rejected(_) => Notice::ProductNotFound,
                    _ => Notice::LookupConnectionFailed,
                };
                warn!(error = %e, "Product lookup failed");
                self.banner = Some(notice.clone());
                LookupOutcome::Failed(notice)
            }
        }
    }

    /// Offer one unit of a product to the cart.
    ///
    /// Returns the blocking notice to show when the cart refuses it.
    pub fn add_to_cart(&mut self, product: &Product) -> Option<Notice> {
        if self.pending.is_some() {
            return Some(Notice::RequestInFlight);
        }

        match self.cart.add_product(product) {
            Ok(AddOutcome::Added) => {
                debug!(product_id = %product.id, "Line added");
                None
            }
            Ok(AddOutcome::Incremented { quantity }) => {
                debug!(product_id = %product.id, quantity, "Line incremented");
                None
            }
            Err(CartError::StockExceeded { .. }) => Some(Notice::StockExceeded),
            Err(CartError::OutOfStock { .. }) => Some(Notice::OutOfStock),
            Err(CartError::AmountOverflow { .. }) => Some(Notice::AmountTooLarge),
        }
    }

    /// Remove a product's line.
    ///
    /// # Errors
    ///
    /// Returns [`Notice::RequestInFlight`] while a request is pending.
    pub fn remove_line(&mut self, product_id: ProductId) -> Result<Option<CartLine>, Notice> {
        if self.pending.is_some() {
            return Err(Notice::RequestInFlight);
        }
        Ok(self.cart.remove(product_id))
    }

    /// Set a product's quantity from user-entered text.
    ///
    /// Invalid input is silently ignored ([`QuantityUpdate::Ignored`]).
    ///
    /// # Errors
    ///
    /// Returns [`Notice::RequestInFlight`] while a request is pending.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        input: &str,
    ) -> Result<QuantityUpdate, Notice> {
        if self.pending.is_some() {
            return Err(Notice::RequestInFlight);
        }
        Ok(self.cart.set_quantity(product_id, input))
    }

    /// Start a sale submission and build the request body.
    ///
    /// On success the session is busy until [`finish_submit`](Self::finish_submit).
    ///
    /// # Errors
    ///
    /// - [`Notice::EmptyCart`] if there is nothing to sell.
    /// - [`Notice::RequestInFlight`] if another request is pending.
    pub fn begin_submit(&mut self) -> Result<SaleRequest, Notice> {
        if self.cart.is_empty() {
            return Err(Notice::EmptyCart);
        }
        if self.pending.is_some() {
            return Err(Notice::RequestInFlight);
        }

        self.pending = Some(Pending::Sale);
        Ok(SaleRequest {
            lines: self.cart.lines().to_vec(),
            total: self.cart.total().amount,
        })
    }

    /// Apply the backend's answer to a submission started with
    /// [`begin_submit`](Self::begin_submit).
    ///
    /// Only a confirmed sale clears the cart.
    pub fn finish_submit(&mut self, result: Result<SaleConfirmation, ApiError>) -> SaleOutcome {
        if self.pending != Some(Pending::Sale) {
            return SaleOutcome::Blocked(Notice::RequestInFlight);
        }
        self.pending = None;

        match result {
            Ok(confirmation) => {
                let receipt = SaleReceipt {
                    reference: confirmation.reference,
                    lines: self.cart.lines().to_vec(),
                    total: self.cart.total(),
                    completed_at: Utc::now(),
                };
                self.cart.clear();
                info!(
                    session = %self.id,
                    reference = ?receipt.reference,
                    sale_id = ?receipt.reference.as_ref().and_then(SaleReference::sale_id),
                    total = %receipt.total,
                    "Sale registered"
                );
                SaleOutcome::Completed(receipt)
            }
            Err(ApiError::Rejected(reason)) => {
                warn!(session = %self.id, reason = %reason, "Sale rejected");
                SaleOutcome::Rejected { reason }
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Sale submission failed");
                self.banner = Some(Notice::SaleConnectionFailed);
                SaleOutcome::ConnectionFailed
            }
        }
    }

    /// Submit the cart as a sale.
    #[instrument(skip(self), fields(session = %self.id, lines = self.cart.len()))]
    pub async fn submit_sale(&mut self) -> SaleOutcome {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(notice) => return SaleOutcome::Blocked(notice),
        };
        let reset = PendingReset::new(&mut self.pending);
        let result = self.backend.register_sale(&request).await;
        reset.disarm();
        self.finish_submit(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::str::FromStr;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    /// Backend double answering from queued results.
    #[derive(Default)]
    struct ScriptedBackend {
        lookups: Mutex<VecDeque<Result<Product, ApiError>>>,
        sales: Mutex<VecDeque<Result<SaleConfirmation, ApiError>>>,
        sale_requests: Mutex<Vec<SaleRequest>>,
        calls: AtomicUsize,
    }

    impl ScriptedBackend {
        fn with_lookups(results: Vec<Result<Product, ApiError>>) -> Self {
            Self {
                lookups: Mutex::new(results.into()),
                ..Self::default()
            }
        }

        fn push_sale(&self, result: Result<SaleConfirmation, ApiError>) {
            self.sales.lock().expect("lock").push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PosBackend for ScriptedBackend {
        async fn lookup_product(&self, _barcode: &str) -> Result<Product, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lookups
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or(Err(ApiError::NotFound { status: 404 }))
        }

        async fn register_sale(&self, sale: &SaleRequest) -> Result<SaleConfirmation, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sale_requests.lock().expect("lock").push(sale.clone());
            self.sales
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or(Err(ApiError::Request("no scripted answer".to_string())))
        }
    }

    /// Backend whose requests never resolve.
    struct StalledBackend;

    impl PosBackend for StalledBackend {
        async fn lookup_product(&self, _barcode: &str) -> Result<Product, ApiError> {
            std::future::pending().await
        }

        async fn register_sale(&self, _sale: &SaleRequest) -> Result<SaleConfirmation, ApiError> {
            std::future::pending().await
        }
    }

    fn product(id: i64, price: &str, stock: i64) -> Product {
        Product {
            id: ProductId::new(id),
            barcode: Some(format!("{id:08}")),
            name: format!("Producto {id}"),
            unit_price: Decimal::from_str(price).expect("valid decimal"),
            stock_quantity: stock,
        }
    }

    fn confirmed(id: serde_json::Value) -> Result<SaleConfirmation, ApiError> {
        Ok(SaleConfirmation {
            reference: SaleReference::from_json(&id),
        })
    }

    fn session_with(backend: ScriptedBackend) -> RegisterSession<ScriptedBackend> {
        RegisterSession::new(backend, CurrencyCode::GTQ)
    }

    #[tokio::test]
    async fn test_empty_barcode_is_a_no_op() {
        let mut session = session_with(ScriptedBackend::default());
        assert_eq!(session.lookup_product("   ").await, LookupOutcome::Skipped);
        assert_eq!(session.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_lookup_adds_product_and_clears_banner() {
        let backend = ScriptedBackend::with_lookups(vec![
            Err(ApiError::NotFound { status: 404 }),
            Ok(product(1, "10.5", 3)),
        ]);
        let mut session = session_with(backend);

        let first = session.lookup_product("999").await;
        assert_eq!(first, LookupOutcome::Failed(Notice::ProductNotFound));
        assert_eq!(session.banner(), Some(&Notice::ProductNotFound));

        let second = session.lookup_product("00000001").await;
        assert!(matches!(second, LookupOutcome::Found { notice: None, .. }));
        assert_eq!(session.banner(), None);
        assert_eq!(session.cart().len(), 1);
    }

    #[tokio::test]
    async fn test_lookup_transport_failure_sets_connection_banner() {
        let backend =
            ScriptedBackend::with_lookups(vec![Err(ApiError::Request("refused".to_string()))]);
        let mut session = session_with(backend);

        let outcome = session.lookup_product("123").await;
        assert_eq!(outcome, LookupOutcome::Failed(Notice::LookupConnectionFailed));
        assert_eq!(
            session.banner().map(ToString::to_string).as_deref(),
            Some("Error al conectar con el servidor.")
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_rescan_past_stock_reports_notice() {
        let backend = ScriptedBackend::with_lookups(vec![
            Ok(product(1, "2", 1)),
            Ok(product(1, "2", 1)),
        ]);
        let mut session = session_with(backend);

        session.lookup_product("1").await;
        let outcome = session.lookup_product("1").await;

        assert!(matches!(
            outcome,
            LookupOutcome::Found {
                notice: Some(Notice::StockExceeded),
                ..
            }
        ));
        assert_eq!(session.cart().line(ProductId::new(1)).map(|l| l.quantity), Some(1));
    }

    #[test]
    fn test_out_of_stock_notice() {
        let mut session = session_with(ScriptedBackend::default());
        assert_eq!(
            session.add_to_cart(&product(4, "1", 0)),
            Some(Notice::OutOfStock)
        );
        assert!(session.cart().is_empty());
    }

    #[tokio::test]
    async fn test_submit_empty_cart_sends_nothing() {
        let mut session = session_with(ScriptedBackend::default());

        let outcome = session.submit_sale().await;
        assert_eq!(outcome, SaleOutcome::Blocked(Notice::EmptyCart));
        assert_eq!(outcome.notice().to_string(), "El carrito está vacío.");
        assert_eq!(session.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_successful_sale_clears_cart() {
        let backend = ScriptedBackend::default();
        backend.push_sale(confirmed(json!(42)));
        let mut session = session_with(backend);
        session.add_to_cart(&product(1, "10.5", 5));
        session.add_to_cart(&product(1, "10.5", 5));
        session.add_to_cart(&product(2, "3", 5));

        let outcome = session.submit_sale().await;

        assert_eq!(outcome.notice().to_string(), "Venta #42 registrada con éxito.");
        let SaleOutcome::Completed(receipt) = outcome else {
            panic!("expected completed sale");
        };
        assert_eq!(receipt.total.display(), "Q24.00");
        assert_eq!(receipt.lines.len(), 2);
        assert!(session.cart().is_empty());
        assert!(!session.is_busy());

        let requests = session.backend().sale_requests.lock().expect("lock");
        let sent = requests.first().expect("one request");
        assert_eq!(sent.total, Decimal::from(24));
        assert_eq!(sent.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_sale_keeps_cart() {
        let backend = ScriptedBackend::default();
        backend.push_sale(Err(ApiError::Rejected("sin stock".to_string())));
        let mut session = session_with(backend);
        session.add_to_cart(&product(1, "5", 5));
        let before = session.cart().clone();

        let outcome = session.submit_sale().await;

        assert_eq!(
            outcome.notice().to_string(),
            "Error al registrar la venta: sin stock"
        );
        assert_eq!(session.cart(), &before);
        assert_eq!(session.banner(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_keeps_cart_and_sets_banner() {
        let backend = ScriptedBackend::default();
        backend.push_sale(Err(ApiError::Response("not json".to_string())));
        let mut session = session_with(backend);
        session.add_to_cart(&product(1, "5", 5));

        let outcome = session.submit_sale().await;

        assert_eq!(outcome, SaleOutcome::ConnectionFailed);
        assert_eq!(session.cart().len(), 1);
        assert_eq!(
            session.banner().map(ToString::to_string).as_deref(),
            Some("Error de conexión al registrar la venta.")
        );
    }

    #[test]
    fn test_second_submit_while_pending_is_refused() {
        let mut session = session_with(ScriptedBackend::default());
        session.add_to_cart(&product(1, "5", 5));

        let request = session.begin_submit().expect("first submit starts");
        assert_eq!(request.lines.len(), 1);
        assert!(session.is_busy());

        assert_eq!(session.begin_submit(), Err(Notice::RequestInFlight));
        assert_eq!(
            session.set_quantity(ProductId::new(1), "3"),
            Err(Notice::RequestInFlight)
        );
        assert_eq!(
            session.remove_line(ProductId::new(1)),
            Err(Notice::RequestInFlight)
        );
        assert_eq!(
            session.add_to_cart(&product(2, "1", 1)),
            Some(Notice::RequestInFlight)
        );

        let outcome = session.finish_submit(confirmed(json!("V-1")));
        assert!(matches!(outcome, SaleOutcome::Completed(_)));
        assert!(!session.is_busy());
        assert!(session.cart().is_empty());
    }

    #[test]
    fn test_finish_without_begin_is_refused() {
        let mut session = session_with(ScriptedBackend::default());
        session.add_to_cart(&product(1, "5", 5));

        let outcome = session.finish_submit(confirmed(json!(1)));
        assert_eq!(outcome, SaleOutcome::Blocked(Notice::RequestInFlight));
        assert_eq!(session.cart().len(), 1);
    }

    #[test]
    fn test_quantity_edit_and_removal() {
        let mut session = session_with(ScriptedBackend::default());
        session.add_to_cart(&product(1, "2.25", 5));

        assert_eq!(
            session.set_quantity(ProductId::new(1), "4"),
            Ok(QuantityUpdate::Updated {
                previous: 1,
                quantity: 4
            })
        );
        assert_eq!(session.render().total, "Q9.00");

        assert_eq!(
            session.set_quantity(ProductId::new(1), "cero"),
            Ok(QuantityUpdate::Ignored)
        );

        let removed = session.remove_line(ProductId::new(1)).expect("not busy");
        assert!(removed.is_some());
        assert_eq!(session.render().total, "Q0.00");
    }

    #[tokio::test]
    async fn test_cancelled_lookup_releases_session() {
        let mut session = RegisterSession::new(StalledBackend, CurrencyCode::GTQ);
        session.add_to_cart(&product(1, "5", 5));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(10), session.lookup_product("1")).await;
        assert!(timed_out.is_err());

        assert!(!session.is_busy());
        assert!(matches!(
            session.remove_line(ProductId::new(1)),
            Ok(Some(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_sale_releases_session_and_keeps_cart() {
        let mut session = RegisterSession::new(StalledBackend, CurrencyCode::GTQ);
        session.add_to_cart(&product(1, "5", 5));

        let timed_out = tokio::time::timeout(Duration::from_millis(10), session.submit_sale()).await;
        assert!(timed_out.is_err());

        assert!(!session.is_busy());
        assert_eq!(session.cart().len(), 1);
        assert_eq!(
            session.set_quantity(ProductId::new(1), "2"),
            Ok(QuantityUpdate::Updated {
                previous: 1,
                quantity: 2
            })
        );
    }

    #[test]
    fn test_scan_that_overflows_total_reports_notice() {
        let mut session = session_with(ScriptedBackend::default());
        session.add_to_cart(&product(1, "60000000000000000000000000000", 5));

        assert_eq!(
            session.add_to_cart(&product(1, "60000000000000000000000000000", 5)),
            Some(Notice::AmountTooLarge)
        );
        assert_eq!(
            session.set_quantity(ProductId::new(1), "4000000000"),
            Ok(QuantityUpdate::Ignored)
        );
        assert_eq!(session.render().lines.len(), 1);
    }
}
