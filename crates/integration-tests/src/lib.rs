//! Integration tests for Caja.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p caja-integration-tests
//! ```
//!
//! The tests need no external services: [`MockBackend`] serves the two POS
//! endpoints from an in-process `axum` router on an ephemeral port, and the
//! register talks to it through the real `reqwest` client.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use caja_register::{PosApiClient, RegisterConfig};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Barcode whose lookup never answers within a reasonable timeout.
pub const STALLED_BARCODE: &str = "lento";

/// How long the stalled lookup waits before answering.
const STALL: Duration = Duration::from_secs(5);

/// What the sale endpoint answers.
#[derive(Debug, Clone)]
pub enum SaleReply {
    /// `200 {"success": true, "id_venta": <id>}`
    Accept(Value),
    /// `500 {"success": false, "error": <message>}`
    Reject(String),
    /// `200` with an HTML body, like a login redirect.
    NotJson,
}

#[derive(Debug)]
struct MockState {
    products: Mutex<HashMap<String, Value>>,
    sale_reply: Mutex<SaleReply>,
    sales: Mutex<Vec<Value>>,
    lookups: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// In-process POS backend.
#[derive(Debug)]
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockBackend {
    /// Start the backend on `127.0.0.1` with an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = Arc::new(MockState {
            products: Mutex::new(HashMap::new()),
            sale_reply: Mutex::new(SaleReply::Accept(json!(1))),
            sales: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/api/producto/buscar/{codigo}", get(lookup_product))
            .route("/api/venta/registrar", post(register_sale))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL to configure the register with.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Register configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the loopback URL does not parse, which cannot happen for a
    /// bound socket address.
    #[must_use]
    pub fn config(&self) -> RegisterConfig {
        RegisterConfig::with_base_url(&self.base_url()).expect("loopback URL is valid")
    }

    /// Client for this backend, optionally with a request timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self, timeout: Option<Duration>) -> PosApiClient {
        let mut config = self.config();
        config.request_timeout = timeout;
        PosApiClient::new(&config).expect("client builds")
    }

    /// Stock a product under a barcode, in the backend's row shape.
    pub fn stock(&self, barcode: &str, id: i64, name: &str, price: f64, stock: i64) {
        lock(&self.state.products).insert(
            barcode.to_string(),
            json!({
                "id": id,
                "codigo_barras": barcode,
                "nombre": name,
                "precio_venta": price,
                "existencia": stock,
            }),
        );
    }

    /// Set what the sale endpoint answers from now on.
    pub fn reply_to_sales_with(&self, reply: SaleReply) {
        *lock(&self.state.sale_reply) = reply;
    }

    /// Raw JSON bodies received by the sale endpoint.
    #[must_use]
    pub fn sales(&self) -> Vec<Value> {
        lock(&self.state.sales).clone()
    }

    /// Number of lookup requests received.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.state.lookups.load(Ordering::SeqCst)
    }

    /// Stop serving; later requests fail to connect.
    pub async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

async fn lookup_product(
    State(state): State<Arc<MockState>>,
    Path(codigo): Path<String>,
) -> Response {
    state.lookups.fetch_add(1, Ordering::SeqCst);
    if codigo == STALLED_BARCODE {
        tokio::time::sleep(STALL).await;
    }

    let product = lock(&state.products).get(&codigo).cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Producto no encontrado"})),
        )
            .into_response(),
    }
}

async fn register_sale(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    lock(&state.sales).push(body);
    let reply = lock(&state.sale_reply).clone();

    match reply {
        SaleReply::Accept(id) => Json(json!({"success": true, "id_venta": id})).into_response(),
        SaleReply::Reject(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": error})),
        )
            .into_response(),
        SaleReply::NotJson => Html("<html><body>Iniciar sesión</body></html>").into_response(),
    }
}
