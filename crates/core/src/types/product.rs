//! Product lookup snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;

/// A product as returned by the barcode lookup endpoint.
///
/// This is a read-only snapshot: `stock_quantity` is whatever the backend
/// reported at lookup time and may be stale by the time the sale is
/// registered. The backend re-validates stock when the sale is persisted.
///
/// Field names on the wire follow the backend's row shape
/// (`nombre`, `precio_venta`, `existencia`, `codigo_barras`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "codigo_barras", default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio_venta", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(rename = "existencia")]
    pub stock_quantity: i64,
}
