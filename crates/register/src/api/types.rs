//! Wire types for the POS backend endpoints.

use core::fmt;

use caja_core::{CartLine, SaleId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Body of `POST /api/venta/registrar`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleRequest {
    /// Every cart line, in cart order.
    #[serde(rename = "carrito")]
    pub lines: Vec<CartLine>,
    /// Σ quantity × unit price, sent as a JSON number.
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Raw response of `POST /api/venta/registrar`.
///
/// The backend uses the same shape for success (`200`) and failure (`500`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_venta: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Identifier the backend assigned to a registered sale.
///
/// The backend may return any JSON value; it is kept as display text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaleReference(String);

impl SaleReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Build a reference from the raw `id_venta` value. `null` yields `None`.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(Self(s.clone())),
            other => Some(Self(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The backend row id, when the reference is an integer.
    #[must_use]
    pub fn sale_id(&self) -> Option<SaleId> {
        self.0.parse::<i64>().ok().map(SaleId::new)
    }
}

impl fmt::Display for SaleReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sale the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleConfirmation {
    /// `id_venta`, when the backend sent one.
    pub reference: Option<SaleReference>,
}

impl TryFrom<SaleResponse> for SaleConfirmation {
    type Error = super::ApiError;

    fn try_from(response: SaleResponse) -> Result<Self, Self::Error> {
        if response.success {
            Ok(Self {
                reference: response.id_venta.as_ref().and_then(SaleReference::from_json),
            })
        } else {
            Err(super::ApiError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| "error desconocido".to_string()),
            ))
        }
    }
}
