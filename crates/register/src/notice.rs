//! User-facing messages.
//!
//! The register shows two kinds of messages: blocking alerts the cashier must
//! acknowledge, and an error banner that stays visible until the next lookup
//! clears it.

use core::fmt;

use crate::api::SaleReference;

/// How a [`Notice`] is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Blocking, acknowledged by the cashier.
    Alert,
    /// Persistent error banner above the cart.
    Banner,
}

/// A message for the cashier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Lookup answered with a non-success status.
    ProductNotFound,
    /// Lookup could not reach the backend.
    LookupConnectionFailed,
    /// A scan would push the line past its stock snapshot.
    StockExceeded,
    /// The scanned product has no stock.
    OutOfStock,
    /// One more unit would push the total past the largest representable amount.
    AmountTooLarge,
    /// Sale submitted with no lines.
    EmptyCart,
    /// Another backend request has not finished yet.
    RequestInFlight,
    /// The backend registered the sale.
    SaleRegistered {
        reference: Option<SaleReference>,
    },
    /// The backend refused the sale.
    SaleRejected {
        reason: String,
    },
    /// Sale submission could not reach the backend.
    SaleConnectionFailed,
}

impl Notice {
    #[must_use]
    pub const fn kind(&self) -> NoticeKind {
        match self {
            Self::ProductNotFound | Self::LookupConnectionFailed | Self::SaleConnectionFailed => {
                NoticeKind::Banner
            }
            _ => NoticeKind::Alert,
        }
    }

    /// Whether the notice must be acknowledged before continuing.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self.kind(), NoticeKind::Alert)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProductNotFound => f.write_str("Producto no encontrado."),
            Self::LookupConnectionFailed => f.write_str("Error al conectar con el servidor."),
            Self::StockExceeded => f.write_str("No hay más stock disponible."),
            Self::OutOfStock => f.write_str("Producto agotado."),
            Self::AmountTooLarge => f.write_str("El importe excede el máximo permitido."),
            Self::EmptyCart => f.write_str("El carrito está vacío."),
            Self::RequestInFlight => f.write_str("Hay una operación en curso."),
            Self::SaleRegistered {
                reference: Some(reference),
            } => write!(f, "Venta #{reference} registrada con éxito."),
            Self::SaleRegistered { reference: None } => f.write_str("Venta registrada con éxito."),
            Self::SaleRejected { reason } => write!(f, "Error al registrar la venta: {reason}"),
            Self::SaleConnectionFailed => f.write_str("Error de conexión al registrar la venta."),
        }
    }
}
