//! Caja Register - The cart manager behind the point-of-sale screen.
//!
//! A [`RegisterSession`] owns the in-progress [`Cart`](caja_core::Cart) and
//! drives the two backend workflows:
//!
//! - barcode lookup, which adds the scanned product to the cart
//! - sale submission, which sends the cart and clears it on success
//!
//! # Architecture
//!
//! - [`api`] - `reqwest` client for the POS backend behind the [`PosBackend`] trait
//! - [`session`] - Register session (cart state, busy flag, error banner)
//! - [`render`] - View model and text rendering of the cart
//! - [`notice`] - User-facing messages
//! - [`config`] - Configuration loaded from environment variables
//!
//! Cart transitions themselves live in `caja-core` and never touch the network.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notice;
pub mod render;
pub mod session;

pub use api::{ApiError, PosApiClient, PosBackend, SaleConfirmation, SaleReference, SaleRequest};
pub use config::{ConfigError, RegisterConfig};
pub use error::RegisterError;
pub use notice::{Notice, NoticeKind};
pub use render::{CartLineView, CartView};
pub use session::{LookupOutcome, RegisterSession, SaleOutcome, SaleReceipt};
