//! Caja Core - Domain types and cart state.
//!
//! This crate provides the types shared by every Caja component:
//! - `register` - Backend client and register session (the cart manager)
//! - `cli` - Terminal front end for the register
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no HTTP clients, no rendering. Every cart operation here is synchronous and
//! can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices and the product lookup snapshot
//! - [`cart`] - Cart lines and the add/remove/set-quantity/total transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{AddOutcome, Cart, CartError, CartLine, CartState, QuantityUpdate, parse_quantity};
pub use types::*;
