//! In-progress sale state.
//!
//! A [`Cart`] is an ordered list of [`CartLine`]s keyed by [`ProductId`].
//! Every transition here is pure: callers decide how to surface the outcome
//! (notices, re-rendering) and when to talk to the backend.
//!
//! ## Invariants
//!
//! - Every line has `quantity >= 1`.
//! - A product appears in at most one line; repeated scans increment it.
//! - Scans never push a quantity past the product's stock snapshot. Manual
//!   quantity edits are not bounded by stock.
//! - Every subtotal and the cart total fit in a [`Decimal`]. A scan or edit
//!   that would overflow them is refused.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CurrencyCode, Price, Product, ProductId};

/// Errors from adding a product to the cart.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The line already holds every unit the stock snapshot allows.
    #[error("no more stock available for product {product_id} (stock {stock})")]
    StockExceeded {
        /// Product whose line could not be incremented.
        product_id: ProductId,
        /// Stock snapshot from the lookup.
        stock: i64,
    },
    /// The product has no stock at all.
    #[error("product {product_id} is out of stock")]
    OutOfStock {
        /// Product that could not be added.
        product_id: ProductId,
    },
    /// Adding the unit would overflow the cart total.
    #[error("adding product {product_id} would overflow the cart total")]
    AmountOverflow {
        /// Product that could not be added.
        product_id: ProductId,
    },
}

/// Result of a successful [`Cart::add_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was created with quantity 1.
    Added,
    /// An existing line was incremented.
    Incremented {
        /// Quantity after the increment.
        quantity: u32,
    },
}

/// Result of [`Cart::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    /// The line now has the given quantity.
    Updated {
        /// Quantity before the edit.
        previous: u32,
        /// Quantity after the edit.
        quantity: u32,
    },
    /// The input was not a positive integer, would overflow the total, or the
    /// product is not in the cart.
    Ignored,
}

/// The two reachable cart states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    Empty,
    NonEmpty,
}

/// One product entry in the in-progress sale.
///
/// Serialized with the keys the sale endpoint reads
/// (`id`, `nombre`, `precio`, `cantidad`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "id")]
    pub product_id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        Self {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.unit_price,
            quantity: 1,
        }
    }

    /// `quantity × unit_price`, unrounded.
    ///
    /// Saturates at [`Decimal::MAX`]; lines held by a [`Cart`] never do.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    /// `quantity × unit_price`, or `None` if it does not fit in a [`Decimal`].
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// An ordered, page-scoped shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    currency: CurrencyCode,
}

impl Cart {
    /// Create an empty cart priced in the given currency.
    #[must_use]
    pub const fn new(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            currency,
        }
    }

    /// Currency used for totals.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn state(&self) -> CartState {
        if self.lines.is_empty() {
            CartState::Empty
        } else {
            CartState::NonEmpty
        }
    }

    /// Look up the line for a product.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Resolve a 0-based displayed position to its line.
    #[must_use]
    pub fn line_at(&self, position: usize) -> Option<&CartLine> {
        self.lines.get(position)
    }

    /// Add one unit of a scanned product.
    ///
    /// # Errors
    ///
    /// - [`CartError::StockExceeded`] if the existing line is already at the
    ///   stock snapshot.
    /// - [`CartError::OutOfStock`] if the product is new to the cart and its
    ///   stock is zero or negative.
    /// - [`CartError::AmountOverflow`] if one more unit would overflow the
    ///   cart total.
    pub fn add_product(&mut self, product: &Product) -> Result<AddOutcome, CartError> {
        let overflow = CartError::AmountOverflow {
            product_id: product.id,
        };

        if let Some(line) = self.line(product.id) {
            if i64::from(line.quantity) >= product.stock_quantity {
                return Err(CartError::StockExceeded {
                    product_id: product.id,
                    stock: product.stock_quantity,
                });
            }
            let quantity = line.quantity.saturating_add(1);
            if self.total_with(product.id, line.unit_price, quantity).is_none() {
                return Err(overflow);
            }
            if let Some(line) = self.line_mut(product.id) {
                line.quantity = quantity;
            }
            return Ok(AddOutcome::Incremented { quantity });
        }

        if product.stock_quantity <= 0 {
            return Err(CartError::OutOfStock {
                product_id: product.id,
            });
        }
        if self.total_with(product.id, product.unit_price, 1).is_none() {
            return Err(overflow);
        }
        self.lines.push(CartLine::from_product(product));
        Ok(AddOutcome::Added)
    }

    /// Remove the line for a product. Unknown products are a no-op.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartLine> {
        let position = self.position(product_id)?;
        Some(self.lines.remove(position))
    }

    /// Set a line's quantity from user-entered text.
    ///
    /// The text is parsed with [`parse_quantity`]; anything that does not
    /// yield a positive integer leaves the line untouched, as does a quantity
    /// whose subtotal would overflow the cart total.
    pub fn set_quantity(&mut self, product_id: ProductId, input: &str) -> QuantityUpdate {
        let Some(quantity) = parse_quantity(input) else {
            return QuantityUpdate::Ignored;
        };
        let Some(unit_price) = self.line(product_id).map(|line| line.unit_price) else {
            return QuantityUpdate::Ignored;
        };
        if self.total_with(product_id, unit_price, quantity).is_none() {
            return QuantityUpdate::Ignored;
        }
        let Some(line) = self.line_mut(product_id) else {
            return QuantityUpdate::Ignored;
        };

        let previous = line.quantity;
        line.quantity = quantity;
        QuantityUpdate::Updated { previous, quantity }
    }

    /// Sum of every line subtotal.
    #[must_use]
    pub fn total(&self) -> Price {
        let amount = self
            .lines
            .iter()
            .fold(Decimal::ZERO, |total, line| total.saturating_add(line.subtotal()));
        Price::new(amount, self.currency)
    }

    /// Drop every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }

    fn position(&self, product_id: ProductId) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.product_id == product_id)
    }

    /// Cart total with one product's line priced at `unit_price × quantity`,
    /// or `None` if any step overflows.
    fn total_with(
        &self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
    ) -> Option<Price> {
        let replaced = Price::new(unit_price, self.currency).checked_times(quantity)?;
        self.lines
            .iter()
            .filter(|line| line.product_id != product_id)
            .try_fold(replaced, |total, line| {
                total.checked_add(&Price::new(line.checked_subtotal()?, self.currency))
            })
    }
}

/// Parse a quantity the way a lenient integer parser reads form input.
///
/// Leading whitespace and an optional sign are accepted, then the leading
/// run of ASCII digits is read and anything after it is ignored
/// (`"3 uds"` is 3, `"2.7"` is 2). Returns `None` for empty, non-numeric,
/// zero, negative or out-of-range input.
#[must_use]
pub fn parse_quantity(input: &str) -> Option<u32> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = rest.get(..end)?;
    if digits.is_empty() || negative {
        return None;
    }

    let quantity: u32 = digits.parse().ok()?;
    (quantity > 0).then_some(quantity)
}
