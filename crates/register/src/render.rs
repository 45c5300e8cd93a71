//! Cart view model and text rendering.
//!
//! [`CartView`] is rebuilt from scratch from the current cart every time, so
//! rendering is idempotent and never holds on to stale rows.

use askama::Template;
use caja_core::{Cart, CartLine, Price, ProductId};

/// One row of the rendered cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLineView {
    /// 1-based row number as shown to the cashier.
    pub position: usize,
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

/// Cart display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u64,
}

impl CartView {
    /// Render the view as plain text for a terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to render.
    pub fn to_text(&self) -> askama::Result<String> {
        CartTextTemplate {
            lines: &self.lines,
            total: &self.total,
        }
        .render()
    }

    /// Product shown at a 1-based row number.
    #[must_use]
    pub fn product_at(&self, position: usize) -> Option<ProductId> {
        self.lines
            .iter()
            .find(|line| line.position == position)
            .map(|line| line.product_id)
    }
}

impl CartLineView {
    fn new(position: usize, line: &CartLine, cart: &Cart) -> Self {
        Self {
            position,
            product_id: line.product_id,
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price: Price::new(line.unit_price, cart.currency()).display(),
            subtotal: Price::new(line.subtotal(), cart.currency()).display(),
        }
    }
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self {
            lines: cart
                .lines()
                .iter()
                .enumerate()
                .map(|(index, line)| CartLineView::new(index + 1, line, cart))
                .collect(),
            total: cart.total().display(),
            item_count: cart.item_count(),
        }
    }
}

/// Terminal cart table.
#[derive(Template)]
#[template(
    ext = "txt",
    source = "{% if lines.is_empty() %}(carrito vacío)
{% else %}{% for line in lines %}{{ line.position }}. {{ line.name }} | cant. {{ line.quantity }} | {{ line.unit_price }} | {{ line.subtotal }}
{% endfor %}{% endif %}Total: {{ total }}"
)]
struct CartTextTemplate<'a> {
    lines: &'a [CartLineView],
    total: &'a str,
}
