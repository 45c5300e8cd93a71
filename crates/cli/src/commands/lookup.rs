//! One-shot barcode lookup.
//!
//! ```bash
//! caja buscar 7501031311309
//! ```

use std::io::Write;

use caja_core::{CurrencyCode, Price, Product};
use caja_register::{PosApiClient, RegisterError};

/// Look up a barcode and print the product.
///
/// # Errors
///
/// Returns the backend error if the product is not found or the backend is
/// unreachable.
pub async fn run(
    client: &PosApiClient,
    barcode: &str,
    currency: CurrencyCode,
) -> Result<(), RegisterError> {
    let product = client.lookup_product(barcode.trim()).await?;

    let mut out = std::io::stdout().lock();
    write_product(&mut out, &product, currency)?;
    Ok(())
}

fn write_product(
    out: &mut impl Write,
    product: &Product,
    currency: CurrencyCode,
) -> std::io::Result<()> {
    writeln!(out, "{} (id {})", product.name, product.id)?;
    if let Some(barcode) = &product.barcode {
        writeln!(out, "  Código:     {barcode}")?;
    }
    writeln!(
        out,
        "  Precio:     {}",
        Price::new(product.unit_price, currency)
    )?;
    writeln!(out, "  Existencia: {}", product.stock_quantity)
}
