//! Interactive register.
//!
//! Reads one command per line from stdin and re-renders the cart after each
//! one. A line that is not a command is treated as a scanned barcode, so a
//! keyboard-wedge scanner works without any prefix.
//!
//! ```text
//! 7501031311309     look up and add
//! cant 2 5          set row 2 to quantity 5
//! del 1             remove row 1
//! cobrar            register the sale
//! ver               show the cart again
//! ayuda             list commands
//! salir             quit
//! ```

use std::io::Write;

use caja_core::{CurrencyCode, QuantityUpdate};
use caja_register::{
    CartView, LookupOutcome, Notice, NoticeKind, PosBackend, RegisterError, RegisterSession,
    SaleOutcome,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "\
Comandos:
  <código>        buscar y agregar producto
  cant <fila> <n> cambiar cantidad
  del <fila>      quitar fila
  cobrar          registrar la venta
  ver             mostrar el carrito
  ayuda           esta ayuda
  salir           terminar";

/// One line of cashier input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Empty,
    Scan(String),
    SetQuantity { row: usize, value: String },
    Remove { row: usize },
    Submit,
    Show,
    Help,
    Quit,
    Invalid(&'static str),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Input::Empty;
    };

    match first.to_lowercase().as_str() {
        "cobrar" => Input::Submit,
        "ver" => Input::Show,
        "ayuda" | "?" => Input::Help,
        "salir" => Input::Quit,
        "del" => match words.next().and_then(|w| w.parse().ok()) {
            Some(row) => Input::Remove { row },
            None => Input::Invalid("uso: del <fila>"),
        },
        "cant" => match (words.next().and_then(|w| w.parse().ok()), words.next()) {
            // The quantity text goes to the cart untouched; it decides validity.
            (Some(row), Some(value)) => Input::SetQuantity {
                row,
                value: value.to_string(),
            },
            _ => Input::Invalid("uso: cant <fila> <cantidad>"),
        },
        _ => Input::Scan(line.to_string()),
    }
}

/// Run the interactive register on stdin/stdout.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or written, or the cart
/// fails to render.
pub async fn run<B: PosBackend>(backend: B, currency: CurrencyCode) -> Result<(), RegisterError> {
    let session = RegisterSession::new(backend, currency);
    info!(session = %session.id(), "Register opened");

    let input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    drive(session, input, &mut out).await
}

/// Process input lines until `salir` or end of input.
async fn drive<B, R, W>(
    mut session: RegisterSession<B>,
    input: R,
    out: &mut W,
) -> Result<(), RegisterError>
where
    B: PosBackend,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut view = session.render();
    writeln!(out, "{HELP}\n")?;
    write_cart(out, &view)?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => writeln!(out, "{HELP}")?,
            Input::Invalid(usage) => writeln!(out, "{usage}")?,
            Input::Show => {}
            Input::Scan(barcode) => match session.lookup_product(&barcode).await {
                LookupOutcome::Found {
                    notice: Some(notice),
                    ..
                }
                | LookupOutcome::Busy(notice) => write_notice(out, &notice)?,
                // Failures are shown through the session banner below.
                LookupOutcome::Found { notice: None, .. }
                | LookupOutcome::Failed(_)
                | LookupOutcome::Skipped => {}
            },
            Input::SetQuantity { row, value } => match view.product_at(row) {
                Some(product_id) => match session.set_quantity(product_id, &value) {
                    Ok(QuantityUpdate::Updated { .. } | QuantityUpdate::Ignored) => {}
                    Err(notice) => write_notice(out, &notice)?,
                },
                None => writeln!(out, "No existe la fila {row}.")?,
            },
            Input::Remove { row } => match view.product_at(row) {
                Some(product_id) => {
                    if let Err(notice) = session.remove_line(product_id) {
                        write_notice(out, &notice)?;
                    }
                }
                None => writeln!(out, "No existe la fila {row}.")?,
            },
            Input::Submit => {
                let outcome = session.submit_sale().await;
                let notice = outcome.notice();
                if notice.is_blocking() {
                    write_notice(out, &notice)?;
                }
                if let SaleOutcome::Completed(receipt) = &outcome {
                    writeln!(
                        out,
                        "{} artículos, total {}, {}",
                        receipt.lines.iter().map(|l| u64::from(l.quantity)).sum::<u64>(),
                        receipt.total,
                        receipt.completed_at.format("%Y-%m-%d %H:%M:%S UTC")
                    )?;
                }
            }
        }

        view = session.render();
        if let Some(banner) = session.banner() {
            write_notice(out, banner)?;
        }
        write_cart(out, &view)?;
    }

    info!(session = %session.id(), "Register closed");
    Ok(())
}

fn write_notice(out: &mut impl Write, notice: &Notice) -> std::io::Result<()> {
    match notice.kind() {
        NoticeKind::Alert => writeln!(out, "[!] {notice}"),
        NoticeKind::Banner => writeln!(out, "[error] {notice}"),
    }
}

fn write_cart(out: &mut impl Write, view: &CartView) -> Result<(), RegisterError> {
    writeln!(out, "{}\n", view.to_text()?)?;
    out.flush()?;
    Ok(())
}
