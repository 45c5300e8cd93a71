//! Caja CLI - Terminal register for the point-of-sale backend.
//!
//! # Usage
//!
//! ```bash
//! # Open the interactive register (default command)
//! caja register
//!
//! # Point at another backend with a request timeout
//! caja --base-url http://10.0.0.5:5000 --timeout-secs 10 register
//!
//! # Look up a single barcode
//! caja buscar 7501031311309
//! ```
//!
//! # Commands
//!
//! - `register` - Scan barcodes, edit the cart and register the sale
//! - `buscar` - Look up one product by barcode
//!
//! The register UI is written to stdout; logs go to stderr (`RUST_LOG`).
//! Pass `--log-json` for one JSON object per log event.

#![cfg_attr(not(test), forbid(unsafe_code))]

use caja_register::{PosApiClient, RegisterConfig, RegisterError};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "caja_cli=info,caja_register=info";

mod commands;

#[derive(Parser)]
#[command(name = "caja")]
#[command(author, version, about = "Caja point-of-sale register")]
struct Cli {
    /// Backend base URL (overrides `CAJA_BASE_URL`)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Per-request timeout in seconds (overrides `CAJA_REQUEST_TIMEOUT_SECS`)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: Option<u64>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive register
    Register,
    /// Look up a product by barcode
    Buscar {
        /// Barcode to look up
        barcode: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

/// Install the subscriber on stderr so stdout stays the register screen.
fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}

async fn run(cli: Cli) -> Result<(), RegisterError> {
    let mut config = RegisterConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config.set_base_url(base_url)?;
    }
    if let Some(secs) = cli.timeout_secs {
        config.request_timeout = Some(std::time::Duration::from_secs(secs));
    }

    let client = PosApiClient::new(&config)?;
    tracing::debug!(base_url = %client.base_url(), "Backend configured");

    match cli.command.unwrap_or(Commands::Register) {
        Commands::Register => commands::register::run(client, config.currency).await,
        Commands::Buscar { barcode } => commands::lookup::run(&client, &barcode, config.currency).await,
    }
}
