//! shop-export
//!
//! Command-line host of the storefront export pipeline.
//!
//! # Usage
//!
//! ```bash
//! # List providers
//! shop-export list
//!
//! # Export products from a JSON Lines file
//! shop-export run --provider Exports.ProductXml --input products.jsonl
//! ```

use shop_export::cli::CliInterface;
use shop_export::error::Result;

/// Application entry point
#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Main application logic
///
/// # Returns
/// * `Result<bool>` - False when an export ended incomplete
async fn run() -> Result<bool> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);
    cli.handle_command().await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
