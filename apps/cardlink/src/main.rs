//! # Cardlink
//!
//! The main binary for the Cardlink linked-cards tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │            apps/cardlink (THE BINARY)         │
//! │                                               │
//! │   ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//! │   │   CLI    │   │  Config  │   │  Cards   │  │
//! │   │  (clap)  │   │  (toml)  │   │  (json)  │  │
//! │   └────┬─────┘   └────┬─────┘   └────┬─────┘  │
//! │        └──────────────┼──────────────┘        │
//! │                       ▼                       │
//! │               ┌───────────────┐               │
//! │               │ cardlink-core │               │
//! │               │  (THE LOGIC)  │               │
//! │               └───────────────┘               │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! cardlink init
//! cardlink link c1 c2
//! cardlink links c1
//! cardlink reconcile c1 --cards cards.json
//! cardlink --json-mode status
//! ```

use cardlink::cli::{self, Cli};
use cardlink::config::{self, LogFormat, LoggingConfig};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

fn main() {
    let cli = Cli::parse();

    // Logging comes from the config, so a broken config is reported with
    // the default logger.
    let loaded = config::load(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging, cli.verbose);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli, config) {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing. `RUST_LOG` wins over the configured filter; logs go
/// to stderr so `--json-mode` output stays parseable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("cardlink=debug,cardlink_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter))
    };

    match logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Print the Cardlink startup banner.
fn print_banner() {
    println!(
        r#"
  ┌─┐┌─┐┬─┐┌┬┐┬  ┬┌┐┌┬┌─
  │  ├─┤├┬┘ │││  ││││├┴┐
  └─┘┴ ┴┴└──┴┘┴─┘┴┘└┘┴ ┴
  linked cards v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
