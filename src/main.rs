//! web-frontend
//!
//! Loads a TOML configuration, applies it through the configuration gate,
//! starts the listener and serves until SIGINT/SIGTERM.

use std::path::PathBuf;

use clap::Parser;

use web_frontend::config::loader::load_config;
use web_frontend::lifecycle::shutdown_signal;
use web_frontend::observability::{logging, metrics};
use web_frontend::{FrontEnd, FrontendConfig};

#[derive(Parser)]
#[command(name = "web-frontend")]
#[command(about = "Lifecycle-gated HTTP(S) front-end with host/protocol redirects", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen port, overriding the configuration file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => FrontendConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("web-frontend v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let frontend = FrontEnd::from_config(&config)?;
    if let Some(port) = cli.port {
        frontend.set_port(port)?;
    }

    tracing::info!(
        bind_ip = %config.listener.bind_ip,
        port = frontend.gate().effective_port(),
        protocol = frontend.protocol(),
        redirects = config.redirects.len(),
        statics = config.statics.len(),
        "Configuration loaded"
    );

    frontend.start().await?;
    shutdown_signal().await;
    frontend.shutdown().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
