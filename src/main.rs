//! switchboard: serve a route manifest over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!     routes.toml ──▶ config (load + validate)
//!                          │
//!                          ▼
//!                   RouteBuilder::from_config ──▶ RouteTable (frozen, Arc)
//!                                                      │
//!     Client Request ──▶ http server ──▶ Dispatcher ◀──┘
//!                                          │
//!                          before filters → handler → after filters
//!                                          │
//!     Client Response ◀────────────────────┘
//! ```
//!
//! Handlers named in the manifest are answered by the echo resolver, which
//! reports the matched handler and its arguments.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use switchboard::config::load_config;
use switchboard::dispatch::EchoResolver;
use switchboard::http::{AppState, HttpServer};
use switchboard::observability::init_logging;
use switchboard::routing::RouteBuilder;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Serve a route manifest over HTTP", long_about = None)]
struct Cli {
    /// Route manifest (TOML).
    #[arg(short, long, default_value = "routes.toml")]
    config: PathBuf,

    /// Overrides `server.bind_address` from the manifest.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    init_logging(&config.observability)?;
    tracing::info!("switchboard v{} starting", env!("CARGO_PKG_VERSION"));

    let table = RouteBuilder::from_config(&config)?.build()?;
    let table = Arc::new(table);

    let bind_address = cli.bind.unwrap_or(config.server.bind_address);
    tracing::info!(
        config = %cli.config.display(),
        bind_address = %bind_address,
        routes = table.len(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&bind_address).await?;

    let state = AppState::new(table).with_resolver(Arc::new(EchoResolver::new().intercept_errors(true)));
    HttpServer::new(state).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
