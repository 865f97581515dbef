//! Paywalled content server.
//!
//! # Usage
//!
//! ```bash
//! # Run with config.toml in the current directory
//! cargo run -p unlock402-server --release
//!
//! # Run with a custom config path and verbose logs
//! CONFIG=/path/to/config.toml RUST_LOG=debug cargo run -p unlock402-server
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` - Path to the TOML configuration file (default: `config.toml`)
//! - `HOST` - Override bind address (default: `0.0.0.0`)
//! - `PORT` - Override port (default: `4021`)
//! - `RUST_LOG` - Log level filter (default: `info`)
//!
//! Variables from a `.env` file in the working directory are loaded first.

use std::net::SocketAddr;

use axum::http::Method;
use tower_http::cors;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use unlock402_evm::EvmVerifier;

use unlock402_server::chains::chain_readers;
use unlock402_server::config::ServerConfig;
use unlock402_server::content_router;
use unlock402_server::shutdown::shutdown_token;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Server failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        items = config.content.len(),
        "Loaded configuration"
    );
    if config.content.is_empty() {
        tracing::warn!("Catalog is empty, only /health and /api/content will answer");
    }

    let verifier = EvmVerifier::new(chain_readers(&config)?);
    let app = content_router(&config.content, verifier)
        .layer(TraceLayer::new_for_http())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    let shutdown = shutdown_token()?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}
