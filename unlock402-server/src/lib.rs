//! Paywalled content server.
//!
//! Serves a catalog of items from a TOML file. Each item sits behind its own
//! payment layer and is released once an on-chain payment for it has been
//! verified against the configured RPC endpoints.
//!
//! # Modules
//!
//! - [`config`] - Server configuration with environment variable expansion
//! - [`chains`] - RPC readers for the networks the catalog is priced on
//! - [`handlers`] - Axum routes and the router builder
//! - [`error`] - Startup and request error types
//! - [`shutdown`] - Signal-driven graceful shutdown

pub mod chains;
pub mod config;
pub mod error;
pub mod handlers;
pub mod shutdown;

pub use handlers::{UnlockedContent, content_router};
