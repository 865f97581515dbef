//! Error types for the content server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that stop the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or does not match the schema.
    #[error("invalid config: {0}")]
    ParseConfig(#[from] toml::de::Error),

    /// A `[chains.<network>]` key names no supported network.
    #[error(transparent)]
    UnknownNetwork(#[from] unlock402::UnknownNetwork),

    /// Two content items share an id.
    #[error("duplicate content id {0:?}")]
    DuplicateContent(String),

    /// A content id cannot be used as a path segment.
    #[error("invalid content id {0:?}")]
    InvalidContentId(String),

    /// A chain's RPC timeout is zero.
    #[error("timeout_secs for {0} must be greater than zero")]
    InvalidTimeout(unlock402::Network),

    /// A built-in RPC endpoint failed to parse.
    #[error("invalid rpc url: {0}")]
    RpcUrl(#[from] url::ParseError),
}

/// Errors returned to HTTP callers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No content item with this id.
    #[error("content {0:?} not found")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
