//! Error types for the HTTP codec.

use http::HeaderName;
use http::header::InvalidHeaderValue;
use unlock402::encoding::Base64JsonError;

/// Errors that can occur while encoding headers.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// A value contains bytes that are not allowed in a header.
    #[error("value for {name} is not a valid header value")]
    InvalidHeaderValue {
        /// The header being written.
        name: HeaderName,
        /// Underlying error.
        #[source]
        source: InvalidHeaderValue,
    },
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a response does not carry a usable payment descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    /// The payment marker header is absent or not exactly `"true"`.
    #[error("response does not require payment")]
    NotRequired,
    /// A required header is absent.
    #[error("missing header {0}")]
    MissingField(&'static str),
    /// A header is present but its value does not parse.
    #[error("invalid value {value:?} for header {name}")]
    InvalidField {
        /// Header name.
        name: &'static str,
        /// The offending value (lossy UTF-8).
        value: String,
    },
    /// Some, but not all, token headers are present.
    #[error("token headers must be all present or all absent")]
    PartialToken,
}

/// Why a proof header could not be decoded.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// The header is not valid base64 (or not a valid header string).
    #[error("invalid base64: {0}")]
    Base64(String),
    /// The decoded bytes are not a complete proof document.
    #[error("invalid proof JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<Base64JsonError> for ProofError {
    fn from(err: Base64JsonError) -> Self {
        match err {
            Base64JsonError::Base64(e) => Self::Base64(e.to_string()),
            Base64JsonError::Json(e) => Self::Json(e),
        }
    }
}
