//! Error types for the payment gate.

use unlock402::VerificationOutcome;

use crate::error::{HttpError, ProofError};

/// Why a request was not let through.
#[derive(Debug, thiserror::Error)]
pub enum PaygateError {
    /// No `X-Payment` header was sent.
    #[error("X-Payment header is required")]
    ProofRequired,
    /// The `X-Payment` header could not be decoded.
    #[error("invalid X-Payment header: {0}")]
    InvalidProof(#[from] ProofError),
    /// The proof did not verify against chain state.
    #[error("payment verification failed: {0}")]
    Verification(VerificationOutcome),
    /// The challenge could not be encoded.
    #[error("failed to encode payment challenge: {0}")]
    Encode(#[from] HttpError),
}
