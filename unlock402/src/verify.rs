//! Verification outcomes and the verifier abstraction.
//!
//! On the wire a verification is pass/fail. Internally it is a
//! [`VerificationOutcome`], so that logs can tell a payer mismatch from an
//! RPC timeout even though the client sees the same generic 402.

use std::fmt;
use std::sync::Arc;

use crate::config::PaymentConfig;
use crate::proof::PaymentProof;

/// Result of checking a proof against chain state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The referenced transaction satisfies the payment configuration.
    Verified,
    /// No receipt or transaction exists for the hash (yet).
    TransactionNotFound,
    /// The transaction was mined but reverted.
    TransactionFailed,
    /// The transaction paid someone other than the configured recipient.
    RecipientMismatch,
    /// The transaction paid less than the configured amount.
    AmountInsufficient,
    /// The transaction was not sent by the claimed payer.
    PayerMismatch,
    /// No matching `Transfer` log from the configured token was found.
    NoMatchingTransfer,
    /// The proof names a different network than the configuration.
    NetworkMismatch,
    /// No chain access is configured for the proof's network.
    UnsupportedNetwork,
    /// Talking to the chain failed.
    RpcError(String),
}

impl VerificationOutcome {
    /// Returns `true` only for [`VerificationOutcome::Verified`].
    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Machine-readable reason, suitable as a log field.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::TransactionNotFound => "transaction_not_found",
            Self::TransactionFailed => "transaction_failed",
            Self::RecipientMismatch => "recipient_mismatch",
            Self::AmountInsufficient => "amount_insufficient",
            Self::PayerMismatch => "payer_mismatch",
            Self::NoMatchingTransfer => "no_matching_transfer",
            Self::NetworkMismatch => "network_mismatch",
            Self::UnsupportedNetwork => "unsupported_network",
            Self::RpcError(_) => "rpc_error",
        }
    }
}

impl fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RpcError(detail) => write!(f, "rpc_error: {detail}"),
            other => f.write_str(other.reason()),
        }
    }
}

/// Decides whether a proof satisfies a payment configuration.
///
/// Implementations must be fail-closed: any internal failure is reported as
/// a non-verified outcome, never as a panic or an error.
#[async_trait::async_trait]
pub trait ProofVerifier: Send + Sync {
    /// Checks `proof` against `config` using chain state as ground truth.
    async fn verify(&self, proof: &PaymentProof, config: &PaymentConfig) -> VerificationOutcome;
}

#[async_trait::async_trait]
impl<T: ProofVerifier + ?Sized> ProofVerifier for Arc<T> {
    async fn verify(&self, proof: &PaymentProof, config: &PaymentConfig) -> VerificationOutcome {
        (**self).verify(proof, config).await
    }
}
