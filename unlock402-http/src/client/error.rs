//! Errors surfaced by the payment flow.

use http::StatusCode;
use unlock402::{U256, WalletError};

use super::state::FlowState;
use crate::error::{DescriptorError, HttpError};

/// Why a payment flow ended in [`FlowState::Error`], or why an action was refused.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// The HTTP request could not be sent.
    #[error("request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),
    /// The response body could not be read or is not JSON.
    #[error("invalid response body: {0}")]
    Body(#[from] reqwest::Error),
    /// The server answered with a status the flow does not handle.
    #[error("unexpected response status {0}")]
    UnexpectedStatus(StatusCode),
    /// The `402` response carried no usable descriptor.
    #[error("invalid payment descriptor: {0}")]
    Descriptor(#[from] DescriptorError),
    /// The wallet or token reader failed.
    #[error(transparent)]
    Wallet(#[from] WalletError),
    /// The payer holds less of the token than required.
    #[error("insufficient token balance: {available} available, {required} required")]
    InsufficientBalance {
        /// Required amount in base units.
        required: U256,
        /// Current balance in base units.
        available: U256,
    },
    /// The server did not accept the payment proof.
    #[error("payment verification failed")]
    VerificationFailed,
    /// The proof header could not be encoded.
    #[error(transparent)]
    Encode(#[from] HttpError),
    /// The flow was cancelled through its cancellation token.
    #[error("request cancelled")]
    Cancelled,
    /// The action is not available in the current state.
    #[error("cannot {action} while {state}")]
    InvalidState {
        /// The refused action.
        action: &'static str,
        /// The state the flow was in.
        state: FlowState,
    },
}
