//! Lifecycle hooks for the payment flow.
//!
//! Hooks observe a [`PaymentFlow`](super::PaymentFlow) without driving it:
//! they are told about every state change, the unlocked content, and
//! failures. All methods default to no-ops, so implementors override only
//! what they need.

use serde_json::Value;

use super::error::FlowError;
use super::state::FlowState;

/// Observer of a payment flow's lifecycle.
///
/// Hooks run synchronously on the task driving the flow and should return
/// quickly.
pub trait FlowHooks: Send + Sync {
    /// Called after the flow moved from `from` to `to`.
    fn on_state_change(&self, _from: FlowState, _to: FlowState) {}

    /// Called once the protected content has been received.
    fn on_success(&self, _content: &Value) {}

    /// Called when the flow lands in [`FlowState::Error`].
    fn on_error(&self, _error: &FlowError) {}
}
