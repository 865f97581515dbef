//! Flow states and settings.

use std::fmt;
use std::time::Duration;

/// Where a [`PaymentFlow`](super::PaymentFlow) is in acquiring its resource.
///
/// ```text
/// idle -> checking -> success
///                  -> payment-required -> approving -> payment-required
///                                      -> paying -> confirming -> verifying -> success
/// any step -> error;  reset() -> idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlowState {
    /// Nothing requested yet, or reset.
    #[default]
    Idle,
    /// First request in flight.
    Checking,
    /// A descriptor was received; waiting for `approve()` or `pay()`.
    PaymentRequired,
    /// Token approval submitted, waiting for it to be mined.
    Approving,
    /// Payment transaction being submitted.
    Paying,
    /// Payment submitted, waiting for it to settle.
    Confirming,
    /// Retrying the request with the payment proof.
    Verifying,
    /// Content received.
    Success,
    /// A step failed; `reset()` to start over.
    Error,
}

impl FlowState {
    /// Kebab-case name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Checking => "checking",
            Self::PaymentRequired => "payment-required",
            Self::Approving => "approving",
            Self::Paying => "paying",
            Self::Confirming => "confirming",
            Self::Verifying => "verifying",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Returns `true` for [`FlowState::Success`] and [`FlowState::Error`].
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default wait between submitting a payment and retrying with proof.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Upper bound for a fixed settle delay.
pub const MAX_SETTLE_DELAY: Duration = Duration::from_secs(60);

/// How the flow waits for a payment before retrying with proof.
///
/// A fixed delay only gives the server's node time to index the
/// transaction; the retry can still be refused if it has not. Awaiting
/// confirmation polls the wallet's node until the transaction is mined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettleStrategy {
    /// Sleep for the given duration, capped at [`MAX_SETTLE_DELAY`].
    FixedDelay(Duration),
    /// Wait for the transaction to be mined, up to `timeout`.
    AwaitConfirmation {
        /// Maximum time to wait for the receipt.
        timeout: Duration,
    },
}

impl Default for SettleStrategy {
    fn default() -> Self {
        Self::FixedDelay(DEFAULT_SETTLE_DELAY)
    }
}

/// Tunables of a payment flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowSettings {
    settle: SettleStrategy,
}

impl FlowSettings {
    /// Waits a fixed `delay` after paying, capped at [`MAX_SETTLE_DELAY`].
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle = SettleStrategy::FixedDelay(delay.min(MAX_SETTLE_DELAY));
        self
    }

    /// Waits for the payment to be mined, for at most `timeout`.
    #[must_use]
    pub const fn await_confirmation(mut self, timeout: Duration) -> Self {
        self.settle = SettleStrategy::AwaitConfirmation { timeout };
        self
    }

    /// The configured settle strategy.
    #[must_use]
    pub const fn settle(&self) -> SettleStrategy {
        self.settle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_are_kebab_case() {
        assert_eq!(FlowState::PaymentRequired.to_string(), "payment-required");
        assert_eq!(FlowState::default(), FlowState::Idle);
    }

    #[test]
    fn settle_delay_is_capped() {
        let settings = FlowSettings::default().with_settle_delay(Duration::from_secs(600));
        assert_eq!(settings.settle(), SettleStrategy::FixedDelay(MAX_SETTLE_DELAY));
        assert_eq!(
            FlowSettings::default().settle(),
            SettleStrategy::FixedDelay(DEFAULT_SETTLE_DELAY)
        );
    }
}
