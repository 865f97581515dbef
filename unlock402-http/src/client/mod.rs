//! Client side of the payment exchange.
//!
//! [`PaymentFlow`] takes one protected URL from an unpaid request to
//! unlocked content. It reads the `402` descriptor, checks token
//! allowance, pays through a [`PaymentWallet`](unlock402::PaymentWallet),
//! waits for the payment to settle, and retries once with an `X-Payment`
//! proof. Requests go through a `reqwest-middleware` client, so retry,
//! tracing or auth middleware can be stacked underneath.
//!
//! ```ignore
//! let mut flow = PaymentFlow::new(wallet)
//!     .with_settings(FlowSettings::default().await_confirmation(Duration::from_secs(60)));
//! flow.fetch_content(url).await?;
//! if flow.state() == FlowState::PaymentRequired {
//!     flow.pay().await?;
//! }
//! println!("{}", flow.content().unwrap());
//! ```

pub mod error;
mod flow;
pub mod hooks;
pub mod state;

pub use error::FlowError;
pub use flow::PaymentFlow;
pub use hooks::FlowHooks;
pub use state::{DEFAULT_SETTLE_DELAY, FlowSettings, FlowState, MAX_SETTLE_DELAY, SettleStrategy};
