//! Axum middleware that puts payment-gated routes behind HTTP 402.
//!
//! A request without a usable `X-Payment` header is answered with a
//! challenge: status `402`, the payment descriptor as `X-Payment-*` headers
//! and the same descriptor in the JSON body. A request with a proof is
//! handed to a [`ProofVerifier`](unlock402::ProofVerifier); if chain state
//! confirms the payment the wrapped handler runs and its response is returned
//! unchanged, otherwise the request gets a generic `402`.
//!
//! ```ignore
//! let paywall = Paywall::new(EvmVerifier::new(readers));
//! let app = Router::new().route(
//!     "/api/content/1",
//!     get(handler).layer(paywall.with_config(config)),
//! );
//! ```
//!
//! Verification runs on every request; there is no proof cache.

pub mod error;
pub mod layer;
pub mod paygate;

pub use error::PaygateError;
pub use layer::{Paywall, PaywallLayer, PaywallService};
pub use paygate::Paygate;
