#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! HTTP transport for unlock402.
//!
//! Provides the header codec for payment descriptors and proofs, the JSON
//! envelope of `402` responses, and (feature-gated) both ends of the
//! exchange: an axum/tower layer that challenges and verifies requests, and
//! a client-side state machine that pays and retries.
//!
//! # Modules
//!
//! - [`constants`] - Header names
//! - [`headers`] - Descriptor and proof header encoding/decoding
//! - [`types`] - JSON body of `402` responses
//! - [`error`] - Codec error types
//! - `server` - Paywall layer (feature: `server`)
//! - `client` - Payment flow orchestrator (feature: `client`)

pub mod constants;
pub mod error;
pub mod headers;
pub mod types;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;

pub use error::{DescriptorError, HttpError, ProofError};
pub use types::PaymentRequiredBody;
