#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM chain access for unlock402.
//!
//! This crate is the chain-facing half of the paywall:
//!
//! - [`chain`] - The [`ChainReader`](chain::ChainReader) abstraction over
//!   `eth_getTransactionReceipt` / `eth_getTransactionByHash`, a
//!   per-network registry, and (feature `provider`) an alloy-backed reader
//!   with per-call timeouts
//! - [`verifier`] - [`EvmVerifier`], which re-derives recipient, amount and
//!   payer from chain state for native and ERC-20 payments
//! - [`contract`] - The minimal ERC-20 ABI surface
//! - [`wallet`] - (feature `client`) [`EvmWallet`](wallet::EvmWallet), an
//!   alloy wallet provider implementing the client payment capabilities
//! - [`networks`] - Default RPC endpoints and well-known token deployments
//!
//! # Feature Flags
//!
//! - `provider` - JSON-RPC reader backed by `alloy-provider`
//! - `client` - Signing wallet for paying clients
//! - `telemetry` - `tracing` instrumentation of verification

pub mod chain;
pub mod contract;
pub mod networks;
pub mod verifier;
#[cfg(feature = "client")]
pub mod wallet;

pub use chain::{ChainError, ChainReader, ChainReaders, ReceiptSummary, TransactionSummary};
pub use verifier::EvmVerifier;
