#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for paywalled content unlocked through HTTP 402 payments.
//!
//! A protected resource answers an unpaid request with `402 Payment Required`
//! and a [`PaymentDescriptor`] telling the client whom to pay, how much, and on
//! which network. The client pays on-chain and retries with a
//! [`PaymentProof`] pointing at its transaction. The server never trusts the
//! proof's claims: a [`ProofVerifier`] re-derives recipient, amount and payer
//! from chain state before the resource is released.
//!
//! This crate is chain-agnostic apart from using `alloy-primitives` for
//! addresses, hashes and 256-bit amounts. Chain access lives in
//! `unlock402-evm`; the HTTP wire codec, server layer and client
//! orchestrator live in `unlock402-http`.
//!
//! # Modules
//!
//! - [`config`] - Server-side payment configuration ([`PaymentConfig`])
//! - [`descriptor`] - The server-issued payment descriptor
//! - [`encoding`] - Base64 helpers for header payloads
//! - [`network`] - Supported networks
//! - [`proof`] - The client-issued payment proof
//! - [`verify`] - Verification outcomes and the [`ProofVerifier`] trait
//! - [`version`] - Protocol version marker
//! - [`wallet`] - Client-side wallet and token-reader capabilities

pub mod config;
pub mod descriptor;
pub mod encoding;
pub mod network;
pub mod proof;
pub mod verify;
pub mod version;
pub mod wallet;

pub use config::{PaymentConfig, PaymentTerms};
pub use descriptor::{PaymentDescriptor, TokenAsset};
pub use network::{Network, UnknownNetwork};
pub use proof::PaymentProof;
pub use verify::{ProofVerifier, VerificationOutcome};
pub use version::ProtocolVersion;
pub use wallet::{PaymentWallet, TokenReader, WalletError};

pub use alloy_primitives::{Address, TxHash, U256};
