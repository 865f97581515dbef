//! The payment proof a client attaches when retrying a protected request.
//!
//! A [`PaymentProof`] is created once the client has submitted its payment
//! transaction. It is a pointer, not evidence: the server uses only the
//! transaction hash and re-derives every other fact from the chain.

use alloy_primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};

use crate::descriptor::PaymentDescriptor;
use crate::network::Network;
use crate::version::ProtocolVersion;

/// Client-issued pointer at a transaction believed to satisfy a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentProof {
    /// Protocol version tag; must match the descriptor.
    pub version: ProtocolVersion,
    /// Network the transaction was sent on; must match the descriptor.
    pub network: Network,
    /// Hash of the payment transaction.
    pub transaction_hash: TxHash,
    /// Account claimed to have sent the payment.
    pub payer: Address,
}

impl PaymentProof {
    /// Builds a proof answering `descriptor` with the given transaction.
    #[must_use]
    pub const fn for_descriptor(
        descriptor: &PaymentDescriptor,
        transaction_hash: TxHash,
        payer: Address,
    ) -> Self {
        Self {
            version: ProtocolVersion,
            network: descriptor.network,
            transaction_hash,
            payer,
        }
    }
}
