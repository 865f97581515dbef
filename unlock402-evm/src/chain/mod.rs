//! Read access to EVM chain state.
//!
//! The verifier needs exactly two JSON-RPC calls: the receipt of a
//! transaction (for status and event logs) and the transaction itself (for
//! sender, recipient and value). [`ChainReader`] abstracts them so the
//! verification rules can be exercised without a node, and
//! [`ChainReaders`] routes each proof to the reader of its network.
//!
//! # Key Types
//!
//! - [`ChainReader`] - Receipt and transaction lookups
//! - [`ChainReaders`] - Per-network registry of readers
//! - [`ReceiptSummary`] / [`TransactionSummary`] - The facts verification uses
//! - `RpcChainReader` - (feature `provider`) alloy JSON-RPC reader with timeouts

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Log, TxHash, U256};
use unlock402::Network;

#[cfg(feature = "provider")]
mod provider;
#[cfg(feature = "provider")]
pub use provider::*;

/// Errors returned by chain readers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// The RPC transport or node returned an error.
    #[error("rpc transport error: {0}")]
    Transport(String),
    /// The call did not complete in time.
    #[error("rpc call timed out after {0:?}")]
    Timeout(Duration),
}

/// The parts of a transaction receipt used for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    /// `true` if the transaction executed successfully.
    pub status: bool,
    /// Event logs emitted by the transaction, in order.
    pub logs: Vec<Log>,
}

/// The parts of a transaction used for verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSummary {
    /// Sender.
    pub from: Address,
    /// Recipient; `None` for contract creation.
    pub to: Option<Address>,
    /// Native value transferred.
    pub value: U256,
}

/// Looks up transactions and receipts on one chain.
#[async_trait::async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetches the receipt of `hash`, or `None` if it is not mined (or unknown).
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError>;

    /// Fetches the transaction `hash`, or `None` if the node does not know it.
    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionSummary>, ChainError>;
}

#[async_trait::async_trait]
impl<T: ChainReader + ?Sized> ChainReader for Arc<T> {
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError> {
        (**self).transaction_receipt(hash).await
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionSummary>, ChainError> {
        (**self).transaction(hash).await
    }
}

/// Registry of chain readers keyed by network.
///
/// Built once by the application and handed to the verifier; there is no
/// process-wide default.
#[derive(Clone, Default)]
pub struct ChainReaders {
    readers: HashMap<Network, Arc<dyn ChainReader>>,
}

impl fmt::Debug for ChainReaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainReaders")
            .field("networks", &self.networks())
            .finish()
    }
}

impl ChainReaders {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `reader` for `network`, replacing any previous reader.
    pub fn insert<R: ChainReader + 'static>(&mut self, network: Network, reader: R) -> &mut Self {
        self.readers.insert(network, Arc::new(reader));
        self
    }

    /// Builder-style variant of [`ChainReaders::insert`].
    #[must_use]
    pub fn with<R: ChainReader + 'static>(mut self, network: Network, reader: R) -> Self {
        self.insert(network, reader);
        self
    }

    /// Returns the reader registered for `network`.
    #[must_use]
    pub fn get(&self, network: Network) -> Option<&Arc<dyn ChainReader>> {
        self.readers.get(&network)
    }

    /// Networks with a registered reader, sorted.
    #[must_use]
    pub fn networks(&self) -> Vec<Network> {
        let mut networks: Vec<_> = self.readers.keys().copied().collect();
        networks.sort();
        networks
    }

    /// Returns `true` if no reader is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}
