use std::time::Duration;

use alloy_consensus::Transaction;
use alloy_network::TransactionResponse;
use alloy_primitives::TxHash;
use alloy_provider::{Provider, RootProvider};
use unlock402::Network;
use url::Url;

use super::{ChainError, ChainReader, ReceiptSummary, TransactionSummary};

/// Default upper bound for a single RPC call.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ChainReader`] backed by an alloy HTTP JSON-RPC provider.
///
/// Every call is bounded by a timeout, so a hung node turns into a
/// [`ChainError::Timeout`] instead of a hung request.
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    network: Network,
    provider: RootProvider,
    timeout: Duration,
}

impl RpcChainReader {
    /// Creates a reader for `network` talking to `rpc_url`.
    #[must_use]
    pub fn new(network: Network, rpc_url: Url) -> Self {
        #[cfg(feature = "telemetry")]
        tracing::info!(network = %network, rpc_url = %rpc_url, "Using HTTP transport");
        Self {
            network,
            provider: RootProvider::new_http(rpc_url),
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The network this reader serves.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    /// The per-call timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait::async_trait]
impl ChainReader for RpcChainReader {
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<ReceiptSummary>, ChainError> {
        let receipt = tokio::time::timeout(self.timeout, self.provider.get_transaction_receipt(hash))
            .await
            .map_err(|_| ChainError::Timeout(self.timeout))?
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(receipt.map(|receipt| {
            let logs = receipt
                .inner
                .as_receipt()
                .map(|r| r.logs.iter().map(|log| log.inner.clone()).collect())
                .unwrap_or_default();
            ReceiptSummary {
                status: receipt.status(),
                logs,
            }
        }))
    }

    async fn transaction(&self, hash: TxHash) -> Result<Option<TransactionSummary>, ChainError> {
        let tx = tokio::time::timeout(self.timeout, self.provider.get_transaction_by_hash(hash))
            .await
            .map_err(|_| ChainError::Timeout(self.timeout))?
            .map_err(|e| ChainError::Transport(e.to_string()))?;
        Ok(tx.map(|tx| TransactionSummary {
            from: TransactionResponse::from(&tx),
            to: Transaction::to(&tx),
            value: Transaction::value(&tx),
        }))
    }
}
