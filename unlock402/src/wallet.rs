//! Client-side payment capabilities.
//!
//! The orchestrator never signs anything itself. It drives a
//! [`PaymentWallet`] to send value or call a token contract and polls a
//! [`TokenReader`] for allowance and balance after each mutating action.
//! Implementations live outside this crate (see `unlock402-evm`).

use alloy_primitives::{Address, TxHash, U256};

use crate::network::Network;

/// Errors surfaced by wallets and token readers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    /// The user or signer refused to sign.
    #[error("transaction rejected: {0}")]
    Rejected(String),
    /// The wallet is connected to a different network.
    #[error("wallet is on {actual}, payment requires {expected}")]
    WrongNetwork {
        /// Network the payment must be made on.
        expected: Network,
        /// Network the wallet is connected to.
        actual: Network,
    },
    /// Submitting the transaction failed.
    #[error("failed to send transaction: {0}")]
    Send(String),
    /// The transaction was mined but reverted.
    #[error("transaction {0} reverted")]
    Reverted(TxHash),
    /// No receipt appeared within the allotted time.
    #[error("timed out waiting for transaction {0}")]
    ConfirmationTimeout(TxHash),
    /// Reading chain state failed.
    #[error("chain read failed: {0}")]
    Read(String),
}

/// Signs and submits payment transactions on behalf of one account.
#[async_trait::async_trait]
pub trait PaymentWallet: Send + Sync {
    /// The paying account.
    fn address(&self) -> Address;

    /// Sends `value` of the native currency to `to`.
    async fn send_native(
        &self,
        network: Network,
        to: Address,
        value: U256,
    ) -> Result<TxHash, WalletError>;

    /// Calls `transfer(to, amount)` on the `token` contract.
    async fn transfer_token(
        &self,
        network: Network,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError>;

    /// Calls `approve(spender, amount)` on the `token` contract.
    async fn approve_token(
        &self,
        network: Network,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError>;

    /// Resolves once `tx` is mined successfully.
    async fn wait_for_confirmation(&self, network: Network, tx: TxHash) -> Result<(), WalletError>;
}

/// Reads token state that the orchestrator polls around payments.
#[async_trait::async_trait]
pub trait TokenReader: Send + Sync {
    /// Current allowance `owner` has granted `spender` on `token`.
    async fn allowance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WalletError>;

    /// Current `token` balance of `owner`.
    async fn balance_of(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, WalletError>;
}
