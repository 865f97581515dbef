//! Signing wallet for paying clients.
//!
//! [`EvmWallet`] implements the client-side capabilities the payment flow
//! drives: sending native value, calling ERC-20 `transfer` / `approve`,
//! waiting for a receipt, and reading allowance and balance. It holds one
//! local private key and talks to one network.

use std::time::Duration;

use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use alloy_sol_types::sol;
use alloy_transport::TransportError;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use unlock402::{Network, PaymentWallet, TokenReader, WalletError};
use url::Url;

sol! {
    /// ERC-20 calls made by paying clients.
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface ERC20Token {
        function transfer(address to, uint256 amount) external returns (bool);
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Default time to wait for a submitted transaction to be mined.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A local-key wallet connected to a single EVM network.
#[derive(Debug, Clone)]
pub struct EvmWallet {
    network: Network,
    address: Address,
    provider: DynProvider,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl EvmWallet {
    /// Creates a wallet for `network` signing with `signer` and sending through `rpc_url`.
    ///
    /// No RPC call is made; use [`EvmWallet::connect`] to also check that the
    /// endpoint serves the expected chain.
    #[must_use]
    pub fn new(network: Network, rpc_url: Url, signer: PrivateKeySigner) -> Self {
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(rpc_url)
            .erased();
        #[cfg(feature = "telemetry")]
        tracing::info!(network = %network, address = %address, "Using EVM wallet");
        Self {
            network,
            address,
            provider,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Creates a wallet and checks the endpoint's chain id against `network`.
    ///
    /// # Errors
    ///
    /// Returns [`WalletError::Read`] if the chain id cannot be fetched or is
    /// unknown, and [`WalletError::WrongNetwork`] if it belongs to another
    /// supported network.
    pub async fn connect(
        network: Network,
        rpc_url: Url,
        signer: PrivateKeySigner,
    ) -> Result<Self, WalletError> {
        let wallet = Self::new(network, rpc_url, signer);
        let chain_id = wallet.provider.get_chain_id().await.map_err(read_error)?;
        match Network::from_chain_id(chain_id) {
            Some(actual) if actual == network => Ok(wallet),
            Some(actual) => Err(WalletError::WrongNetwork {
                expected: network,
                actual,
            }),
            None => Err(WalletError::Read(format!("unsupported chain id {chain_id}"))),
        }
    }

    /// Sets how long [`PaymentWallet::wait_for_confirmation`] waits.
    #[must_use]
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Sets the interval between receipt polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The network this wallet sends on.
    #[must_use]
    pub const fn network(&self) -> Network {
        self.network
    }

    fn ensure_network(&self, expected: Network) -> Result<(), WalletError> {
        if self.network == expected {
            Ok(())
        } else {
            Err(WalletError::WrongNetwork {
                expected,
                actual: self.network,
            })
        }
    }
}

fn send_error(err: impl std::fmt::Display) -> WalletError {
    WalletError::Send(err.to_string())
}

fn read_error(err: TransportError) -> WalletError {
    WalletError::Read(err.to_string())
}

#[async_trait::async_trait]
impl PaymentWallet for EvmWallet {
    fn address(&self) -> Address {
        self.address
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn send_native(
        &self,
        network: Network,
        to: Address,
        value: U256,
    ) -> Result<TxHash, WalletError> {
        self.ensure_network(network)?;
        let tx = TransactionRequest::default()
            .with_from(self.address)
            .with_to(to)
            .with_value(value);
        let pending = self.provider.send_transaction(tx).await.map_err(send_error)?;
        Ok(*pending.tx_hash())
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn transfer_token(
        &self,
        network: Network,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        self.ensure_network(network)?;
        let contract = ERC20Token::new(token, self.provider.clone());
        let pending = contract
            .transfer(to, amount)
            .from(self.address)
            .send()
            .await
            .map_err(send_error)?;
        Ok(*pending.tx_hash())
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn approve_token(
        &self,
        network: Network,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<TxHash, WalletError> {
        self.ensure_network(network)?;
        let contract = ERC20Token::new(token, self.provider.clone());
        let pending = contract
            .approve(spender, amount)
            .from(self.address)
            .send()
            .await
            .map_err(send_error)?;
        Ok(*pending.tx_hash())
    }

    #[cfg_attr(feature = "telemetry", instrument(skip(self), err))]
    async fn wait_for_confirmation(&self, network: Network, tx: TxHash) -> Result<(), WalletError> {
        self.ensure_network(network)?;
        let poll = async {
            loop {
                let receipt = self
                    .provider
                    .get_transaction_receipt(tx)
                    .await
                    .map_err(read_error)?;
                match receipt {
                    Some(receipt) if receipt.status() => return Ok(()),
                    Some(_) => return Err(WalletError::Reverted(tx)),
                    None => tokio::time::sleep(self.poll_interval).await,
                }
            }
        };
        tokio::time::timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| WalletError::ConfirmationTimeout(tx))?
    }
}

#[async_trait::async_trait]
impl TokenReader for EvmWallet {
    async fn allowance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, WalletError> {
        self.ensure_network(network)?;
        ERC20Token::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| WalletError::Read(e.to_string()))
    }

    async fn balance_of(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, WalletError> {
        self.ensure_network(network)?;
        ERC20Token::new(token, self.provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| WalletError::Read(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256};
    use serde_json::{Value, json};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    use super::*;

    /// Answers every JSON-RPC method with a fixed result, echoing the request id.
    struct JsonRpc(fn(&str) -> Value);

    impl Respond for JsonRpc {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = request.body_json().unwrap();
            let method = body["method"].as_str().unwrap_or_default();
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": (self.0)(method),
            }))
        }
    }

    async fn node(answer: fn(&str) -> Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(JsonRpc(answer))
            .mount(&server)
            .await;
        server
    }

    fn url(server: &MockServer) -> Url {
        server.uri().parse().unwrap()
    }

    #[tokio::test]
    async fn connect_accepts_matching_chain() {
        let server = node(|_| json!("0x14a34")).await;
        let wallet = EvmWallet::connect(Network::BaseSepolia, url(&server), PrivateKeySigner::random())
            .await
            .unwrap();
        assert_eq!(wallet.network(), Network::BaseSepolia);
    }

    #[tokio::test]
    async fn connect_rejects_other_chain() {
        let server = node(|_| json!("0x2105")).await;
        let err = EvmWallet::connect(Network::BaseSepolia, url(&server), PrivateKeySigner::random())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::WrongNetwork {
                expected: Network::BaseSepolia,
                actual: Network::Base,
            }
        );
    }

    #[tokio::test]
    async fn reads_allowance() {
        let server = node(|_| {
            json!("0x00000000000000000000000000000000000000000000000000000000000f4240")
        })
        .await;
        let wallet = EvmWallet::new(Network::BaseSepolia, url(&server), PrivateKeySigner::random());
        let allowance = wallet
            .allowance(
                Network::BaseSepolia,
                address!("0x036CbD53842c5426634e7929541eC2318f3dCF7e"),
                wallet.address(),
                address!("0x00000000000000000000000000000000000000aa"),
            )
            .await
            .unwrap();
        assert_eq!(allowance, U256::from(1_000_000u64));
    }

    #[tokio::test]
    async fn refuses_payment_on_other_network() {
        let server = node(|_| Value::Null).await;
        let wallet = EvmWallet::new(Network::BaseSepolia, url(&server), PrivateKeySigner::random());
        let err = wallet
            .send_native(Network::Base, Address::ZERO, U256::from(1))
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::WrongNetwork { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unmined_transaction_times_out() {
        let server = node(|_| Value::Null).await;
        let wallet = EvmWallet::new(Network::BaseSepolia, url(&server), PrivateKeySigner::random())
            .with_confirmation_timeout(Duration::from_millis(200))
            .with_poll_interval(Duration::from_millis(20));
        let tx = b256!("0x2222222222222222222222222222222222222222222222222222222222222222");
        let err = wallet
            .wait_for_confirmation(Network::BaseSepolia, tx)
            .await
            .unwrap_err();
        assert_eq!(err, WalletError::ConfirmationTimeout(tx));
    }
}
