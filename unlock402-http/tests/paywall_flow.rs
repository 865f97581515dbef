//! End-to-end paywall test over a real socket.
//!
//! An axum router protects `/api/content/1` with a [`PaywallLayer`]. A
//! [`PaymentFlow`] fetches it, pays through a fake wallet, and retries with
//! the proof. The fake wallet and the fake verifier share one in-memory
//! "chain", so the verifier only accepts transactions the wallet really sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use unlock402::{
    Address, Network, PaymentConfig, PaymentProof, PaymentTerms, PaymentWallet, ProofVerifier,
    TokenReader, TxHash, U256, VerificationOutcome, WalletError,
};
use unlock402_http::client::{FlowError, FlowSettings, FlowState, PaymentFlow};
use unlock402_http::server::Paywall;

const PAY_TO: Address = Address::repeat_byte(0x11);
const PAYER: Address = Address::repeat_byte(0x22);
const PRICE: u64 = 1_000_000_000_000_000;

/// Native transfers keyed by hash: (from, to, value).
type Chain = Arc<Mutex<HashMap<TxHash, (Address, Address, U256)>>>;

struct FakeWallet {
    chain: Chain,
    value: U256,
}

#[async_trait::async_trait]
impl PaymentWallet for FakeWallet {
    fn address(&self) -> Address {
        PAYER
    }

    async fn send_native(&self, _: Network, to: Address, _: U256) -> Result<TxHash, WalletError> {
        let mut chain = self.chain.lock().unwrap();
        let hash = TxHash::with_last_byte(u8::try_from(chain.len() + 1).unwrap());
        chain.insert(hash, (PAYER, to, self.value));
        Ok(hash)
    }

    async fn transfer_token(
        &self,
        _: Network,
        _: Address,
        _: Address,
        _: U256,
    ) -> Result<TxHash, WalletError> {
        Err(WalletError::Send("tokens not supported".into()))
    }

    async fn approve_token(
        &self,
        _: Network,
        _: Address,
        _: Address,
        _: U256,
    ) -> Result<TxHash, WalletError> {
        Err(WalletError::Send("tokens not supported".into()))
    }

    async fn wait_for_confirmation(&self, _: Network, _: TxHash) -> Result<(), WalletError> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenReader for FakeWallet {
    async fn allowance(&self, _: Network, _: Address, _: Address, _: Address) -> Result<U256, WalletError> {
        Ok(U256::ZERO)
    }

    async fn balance_of(&self, _: Network, _: Address, _: Address) -> Result<U256, WalletError> {
        Ok(U256::ZERO)
    }
}

#[derive(Debug)]
struct LedgerVerifier {
    chain: Chain,
}

#[async_trait::async_trait]
impl ProofVerifier for LedgerVerifier {
    async fn verify(&self, proof: &PaymentProof, config: &PaymentConfig) -> VerificationOutcome {
        let Some(&(from, to, value)) = self.chain.lock().unwrap().get(&proof.transaction_hash) else {
            return VerificationOutcome::TransactionNotFound;
        };
        if to != config.pay_to() {
            VerificationOutcome::RecipientMismatch
        } else if value < config.amount() {
            VerificationOutcome::AmountInsufficient
        } else if from != proof.payer {
            VerificationOutcome::PayerMismatch
        } else {
            VerificationOutcome::Verified
        }
    }
}

async fn content() -> axum::Json<Value> {
    axum::Json(json!({"success": true, "content": "the premium article"}))
}

/// Serves the paywalled router on an ephemeral port and returns the content URL.
async fn serve(chain: Chain) -> url::Url {
    let config = PaymentConfig::native(
        PaymentTerms::new(Network::BaseSepolia, PAY_TO, U256::from(PRICE), "")
            .with_description("Premium article"),
    );
    let paywall = Paywall::new(LedgerVerifier { chain });
    let app = Router::new().route(
        "/api/content/1",
        get(content).layer(paywall.with_config(config)),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}/api/content/1").parse().unwrap()
}

fn flow(chain: &Chain, value: u64) -> PaymentFlow<FakeWallet> {
    let wallet = FakeWallet {
        chain: Arc::clone(chain),
        value: U256::from(value),
    };
    PaymentFlow::new(wallet).with_settings(FlowSettings::default().with_settle_delay(Duration::ZERO))
}

#[tokio::test]
async fn paying_unlocks_content() {
    let chain = Chain::default();
    let url = serve(Arc::clone(&chain)).await;
    let mut flow = flow(&chain, PRICE);

    flow.fetch_content(url).await.unwrap();
    assert_eq!(flow.state(), FlowState::PaymentRequired);
    let descriptor = flow.descriptor().unwrap();
    assert_eq!(descriptor.pay_to, PAY_TO);
    assert_eq!(descriptor.resource, "/api/content/1");
    assert_eq!(descriptor.description.as_deref(), Some("Premium article"));

    flow.pay().await.unwrap();
    assert_eq!(flow.state(), FlowState::Success);
    assert_eq!(flow.content().unwrap()["content"], "the premium article");
    assert_eq!(chain.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn underpayment_is_refused() {
    let chain = Chain::default();
    let url = serve(Arc::clone(&chain)).await;
    let mut flow = flow(&chain, PRICE - 1);

    flow.fetch_content(url).await.unwrap();
    let err = flow.pay().await.unwrap_err();
    assert!(matches!(err, FlowError::VerificationFailed));
    assert_eq!(flow.state(), FlowState::Error);
    assert!(flow.content().is_none());
}

#[tokio::test]
async fn forged_proof_gets_generic_402() {
    let chain = Chain::default();
    let url = serve(Arc::clone(&chain)).await;

    let proof = json!({
        "version": "1",
        "network": "base-sepolia",
        "transactionHash": TxHash::repeat_byte(0x99),
        "payer": PAYER,
    });
    let encoded = unlock402::encoding::encode_json(&proof).unwrap();
    let response = reqwest::Client::new()
        .get(url)
        .header("X-Payment", encoded)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PAYMENT_REQUIRED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "payment verification failed");
    assert!(body.get("paymentDetails").is_none());
}
