//! The client-side payment state machine.

use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use reqwest::Response;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use unlock402::{PaymentDescriptor, PaymentProof, PaymentWallet, TokenReader, TxHash, WalletError};
use url::Url;

use super::error::FlowError;
use super::hooks::FlowHooks;
use super::state::{FlowSettings, FlowState, MAX_SETTLE_DELAY, SettleStrategy};
use crate::constants::X_PAYMENT;
use crate::error::DescriptorError;
use crate::headers::{decode_descriptor_headers, encode_proof_header};
use crate::types::PaymentRequiredBody;

/// Drives one protected resource through payment.
///
/// A flow is owned by a single caller and handles one resource at a time:
/// [`fetch_content`](Self::fetch_content) requests it, and if the server
/// answers `402`, [`pay`](Self::pay) (preceded by
/// [`approve`](Self::approve) for token payments with too little allowance)
/// pays on-chain and retries once with the proof. Failures at any step land
/// in [`FlowState::Error`] with a message and stay there until
/// [`reset`](Self::reset) or the next fetch.
///
/// Every suspension point races the flow's cancellation token; cancelling
/// it from another task ends the current action in `Error` with
/// "request cancelled".
pub struct PaymentFlow<W> {
    http: ClientWithMiddleware,
    wallet: W,
    settings: FlowSettings,
    hooks: Vec<Arc<dyn FlowHooks>>,
    cancel: CancellationToken,
    state: FlowState,
    url: Option<Url>,
    descriptor: Option<PaymentDescriptor>,
    content: Option<Value>,
    error: Option<String>,
    needs_approval: bool,
    transaction_hash: Option<TxHash>,
}

impl<W> std::fmt::Debug for PaymentFlow<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentFlow")
            .field("state", &self.state)
            .field("url", &self.url)
            .field("descriptor", &self.descriptor)
            .field("error", &self.error)
            .field("needs_approval", &self.needs_approval)
            .field("transaction_hash", &self.transaction_hash)
            .field("hooks", &self.hooks.len())
            .finish_non_exhaustive()
    }
}

impl<W> PaymentFlow<W>
where
    W: PaymentWallet + TokenReader,
{
    /// Creates an idle flow paying with `wallet` over a default HTTP client.
    pub fn new(wallet: W) -> Self {
        Self::with_client(
            reqwest_middleware::ClientBuilder::new(reqwest::Client::new()).build(),
            wallet,
        )
    }

    /// Creates an idle flow using `http` for all requests.
    pub fn with_client(http: ClientWithMiddleware, wallet: W) -> Self {
        Self {
            http,
            wallet,
            settings: FlowSettings::default(),
            hooks: Vec::new(),
            cancel: CancellationToken::new(),
            state: FlowState::Idle,
            url: None,
            descriptor: None,
            content: None,
            error: None,
            needs_approval: false,
            transaction_hash: None,
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub const fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adds a lifecycle hook. Hooks run in registration order.
    #[must_use]
    pub fn with_hook(mut self, hook: impl FlowHooks + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> FlowState {
        self.state
    }

    /// Descriptor of the last `402`, if any.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&PaymentDescriptor> {
        self.descriptor.as_ref()
    }

    /// Content received on success.
    #[must_use]
    pub const fn content(&self) -> Option<&Value> {
        self.content.as_ref()
    }

    /// Message of the error that ended the flow.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `true` if a token payment needs an allowance increase before paying.
    #[must_use]
    pub const fn needs_approval(&self) -> bool {
        self.needs_approval
    }

    /// Hash of the submitted payment transaction.
    #[must_use]
    pub const fn transaction_hash(&self) -> Option<TxHash> {
        self.transaction_hash
    }

    /// The wallet paying for this flow.
    #[must_use]
    pub const fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Token that cancels the action in progress when cancelled.
    ///
    /// The token is replaced on [`reset`](Self::reset), and on
    /// [`fetch_content`](Self::fetch_content) once it has been cancelled;
    /// fetch a new one afterwards.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Requests `url` without a proof.
    ///
    /// Clears any previous result first and replaces a cancelled token, so a
    /// cancellation only ends the action it interrupted. A `2xx` response ends in
    /// [`FlowState::Success`] with its JSON body as content; a `402` with a
    /// valid descriptor ends in [`FlowState::PaymentRequired`].
    ///
    /// # Errors
    ///
    /// Returns the [`FlowError`] that moved the flow to [`FlowState::Error`].
    #[cfg_attr(feature = "telemetry", instrument(name = "unlock402.fetch", skip_all, fields(url = %url)))]
    pub async fn fetch_content(&mut self, url: Url) -> Result<(), FlowError> {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
        self.clear();
        self.url = Some(url.clone());
        self.transition(FlowState::Checking);
        let result = self.check(url).await;
        self.conclude(result)
    }

    /// Raises the token allowance of the payment's recipient to the required amount.
    ///
    /// Only meaningful in [`FlowState::PaymentRequired`] for a token payment
    /// that [`needs_approval`](Self::needs_approval); otherwise a no-op. After
    /// the approval is mined the allowance is read again and the flow returns
    /// to [`FlowState::PaymentRequired`].
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] (without changing state) outside
    /// `PaymentRequired`, or the error that moved the flow to `Error`.
    #[cfg_attr(feature = "telemetry", instrument(name = "unlock402.approve", skip_all))]
    pub async fn approve(&mut self) -> Result<(), FlowError> {
        let descriptor = self.pending_descriptor("approve")?;
        if !self.needs_approval {
            return Ok(());
        }
        self.transition(FlowState::Approving);
        let result = self.run_approval(&descriptor).await;
        self.conclude(result)
    }

    /// Pays for the resource and retries the request with the proof.
    ///
    /// If the token allowance is insufficient this performs the approval
    /// instead and returns to [`FlowState::PaymentRequired`] without
    /// transferring; call `pay()` again to pay.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] (without changing state) outside
    /// `PaymentRequired`, or the error that moved the flow to `Error`.
    #[cfg_attr(feature = "telemetry", instrument(name = "unlock402.pay", skip_all))]
    pub async fn pay(&mut self) -> Result<(), FlowError> {
        let descriptor = self.pending_descriptor("pay")?;
        if self.needs_approval {
            return self.approve().await;
        }
        let Some(url) = self.url.clone() else {
            return Err(FlowError::InvalidState {
                action: "pay",
                state: self.state,
            });
        };
        let result = self.run_payment(&descriptor, url).await;
        self.conclude(result)
    }

    /// Returns to [`FlowState::Idle`], clearing descriptor, content and error.
    ///
    /// Cancels the current cancellation token and installs a fresh one.
    pub fn reset(&mut self) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.clear();
        self.transition(FlowState::Idle);
    }

    fn clear(&mut self) {
        self.url = None;
        self.descriptor = None;
        self.content = None;
        self.error = None;
        self.needs_approval = false;
        self.transaction_hash = None;
    }

    fn transition(&mut self, to: FlowState) {
        let from = std::mem::replace(&mut self.state, to);
        if from == to {
            return;
        }
        #[cfg(feature = "telemetry")]
        tracing::debug!(%from, %to, "payment flow state change");
        for hook in &self.hooks {
            hook.on_state_change(from, to);
        }
    }

    fn conclude(&mut self, result: Result<(), FlowError>) -> Result<(), FlowError> {
        if let Err(err) = &result {
            #[cfg(feature = "telemetry")]
            tracing::warn!(error = %err, state = %self.state, "payment flow failed");
            self.error = Some(err.to_string());
            for hook in &self.hooks {
                hook.on_error(err);
            }
            self.transition(FlowState::Error);
        }
        result
    }

    fn succeed(&mut self, content: Value) {
        for hook in &self.hooks {
            hook.on_success(&content);
        }
        self.content = Some(content);
        self.transition(FlowState::Success);
    }

    fn pending_descriptor(&self, action: &'static str) -> Result<PaymentDescriptor, FlowError> {
        match (&self.state, &self.descriptor) {
            (FlowState::PaymentRequired, Some(descriptor)) => Ok(descriptor.clone()),
            _ => Err(FlowError::InvalidState {
                action,
                state: self.state,
            }),
        }
    }

    /// Awaits `fut` unless the flow is cancelled first.
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, FlowError> {
        self.cancel
            .run_until_cancelled(fut)
            .await
            .ok_or(FlowError::Cancelled)
    }

    async fn check(&mut self, url: Url) -> Result<(), FlowError> {
        let response = self.guard(self.http.get(url).send()).await??;
        let status = response.status();
        if status.is_success() {
            let content = self.guard(response.json::<Value>()).await??;
            self.succeed(content);
            return Ok(());
        }
        if status != StatusCode::PAYMENT_REQUIRED {
            return Err(FlowError::UnexpectedStatus(status));
        }

        let descriptor = self.read_descriptor(response).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(
            network = %descriptor.network,
            pay_to = %descriptor.pay_to,
            amount = %descriptor.max_amount_required,
            "payment required"
        );
        self.needs_approval = self.allowance_insufficient(&descriptor).await?;
        self.descriptor = Some(descriptor);
        self.transition(FlowState::PaymentRequired);
        Ok(())
    }

    /// Decodes the descriptor from the headers, or from the JSON body if the
    /// headers carry none.
    async fn read_descriptor(&self, response: Response) -> Result<PaymentDescriptor, FlowError> {
        let decoded = decode_descriptor_headers(response.headers());
        match decoded {
            Ok(descriptor) => Ok(descriptor),
            Err(DescriptorError::NotRequired) => {
                let body = self.guard(response.json::<PaymentRequiredBody>()).await?;
                body.ok()
                    .and_then(|body| body.payment_details)
                    .ok_or(FlowError::Descriptor(DescriptorError::NotRequired))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Reads the allowance granted to the recipient; native payments never need one.
    async fn allowance_insufficient(&self, descriptor: &PaymentDescriptor) -> Result<bool, FlowError> {
        let Some(token) = &descriptor.token else {
            return Ok(false);
        };
        let allowance = self
            .guard(self.wallet.allowance(
                descriptor.network,
                token.address,
                self.wallet.address(),
                descriptor.pay_to,
            ))
            .await??;
        Ok(allowance < descriptor.max_amount_required)
    }

    async fn run_approval(&mut self, descriptor: &PaymentDescriptor) -> Result<(), FlowError> {
        let Some(token) = &descriptor.token else {
            return Ok(());
        };
        let network = descriptor.network;
        let tx = self
            .guard(self.wallet.approve_token(
                network,
                token.address,
                descriptor.pay_to,
                descriptor.max_amount_required,
            ))
            .await??;
        self.guard(self.wallet.wait_for_confirmation(network, tx))
            .await??;
        self.needs_approval = self.allowance_insufficient(descriptor).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(tx = %tx, needs_approval = self.needs_approval, "approval confirmed");
        self.transition(FlowState::PaymentRequired);
        Ok(())
    }

    async fn run_payment(&mut self, descriptor: &PaymentDescriptor, url: Url) -> Result<(), FlowError> {
        self.transition(FlowState::Paying);
        let network = descriptor.network;
        let amount = descriptor.max_amount_required;
        let tx = match &descriptor.token {
            None => {
                self.guard(self.wallet.send_native(network, descriptor.pay_to, amount))
                    .await??
            }
            Some(token) => {
                let available = self
                    .guard(self.wallet.balance_of(network, token.address, self.wallet.address()))
                    .await??;
                if available < amount {
                    return Err(FlowError::InsufficientBalance {
                        required: amount,
                        available,
                    });
                }
                self.guard(self.wallet.transfer_token(
                    network,
                    token.address,
                    descriptor.pay_to,
                    amount,
                ))
                .await??
            }
        };
        #[cfg(feature = "telemetry")]
        tracing::info!(tx = %tx, "payment submitted");
        self.transaction_hash = Some(tx);
        self.transition(FlowState::Confirming);

        match self.settings.settle() {
            SettleStrategy::FixedDelay(delay) => {
                self.guard(tokio::time::sleep(delay.min(MAX_SETTLE_DELAY)))
                    .await?;
            }
            SettleStrategy::AwaitConfirmation { timeout } => {
                let confirmed = tokio::time::timeout(
                    timeout,
                    self.wallet.wait_for_confirmation(network, tx),
                );
                self.guard(confirmed)
                    .await?
                    .map_err(|_| WalletError::ConfirmationTimeout(tx))??;
            }
        }

        self.transition(FlowState::Verifying);
        let proof = PaymentProof::for_descriptor(descriptor, tx, self.wallet.address());
        let header = encode_proof_header(&proof)?;
        let response = self
            .guard(self.http.get(url).header(X_PAYMENT, header).send())
            .await??;
        let status = response.status();
        if status == StatusCode::PAYMENT_REQUIRED {
            return Err(FlowError::VerificationFailed);
        }
        if !status.is_success() {
            return Err(FlowError::UnexpectedStatus(status));
        }
        let content = self.guard(response.json::<Value>()).await??;
        self.succeed(content);
        Ok(())
    }
}
