//! On-chain proof verification.
//!
//! [`EvmVerifier`] treats a [`PaymentProof`] as nothing more than a pointer to
//! a transaction. Recipient, amount and payer are re-derived from the
//! receipt and transaction returned by the chain, never taken from the proof.
//!
//! Native payments are checked against the transaction's `to`, `value` and
//! `from`. Token payments are checked against the ERC-20 `Transfer` logs in
//! the receipt.

use alloy_primitives::{Address, Log, U256};
use alloy_sol_types::SolEvent;
#[cfg(feature = "telemetry")]
use tracing::instrument;
use unlock402::{PaymentConfig, PaymentProof, ProofVerifier, VerificationOutcome};

use crate::chain::{ChainError, ChainReader, ChainReaders, ReceiptSummary};
use crate::contract::IERC20;

/// Verifies payment proofs against EVM chain state.
#[derive(Debug, Clone, Default)]
pub struct EvmVerifier {
    readers: ChainReaders,
}

impl EvmVerifier {
    /// Creates a verifier that reads chain state through `readers`.
    #[must_use]
    pub const fn new(readers: ChainReaders) -> Self {
        Self { readers }
    }

    /// The registered chain readers.
    #[must_use]
    pub const fn readers(&self) -> &ChainReaders {
        &self.readers
    }

    async fn check(
        &self,
        proof: &PaymentProof,
        config: &PaymentConfig,
    ) -> Result<(), VerificationOutcome> {
        if proof.network != config.network() {
            return Err(VerificationOutcome::NetworkMismatch);
        }
        let reader = self
            .readers
            .get(proof.network)
            .ok_or(VerificationOutcome::UnsupportedNetwork)?;

        let receipt = assert_receipt_success(reader.as_ref(), proof).await?;
        match config.token_asset() {
            None => assert_native_transfer(reader.as_ref(), proof, config).await,
            Some(token) => {
                let matched = find_transfer_log(
                    &receipt.logs,
                    token.address,
                    proof.payer,
                    config.pay_to(),
                    config.amount(),
                );
                if matched {
                    Ok(())
                } else {
                    Err(VerificationOutcome::NoMatchingTransfer)
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl ProofVerifier for EvmVerifier {
    #[cfg_attr(
        feature = "telemetry",
        instrument(
            name = "unlock402.verify",
            skip_all,
            fields(
                network = %proof.network,
                tx = %proof.transaction_hash,
                payer = %proof.payer,
            )
        )
    )]
    async fn verify(&self, proof: &PaymentProof, config: &PaymentConfig) -> VerificationOutcome {
        let outcome = match self.check(proof, config).await {
            Ok(()) => VerificationOutcome::Verified,
            Err(outcome) => outcome,
        };
        #[cfg(feature = "telemetry")]
        if outcome.is_verified() {
            tracing::info!("payment verified");
        } else {
            tracing::warn!(reason = outcome.reason(), %outcome, "payment not verified");
        }
        outcome
    }
}

fn rpc_error(err: ChainError) -> VerificationOutcome {
    VerificationOutcome::RpcError(err.to_string())
}

/// Fetches the receipt for the proof's transaction and requires a successful status.
async fn assert_receipt_success(
    reader: &dyn ChainReader,
    proof: &PaymentProof,
) -> Result<ReceiptSummary, VerificationOutcome> {
    let receipt = reader
        .transaction_receipt(proof.transaction_hash)
        .await
        .map_err(rpc_error)?
        .ok_or(VerificationOutcome::TransactionNotFound)?;
    if receipt.status {
        Ok(receipt)
    } else {
        Err(VerificationOutcome::TransactionFailed)
    }
}

/// Checks recipient, value and sender of a native-currency transfer.
async fn assert_native_transfer(
    reader: &dyn ChainReader,
    proof: &PaymentProof,
    config: &PaymentConfig,
) -> Result<(), VerificationOutcome> {
    let tx = reader
        .transaction(proof.transaction_hash)
        .await
        .map_err(rpc_error)?
        .ok_or(VerificationOutcome::TransactionNotFound)?;
    if tx.to != Some(config.pay_to()) {
        return Err(VerificationOutcome::RecipientMismatch);
    }
    if tx.value < config.amount() {
        return Err(VerificationOutcome::AmountInsufficient);
    }
    if tx.from != proof.payer {
        return Err(VerificationOutcome::PayerMismatch);
    }
    Ok(())
}

/// Returns `true` if `logs` contain a `Transfer` emitted by `token` moving at
/// least `amount` from `payer` to `pay_to`.
///
/// `from` and `to` are the low 20 bytes of the first and second indexed
/// topics; the amount is the log data read as a big-endian integer.
#[must_use]
pub fn find_transfer_log(
    logs: &[Log],
    token: Address,
    payer: Address,
    pay_to: Address,
    amount: U256,
) -> bool {
    logs.iter()
        .filter(|log| log.address == token)
        .filter_map(decode_transfer)
        .any(|(from, to, value)| from == payer && to == pay_to && value >= amount)
}

fn decode_transfer(log: &Log) -> Option<(Address, Address, U256)> {
    let topics = log.data.topics();
    if topics.first() != Some(&IERC20::Transfer::SIGNATURE_HASH) {
        return None;
    }
    let from = Address::from_word(*topics.get(1)?);
    let to = Address::from_word(*topics.get(2)?);
    let value = U256::try_from_be_slice(&log.data.data)?;
    Some((from, to, value))
}
