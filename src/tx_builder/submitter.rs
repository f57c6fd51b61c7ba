//! Sign → broadcast → confirm lifecycle
//!
//! The submitter owns no keys. It stamps a fresh blockhash onto a prepared
//! transaction, hands it to the caller's [`ReportSigner`], broadcasts the
//! result and polls until the signature is confirmed, fails on-chain, or the
//! blockhash validity window closes.
//!
//! Failures after signing always carry the signature so the caller can look
//! the transaction up later.

use solana_sdk::{message::Message, signature::Signature, transaction::Transaction};
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::errors::{AttestationError, AttestationResult};
use crate::metrics::{metrics, Timer};
use crate::observability::TraceContext;
use crate::rpc::SignatureState;
use crate::tx_builder::context::ExecutionContext;
use crate::tx_builder::output::PreparedTransaction;
use crate::wallet::ReportSigner;

#[derive(Debug, Clone)]
pub struct TransactionSubmitter {
    connection: ConnectionManager,
}

impl TransactionSubmitter {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Sign, broadcast and confirm; returns the confirmed signature
    pub async fn submit(
        &self,
        prepared: PreparedTransaction,
        signer: &dyn ReportSigner,
        trace: TraceContext,
    ) -> AttestationResult<Signature> {
        let rpc = self.connection.rpc();

        if signer.pubkey() != prepared.fee_payer() {
            return Err(AttestationError::Signing(format!(
                "signer {} is not the fee payer {}",
                signer.pubkey(),
                prepared.fee_payer()
            )));
        }

        let (blockhash, last_valid_block_height) = rpc.latest_blockhash().await?;
        let ctx = ExecutionContext::new(blockhash, last_valid_block_height, trace.child_span("submit"));

        let mut tx = prepared.tx;
        tx.message.recent_blockhash = ctx.blockhash;
        let expected_message = tx.message.clone();

        let signed = signer
            .sign_transaction(tx)
            .await
            .map_err(|e| AttestationError::Signing(e.to_string()))?;
        let signature = check_signed(&signed, &expected_message)?;

        let span = &ctx.trace_context;
        debug!(
            correlation_id = %span.correlation_id(),
            trace_id = %span.trace_id(),
            span_id = %span.span_id,
            parent_span_id = ?span.parent_span_id,
            operation = %span.operation,
            signature = %signature,
            last_valid_block_height,
            size = prepared.wire_size,
            "Broadcasting transaction"
        );

        rpc.send_transaction(&signed).await.map_err(|e| {
            AttestationError::network_with_signature(format!("Broadcast failed: {}", e), signature)
        })?;

        let timer = Timer::start();
        self.await_confirmation(&signature, &ctx).await?;
        timer.observe_duration(&metrics().confirm_latency);

        info!(
            correlation_id = %span.correlation_id(),
            trace_id = %span.trace_id(),
            span_id = %span.span_id,
            signature = %signature,
            elapsed_secs = timer.elapsed_secs(),
            "Transaction confirmed"
        );
        Ok(signature)
    }

    /// Poll until confirmed or the block height passes the validity ceiling
    async fn await_confirmation(
        &self,
        signature: &Signature,
        ctx: &ExecutionContext,
    ) -> AttestationResult<()> {
        let rpc = self.connection.rpc();
        let poll_interval = self.connection.confirm_policy().poll_interval;
        let with_sig = |e: crate::rpc::RpcError| {
            AttestationError::network_with_signature(e.to_string(), *signature)
        };

        let mut polls: u64 = 0;
        loop {
            polls += 1;
            match rpc.signature_state(signature).await.map_err(with_sig)? {
                SignatureState::Confirmed => return Ok(()),
                SignatureState::Failed(reason) => {
                    return Err(AttestationError::network_with_signature(
                        format!("Transaction failed on-chain: {}", reason),
                        *signature,
                    ));
                }
                SignatureState::Pending => {}
            }

            let height = rpc.block_height().await.map_err(with_sig)?;

            #[cfg(feature = "perf")]
            debug!(signature = %signature, polls, height, ceiling = ctx.last_valid_block_height, "Confirmation poll");

            if ctx.is_expired(height) {
                warn!(
                    correlation_id = %ctx.trace_context.correlation_id(),
                    trace_id = %ctx.trace_context.trace_id(),
                    signature = %signature,
                    polls,
                    height,
                    "Blockhash expired before confirmation"
                );
                return Err(AttestationError::network_with_signature(
                    format!(
                        "Transaction not confirmed before block height {} (current {})",
                        ctx.last_valid_block_height, height
                    ),
                    *signature,
                ));
            }

            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Poll a signature that has no blockhash ceiling (faucet transfers)
    pub async fn confirm_signature(&self, signature: &Signature) -> AttestationResult<()> {
        let rpc = self.connection.rpc();
        let policy = self.connection.confirm_policy();

        for _ in 0..policy.max_unbounded_polls {
            match rpc.signature_state(signature).await.map_err(|e| {
                AttestationError::network_with_signature(e.to_string(), *signature)
            })? {
                SignatureState::Confirmed => return Ok(()),
                SignatureState::Failed(reason) => {
                    return Err(AttestationError::network_with_signature(
                        format!("Transaction failed on-chain: {}", reason),
                        *signature,
                    ));
                }
                SignatureState::Pending => tokio::time::sleep(policy.poll_interval).await,
            }
        }

        Err(AttestationError::network_with_signature(
            format!(
                "Transaction not confirmed after {} polls",
                policy.max_unbounded_polls
            ),
            *signature,
        ))
    }
}

/// Accept a signer's output only if it signs exactly the message we sent
fn check_signed(signed: &Transaction, expected: &Message) -> AttestationResult<Signature> {
    if signed.message != *expected {
        return Err(AttestationError::Signing(
            "signer returned a different message than the one submitted".to_string(),
        ));
    }
    let required = expected.header.num_required_signatures as usize;
    if signed.signatures.len() != required {
        return Err(AttestationError::Signing(format!(
            "signer returned {} signatures, {} required",
            signed.signatures.len(),
            required
        )));
    }
    let signature = signed.signatures.first().copied().ok_or_else(|| {
        AttestationError::Signing("signer returned a transaction without signatures".to_string())
    })?;
    if !signed.is_signed() || signed.verify().is_err() {
        return Err(AttestationError::Signing(
            "signer returned a transaction without a valid signature".to_string(),
        ));
    }
    Ok(signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConfirmPolicy;
    use crate::test_utils::{InMemoryLedger, MockSigner};
    use crate::tx_builder::instructions::plan_attestation_instructions;
    use crate::types::Network;
    use solana_sdk::pubkey::Pubkey;
    use std::sync::Arc;
    use std::time::Duration;

    fn connection(ledger: Arc<InMemoryLedger>) -> ConnectionManager {
        ConnectionManager::new(Network::Devnet, ledger).with_confirm_policy(ConfirmPolicy {
            poll_interval: Duration::from_millis(1),
            max_unbounded_polls: 3,
        })
    }

    fn prepared_for(authority: &Pubkey) -> PreparedTransaction {
        let plan = plan_attestation_instructions(authority, b"{\"type\":\"initialize_storage\"}").unwrap();
        PreparedTransaction::new(plan).unwrap()
    }

    #[tokio::test]
    async fn test_submit_confirms_and_records_transaction() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::new();

        let sig = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap();

        assert_eq!(ledger.sent_transactions(), 1);
        assert!(ledger.has_transaction(&sig));
    }

    #[tokio::test]
    async fn test_signer_rejection_is_signing_error_without_broadcast() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::rejecting();

        let err = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::Signing(_)));
        assert_eq!(ledger.sent_transactions(), 0);
    }

    #[tokio::test]
    async fn test_signer_returning_empty_transaction_is_signing_error() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::empty();

        let err = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::Signing(_)));
        assert_eq!(ledger.sent_transactions(), 0);
    }

    #[tokio::test]
    async fn test_signer_substituting_message_is_signing_error() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::substituting();

        let err = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("different message"));
        assert_eq!(ledger.sent_transactions(), 0);
    }

    #[test]
    fn test_check_signed_rejects_missing_signatures() {
        let payer = Pubkey::new_unique();
        let mut tx = prepared_for(&payer).tx;
        let expected = tx.message.clone();
        tx.signatures.clear();

        let err = check_signed(&tx, &expected).unwrap_err();
        assert!(err.to_string().contains("0 signatures, 1 required"));
    }

    #[tokio::test]
    async fn test_broadcast_failure_carries_signature() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_fail_send(true);
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::new();

        let err = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();

        assert!(matches!(err, AttestationError::Network { .. }));
        assert!(err.signature().is_some());
    }

    #[tokio::test]
    async fn test_expired_blockhash_times_out_with_signature() {
        let ledger = Arc::new(InMemoryLedger::new().with_blockhash_window(3));
        ledger.set_never_confirm(true);
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::new();

        let err = submitter
            .submit(prepared_for(&signer.pubkey()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not confirmed before block height"));
        assert!(err.signature().is_some());
    }

    #[tokio::test]
    async fn test_foreign_fee_payer_rejected() {
        let ledger = Arc::new(InMemoryLedger::new());
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));
        let signer = MockSigner::new();

        let err = submitter
            .submit(prepared_for(&Pubkey::new_unique()), &signer, TraceContext::new("test"))
            .await
            .unwrap_err();
        assert!(matches!(err, AttestationError::Signing(_)));
        assert_eq!(ledger.rpc_calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_signature_is_bounded() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_never_confirm(true);
        let submitter = TransactionSubmitter::new(connection(ledger.clone()));

        let err = submitter
            .confirm_signature(&Signature::new_unique())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 3 polls"));
        assert_eq!(ledger.rpc_calls(), 3);
    }
}
