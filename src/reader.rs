//! Verification reader
//!
//! Turns a transaction signature back into a typed [`ReportAttestation`].
//! Anything that is not one of our payloads reads as `None`; only RPC
//! failures are errors.

use serde_json::Value;
use solana_sdk::signature::Signature;
use tracing::debug;

use crate::codec::{self, AttestationMemo, MemoPayload};
use crate::compat;
use crate::connection::ConnectionManager;
use crate::errors::AttestationResult;
use crate::metrics::metrics;
use crate::tx_builder::MEMO_PROGRAM_ID;
use crate::types::{Metadata, ReportAttestation};

#[derive(Debug, Clone)]
pub struct VerificationReader {
    connection: ConnectionManager,
}

impl VerificationReader {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    pub async fn get_report(
        &self,
        signature: &Signature,
    ) -> AttestationResult<Option<ReportAttestation>> {
        let Some(transaction) = self.connection.rpc().get_transaction(signature).await? else {
            debug!(signature = %signature, "Transaction not found");
            metrics().reports_missing.inc();
            return Ok(None);
        };

        let memo = compat::instruction_data_for_program(&transaction.message, &MEMO_PROGRAM_ID)
            .find_map(codec::decode);

        let record = memo.and_then(|memo| to_attestation(memo, signature));
        match &record {
            Some(r) => {
                debug!(signature = %signature, job_id = %r.job_id, verified = r.verified, "Attestation read");
                metrics().reports_read.inc();
            }
            None => {
                debug!(signature = %signature, "No attestation memo in transaction");
                metrics().reports_missing.inc();
            }
        }
        Ok(record)
    }
}

/// Map a decoded memo to its record; storage initialization has none
fn to_attestation(memo: AttestationMemo, signature: &Signature) -> Option<ReportAttestation> {
    match memo.payload {
        MemoPayload::StoreReport {
            job_id,
            report_hash,
            report_type,
            stakeholder,
            metadata,
            authority,
            timestamp,
        } => Some(ReportAttestation {
            job_id,
            report_hash,
            report_type,
            stakeholder,
            metadata,
            timestamp,
            authority,
            transaction_signature: signature.to_string(),
            verified: false,
            verified_at: None,
            validator: None,
        }),
        MemoPayload::VerifyReport {
            job_id,
            verification_data,
            validator,
            timestamp,
        } => {
            let mut metadata = Metadata::new();
            metadata.insert("verificationData".to_string(), Value::String(verification_data));
            Some(ReportAttestation {
                job_id,
                report_hash: String::new(),
                report_type: String::new(),
                stakeholder: String::new(),
                metadata,
                timestamp,
                authority: validator.clone(),
                transaction_signature: signature.to_string(),
                verified: true,
                verified_at: Some(timestamp),
                validator: Some(validator),
            })
        }
        MemoPayload::InitializeStorage { .. } => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::InMemoryLedger;
    use crate::tx_builder::{build_memo, plan_attestation_instructions};
    use crate::types::Network;
    use solana_sdk::{
        hash::Hash, message::Message, pubkey::Pubkey, signature::Keypair, signer::Signer,
        transaction::{Transaction, VersionedTransaction},
    };
    use std::sync::Arc;

    fn setup() -> (Arc<InMemoryLedger>, VerificationReader) {
        let ledger = Arc::new(InMemoryLedger::new());
        let reader = VerificationReader::new(ConnectionManager::new(Network::Devnet, ledger.clone()));
        (ledger, reader)
    }

    fn tx_with_memo(memo: &[u8]) -> VersionedTransaction {
        let payer = Keypair::new();
        let plan = plan_attestation_instructions(&payer.pubkey(), memo).unwrap();
        let tx = Transaction::new_signed_with_payer(
            &plan.instructions,
            Some(&payer.pubkey()),
            &[&payer],
            Hash::new_unique(),
        );
        VersionedTransaction::from(tx)
    }

    #[tokio::test]
    async fn test_missing_transaction_is_none() {
        let (_, reader) = setup();
        assert!(reader.get_report(&Signature::new_unique()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_record_mapping() {
        let (ledger, reader) = setup();
        let sig = ledger.insert_raw_transaction(tx_with_memo(
            br#"{"type":"verify_report","jobId":"job-9","verificationData":"peer reviewed","validator":"Val1","timestamp":77}"#,
        ));

        let record = reader.get_report(&sig).await.unwrap().unwrap();
        assert!(record.verified);
        assert_eq!(record.job_id, "job-9");
        assert_eq!(record.authority, "Val1");
        assert_eq!(record.validator.as_deref(), Some("Val1"));
        assert_eq!(record.verified_at, Some(77));
        assert_eq!(record.metadata["verificationData"], "peer reviewed");
        assert!(record.report_hash.is_empty());
    }

    #[tokio::test]
    async fn test_partial_store_record_is_read() {
        let (ledger, reader) = setup();
        let sig = ledger.insert_raw_transaction(tx_with_memo(
            br#"{"type":"store_report","jobId":"job-42","reportHash":"b5d4045c3f466fa91fe2cc6abe79232a1a57cdf104f7a26e716e0a1e2789df78","authority":"A","timestamp":1}"#,
        ));

        let record = reader.get_report(&sig).await.unwrap().expect("partial record");
        assert_eq!(record.job_id, "job-42");
        assert_eq!(record.authority, "A");
        assert_eq!(record.timestamp, 1);
        assert!(record.report_type.is_empty());
        assert!(record.stakeholder.is_empty());
        assert!(record.metadata.is_empty());
        assert!(!record.verified);
    }

    #[tokio::test]
    async fn test_non_attestation_memos_are_none() {
        let (ledger, reader) = setup();

        for memo in [
            b"hello world".as_slice(),
            br#"{"type":"unknown","jobId":"x"}"#.as_slice(),
            br#"{"type":"initialize_storage","authority":"a","timestamp":1}"#.as_slice(),
            b"\xff\xfe\x00".as_slice(),
        ] {
            let sig = ledger.insert_raw_transaction(tx_with_memo(memo));
            assert!(reader.get_report(&sig).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_transaction_without_memo_is_none() {
        let (ledger, reader) = setup();
        let payer = Pubkey::new_unique();
        let message = Message::new(&[], Some(&payer));
        let sig = ledger.insert_raw_transaction(VersionedTransaction::from(Transaction::new_unsigned(message)));
        assert!(reader.get_report(&sig).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_decodable_memo_wins() {
        let (ledger, reader) = setup();
        let payer = Keypair::new();
        let ixs = vec![
            build_memo(b"not json"),
            build_memo(br#"{"type":"verify_report","jobId":"second","verificationData":"","validator":"v","timestamp":1}"#),
        ];
        let tx = Transaction::new_signed_with_payer(&ixs, Some(&payer.pubkey()), &[&payer], Hash::new_unique());
        let sig = ledger.insert_raw_transaction(VersionedTransaction::from(tx));

        let record = reader.get_report(&sig).await.unwrap().unwrap();
        assert_eq!(record.job_id, "second");
    }

    #[tokio::test]
    async fn test_rpc_failure_is_error() {
        let (ledger, reader) = setup();
        ledger.set_fail_rpc(true);
        assert!(reader.get_report(&Signature::new_unique()).await.is_err());
    }
}
