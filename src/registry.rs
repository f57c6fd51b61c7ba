//! Attestation registry
//!
//! Write path for report attestations. Every write follows the same order:
//! pure pre-flight work first (validation, hashing, encoding, size check),
//! then one existence query against the derived address, then
//! sign → broadcast → confirm.
//!
//! Validation, duplicate and not-found outcomes are returned as `Err` because
//! nothing was written. Failures once the write path reaches the network are
//! reported as a `TransactionResult` with `success: false`.
//!
//! The existence check is check-then-act: two concurrent stores of the same
//! job from the same authority can both pass it.

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::time::Instant;

use crate::codec::{self, MemoPayload};
use crate::connection::ConnectionManager;
use crate::derivation::{report_address, report_storage_address};
use crate::errors::{AttestationError, AttestationResult};
use crate::hashing::hash_report;
use crate::metrics::metrics;
use crate::observability::TraceContext;
use crate::reader::VerificationReader;
use crate::structured_logging::AttestationLogger;
use crate::tx_builder::{plan_attestation_instructions, PreparedTransaction, TransactionSubmitter};
use crate::types::{now_millis, Metadata, ReportAttestation, StorageStats, TransactionResult};
use crate::wallet::ReportSigner;

/// Version string written into enriched metadata
pub const METADATA_VERSION: &str = "1.0";

/// Client identifier written into enriched metadata
pub const SDK_NAME: &str = concat!("report-attest/", env!("CARGO_PKG_VERSION"));

/// Note returned when storage initialization finds an existing account
pub const STORAGE_ALREADY_INITIALIZED: &str = "Storage already initialized";

/// Input to [`AttestationRegistry::store`]
#[derive(Debug, Clone, Default)]
pub struct StoreReportRequest {
    pub job_id: String,
    /// Raw report bytes; only their hash leaves the process
    pub content: Vec<u8>,
    pub report_type: String,
    pub stakeholder: String,
    /// Caller metadata, merged under the enrichment keys
    pub metadata: Metadata,
}

#[derive(Debug, Clone)]
pub struct AttestationRegistry {
    connection: ConnectionManager,
    submitter: TransactionSubmitter,
    reader: VerificationReader,
}

impl AttestationRegistry {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            submitter: TransactionSubmitter::new(connection.clone()),
            reader: VerificationReader::new(connection.clone()),
            connection,
        }
    }

    /// Hash a report and anchor its attestation on the ledger
    pub async fn store(
        &self,
        request: StoreReportRequest,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        const OP: &str = "store";
        let trace = TraceContext::new("store_report");
        let logger = AttestationLogger::new(OP, trace.correlation_id().clone());
        metrics().record_attempt(OP);

        let authority = signer.pubkey();
        let prepared = self
            .prepare_store(&request, &authority)
            .inspect_err(|e| reject(&logger, OP, &request.job_id, e))?;

        let derived = report_address(&request.job_id, &authority, self.connection.namespace())
            .inspect_err(|e| reject(&logger, OP, &request.job_id, e))?;

        match self.connection.rpc().account_exists(&derived.address).await {
            Ok(true) => {
                logger.log_duplicate(&request.job_id, &derived.address.to_string());
                metrics().duplicates_rejected.inc();
                metrics().record_failure(OP, "duplicate");
                return Err(AttestationError::Duplicate {
                    job_id: request.job_id,
                });
            }
            Ok(false) => {}
            Err(e) => return Ok(self.failed(&logger, OP, &request.job_id, e.into())),
        }

        Ok(self
            .submit(&logger, OP, &request.job_id, prepared, signer, trace)
            .await)
    }

    /// Pure part of `store`: validate, hash, enrich, encode and size-check
    fn prepare_store(
        &self,
        request: &StoreReportRequest,
        authority: &Pubkey,
    ) -> AttestationResult<PreparedTransaction> {
        codec::validate_report_fields(&request.job_id, &request.report_type, &request.stakeholder)?;

        let report_hash = hash_report(&request.content);
        let metadata = enrich_metadata(request, report_hash.as_str());

        let memo = codec::encode(MemoPayload::StoreReport {
            job_id: request.job_id.clone(),
            report_hash: report_hash.to_string(),
            report_type: request.report_type.clone(),
            stakeholder: request.stakeholder.clone(),
            metadata,
            authority: authority.to_string(),
            timestamp: now_millis(),
        })?;

        PreparedTransaction::new(plan_attestation_instructions(authority, &memo)?)
    }

    /// Record a verification linked to an existing report
    pub async fn verify(
        &self,
        job_id: &str,
        verification_data: &str,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        const OP: &str = "verify";
        let trace = TraceContext::new("verify_report");
        let logger = AttestationLogger::new(OP, trace.correlation_id().clone());
        metrics().record_attempt(OP);

        let authority = signer.pubkey();
        let prepared = codec::encode(MemoPayload::VerifyReport {
            job_id: job_id.to_string(),
            verification_data: verification_data.to_string(),
            validator: authority.to_string(),
            timestamp: now_millis(),
        })
        .and_then(|memo| plan_attestation_instructions(&authority, &memo))
        .and_then(PreparedTransaction::new)
        .inspect_err(|e| reject(&logger, OP, job_id, e))?;

        let derived = report_address(job_id, &authority, self.connection.namespace())
            .inspect_err(|e| reject(&logger, OP, job_id, e))?;

        match self.connection.rpc().account_exists(&derived.address).await {
            Ok(true) => {}
            Ok(false) => {
                metrics().record_failure(OP, "not_found");
                return Err(AttestationError::NotFound(format!(
                    "No report stored for job '{}'",
                    job_id
                )));
            }
            Err(e) => return Ok(self.failed(&logger, OP, job_id, e.into())),
        }

        Ok(self.submit(&logger, OP, job_id, prepared, signer, trace).await)
    }

    /// Create the per-authority storage record; a no-op when it already exists
    pub async fn initialize_storage(
        &self,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        const OP: &str = "initialize";
        let trace = TraceContext::new("initialize_storage");
        let logger = AttestationLogger::new(OP, trace.correlation_id().clone());
        metrics().record_attempt(OP);

        let authority = signer.pubkey();
        let label = authority.to_string();
        let derived = report_storage_address(&authority, self.connection.namespace())
            .inspect_err(|e| reject(&logger, OP, &label, e))?;

        match self.connection.rpc().account_exists(&derived.address).await {
            Ok(true) => {
                tracing::info!(
                    correlation_id = %logger.correlation_id(),
                    authority = %authority,
                    "Storage already initialized"
                );
                return Ok(TransactionResult::noop(STORAGE_ALREADY_INITIALIZED));
            }
            Ok(false) => {}
            Err(e) => return Ok(self.failed(&logger, OP, &label, e.into())),
        }

        let prepared = codec::encode(MemoPayload::InitializeStorage {
            authority: label.clone(),
            timestamp: now_millis(),
        })
        .and_then(|memo| plan_attestation_instructions(&authority, &memo))
        .and_then(PreparedTransaction::new)
        .inspect_err(|e| reject(&logger, OP, &label, e))?;

        Ok(self.submit(&logger, OP, &label, prepared, signer, trace).await)
    }

    /// Read an attestation back by transaction signature
    pub async fn get_report(&self, signature: &str) -> AttestationResult<Option<ReportAttestation>> {
        let signature = parse_signature(signature)?;
        self.reader.get_report(&signature).await
    }

    /// Storage snapshot for an authority; `None` when storage was never initialized
    pub async fn get_storage_stats(
        &self,
        authority: &Pubkey,
    ) -> AttestationResult<Option<StorageStats>> {
        let derived = report_storage_address(authority, self.connection.namespace())?;
        if !self.connection.rpc().account_exists(&derived.address).await? {
            return Ok(None);
        }

        // The memo log keeps no aggregate counter
        let now = now_millis();
        Ok(Some(StorageStats {
            total_reports: 0,
            authority: authority.to_string(),
            created_at: now,
            updated_at: now,
        }))
    }

    pub async fn transaction_exists(&self, signature: &str) -> AttestationResult<bool> {
        let signature = parse_signature(signature)?;
        Ok(self
            .connection
            .rpc()
            .get_transaction(&signature)
            .await?
            .is_some())
    }

    async fn submit(
        &self,
        logger: &AttestationLogger,
        op: &str,
        job_id: &str,
        prepared: PreparedTransaction,
        signer: &dyn ReportSigner,
        trace: TraceContext,
    ) -> TransactionResult {
        logger.log_submit_attempt(job_id, prepared.wire_size);
        let started = Instant::now();

        match self.submitter.submit(prepared, signer, trace).await {
            Ok(signature) => {
                logger.log_submit_success(
                    job_id,
                    &signature.to_string(),
                    started.elapsed().as_millis() as u64,
                );
                metrics().record_confirmed(op);
                TransactionResult::confirmed(
                    &signature.to_string(),
                    self.connection.explorer_tx_url(&signature),
                )
            }
            Err(e) => self.failed(logger, op, job_id, e),
        }
    }

    fn failed(
        &self,
        logger: &AttestationLogger,
        op: &str,
        job_id: &str,
        err: AttestationError,
    ) -> TransactionResult {
        let signature = err.signature().map(|s| s.to_string());
        logger.log_submit_failure(job_id, &err.to_string(), signature.as_deref(), err.is_retryable());
        metrics().record_failure(op, err.category());
        TransactionResult::failed(err.to_string(), signature)
    }
}

fn reject(logger: &AttestationLogger, op: &str, job_id: &str, err: &AttestationError) {
    logger.log_preflight_rejected(job_id, &err.to_string());
    metrics().record_failure(op, err.category());
}

fn parse_signature(signature: &str) -> AttestationResult<Signature> {
    signature
        .parse()
        .map_err(|e| AttestationError::validation(format!("Invalid signature '{}': {}", signature, e)))
}

/// Caller metadata plus the fixed enrichment keys; enrichment keys win
fn enrich_metadata(request: &StoreReportRequest, report_hash: &str) -> Metadata {
    let mut metadata = request.metadata.clone();
    metadata.insert("jobId".into(), Value::from(request.job_id.as_str()));
    metadata.insert("reportType".into(), Value::from(request.report_type.as_str()));
    metadata.insert("stakeholder".into(), Value::from(request.stakeholder.as_str()));
    metadata.insert("reportHash".into(), Value::from(report_hash));
    metadata.insert("contentLength".into(), Value::from(request.content.len()));
    metadata.insert(
        "generatedAt".into(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    metadata.insert("version".into(), Value::from(METADATA_VERSION));
    metadata.insert("sdk".into(), Value::from(SDK_NAME));
    metadata
}
