//! Structured logging for attestation operations

use crate::observability::CorrelationId;

/// Per-operation logger; every event carries the operation's correlation id
#[derive(Debug, Clone)]
pub struct AttestationLogger {
    correlation_id: CorrelationId,
    operation: &'static str,
}

impl AttestationLogger {
    pub fn new(operation: &'static str, correlation_id: CorrelationId) -> Self {
        Self {
            correlation_id,
            operation,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn log_preflight_rejected(&self, job_id: &str, reason: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            operation = self.operation,
            job_id = %job_id,
            reason = %reason,
            "Pre-flight validation failed"
        );
    }

    pub fn log_duplicate(&self, job_id: &str, address: &str) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            operation = self.operation,
            job_id = %job_id,
            address = %address,
            "Record already exists, write skipped"
        );
    }

    pub fn log_submit_attempt(&self, job_id: &str, payload_len: usize) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            operation = self.operation,
            job_id = %job_id,
            payload_len = %payload_len,
            "Submitting attestation transaction"
        );
    }

    pub fn log_submit_success(&self, job_id: &str, signature: &str, latency_ms: u64) {
        tracing::info!(
            correlation_id = %self.correlation_id,
            operation = self.operation,
            job_id = %job_id,
            signature = %signature,
            latency_ms = %latency_ms,
            "Attestation confirmed"
        );
    }

    pub fn log_submit_failure(
        &self,
        job_id: &str,
        error: &str,
        signature: Option<&str>,
        retryable: bool,
    ) {
        tracing::warn!(
            correlation_id = %self.correlation_id,
            operation = self.operation,
            job_id = %job_id,
            error = %error,
            signature = ?signature,
            retryable,
            "Attestation transaction failed"
        );
    }
}
