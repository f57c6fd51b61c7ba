//! Error types for the attestation layer
//!
//! The taxonomy mirrors the lifecycle of a write:
//! - pre-flight checks (`Validation`) never reach the network
//! - idempotency checks (`Duplicate`, `NotFound`) are decided from a ledger read
//! - `Network` and `Signing` cover the submit path and are reported to callers
//!   of write operations as a failed `TransactionResult`

use solana_sdk::signature::Signature;
use thiserror::Error;

use crate::rpc::RpcError;

/// Result alias used across the crate
pub type AttestationResult<T> = std::result::Result<T, AttestationError>;

#[derive(Error, Debug)]
pub enum AttestationError {
    /// Size or format violation detected before any network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record already exists at the derived report address
    #[error("Report already stored for job '{job_id}'")]
    Duplicate { job_id: String },

    /// No prior record for the requested job, or no such transaction
    #[error("Not found: {0}")]
    NotFound(String),

    /// RPC failure, broadcast failure or confirmation timeout
    ///
    /// When the transaction was already signed, its signature is attached so
    /// the caller can look it up manually later.
    #[error("Network error: {message}")]
    Network {
        message: String,
        signature: Option<Signature>,
    },

    /// The external signer rejected or failed to produce a signature
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl AttestationError {
    /// Check if re-invoking the operation might succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Validation(_) => false,
            Self::Duplicate { .. } => false,
            Self::NotFound(_) => false,
            Self::Signing(_) => false,
        }
    }

    /// Get the error category for metrics and logs
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Duplicate { .. } => "duplicate",
            Self::NotFound(_) => "not_found",
            Self::Network { .. } => "network",
            Self::Signing(_) => "signing",
        }
    }

    /// Signature of the attempted transaction, if one was produced
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            Self::Network { signature, .. } => signature.as_ref(),
            _ => None,
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            signature: None,
        }
    }

    /// Network failure after the transaction was signed
    pub fn network_with_signature(message: impl Into<String>, signature: Signature) -> Self {
        Self::Network {
            message: message.into(),
            signature: Some(signature),
        }
    }
}

impl From<RpcError> for AttestationError {
    fn from(err: RpcError) -> Self {
        Self::network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AttestationError::Duplicate {
            job_id: "job-42".to_string(),
        };
        assert_eq!(err.to_string(), "Report already stored for job 'job-42'");

        let err = AttestationError::validation("Job ID too long");
        assert_eq!(err.to_string(), "Validation error: Job ID too long");
    }

    #[test]
    fn test_only_network_errors_are_retryable() {
        assert!(AttestationError::network("timeout").is_retryable());
        assert!(!AttestationError::Signing("rejected".into()).is_retryable());
        assert!(!AttestationError::NotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_network_error_carries_signature() {
        let sig = Signature::new_unique();
        let err = AttestationError::network_with_signature("expired", sig);
        assert_eq!(err.signature(), Some(&sig));
        assert_eq!(err.category(), "network");
        assert!(AttestationError::network("down").signature().is_none());
    }

    #[test]
    fn test_rpc_error_converts_to_network() {
        let err: AttestationError = RpcError::Timeout {
            endpoint: "http://localhost".to_string(),
            timeout_ms: 30_000,
        }
        .into();
        assert!(matches!(err, AttestationError::Network { .. }));
    }
}
