//! Memo payload codec
//!
//! Wire form is compact UTF-8 JSON with a `type` discriminator:
//!
//! ```json
//! {"version":1,"type":"store_report","jobId":"job-42","reportHash":"…",
//!  "reportType":"pdf","stakeholder":"researcher","metadata":{…},
//!  "authority":"…","timestamp":1700000000000}
//! ```
//!
//! Encoding validates limits before any transaction is built. Decoding is
//! defensive: anything that is not one of our payloads is `None`. Only the
//! `type` tag and `jobId` are required to read a report back; absent fields
//! decode to their empty defaults.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{AttestationError, AttestationResult};
use crate::types::Metadata;

pub const MAX_JOB_ID_LEN: usize = 64;
pub const MAX_REPORT_TYPE_LEN: usize = 32;
pub const MAX_STAKEHOLDER_LEN: usize = 32;
pub const MAX_METADATA_LEN: usize = 512;

/// Current payload schema version
pub const MEMO_SCHEMA_VERSION: u8 = 1;

fn default_version() -> u8 {
    MEMO_SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemoPayload {
    #[serde(rename_all = "camelCase")]
    StoreReport {
        job_id: String,
        #[serde(default)]
        report_hash: String,
        #[serde(default)]
        report_type: String,
        #[serde(default)]
        stakeholder: String,
        #[serde(default)]
        metadata: Metadata,
        #[serde(default)]
        authority: String,
        #[serde(default)]
        timestamp: u64,
    },
    #[serde(rename_all = "camelCase")]
    VerifyReport {
        job_id: String,
        #[serde(default)]
        verification_data: String,
        #[serde(default)]
        validator: String,
        #[serde(default)]
        timestamp: u64,
    },
    #[serde(rename_all = "camelCase")]
    InitializeStorage { authority: String, timestamp: u64 },
}

impl MemoPayload {
    /// Wire discriminator of this variant
    pub fn tag(&self) -> &'static str {
        match self {
            MemoPayload::StoreReport { .. } => "store_report",
            MemoPayload::VerifyReport { .. } => "verify_report",
            MemoPayload::InitializeStorage { .. } => "initialize_storage",
        }
    }
}

/// Versioned envelope written into the memo instruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttestationMemo {
    #[serde(default = "default_version")]
    pub version: u8,
    #[serde(flatten)]
    pub payload: MemoPayload,
}

impl AttestationMemo {
    pub fn new(payload: MemoPayload) -> Self {
        Self {
            version: MEMO_SCHEMA_VERSION,
            payload,
        }
    }
}

fn check_len(field: &str, value: &str, max: usize) -> AttestationResult<()> {
    if value.len() > max {
        return Err(AttestationError::validation(format!(
            "{} too long ({} bytes, max {})",
            field,
            value.len(),
            max
        )));
    }
    Ok(())
}

/// Validate the report identity fields
pub fn validate_report_fields(
    job_id: &str,
    report_type: &str,
    stakeholder: &str,
) -> AttestationResult<()> {
    validate_job_id(job_id)?;
    check_len("Report type", report_type, MAX_REPORT_TYPE_LEN)?;
    check_len("Stakeholder", stakeholder, MAX_STAKEHOLDER_LEN)
}

pub fn validate_job_id(job_id: &str) -> AttestationResult<()> {
    if job_id.is_empty() {
        return Err(AttestationError::validation("Job ID must not be empty"));
    }
    check_len("Job ID", job_id, MAX_JOB_ID_LEN)
}

/// Validate serialized metadata size; returns the encoded length
pub fn validate_metadata(metadata: &Metadata) -> AttestationResult<usize> {
    let encoded = serde_json::to_string(metadata)
        .map_err(|e| AttestationError::validation(format!("Metadata not serializable: {}", e)))?;
    if encoded.len() > MAX_METADATA_LEN {
        return Err(AttestationError::validation(format!(
            "Metadata too long ({} bytes, max {})",
            encoded.len(),
            MAX_METADATA_LEN
        )));
    }
    Ok(encoded.len())
}

/// Validate and encode a payload into memo bytes
pub fn encode(payload: MemoPayload) -> AttestationResult<Vec<u8>> {
    match &payload {
        MemoPayload::StoreReport {
            job_id,
            report_type,
            stakeholder,
            metadata,
            ..
        } => {
            validate_report_fields(job_id, report_type, stakeholder)?;
            validate_metadata(metadata)?;
        }
        MemoPayload::VerifyReport { job_id, .. } => validate_job_id(job_id)?,
        MemoPayload::InitializeStorage { .. } => {}
    }

    serde_json::to_vec(&AttestationMemo::new(payload))
        .map_err(|e| AttestationError::validation(format!("Payload not serializable: {}", e)))
}

/// Decode memo bytes; `None` for anything that is not an attestation payload
pub fn decode(bytes: &[u8]) -> Option<AttestationMemo> {
    match serde_json::from_slice::<AttestationMemo>(bytes) {
        Ok(memo) => Some(memo),
        Err(e) => {
            debug!(error = %e, len = bytes.len(), "Memo is not an attestation payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_payload(job_id: &str, metadata: Metadata) -> MemoPayload {
        MemoPayload::StoreReport {
            job_id: job_id.to_string(),
            report_hash: "ab".repeat(32),
            report_type: "pdf".to_string(),
            stakeholder: "researcher".to_string(),
            metadata,
            authority: "Auth1111".to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    fn metadata_of_len(len: usize) -> Metadata {
        // `{"k":""}` is 8 bytes of overhead
        let mut metadata = Metadata::new();
        metadata.insert("k".to_string(), json!("x".repeat(len - 8)));
        metadata
    }

    #[test]
    fn test_wire_form_has_type_discriminator() {
        let bytes = encode(store_payload("job-42", Metadata::new())).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "store_report");
        assert_eq!(value["jobId"], "job-42");
        assert_eq!(value["reportType"], "pdf");
        assert_eq!(value["version"], 1);
    }

    #[test]
    fn test_decode_payload_without_version() {
        let raw = br#"{"type":"verify_report","jobId":"job-1","verificationData":"ok","validator":"V","timestamp":5}"#;
        let memo = decode(raw).expect("should decode");
        assert_eq!(memo.version, MEMO_SCHEMA_VERSION);
        assert_eq!(memo.payload.tag(), "verify_report");
    }

    #[test]
    fn test_decode_is_defensive() {
        assert!(decode(b"").is_none());
        assert!(decode(b"not json").is_none());
        assert!(decode(&[0xff, 0xfe, 0x00]).is_none());
        assert!(decode(br#"{"type":"molecular_docking_report","hash":"x"}"#).is_none());
        assert!(decode(br#"{"jobId":"job-1"}"#).is_none());
    }

    #[test]
    fn test_decode_partial_store_payload() {
        let raw = br#"{"type":"store_report","jobId":"job-42","reportHash":"abcd","authority":"A","timestamp":1}"#;
        match decode(raw).expect("partial payload should decode").payload {
            MemoPayload::StoreReport {
                job_id,
                report_hash,
                report_type,
                stakeholder,
                metadata,
                ..
            } => {
                assert_eq!(job_id, "job-42");
                assert_eq!(report_hash, "abcd");
                assert!(report_type.is_empty());
                assert!(stakeholder.is_empty());
                assert!(metadata.is_empty());
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        // jobId stays mandatory
        assert!(decode(br#"{"type":"store_report","reportHash":"abcd"}"#).is_none());
    }

    #[test]
    fn test_job_id_boundary() {
        assert!(encode(store_payload(&"a".repeat(64), Metadata::new())).is_ok());
        let err = encode(store_payload(&"a".repeat(65), Metadata::new())).unwrap_err();
        assert!(matches!(err, AttestationError::Validation(_)));
    }

    #[test]
    fn test_empty_job_id_rejected() {
        assert!(matches!(
            encode(store_payload("", Metadata::new())),
            Err(AttestationError::Validation(_))
        ));
    }

    #[test]
    fn test_metadata_boundary() {
        assert_eq!(validate_metadata(&metadata_of_len(512)).unwrap(), 512);
        assert!(encode(store_payload("job-1", metadata_of_len(512))).is_ok());

        let err = encode(store_payload("job-1", metadata_of_len(513))).unwrap_err();
        assert!(err.to_string().contains("Metadata too long"));
    }

    #[test]
    fn test_report_type_and_stakeholder_limits() {
        assert!(validate_report_fields("job", &"t".repeat(32), &"s".repeat(32)).is_ok());
        assert!(validate_report_fields("job", &"t".repeat(33), "s").is_err());
        assert!(validate_report_fields("job", "t", &"s".repeat(33)).is_err());
    }

    #[test]
    fn test_initialize_storage_round_trip() {
        let payload = MemoPayload::InitializeStorage {
            authority: "Auth".to_string(),
            timestamp: 42,
        };
        let bytes = encode(payload.clone()).unwrap();
        assert_eq!(decode(&bytes).unwrap().payload, payload);
    }
}
