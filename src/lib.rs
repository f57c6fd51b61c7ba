//! Report attestation on Solana
//!
//! Hashes a generated report, anchors the hash and its metadata on the ledger
//! through a memo-carrying transaction, and reads the record back for
//! verification. Signing is always delegated to a caller-supplied
//! [`ReportSigner`].
//!
//! Start from [`AttestationClient`]; the registry and reader it exposes can
//! also be used directly.

pub mod client;
pub mod codec;
pub mod compat;
pub mod config;
pub mod connection;
pub mod derivation;
pub mod errors;
pub mod hashing;
pub mod metrics;
pub mod observability;
pub mod reader;
pub mod registry;
pub mod rpc;
pub mod structured_logging;
pub mod test_utils;
pub mod tx_builder;
pub mod types;
pub mod wallet;

// Re-export commonly used types
pub use client::AttestationClient;
pub use config::Config;
pub use connection::{ConfirmPolicy, ConnectionManager};
pub use errors::{AttestationError, AttestationResult};
pub use hashing::{hash_report, ReportHash};
pub use reader::VerificationReader;
pub use registry::{AttestationRegistry, StoreReportRequest};
pub use types::{Metadata, Network, ReportAttestation, StorageStats, TransactionResult};
pub use wallet::{KeypairSigner, ReportSigner, SignerError};

pub use solana_sdk::{pubkey::Pubkey, signature::Signature};
