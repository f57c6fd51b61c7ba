//! Deterministic content hashing for reports

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest
pub const REPORT_HASH_HEX_LEN: usize = 64;

/// Lowercase hex SHA-256 digest of a report's bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportHash(String);

impl ReportHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `content` hashes to this digest
    pub fn matches(&self, content: &[u8]) -> bool {
        hash_report(content) == *self
    }
}

impl fmt::Display for ReportHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ReportHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != REPORT_HASH_HEX_LEN {
            return Err(format!(
                "expected {} hex characters, got {}",
                REPORT_HASH_HEX_LEN,
                s.len()
            ));
        }
        hex::decode(s).map_err(|e| format!("invalid hex digest: {}", e))?;
        Ok(Self(s.to_ascii_lowercase()))
    }
}

/// Hash report content
pub fn hash_report(content: &[u8]) -> ReportHash {
    ReportHash(hex::encode(sha256(content)))
}

/// Raw SHA-256 digest
pub(crate) fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash_report(b"ABC").as_str(),
            "b5d4045c3f466fa91fe2cc6abe79232a1a57cdf104f7a26e716e0a1e2789df78"
        );
        assert_eq!(
            hash_report(b"").as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_distinct_inputs_distinct_digests() {
        let corpus: [&[u8]; 5] = [b"ABC", b"ABD", b"abc", b"ABC ", b"report-1"];
        for (i, a) in corpus.iter().enumerate() {
            for b in corpus.iter().skip(i + 1) {
                assert_ne!(hash_report(a), hash_report(b));
            }
        }
    }

    #[test]
    fn test_parse_round_trip_and_rejects_garbage() {
        let digest = hash_report(b"payload");
        let parsed: ReportHash = digest.as_str().parse().unwrap();
        assert_eq!(parsed, digest);
        assert!(digest.matches(b"payload"));
        assert!(!digest.matches(b"other"));

        assert!("abc".parse::<ReportHash>().is_err());
        assert!("z".repeat(64).parse::<ReportHash>().is_err());
    }

    proptest! {
        #[test]
        fn prop_hash_is_deterministic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let first = hash_report(&data);
            prop_assert_eq!(first.as_str().len(), REPORT_HASH_HEX_LEN);
            prop_assert_eq!(first, hash_report(&data));
        }
    }
}
