//! Deterministic address derivation
//!
//! Derived addresses are idempotency keys: the registry asks the ledger
//! whether one already holds data, it never allocates them.
//!
//! Seeds:
//! - storage: `["report-storage", authority]`
//! - report:  `["report", sha256(job_id), authority]`
//!
//! The job id is digested so that ids up to the 64-byte limit fit the 32-byte
//! per-seed maximum, while distinct ids still yield distinct seeds.

use solana_sdk::pubkey::Pubkey;

use crate::errors::{AttestationError, AttestationResult};
use crate::hashing::sha256;
use crate::types::Network;

pub const REPORT_STORAGE_SEED: &[u8] = b"report-storage";
pub const REPORT_SEED: &[u8] = b"report";

/// Address derived from fixed seeds plus its bump nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DerivedAddress {
    pub address: Pubkey,
    pub bump: u8,
}

/// Derivation namespace for a network.
///
/// The network's placeholder program label is not a valid 32-byte key, so the
/// namespace is the SHA-256 of the label taken as an address.
pub fn program_namespace(network: Network) -> Pubkey {
    Pubkey::new_from_array(sha256(network.program_label().as_bytes()))
}

/// Per-authority storage address
pub fn report_storage_address(
    authority: &Pubkey,
    namespace: &Pubkey,
) -> AttestationResult<DerivedAddress> {
    derive(&[REPORT_STORAGE_SEED, authority.as_ref()], namespace)
}

/// Per-(job id, authority) report address
pub fn report_address(
    job_id: &str,
    authority: &Pubkey,
    namespace: &Pubkey,
) -> AttestationResult<DerivedAddress> {
    let job_seed = sha256(job_id.as_bytes());
    derive(&[REPORT_SEED, &job_seed, authority.as_ref()], namespace)
}

fn derive(seeds: &[&[u8]], namespace: &Pubkey) -> AttestationResult<DerivedAddress> {
    Pubkey::try_find_program_address(seeds, namespace)
        .map(|(address, bump)| DerivedAddress { address, bump })
        .ok_or_else(|| AttestationError::validation("Unable to derive address for seeds"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn namespace() -> Pubkey {
        program_namespace(Network::Devnet)
    }

    #[test]
    fn test_report_address_is_stable() {
        let authority = Pubkey::new_unique();
        let first = report_address("job-42", &authority, &namespace()).unwrap();
        let second = report_address("job-42", &authority, &namespace()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_address_changes_with_inputs() {
        let authority = Pubkey::new_unique();
        let other_authority = Pubkey::new_unique();
        let base = report_address("job-42", &authority, &namespace()).unwrap();

        assert_ne!(
            base.address,
            report_address("job-43", &authority, &namespace()).unwrap().address
        );
        assert_ne!(
            base.address,
            report_address("job-42", &other_authority, &namespace()).unwrap().address
        );
        assert_ne!(
            base.address,
            report_address("job-42", &authority, &program_namespace(Network::Testnet))
                .unwrap()
                .address
        );
    }

    #[test]
    fn test_max_length_job_id_derives() {
        let authority = Pubkey::new_unique();
        let job_id = "j".repeat(64);
        assert!(report_address(&job_id, &authority, &namespace()).is_ok());
    }

    #[test]
    fn test_storage_and_report_namespaces_differ() {
        let authority = Pubkey::new_unique();
        let storage = report_storage_address(&authority, &namespace()).unwrap();
        let report = report_address("", &authority, &namespace()).unwrap();
        assert_ne!(storage.address, report.address);
    }

    #[test]
    fn test_namespaces_are_distinct_per_network() {
        let all = [Network::Devnet, Network::Testnet, Network::Mainnet, Network::Local];
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert_ne!(program_namespace(*a), program_namespace(*b));
            }
        }
    }

    proptest! {
        #[test]
        fn prop_distinct_job_ids_distinct_addresses(a in "[a-z0-9-]{1,64}", b in "[a-z0-9-]{1,64}") {
            prop_assume!(a != b);
            let authority = Pubkey::new_from_array([7u8; 32]);
            let ns = namespace();
            prop_assert_ne!(
                report_address(&a, &authority, &ns).unwrap().address,
                report_address(&b, &authority, &ns).unwrap().address
            );
        }
    }
}
