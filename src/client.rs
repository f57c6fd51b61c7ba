//! Client facade
//!
//! Single entry point for applications: owns the shared connection and hands
//! out the registry and reader built on it, plus wallet helpers (balance,
//! devnet faucet, fee estimate, explorer links).

use solana_sdk::{native_token::LAMPORTS_PER_SOL, pubkey::Pubkey, signature::Signature};
use tracing::info;

use crate::config::Config;
use crate::connection::ConnectionManager;
use crate::errors::{AttestationError, AttestationResult};
use crate::reader::VerificationReader;
use crate::registry::{AttestationRegistry, StoreReportRequest};
use crate::tx_builder::TransactionSubmitter;
use crate::types::{Network, ReportAttestation, StorageStats, TransactionResult};
use crate::wallet::ReportSigner;

/// Fee of a single-signature transaction
pub const ESTIMATED_FEE_LAMPORTS: u64 = 5_000;

fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

#[derive(Debug, Clone)]
pub struct AttestationClient {
    connection: ConnectionManager,
    registry: AttestationRegistry,
    reader: VerificationReader,
    submitter: TransactionSubmitter,
}

impl AttestationClient {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            registry: AttestationRegistry::new(connection.clone()),
            reader: VerificationReader::new(connection.clone()),
            submitter: TransactionSubmitter::new(connection.clone()),
            connection,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ConnectionManager::from_config(config))
    }

    pub fn network(&self) -> Network {
        self.connection.network()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn registry(&self) -> &AttestationRegistry {
        &self.registry
    }

    pub fn reader(&self) -> &VerificationReader {
        &self.reader
    }

    pub async fn store_report(
        &self,
        request: StoreReportRequest,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        self.registry.store(request, signer).await
    }

    pub async fn verify_report(
        &self,
        job_id: &str,
        verification_data: &str,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        self.registry.verify(job_id, verification_data, signer).await
    }

    pub async fn initialize_storage(
        &self,
        signer: &dyn ReportSigner,
    ) -> AttestationResult<TransactionResult> {
        self.registry.initialize_storage(signer).await
    }

    pub async fn get_report(&self, signature: &str) -> AttestationResult<Option<ReportAttestation>> {
        self.registry.get_report(signature).await
    }

    pub async fn get_storage_stats(
        &self,
        authority: &Pubkey,
    ) -> AttestationResult<Option<StorageStats>> {
        self.registry.get_storage_stats(authority).await
    }

    pub async fn transaction_exists(&self, signature: &str) -> AttestationResult<bool> {
        self.registry.transaction_exists(signature).await
    }

    /// Balance in SOL
    pub async fn get_balance(&self, address: &Pubkey) -> AttestationResult<f64> {
        let lamports = self.connection.rpc().get_balance(address).await?;
        Ok(lamports_to_sol(lamports))
    }

    /// Request test funds and wait for them to land. Refused on mainnet.
    pub async fn request_airdrop(&self, address: &Pubkey, sol: f64) -> AttestationResult<Signature> {
        if self.connection.network().is_production() {
            return Err(AttestationError::validation(
                "Airdrop is not available on mainnet",
            ));
        }
        if !sol.is_finite() || sol <= 0.0 {
            return Err(AttestationError::validation(format!(
                "Airdrop amount must be positive, got {}",
                sol
            )));
        }

        let lamports = (sol * LAMPORTS_PER_SOL as f64).round() as u64;
        let signature = self.connection.rpc().request_airdrop(address, lamports).await?;
        self.submitter.confirm_signature(&signature).await?;

        info!(address = %address, lamports, signature = %signature, "Airdrop confirmed");
        Ok(signature)
    }

    /// Estimated fee of one attestation write, in SOL
    pub fn estimate_transaction_cost(&self) -> f64 {
        lamports_to_sol(ESTIMATED_FEE_LAMPORTS)
    }

    pub fn explorer_tx_url(&self, signature: &Signature) -> String {
        self.connection.explorer_tx_url(signature)
    }

    pub fn explorer_address_url(&self, address: &Pubkey) -> String {
        self.connection.explorer_address_url(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConfirmPolicy;
    use crate::test_utils::InMemoryLedger;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(network: Network, ledger: Arc<InMemoryLedger>) -> AttestationClient {
        AttestationClient::new(ConnectionManager::new(network, ledger).with_confirm_policy(
            ConfirmPolicy {
                poll_interval: Duration::from_millis(1),
                max_unbounded_polls: 5,
            },
        ))
    }

    #[test]
    fn test_estimate_is_fixed_fee() {
        let c = client(Network::Devnet, Arc::new(InMemoryLedger::new()));
        assert!((c.estimate_transaction_cost() - 0.000005).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_balance_in_sol() {
        let ledger = Arc::new(InMemoryLedger::new());
        let address = Pubkey::new_unique();
        ledger.set_balance(address, 2_500_000_000);

        let c = client(Network::Devnet, ledger);
        assert_eq!(c.get_balance(&address).await.unwrap(), 2.5);
    }

    #[tokio::test]
    async fn test_airdrop_credits_and_confirms() {
        let ledger = Arc::new(InMemoryLedger::new());
        let address = Pubkey::new_unique();
        let c = client(Network::Devnet, ledger.clone());

        c.request_airdrop(&address, 1.0).await.unwrap();
        assert_eq!(c.get_balance(&address).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_airdrop_rejects_non_positive_amount() {
        let ledger = Arc::new(InMemoryLedger::new());
        let c = client(Network::Testnet, ledger.clone());

        assert!(c.request_airdrop(&Pubkey::new_unique(), 0.0).await.is_err());
        assert!(c.request_airdrop(&Pubkey::new_unique(), f64::NAN).await.is_err());
        assert_eq!(ledger.rpc_calls(), 0);
    }

    #[tokio::test]
    async fn test_airdrop_unconfirmed_reports_signature() {
        let ledger = Arc::new(InMemoryLedger::new());
        ledger.set_never_confirm(true);
        let c = client(Network::Devnet, ledger);

        let err = c.request_airdrop(&Pubkey::new_unique(), 1.0).await.unwrap_err();
        assert!(err.signature().is_some());
    }
}
