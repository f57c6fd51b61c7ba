//! JSON-RPC adapter over the nonblocking Solana client
//!
//! Every call is bounded by a fixed timeout; an elapsed timeout surfaces as
//! [`RpcError::Timeout`]. There is no retry here, callers re-invoke explicitly.

use async_trait::async_trait;
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_rpc_client_api::{config::RpcTransactionConfig, request::RpcRequest};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::{Transaction, VersionedTransaction},
};
use solana_transaction_status::{EncodedConfirmedTransactionWithStatusMeta, UiTransactionEncoding};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::{LedgerRpc, RpcError, RpcResult, SignatureState};
use crate::metrics::metrics;

pub struct SolanaRpc {
    client: RpcClient,
    endpoint: String,
    commitment: CommitmentConfig,
    timeout: Duration,
}

impl std::fmt::Debug for SolanaRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolanaRpc")
            .field("endpoint", &self.endpoint)
            .field("commitment", &self.commitment.commitment)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl SolanaRpc {
    pub fn new(endpoint: impl Into<String>, commitment: CommitmentConfig, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        let client = RpcClient::new_with_timeout_and_commitment(endpoint.clone(), timeout, commitment);
        Self {
            client,
            endpoint,
            commitment,
            timeout,
        }
    }

    /// Run one RPC round trip under the configured timeout
    async fn call<T, F>(&self, method: &'static str, fut: F) -> RpcResult<T>
    where
        F: Future<Output = Result<T, solana_client::client_error::ClientError>>,
    {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, fut).await;
        metrics().rpc_latency.observe(started.elapsed().as_secs_f64());

        match outcome {
            Ok(Ok(value)) => {
                debug!(method, endpoint = %self.endpoint, "RPC call completed");
                Ok(value)
            }
            Ok(Err(e)) => {
                metrics().rpc_errors.inc();
                let err = RpcError::from_client_error(e, &self.endpoint);
                warn!(
                    method,
                    endpoint = %self.endpoint,
                    retryable = err.is_retryable(),
                    error = %err,
                    "RPC call failed"
                );
                Err(err)
            }
            Err(_) => {
                metrics().rpc_errors.inc();
                let err = RpcError::Timeout {
                    endpoint: self.endpoint.clone(),
                    timeout_ms: self.timeout.as_millis() as u64,
                };
                warn!(method, endpoint = %self.endpoint, retryable = err.is_retryable(), "RPC call timed out");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl LedgerRpc for SolanaRpc {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool> {
        let response = self
            .call(
                "getAccountInfo",
                self.client.get_account_with_commitment(address, self.commitment),
            )
            .await?;
        Ok(response.value.is_some())
    }

    async fn latest_blockhash(&self) -> RpcResult<(Hash, u64)> {
        self.call(
            "getLatestBlockhash",
            self.client.get_latest_blockhash_with_commitment(self.commitment),
        )
        .await
    }

    async fn block_height(&self) -> RpcResult<u64> {
        self.call(
            "getBlockHeight",
            self.client.get_block_height_with_commitment(self.commitment),
        )
        .await
    }

    async fn send_transaction(&self, transaction: &Transaction) -> RpcResult<Signature> {
        self.call("sendTransaction", self.client.send_transaction(transaction))
            .await
    }

    async fn signature_state(&self, signature: &Signature) -> RpcResult<SignatureState> {
        let response = self
            .call(
                "getSignatureStatuses",
                self.client.get_signature_statuses(&[*signature]),
            )
            .await?;

        let state = match response.value.into_iter().next().flatten() {
            None => SignatureState::Pending,
            Some(status) => {
                if let Some(err) = &status.err {
                    SignatureState::Failed(err.to_string())
                } else if status.satisfies_commitment(self.commitment) {
                    SignatureState::Confirmed
                } else {
                    SignatureState::Pending
                }
            }
        };
        Ok(state)
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> RpcResult<Option<VersionedTransaction>> {
        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::Base64),
            commitment: Some(self.commitment),
            max_supported_transaction_version: Some(0),
        };

        // A missing signature is a `null` result, not an error
        let response: Option<EncodedConfirmedTransactionWithStatusMeta> = self
            .call(
                "getTransaction",
                self.client.send(
                    RpcRequest::GetTransaction,
                    json!([signature.to_string(), config]),
                ),
            )
            .await?;

        Ok(response.and_then(|confirmed| confirmed.transaction.transaction.decode()))
    }

    async fn get_balance(&self, address: &Pubkey) -> RpcResult<u64> {
        let response = self
            .call(
                "getBalance",
                self.client.get_balance_with_commitment(address, self.commitment),
            )
            .await?;
        Ok(response.value)
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> RpcResult<Signature> {
        self.call("requestAirdrop", self.client.request_airdrop(address, lamports))
            .await
    }
}
