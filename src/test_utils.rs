//! Test Utilities Module
//!
//! Deterministic stand-ins for the ledger and the signer so the full
//! store → verify → read flow runs without a cluster:
//! - [`InMemoryLedger`]: a [`LedgerRpc`] with call counters, failure
//!   injection and an optional attestation index
//! - [`MockSigner`]: a [`ReportSigner`] that signs, rejects, or misbehaves
//!   (unsigned, empty or substituted output)
//!
//! Kept out of the hot path; nothing in the library constructs these.

#![cfg(any(test, feature = "test_utils"))]

use async_trait::async_trait;
use parking_lot::Mutex;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::{Transaction, VersionedTransaction},
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::codec::{self, MemoPayload};
use crate::compat;
use crate::derivation::{report_address, report_storage_address};
use crate::rpc::{LedgerRpc, RpcError, RpcResult, SignatureState};
use crate::tx_builder::{build_memo, MEMO_PROGRAM_ID};
use crate::wallet::{ReportSigner, SignerError};

const ENDPOINT: &str = "memory://ledger";

/// Default number of blocks a blockhash stays valid
pub const DEFAULT_BLOCKHASH_WINDOW: u64 = 150;

#[derive(Default)]
struct LedgerState {
    transactions: HashMap<Signature, VersionedTransaction>,
    airdrops: HashSet<Signature>,
    accounts: HashSet<Pubkey>,
    balances: HashMap<Pubkey, u64>,
    block_height: u64,
}

/// In-memory ledger implementing [`LedgerRpc`]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
    rpc_calls: AtomicUsize,
    sent: AtomicUsize,
    fail_send: AtomicBool,
    fail_rpc: AtomicBool,
    never_confirm: AtomicBool,
    blockhash_window: u64,
    /// When set, confirmed attestation memos materialize their derived accounts
    index_namespace: Option<Pubkey>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LedgerState::default()),
            rpc_calls: AtomicUsize::new(0),
            sent: AtomicUsize::new(0),
            fail_send: AtomicBool::new(false),
            fail_rpc: AtomicBool::new(false),
            never_confirm: AtomicBool::new(false),
            blockhash_window: DEFAULT_BLOCKHASH_WINDOW,
            index_namespace: None,
        }
    }

    pub fn with_blockhash_window(mut self, blocks: u64) -> Self {
        self.blockhash_window = blocks;
        self
    }

    /// Index stored memos against derived addresses in `namespace`
    pub fn with_attestation_index(mut self, namespace: Pubkey) -> Self {
        self.index_namespace = Some(namespace);
        self
    }

    /// Reject every broadcast
    pub fn set_fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    /// Fail every RPC call with a transport error
    pub fn set_fail_rpc(&self, fail: bool) {
        self.fail_rpc.store(fail, Ordering::SeqCst);
    }

    /// Keep every signature pending
    pub fn set_never_confirm(&self, never: bool) {
        self.never_confirm.store(never, Ordering::SeqCst);
    }

    /// Total RPC calls served (all trait methods except `endpoint`)
    pub fn rpc_calls(&self) -> usize {
        self.rpc_calls.load(Ordering::SeqCst)
    }

    pub fn sent_transactions(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    pub fn has_transaction(&self, signature: &Signature) -> bool {
        self.state.lock().transactions.contains_key(signature)
    }

    pub fn insert_account(&self, address: Pubkey) {
        self.state.lock().accounts.insert(address);
    }

    pub fn set_balance(&self, address: Pubkey, lamports: u64) {
        self.state.lock().balances.insert(address, lamports);
    }

    /// Store an arbitrary transaction as if it had been confirmed
    pub fn insert_raw_transaction(&self, transaction: VersionedTransaction) -> Signature {
        let signature = transaction
            .signatures
            .first()
            .copied()
            .filter(|sig| *sig != Signature::default())
            .unwrap_or_else(Signature::new_unique);
        self.state.lock().transactions.insert(signature, transaction);
        signature
    }

    fn enter(&self) -> RpcResult<()> {
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_rpc.load(Ordering::SeqCst) {
            return Err(RpcError::Transport {
                endpoint: ENDPOINT.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }

    fn index(&self, state: &mut LedgerState, transaction: &VersionedTransaction) {
        let Some(namespace) = self.index_namespace else {
            return;
        };
        let Some(authority) = compat::get_fee_payer(&transaction.message) else {
            return;
        };

        for data in compat::instruction_data_for_program(&transaction.message, &MEMO_PROGRAM_ID) {
            let derived = match codec::decode(data).map(|memo| memo.payload) {
                Some(MemoPayload::StoreReport { job_id, .. }) => {
                    report_address(&job_id, &authority, &namespace)
                }
                Some(MemoPayload::InitializeStorage { .. }) => {
                    report_storage_address(&authority, &namespace)
                }
                _ => continue,
            };
            if let Ok(derived) = derived {
                state.accounts.insert(derived.address);
            }
        }
    }
}

#[async_trait]
impl LedgerRpc for InMemoryLedger {
    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    async fn account_exists(&self, address: &Pubkey) -> RpcResult<bool> {
        self.enter()?;
        Ok(self.state.lock().accounts.contains(address))
    }

    async fn latest_blockhash(&self) -> RpcResult<(Hash, u64)> {
        self.enter()?;
        let height = self.state.lock().block_height;
        Ok((Hash::new_unique(), height + self.blockhash_window))
    }

    async fn block_height(&self) -> RpcResult<u64> {
        self.enter()?;
        let mut state = self.state.lock();
        state.block_height += 1;
        Ok(state.block_height)
    }

    async fn send_transaction(&self, transaction: &Transaction) -> RpcResult<Signature> {
        self.enter()?;
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(RpcError::RpcResponse {
                endpoint: ENDPOINT.to_string(),
                message: "node is behind".to_string(),
                code: Some(-32005),
            });
        }
        if transaction.verify().is_err() {
            return Err(RpcError::RpcResponse {
                endpoint: ENDPOINT.to_string(),
                message: "Transaction signature verification failure".to_string(),
                code: Some(-32003),
            });
        }

        let signature = transaction.signatures.first().copied().ok_or_else(|| {
            RpcError::Internal("transaction carries no signatures".to_string())
        })?;
        let versioned = VersionedTransaction::from(transaction.clone());

        let mut state = self.state.lock();
        self.index(&mut state, &versioned);
        state.transactions.insert(signature, versioned);
        self.sent.fetch_add(1, Ordering::SeqCst);
        Ok(signature)
    }

    async fn signature_state(&self, signature: &Signature) -> RpcResult<SignatureState> {
        self.enter()?;
        if self.never_confirm.load(Ordering::SeqCst) {
            return Ok(SignatureState::Pending);
        }
        let state = self.state.lock();
        if state.transactions.contains_key(signature) || state.airdrops.contains(signature) {
            Ok(SignatureState::Confirmed)
        } else {
            Ok(SignatureState::Pending)
        }
    }

    async fn get_transaction(
        &self,
        signature: &Signature,
    ) -> RpcResult<Option<VersionedTransaction>> {
        self.enter()?;
        Ok(self.state.lock().transactions.get(signature).cloned())
    }

    async fn get_balance(&self, address: &Pubkey) -> RpcResult<u64> {
        self.enter()?;
        Ok(self.state.lock().balances.get(address).copied().unwrap_or(0))
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> RpcResult<Signature> {
        self.enter()?;
        let signature = Signature::new_unique();
        let mut state = self.state.lock();
        *state.balances.entry(*address).or_insert(0) += lamports;
        state.airdrops.insert(signature);
        Ok(signature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignerMode {
    Approve,
    Reject,
    Unsigned,
    Empty,
    Substitute,
}

/// Scriptable signer backed by a fresh keypair
pub struct MockSigner {
    keypair: Keypair,
    mode: SignerMode,
}

impl Default for MockSigner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSigner {
    /// Signs everything
    pub fn new() -> Self {
        Self {
            keypair: Keypair::new(),
            mode: SignerMode::Approve,
        }
    }

    /// Declines every request, like a user dismissing a wallet prompt
    pub fn rejecting() -> Self {
        Self {
            mode: SignerMode::Reject,
            ..Self::new()
        }
    }

    /// Hands the transaction back without signing it
    pub fn unsigned() -> Self {
        Self {
            mode: SignerMode::Unsigned,
            ..Self::new()
        }
    }

    /// Returns an empty transaction with no message and no signatures
    pub fn empty() -> Self {
        Self {
            mode: SignerMode::Empty,
            ..Self::new()
        }
    }

    /// Validly signs a different message than the one it was given
    pub fn substituting() -> Self {
        Self {
            mode: SignerMode::Substitute,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ReportSigner for MockSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, SignerError> {
        match self.mode {
            SignerMode::Reject => Err(SignerError::Rejected("user rejected the request".into())),
            SignerMode::Unsigned => Ok(transaction),
            SignerMode::Empty => Ok(Transaction::default()),
            SignerMode::Substitute => {
                let payer = self.keypair.pubkey();
                let blockhash = transaction.message.recent_blockhash;
                let memo = build_memo(br#"{"type":"initialize_storage","authority":"x","timestamp":0}"#);
                Ok(Transaction::new_signed_with_payer(
                    &[memo],
                    Some(&payer),
                    &[&self.keypair],
                    blockhash,
                ))
            }
            SignerMode::Approve => {
                let blockhash = transaction.message.recent_blockhash;
                transaction
                    .try_sign(&[&self.keypair], blockhash)
                    .map_err(|e| SignerError::Failed(e.to_string()))?;
                Ok(transaction)
            }
        }
    }
}
