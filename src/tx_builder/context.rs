//! Execution context for one submission
//!
//! Pairs the blockhash a transaction is signed against with the block height
//! after which that blockhash expires. The expiry height is what bounds
//! confirmation polling.

use solana_sdk::hash::Hash;

use crate::observability::TraceContext;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub blockhash: Hash,

    /// Last block height at which `blockhash` is accepted
    pub last_valid_block_height: u64,

    pub trace_context: TraceContext,
}

impl ExecutionContext {
    pub fn new(blockhash: Hash, last_valid_block_height: u64, trace_context: TraceContext) -> Self {
        Self {
            blockhash,
            last_valid_block_height,
            trace_context,
        }
    }

    /// Whether the blockhash window has closed at `current_height`
    pub fn is_expired(&self, current_height: u64) -> bool {
        current_height > self.last_valid_block_height
    }
}
