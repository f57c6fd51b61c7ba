//! Attestation transaction building and submission
//!
//! - **instructions**: transfer + memo instruction planning and order checks
//! - **output**: fee payer assignment and wire-size validation
//! - **context**: blockhash and validity ceiling for one submission
//! - **submitter**: sign → broadcast → confirm
//!
//! Everything before the submitter is pure, so size and format violations are
//! caught without touching the network.

pub mod context;
pub mod instructions;
pub mod output;
pub mod submitter;

pub use context::ExecutionContext;
pub use instructions::{
    build_memo, is_memo_program, plan_attestation_instructions, sanity_check_ix_order,
    InstructionPlan, MEMO_PROGRAM_ID,
};
pub use output::{check_transaction_size, PreparedTransaction};
pub use submitter::TransactionSubmitter;
