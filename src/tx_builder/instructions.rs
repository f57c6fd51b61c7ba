//! Instruction planning and ordering validation
//!
//! An attestation transaction always carries exactly two instructions:
//! 1. a 1-lamport self-transfer from the authority (system program), so the
//!    ledger sees a genuine state-changing transaction
//! 2. a memo instruction carrying the encoded payload
//!
//! Planning is pure: no fee payer, no blockhash, no network.

#![allow(deprecated)]

use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};

use crate::errors::{AttestationError, AttestationResult};

pub const MEMO_PROGRAM_ID: Pubkey =
    solana_sdk::pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// Lamports moved by the anchoring self-transfer
pub const ANCHOR_TRANSFER_LAMPORTS: u64 = 1;

/// Ordered instruction list for one attestation write
#[derive(Debug, Clone)]
pub struct InstructionPlan {
    pub instructions: Vec<Instruction>,
    /// Account moving the anchoring lamport; must also be the fee payer
    pub authority: Pubkey,
}

/// Memo instruction with no accounts attached
pub fn build_memo(data: &[u8]) -> Instruction {
    Instruction::new_with_bytes(MEMO_PROGRAM_ID, data, vec![])
}

pub fn is_memo_program(program_id: &Pubkey) -> bool {
    *program_id == MEMO_PROGRAM_ID
}

/// Plan the transfer + memo instruction pair for an encoded payload
pub fn plan_attestation_instructions(
    authority: &Pubkey,
    memo: &[u8],
) -> AttestationResult<InstructionPlan> {
    if memo.is_empty() {
        return Err(AttestationError::validation("Memo payload is empty"));
    }

    let instructions = vec![
        system_instruction::transfer(authority, authority, ANCHOR_TRANSFER_LAMPORTS),
        build_memo(memo),
    ];

    sanity_check_ix_order(&instructions)?;

    Ok(InstructionPlan {
        instructions,
        authority: *authority,
    })
}

/// Validate the transfer-then-memo shape (debug/test only)
#[cfg(debug_assertions)]
pub fn sanity_check_ix_order(instructions: &[Instruction]) -> AttestationResult<()> {
    let [transfer, memo] = instructions else {
        return Err(AttestationError::validation(format!(
            "Attestation plan must have 2 instructions, got {}",
            instructions.len()
        )));
    };

    if transfer.program_id != solana_sdk::system_program::id() {
        return Err(AttestationError::validation(format!(
            "First instruction must be a system transfer, got program_id: {}",
            transfer.program_id
        )));
    }
    if !is_memo_program(&memo.program_id) {
        return Err(AttestationError::validation(format!(
            "Second instruction must be a memo, got program_id: {}",
            memo.program_id
        )));
    }
    Ok(())
}

/// No-op version of sanity_check_ix_order for release builds
#[cfg(not(debug_assertions))]
#[inline]
pub fn sanity_check_ix_order(_instructions: &[Instruction]) -> AttestationResult<()> {
    Ok(())
}
