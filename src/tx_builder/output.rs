//! Prepared (unsigned) attestation transaction
//!
//! Holds the transaction with its fee payer set and a placeholder blockhash.
//! Preparation is where the wire-size limit is enforced, so an oversized
//! payload is rejected before the submitter touches the network.

use solana_sdk::{packet::PACKET_DATA_SIZE, pubkey::Pubkey, transaction::Transaction};

use crate::errors::{AttestationError, AttestationResult};
use crate::tx_builder::instructions::InstructionPlan;

#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    /// Unsigned transaction; blockhash is filled in by the submitter
    pub tx: Transaction,

    /// Serialized size including signature slots
    pub wire_size: usize,
}

impl PreparedTransaction {
    /// Set the fee payer to the plan authority and check the packet limit
    pub fn new(plan: InstructionPlan) -> AttestationResult<Self> {
        let tx = Transaction::new_with_payer(&plan.instructions, Some(&plan.authority));
        let wire_size = check_transaction_size(&tx)?;
        Ok(Self { tx, wire_size })
    }

    pub fn fee_payer(&self) -> Pubkey {
        self.tx.message.account_keys[0]
    }
}

/// Serialized size of `tx`, or a validation error above the packet limit
pub fn check_transaction_size(tx: &Transaction) -> AttestationResult<usize> {
    let wire_size = bincode::serialized_size(tx)
        .map_err(|e| AttestationError::validation(format!("Transaction not serializable: {}", e)))?
        as usize;

    if wire_size > PACKET_DATA_SIZE {
        return Err(AttestationError::validation(format!(
            "Transaction too large ({} bytes, max {})",
            wire_size, PACKET_DATA_SIZE
        )));
    }
    Ok(wire_size)
}
