//! Compatibility layer for Solana message versions
//!
//! Fetched transactions arrive as `VersionedMessage` (legacy or v0). The reader
//! only needs the static account keys, the fee payer and the compiled
//! instruction list, which both versions expose through different fields.
//! Memo and system programs are never loaded through lookup tables, so
//! resolving program ids against static keys is sufficient.

use solana_sdk::{
    instruction::CompiledInstruction,
    message::VersionedMessage,
    pubkey::Pubkey,
};

#[inline]
#[must_use]
pub fn get_static_account_keys(message: &VersionedMessage) -> &[Pubkey] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.account_keys,
        VersionedMessage::V0(v0_msg) => &v0_msg.account_keys,
    }
}

#[inline]
#[must_use]
pub fn get_instructions(message: &VersionedMessage) -> &[CompiledInstruction] {
    match message {
        VersionedMessage::Legacy(legacy_msg) => &legacy_msg.instructions,
        VersionedMessage::V0(v0_msg) => &v0_msg.instructions,
    }
}

/// First static key; `None` for a malformed message with no accounts
#[must_use]
pub fn get_fee_payer(message: &VersionedMessage) -> Option<Pubkey> {
    get_static_account_keys(message).first().copied()
}

/// Data of every instruction whose program id resolves to `program_id`, in order
pub fn instruction_data_for_program<'a>(
    message: &'a VersionedMessage,
    program_id: &'a Pubkey,
) -> impl Iterator<Item = &'a [u8]> + 'a {
    let keys = get_static_account_keys(message);
    get_instructions(message).iter().filter_map(move |ix| {
        keys.get(ix.program_id_index as usize)
            .filter(|key| *key == program_id)
            .map(|_| ix.data.as_slice())
    })
}
