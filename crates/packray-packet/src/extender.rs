//! Constant extension resolution.
//!
//! A constant-extender word supplies the high bits of the immediate of
//! the next instruction in program order within the same packet. The
//! target's immediate becomes the literal concatenation of the
//! extender's bits and the target's own low-order field bits, and the
//! target's implicit scale is suppressed. A packet carries at most one
//! extender.

use packray_core::Operand;

use crate::duplex::{EntryOrigin, PacketEntry};
use crate::error::PacketError;

/// A resolved extension, scoped to one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionBinding {
    /// Address of the extender word.
    pub extender: u64,
    /// The 32-bit extension value carried by the extender.
    pub value: u32,
    /// Address of the entry the extension was applied to.
    pub target: u64,
}

/// Finds the packet's extender, if any, and applies it to its target
/// entry in place.
///
/// Binding problems (an extender with no payload or no following
/// entry, or a designated target with no extendable immediate) are
/// recorded as [`PacketError::MisplacedExtension`] diagnostics; the
/// target is left unextended and the rest of the packet is unaffected.
pub fn resolve(entries: &mut [PacketEntry], diagnostics: &mut Vec<PacketError>) -> Option<ExtensionBinding> {
    let ext_index = entries.iter().position(|e| e.insn.is_extender)?;
    let extender = entries[ext_index].insn.address;
    let Some(value) = extension_value(&entries[ext_index]) else {
        diagnostics.push(PacketError::misplaced_extension(extender, extender));
        return None;
    };

    let Some(target_index) = designated_target(entries, ext_index) else {
        diagnostics.push(PacketError::misplaced_extension(extender, extender));
        return None;
    };

    let target = &mut entries[target_index];
    let target_address = target.insn.address;
    let Some(operand_index) = target.insn.extendable_operand() else {
        diagnostics.push(PacketError::misplaced_extension(extender, target_address));
        return None;
    };

    if let Some(Operand::Immediate(imm)) = target.insn.operands.get_mut(operand_index) {
        imm.extend(value);
    }

    Some(ExtensionBinding {
        extender,
        value,
        target: target_address,
    })
}

/// Picks the entry the extension is allowed to bind to.
///
/// For an ordinary word that is simply the next entry. When the next
/// entry is a duplex sub-instruction, the architecture designates the
/// second-decoded slot as the only one that may carry an extended
/// immediate, so the binding always skips over slot 0; whatever
/// operands slot 0 carries, it stays unextended.
fn designated_target(entries: &[PacketEntry], ext_index: usize) -> Option<usize> {
    let next_index = ext_index + 1;
    let next = entries.get(next_index)?;

    match next.origin {
        EntryOrigin::Word => Some(next_index),
        EntryOrigin::DuplexSlot { slot: 1, .. } => Some(next_index),
        EntryOrigin::DuplexSlot { slot: _, .. } => {
            // Bind to the second-decoded slot of the same word.
            entries.get(next_index + 1).map(|_| next_index + 1)
        }
    }
}

/// The 32-bit extension payload of an extender record.
///
/// The extender's single immediate operand already carries the payload
/// shifted into position; its effective value is the extension value.
/// A record without one is a front-end inconsistency.
fn extension_value(entry: &PacketEntry) -> Option<u32> {
    entry
        .insn
        .operands
        .iter()
        .find_map(|op| op.as_immediate())
        .map(|imm| imm.value() as u32)
}
