//! New-value operand resolution.
//!
//! A new-value consumer reads the result a sibling instruction in the
//! same packet is about to produce, before that result commits to the
//! architectural register file. The encoding names the producer by
//! distance: "N register-writing instructions back". Resolution pins
//! down both the producer instruction and the specific register whose
//! fresh value is consumed.

use packray_core::Register;

use crate::duplex::PacketEntry;

/// A resolved producer/consumer binding, scoped to one packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewValueBinding {
    /// Address of the consumer instruction.
    pub consumer: u64,
    /// Address of the producer instruction.
    pub producer: u64,
    /// The producer register whose this-packet value is consumed.
    pub register: Register,
}

/// Why a new-value operand could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedNewValue {
    /// Fewer than `distance` register-writing instructions precede the
    /// consumer in the packet.
    NoProducer {
        /// The encoded distance that could not be satisfied.
        distance: u8,
    },
    /// The producer writes more than one candidate register.
    AmbiguousProducer {
        /// Address of the ambiguous producer.
        producer: u64,
    },
}

/// Outcome of resolving one consumer. Downstream code must handle the
/// unresolved case explicitly; there is no nullable shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewValueResolution {
    /// Producer and register pinned down.
    Resolved(NewValueBinding),
    /// No sound binding exists; the consumer's IR must be omitted.
    Unresolved {
        /// Address of the consumer instruction.
        consumer: u64,
        /// What went wrong.
        reason: UnresolvedNewValue,
    },
}

impl NewValueResolution {
    /// The binding, if resolution succeeded.
    pub fn binding(&self) -> Option<&NewValueBinding> {
        match self {
            Self::Resolved(binding) => Some(binding),
            Self::Unresolved { .. } => None,
        }
    }

    /// Address of the consumer this resolution is for.
    pub fn consumer(&self) -> u64 {
        match self {
            Self::Resolved(binding) => binding.consumer,
            Self::Unresolved { consumer, .. } => *consumer,
        }
    }
}

/// Resolves every new-value consumer in the packet, in program order.
pub fn resolve_all(entries: &[PacketEntry]) -> Vec<NewValueResolution> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            entry
                .insn
                .new_value
                .map(|nv| resolve_one(entries, index, nv.distance))
        })
        .collect()
}

/// Resolves the consumer at `consumer_index` with the given distance.
///
/// Walks backward over prior packet entries, counting only those that
/// write at least one register; the N-th such entry is the producer.
fn resolve_one(entries: &[PacketEntry], consumer_index: usize, distance: u8) -> NewValueResolution {
    let consumer = entries[consumer_index].insn.address;
    let mut remaining = distance;

    for entry in entries[..consumer_index].iter().rev() {
        if !entry.insn.writes_any_register() {
            continue;
        }
        remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            continue;
        }

        let producer = entry.insn.address;
        return match producer_register(entry) {
            Some(register) => NewValueResolution::Resolved(NewValueBinding {
                consumer,
                producer,
                register,
            }),
            None => NewValueResolution::Unresolved {
                consumer,
                reason: UnresolvedNewValue::AmbiguousProducer { producer },
            },
        };
    }

    NewValueResolution::Unresolved {
        consumer,
        reason: UnresolvedNewValue::NoProducer { distance },
    }
}

/// Picks the register whose new value the consumer sees.
///
/// A write-only destination (written but not read by the producer) is
/// preferred over a read-modify-write one. Two or more candidates of
/// equal standing make the encoding non-conformant: resolution is
/// undefined and must not be guessed.
fn producer_register(entry: &PacketEntry) -> Option<Register> {
    let insn = &entry.insn;
    let write_only: Vec<Register> = insn
        .writes
        .iter()
        .copied()
        .filter(|w| !insn.reads.contains(w))
        .collect();

    let candidates = if write_only.is_empty() {
        &insn.writes
    } else {
        &write_only
    };
    match candidates.as_slice() {
        [register] => Some(*register),
        _ => None,
    }
}
