//! Duplex word splitting.
//!
//! A duplex word packs two compact sub-instructions into one 32-bit
//! word and always terminates its packet. The front end owns the
//! sub-opcode field decode and the slot-class compatibility table; this
//! module only splits the word into two ordered packet entries at
//! adjacent sub-addresses.

use packray_core::{ParseTag, RawInstruction};

use crate::error::{PacketError, PacketResult};
use crate::source::InstructionSource;

/// Size of one duplex sub-instruction in bytes.
pub const SUB_INSN_BYTES: u64 = 2;

/// Where a packet entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// An ordinary full-word instruction.
    Word,
    /// One slot of a duplex word.
    DuplexSlot {
        /// Address of the originating duplex word.
        word: u64,
        /// Decode slot: 0 for the first sub-instruction, 1 for the
        /// second. Only slot 1 may carry a constant-extended immediate.
        slot: u8,
    },
}

impl EntryOrigin {
    /// Returns true for duplex sub-entries.
    pub fn is_duplex(&self) -> bool {
        matches!(self, Self::DuplexSlot { .. })
    }
}

/// One entry of a resolved packet: a full instruction or a duplex
/// sub-instruction, plus its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketEntry {
    /// The decoded record, annotated in place by the extender resolver.
    pub insn: RawInstruction,
    /// Provenance of this entry.
    pub origin: EntryOrigin,
}

impl PacketEntry {
    /// Wraps a full-word instruction.
    pub fn word(insn: RawInstruction) -> Self {
        Self {
            insn,
            origin: EntryOrigin::Word,
        }
    }
}

/// Splits a duplex-tagged word into its two sub-instruction entries.
///
/// The first sub-instruction occupies the word address, the second the
/// word address + 2. Slot-class pairing was validated at decode time by
/// the front end and is not re-checked here. Fails with
/// [`PacketError::UnknownEncoding`] when the front end has no
/// sub-instruction decode for the word.
pub fn split<S: InstructionSource>(
    source: &S,
    word: &RawInstruction,
) -> PacketResult<[PacketEntry; 2]> {
    debug_assert_eq!(word.parse_tag, ParseTag::Duplex);

    let (first, second) = source
        .duplex_parts(word.address)
        .ok_or_else(|| PacketError::unknown_encoding(word.address))?;

    debug_assert_eq!(first.address, word.address);
    debug_assert_eq!(second.address, word.address + SUB_INSN_BYTES);

    Ok([
        PacketEntry {
            insn: first,
            origin: EntryOrigin::DuplexSlot {
                word: word.address,
                slot: 0,
            },
        },
        PacketEntry {
            insn: second,
            origin: EntryOrigin::DuplexSlot {
                word: word.address,
                slot: 1,
            },
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StreamSource;

    fn duplex_source(address: u64) -> StreamSource {
        let mut source = StreamSource::new();
        let word = RawInstruction::new(address, 0x4810_3fc0, "duplex")
            .with_parse_tag(ParseTag::Duplex);
        let first = RawInstruction::new(address, 0x4810_3fc0, "sub0")
            .with_size(2)
            .with_parse_tag(ParseTag::Duplex);
        let second = RawInstruction::new(address + 2, 0x4810_3fc0, "sub1")
            .with_size(2)
            .with_parse_tag(ParseTag::Duplex);
        source.push_duplex(word, first, second);
        source
    }

    #[test]
    fn test_split_yields_two_entries_at_adjacent_subaddresses() {
        let source = duplex_source(0x1000);
        let word = source.instruction_at(0x1000).unwrap();
        let entries = split(&source, &word).unwrap();

        assert_eq!(entries[0].insn.address, 0x1000);
        assert_eq!(entries[1].insn.address, 0x1002);
        assert_eq!(
            entries[0].origin,
            EntryOrigin::DuplexSlot { word: 0x1000, slot: 0 }
        );
        assert_eq!(
            entries[1].origin,
            EntryOrigin::DuplexSlot { word: 0x1000, slot: 1 }
        );
    }

    #[test]
    fn test_split_without_front_end_decode_fails() {
        let mut source = StreamSource::new();
        source.push(RawInstruction::new(0x1000, 0, "duplex").with_parse_tag(ParseTag::Duplex));
        let word = source.instruction_at(0x1000).unwrap();
        assert!(matches!(
            split(&source, &word),
            Err(PacketError::UnknownEncoding { address: 0x1000 })
        ));
    }
}
