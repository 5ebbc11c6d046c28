//! Packet boundary resolution.
//!
//! Packets are delimited by the per-word parse tags: every word up to
//! the last carries `Continue`, and the last carries one of the
//! terminating tags. Finding the packet containing an arbitrary address
//! therefore means scanning backward (bounded by the architectural
//! maximum packet length) for the previous terminator, then forward for
//! this packet's own terminator.

use packray_core::{LoopEnd, RawInstruction};

use crate::error::{PacketError, PacketResult};
use crate::source::InstructionSource;

/// Architectural maximum packet length, in words.
pub const MAX_PACKET_WORDS: usize = 4;

/// Size of one instruction word in bytes.
pub const WORD_BYTES: u64 = 4;

/// The word-granular extent of one packet, before duplex expansion.
#[derive(Debug, Clone)]
pub struct PacketWords {
    /// Address of the first word.
    pub start: u64,
    /// The member words, in address order. The last one terminates the
    /// packet; all others carry `Continue`.
    pub words: Vec<RawInstruction>,
    /// Hardware loop closed by this packet, if any.
    pub loop_end: LoopEnd,
}

/// Finds the start address of the packet containing `address`.
///
/// The scan walks backward one word at a time until it sees a word that
/// terminates a previous packet, or falls off the mapped region. It
/// gives up with [`PacketError::MalformedPacket`] after
/// [`MAX_PACKET_WORDS`] steps, so a corrupted stream never triggers an
/// unbounded rescan.
pub fn packet_start<S: InstructionSource>(source: &S, address: u64) -> PacketResult<u64> {
    // Sub-instruction addresses share their word's packet.
    let mut start = address & !(WORD_BYTES - 1);

    for _ in 0..MAX_PACKET_WORDS {
        let Some(prev) = start.checked_sub(WORD_BYTES) else {
            return Ok(start);
        };
        match source.instruction_at(prev) {
            // Start of the mapped region.
            None => return Ok(start),
            Some(prev_insn) if prev_insn.parse_tag.ends_packet() => return Ok(start),
            Some(_) => start = prev,
        }
    }

    Err(PacketError::malformed(address, MAX_PACKET_WORDS))
}

/// Collects the member words of the packet starting at `start`.
///
/// Fails with [`PacketError::MalformedPacket`] when no terminating tag
/// appears within [`MAX_PACKET_WORDS`] words, or when the stream ends
/// mid-packet.
pub fn packet_words<S: InstructionSource>(source: &S, start: u64) -> PacketResult<PacketWords> {
    let mut words = Vec::new();
    let mut address = start;

    for _ in 0..MAX_PACKET_WORDS {
        let insn = source
            .instruction_at(address)
            .ok_or_else(|| PacketError::malformed(address, MAX_PACKET_WORDS))?;
        let tag = insn.parse_tag;
        words.push(insn);

        if tag.ends_packet() {
            return Ok(PacketWords {
                start,
                words,
                loop_end: tag.loop_end(),
            });
        }
        address += WORD_BYTES;
    }

    Err(PacketError::malformed(start, MAX_PACKET_WORDS))
}
