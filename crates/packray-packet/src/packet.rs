//! Packet resolution pipeline.
//!
//! Gathers the boundary scan, duplex expansion, constant extension, and
//! new-value resolution into one [`Packet`]: the fully resolved input
//! the parallel-semantics synthesizer works from.

use packray_core::{LoopEnd, ParseTag};

use crate::boundary::{self, PacketWords};
use crate::duplex::{self, PacketEntry};
use crate::error::{PacketError, PacketResult};
use crate::extender::{self, ExtensionBinding};
use crate::new_value::{self, NewValueResolution};
use crate::source::InstructionSource;

/// A fully resolved packet: one execution episode of the VLIW stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    /// Address of the first entry.
    pub start: u64,
    /// Address of the last entry (a sub-address for duplex packets).
    pub end: u64,
    /// The member entries in program order, duplex words expanded and
    /// constant extension applied.
    pub entries: Vec<PacketEntry>,
    /// Hardware loop this packet closes, if any.
    pub loop_end: LoopEnd,
    /// The packet's constant extension, if one was applied.
    pub extension: Option<ExtensionBinding>,
    /// Resolution outcome for every new-value consumer in the packet.
    pub new_values: Vec<NewValueResolution>,
    /// Non-fatal problems found while resolving (misplaced extensions).
    pub diagnostics: Vec<PacketError>,
}

impl Packet {
    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the packet has no entries. Resolution never
    /// produces an empty packet; this exists for symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if `address` is one of this packet's entries.
    pub fn contains(&self, address: u64) -> bool {
        self.entries.iter().any(|e| e.insn.address == address)
    }

    /// The new-value resolution for the consumer at `address`, if that
    /// entry is a consumer.
    pub fn new_value_for(&self, address: u64) -> Option<&NewValueResolution> {
        self.new_values.iter().find(|r| r.consumer() == address)
    }
}

/// Resolves the packet containing `address`.
///
/// Scans for the packet boundary, expands any trailing duplex word,
/// applies the constant extension, and resolves new-value operands.
/// Fails with [`PacketError::MalformedPacket`] when no boundary exists
/// within the architectural maximum, and with
/// [`PacketError::UnknownEncoding`] when a duplex word has no
/// sub-instruction decode.
pub fn resolve<S: InstructionSource>(source: &S, address: u64) -> PacketResult<Packet> {
    let start = boundary::packet_start(source, address)?;
    let words = boundary::packet_words(source, start)?;
    let mut diagnostics = Vec::new();

    let mut entries = expand(source, &words)?;
    let extension = extender::resolve(&mut entries, &mut diagnostics);
    let new_values = new_value::resolve_all(&entries);

    let end = entries.last().map(|e| e.insn.address).unwrap_or(start);
    Ok(Packet {
        start,
        end,
        entries,
        loop_end: words.loop_end,
        extension,
        new_values,
        diagnostics,
    })
}

/// Expands the packet's words into entries, splitting the trailing
/// duplex word if present.
fn expand<S: InstructionSource>(source: &S, words: &PacketWords) -> PacketResult<Vec<PacketEntry>> {
    let mut entries = Vec::with_capacity(words.words.len() + 1);
    for word in &words.words {
        if word.parse_tag == ParseTag::Duplex {
            let [first, second] = duplex::split(source, word)?;
            entries.push(first);
            entries.push(second);
        } else {
            entries.push(PacketEntry::word(word.clone()));
        }
    }
    Ok(entries)
}
