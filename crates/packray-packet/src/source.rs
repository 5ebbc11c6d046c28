//! Front-end instruction source.
//!
//! The disassembly front end is an external collaborator: it owns the
//! opcode tables, the parse-tag bit positions, and the duplex sub-opcode
//! decode. This module defines the narrow interface the packet analyzer
//! consumes, plus [`StreamSource`], an addressable index over decoded
//! records that serves as the host adapter.

use std::collections::{BTreeMap, HashMap};

use packray_core::{ParseTag, RawInstruction};

/// Access to the front end's decoded records.
///
/// Records are word-granular: a duplex word appears as a single record
/// at its word address, with the two sub-instruction records available
/// through [`duplex_parts`](Self::duplex_parts).
pub trait InstructionSource {
    /// The decoded record at exactly this address, if one exists.
    fn instruction_at(&self, address: u64) -> Option<RawInstruction>;

    /// The two sub-instruction records of the duplex word at `address`,
    /// in decode order: the first at `address`, the second at
    /// `address + 2`.
    fn duplex_parts(&self, address: u64) -> Option<(RawInstruction, RawInstruction)>;
}

/// An addressable index of decoded records backed by ordered maps.
///
/// Backward and forward packet scans are plain bounded loops over this
/// index; there is no coupling to listing or iterator abstractions.
#[derive(Debug, Default, Clone)]
pub struct StreamSource {
    words: BTreeMap<u64, RawInstruction>,
    duplexes: HashMap<u64, (RawInstruction, RawInstruction)>,
}

impl StreamSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a word-granular record.
    pub fn push(&mut self, insn: RawInstruction) {
        self.words.insert(insn.address, insn);
    }

    /// Adds a duplex word together with its two sub-instruction records.
    pub fn push_duplex(&mut self, word: RawInstruction, first: RawInstruction, second: RawInstruction) {
        debug_assert_eq!(word.parse_tag, ParseTag::Duplex);
        debug_assert_eq!(first.address, word.address);
        debug_assert_eq!(second.address, word.address + 2);
        self.duplexes.insert(word.address, (first, second));
        self.words.insert(word.address, word);
    }

    /// Builds a source from word-granular records.
    pub fn from_instructions(instructions: impl IntoIterator<Item = RawInstruction>) -> Self {
        let mut source = Self::new();
        for insn in instructions {
            source.push(insn);
        }
        source
    }

    /// Removes every record in the half-open byte range `[lo, hi)`.
    ///
    /// Used when the host re-disassembles a region.
    pub fn remove_range(&mut self, lo: u64, hi: u64) {
        let addresses: Vec<u64> = self.words.range(lo..hi).map(|(a, _)| *a).collect();
        for address in addresses {
            self.words.remove(&address);
            self.duplexes.remove(&address);
        }
    }

    /// Number of word-granular records.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Returns true if the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl InstructionSource for StreamSource {
    fn instruction_at(&self, address: u64) -> Option<RawInstruction> {
        self.words.get(&address).cloned()
    }

    fn duplex_parts(&self, address: u64) -> Option<(RawInstruction, RawInstruction)> {
        self.duplexes.get(&address).cloned()
    }
}
