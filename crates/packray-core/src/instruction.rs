//! Decoded instruction records.
//!
//! A [`RawInstruction`] is one unit of the stream as decoded by the
//! front end: a full 32-bit word, or a 16-bit sub-instruction split out
//! of a duplex word. Records are immutable once produced; the packet
//! analyzer clones and annotates its own copies.

use crate::{LoopEnd, Operand, ParseTag, Register, RtlOp};

/// A new-value operand flag on a consumer instruction.
///
/// `distance` counts register-writing instructions backward within the
/// packet: 1 means "the nearest prior writer".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NewValueOperand {
    /// How many register-writing producers back the referenced one sits.
    pub distance: u8,
}

/// One decoded instruction or sub-instruction at a linear address.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawInstruction {
    /// Linear address of this unit.
    pub address: u64,
    /// Size in bytes (4 for words, 2 for duplex sub-instructions).
    pub size: usize,
    /// The encoding word this unit was decoded from.
    pub word: u32,
    /// Mnemonic string.
    pub mnemonic: String,
    /// Operands, destination first.
    pub operands: Vec<Operand>,
    /// Registers read by this instruction.
    pub reads: Vec<Register>,
    /// Registers written by this instruction.
    pub writes: Vec<Register>,
    /// Packet continuation tag of the containing word.
    pub parse_tag: ParseTag,
    /// True for a constant-extender word.
    pub is_extender: bool,
    /// Present when an operand references a sibling's new value.
    pub new_value: Option<NewValueOperand>,
    /// RTL template for packet IR synthesis; `None` means the front end
    /// has no decodable semantics for this encoding.
    pub semantics: Option<Vec<RtlOp>>,
}

impl RawInstruction {
    /// Creates a new word-sized instruction record with minimal fields.
    pub fn new(address: u64, word: u32, mnemonic: impl Into<String>) -> Self {
        Self {
            address,
            size: 4,
            word,
            mnemonic: mnemonic.into(),
            operands: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            parse_tag: ParseTag::End,
            is_extender: false,
            new_value: None,
            semantics: None,
        }
    }

    /// Sets the byte size (sub-instructions are 2 bytes).
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Sets the parse tag.
    pub fn with_parse_tag(mut self, tag: ParseTag) -> Self {
        self.parse_tag = tag;
        self
    }

    /// Sets the operands.
    pub fn with_operands(mut self, operands: Vec<Operand>) -> Self {
        self.operands = operands;
        self
    }

    /// Sets the register read-set.
    pub fn with_reads(mut self, reads: Vec<Register>) -> Self {
        self.reads = reads;
        self
    }

    /// Sets the register write-set.
    pub fn with_writes(mut self, writes: Vec<Register>) -> Self {
        self.writes = writes;
        self
    }

    /// Attaches the RTL template.
    pub fn with_semantics(mut self, ops: Vec<RtlOp>) -> Self {
        self.semantics = Some(ops);
        self
    }

    /// Marks this record as a constant-extender word.
    pub fn as_extender(mut self) -> Self {
        self.is_extender = true;
        self
    }

    /// Flags a new-value operand at the given producer distance.
    pub fn with_new_value(mut self, distance: u8) -> Self {
        self.new_value = Some(NewValueOperand { distance });
        self
    }

    /// Returns the end address (address + size).
    pub fn end_address(&self) -> u64 {
        self.address + self.size as u64
    }

    /// Returns the hardware loop this instruction's word closes, if any.
    pub fn loop_end(&self) -> LoopEnd {
        self.parse_tag.loop_end()
    }

    /// Returns true if this instruction writes at least one register.
    ///
    /// This is the predicate new-value distance counting is defined
    /// over.
    pub fn writes_any_register(&self) -> bool {
        !self.writes.is_empty()
    }

    /// Index of the first immediate operand, the one a constant
    /// extender binds to.
    pub fn extendable_operand(&self) -> Option<usize> {
        self.operands
            .iter()
            .position(|op| matches!(op, Operand::Immediate(_)))
    }
}

impl std::fmt::Display for RawInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}:  {}", self.address, self.mnemonic)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}", op)?;
        }
        Ok(())
    }
}
