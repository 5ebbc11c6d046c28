//! RTL micro-op templates.
//!
//! The disassembly front end attaches a small register-transfer template
//! to each decoded instruction. Templates are written against the
//! instruction's own architectural registers and operand slots; the
//! packet synthesizer rewrites them into packet IR with parallel
//! (read-before-write) semantics. An instruction without a template
//! cannot participate in packet IR synthesis.

use crate::Register;

/// Binary ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AShr,
    CmpEq,
    CmpGt,
    CmpGtu,
}

impl BinOp {
    /// The assembly-style mnemonic for this operation.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "asl",
            Self::Shr => "lsr",
            Self::AShr => "asr",
            Self::CmpEq => "cmp.eq",
            Self::CmpGt => "cmp.gt",
            Self::CmpGtu => "cmp.gtu",
        }
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A value read by a template op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtlValue {
    /// An architectural register.
    Reg(Register),
    /// The instruction's operand at the given index. Immediate operands
    /// resolve to their effective (possibly extended) value.
    Operand(usize),
    /// A literal constant baked into the template.
    Const(i64),
    /// The not-yet-committed result of this packet's new-value producer.
    ///
    /// Only meaningful on instructions flagged with a new-value operand;
    /// the synthesizer threads the producer's temporary through here.
    NewValue,
}

/// One register-transfer micro-op.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtlOp {
    /// dst = src
    Copy { dst: Register, src: RtlValue },
    /// dst = op(lhs, rhs)
    Binary {
        op: BinOp,
        dst: Register,
        lhs: RtlValue,
        rhs: RtlValue,
    },
    /// dst = mem[addr], `size` bytes
    Load {
        dst: Register,
        addr: RtlValue,
        size: u8,
    },
    /// mem[addr] = value, `size` bytes
    Store {
        addr: RtlValue,
        value: RtlValue,
        size: u8,
    },
    /// Transfer control to `target`, optionally gated on `condition`.
    Branch {
        target: RtlValue,
        condition: Option<RtlValue>,
    },
}

impl RtlOp {
    /// The register this op defines, if any.
    pub fn def(&self) -> Option<Register> {
        match self {
            Self::Copy { dst, .. } | Self::Binary { dst, .. } | Self::Load { dst, .. } => Some(*dst),
            Self::Store { .. } | Self::Branch { .. } => None,
        }
    }
}
