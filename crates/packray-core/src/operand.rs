//! Instruction operand types.
//!
//! The important subtlety here is the scaled immediate: many encodings
//! store an immediate field that the hardware implicitly shifts left
//! before use. A constant extender in the same packet replaces the
//! immediate with an exact 32-bit value and suppresses that shift, so
//! the descriptor keeps the raw field, the scale, and the extension
//! separate and only combines them on demand.

use crate::Register;

/// Number of low-order bits the extended instruction contributes to an
/// extended immediate. The constant extender supplies the rest.
pub const EXTENDED_LOW_BITS: u32 = 6;

/// Mask covering the low-order bits kept from the target's own field.
pub const EXTENDED_LOW_MASK: u32 = (1 << EXTENDED_LOW_BITS) - 1;

/// An instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// Register operand.
    Register(Register),
    /// Immediate value, possibly scaled and possibly extended.
    Immediate(Immediate),
    /// PC-relative address (branches/calls with a resolved target).
    PcRelative {
        /// Offset from the packet PC.
        offset: i64,
        /// Resolved target address.
        target: u64,
    },
}

impl Operand {
    /// Creates a register operand.
    pub fn reg(reg: Register) -> Self {
        Self::Register(reg)
    }

    /// Creates an unscaled immediate operand.
    pub fn imm(raw: i64, bits: u8) -> Self {
        Self::Immediate(Immediate::new(raw, bits))
    }

    /// Creates a scaled immediate operand.
    pub fn scaled_imm(raw: i64, bits: u8, scale: u8) -> Self {
        Self::Immediate(Immediate::new(raw, bits).with_scale(scale))
    }

    /// Creates a PC-relative operand.
    pub fn pc_rel(offset: i64, target: u64) -> Self {
        Self::PcRelative { offset, target }
    }

    /// Returns the immediate descriptor, if this is an immediate operand.
    pub fn as_immediate(&self) -> Option<&Immediate> {
        match self {
            Self::Immediate(imm) => Some(imm),
            _ => None,
        }
    }

    /// Mutable access to the immediate descriptor.
    pub fn as_immediate_mut(&mut self) -> Option<&mut Immediate> {
        match self {
            Self::Immediate(imm) => Some(imm),
            _ => None,
        }
    }
}

/// A scaled-immediate descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Immediate {
    /// The encoded field value, sign-extended, before scaling.
    pub raw: i64,
    /// Width of the encoded field in bits.
    pub bits: u8,
    /// Implicit left shift applied when the immediate is not extended.
    pub scale: u8,
    /// Whether the field is signed.
    pub signed: bool,
    /// Full 32-bit value installed by a constant extender, if any.
    pub extension: Option<u32>,
}

impl Immediate {
    /// Creates a signed, unscaled immediate.
    pub fn new(raw: i64, bits: u8) -> Self {
        Self {
            raw,
            bits,
            scale: 0,
            signed: true,
            extension: None,
        }
    }

    /// Sets the implicit scale.
    pub fn with_scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
    }

    /// Marks the field as unsigned.
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Installs a constant extension.
    ///
    /// The resulting value is the extender's bits with the low
    /// [`EXTENDED_LOW_BITS`] replaced by this field's own low bits.
    /// The implicit scale no longer applies: extension supplies the
    /// exact bit pattern.
    pub fn extend(&mut self, extender_value: u32) {
        let low = (self.raw as u32) & EXTENDED_LOW_MASK;
        self.extension = Some((extender_value & !EXTENDED_LOW_MASK) | low);
    }

    /// Returns true if a constant extension has been applied.
    pub fn is_extended(&self) -> bool {
        self.extension.is_some()
    }

    /// The effective operand value.
    ///
    /// Unextended immediates apply the implicit scale; extended ones
    /// are the literal 32-bit extension result.
    pub fn value(&self) -> i64 {
        match self.extension {
            Some(full) => full as i32 as i64,
            None => self.raw << self.scale,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "{}", reg),
            Self::Immediate(imm) => {
                let value = imm.value();
                if value < 0 {
                    write!(f, "#-{:#x}", -value)
                } else {
                    write!(f, "#{:#x}", value)
                }
            }
            Self::PcRelative { target, .. } => write!(f, "{:#x}", target),
        }
    }
}
