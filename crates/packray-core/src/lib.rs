//! # packray-core
//!
//! Core abstractions for the packray VLIW packet analyzer. This crate
//! defines the data model shared between the disassembly front end and
//! the packet analysis subsystem: parse tags, registers, operands with
//! scaled-immediate descriptors, decoded instruction records, and the
//! RTL micro-op templates attached to them.

pub mod instruction;
pub mod operand;
pub mod register;
pub mod rtl;
pub mod tag;

pub use instruction::{NewValueOperand, RawInstruction};
pub use operand::{Immediate, Operand, EXTENDED_LOW_BITS, EXTENDED_LOW_MASK};
pub use register::{control, Register, RegisterClass};
pub use rtl::{BinOp, RtlOp, RtlValue};
pub use tag::{LoopEnd, ParseTag};
