//! # packray-packet
//!
//! VLIW packet analysis for a Hexagon-class instruction stream.
//!
//! This crate provides:
//! - Packet boundary resolution from per-word parse tags
//! - Duplex word splitting into sub-instruction entries
//! - Constant-extension propagation with scale suppression
//! - New-value producer/consumer binding
//! - Synthesis of one combined IR program per packet with parallel
//!   (read-before-any-write) commit semantics
//! - A per-binary memoizing cache with a create-once session guard
//!
//! The disassembly front end is an external collaborator reached
//! through the [`InstructionSource`] trait; this crate never touches
//! raw opcode tables or parse-tag bit positions.

pub mod boundary;
pub mod cache;
pub mod duplex;
pub mod error;
pub mod extender;
pub mod ir;
pub mod new_value;
pub mod packet;
pub mod session;
pub mod source;
pub mod synthesize;

pub use boundary::{packet_start, packet_words, PacketWords, MAX_PACKET_WORDS, WORD_BYTES};
pub use cache::PacketAnalysis;
pub use duplex::{EntryOrigin, PacketEntry, SUB_INSN_BYTES};
pub use error::{PacketError, PacketResult};
pub use extender::ExtensionBinding;
pub use ir::{CommitEpoch, IrOp, IrOpKind, PacketIr, SkippedIr, Storage, TempId};
pub use new_value::{NewValueBinding, NewValueResolution, UnresolvedNewValue};
pub use packet::Packet;
pub use session::AnalysisSession;
pub use source::{InstructionSource, StreamSource};
pub use synthesize::synthesize;
