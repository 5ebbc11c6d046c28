//! Packet IR: the synthesized combined program for one packet.
//!
//! Every instruction's reads happen in the read epoch against
//! packet-entry state, writes land in per-packet temporaries, and a
//! trailing write epoch commits temporaries to architectural state.
//! The commit ordering (registers in program order, then stores, then
//! branches) is the invariant downstream emulation relies on.

use packray_core::{BinOp, Register};

use crate::error::PacketError;

/// A per-packet temporary storage identifier.
///
/// Allocated fresh for each synthesis invocation; identifiers never
/// carry meaning across packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub u32);

/// A storage location referenced by packet IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Architectural register, read as of packet entry.
    Reg(Register),
    /// A packet-local temporary.
    Temp(TempId),
    /// An immediate value.
    Imm(i64),
}

/// Which phase of the packet an op executes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitEpoch {
    /// Per-instruction computation; reads pre-packet state, writes
    /// temporaries only.
    Read,
    /// Commit phase at packet exit; copies temporaries into
    /// architectural destinations and performs stores and branches.
    Write,
}

/// The operation of one IR op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrOpKind {
    /// dst = src
    Copy { dst: Storage, src: Storage },
    /// dst = op(lhs, rhs)
    Binary {
        op: BinOp,
        dst: Storage,
        lhs: Storage,
        rhs: Storage,
    },
    /// dst = mem[addr]
    Load {
        dst: Storage,
        addr: Storage,
        size: u8,
    },
    /// mem[addr] = value
    Store {
        addr: Storage,
        value: Storage,
        size: u8,
    },
    /// Control transfer, optionally gated on a nonzero condition.
    Branch {
        target: Storage,
        condition: Option<Storage>,
    },
}

/// One op of the combined packet program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrOp {
    /// Address of the instruction this op was synthesized from.
    pub owner: u64,
    /// Execution phase.
    pub epoch: CommitEpoch,
    /// The operation itself.
    pub kind: IrOpKind,
}

/// An entry whose IR was omitted rather than guessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedIr {
    /// Address of the omitted instruction.
    pub address: u64,
    /// Why it was omitted.
    pub reason: PacketError,
}

/// The synthesized combined program for one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketIr {
    /// Packet start address; the IR's cache key.
    pub start: u64,
    /// The ops: all read-epoch ops in program order, then the commit
    /// phase.
    pub ops: Vec<IrOp>,
    /// Number of temporaries allocated for this packet.
    pub temp_count: u32,
    /// Entries whose IR was omitted (unresolved new-value operands).
    pub skipped: Vec<SkippedIr>,
}

impl PacketIr {
    /// Ops belonging to the read epoch.
    pub fn read_ops(&self) -> impl Iterator<Item = &IrOp> {
        self.ops.iter().filter(|op| op.epoch == CommitEpoch::Read)
    }

    /// Ops belonging to the commit phase.
    pub fn commit_ops(&self) -> impl Iterator<Item = &IrOp> {
        self.ops.iter().filter(|op| op.epoch == CommitEpoch::Write)
    }
}

impl std::fmt::Display for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reg(reg) => write!(f, "{}", reg),
            Self::Temp(TempId(id)) => write!(f, "t{}", id),
            Self::Imm(value) => write!(f, "#{:#x}", value),
        }
    }
}

impl std::fmt::Display for IrOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            IrOpKind::Copy { dst, src } => write!(f, "{} = {}", dst, src),
            IrOpKind::Binary { op, dst, lhs, rhs } => {
                write!(f, "{} = {}({}, {})", dst, op, lhs, rhs)
            }
            IrOpKind::Load { dst, addr, size } => {
                write!(f, "{} = mem{}[{}]", dst, size, addr)
            }
            IrOpKind::Store { addr, value, size } => {
                write!(f, "mem{}[{}] = {}", size, addr, value)
            }
            IrOpKind::Branch { target, condition } => match condition {
                Some(cond) => write!(f, "if ({}) goto {}", cond, target),
                None => write!(f, "goto {}", target),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_display() {
        assert_eq!(Storage::Temp(TempId(3)).to_string(), "t3");
        assert_eq!(Storage::Reg(Register::gpr(0)).to_string(), "r0");
        assert_eq!(Storage::Imm(16).to_string(), "#0x10");
    }

    #[test]
    fn test_binary_op_display() {
        let op = IrOp {
            owner: 0x1000,
            epoch: CommitEpoch::Read,
            kind: IrOpKind::Binary {
                op: BinOp::Add,
                dst: Storage::Temp(TempId(1)),
                lhs: Storage::Reg(Register::gpr(2)),
                rhs: Storage::Imm(1),
            },
        };
        assert_eq!(op.to_string(), "t1 = add(r2, #0x1)");
    }

    #[test]
    fn test_epoch_partition() {
        let ir = PacketIr {
            start: 0x1000,
            ops: vec![
                IrOp {
                    owner: 0x1000,
                    epoch: CommitEpoch::Read,
                    kind: IrOpKind::Copy {
                        dst: Storage::Temp(TempId(0)),
                        src: Storage::Imm(1),
                    },
                },
                IrOp {
                    owner: 0x1000,
                    epoch: CommitEpoch::Write,
                    kind: IrOpKind::Copy {
                        dst: Storage::Reg(Register::gpr(1)),
                        src: Storage::Temp(TempId(0)),
                    },
                },
            ],
            temp_count: 1,
            skipped: Vec::new(),
        };
        assert_eq!(ir.read_ops().count(), 1);
        assert_eq!(ir.commit_ops().count(), 1);
    }
}
