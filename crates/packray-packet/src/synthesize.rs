//! Parallel semantics synthesis.
//!
//! Turns a resolved [`Packet`] into one [`PacketIr`] in which no
//! instruction observes a sibling's write: reads reference the
//! architectural state as of packet entry, writes land in fresh
//! per-packet temporaries, and a commit phase at packet exit copies
//! temporaries into their architectural destinations -- registers in
//! program order (last write wins), then memory stores, then branches,
//! so loads in the packet never observe the packet's own stores.
//!
//! The single sanctioned exception to read isolation is the new-value
//! path: a consumer's `NewValue` read is threaded to the producer's
//! temporary, which carries the value the producer computes this
//! packet, not any committed register state.

use std::collections::HashMap;

use packray_core::{Operand, Register, RtlOp, RtlValue};

use crate::duplex::PacketEntry;
use crate::error::{PacketError, PacketResult};
use crate::ir::{CommitEpoch, IrOp, IrOpKind, PacketIr, SkippedIr, Storage, TempId};
use crate::new_value::{NewValueResolution, UnresolvedNewValue};
use crate::packet::Packet;

/// Synthesizes the combined IR program for one packet.
///
/// Fails with [`PacketError::UnknownEncoding`] if any entry lacks an
/// RTL template: partial parallel semantics would be unsound, so no
/// partial IR is ever returned. Entries with unresolved new-value
/// operands are omitted and recorded in [`PacketIr::skipped`] instead
/// of being guessed at.
pub fn synthesize(packet: &Packet) -> PacketResult<PacketIr> {
    // Constant extenders contribute no IR of their own; their effect
    // was already folded into the target's immediate.
    let active: Vec<&PacketEntry> = packet
        .entries
        .iter()
        .filter(|e| !e.insn.is_extender)
        .collect();

    // Whole-packet precheck before emitting anything.
    for entry in &active {
        if entry.insn.semantics.is_none() {
            return Err(PacketError::unknown_encoding(entry.insn.address));
        }
    }

    let mut ctx = Synthesis::new(packet);
    for entry in active {
        ctx.emit_entry(entry)?;
    }
    Ok(ctx.finish())
}

/// Register commits pending for the write epoch, in program order.
struct PendingCommit {
    owner: u64,
    register: Register,
    temp: TempId,
}

struct Synthesis<'p> {
    packet: &'p Packet,
    ops: Vec<IrOp>,
    stores: Vec<IrOp>,
    branches: Vec<IrOp>,
    commits: Vec<PendingCommit>,
    skipped: Vec<SkippedIr>,
    /// Final temporary per (producer address, register), for new-value
    /// consumers later in the packet.
    produced: HashMap<(u64, Register), TempId>,
    next_temp: u32,
}

impl<'p> Synthesis<'p> {
    fn new(packet: &'p Packet) -> Self {
        Self {
            packet,
            ops: Vec::new(),
            stores: Vec::new(),
            branches: Vec::new(),
            commits: Vec::new(),
            skipped: Vec::new(),
            produced: HashMap::new(),
            next_temp: 0,
        }
    }

    fn fresh_temp(&mut self) -> TempId {
        let id = TempId(self.next_temp);
        self.next_temp += 1;
        id
    }

    /// Emits the read-epoch ops for one entry and queues its commits.
    fn emit_entry(&mut self, entry: &PacketEntry) -> PacketResult<()> {
        let address = entry.insn.address;

        // An unresolved new-value operand makes this entry's semantics
        // undefined; omit its IR and flag it with the resolution's own
        // reason. The same holds when the resolved producer was itself
        // skipped and left no temporary.
        if let Some(resolution) = self.packet.new_value_for(address) {
            let unusable = match resolution {
                NewValueResolution::Resolved(binding) => {
                    if self
                        .produced
                        .contains_key(&(binding.producer, binding.register))
                    {
                        None
                    } else {
                        Some(PacketError::ambiguous_new_value(address))
                    }
                }
                NewValueResolution::Unresolved { reason, .. } => Some(match reason {
                    UnresolvedNewValue::AmbiguousProducer { .. } => {
                        PacketError::ambiguous_new_value(address)
                    }
                    UnresolvedNewValue::NoProducer { distance } => {
                        PacketError::missing_new_value_producer(address, *distance)
                    }
                }),
            };
            if let Some(reason) = unusable {
                self.skipped.push(SkippedIr { address, reason });
                return Ok(());
            }
        }

        let template = entry
            .insn
            .semantics
            .as_ref()
            .ok_or_else(|| PacketError::unknown_encoding(address))?;

        // Intra-instruction def-use is sequenced through this map;
        // across instructions, reads fall through to packet-entry
        // architectural state.
        let mut local: HashMap<Register, TempId> = HashMap::new();
        // Each def in template order; the last def of a register is the
        // one that commits and feeds new-value consumers.
        let mut defs: Vec<(Register, TempId)> = Vec::new();

        for op in template {
            match op {
                RtlOp::Copy { dst, src } => {
                    let src = self.read(entry, &local, *src)?;
                    let temp = self.define(&mut local, &mut defs, *dst);
                    self.ops.push(IrOp {
                        owner: address,
                        epoch: CommitEpoch::Read,
                        kind: IrOpKind::Copy {
                            dst: Storage::Temp(temp),
                            src,
                        },
                    });
                }
                RtlOp::Binary { op, dst, lhs, rhs } => {
                    let lhs = self.read(entry, &local, *lhs)?;
                    let rhs = self.read(entry, &local, *rhs)?;
                    let temp = self.define(&mut local, &mut defs, *dst);
                    self.ops.push(IrOp {
                        owner: address,
                        epoch: CommitEpoch::Read,
                        kind: IrOpKind::Binary {
                            op: *op,
                            dst: Storage::Temp(temp),
                            lhs,
                            rhs,
                        },
                    });
                }
                RtlOp::Load { dst, addr, size } => {
                    let addr = self.read(entry, &local, *addr)?;
                    let temp = self.define(&mut local, &mut defs, *dst);
                    self.ops.push(IrOp {
                        owner: address,
                        epoch: CommitEpoch::Read,
                        kind: IrOpKind::Load {
                            dst: Storage::Temp(temp),
                            addr,
                            size: *size,
                        },
                    });
                }
                RtlOp::Store { addr, value, size } => {
                    // Inputs are evaluated now (read epoch); the store
                    // itself is deferred past all register commits.
                    let addr = self.read(entry, &local, *addr)?;
                    let value = self.read(entry, &local, *value)?;
                    self.stores.push(IrOp {
                        owner: address,
                        epoch: CommitEpoch::Write,
                        kind: IrOpKind::Store {
                            addr,
                            value,
                            size: *size,
                        },
                    });
                }
                RtlOp::Branch { target, condition } => {
                    let target = self.read(entry, &local, *target)?;
                    let condition = condition
                        .map(|c| self.read(entry, &local, c))
                        .transpose()?;
                    self.branches.push(IrOp {
                        owner: address,
                        epoch: CommitEpoch::Write,
                        kind: IrOpKind::Branch { target, condition },
                    });
                }
            }
        }

        // Queue commits: for each register, its last def, in first-def
        // order within the instruction.
        let mut committed: Vec<Register> = Vec::new();
        for i in 0..defs.len() {
            let (register, _) = defs[i];
            if committed.contains(&register) {
                continue;
            }
            committed.push(register);
            let temp = defs
                .iter()
                .rev()
                .find(|(r, _)| *r == register)
                .map(|(_, t)| *t)
                .unwrap_or(defs[i].1);
            self.commits.push(PendingCommit {
                owner: address,
                register,
                temp,
            });
            self.produced.insert((address, register), temp);
        }

        Ok(())
    }

    /// Allocates the temporary for a register definition.
    fn define(
        &mut self,
        local: &mut HashMap<Register, TempId>,
        defs: &mut Vec<(Register, TempId)>,
        dst: Register,
    ) -> TempId {
        let temp = self.fresh_temp();
        local.insert(dst, temp);
        defs.push((dst, temp));
        temp
    }

    /// Rewrites one template value into a packet IR storage.
    fn read(
        &self,
        entry: &PacketEntry,
        local: &HashMap<Register, TempId>,
        value: RtlValue,
    ) -> PacketResult<Storage> {
        let address = entry.insn.address;
        match value {
            RtlValue::Reg(register) => Ok(self.read_register(local, register)),
            RtlValue::Const(value) => Ok(Storage::Imm(value)),
            RtlValue::Operand(index) => {
                let operand = entry
                    .insn
                    .operands
                    .get(index)
                    .ok_or_else(|| PacketError::unknown_encoding(address))?;
                Ok(match operand {
                    Operand::Register(register) => self.read_register(local, *register),
                    Operand::Immediate(imm) => Storage::Imm(imm.value()),
                    Operand::PcRelative { target, .. } => Storage::Imm(*target as i64),
                })
            }
            RtlValue::NewValue => {
                // A template may only name NewValue when the record was
                // flagged and the binding resolved; anything else is a
                // front-end inconsistency.
                let binding = self
                    .packet
                    .new_value_for(address)
                    .and_then(NewValueResolution::binding)
                    .ok_or_else(|| PacketError::unknown_encoding(address))?;
                let temp = self
                    .produced
                    .get(&(binding.producer, binding.register))
                    .ok_or_else(|| PacketError::ambiguous_new_value(address))?;
                Ok(Storage::Temp(*temp))
            }
        }
    }

    /// A register read: the instruction's own prior def if it has one,
    /// otherwise the packet-entry architectural value.
    fn read_register(&self, local: &HashMap<Register, TempId>, register: Register) -> Storage {
        match local.get(&register) {
            Some(temp) => Storage::Temp(*temp),
            None => Storage::Reg(register),
        }
    }

    fn finish(mut self) -> PacketIr {
        // Commit phase: registers in program order, last write wins by
        // emission order, then stores, then branches.
        let commits = std::mem::take(&mut self.commits);
        for commit in &commits {
            self.ops.push(IrOp {
                owner: commit.owner,
                epoch: CommitEpoch::Write,
                kind: IrOpKind::Copy {
                    dst: Storage::Reg(commit.register),
                    src: Storage::Temp(commit.temp),
                },
            });
        }
        self.ops.append(&mut self.stores);
        self.ops.append(&mut self.branches);

        PacketIr {
            start: self.packet.start,
            ops: self.ops,
            temp_count: self.next_temp,
            skipped: self.skipped,
        }
    }
}
