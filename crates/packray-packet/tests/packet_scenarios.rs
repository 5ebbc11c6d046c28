//! End-to-end packet scenarios over concrete instruction words.
//!
//! The fixture front end below stands in for the real disassembler: it
//! reads the parse tag from bits 15:14 of each little-endian word (the
//! architecture's packet encoding) and attaches canned record shapes
//! for the handful of encodings the scenarios use. The subsystem under
//! test only ever sees the resulting records.

use packray_core::{BinOp, Operand, ParseTag, RawInstruction, Register, RtlOp, RtlValue};
use packray_packet::{PacketAnalysis, StreamSource};

/// Parse tag of a 32-bit word, per the architecture's bits 15:14.
fn parse_tag(word: u32) -> ParseTag {
    match (word >> 14) & 0x3 {
        0b11 => ParseTag::End,
        0b00 => ParseTag::Duplex,
        _ => ParseTag::Continue,
    }
}

/// Front-end decode of the fixture's known words.
fn decode_word(address: u64, word: u32) -> RawInstruction {
    let tag = parse_tag(word);
    match word {
        // allocframe(#8)
        0xa09d_c001 => RawInstruction::new(address, word, "allocframe")
            .with_parse_tag(tag)
            .with_operands(vec![Operand::scaled_imm(1, 11, 3)])
            .with_reads(vec![Register::sp(), Register::fp(), Register::lr()])
            .with_writes(vec![Register::sp(), Register::fp()])
            .with_semantics(vec![
                RtlOp::Store {
                    addr: RtlValue::Reg(Register::sp()),
                    value: RtlValue::Reg(Register::lr()),
                    size: 8,
                },
                RtlOp::Binary {
                    op: BinOp::Sub,
                    dst: Register::sp(),
                    lhs: RtlValue::Reg(Register::sp()),
                    rhs: RtlValue::Operand(0),
                },
                RtlOp::Copy {
                    dst: Register::fp(),
                    src: RtlValue::Reg(Register::sp()),
                },
            ]),
        // r0 = #0
        0x7800_e000 => RawInstruction::new(address, word, "r0 = #0")
            .with_parse_tag(tag)
            .with_operands(vec![Operand::imm(0, 16)])
            .with_writes(vec![Register::gpr(0)])
            .with_semantics(vec![RtlOp::Copy {
                dst: Register::gpr(0),
                src: RtlValue::Operand(0),
            }]),
        // r1 = add(r1, r1)
        0xf301_4101 => RawInstruction::new(address, word, "r1 = add(r1, r1)")
            .with_parse_tag(tag)
            .with_reads(vec![Register::gpr(1)])
            .with_writes(vec![Register::gpr(1)])
            .with_semantics(vec![RtlOp::Binary {
                op: BinOp::Add,
                dst: Register::gpr(1),
                lhs: RtlValue::Reg(Register::gpr(1)),
                rhs: RtlValue::Reg(Register::gpr(1)),
            }]),
        // jumpr r31
        0x5280_c000 => RawInstruction::new(address, word, "jumpr r31")
            .with_parse_tag(tag)
            .with_reads(vec![Register::lr()])
            .with_semantics(vec![RtlOp::Branch {
                target: RtlValue::Reg(Register::lr()),
                condition: None,
            }]),
        _ => RawInstruction::new(address, word, "insn")
            .with_parse_tag(tag)
            .with_semantics(vec![]),
    }
}

/// Builds the fixture source from raw little-endian bytes.
fn source_from_bytes(base: u64, bytes: &[u8]) -> StreamSource {
    let mut source = StreamSource::new();
    for (i, chunk) in bytes.chunks_exact(4).enumerate() {
        let address = base + (i as u64) * 4;
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if parse_tag(word) == ParseTag::Duplex {
            let record = RawInstruction::new(address, word, "duplex")
                .with_parse_tag(ParseTag::Duplex);
            // The front end decodes the two sub-opcode fields; the
            // fixture stands in with fixed shapes.
            let first = RawInstruction::new(address, word, "r0 = #0")
                .with_size(2)
                .with_parse_tag(ParseTag::Duplex)
                .with_writes(vec![Register::gpr(0)])
                .with_semantics(vec![RtlOp::Copy {
                    dst: Register::gpr(0),
                    src: RtlValue::Const(0),
                }]);
            let second = RawInstruction::new(address + 2, word, "dealloc_return")
                .with_size(2)
                .with_parse_tag(ParseTag::Duplex)
                .with_reads(vec![Register::fp()])
                .with_writes(vec![Register::sp(), Register::fp(), Register::lr()])
                .with_semantics(vec![
                    RtlOp::Load {
                        dst: Register::lr(),
                        addr: RtlValue::Reg(Register::fp()),
                        size: 8,
                    },
                    RtlOp::Branch {
                        target: RtlValue::Reg(Register::lr()),
                        condition: None,
                    },
                ]);
            source.push_duplex(record, first, second);
        } else {
            source.push(decode_word(address, word));
        }
    }
    source
}

// Scenario A: two single-instruction packets.
#[test]
fn test_two_single_instruction_packets() {
    let bytes = [0x01, 0xc0, 0x9d, 0xa0, 0x00, 0xe0, 0x00, 0x78];
    let analysis = PacketAnalysis::new(source_from_bytes(0x1000, &bytes));

    let first = analysis.resolve_packet(0x1000).unwrap();
    let second = analysis.resolve_packet(0x1004).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_ne!(first.start, second.start);

    // Open and close markers land on the same instruction.
    assert_eq!(analysis.mnemonic_prefix(0x1000), "{");
    assert_eq!(analysis.mnemonic_suffix(0x1000), "}");
    assert_eq!(analysis.mnemonic_prefix(0x1004), "{");
    assert_eq!(analysis.mnemonic_suffix(0x1004), "}");
}

// Scenario B: one two-instruction packet.
#[test]
fn test_two_instruction_packet() {
    let bytes = [0x01, 0x41, 0x01, 0xf3, 0x00, 0xc0, 0x80, 0x52];
    let analysis = PacketAnalysis::new(source_from_bytes(0x1000, &bytes));

    let packet = analysis.resolve_packet(0x1000).unwrap();
    assert_eq!(packet.len(), 2);
    assert_eq!(packet.start, 0x1000);
    assert_eq!(packet.end, 0x1004);

    assert_eq!(analysis.mnemonic_prefix(0x1000), "{");
    assert_eq!(analysis.mnemonic_suffix(0x1000), " ");
    assert_eq!(analysis.mnemonic_prefix(0x1004), " ");
    assert_eq!(analysis.mnemonic_suffix(0x1004), "}");
    assert!(analysis.is_end_of_parallel_group(0x1004));
    assert!(!analysis.is_end_of_parallel_group(0x1000));
}

// Scenario C: a duplex word splits into a two-entry packet.
#[test]
fn test_duplex_word_packet() {
    let bytes = [0xc0, 0x3f, 0x10, 0x48];
    let analysis = PacketAnalysis::new(source_from_bytes(0x1000, &bytes));

    let packet = analysis.resolve_packet(0x1000).unwrap();
    assert_eq!(packet.len(), 2);
    assert_eq!(packet.entries[0].insn.address, 0x1000);
    assert_eq!(packet.entries[1].insn.address, 0x1002);
    assert!(packet.entries.iter().all(|e| e.origin.is_duplex()));

    // Both sub-instructions share one packet; the word closes it.
    assert_eq!(analysis.mnemonic_prefix(0x1000), "{");
    assert_eq!(analysis.mnemonic_suffix(0x1002), "}");
}

// Scenario D: extended branch immediate, literal concatenation with no
// post-scaling.
#[test]
fn test_extended_branch_immediate() {
    let mut source = StreamSource::new();
    source.push(
        RawInstruction::new(0x1000, 0, "immext")
            .with_parse_tag(ParseTag::Continue)
            .with_operands(vec![Operand::scaled_imm(0x0002_1840 >> 6, 26, 6)])
            .as_extender(),
    );
    source.push(
        RawInstruction::new(0x1004, 0, "jump")
            .with_parse_tag(ParseTag::End)
            .with_operands(vec![Operand::scaled_imm(0x19, 9, 2)])
            .with_semantics(vec![RtlOp::Branch {
                target: RtlValue::Operand(0),
                condition: None,
            }]),
    );
    let analysis = PacketAnalysis::new(source);

    let packet = analysis.resolve_packet(0x1000).unwrap();
    let binding = packet.extension.expect("extension must bind");
    assert_eq!(binding.extender, 0x1000);
    assert_eq!(binding.target, 0x1004);

    let imm = packet.entries[1].insn.operands[0].as_immediate().unwrap();
    // Extender bits with the field's low 6 bits, no left shift.
    assert_eq!(imm.value(), 0x0002_1859);
    // The plain (unextended) decode would have produced 0x19 << 2.
    assert_ne!(imm.value(), 0x19 << 2);

    // The extended value flows into the packet IR branch.
    let ir = analysis.packet_ir(0x1004).unwrap();
    assert!(ir.ops.iter().any(|op| matches!(
        op.kind,
        packray_packet::IrOpKind::Branch {
            target: packray_packet::Storage::Imm(0x0002_1859),
            ..
        }
    )));
}

// An extender in front of a duplex word: both sub-instructions set an
// immediate, and the extension lands in the second-decoded slot while
// the first keeps its plain value.
#[test]
fn test_extended_duplex_binds_second_sub_instruction() {
    let mut source = StreamSource::new();
    source.push(
        RawInstruction::new(0x1000, 0, "immext")
            .with_parse_tag(ParseTag::Continue)
            .with_operands(vec![Operand::scaled_imm(0xc0f9_ed00 >> 6, 26, 6)])
            .as_extender(),
    );
    let word = RawInstruction::new(0x1004, 0x2a1d_2814, "duplex")
        .with_parse_tag(ParseTag::Duplex);
    let first = RawInstruction::new(0x1004, 0x2a1d_2814, "r2 = #29")
        .with_size(2)
        .with_parse_tag(ParseTag::Duplex)
        .with_operands(vec![Operand::imm(0x1d, 6)])
        .with_writes(vec![Register::gpr(2)])
        .with_semantics(vec![RtlOp::Copy {
            dst: Register::gpr(2),
            src: RtlValue::Operand(0),
        }]);
    let second = RawInstruction::new(0x1006, 0x2a1d_2814, "r1 = #20")
        .with_size(2)
        .with_parse_tag(ParseTag::Duplex)
        .with_operands(vec![Operand::imm(0x14, 6)])
        .with_writes(vec![Register::gpr(1)])
        .with_semantics(vec![RtlOp::Copy {
            dst: Register::gpr(1),
            src: RtlValue::Operand(0),
        }]);
    source.push_duplex(word, first, second);
    let analysis = PacketAnalysis::new(source);

    let packet = analysis.resolve_packet(0x1000).unwrap();
    let binding = packet
        .extension
        .expect("extension must bind to the second-decoded sub-instruction");
    assert_eq!(binding.extender, 0x1000);
    assert_eq!(binding.target, 0x1006);
    assert!(packet.diagnostics.is_empty());

    // word+0 keeps its plain immediate, word+2 carries the full value.
    let slot0 = packet.entries[1].insn.operands[0].as_immediate().unwrap();
    assert!(!slot0.is_extended());
    assert_eq!(slot0.value(), 0x1d);
    let slot1 = packet.entries[2].insn.operands[0].as_immediate().unwrap();
    assert_eq!(slot1.extension, Some(0xc0f9_ed14));
}

// Scenario E: hardware-loop-ending packet.
#[test]
fn test_endloop_suffix() {
    let mut source = StreamSource::new();
    source.push(
        RawInstruction::new(0x1000, 0, "r2 = add(r2, #-1)")
            .with_parse_tag(ParseTag::Continue)
            .with_reads(vec![Register::gpr(2)])
            .with_writes(vec![Register::gpr(2)])
            .with_semantics(vec![RtlOp::Binary {
                op: BinOp::Add,
                dst: Register::gpr(2),
                lhs: RtlValue::Reg(Register::gpr(2)),
                rhs: RtlValue::Const(-1),
            }]),
    );
    source.push(
        RawInstruction::new(0x1004, 0, "nop")
            .with_parse_tag(ParseTag::EndLoop0)
            .with_semantics(vec![]),
    );
    let analysis = PacketAnalysis::new(source);

    assert_eq!(analysis.mnemonic_suffix(0x1004), "}:endloop0");
    assert_eq!(analysis.mnemonic_suffix(0x1000), " ");
    assert_eq!(analysis.mnemonic_prefix(0x1000), "{");

    let packet = analysis.resolve_packet(0x1000).unwrap();
    assert_eq!(packet.loop_end, packray_core::LoopEnd::Loop0);
}

// Round-trip: repeated queries return the cached structure.
#[test]
fn test_cache_round_trip() {
    let bytes = [0x01, 0x41, 0x01, 0xf3, 0x00, 0xc0, 0x80, 0x52];
    let analysis = PacketAnalysis::new(source_from_bytes(0x1000, &bytes));

    let packet_a = analysis.resolve_packet(0x1004).unwrap();
    let packet_b = analysis.resolve_packet(0x1000).unwrap();
    assert!(std::sync::Arc::ptr_eq(&packet_a, &packet_b));

    let ir_a = analysis.packet_ir(0x1000).unwrap();
    let ir_b = analysis.packet_ir(0x1004).unwrap();
    assert!(std::sync::Arc::ptr_eq(&ir_a, &ir_b));
}
