//! Instruction table loading and opcode decode tests.

use acam_sim::common::SimError;
use acam_sim::core::isa::{self, opcodes, InstrClass, Instruction, INSTRUCTION_FIELDS};

/// Tests that every opcode of the table maps to its class.
#[test]
fn test_opcode_table() {
    let cases = [
        (opcodes::RET, InstrClass::Ret),
        (opcodes::LOAD, InstrClass::Load),
        (opcodes::LOAD_FP, InstrClass::LoadFp),
        (opcodes::COPY, InstrClass::Copy),
        (opcodes::OP_IMM, InstrClass::OpImm),
        (opcodes::STORE, InstrClass::Store),
        (opcodes::STORE_FP, InstrClass::StoreFp),
        (opcodes::CUSTOM, InstrClass::Custom),
        (opcodes::OP, InstrClass::Op),
        (opcodes::LUI, InstrClass::Lui),
        (opcodes::OP_FP, InstrClass::OpFp),
        (opcodes::BRANCH, InstrClass::Branch),
    ];
    for (opcode, class) in cases {
        assert_eq!(InstrClass::from_opcode(opcode, true), (class, false), "opcode {opcode}");
        assert_eq!(class.opcode(), opcode);
    }
}

/// Tests the silent immediate-op fallback for unknown opcodes.
#[test]
fn test_unknown_opcode_falls_back() {
    assert_eq!(InstrClass::from_opcode(1, true), (InstrClass::OpImm, true));
    assert_eq!(InstrClass::from_opcode(127, true), (InstrClass::OpImm, true));
}

/// Tests that the custom opcode falls back when the class is disabled.
#[test]
fn test_custom_disabled_falls_back() {
    assert_eq!(InstrClass::from_opcode(opcodes::CUSTOM, false), (InstrClass::OpImm, true));
    assert_eq!(InstrClass::from_opcode(opcodes::COPY, false), (InstrClass::Copy, false));
}

/// Tests splitting a flat table into instructions.
#[test]
fn test_parse_table() {
    let table = [19, 1, 0, 0, 10, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let program = isa::parse_table(&table).unwrap();
    assert_eq!(program.len(), 2);
    assert_eq!(
        program[0],
        Instruction {
            opcode: 19,
            rd: 1,
            rs1: 0,
            rs2: 0,
            imm: 10,
            funct3: 0,
            funct7: 0,
        }
    );
    assert_eq!(program[1].opcode, opcodes::RET);
    assert_eq!(isa::flatten(&program), table.to_vec());
}

/// Tests that a table with a partial instruction is rejected.
#[test]
fn test_parse_table_rejects_partial_instruction() {
    let table = vec![0u32; INSTRUCTION_FIELDS + 3];
    assert_eq!(isa::parse_table(&table), Err(SimError::MalformedProgram(10)));
    assert_eq!(isa::parse_table(&[]), Ok(Vec::new()));
}

/// Tests field order of single instructions.
#[test]
fn test_instruction_fields() {
    let inst = Instruction::from_fields([83, 3, 1, 2, 0, 0, 8]);
    assert_eq!(inst.opcode, 83);
    assert_eq!(inst.rd, 3);
    assert_eq!(inst.rs1, 1);
    assert_eq!(inst.rs2, 2);
    assert_eq!(inst.funct7, 8);
    assert_eq!(inst.to_fields(), [83, 3, 1, 2, 0, 0, 8]);
}
