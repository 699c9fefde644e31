//! Five-stage pipeline tests for both controller personalities.

use acam_sim::common::event::{OP_COPY, OP_CUSTOM};
use acam_sim::common::{Event, SimError};
use acam_sim::core::control_core::CoreVariant;
use acam_sim::core::control_tile::{TileVariant, PARTIAL_SUM};
use acam_sim::core::isa::{opcodes, InstrClass, Instruction};
use acam_sim::core::memory::DataMemory;
use acam_sim::core::pipeline::{ControlVariant, Pipeline};
use acam_sim::sim::logging::TraceMask;
use acam_sim::soc::{Outbox, Port};

fn inst(opcode: u32, rd: u32, rs1: u32, rs2: u32, imm: u32, funct3: u32, funct7: u32) -> Instruction {
    Instruction {
        opcode,
        rd,
        rs1,
        rs2,
        imm,
        funct3,
        funct7,
    }
}

fn addi(rd: u32, rs1: u32, imm: u32) -> Instruction {
    inst(opcodes::OP_IMM, rd, rs1, 0, imm, 0, 0)
}

fn nop() -> Instruction {
    addi(0, 0, 0)
}

fn ret() -> Instruction {
    inst(opcodes::RET, 0, 0, 0, 0, 0, 0)
}

fn pipeline(program: Vec<Instruction>, image: &[u8]) -> Pipeline {
    Pipeline::new("test", program, DataMemory::new(image, 256), TraceMask::default())
}

/// Ticks until the program ends, returning every sent event with its cycle.
fn run<V: ControlVariant>(p: &mut Pipeline, variant: &V, max_cycles: u64) -> Vec<(u64, Port, Event)> {
    let mut sent = Vec::new();
    for cycle in 0..max_cycles {
        if p.ended() {
            return sent;
        }
        let mut out = Outbox::new();
        p.tick(variant, &mut out).unwrap();
        sent.extend(out.take().into_iter().map(|(port, event)| (cycle, port, event)));
    }
    assert!(p.ended(), "program did not end within {max_cycles} cycles");
    sent
}

/// Tests the timing and counters of a two-instruction program.
#[test]
fn test_single_instruction_timing() {
    let mut p = pipeline(vec![addi(1, 0, 10), ret()], &[]);
    let variant = CoreVariant;

    for _ in 0..5 {
        p.tick(&variant, &mut Outbox::new()).unwrap();
    }
    assert!(!p.ended());
    assert_eq!(p.regs.int.read(1), Ok(10));

    p.tick(&variant, &mut Outbox::new()).unwrap();
    assert!(p.ended());

    assert_eq!(p.stats.fetch, 2);
    assert_eq!(p.stats.decode, 2);
    assert_eq!(p.stats.alu, 1);
    assert_eq!(p.stats.memory, 0);
    assert_eq!(p.stats.fpu, 0);
}

/// Tests that an ended pipeline does nothing further.
#[test]
fn test_ended_pipeline_is_inert() {
    let mut p = pipeline(vec![ret()], &[]);
    run(&mut p, &CoreVariant, 20);
    let stats = p.stats;
    for _ in 0..10 {
        p.tick(&CoreVariant, &mut Outbox::new()).unwrap();
    }
    assert_eq!(p.stats, stats);
}

/// Tests that an instruction reading a register sees the value once it is written back.
#[test]
fn test_dependent_instructions_with_spacing() {
    let program = vec![
        addi(1, 0, 7),
        nop(),
        nop(),
        addi(2, 1, 5),
        nop(),
        nop(),
        inst(opcodes::OP, 3, 1, 2, 0, 0, 1),
        nop(),
        nop(),
        inst(opcodes::OP_IMM, 4, 3, 0, 2, 1, 0),
        inst(opcodes::LUI, 5, 0, 0, 3, 0, 0),
        ret(),
    ];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 100);

    assert_eq!(p.regs.int.read(1), Ok(7));
    assert_eq!(p.regs.int.read(2), Ok(12));
    assert_eq!(p.regs.int.read(3), Ok(84));
    assert_eq!(p.regs.int.read(4), Ok(336));
    assert_eq!(p.regs.int.read(5), Ok(3 << 12));
}

/// Tests that a register read too early sees the stale value (no forwarding).
#[test]
fn test_no_forwarding() {
    let program = vec![addi(1, 0, 7), addi(2, 1, 1), ret()];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 100);
    assert_eq!(p.regs.int.read(1), Ok(7));
    assert_eq!(p.regs.int.read(2), Ok(1));
}

/// Tests a taken branch: the two younger instructions are squashed and
/// fetch restarts relative to the fetch pointer. The instruction leaving
/// memory in the same cycle is dropped too, hence the padding.
#[test]
fn test_taken_branch_squashes_and_redirects() {
    let program = vec![
        addi(1, 0, 1),
        nop(),
        nop(),
        nop(),
        // bne x1, x0: pc at execute is 6, target 6 + 1
        inst(opcodes::BRANCH, 0, 1, 0, 1, 1, 0),
        addi(3, 0, 55),
        addi(2, 0, 99),
        addi(4, 0, 7),
        ret(),
    ];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 100);

    assert_eq!(p.regs.int.read(1), Ok(1));
    assert_eq!(p.regs.int.read(3), Ok(0), "squashed in decode");
    assert_eq!(p.regs.int.read(2), Ok(0), "skipped by the branch");
    assert_eq!(p.regs.int.read(4), Ok(7));
}

/// Tests a backward branch forming a counted loop.
#[test]
fn test_backward_branch_loop() {
    // x1 counts up to 3; the body is padded so the branch sees the new value.
    let program = vec![
        addi(2, 0, 3),
        addi(1, 1, 1),
        nop(),
        nop(),
        nop(),
        // bne x1, x2: pc at execute is 7, back to 1
        inst(opcodes::BRANCH, 0, 1, 2, 0x806, 1, 0),
        ret(),
    ];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 200);
    assert_eq!(p.regs.int.read(1), Ok(3));
}

/// Tests the state right after a taken backward branch executes.
///
/// The branch at index 9 executes in cycle 11, when the fetch pointer is 11.
/// Offset 0x805 is -5, so fetch restarts at 6 in the same cycle and the
/// instructions in decode and memory are discarded.
#[test]
fn test_taken_branch_redirects_and_flushes() {
    let mut program = vec![nop(); 7];
    program.push(addi(1, 0, 1));
    program.push(addi(2, 0, 2));
    program.push(inst(opcodes::BRANCH, 0, 0, 0, 0x805, 0, 0));
    program.push(addi(3, 0, 3));
    program.push(ret());
    let mut p = pipeline(program, &[]);
    let variant = CoreVariant;

    for _ in 0..11 {
        p.tick(&variant, &mut Outbox::new()).unwrap();
    }
    assert_eq!(p.state.pc, 11);
    assert!(p.state.decode.update);

    p.tick(&variant, &mut Outbox::new()).unwrap();
    assert_eq!(p.state.if_id.pc, 6);
    assert_eq!(p.state.pc, 7);
    assert!(p.state.fetch.update);
    assert!(!p.state.decode.update);
    assert!(!p.state.execute.update);
    assert!(!p.state.memory.update);

    // Index 7 retired before the flush; 8 (in memory) and 10 (in decode) did not.
    assert_eq!(p.regs.int.read(1), Ok(1));
    assert_eq!(p.regs.int.read(2), Ok(0));
    assert_eq!(p.regs.int.read(3), Ok(0));
}

/// Tests a not-taken branch falling through.
#[test]
fn test_untaken_branch_falls_through() {
    let program = vec![inst(opcodes::BRANCH, 0, 0, 0, 2, 1, 0), addi(1, 0, 4), ret()];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 100);
    assert_eq!(p.regs.int.read(1), Ok(4));
}

/// Tests integer store followed by a plain load on the control core.
#[test]
fn test_store_and_load_word() {
    let program = vec![
        addi(1, 0, 100),
        addi(2, 0, 0x1234),
        nop(),
        nop(),
        inst(opcodes::STORE, 0, 1, 2, 4, 0, 0),
        nop(),
        nop(),
        inst(opcodes::LOAD, 3, 1, 0, 4, 2, 0),
        ret(),
    ];
    let mut p = pipeline(program, &[]);
    run(&mut p, &CoreVariant, 100);

    assert_eq!(p.memory.read_u32(104), Ok(0x1234));
    assert_eq!(p.regs.int.read(3), Ok(0x1234));
    assert_eq!(p.stats.memory, 2);
}

/// Tests the gather load of the control core.
#[test]
fn test_gather_load() {
    let mut image = vec![0u8; 64];
    image[40] = 0x11;
    image[41] = 0x22;
    image[42] = 0x33;
    image[43] = 0x44;
    let program = vec![
        addi(1, 0, 0x0001_0203),
        nop(),
        nop(),
        nop(),
        inst(opcodes::LOAD, 2, 1, 0, 40, 0, 0),
        ret(),
    ];
    let mut p = pipeline(program, &image);
    run(&mut p, &CoreVariant, 100);
    assert_eq!(p.regs.int.read(2), Ok(0x1122_3344));
}

/// Tests that the tile controller always loads from `rs1 + imm`.
#[test]
fn test_tile_load_ignores_funct3() {
    let mut image = vec![0u8; 64];
    image[8..12].copy_from_slice(&0xCAFEu32.to_le_bytes());
    let program = vec![inst(opcodes::LOAD, 2, 0, 0, 8, 0, 0), ret()];
    let mut p = pipeline(program, &image);
    run(&mut p, &TileVariant { num_core: 1, index_class: 0 }, 100);
    assert_eq!(p.regs.int.read(2), Ok(0xCAFE));
}

/// Tests float load, add and store.
#[test]
fn test_float_add_round_trip_through_memory() {
    let mut image = vec![0u8; 64];
    image[16..20].copy_from_slice(&3.0f32.to_le_bytes());
    image[20..24].copy_from_slice(&1.5f32.to_le_bytes());
    let program = vec![
        inst(opcodes::LOAD_FP, 1, 0, 0, 16, 2, 0),
        inst(opcodes::LOAD_FP, 2, 0, 0, 20, 2, 0),
        nop(),
        nop(),
        inst(opcodes::OP_FP, 3, 1, 2, 0, 0, 0),
        nop(),
        nop(),
        nop(),
        inst(opcodes::STORE_FP, 0, 0, 3, 24, 0, 0),
        ret(),
    ];
    let mut p = pipeline(program, &image);
    run(&mut p, &CoreVariant, 100);

    assert_eq!(p.regs.fp.read(3), Ok(4.5));
    assert_eq!(p.memory.read_f32(24), Ok(4.5));
    assert_eq!(p.stats.fpu, 1);
}

/// Tests the personality-specific float operation tables.
#[test]
fn test_float_op_tables() {
    let core = CoreVariant;
    let tile = TileVariant { num_core: 1, index_class: 0 };
    assert!(core.fpu_op(4).is_some());
    assert!(core.fpu_op(8).is_some());
    assert!(core.fpu_op(12).is_none());
    assert!(tile.fpu_op(12).is_some());
    assert!(tile.fpu_op(4).is_none());
}

/// Tests that decoding a custom instruction sends the device command.
#[test]
fn test_custom_dispatch_at_decode() {
    let program = vec![
        inst(opcodes::CUSTOM, 0, 0, 0, 1, 0, 0),
        inst(opcodes::CUSTOM, 0, 0, 0, 4, 1, 0),
        inst(opcodes::CUSTOM, 0, 0, 0, 1, 2, 0),
        ret(),
    ];
    let mut p = pipeline(program, &[]);
    let sent = run(&mut p, &CoreVariant, 100);

    assert_eq!(
        sent,
        vec![
            (1, Port::ToCam, Event::core(OP_CUSTOM, 0, 1, vec![0])),
            (2, Port::ToMpe, Event::core(OP_CUSTOM, 0, 4, vec![0])),
            (3, Port::ToMmr, Event::core(OP_CUSTOM, 0, 1, vec![0])),
        ]
    );
}

/// Tests that the tile controller runs the custom opcode as an immediate op.
#[test]
fn test_tile_custom_opcode_is_immediate_op() {
    let program = vec![inst(opcodes::CUSTOM, 1, 0, 0, 3, 0, 0), ret()];
    let mut p = pipeline(program, &[]);
    let sent = run(&mut p, &TileVariant { num_core: 1, index_class: 0 }, 100);
    assert!(sent.is_empty());
    assert_eq!(p.regs.int.read(1), Ok(3));
}

/// Tests the two copy destinations of the control core.
#[test]
fn test_core_copy_destinations() {
    let image = [1u8, 2, 3, 4, 5, 6];
    let program = vec![
        addi(1, 0, 2),
        addi(2, 0, 1),
        addi(3, 0, 4),
        nop(),
        nop(),
        inst(opcodes::COPY, 1, 2, 3, 0, 2, 0),
        inst(opcodes::COPY, 0, 2, 3, 0, 0, 0),
        ret(),
    ];
    let mut p = pipeline(program, &image);
    let sent = run(&mut p, &CoreVariant, 100);

    assert_eq!(
        sent,
        vec![
            (8, Port::ToCamData, Event::core(OP_COPY, 2, 0, vec![2, 3, 4, 5])),
            (9, Port::ToTile, Event::network(OP_COPY, 0, 0, 0, 0, vec![2, 3, 4, 5])),
        ]
    );
}

/// Tests the tile controller copies: result to the router, vector to every core.
#[test]
fn test_tile_copy_destinations() {
    let mut memory = DataMemory::new(&[9, 8, 7, 6], 16544);
    memory.write_f32(PARTIAL_SUM, 2.5).unwrap();
    let program = vec![
        addi(1, 0, PARTIAL_SUM),
        addi(2, 0, 4),
        nop(),
        nop(),
        inst(opcodes::COPY, 0, 1, 2, 0, 0, 0),
        inst(opcodes::COPY, 0, 0, 2, 0, 1, 0),
        ret(),
    ];
    let mut p = Pipeline::new("tile", program, memory, TraceMask::default());
    let sent = run(&mut p, &TileVariant { num_core: 2, index_class: 5 }, 100);

    let to_router = Event::network(OP_COPY, 0, 0, 0, 5, 2.5f32.to_le_bytes().to_vec());
    let to_core = Event::network(OP_COPY, 0, 0, 0, 0, vec![9, 8, 7, 6]);
    assert_eq!(
        sent,
        vec![
            (7, Port::ToRouter, to_router),
            (8, Port::ToCore(0), to_core.clone()),
            (8, Port::ToCore(1), to_core),
        ]
    );
    assert_eq!(p.memory.read_f32(PARTIAL_SUM), Ok(0.0));
}

/// Tests that fetching past the end of instruction memory is fatal.
#[test]
fn test_fetch_out_of_range() {
    let mut p = pipeline(vec![nop()], &[]);
    p.tick(&CoreVariant, &mut Outbox::new()).unwrap();
    let err = p.tick(&CoreVariant, &mut Outbox::new()).unwrap_err();
    assert_eq!(err, SimError::PcOutOfRange { pc: 1, len: 1 });
    assert_eq!(p.stats.fetch, 2);
}

/// Tests that an unmapped function field is fatal at execute.
#[test]
fn test_unmapped_function() {
    let mut p = pipeline(vec![inst(opcodes::OP_IMM, 1, 0, 0, 0, 5, 0), ret()], &[]);
    let mut result = Ok(());
    for _ in 0..3 {
        result = p.tick(&CoreVariant, &mut Outbox::new());
        if result.is_err() {
            break;
        }
    }
    assert_eq!(
        result,
        Err(SimError::UnmappedFunction {
            stage: "execute",
            class: InstrClass::OpImm,
            funct3: 5,
            funct7: 0,
        })
    );
}

/// Tests that an unmapped float function is fatal.
#[test]
fn test_unmapped_float_function() {
    let mut p = pipeline(vec![inst(opcodes::OP_FP, 1, 0, 0, 0, 0, 12), ret()], &[]);
    let errors: Vec<_> = (0..4)
        .filter_map(|_| p.tick(&CoreVariant, &mut Outbox::new()).err())
        .collect();
    assert!(matches!(
        errors.first(),
        Some(SimError::UnmappedFunction { class: InstrClass::OpFp, funct7: 12, .. })
    ));
}

/// Tests that a register index past 31 is fatal at decode.
#[test]
fn test_register_index_out_of_range() {
    let mut p = pipeline(vec![addi(1, 40, 0), ret()], &[]);
    p.tick(&CoreVariant, &mut Outbox::new()).unwrap();
    assert_eq!(
        p.tick(&CoreVariant, &mut Outbox::new()),
        Err(SimError::RegisterOutOfRange(40))
    );
}

/// Tests that reset restarts fetch and keeps the ended flag.
#[test]
fn test_reset_restarts_fetch() {
    let mut p = pipeline(vec![nop(), nop(), addi(1, 0, 9), ret()], &[]);
    p.tick(&CoreVariant, &mut Outbox::new()).unwrap();
    p.reset(2);
    assert_eq!(p.state.pc, 2);
    assert!(!p.state.fetch.update);
    assert!(p.state.is_drained());
    run(&mut p, &CoreVariant, 50);
    assert_eq!(p.regs.int.read(1), Ok(9));
    assert_eq!(p.stats.fetch, 3);
}
