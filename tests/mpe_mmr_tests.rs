//! Match processing element and match register tests.

use acam_sim::common::{Event, SimError};
use acam_sim::config::EngineConfig;
use acam_sim::devices::mmr::{self, Mmr, SENTINEL};
use acam_sim::devices::mpe::{commands, Mpe, MpeState};
use acam_sim::sim::logging::TraceMask;
use acam_sim::soc::{Component, Outbox, Port};
use acam_sim::stats::SimStats;

fn engine(rows: usize, latency: u64) -> EngineConfig {
    EngineConfig { latency, num_row: rows }
}

fn mpe(rows: usize) -> Mpe {
    Mpe::new("mpe", &engine(rows, 1), TraceMask::default())
}

fn load(mpe: &mut Mpe, data: &[u8]) {
    mpe.handle(Port::Data, Event::core(0, 0, 0, data.to_vec()), 0, &mut Outbox::new())
        .unwrap();
}

/// Tests that a fresh engine starts in the reset state.
#[test]
fn test_mpe_initial_state_is_reset_state() {
    let engine = mpe(4);
    assert_eq!(engine.state(), &MpeState::reset(4));
    assert_eq!(engine.state().p, vec![1; 4]);
    assert_eq!(engine.state().n, vec![0; 4]);
}

/// Tests update, the packed statistics and the decision vectors.
#[test]
fn test_mpe_update_read_and_decide() {
    let mut engine = mpe(4);
    let mut out = Outbox::new();

    load(&mut engine, &[1, 0, 1, 0]);
    engine.execute(commands::LOAD_TEST, &mut out).unwrap();
    load(&mut engine, &[1, 1, 0, 0]);
    engine.execute(commands::LOAD_BASE, &mut out).unwrap();
    engine.execute(commands::UPDATE, &mut out).unwrap();

    assert_eq!(engine.state().n, vec![0, 1, 1, 0]);
    assert_eq!(engine.state().s, vec![0, 0, 1, 0]);
    assert_eq!(engine.state().p, vec![1, 1, 1, 0]);

    engine.execute(commands::READ_NS, &mut out).unwrap();
    engine.execute(commands::DECIDE, &mut out).unwrap();
    let sent = out.take();
    assert_eq!(
        sent,
        vec![
            (Port::Response, Event::core(0, 0, 0, vec![0, 8, 9, 0])),
            (Port::Output, Event::core(0, 0, 0, vec![0, 0, 1, 1, 0, 1, 0, 1])),
        ]
    );
    assert_eq!(engine.active_cycles(), 5);
}

/// Tests that equal test and base vectors select only the sentinel row.
#[test]
fn test_mpe_equal_vectors_decide_sentinel_only() {
    let mut engine = mpe(4);
    let mut out = Outbox::new();
    engine.execute(commands::RESET, &mut out).unwrap();
    load(&mut engine, &[1, 1, 1, 1]);
    engine.execute(commands::LOAD_TEST, &mut out).unwrap();
    engine.execute(commands::LOAD_BASE, &mut out).unwrap();
    engine.execute(commands::UPDATE, &mut out).unwrap();

    assert_eq!(engine.state().n, vec![0; 4]);
    assert_eq!(engine.state().s, vec![0; 4]);
    assert_eq!(engine.state().p, vec![1; 4]);

    engine.execute(commands::DECIDE, &mut out).unwrap();
    let sent = out.take();
    assert_eq!(sent[0].1.payload(), &[0, 0, 0, 1, 0, 0, 0, 1]);
}

/// Tests that repeated updates accumulate and the packing keeps three bits.
#[test]
fn test_mpe_counts_wrap_in_packing() {
    let mut engine = mpe(2);
    let mut out = Outbox::new();
    load(&mut engine, &[1, 1]);
    engine.execute(commands::LOAD_TEST, &mut out).unwrap();
    for _ in 0..9 {
        engine.execute(commands::UPDATE, &mut out).unwrap();
    }
    assert_eq!(engine.state().n, vec![9, 9]);
    assert_eq!(engine.state().s, vec![9, 9]);
    assert_eq!(engine.state().pack_ns(), vec![(1 << 3) | 1, (1 << 3) | 1]);
}

/// Tests that reset restores the initial vectors.
#[test]
fn test_mpe_reset_command() {
    let mut engine = mpe(3);
    let mut out = Outbox::new();
    load(&mut engine, &[1, 0, 1]);
    engine.execute(commands::LOAD_TEST, &mut out).unwrap();
    engine.execute(commands::UPDATE, &mut out).unwrap();
    engine.execute(commands::RESET, &mut out).unwrap();
    assert_eq!(engine.state(), &MpeState::reset(3));
}

/// Tests that match vectors are fitted to the row count.
#[test]
fn test_mpe_data_fitted_to_rows() {
    let mut engine = mpe(4);
    let mut out = Outbox::new();
    load(&mut engine, &[1]);
    engine.execute(commands::LOAD_TEST, &mut out).unwrap();
    assert_eq!(engine.state().t, vec![1, 0, 0, 0]);

    load(&mut engine, &[1, 1, 1, 1, 1, 1]);
    engine.execute(commands::LOAD_BASE, &mut out).unwrap();
    assert_eq!(engine.state().b, vec![1, 1, 1, 1]);
}

/// Tests that unknown commands are fatal.
#[test]
fn test_mpe_unknown_command() {
    let mut engine = mpe(2);
    assert_eq!(
        engine.execute(9, &mut Outbox::new()),
        Err(SimError::UnknownCommand(9))
    );
}

/// Tests command timing through the request port.
#[test]
fn test_mpe_request_latency() {
    let mut engine = Mpe::new("mpe", &engine(2, 3), TraceMask::default());
    let mut out = Outbox::new();
    engine
        .handle(Port::Request, Event::core(43, 0, commands::READ_NS, vec![0]), 5, &mut out)
        .unwrap();

    let mut seen = None;
    for cycle in 6..12 {
        engine.tick(cycle, &mut out).unwrap();
        if !out.is_empty() {
            seen = Some(cycle);
            break;
        }
    }
    // Started at 6, completes at 6 + 3 - 1.
    assert_eq!(seen, Some(8));
    assert!(engine.is_quiescent());

    let mut stats = SimStats::new();
    engine.finish(20, &mut stats);
    assert_eq!(stats.get("mpe", "active_cycles"), Some(1.0));
}

/// Tests index extraction from one half.
#[test]
fn test_extract_lowest_indices() {
    let mut bits = vec![0, 1, 1, 0, 1];
    let mut slots = [SENTINEL; 8];
    mmr::extract(&mut bits, &mut slots);
    assert_eq!(slots, [1, 2, 4, 255, 255, 255, 255, 255]);
    assert_eq!(bits, vec![0; 5]);
}

/// Tests that three set bits come out ascending with sentinel padding, in both halves.
#[test]
fn test_mmr_three_matches_per_half() {
    let mut reg = Mmr::new("mmr", &engine(10, 1), TraceMask::default());
    let mut vector = vec![0u8; 20];
    for i in [2, 5, 9] {
        vector[i] = 1;
        vector[10 + i] = 1;
    }
    reg.load(&vector);
    let indices = reg.extract_indices();
    assert_eq!(&indices[..8], &[2, 5, 9, 255, 255, 255, 255, 255]);
    assert_eq!(&indices[8..], &[2, 5, 9, 255, 255, 255, 255, 255]);
    assert_eq!(reg.extract_indices(), vec![SENTINEL; 16]);
}

/// Tests that extraction stops after eight indices and resumes on the next request.
#[test]
fn test_extract_eight_at_a_time() {
    let mut bits = vec![1u8; 10];
    let mut slots = [SENTINEL; 8];
    mmr::extract(&mut bits, &mut slots);
    assert_eq!(slots, [0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(&bits[8..], &[1, 1]);

    let mut slots = [SENTINEL; 8];
    mmr::extract(&mut bits, &mut slots);
    assert_eq!(slots, [8, 9, 255, 255, 255, 255, 255, 255]);
}

/// Tests that an index the sentinel would shadow is never reported.
#[test]
fn test_extract_stops_at_sentinel_range() {
    let mut bits = vec![0u8; 300];
    bits[10] = 1;
    bits[260] = 1;
    let mut slots = [SENTINEL; 8];
    mmr::extract(&mut bits, &mut slots);
    assert_eq!(slots[0], 10);
    assert_eq!(&slots[1..], &[SENTINEL; 7]);
    assert_eq!(bits[260], 1);
}

/// Tests the component: both halves, request latency and destructive reads.
#[test]
fn test_mmr_component() {
    let mut reg = Mmr::new("mmr", &engine(4, 1), TraceMask::default());
    let mut out = Outbox::new();
    reg.handle(Port::Data, Event::core(0, 0, 0, vec![1, 0, 1, 1, 0, 0, 0, 1]), 0, &mut out)
        .unwrap();
    reg.handle(Port::Request, Event::core(43, 0, 1, vec![0]), 0, &mut out).unwrap();
    reg.handle(Port::Request, Event::core(43, 0, 1, vec![0]), 0, &mut out).unwrap();

    reg.tick(1, &mut out).unwrap();
    reg.tick(2, &mut out).unwrap();
    let sent = out.take();
    assert_eq!(sent.len(), 2);

    let mut first = vec![0, 2, 3, 255, 255, 255, 255, 255];
    first.extend([3, 255, 255, 255, 255, 255, 255, 255]);
    assert_eq!(sent[0], (Port::Response, Event::core(0, 0, 0, first)));
    assert_eq!(sent[1], (Port::Response, Event::core(0, 0, 0, vec![255; 16])));
}

/// Tests that the match register rejects unrelated ports.
#[test]
fn test_mmr_unexpected_port() {
    let mut reg = Mmr::new("mmr", &engine(4, 1), TraceMask::default());
    let err = reg.handle(Port::Output, Event::core(0, 0, 0, vec![]), 0, &mut Outbox::new());
    assert!(matches!(err, Err(SimError::UnexpectedEvent { port: Port::Output, .. })));
}
