//! Reduction and broadcast router tests.

use acam_sim::common::event::OP_COPY;
use acam_sim::common::{Event, SimError};
use acam_sim::noc::router::group_by_tag;
use acam_sim::noc::Router;
use acam_sim::sim::logging::TraceMask;
use acam_sim::soc::{Component, Outbox, Port};
use acam_sim::stats::SimStats;

fn result(tag: u32, value: f32) -> Event {
    Event::network(OP_COPY, 0, 0, 0, tag, value.to_le_bytes().to_vec())
}

fn value(event: &Event) -> f32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&event.payload()[..4]);
    f32::from_le_bytes(word)
}

/// Tests that results sharing a tag collapse into one group in arrival order.
#[test]
fn test_group_by_tag() {
    let groups = group_by_tag(vec![result(7, 1.0), result(3, 4.0), result(7, 2.0)]).unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].imm, 7);
    assert_eq!(groups[0].payload.len(), 8);
    assert_eq!(groups[0].sum(), 3.0);
    assert_eq!(groups[1].imm, 3);
    assert_eq!(groups[1].sum(), 4.0);
}

/// Tests that only the first word of a longer payload is aggregated.
#[test]
fn test_group_uses_first_word() {
    let mut payload = 1.5f32.to_le_bytes().to_vec();
    payload.extend(100.0f32.to_le_bytes());
    let event = Event::network(OP_COPY, 0, 0, 0, 1, payload);
    let groups = group_by_tag(vec![event, result(1, 0.5)]).unwrap();
    assert_eq!(groups[0].sum(), 2.0);
}

/// Tests that a result shorter than one float is rejected.
#[test]
fn test_group_rejects_short_payload() {
    let event = Event::network(OP_COPY, 0, 0, 0, 1, vec![1, 2]);
    assert!(matches!(
        group_by_tag(vec![event]),
        Err(SimError::MalformedPayload { len: 2, .. })
    ));
}

/// Tests the reduction of three children into one upward result.
#[test]
fn test_reduce_children() {
    let mut router = Router::new("r", 4, 1, TraceMask::default());
    let mut out = Outbox::new();
    for (child, v) in [1.0f32, 2.0, 3.0].into_iter().enumerate() {
        router.handle(Port::FromDown(child), result(7, v), 0, &mut out).unwrap();
    }
    assert!(!router.is_quiescent());

    router.tick(1, &mut out).unwrap();
    let sent = out.take();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, Port::ToUp);
    assert_eq!(sent[0].1.imm(), 7);
    assert_eq!(value(&sent[0].1), 6.0);
    assert!(router.is_quiescent());

    let mut stats = SimStats::new();
    router.finish(2, &mut stats);
    assert_eq!(stats.get("r", "active_fpu"), Some(3.0));
}

/// Tests that distinct tags produce one result each.
#[test]
fn test_reduce_two_tags() {
    let mut router = Router::new("r", 2, 1, TraceMask::default());
    let mut out = Outbox::new();
    router.handle(Port::FromDown(0), result(1, 0.5), 0, &mut out).unwrap();
    router.handle(Port::FromDown(1), result(2, 0.25), 0, &mut out).unwrap();

    router.tick(1, &mut out).unwrap();
    let sent = out.take();
    let tags: Vec<u32> = sent.iter().map(|(_, e)| e.imm()).collect();
    assert_eq!(tags, vec![1, 2]);
    assert_eq!(value(&sent[0].1), 0.5);
    assert_eq!(value(&sent[1].1), 0.25);
}

/// Tests that a slow aggregation holds back the next upward scan.
#[test]
fn test_reduce_waits_for_pending_results() {
    let mut router = Router::new("r", 1, 3, TraceMask::default());
    let mut out = Outbox::new();
    router.handle(Port::FromDown(0), result(1, 1.0), 0, &mut out).unwrap();
    router.handle(Port::FromDown(0), result(1, 2.0), 0, &mut out).unwrap();
    router.handle(Port::FromDown(0), result(1, 4.0), 0, &mut out).unwrap();

    let mut sums = Vec::new();
    for cycle in 1..12 {
        router.tick(cycle, &mut out).unwrap();
        for (_, event) in out.take() {
            sums.push((cycle, value(&event)));
        }
    }
    // Two results per child and scan; the third waits for the first sum.
    assert_eq!(sums, vec![(3, 3.0), (6, 4.0)]);
}

/// Tests that a vector from the parent reaches every child after the latency.
#[test]
fn test_broadcast_down() {
    let mut router = Router::new("r", 3, 2, TraceMask::default());
    let mut out = Outbox::new();
    let query = Event::network(OP_COPY, 0, 0, 0, 0, vec![1, 2, 3]);
    router.handle(Port::FromUp, query.clone(), 0, &mut out).unwrap();

    router.tick(1, &mut out).unwrap();
    assert!(out.is_empty());
    router.tick(2, &mut out).unwrap();
    let sent = out.take();
    assert_eq!(
        sent,
        vec![
            (Port::ToDown(0), query.clone()),
            (Port::ToDown(1), query.clone()),
            (Port::ToDown(2), query),
        ]
    );

    let mut stats = SimStats::new();
    router.finish(3, &mut stats);
    assert_eq!(stats.get("r", "active_mux"), Some(3.0));
}

/// Tests the advertised ports and rejection of a child that does not exist.
#[test]
fn test_router_ports() {
    let mut router = Router::new("r", 2, 1, TraceMask::default());
    let ports = router.ports();
    assert!(ports.contains(&Port::FromDown(1)));
    assert!(ports.contains(&Port::ToDown(1)));
    assert!(!ports.contains(&Port::FromDown(2)));

    let err = router.handle(Port::FromDown(2), result(0, 1.0), 0, &mut Outbox::new());
    assert!(matches!(err, Err(SimError::UnexpectedEvent { port: Port::FromDown(2), .. })));
}
