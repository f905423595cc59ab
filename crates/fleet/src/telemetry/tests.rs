use super::*;

fn record(elapsed: Tick, config_ratio: f64) -> DepositRecord {
    DepositRecord { elapsed, amount: 100, config_ratio }
}

#[test]
fn test_history_is_capped() {
    let mut store = TelemetryStore::new();
    let node = NodeId(7);

    for i in 0..DEPOSIT_HISTORY_LENGTH {
        assert!(store.record(node, record(10 + i as Tick, 1.0)).is_none());
    }
    assert_eq!(store.len(node), DEPOSIT_HISTORY_LENGTH);

    for i in 0..20 {
        assert!(store.record(node, record(100 + i, 1.0)).is_some());
        assert!(store.len(node) <= DEPOSIT_HISTORY_LENGTH);
    }
}

#[test]
fn test_eviction_by_insertion_order() {
    let mut store = TelemetryStore::new();
    let node = NodeId(1);

    // Values deliberately out of order: eviction must not depend on them.
    for elapsed in [30, 5, 50, 1, 20] {
        store.record(node, record(elapsed, 1.0));
    }

    let evicted = store.record(node, record(7, 1.0));
    assert_eq!(evicted.map(|r| r.elapsed), Some(30));

    let evicted = store.record(node, record(8, 1.0));
    assert_eq!(evicted.map(|r| r.elapsed), Some(5));

    let newest_first: Vec<Tick> = store.history(node).map(|r| r.elapsed).collect();
    assert_eq!(newest_first, vec![8, 7, 20, 1, 50]);
}

#[test]
fn test_average_deposit_time() {
    let mut store = TelemetryStore::new();
    let node = NodeId(3);

    assert_eq!(store.average_deposit_time(node), None);
    assert!(store.is_empty(node));

    store.record(node, record(10, 1.0));
    store.record(node, record(20, 1.0));
    store.record(node, record(30, 1.0));
    assert_eq!(store.average_deposit_time(node), Some(20.0));

    // Other nodes are unaffected.
    assert_eq!(store.average_deposit_time(NodeId(4)), None);
}

#[test]
fn test_samples_and_retain() {
    let mut store = TelemetryStore::new();

    store.record(NodeId(1), record(10, 1.0));
    store.record(NodeId(1), record(5, 2.0));
    store.record(NodeId(2), record(40, 0.5));

    let samples = store.samples(NodeId(1));
    assert_eq!(samples.as_slice(), &[(5.0, 2.0), (10.0, 1.0)]);

    store.retain_nodes(|node| node != NodeId(1));
    assert_eq!(store.node_count(), 1);
    assert!(store.samples(NodeId(1)).is_empty());
    assert_eq!(store.len(NodeId(2)), 1);
}

#[test]
fn test_serde_round_trip_keeps_eviction_order() {
    let mut store = TelemetryStore::new();
    let node = NodeId(9);
    for elapsed in 1..=5 {
        store.record(node, record(elapsed, 1.0));
    }

    let json = serde_json::to_string(&store).unwrap();
    let mut loaded: TelemetryStore = serde_json::from_str(&json).unwrap();

    let evicted = loaded.record(node, record(6, 1.0));
    assert_eq!(evicted.map(|r| r.elapsed), Some(1));
}
