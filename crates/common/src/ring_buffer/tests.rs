use super::*;

#[test]
fn test_push_until_full() {
    let mut buffer = RingBuffer::<u32, 3>::new();
    assert!(buffer.is_empty());

    assert_eq!(buffer.push(1), None);
    assert_eq!(buffer.push(2), None);
    assert_eq!(buffer.push(3), None);

    assert!(buffer.is_full());
    assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    assert_eq!(buffer.newest(), Some(&3));
    assert_eq!(buffer.oldest(), Some(&1));
}

#[test]
fn test_evicts_by_insertion_order() {
    let mut buffer = RingBuffer::<u32, 3>::new();

    // Values deliberately out of order: eviction must not depend on them.
    for value in [50, 10, 40] {
        buffer.push(value);
    }

    assert_eq!(buffer.push(20), Some(50));
    assert_eq!(buffer.push(30), Some(10));

    assert_eq!(buffer.len(), 3);
    assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![30, 20, 40]);
    assert_eq!(buffer.iter_oldest_first().copied().collect::<Vec<_>>(), vec![40, 20, 30]);
}

#[test]
fn test_serde_keeps_order() {
    let mut buffer = RingBuffer::<u32, 3>::new();
    for value in 1..=5 {
        buffer.push(value);
    }

    let json = serde_json::to_string(&buffer).unwrap();
    assert_eq!(json, "[3,4,5]");

    let mut loaded: RingBuffer<u32, 3> = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded.iter().copied().collect::<Vec<_>>(), vec![5, 4, 3]);

    // Loaded buffer keeps evicting the oldest.
    assert_eq!(loaded.push(6), Some(3));
    assert_eq!(loaded.iter().copied().collect::<Vec<_>>(), vec![6, 5, 4]);
}

#[test]
fn test_rejects_oversized_sequence() {
    let result = serde_json::from_str::<RingBuffer<u32, 2>>("[1,2,3]");
    assert!(result.is_err());
}
