mod common;

use common::{contents, init_tracing};
use quicklist::{
    Compressor, Container, Direction, Encoding, ListOptions, QuickList, QuickListError,
    QuickListResult, Value, Where, DEFAULT_PACKED_THRESHOLD,
};

fn list(fill: i32, depth: u16) -> QuickList {
    init_tracing();
    QuickList::with_options(ListOptions::new(fill, depth)).unwrap()
}

#[test]
fn test_tail_pushes_fill_nodes_before_creating_new_ones() {
    let mut list = list(4, 1);
    for v in ["A", "B", "C", "D", "E"] {
        list.push_tail(v).unwrap();
    }
    assert_eq!(list.node_sizes(), [4, 1]);

    for v in ["F", "G", "H"] {
        list.push_tail(v).unwrap();
    }
    assert_eq!(list.node_sizes(), [4, 4]);
    assert!(list
        .node_summaries()
        .iter()
        .all(|s| s.encoding == Encoding::Raw));
    assert_eq!(
        contents(&list),
        ["A", "B", "C", "D", "E", "F", "G", "H"].map(|s| s.as_bytes().to_vec())
    );
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_deleting_last_node_drops_node_count() {
    let mut list = list(4, 0);
    for i in 0..40 {
        list.push_tail(format!("e{}", i)).unwrap();
    }
    assert_eq!(list.node_count(), 10);

    assert_eq!(list.delete_range(36, 4).unwrap(), 4);
    assert_eq!(list.node_count(), 9);
    assert_eq!(list.len(), 36);
    assert_eq!(list.get(-1).unwrap(), Value::from("e35"));
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_oversized_insert_splits_node_around_plain_node() {
    let mut list = list(-2, 0);
    for v in ["e0", "e1", "e2", "e3"] {
        list.push_tail(v).unwrap();
    }
    assert_eq!(list.node_count(), 1);

    let big = vec![b'X'; DEFAULT_PACKED_THRESHOLD + 1];
    let e2 = list.index(2).unwrap();
    list.insert_before(&e2, &big).unwrap();

    let summaries = list.node_summaries();
    assert_eq!(summaries.len(), 3);
    assert_eq!(
        summaries.iter().map(|s| s.container).collect::<Vec<_>>(),
        [Container::Packed, Container::Plain, Container::Packed]
    );
    assert_eq!(list.node_sizes(), [2, 1, 2]);
    assert_eq!(list.get(0).unwrap(), Value::from("e0"));
    assert_eq!(list.get(2).unwrap(), Value::Bytes(big));
    assert_eq!(list.get(3).unwrap(), Value::from("e2"));
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_element_encoding_past_largest_class_is_plain() {
    init_tracing();
    let mut list = QuickList::new();
    list.push_tail("a").unwrap();
    list.push_tail(vec![b'x'; DEFAULT_PACKED_THRESHOLD]).unwrap();
    list.push_tail(vec![b'y'; DEFAULT_PACKED_THRESHOLD - 4]).unwrap();

    let summaries = list.node_summaries();
    assert_eq!(
        summaries.iter().map(|s| s.container).collect::<Vec<_>>(),
        [Container::Packed, Container::Plain, Container::Packed]
    );
    assert_eq!(summaries[1].byte_size, DEFAULT_PACKED_THRESHOLD);
    assert!(summaries[2].byte_size <= DEFAULT_PACKED_THRESHOLD);
    assert_eq!(list.get(1).unwrap(), Value::Bytes(vec![b'x'; DEFAULT_PACKED_THRESHOLD]));
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_compression_round_trip_preserves_content() {
    let mut list = list(32, 0);
    for i in 0..640 {
        list.push_tail(format!("round-trip-{}", i % 11)).unwrap();
    }
    let before = list.to_vec().unwrap();
    let sizes = list.node_sizes();

    list.set_compress_depth(1).unwrap();
    let compressed = list
        .node_summaries()
        .iter()
        .filter(|s| s.encoding == Encoding::Compressed)
        .count();
    assert_eq!(compressed, list.node_count() - 2);
    assert_eq!(list.to_vec().unwrap(), before);
    assert_eq!(list.node_sizes(), sizes);

    list.set_compress_depth(0).unwrap();
    assert_eq!(list.to_vec().unwrap(), before);
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_depth_window_tracks_both_ends() {
    let mut list = list(8, 2);
    for i in 0..100 {
        list.push_tail(format!("tail-side-{}", i % 3)).unwrap();
        list.push_head(format!("head-side-{}", i % 3)).unwrap();
        list.check_invariants_detailed().unwrap();
    }
    let summaries = list.node_summaries();
    let n = summaries.len();
    for (i, summary) in summaries.iter().enumerate() {
        if i < 2 || i >= n - 2 {
            assert_eq!(summary.encoding, Encoding::Raw, "node {}", i);
        } else {
            assert!(
                summary.encoding == Encoding::Compressed || summary.attempted_compress,
                "node {}",
                i
            );
        }
    }
    assert!(summaries.iter().any(|s| s.encoding == Encoding::Compressed));
}

#[test]
fn test_plain_nodes_are_never_compressed_or_merged() {
    let mut list = list(-1, 1);
    list.set_packed_threshold(32).unwrap();
    for i in 0..12 {
        if i % 3 == 1 {
            list.push_tail(vec![b'P'; 100]).unwrap();
        } else {
            list.push_tail(format!("small-{}", i)).unwrap();
        }
    }
    for summary in list.node_summaries() {
        if summary.container == Container::Plain {
            assert_eq!(summary.encoding, Encoding::Raw);
            assert_eq!(summary.entry_count, 1);
            assert!(!summary.attempted_compress);
        }
    }
    let plain_before = list
        .node_summaries()
        .iter()
        .filter(|s| s.container == Container::Plain)
        .count();
    list.delete_range(2, 1).unwrap();
    let plain_after = list
        .node_summaries()
        .iter()
        .filter(|s| s.container == Container::Plain)
        .count();
    assert_eq!(plain_after, plain_before);
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_failed_merge_leaves_neighbours_untouched() {
    let mut list = list(4, 0);
    for i in 0..12 {
        list.push_tail(format!("m{}", i)).unwrap();
    }
    let before = list.node_summaries();
    // Shrinks the middle node to 3; neither neighbour can take it.
    list.delete_range(5, 1).unwrap();
    let after = list.node_summaries();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert_eq!(after[1].entry_count, 3);
}

#[test]
fn test_stale_entries_are_rejected() {
    let mut list = list(4, 0);
    for v in ["a", "b", "c"] {
        list.push_tail(v).unwrap();
    }
    let entry = list.index(1).unwrap();
    list.push_head("z").unwrap();
    assert_eq!(list.insert_after(&entry, "x"), Err(QuickListError::StaleEntry));
    assert_eq!(list.insert_before(&entry, "x"), Err(QuickListError::StaleEntry));
    assert_eq!(list.len(), 4);

    let fresh = list.index(1).unwrap();
    assert!(fresh.matches("a"));
    list.insert_after(&fresh, "x").unwrap();
    assert_eq!(list.get(2).unwrap(), Value::from("x"));
}

#[test]
fn test_integers_round_trip_by_value() {
    let mut list = list(-2, 0);
    for v in ["12", "-7", "007", "+3", "9223372036854775807", "x1"] {
        list.push_tail(v).unwrap();
    }
    assert_eq!(
        list.to_vec().unwrap(),
        vec![
            Value::Int(12),
            Value::Int(-7),
            Value::from("007"),
            Value::from("+3"),
            Value::Int(i64::MAX),
            Value::from("x1"),
        ]
    );
    assert!(list.index(0).unwrap().matches("12"));
    assert_eq!(contents(&list)[2], b"007".to_vec());
}

#[test]
fn test_pop_and_rotate_through_compressed_list() {
    let mut list = list(8, 1);
    for i in 0..64i64 {
        list.push_tail(i.to_string()).unwrap();
    }
    for _ in 0..10 {
        list.rotate().unwrap();
    }
    assert_eq!(list.get(0).unwrap(), Value::Int(54));
    assert_eq!(list.pop(Where::Tail).unwrap(), Some(Value::Int(53)));
    assert_eq!(list.pop(Where::Head).unwrap(), Some(Value::Int(54)));
    assert_eq!(list.len(), 62);
    list.check_invariants_detailed().unwrap();
}

#[test]
fn test_iterator_from_index_both_directions() {
    let mut list = list(3, 1);
    for i in 0..12i64 {
        list.push_tail(i.to_string()).unwrap();
    }
    let forward: Vec<i64> = list
        .iter_at(Direction::Forward, 7)
        .unwrap()
        .map(|e| e.unwrap().value().as_int().unwrap())
        .collect();
    assert_eq!(forward, [7, 8, 9, 10, 11]);
    let backward: Vec<i64> = list
        .iter_at(Direction::Backward, 2)
        .unwrap()
        .map(|e| e.unwrap().value().as_int().unwrap())
        .collect();
    assert_eq!(backward, [2, 1, 0]);
}

/// Declines everything, so interior nodes end up flagged instead of compressed.
#[derive(Debug, Clone, Copy, Default)]
struct NeverCompress;

impl Compressor for NeverCompress {
    fn compress(&self, _data: &[u8]) -> Option<Vec<u8>> {
        None
    }

    fn decompress(&self, _data: &[u8], _original_size: usize) -> QuickListResult<Vec<u8>> {
        Err(QuickListError::compression("decompress", "nothing was ever compressed"))
    }
}

#[test]
fn test_custom_compressor_that_declines() {
    init_tracing();
    let mut list = QuickList::with_compressor(ListOptions::new(4, 1), NeverCompress).unwrap();
    for i in 0..40 {
        list.push_tail(format!("plainly-{}", i)).unwrap();
    }
    let summaries = list.node_summaries();
    assert!(summaries.iter().all(|s| s.encoding == Encoding::Raw));
    assert!(summaries[1..summaries.len() - 1]
        .iter()
        .all(|s| s.attempted_compress));
    assert_eq!(list.index(17).unwrap().value(), &Value::from("plainly-17"));
    list.check_invariants_detailed().unwrap();
}
