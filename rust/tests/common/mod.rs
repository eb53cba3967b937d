//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use proptest::prelude::*;
use quicklist::{Direction, QuickList};
use tracing_subscriber::{fmt, EnvFilter};

/// Route list tracing to the test writer; `RUST_LOG=quicklist=trace` shows node churn.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Every element as raw bytes, head to tail.
pub fn contents(list: &QuickList) -> Vec<Vec<u8>> {
    list.to_vec()
        .unwrap()
        .into_iter()
        .map(|value| value.to_bytes())
        .collect()
}

/// Every element as raw bytes, walking from the tail.
pub fn contents_backward(list: &mut QuickList) -> Vec<Vec<u8>> {
    list.iter(Direction::Backward)
        .map(|entry| entry.unwrap().into_value().to_bytes())
        .collect()
}

/// Assert the list matches `model` in both directions and holds its invariants.
pub fn assert_matches_model(list: &mut QuickList, model: &VecDeque<Vec<u8>>) {
    let expected: Vec<Vec<u8>> = model.iter().cloned().collect();
    assert_eq!(list.len(), model.len());
    assert_eq!(contents(list), expected);
    let mut backward = contents_backward(list);
    backward.reverse();
    assert_eq!(backward, expected);
    if let Err(details) = list.check_invariants_detailed() {
        list.print_node_chain();
        panic!("invariants violated: {}", details);
    }
}

/// Element bytes: mostly short strings, some integers, a few oversized blobs.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        6 => prop::string::string_regex("[a-z]{1,12}")
            .expect("Invalid regex")
            .prop_map(String::into_bytes),
        3 => any::<i64>().prop_map(|n| n.to_string().into_bytes()),
        1 => prop::collection::vec(b'a'..=b'z', 65..200),
    ]
}
