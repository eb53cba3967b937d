//! Seeded random workloads across fill and depth settings.

mod common;

use std::collections::VecDeque;

use common::{assert_matches_model, init_tracing};
use quicklist::{Direction, ListOptions, QuickList};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SEED: u64 = 42;
const STEPS: usize = 600;

fn random_value(rng: &mut StdRng) -> Vec<u8> {
    match rng.gen_range(0..10) {
        0..=5 => format!("v{}", rng.gen_range(0..1_000_000)).into_bytes(),
        6..=8 => rng.gen_range(-100_000i64..100_000).to_string().into_bytes(),
        _ => vec![b'#'; rng.gen_range(65..160)],
    }
}

fn soak(fill: i32, depth: u16) {
    init_tracing();
    let options = ListOptions::builder()
        .fill(fill)
        .compress_depth(depth)
        .packed_threshold(64)
        .build()
        .unwrap();
    let mut list = QuickList::with_options(options).unwrap();
    let mut model: VecDeque<Vec<u8>> = VecDeque::new();
    let mut rng = StdRng::seed_from_u64(SEED ^ (fill as u64) ^ (u64::from(depth) << 8));

    for step in 0..STEPS {
        match rng.gen_range(0..100) {
            0..=29 => {
                let v = random_value(&mut rng);
                if rng.gen_bool(0.5) {
                    list.push_head(&v).unwrap();
                    model.push_front(v);
                } else {
                    list.push_tail(&v).unwrap();
                    model.push_back(v);
                }
            }
            30..=49 => {
                let v = random_value(&mut rng);
                let index = rng.gen_range(0..=model.len());
                list.insert(index, &v).unwrap();
                model.insert(index, v);
            }
            50..=59 if !model.is_empty() => {
                let v = random_value(&mut rng);
                let index = rng.gen_range(0..model.len());
                list.replace_at_index(index as i64, &v).unwrap();
                model[index] = v;
            }
            60..=74 if !model.is_empty() => {
                let start = rng.gen_range(0..model.len());
                let count = rng.gen_range(1..6);
                let end = (start + count).min(model.len());
                assert_eq!(list.delete_range(start as i64, count).unwrap(), end - start);
                model.drain(start..end);
            }
            75..=84 => {
                let popped = if rng.gen_bool(0.5) {
                    let expected = model.pop_front();
                    (list.pop_head().unwrap(), expected)
                } else {
                    let expected = model.pop_back();
                    (list.pop_tail().unwrap(), expected)
                };
                assert_eq!(popped.0.map(|value| value.to_bytes()), popped.1);
            }
            85..=89 => {
                list.rotate().unwrap();
                if let Some(v) = model.pop_back() {
                    model.push_front(v);
                }
            }
            90..=94 if !model.is_empty() => {
                // Drop every element of one randomly chosen length while walking backward.
                let target = model[rng.gen_range(0..model.len())].len();
                let mut iter = list.iter(Direction::Backward);
                while let Some(entry) = iter.next_entry().unwrap() {
                    if entry.value().to_bytes().len() == target {
                        iter.delete_entry(&entry).unwrap();
                    }
                }
                iter.release();
                model.retain(|v| v.len() != target);
            }
            _ => {
                if !model.is_empty() {
                    let index = rng.gen_range(0..model.len());
                    let entry = list.index(index as i64).unwrap();
                    assert!(entry.matches(&model[index]));
                }
            }
        }
        if step % 25 == 0 {
            assert_matches_model(&mut list, &model);
        }
    }
    assert_matches_model(&mut list, &model);
}

macro_rules! fill_matrix {
    ($($name:ident: $fill:expr, $depth:expr;)*) => {
        paste::paste! {
            $(
                #[test]
                fn [<test_soak_ $name>]() {
                    soak($fill, $depth);
                }
            )*
        }
    };
}

fill_matrix! {
    count_1_raw: 1, 0;
    count_1_depth_1: 1, 1;
    count_4_raw: 4, 0;
    count_4_depth_1: 4, 1;
    count_4_depth_3: 4, 3;
    count_32_depth_2: 32, 2;
    size_4k_raw: -1, 0;
    size_4k_depth_1: -1, 1;
    size_8k_depth_2: -2, 2;
    size_64k_depth_1: -5, 1;
}

#[test]
fn test_depth_changes_mid_workload() {
    init_tracing();
    let mut list = QuickList::with_options(ListOptions::new(6, 0)).unwrap();
    let mut model = VecDeque::new();
    let mut rng = StdRng::seed_from_u64(SEED);
    for round in 0..8u16 {
        for _ in 0..60 {
            let v = random_value(&mut rng);
            list.push_tail(&v).unwrap();
            model.push_back(v);
        }
        list.set_compress_depth(round % 4).unwrap();
        assert_matches_model(&mut list, &model);
    }
}
