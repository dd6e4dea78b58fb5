use crate::container::{
    Container, ContainerKind, array::ArrayContainer, bitmap::BitmapContainer, run::RunContainer,
};

fn random_values(count: usize) -> Vec<u16> {
    let mut values = (0..count).map(|_| fastrand::u16(..)).collect::<Vec<_>>();
    values.sort_unstable();
    values.dedup();
    values
}

/// The same value set in all three encodings.
fn all_encodings(values: &[u16]) -> [Container; 3] {
    [
        Container::Array(ArrayContainer::from_raw_values(values.to_vec())),
        Container::Bitmap(BitmapContainer::from_sorted_values(values)),
        Container::Run(RunContainer::from_sorted_values(values)),
    ]
}

#[test]
fn test_infer_by_size() {
    use ContainerKind::*;

    assert_eq!(ContainerKind::infer_by_size(0, 0, Bitmap), Array);
    assert_eq!(ContainerKind::infer_by_size(100, 1, Array), Run);
    assert_eq!(ContainerKind::infer_by_size(100, 100, Array), Array);
    assert_eq!(ContainerKind::infer_by_size(5000, 3000, Array), Bitmap);
    assert_eq!(ContainerKind::infer_by_size(65536, 1, Bitmap), Run);
}

#[test]
fn test_infer_by_size_keeps_current_on_ties() {
    use ContainerKind::*;

    // array 8192 == bitmap 8192
    assert_eq!(ContainerKind::infer_by_size(4096, 4096, Bitmap), Bitmap);
    assert_eq!(ContainerKind::infer_by_size(4096, 4096, Run), Array);
    // array 6 == run 6
    assert_eq!(ContainerKind::infer_by_size(3, 1, Run), Run);
    assert_eq!(ContainerKind::infer_by_size(3, 1, Array), Array);
    assert_eq!(ContainerKind::infer_by_size(3, 1, Bitmap), Array);
}

#[test]
fn test_insert_converts_to_bitmap_past_threshold() {
    let mut container = Container::empty();
    for v in (0..ArrayContainer::MAX_LEN as u16).map(|i| i * 2) {
        assert!(container.insert(v));
    }
    assert_eq!(container.kind(), ContainerKind::Array);
    assert_eq!(container.cardinality(), ArrayContainer::MAX_LEN);

    assert!(!container.insert(0));
    assert_eq!(container.kind(), ContainerKind::Array);

    assert!(container.insert(1));
    assert_eq!(container.kind(), ContainerKind::Bitmap);
    assert_eq!(container.cardinality(), ArrayContainer::MAX_LEN + 1);

    assert!(container.remove(1));
    assert_eq!(container.kind(), ContainerKind::Array);
    assert_eq!(container.cardinality(), ArrayContainer::MAX_LEN);
}

#[test]
fn test_insert_full_range_from_every_encoding() {
    for mut container in all_encodings(&[1, 2, 3, 1000]) {
        let kind = container.kind();
        container.insert_range(0..Container::SPAN);
        assert_eq!(container.cardinality(), 65536, "from {kind:?}");
        assert!(container.is_full());
        assert!(container.contains(0) && container.contains(65535));
    }

    let mut empty = Container::empty();
    empty.insert_range(0..Container::SPAN);
    assert_eq!(empty.cardinality(), 65536);
    assert_eq!(empty.kind(), ContainerKind::Run);
}

#[test]
fn test_insert_range_switches_array_to_bitmap() {
    let mut container = Container::empty();
    container.insert(10);
    container.insert(5000);
    container.insert_range(0..5000);
    assert_eq!(container.kind(), ContainerKind::Bitmap);
    assert_eq!(container.cardinality(), 5001);

    container.remove_range(100..5000);
    assert_eq!(container.kind(), ContainerKind::Array);
    assert_eq!(container.cardinality(), 101);
}

#[test]
#[should_panic]
fn test_insert_range_past_domain_panics() {
    Container::empty().insert_range(10..Container::SPAN + 1);
}

#[test]
fn test_from_range_picks_cheapest() {
    assert_eq!(Container::from_range(0..0).kind(), ContainerKind::Array);
    assert_eq!(Container::from_range(0..10).kind(), ContainerKind::Run);
    assert_eq!(Container::from_range(7..8).kind(), ContainerKind::Array);
    assert!(Container::from_range(0..Container::SPAN).is_full());
}

#[test]
fn test_representation_equivalence() {
    fastrand::seed(7_340_155);
    for count in [1usize, 10, 500, 4000, 9000, 30000] {
        let values = random_values(count);
        let encodings = all_encodings(&values);
        let queries = (0..200).map(|_| fastrand::u16(..)).collect::<Vec<_>>();

        for container in &encodings {
            assert_eq!(container.cardinality(), values.len());
            assert_eq!(container.iter().collect::<Vec<_>>(), values);
            assert_eq!(
                container.iter().rev().collect::<Vec<_>>(),
                values.iter().rev().copied().collect::<Vec<_>>()
            );
            assert_eq!(container.min(), values.first().copied());
            assert_eq!(container.max(), values.last().copied());
            assert_eq!(container.count_runs(), encodings[0].count_runs());
            for &p in &queries {
                assert_eq!(container.contains(p), values.binary_search(&p).is_ok());
                assert_eq!(container.rank(p), values.partition_point(|&v| v <= p));
            }
            for n in [0, values.len() / 2, values.len() - 1, values.len()] {
                assert_eq!(container.select(n), values.get(n).copied());
            }
        }

        for a in &encodings {
            for b in &encodings {
                assert_eq!(a, b);
            }
            assert_eq!(a.to_array().values(), &values[..]);
            assert_eq!(a.to_bitmap().iter().collect::<Vec<_>>(), values);
            assert_eq!(a.to_run().cardinality(), values.len());
        }
    }
}

#[test]
fn test_iter_with_rank() {
    let container = Container::Run(RunContainer::from_sorted_values(&[4, 5, 6, 10]));
    assert_eq!(
        container.iter_with_rank().collect::<Vec<_>>(),
        vec![(1, 4), (2, 5), (3, 6), (4, 10)]
    );
}

#[test]
fn test_optimize_prefers_smallest() {
    let mut sparse_bitmap = Container::Bitmap(BitmapContainer::from_sorted_values(&[1, 100, 1000]));
    assert_eq!(sparse_bitmap.optimize(), ContainerKind::Array);

    let mut long_run = Container::Array(ArrayContainer::from_sorted_slice(
        &(100u16..1100).collect::<Vec<_>>(),
    ));
    assert_eq!(long_run.optimize(), ContainerKind::Run);
    assert_eq!(long_run.cardinality(), 1000);

    let mut full = Container::Bitmap(BitmapContainer::full());
    assert_eq!(full.optimize(), ContainerKind::Run);
    assert!(full.is_full());
}

#[test]
fn test_run_optimize_is_idempotent_and_never_grows() {
    fastrand::seed(90_210);
    let mut containers = Vec::new();
    for count in [3usize, 200, 4096, 20000] {
        containers.extend(all_encodings(&random_values(count)));
    }
    containers.extend(all_encodings(&(0u16..3000).collect::<Vec<_>>()));
    containers.extend(all_encodings(&(0u16..=65534).step_by(2).collect::<Vec<_>>()));

    for mut container in containers {
        let before_size = container.serialized_size_in_bytes();
        let values = container.iter().collect::<Vec<_>>();
        container.run_optimize();
        let once = container.clone();
        assert!(!container.run_optimize());
        assert_eq!(container.kind(), once.kind());
        assert!(container.serialized_size_in_bytes() <= before_size);
        assert_eq!(container.iter().collect::<Vec<_>>(), values);
    }
}

#[test]
fn test_run_optimize_requires_strict_gain() {
    // Three consecutive values: array and run both take 6 bytes.
    let mut container = Container::Array(ArrayContainer::from_sorted_slice(&[7, 8, 9]));
    assert!(!container.run_optimize());
    assert_eq!(container.kind(), ContainerKind::Array);

    let mut container = Container::Array(ArrayContainer::from_sorted_slice(&[7, 8, 9, 10]));
    assert!(container.run_optimize());
    assert_eq!(container.kind(), ContainerKind::Run);
}

#[test]
fn test_remove_run_compression() {
    let mut small = Container::Run(RunContainer::from_range(0..100));
    assert!(small.remove_run_compression());
    assert_eq!(small.kind(), ContainerKind::Array);

    let mut large = Container::Run(RunContainer::from_range(0..10000));
    assert!(large.remove_run_compression());
    assert_eq!(large.kind(), ContainerKind::Bitmap);
    assert_eq!(large.cardinality(), 10000);

    assert!(!small.remove_run_compression());
}

#[test]
fn test_push_appends() {
    let mut container = Container::empty();
    for v in 0..5000u16 {
        container.push(v * 3);
    }
    assert_eq!(container.kind(), ContainerKind::Bitmap);
    assert_eq!(container.cardinality(), 5000);
    assert_eq!(container.max(), Some(4999 * 3));
}

#[test]
fn test_push_of_current_maximum_is_noop_for_every_encoding() {
    let values = (0..5000u16).map(|v| v * 3).collect::<Vec<_>>();
    for container in [
        Container::Array(ArrayContainer::from_sorted_slice(&values[..100])),
        Container::Bitmap(BitmapContainer::from_sorted_values(&values)),
        Container::Run(RunContainer::from_sorted_values(&values[..100])),
    ] {
        let mut pushed = container.clone();
        let max = container.max().unwrap();
        pushed.push(max);
        assert_eq!(pushed, container);
        pushed.push(max + 1);
        assert_eq!(pushed.cardinality(), container.cardinality() + 1);
    }
}

#[test]
#[should_panic(expected = "less than last value")]
fn test_push_below_maximum_panics_for_arrays() {
    Container::Array(ArrayContainer::from_sorted_slice(&[5, 9])).push(7);
}

#[test]
#[should_panic(expected = "less than last value")]
fn test_push_below_maximum_panics_for_bitmaps() {
    let values = (0..5000u16).collect::<Vec<_>>();
    Container::Bitmap(BitmapContainer::from_sorted_values(&values)).push(7);
}

#[test]
#[should_panic(expected = "less than last value")]
fn test_push_below_maximum_panics_for_runs() {
    Container::Run(RunContainer::from_sorted_values(&[5, 6, 9])).push(7);
}
