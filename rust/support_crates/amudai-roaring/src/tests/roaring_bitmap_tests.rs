use std::collections::BTreeSet;

use crate::{ContainerKind, RoaringBitmap, ValidationCode};

fn random_pair(count: usize, max: u32) -> (RoaringBitmap, BTreeSet<u32>) {
    let oracle = (0..count)
        .map(|_| fastrand::u32(..max))
        .collect::<BTreeSet<_>>();
    let bitmap = oracle.iter().copied().collect::<RoaringBitmap>();
    (bitmap, oracle)
}

/// A bitmap mixing sparse, dense and run-shaped containers.
fn mixed_pair(seed: u64) -> (RoaringBitmap, BTreeSet<u32>) {
    fastrand::seed(seed);
    let (mut bitmap, mut oracle) = random_pair(3000, 1 << 20);
    for _ in 0..5 {
        let start = fastrand::u64(..1 << 22);
        let end = start + fastrand::u64(1..80_000);
        bitmap.insert_range(start..end);
        oracle.extend(start as u32..end as u32);
    }
    for _ in 0..20_000 {
        let v = (3 << 16) | fastrand::u32(..1 << 16);
        bitmap.insert(v);
        oracle.insert(v);
    }
    (bitmap, oracle)
}

fn assert_matches(bitmap: &RoaringBitmap, oracle: &BTreeSet<u32>) {
    assert_eq!(bitmap.len(), oracle.len() as u64);
    assert_eq!(bitmap.is_empty(), oracle.is_empty());
    assert!(bitmap.iter().eq(oracle.iter().copied()));
    assert!(bitmap.iter().rev().eq(oracle.iter().rev().copied()));
    assert_eq!(bitmap.min(), oracle.first().copied());
    assert_eq!(bitmap.max(), oracle.last().copied());
    assert!(bitmap.containers().iter().all(|c| !c.is_empty()));
    assert!(bitmap.keys().windows(2).all(|w| w[0] < w[1]));
    assert!(bitmap.validate().is_valid(), "{}", bitmap.validate());
}

#[test]
fn test_empty_bitmap() {
    let bitmap = RoaringBitmap::new();
    assert!(bitmap.is_empty());
    assert_eq!(bitmap.len(), 0);
    assert_eq!(bitmap.min(), None);
    assert_eq!(bitmap.max(), None);
    assert_eq!(bitmap.select(0), None);
    assert_eq!(bitmap.rank(u32::MAX), 0);
    assert_eq!(bitmap.iter().next(), None);
    assert!(bitmap.validate().is_valid());
}

#[test]
fn test_insert_contains_remove() {
    let mut bitmap = RoaringBitmap::new();
    assert!(bitmap.insert(5));
    assert!(bitmap.insert(1 << 16));
    assert!(bitmap.insert(u32::MAX));
    assert!(!bitmap.insert(5));
    assert_eq!(bitmap.container_count(), 3);
    assert!(bitmap.contains(5));
    assert!(bitmap.contains(u32::MAX));
    assert!(!bitmap.contains(6));

    assert!(bitmap.remove(1 << 16));
    assert!(!bitmap.remove(1 << 16));
    assert_eq!(bitmap.keys(), &[0, 65535]);
    assert!(bitmap.get_container(1).is_none());
    assert_eq!(bitmap.get_container(65535).map(|c| c.cardinality()), Some(1));
}

#[test]
fn test_random_mutations_match_oracle() {
    fastrand::seed(5_551_212);
    let mut bitmap = RoaringBitmap::new();
    let mut oracle = BTreeSet::new();
    for _ in 0..50_000 {
        let v = fastrand::u32(..1 << 19);
        if fastrand::u8(..4) == 0 {
            assert_eq!(bitmap.remove(v), oracle.remove(&v));
        } else {
            assert_eq!(bitmap.insert(v), oracle.insert(v));
        }
    }
    assert_matches(&bitmap, &oracle);

    for _ in 0..1000 {
        let v = fastrand::u32(..1 << 19);
        assert_eq!(bitmap.contains(v), oracle.contains(&v));
        assert_eq!(bitmap.rank(v), oracle.range(..=v).count() as u64);
    }
    for n in [0u64, 1, 100, bitmap.len() - 1, bitmap.len()] {
        assert_eq!(bitmap.select(n), oracle.iter().nth(n as usize).copied());
    }
}

#[test]
fn test_push_and_from_sorted_iter() {
    let values = (0u32..200_000).map(|i| i * 7).collect::<Vec<_>>();
    let bitmap = RoaringBitmap::from_sorted_iter(values.iter().copied());
    assert_eq!(bitmap.len(), values.len() as u64);
    assert!(bitmap.iter().eq(values.iter().copied()));
    assert!(bitmap.validate().is_valid());

    let mut pushed = RoaringBitmap::new();
    pushed.push(3);
    pushed.push(3);
    pushed.push(4);
    pushed.push(1 << 20);
    assert_eq!(pushed.iter().collect::<Vec<_>>(), vec![3, 4, 1 << 20]);
}

#[test]
fn test_insert_range_spanning_keys() {
    let mut bitmap = RoaringBitmap::new();
    bitmap.insert(10);
    let added = bitmap.insert_range(5..(3 << 16) + 5);
    assert_eq!(added, (3 << 16) - 1);
    assert_eq!(bitmap.container_count(), 4);
    assert!(bitmap.get_container(1).is_some_and(|c| c.is_full()));
    assert!(bitmap.get_container(2).is_some_and(|c| c.is_full()));
    assert_eq!(bitmap.get_container(3).map(|c| c.cardinality()), Some(5));
    assert!(bitmap.contains_range(5..(3 << 16) + 5));
    assert!(!bitmap.contains_range(4..(3 << 16) + 5));
    assert!(!bitmap.contains_range(5..(3 << 16) + 6));
    assert!(bitmap.validate().is_valid());
}

#[test]
fn test_empty_and_inverted_ranges_are_noops() {
    let mut bitmap = RoaringBitmap::from_range(100..200);
    let before = bitmap.clone();
    assert_eq!(bitmap.insert_range(50..50), 0);
    #[allow(clippy::reversed_empty_ranges)]
    let inverted = 300..250;
    assert_eq!(bitmap.insert_range(inverted.clone()), 0);
    assert_eq!(bitmap.remove_range(inverted), 0);
    assert_eq!(bitmap, before);
    assert!(bitmap.contains_range(7..7));
}

#[test]
fn test_full_domain_range() {
    let mut bitmap = RoaringBitmap::from_range(0..1 << 32);
    assert_eq!(bitmap.len(), 1 << 32);
    assert_eq!(bitmap.container_count(), 65536);
    assert!(bitmap.containers().iter().all(|c| c.is_full()));
    assert!(bitmap.contains(u32::MAX));
    assert_eq!(bitmap.select((1 << 32) - 1), Some(u32::MAX));

    assert_eq!(bitmap.remove_range(1..1 << 32), (1 << 32) - 1);
    assert_eq!(bitmap.iter().collect::<Vec<_>>(), vec![0]);
}

#[test]
#[should_panic]
fn test_insert_range_past_domain_panics() {
    RoaringBitmap::new().insert_range(0..(1 << 32) + 1);
}

#[test]
fn test_random_ranges_match_oracle() {
    fastrand::seed(8_675_309);
    let mut bitmap = RoaringBitmap::new();
    let mut oracle = BTreeSet::new();
    for _ in 0..200 {
        let start = fastrand::u64(..1 << 20);
        let end = start + fastrand::u64(..100_000);
        if fastrand::bool() {
            let added = bitmap.insert_range(start..end);
            let before = oracle.len();
            oracle.extend(start as u32..end as u32);
            assert_eq!(added, (oracle.len() - before) as u64);
        } else {
            let removed = bitmap.remove_range(start..end);
            let doomed = oracle
                .range(start as u32..end as u32)
                .copied()
                .collect::<Vec<_>>();
            for v in &doomed {
                oracle.remove(v);
            }
            assert_eq!(removed, doomed.len() as u64);
        }
    }
    assert_matches(&bitmap, &oracle);
}

#[test]
fn test_algebra_matches_oracle() {
    let (a, oa) = mixed_pair(17);
    let (b, ob) = mixed_pair(29);

    let and = oa.intersection(&ob).copied().collect::<BTreeSet<_>>();
    let or = oa.union(&ob).copied().collect::<BTreeSet<_>>();
    let xor = oa.symmetric_difference(&ob).copied().collect::<BTreeSet<_>>();
    let and_not = oa.difference(&ob).copied().collect::<BTreeSet<_>>();

    assert_matches(&a.and(&b), &and);
    assert_matches(&a.or(&b), &or);
    assert_matches(&a.xor(&b), &xor);
    assert_matches(&a.and_not(&b), &and_not);

    assert_eq!(a.and_cardinality(&b), and.len() as u64);
    assert_eq!(a.or_cardinality(&b), or.len() as u64);
    assert_eq!(a.xor_cardinality(&b), xor.len() as u64);
    assert_eq!(a.and_not_cardinality(&b), and_not.len() as u64);

    let mut c = a.clone();
    c.and_inplace(&b);
    assert_matches(&c, &and);
    let mut c = a.clone();
    c.or_inplace(&b);
    assert_matches(&c, &or);
    let mut c = a.clone();
    c.xor_inplace(&b);
    assert_matches(&c, &xor);
    let mut c = a.clone();
    c.and_not_inplace(&b);
    assert_matches(&c, &and_not);

    assert_eq!(&a & &b, a.and(&b));
    assert_eq!(&a | &b, a.or(&b));
    assert_eq!(&a ^ &b, a.xor(&b));
    assert_eq!(&a - &b, a.and_not(&b));
    let mut c = a.clone();
    c |= &b;
    c &= &a;
    assert_eq!(c, a);
    c ^= &a;
    assert!(c.is_empty());
    c -= &b;
    assert!(c.is_empty());
}

#[test]
fn test_operations_drop_emptied_containers() {
    let a = RoaringBitmap::from_iter([1, 2, 1 << 16, 5 << 16]);
    let b = RoaringBitmap::from_iter([1, 2, 5 << 16, 9 << 16]);
    let xor = a.xor(&b);
    assert_eq!(xor.keys(), &[1, 9]);
    let and_not = a.and_not(&b);
    assert_eq!(and_not.keys(), &[1]);
    let and = a.and(&b);
    assert_eq!(and.keys(), &[0, 5]);

    let mut c = a.clone();
    c.xor_inplace(&a);
    assert!(c.is_empty());
    assert_eq!(c.container_count(), 0);
}

#[test]
fn test_intersects_and_subset() {
    let a = RoaringBitmap::from_iter([1, 100_000, 200_000]);
    let b = RoaringBitmap::from_range(50_000..150_000);
    let c = RoaringBitmap::from_range(300_000..400_000);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(!RoaringBitmap::new().intersects(&a));

    assert!(RoaringBitmap::from_iter([60_000, 140_000]).is_subset(&b));
    assert!(!a.is_subset(&b));
    assert!(RoaringBitmap::new().is_subset(&a));
    assert!(a.is_subset(&a));
}

#[test]
fn test_algebra_laws() {
    let (a, _) = mixed_pair(3);
    let (b, _) = mixed_pair(4);
    let (c, _) = mixed_pair(5);
    assert_eq!(a.or(&b), b.or(&a));
    assert_eq!(a.and(&b).and(&c), a.and(&b.and(&c)));
    assert!(!a.and_not(&b).intersects(&b));
    assert!(a.xor(&a).is_empty());
    assert_eq!(a.or(&a), a);
    assert_eq!(a.and(&b).len() + a.and_not(&b).len(), a.len());
}

#[test]
fn test_run_optimize_is_idempotent_and_never_grows() {
    let (mut bitmap, oracle) = mixed_pair(99);
    bitmap.remove_run_compression();
    assert!(!bitmap.has_run_containers());
    let size = bitmap.serialized_size();

    assert!(bitmap.run_optimize());
    let once = bitmap.clone();
    let kinds = bitmap.containers().iter().map(|c| c.kind()).collect::<Vec<_>>();
    assert!(kinds.contains(&ContainerKind::Run));
    assert!(bitmap.serialized_size() <= size);

    bitmap.run_optimize();
    assert_eq!(bitmap, once);
    assert_eq!(
        bitmap.containers().iter().map(|c| c.kind()).collect::<Vec<_>>(),
        kinds
    );
    assert_matches(&bitmap, &oracle);

    assert!(bitmap.remove_run_compression());
    assert!(!bitmap.has_run_containers());
    assert_matches(&bitmap, &oracle);
}

#[test]
fn test_iter_with_rank() {
    let bitmap = RoaringBitmap::from_iter([3, 70_000, 70_001]);
    let mut iter = bitmap.iter_with_rank();
    assert_eq!(iter.rank(), 0);
    assert_eq!(iter.next(), Some((1, 3)));
    assert_eq!(iter.next(), Some((2, 70_000)));
    assert_eq!(iter.rank(), 2);
    assert_eq!(iter.next(), Some((3, 70_001)));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_iter_from_both_ends() {
    let bitmap = RoaringBitmap::from_iter([1, 2, 1 << 16, (1 << 16) + 1, 7 << 16]);
    let mut iter = bitmap.iter();
    assert_eq!(iter.next(), Some(1));
    assert_eq!(iter.next_back(), Some(7 << 16));
    assert_eq!(iter.next_back(), Some((1 << 16) + 1));
    assert_eq!(iter.next(), Some(2));
    assert_eq!(iter.next(), Some(1 << 16));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);

    let mut collected = Vec::new();
    for v in &bitmap {
        collected.push(v);
    }
    assert_eq!(collected.len(), 5);
}

#[test]
fn test_equality_ignores_encoding() {
    let mut a = RoaringBitmap::from_range(0..10_000);
    let b = a.clone();
    a.remove_run_compression();
    assert_ne!(
        a.containers()[0].kind(),
        b.containers()[0].kind()
    );
    assert_eq!(a, b);
}

#[test]
fn test_clear_and_shrink() {
    let (mut bitmap, _) = mixed_pair(1);
    bitmap.shrink_to_fit();
    assert!(bitmap.validate().is_valid());
    bitmap.clear();
    assert!(bitmap.is_empty());
    assert_eq!(bitmap.validate().code(), ValidationCode::Ok);
}

#[test]
fn test_debug_format() {
    let small = RoaringBitmap::from_iter([1, 2, 3]);
    assert_eq!(format!("{small:?}"), "{1, 2, 3}");
    let large = RoaringBitmap::from_range(0..100);
    assert_eq!(
        format!("{large:?}"),
        "RoaringBitmap<100 values between Some(0) and Some(99) in 1 containers>"
    );
}

#[test]
fn test_insert_range_around_existing_keys() {
    let values = [1, 1 << 16, 2 << 16, 5 << 16];
    let mut bitmap = RoaringBitmap::from_iter(values);
    let mut oracle = values.into_iter().collect::<BTreeSet<u32>>();

    assert_eq!(bitmap.insert_range(10..20), 10);
    oracle.extend(10..20);
    assert_eq!(bitmap.keys(), [0, 1, 2, 5]);
    assert_eq!(bitmap.containers().len(), 4);
    assert!(bitmap.contains(2 << 16));
    assert!(bitmap.contains(5 << 16));
    assert_matches(&bitmap, &oracle);

    // Covers existing keys 1 and 2, creates keys 3 and 4, stops before key 5.
    let (start, end) = ((1u64 << 16) + 5, (4u64 << 16) + 7);
    let added = bitmap.insert_range(start..end);
    let before = oracle.len();
    oracle.extend(start as u32..end as u32);
    assert_eq!(added, (oracle.len() - before) as u64);
    assert_eq!(bitmap.keys(), [0, 1, 2, 3, 4, 5]);
    assert_matches(&bitmap, &oracle);

    // Entirely inside a single existing key.
    assert_eq!(bitmap.insert_range(3..7), 4);
    oracle.extend(3..7);
    assert_matches(&bitmap, &oracle);
}

#[test]
fn test_run_optimize_keeps_header_cost_in_mind() {
    // Converting key 0 to a run saves two bytes of payload but switches the
    // header to the run format, which costs more for a hundred containers.
    let mut bitmap = RoaringBitmap::from_iter(0..4);
    bitmap.extend((1..100).map(|key| key << 16));
    let size = bitmap.serialized_size();
    assert_eq!(size, 1014);

    assert!(!bitmap.run_optimize());
    assert_eq!(bitmap.serialized_size(), size);
    assert!(
        bitmap
            .containers()
            .iter()
            .all(|c| c.kind() == ContainerKind::Array)
    );
    assert!(!bitmap.run_optimize());
    assert_eq!(bitmap.serialized_size(), size);

    // A dense key collapsing into one run pays for the header many times over.
    let mut bitmap = RoaringBitmap::from_iter(0..5000);
    bitmap.extend((1..100).map(|key| key << 16));
    assert_eq!(bitmap.containers()[0].kind(), ContainerKind::Bitmap);
    let size = bitmap.serialized_size();

    assert!(bitmap.run_optimize());
    assert_eq!(bitmap.containers()[0].kind(), ContainerKind::Run);
    let optimized = bitmap.serialized_size();
    assert!(optimized < size);
    assert_eq!(optimized, bitmap.serialize_to_vec().len());
    assert!(bitmap.run_optimize());
    assert_eq!(bitmap.serialized_size(), optimized);
}

#[test]
#[should_panic(expected = "below the current maximum")]
fn test_push_below_last_key_panics() {
    let mut bitmap = RoaringBitmap::new();
    bitmap.push(3 << 16);
    bitmap.push(5);
}

#[test]
#[should_panic(expected = "less than last value")]
fn test_push_below_maximum_within_key_panics() {
    let mut bitmap = RoaringBitmap::from_sorted_iter([10, 20]);
    bitmap.push(15);
}
