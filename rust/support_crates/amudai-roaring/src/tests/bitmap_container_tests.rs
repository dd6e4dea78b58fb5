use crate::container::{Container, bitmap::BitmapContainer, run::Run};

fn bitmap_of(values: &[u16]) -> BitmapContainer {
    BitmapContainer::from_sorted_values(values)
}

#[test]
fn test_insert_remove_track_cardinality() {
    let mut bitmap = BitmapContainer::empty();
    assert!(bitmap.insert(0));
    assert!(bitmap.insert(65535));
    assert!(!bitmap.insert(0));
    assert_eq!(bitmap.cardinality(), 2);
    assert!(bitmap.remove(0));
    assert!(!bitmap.remove(0));
    assert_eq!(bitmap.cardinality(), 1);
    assert_eq!(bitmap.count_ones(), 1);
}

#[test]
fn test_full_and_empty() {
    let full = BitmapContainer::full();
    assert!(full.is_full());
    assert_eq!(full.cardinality(), Container::SPAN as usize);
    assert_eq!(full.count_runs(), 1);
    assert_eq!(full.min(), Some(0));
    assert_eq!(full.max(), Some(65535));

    let empty = BitmapContainer::empty();
    assert!(empty.is_empty());
    assert_eq!(empty.min(), None);
    assert_eq!(empty.max(), None);
    assert_eq!(empty.iter().next(), None);
}

#[test]
fn test_range_operations_across_words() {
    let mut bitmap = BitmapContainer::empty();
    bitmap.insert_range(60..200);
    assert_eq!(bitmap.cardinality(), 140);
    assert!(bitmap.contains_range(60..200));
    assert!(!bitmap.contains_range(59..200));
    assert_eq!(bitmap.range_cardinality(0..64), 4);
    assert_eq!(bitmap.range_cardinality(128..256), 72);

    bitmap.remove_range(64..128);
    assert_eq!(bitmap.cardinality(), 76);
    assert!(!bitmap.contains(64));
    assert!(bitmap.contains(63));
    assert!(bitmap.contains(128));

    bitmap.flip_range(0..70);
    assert_eq!(bitmap.range_cardinality(0..64), 60);
    assert_eq!(bitmap.range_cardinality(64..70), 6);
    assert_eq!(bitmap.cardinality(), bitmap.count_ones());
}

#[test]
fn test_insert_full_domain_is_word_fill() {
    let mut bitmap = bitmap_of(&[1, 2, 3]);
    bitmap.insert_range(0..Container::SPAN);
    assert!(bitmap.is_full());
    assert!(bitmap.words().iter().all(|&w| w == u64::MAX));
}

#[test]
#[should_panic]
fn test_range_beyond_domain_panics() {
    BitmapContainer::empty().insert_range(0..Container::SPAN + 1);
}

#[test]
fn test_rank_and_select() {
    let bitmap = bitmap_of(&[0, 63, 64, 1000, 65535]);
    assert_eq!(bitmap.rank(0), 1);
    assert_eq!(bitmap.rank(62), 1);
    assert_eq!(bitmap.rank(63), 2);
    assert_eq!(bitmap.rank(64), 3);
    assert_eq!(bitmap.rank(65535), 5);
    assert_eq!(bitmap.select(0), Some(0));
    assert_eq!(bitmap.select(2), Some(64));
    assert_eq!(bitmap.select(4), Some(65535));
    assert_eq!(bitmap.select(5), None);
}

#[test]
fn test_iter_both_directions() {
    let values = [1u16, 2, 64, 127, 128, 40000, 65535];
    let bitmap = bitmap_of(&values);
    assert_eq!(bitmap.iter().collect::<Vec<_>>(), values);
    assert_eq!(
        bitmap.iter().rev().collect::<Vec<_>>(),
        values.iter().rev().copied().collect::<Vec<_>>()
    );
    assert_eq!(bitmap.iter().len(), values.len());
}

#[test]
fn test_iter_meeting_in_the_middle() {
    let bitmap = bitmap_of(&[3, 5, 9]);
    let mut iter = bitmap.iter();
    assert_eq!(iter.next(), Some(3));
    assert_eq!(iter.next_back(), Some(9));
    assert_eq!(iter.next(), Some(5));
    assert_eq!(iter.next_back(), None);
    assert_eq!(iter.next(), None);
}

#[test]
fn test_ranges_and_count_runs() {
    let mut bitmap = BitmapContainer::empty();
    bitmap.insert_range(5..10);
    bitmap.insert_range(63..130);
    bitmap.insert_range(65500..65536);
    assert_eq!(
        bitmap.ranges().collect::<Vec<_>>(),
        vec![5..10, 63..130, 65500..65536]
    );
    assert_eq!(bitmap.count_runs(), 3);
    assert!(bitmap.count_runs_exceeds(2));
    assert!(!bitmap.count_runs_exceeds(3));
    assert_eq!(bitmap.to_run().count_runs(), 3);
}

#[test]
fn test_alternating_bits_count_runs() {
    let values = (0u16..=65534).step_by(2).collect::<Vec<_>>();
    let bitmap = bitmap_of(&values);
    assert_eq!(bitmap.count_runs(), 32768);
    assert!(bitmap.count_runs_exceeds(2047));
}

#[test]
fn test_word_operations() {
    let a = bitmap_of(&[1, 2, 3, 100]);
    let b = bitmap_of(&[2, 3, 4, 200]);
    assert_eq!(a.union(&b).iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 100, 200]);
    assert_eq!(a.intersect(&b).iter().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(a.difference(&b).iter().collect::<Vec<_>>(), vec![1, 100]);
    assert_eq!(
        a.symmetric_difference(&b).iter().collect::<Vec<_>>(),
        vec![1, 4, 100, 200]
    );
    assert_eq!(a.intersect_len(&b), 2);

    let mut c = a.clone();
    c.union_with(&b);
    assert_eq!(c.cardinality(), 6);
    c.difference_with(&a);
    assert_eq!(c.iter().collect::<Vec<_>>(), vec![4, 200]);
}

#[test]
fn test_retain_runs() {
    let mut bitmap = BitmapContainer::full();
    bitmap.retain_runs(&[Run::new(10, 9), Run::new(65535, 0)]);
    assert_eq!(bitmap.cardinality(), 11);
    assert_eq!(bitmap.min(), Some(10));
    assert_eq!(bitmap.max(), Some(65535));
    assert!(!bitmap.contains(20));
}

#[test]
fn test_from_runs_and_to_array() {
    let bitmap = BitmapContainer::from_runs(&[Run::new(0, 2), Run::new(70, 1)]);
    assert_eq!(bitmap.to_array().values(), &[0, 1, 2, 70, 71]);
}
