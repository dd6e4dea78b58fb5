//! A container implementation that stores low values as an explicit sorted list.

use std::{cmp::Ordering, ops::Range};

use crate::container::{
    bitmap::BitmapContainer,
    run::{Run, RunContainer},
};

/// A container that stores its values as a sorted vector of `u16`.
///
/// `ArrayContainer` is the sparse representation: each value costs 2 bytes, so it
/// stays smaller than a [`BitmapContainer`] (fixed 8 KiB) as long as it holds at most
/// [`ArrayContainer::MAX_LEN`] values. [`Container`](crate::container::Container)
/// switches to a bitmap when an insertion would cross that threshold.
///
/// # Invariants
///
/// - **Sorted**: values are in strictly ascending order
/// - **Unique**: no duplicates
/// - **Bounded**: at most [`ArrayContainer::MAX_LEN`] values
///
/// Containers decoded from untrusted bytes may violate these invariants until they
/// are validated; see [`crate::validation`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ArrayContainer {
    values: Vec<u16>,
}

impl ArrayContainer {
    /// Sparse threshold: the largest cardinality kept in array form.
    pub const MAX_LEN: usize = 4096;

    pub(crate) fn new(values: Vec<u16>) -> ArrayContainer {
        let container = ArrayContainer { values };

        #[cfg(debug_assertions)]
        container.check_full_invariants();

        container
    }

    /// Wraps `values` exactly as given, without any checks.
    pub(crate) fn from_raw_values(values: Vec<u16>) -> ArrayContainer {
        ArrayContainer { values }
    }

    pub fn empty() -> ArrayContainer {
        ArrayContainer { values: Vec::new() }
    }

    /// Creates a container from values that are already sorted and unique.
    ///
    /// # Panics
    ///
    /// In debug builds, if `values` is not strictly increasing.
    pub fn from_sorted_slice(values: &[u16]) -> ArrayContainer {
        ArrayContainer::new(values.to_vec())
    }

    #[inline]
    pub fn values(&self) -> &[u16] {
        &self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        self.values.binary_search(&value).is_ok()
    }

    /// Inserts `value` keeping the list sorted. Returns `false` if it was already present.
    ///
    /// The container may grow past [`ArrayContainer::MAX_LEN`] here; callers that care
    /// about the representation convert before inserting.
    pub fn insert(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(_) => false,
            Err(idx) => {
                self.values.insert(idx, value);
                true
            }
        }
    }

    pub fn remove(&mut self, value: u16) -> bool {
        match self.values.binary_search(&value) {
            Ok(idx) => {
                self.values.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Appends a value not less than any present value. Pushing the current
    /// maximum again is a no-op.
    ///
    /// # Panics
    ///
    /// If `value` is less than the current maximum.
    #[inline]
    pub fn push(&mut self, value: u16) {
        match self.values.last() {
            Some(&last) if value <= last => {
                assert_eq!(
                    value, last,
                    "Attempted to push value {value} which is less than last value {last}"
                );
            }
            _ => self.values.push(value),
        }
    }

    /// Index bounds of the values that fall inside `range`.
    fn bounds(&self, range: &Range<u32>) -> (usize, usize) {
        let lo = self.values.partition_point(|&v| (v as u32) < range.start);
        let hi = lo + self.values[lo..].partition_point(|&v| (v as u32) < range.end);
        (lo, hi)
    }

    /// Cardinality the container would have after inserting `range`.
    pub fn len_after_insert_range(&self, range: Range<u32>) -> usize {
        if range.start >= range.end {
            return self.values.len();
        }
        let (lo, hi) = self.bounds(&range);
        self.values.len() - (hi - lo) + (range.end - range.start) as usize
    }

    pub fn insert_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        let (lo, hi) = self.bounds(&range);
        self.values
            .splice(lo..hi, (range.start..range.end).map(|v| v as u16));
    }

    pub fn remove_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        let (lo, hi) = self.bounds(&range);
        self.values.drain(lo..hi);
    }

    pub fn contains_range(&self, range: Range<u32>) -> bool {
        if range.start >= range.end {
            return true;
        }
        let (lo, hi) = self.bounds(&range);
        hi - lo == (range.end - range.start) as usize
    }

    /// Number of values `<= value`.
    #[inline]
    pub fn rank(&self, value: u16) -> usize {
        self.values.partition_point(|&v| v <= value)
    }

    #[inline]
    pub fn select(&self, n: usize) -> Option<u16> {
        self.values.get(n).copied()
    }

    #[inline]
    pub fn min(&self) -> Option<u16> {
        self.values.first().copied()
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.values.last().copied()
    }

    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, u16>> {
        self.values.iter().copied()
    }

    /// Counts maximal sequences of consecutive values.
    #[inline]
    pub fn count_runs(&self) -> usize {
        count_runs(&self.values)
    }

    pub fn to_bitmap(&self) -> BitmapContainer {
        BitmapContainer::from_sorted_values(&self.values)
    }

    pub fn to_run(&self) -> RunContainer {
        RunContainer::from_sorted_values(&self.values)
    }

    /// Sorted-merge union. The result may exceed [`ArrayContainer::MAX_LEN`].
    pub fn union_values(&self, other: &ArrayContainer) -> Vec<u16> {
        let (a, b) = (&self.values, &other.values);
        let mut out = Vec::with_capacity(a.len() + b.len());

        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        out
    }

    /// Sorted-merge symmetric difference. The result may exceed [`ArrayContainer::MAX_LEN`].
    pub fn xor_values(&self, other: &ArrayContainer) -> Vec<u16> {
        let (a, b) = (&self.values, &other.values);
        let mut out = Vec::with_capacity(a.len() + b.len());

        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        out
    }

    pub fn intersect(&self, other: &ArrayContainer) -> ArrayContainer {
        let mut out = self.clone();
        out.intersect_with(other);
        out
    }

    pub fn intersect_with(&mut self, other: &ArrayContainer) {
        if self.values.is_empty() {
            return;
        }
        if other.values.is_empty() {
            self.values.clear();
            return;
        }

        let mut write = 0usize;
        let mut i = 0usize;
        let mut j = 0usize;
        let a_len = self.values.len();
        let b_len = other.values.len();

        while i < a_len && j < b_len {
            match self.values[i].cmp(&other.values[j]) {
                Ordering::Equal => {
                    self.values[write] = self.values[i];
                    write += 1;
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }

        self.values.truncate(write);
    }

    pub fn intersect_len(&self, other: &ArrayContainer) -> usize {
        let (a, b) = (&self.values, &other.values);
        let mut count = 0;
        let mut i = 0;
        let mut j = 0;
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
            }
        }
        count
    }

    pub fn difference(&self, other: &ArrayContainer) -> ArrayContainer {
        let mut out = self.clone();
        out.difference_with(other);
        out
    }

    pub fn difference_with(&mut self, other: &ArrayContainer) {
        if self.values.is_empty() || other.values.is_empty() {
            return;
        }
        let mut j = 0usize;
        let b = &other.values;
        self.values.retain(|&v| {
            while j < b.len() && b[j] < v {
                j += 1;
            }
            !(j < b.len() && b[j] == v)
        });
    }

    /// Keeps only the values for which `keep` returns true.
    #[inline]
    pub fn retain(&mut self, keep: impl FnMut(&u16) -> bool) {
        self.values.retain(keep);
    }

    pub fn filtered(&self, mut keep: impl FnMut(u16) -> bool) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.values.len());
        values.extend(self.values.iter().copied().filter(|&v| keep(v)));
        ArrayContainer::new(values)
    }

    /// Values not covered by `runs`, walking both sorted sequences together.
    pub fn difference_runs(&self, runs: &[Run]) -> ArrayContainer {
        let mut r = 0usize;
        self.filtered(|v| {
            while r < runs.len() && runs[r].end() <= v as u32 {
                r += 1;
            }
            !(r < runs.len() && runs[r].start <= v)
        })
    }

    /// Values covered by `runs`, walking both sorted sequences together.
    pub fn intersect_runs(&self, runs: &[Run]) -> ArrayContainer {
        let mut r = 0usize;
        self.filtered(|v| {
            while r < runs.len() && runs[r].end() <= v as u32 {
                r += 1;
            }
            r < runs.len() && runs[r].start <= v
        })
    }

    #[inline]
    pub fn serialized_size(&self) -> usize {
        Self::serialized_size_for(self.values.len())
    }

    #[inline]
    pub fn serialized_size_for(cardinality: usize) -> usize {
        2 * cardinality
    }

    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
    }

    pub fn check_full_invariants(&self) {
        assert!(self.values.len() <= Self::MAX_LEN);
        assert!(is_strictly_increasing(&self.values));
    }
}

impl std::fmt::Debug for ArrayContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

/// Counts maximal runs of consecutive values in a sorted slice.
#[inline]
pub fn count_runs(values: &[u16]) -> usize {
    if values.is_empty() {
        return 0;
    }
    let mut count = 1;
    for i in 1..values.len() {
        count += (values[i] as u32 != values[i - 1] as u32 + 1) as usize;
    }
    count
}

pub fn is_strictly_increasing<T>(slice: &[T]) -> bool
where
    T: PartialOrd,
{
    const CHUNK_SIZE: usize = 33;
    if slice.len() < CHUNK_SIZE {
        return slice.windows(2).all(|w| w[0] < w[1]);
    }
    let mut i = 0;
    while i < slice.len() - CHUNK_SIZE {
        let chunk = &slice[i..i + CHUNK_SIZE];
        if !chunk.windows(2).fold(true, |acc, w| acc & (w[0] < w[1])) {
            return false;
        }
        i += CHUNK_SIZE - 1;
    }
    slice[i..].windows(2).all(|w| w[0] < w[1])
}
