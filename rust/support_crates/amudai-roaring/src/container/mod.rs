//! Containers hold the low 16 bits of all values sharing one high 16-bit key.
//! - Three encodings: Array (sorted u16 list), Bitmap (65,536 bits), Run (intervals).
//! - All encodings answer the same queries; binary operations dispatch on the pair
//!   of encodings (see [`algebra`]).
//! - Results of the algebra are re-encoded by cardinality, and by run count when
//!   a run container is involved; `run_optimize` converts to runs only when that
//!   is strictly smaller.
//! - Inputs and outputs are low values (`u16`); ranges are end-exclusive `u32`
//!   ranges inside `0..65536`.

use std::borrow::Cow;
use std::ops::Range;

use crate::container::{
    array::ArrayContainer,
    bitmap::{BitmapContainer, BitmapIter},
    run::{RunContainer, RunValuesIter},
};

pub mod algebra;
pub mod array;
pub mod bitmap;
pub mod run;

/// The per-key set of low values, stored in one of three encodings.
///
/// Overview
/// - Array: sparse sorted list, at most [`ArrayContainer::MAX_LEN`] values
/// - Bitmap: dense bitset with cached cardinality, fixed 8 KiB
/// - Run: sorted, merged list of intervals
///
/// Construction and evolution
/// - Mutations keep the Array/Bitmap choice in line with the sparse threshold.
/// - [`Container::optimize`] re-encodes using the size model of
///   [`ContainerKind::infer_by_size`]; [`Container::run_optimize`] is the idempotent
///   pass that only ever switches to a strictly smaller encoding.
#[derive(Clone)]
pub enum Container {
    Array(ArrayContainer),
    Bitmap(BitmapContainer),
    Run(RunContainer),
}

/// Identifies the encoding used by a [`Container`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Array,
    Bitmap,
    Run,
}

impl ContainerKind {
    /// Picks the encoding with the smallest serialized size for a container
    /// holding `cardinality` values forming `run_count` runs.
    ///
    /// Sizes: array `2 * cardinality`, bitmap `8192`, run `2 + 4 * run_count`.
    /// The current encoding is kept when it is among the minima; otherwise ties
    /// prefer Array, then Run, then Bitmap. An empty container is always an Array.
    pub fn infer_by_size(
        cardinality: usize,
        run_count: usize,
        current: ContainerKind,
    ) -> ContainerKind {
        if cardinality == 0 {
            return ContainerKind::Array;
        }

        let array_size = if cardinality <= ArrayContainer::MAX_LEN {
            ArrayContainer::serialized_size_for(cardinality)
        } else {
            usize::MAX
        };
        let bitmap_size = BitmapContainer::SERIALIZED_SIZE;
        let run_size = RunContainer::serialized_size_for(run_count);

        let min_size = array_size.min(bitmap_size).min(run_size);

        match current {
            ContainerKind::Array if array_size == min_size => return ContainerKind::Array,
            ContainerKind::Run if run_size == min_size => return ContainerKind::Run,
            ContainerKind::Bitmap if bitmap_size == min_size => return ContainerKind::Bitmap,
            _ => {}
        }

        if array_size == min_size {
            ContainerKind::Array
        } else if run_size == min_size {
            ContainerKind::Run
        } else {
            ContainerKind::Bitmap
        }
    }
}

impl Container {
    /// Number of distinct low values a container can hold.
    pub const SPAN: u32 = 1 << 16;

    pub fn empty() -> Container {
        Container::Array(ArrayContainer::empty())
    }

    /// A container holding all 65,536 values, as a single run.
    pub fn full() -> Container {
        Container::Run(RunContainer::full())
    }

    /// Creates a container holding `range`, in the cheapest encoding.
    pub fn from_range(range: Range<u32>) -> Container {
        if range.start >= range.end {
            return Container::empty();
        }
        Container::from_run(RunContainer::from_range(range))
    }

    /// Wraps sorted, unique values, switching to a bitmap above the sparse threshold.
    pub fn from_sorted_values(values: Vec<u16>) -> Container {
        if values.len() > ArrayContainer::MAX_LEN {
            Container::Bitmap(BitmapContainer::from_sorted_values(&values))
        } else {
            Container::Array(ArrayContainer::new(values))
        }
    }

    /// Wraps an array result; arrays are never over the threshold here.
    #[inline]
    pub(crate) fn from_array(array: ArrayContainer) -> Container {
        debug_assert!(array.len() <= ArrayContainer::MAX_LEN);
        Container::Array(array)
    }

    /// Wraps a bitmap result, demoting it to an array at or below the threshold.
    pub(crate) fn from_bitmap(bitmap: BitmapContainer) -> Container {
        if bitmap.cardinality() <= ArrayContainer::MAX_LEN {
            Container::Array(bitmap.to_array())
        } else {
            Container::Bitmap(bitmap)
        }
    }

    /// Wraps a run result in whichever encoding is smallest.
    pub(crate) fn from_run(run: RunContainer) -> Container {
        let mut container = Container::Run(run);
        container.optimize();
        container
    }

    #[inline]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Container::Array(_) => ContainerKind::Array,
            Container::Bitmap(_) => ContainerKind::Bitmap,
            Container::Run(_) => ContainerKind::Run,
        }
    }

    pub fn cardinality(&self) -> usize {
        match self {
            Container::Array(c) => c.len(),
            Container::Bitmap(c) => c.cardinality(),
            Container::Run(c) => c.cardinality(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Container::Array(c) => c.is_empty(),
            Container::Bitmap(c) => c.is_empty(),
            Container::Run(c) => c.is_empty(),
        }
    }

    pub fn is_full(&self) -> bool {
        match self {
            Container::Array(_) => false,
            Container::Bitmap(c) => c.is_full(),
            Container::Run(c) => c.is_full(),
        }
    }

    pub fn count_runs(&self) -> usize {
        match self {
            Container::Array(c) => c.count_runs(),
            Container::Bitmap(c) => c.count_runs(),
            Container::Run(c) => c.count_runs(),
        }
    }

    pub fn contains(&self, value: u16) -> bool {
        match self {
            Container::Array(c) => c.contains(value),
            Container::Bitmap(c) => c.contains(value),
            Container::Run(c) => c.contains(value),
        }
    }

    pub fn contains_range(&self, range: Range<u32>) -> bool {
        match self {
            Container::Array(c) => c.contains_range(range),
            Container::Bitmap(c) => c.contains_range(range),
            Container::Run(c) => c.contains_range(range),
        }
    }

    /// Adds `value`. Returns `false` if it was already present.
    pub fn insert(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => {
                if array.len() < ArrayContainer::MAX_LEN {
                    return array.insert(value);
                }
                if array.contains(value) {
                    return false;
                }
                let mut bitmap = array.to_bitmap();
                bitmap.insert(value);
                *self = Container::Bitmap(bitmap);
                true
            }
            Container::Bitmap(bitmap) => bitmap.insert(value),
            Container::Run(run) => run.insert(value),
        }
    }

    /// Removes `value`. Returns `false` if it was absent.
    pub fn remove(&mut self, value: u16) -> bool {
        match self {
            Container::Array(array) => array.remove(value),
            Container::Bitmap(bitmap) => {
                let removed = bitmap.remove(value);
                if removed && bitmap.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(bitmap.to_array());
                }
                removed
            }
            Container::Run(run) => run.remove(value),
        }
    }

    /// Appends a value not less than every present value. Pushing the current
    /// maximum again is a no-op.
    ///
    /// # Panics
    ///
    /// If `value` is less than the current maximum, whatever the encoding.
    pub fn push(&mut self, value: u16) {
        match self {
            Container::Array(array) if array.len() < ArrayContainer::MAX_LEN => array.push(value),
            Container::Run(run) => run.push(value),
            _ => {
                if let Some(max) = self.max() {
                    assert!(
                        value >= max,
                        "Attempted to push value {value} which is less than last value {max}"
                    );
                }
                self.insert(value);
            }
        }
    }

    /// Adds every value of `range` (end-exclusive, `range.end <= 65536`).
    ///
    /// A range covering the whole domain yields a full container without
    /// touching individual values: a word fill for bitmaps, a single run otherwise.
    pub fn insert_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        assert!(
            range.end <= Container::SPAN,
            "Range {range:?} exceeds the container domain"
        );
        if range.start == 0 && range.end == Container::SPAN {
            match self {
                Container::Bitmap(bitmap) => bitmap.insert_range(range),
                _ => *self = Container::full(),
            }
            return;
        }

        match self {
            Container::Array(array) => {
                if array.len_after_insert_range(range.clone()) <= ArrayContainer::MAX_LEN {
                    array.insert_range(range);
                } else {
                    let mut bitmap = array.to_bitmap();
                    bitmap.insert_range(range);
                    *self = Container::Bitmap(bitmap);
                }
            }
            Container::Bitmap(bitmap) => bitmap.insert_range(range),
            Container::Run(run) => run.insert_range(range),
        }
    }

    /// Removes every value of `range` (end-exclusive, `range.end <= 65536`).
    pub fn remove_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        assert!(
            range.end <= Container::SPAN,
            "Range {range:?} exceeds the container domain"
        );
        match self {
            Container::Array(array) => array.remove_range(range),
            Container::Bitmap(bitmap) => {
                bitmap.remove_range(range);
                if bitmap.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(bitmap.to_array());
                }
            }
            Container::Run(run) => run.remove_range(range),
        }
    }

    /// Number of values `<= value`.
    pub fn rank(&self, value: u16) -> usize {
        match self {
            Container::Array(c) => c.rank(value),
            Container::Bitmap(c) => c.rank(value),
            Container::Run(c) => c.rank(value),
        }
    }

    /// The `n`-th smallest value (0-based), if any.
    pub fn select(&self, n: usize) -> Option<u16> {
        match self {
            Container::Array(c) => c.select(n),
            Container::Bitmap(c) => c.select(n),
            Container::Run(c) => c.select(n),
        }
    }

    pub fn min(&self) -> Option<u16> {
        match self {
            Container::Array(c) => c.min(),
            Container::Bitmap(c) => c.min(),
            Container::Run(c) => c.min(),
        }
    }

    pub fn max(&self) -> Option<u16> {
        match self {
            Container::Array(c) => c.max(),
            Container::Bitmap(c) => c.max(),
            Container::Run(c) => c.max(),
        }
    }

    /// Iterates values in ascending order; `.rev()` walks them descending.
    pub fn iter(&self) -> Iter<'_> {
        match self {
            Container::Array(c) => Iter::Array(c.iter()),
            Container::Bitmap(c) => Iter::Bitmap(c.iter()),
            Container::Run(c) => Iter::Run(c.iter()),
        }
    }

    /// Iterates `(rank, value)` pairs in ascending order, where `rank` is the number
    /// of values `<= value`.
    pub fn iter_with_rank(&self) -> impl Iterator<Item = (usize, u16)> + '_ {
        self.iter().enumerate().map(|(i, value)| (i + 1, value))
    }

    /// Returns this container as an array, borrowing when it already is one.
    ///
    /// The result may exceed [`ArrayContainer::MAX_LEN`] values.
    pub fn to_array(&self) -> Cow<'_, ArrayContainer> {
        match self {
            Container::Array(c) => Cow::Borrowed(c),
            Container::Bitmap(c) => Cow::Owned(c.to_array()),
            Container::Run(c) => Cow::Owned(c.to_array()),
        }
    }

    /// Returns this container as a bitmap, borrowing when it already is one.
    pub fn to_bitmap(&self) -> Cow<'_, BitmapContainer> {
        match self {
            Container::Array(c) => Cow::Owned(c.to_bitmap()),
            Container::Bitmap(c) => Cow::Borrowed(c),
            Container::Run(c) => Cow::Owned(c.to_bitmap()),
        }
    }

    /// Returns this container as a run container, borrowing when it already is one.
    pub fn to_run(&self) -> Cow<'_, RunContainer> {
        match self {
            Container::Array(c) => Cow::Owned(c.to_run()),
            Container::Bitmap(c) => Cow::Owned(c.to_run()),
            Container::Run(c) => Cow::Borrowed(c),
        }
    }

    /// Re-encodes this container in place into the smallest encoding for its
    /// current contents, as decided by [`ContainerKind::infer_by_size`].
    ///
    /// Returns the resulting kind. Contents never change.
    pub fn optimize(&mut self) -> ContainerKind {
        let optimal_kind = self.infer_optimal_kind();
        self.convert_to(optimal_kind);
        optimal_kind
    }

    /// Re-encodes this container as `target`. Contents never change.
    ///
    /// # Panics
    ///
    /// In debug builds, when converting more than [`ArrayContainer::MAX_LEN`] values
    /// to an array.
    pub fn convert_to(&mut self, target: ContainerKind) {
        let kind = self.kind();
        if target == kind {
            return;
        }
        debug_assert!(
            target != ContainerKind::Array
                || self.cardinality() <= ArrayContainer::MAX_LEN
        );
        log::trace!("container re-encoded {kind:?} -> {target:?}");

        let new_self = match (&*self, target) {
            (Container::Bitmap(bitmap), ContainerKind::Array) => {
                Container::Array(bitmap.to_array())
            }
            (Container::Run(run), ContainerKind::Array) => Container::Array(run.to_array()),
            (Container::Array(array), ContainerKind::Bitmap) => {
                Container::Bitmap(array.to_bitmap())
            }
            (Container::Run(run), ContainerKind::Bitmap) => Container::Bitmap(run.to_bitmap()),
            (Container::Array(array), ContainerKind::Run) => Container::Run(array.to_run()),
            (Container::Bitmap(bitmap), ContainerKind::Run) => Container::Run(bitmap.to_run()),
            _ => panic!("Container kind switch {kind:?} -> {target:?} unexpected"),
        };
        *self = new_self;
    }

    /// Predicts the kind [`Container::optimize`] would choose.
    pub fn infer_optimal_kind(&self) -> ContainerKind {
        let kind = self.kind();
        let cardinality = self.cardinality();
        if let Container::Bitmap(bitmap) = self {
            // A bitmap only loses to runs below this many runs.
            let limit = (BitmapContainer::SERIALIZED_SIZE - 2) / 4;
            if cardinality > ArrayContainer::MAX_LEN && bitmap.count_runs_exceeds(limit) {
                return ContainerKind::Bitmap;
            }
        }
        ContainerKind::infer_by_size(cardinality, self.count_runs(), kind)
    }

    /// Converts to run encoding when that is strictly smaller, and converts run
    /// containers that are not the smallest encoding back to array or bitmap.
    ///
    /// Returns `true` if the encoding changed. Applying it twice is the same as once.
    pub fn run_optimize(&mut self) -> bool {
        let before = self.kind();
        self.optimize() != before
    }

    /// Drops run encoding in favor of array or bitmap, by cardinality.
    pub fn remove_run_compression(&mut self) -> bool {
        let Container::Run(run) = self else {
            return false;
        };
        *self = if run.cardinality() <= ArrayContainer::MAX_LEN {
            Container::Array(run.to_array())
        } else {
            Container::Bitmap(run.to_bitmap())
        };
        true
    }

    /// Size of this container's payload in the portable serialization format.
    pub fn serialized_size_in_bytes(&self) -> usize {
        match self {
            Container::Array(c) => c.serialized_size(),
            Container::Bitmap(c) => c.serialized_size(),
            Container::Run(c) => c.serialized_size(),
        }
    }

    pub fn shrink_to_fit(&mut self) {
        match self {
            Container::Array(c) => c.shrink_to_fit(),
            Container::Bitmap(_) => (),
            Container::Run(c) => c.shrink_to_fit(),
        }
    }

    /// Value equality, regardless of encoding.
    pub fn is_equal_to(&self, other: &Container) -> bool {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => a == b,
            (Container::Run(a), Container::Run(b)) => a == b,
            (Container::Bitmap(a), Container::Bitmap(b)) => a.words() == b.words(),
            (a, b) => a.cardinality() == b.cardinality() && a.iter().eq(b.iter()),
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::empty()
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to(other)
    }
}

impl Eq for Container {}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Container::Array(c) => f.debug_tuple("Array").field(c).finish(),
            Container::Bitmap(c) => f.debug_tuple("Bitmap").field(c).finish(),
            Container::Run(c) => f.debug_tuple("Run").field(c).finish(),
        }
    }
}

/// Iterator over the values of a [`Container`], ascending from the front and
/// descending from the back.
#[derive(Clone)]
pub enum Iter<'a> {
    Array(std::iter::Copied<std::slice::Iter<'a, u16>>),
    Bitmap(BitmapIter<'a>),
    Run(RunValuesIter<'a>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(it) => it.next(),
            Iter::Bitmap(it) => it.next(),
            Iter::Run(it) => it.next(),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Iter::Array(it) => it.size_hint(),
            Iter::Bitmap(it) => it.size_hint(),
            Iter::Run(it) => it.size_hint(),
        }
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            Iter::Array(it) => it.next_back(),
            Iter::Bitmap(it) => it.next_back(),
            Iter::Run(it) => it.next_back(),
        }
    }
}
