//! The roaring bitmap: a sorted set of `u32` values split by their high 16 bits.
//!
//! # Representation
//!
//! A [`RoaringBitmap`] keeps two parallel vectors: the distinct high 16-bit keys in
//! strictly increasing order, and for every key the [`Container`] holding the low
//! 16 bits of the values sharing it. A key is present only while its container is
//! non-empty; looking up an absent key never materializes a container.
//!
//! # Key properties
//!
//! - Point operations binary-search the key vector, then delegate to the container.
//! - Whole-bitmap operations zip both key vectors: matching keys go through the
//!   container algebra, keys present on one side only are copied (OR, XOR, and the
//!   left side of AND NOT) or dropped (AND, the right side of AND NOT).
//! - Ranges are end-exclusive `Range<u64>` over `0..=2^32`; empty or inverted ranges
//!   are no-ops.
//!
//! # Typical usage
//!
//! ```
//! use amudai_roaring::RoaringBitmap;
//!
//! let mut a: RoaringBitmap = (0..10).collect();
//! let b = RoaringBitmap::from_range(5..1_000_000);
//! a.and_inplace(&b);
//! assert_eq!(a.iter().collect::<Vec<_>>(), vec![5, 6, 7, 8, 9]);
//! ```

use std::{cmp::Ordering, ops::Range};

use crate::{
    container::{self, Container, ContainerKind},
    validation::{self, ContainerView, IndexView, ValidationResult},
};

#[derive(Clone, Default)]
pub struct RoaringBitmap {
    keys: Vec<u16>,
    containers: Vec<Container>,
}

#[inline]
fn split(value: u32) -> (u16, u16) {
    ((value >> 16) as u16, value as u16)
}

#[inline]
fn join(key: u16, low: u16) -> u32 {
    ((key as u32) << 16) | low as u32
}

/// Largest exclusive end accepted by the range operations.
const DOMAIN_END: u64 = 1 << 32;

/// Splits `range` into per-key low ranges, in ascending key order.
fn key_ranges(range: Range<u64>) -> impl Iterator<Item = (u16, Range<u32>)> {
    let first_key = (range.start >> 16) as u32;
    let last_key = ((range.end - 1) >> 16) as u32;
    (first_key..=last_key).map(move |key| {
        let base = (key as u64) << 16;
        let lo = range.start.max(base) - base;
        let hi = range.end.min(base + Container::SPAN as u64) - base;
        (key as u16, lo as u32..hi as u32)
    })
}

impl RoaringBitmap {
    pub fn new() -> RoaringBitmap {
        RoaringBitmap::default()
    }

    /// Creates an empty bitmap with room for `capacity` containers.
    pub fn with_capacity(capacity: usize) -> RoaringBitmap {
        RoaringBitmap {
            keys: Vec::with_capacity(capacity),
            containers: Vec::with_capacity(capacity),
        }
    }

    pub fn from_range(range: Range<u64>) -> RoaringBitmap {
        let mut bitmap = RoaringBitmap::new();
        bitmap.insert_range(range);
        bitmap
    }

    /// Builds a bitmap from values in ascending order, using the append path.
    ///
    /// # Panics
    ///
    /// If the values are not sorted.
    pub fn from_sorted_iter(values: impl IntoIterator<Item = u32>) -> RoaringBitmap {
        let mut bitmap = RoaringBitmap::new();
        for value in values {
            bitmap.push(value);
        }
        bitmap
    }

    /// Assembles a bitmap from parts that are taken as-is. Used by deserialization;
    /// the result may violate any invariant until [`RoaringBitmap::validate`] says
    /// otherwise.
    pub(crate) fn from_parts_unchecked(
        keys: Vec<u16>,
        containers: Vec<Container>,
    ) -> RoaringBitmap {
        RoaringBitmap { keys, containers }
    }

    #[inline]
    pub fn keys(&self) -> &[u16] {
        &self.keys
    }

    #[inline]
    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    #[inline]
    pub fn container_count(&self) -> usize {
        self.keys.len()
    }

    /// The container stored under `key`, if any.
    pub fn get_container(&self, key: u16) -> Option<&Container> {
        self.keys
            .binary_search(&key)
            .ok()
            .map(|i| &self.containers[i])
    }

    /// Number of values in the bitmap.
    pub fn len(&self) -> u64 {
        self.containers.iter().map(|c| c.cardinality() as u64).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.keys.binary_search(&key) {
            Ok(i) => self.containers[i].contains(low),
            Err(_) => false,
        }
    }

    /// Whether every value of `range` is present. An empty range is always contained.
    pub fn contains_range(&self, range: Range<u64>) -> bool {
        if range.start >= range.end {
            return true;
        }
        if range.end > DOMAIN_END {
            return false;
        }
        key_ranges(range).all(|(key, low)| match self.get_container(key) {
            Some(container) => container.contains_range(low),
            None => false,
        })
    }

    pub fn min(&self) -> Option<u32> {
        let key = *self.keys.first()?;
        self.containers[0].min().map(|low| join(key, low))
    }

    pub fn max(&self) -> Option<u32> {
        let key = *self.keys.last()?;
        self.containers[self.containers.len() - 1]
            .max()
            .map(|low| join(key, low))
    }

    /// Adds `value`. Returns `false` if it was already present.
    pub fn insert(&mut self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.keys.last() {
            Some(&last) if last < key => {
                self.push_container(key, low);
                return true;
            }
            None => {
                self.push_container(key, low);
                return true;
            }
            _ => {}
        }
        match self.keys.binary_search(&key) {
            Ok(i) => self.containers[i].insert(low),
            Err(i) => {
                let mut container = Container::empty();
                container.insert(low);
                self.keys.insert(i, key);
                self.containers.insert(i, container);
                true
            }
        }
    }

    fn push_container(&mut self, key: u16, low: u16) {
        let mut container = Container::empty();
        container.insert(low);
        self.keys.push(key);
        self.containers.push(container);
    }

    /// Appends a value that is greater than or equal to the current maximum.
    ///
    /// This is the O(1) fast path used when building a bitmap from sorted input.
    ///
    /// # Panics
    ///
    /// If `value` is less than the current maximum.
    pub fn push(&mut self, value: u32) {
        let (key, low) = split(value);
        match self.keys.last() {
            Some(&last) if last == key => {
                if let Some(container) = self.containers.last_mut() {
                    if container.max() != Some(low) {
                        container.push(low);
                    }
                }
            }
            Some(&last) => {
                assert!(last < key, "push of {value} below the current maximum");
                self.push_container(key, low);
            }
            None => self.push_container(key, low),
        }
    }

    /// Removes `value`. Returns `false` if it was absent.
    pub fn remove(&mut self, value: u32) -> bool {
        let (key, low) = split(value);
        match self.keys.binary_search(&key) {
            Ok(i) => {
                let removed = self.containers[i].remove(low);
                if self.containers[i].is_empty() {
                    self.keys.remove(i);
                    self.containers.remove(i);
                }
                removed
            }
            Err(_) => false,
        }
    }

    /// Adds all values of `range` and returns how many were not already present.
    ///
    /// Keys wholly covered by the range receive a full container directly.
    ///
    /// # Panics
    ///
    /// If `range.end > 2^32`.
    pub fn insert_range(&mut self, range: Range<u64>) -> u64 {
        if range.start >= range.end {
            return 0;
        }
        assert!(
            range.end <= DOMAIN_END,
            "Range {range:?} exceeds the u32 domain"
        );
        let (lo, hi) = self.key_bounds(&range);

        let span = ((range.end - 1) >> 16) as usize - (range.start >> 16) as usize + 1;
        let mut keys = Vec::with_capacity(span);
        let mut containers = Vec::with_capacity(span);
        let mut inserted = 0u64;
        {
            let mut existing = self.keys[lo..hi]
                .iter()
                .copied()
                .zip(self.containers.drain(lo..hi))
                .peekable();
            for (key, low) in key_ranges(range) {
                let container = match existing.next_if(|(k, _)| *k == key) {
                    Some((_, mut container)) => {
                        let before = container.cardinality();
                        container.insert_range(low);
                        inserted += (container.cardinality() - before) as u64;
                        container
                    }
                    None => {
                        let container = Container::from_range(low);
                        inserted += container.cardinality() as u64;
                        container
                    }
                };
                keys.push(key);
                containers.push(container);
            }
        }
        self.keys.splice(lo..hi, keys);
        self.containers.splice(lo..lo, containers);
        inserted
    }

    /// Removes all values of `range` and returns how many were present.
    pub fn remove_range(&mut self, range: Range<u64>) -> u64 {
        let end = range.end.min(DOMAIN_END);
        if range.start >= end {
            return 0;
        }
        let range = range.start..end;
        let (lo, hi) = self.key_bounds(&range);

        let mut removed = 0u64;
        let mut write = lo;
        for read in lo..hi {
            let base = (self.keys[read] as u64) << 16;
            let low_start = range.start.max(base) - base;
            let low_end = range.end.min(base + Container::SPAN as u64) - base;

            let container = &mut self.containers[read];
            let before = container.cardinality();
            container.remove_range(low_start as u32..low_end as u32);
            removed += (before - container.cardinality()) as u64;
            if !container.is_empty() {
                self.keys.swap(write, read);
                self.containers.swap(write, read);
                write += 1;
            }
        }
        self.keys.drain(write..hi);
        self.containers.drain(write..hi);
        removed
    }

    /// Index range of the keys touched by the non-empty `range`.
    fn key_bounds(&self, range: &Range<u64>) -> (usize, usize) {
        let first_key = (range.start >> 16) as u16;
        let last_key = ((range.end - 1) >> 16) as u16;
        let lo = self.keys.partition_point(|&k| k < first_key);
        let hi = lo + self.keys[lo..].partition_point(|&k| k <= last_key);
        (lo, hi)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.containers.clear();
    }

    /// Number of values `<= value`.
    pub fn rank(&self, value: u32) -> u64 {
        let (key, low) = split(value);
        let mut rank = 0u64;
        for (&k, container) in self.keys.iter().zip(&self.containers) {
            match k.cmp(&key) {
                Ordering::Less => rank += container.cardinality() as u64,
                Ordering::Equal => return rank + container.rank(low) as u64,
                Ordering::Greater => break,
            }
        }
        rank
    }

    /// The `n`-th smallest value (0-based), if the bitmap holds more than `n` values.
    pub fn select(&self, n: u64) -> Option<u32> {
        let mut n = n;
        for (&key, container) in self.keys.iter().zip(&self.containers) {
            let cardinality = container.cardinality() as u64;
            if n < cardinality {
                return container.select(n as usize).map(|low| join(key, low));
            }
            n -= cardinality;
        }
        None
    }

    /// Iterates values in ascending order; `.rev()` walks them descending.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.keys.iter().zip(self.containers.iter()),
            front: None,
            back: None,
        }
    }

    /// Iterates `(rank, value)` pairs in ascending order, where `rank` is the number
    /// of values `<= value`.
    pub fn iter_with_rank(&self) -> RankIter<'_> {
        RankIter {
            iter: self.iter(),
            rank: 0,
        }
    }

    /// Re-encodes every container in its smallest encoding, runs included.
    ///
    /// The run layout also decides the header format, so when the per-container
    /// choices would grow the serialized bitmap as a whole, conversions to and
    /// from run encoding are skipped and only array/bitmap conversions apply.
    /// The serialized size never increases.
    ///
    /// Returns `true` if the bitmap holds at least one run container afterwards.
    pub fn run_optimize(&mut self) -> bool {
        let mut plan = self
            .containers
            .iter()
            .map(Container::infer_optimal_kind)
            .collect::<Vec<_>>();
        if self.serialized_size_as(&plan) > self.serialized_size() {
            for (kind, container) in plan.iter_mut().zip(&self.containers) {
                let current = container.kind();
                if *kind == ContainerKind::Run || current == ContainerKind::Run {
                    *kind = current;
                }
            }
        }

        let mut converted = 0usize;
        for (container, kind) in self.containers.iter_mut().zip(plan) {
            if container.kind() != kind {
                container.convert_to(kind);
                converted += 1;
            }
        }
        if converted != 0 {
            log::debug!(
                "run_optimize re-encoded {converted} of {} containers",
                self.containers.len()
            );
        }
        self.has_run_containers()
    }

    /// Converts every run container to array or bitmap form.
    /// Returns `true` if any container changed.
    pub fn remove_run_compression(&mut self) -> bool {
        let mut changed = false;
        for container in self.containers.iter_mut() {
            changed |= container.remove_run_compression();
        }
        changed
    }

    pub fn has_run_containers(&self) -> bool {
        self.containers
            .iter()
            .any(|c| matches!(c, Container::Run(_)))
    }

    pub fn shrink_to_fit(&mut self) {
        self.keys.shrink_to_fit();
        self.containers.shrink_to_fit();
        for container in self.containers.iter_mut() {
            container.shrink_to_fit();
        }
    }

    /// Checks every structural invariant and reports the first violation.
    ///
    /// Bitmaps built through the public API always validate; bitmaps decoded from
    /// bytes are only trustworthy once this returns [`ValidationResult::is_valid`].
    pub fn validate(&self) -> ValidationResult {
        let views = self
            .containers
            .iter()
            .map(|c| Some(ContainerView::of(c)))
            .collect::<Vec<_>>();
        let index = IndexView {
            size: self.keys.len() as i64,
            keys: Some(&self.keys),
            containers: Some(&views),
        };
        let result = validation::validate_index(Some(&index));
        if !result.is_valid() {
            log::debug!("roaring bitmap failed validation: {result}");
        }
        result
    }

    /// Intersection.
    pub fn and(&self, other: &RoaringBitmap) -> RoaringBitmap {
        let mut out = RoaringBitmap::with_capacity(self.keys.len().min(other.keys.len()));
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    let container = self.containers[i].and(&other.containers[j]);
                    out.push_nonempty(self.keys[i], container);
                    i += 1;
                    j += 1;
                }
            }
        }
        out
    }

    /// Union.
    pub fn or(&self, other: &RoaringBitmap) -> RoaringBitmap {
        let mut out = RoaringBitmap::with_capacity(self.keys.len() + other.keys.len());
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => {
                    out.push_nonempty(self.keys[i], self.containers[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    out.push_nonempty(other.keys[j], other.containers[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    let container = self.containers[i].or(&other.containers[j]);
                    out.push_nonempty(self.keys[i], container);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from(&self.keys[i..], &self.containers[i..]);
        out.extend_from(&other.keys[j..], &other.containers[j..]);
        out
    }

    /// Symmetric difference.
    pub fn xor(&self, other: &RoaringBitmap) -> RoaringBitmap {
        let mut out = RoaringBitmap::with_capacity(self.keys.len() + other.keys.len());
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => {
                    out.push_nonempty(self.keys[i], self.containers[i].clone());
                    i += 1;
                }
                Ordering::Greater => {
                    out.push_nonempty(other.keys[j], other.containers[j].clone());
                    j += 1;
                }
                Ordering::Equal => {
                    let container = self.containers[i].xor(&other.containers[j]);
                    out.push_nonempty(self.keys[i], container);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from(&self.keys[i..], &self.containers[i..]);
        out.extend_from(&other.keys[j..], &other.containers[j..]);
        out
    }

    /// Difference: values of `self` that are not in `other`.
    pub fn and_not(&self, other: &RoaringBitmap) -> RoaringBitmap {
        let mut out = RoaringBitmap::with_capacity(self.keys.len());
        let mut j = 0;
        for (&key, container) in self.keys.iter().zip(&self.containers) {
            while j < other.keys.len() && other.keys[j] < key {
                j += 1;
            }
            if j < other.keys.len() && other.keys[j] == key {
                out.push_nonempty(key, container.and_not(&other.containers[j]));
            } else {
                out.push_nonempty(key, container.clone());
            }
        }
        out
    }

    /// In-place intersection.
    pub fn and_inplace(&mut self, other: &RoaringBitmap) {
        let keys = std::mem::take(&mut self.keys);
        let containers = std::mem::take(&mut self.containers);
        let mut j = 0;
        for (key, mut container) in keys.into_iter().zip(containers) {
            while j < other.keys.len() && other.keys[j] < key {
                j += 1;
            }
            if j < other.keys.len() && other.keys[j] == key {
                container.and_inplace(&other.containers[j]);
                self.push_nonempty(key, container);
            }
        }
    }

    /// In-place union.
    pub fn or_inplace(&mut self, other: &RoaringBitmap) {
        self.merge_inplace(other, Container::or_inplace);
    }

    /// In-place symmetric difference.
    pub fn xor_inplace(&mut self, other: &RoaringBitmap) {
        self.merge_inplace(other, Container::xor_inplace);
    }

    /// In-place difference.
    pub fn and_not_inplace(&mut self, other: &RoaringBitmap) {
        let keys = std::mem::take(&mut self.keys);
        let containers = std::mem::take(&mut self.containers);
        let mut j = 0;
        for (key, mut container) in keys.into_iter().zip(containers) {
            while j < other.keys.len() && other.keys[j] < key {
                j += 1;
            }
            if j < other.keys.len() && other.keys[j] == key {
                container.and_not_inplace(&other.containers[j]);
            }
            self.push_nonempty(key, container);
        }
    }

    /// Zips `self` with `other`, keeping keys from both sides and combining
    /// matching containers with `op`.
    fn merge_inplace(&mut self, other: &RoaringBitmap, op: fn(&mut Container, &Container)) {
        let keys = std::mem::take(&mut self.keys);
        let containers = std::mem::take(&mut self.containers);
        self.keys.reserve(keys.len() + other.keys.len());
        self.containers.reserve(keys.len() + other.keys.len());

        let mut j = 0;
        for (key, mut container) in keys.into_iter().zip(containers) {
            while j < other.keys.len() && other.keys[j] < key {
                self.push_nonempty(other.keys[j], other.containers[j].clone());
                j += 1;
            }
            if j < other.keys.len() && other.keys[j] == key {
                op(&mut container, &other.containers[j]);
                j += 1;
            }
            self.push_nonempty(key, container);
        }
        self.extend_from(&other.keys[j..], &other.containers[j..]);
    }

    fn push_nonempty(&mut self, key: u16, container: Container) {
        if !container.is_empty() {
            self.keys.push(key);
            self.containers.push(container);
        }
    }

    fn extend_from(&mut self, keys: &[u16], containers: &[Container]) {
        for (&key, container) in keys.iter().zip(containers) {
            self.push_nonempty(key, container.clone());
        }
    }

    /// Visits the pairs of containers stored under the same key in both bitmaps.
    fn for_each_matching(
        &self,
        other: &RoaringBitmap,
        mut f: impl FnMut(&Container, &Container),
    ) {
        let (mut i, mut j) = (0, 0);
        while i < self.keys.len() && j < other.keys.len() {
            match self.keys[i].cmp(&other.keys[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    f(&self.containers[i], &other.containers[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
    }

    /// `|self AND other|`, without building the result.
    pub fn and_cardinality(&self, other: &RoaringBitmap) -> u64 {
        let mut count = 0u64;
        self.for_each_matching(other, |a, b| count += a.and_cardinality(b) as u64);
        count
    }

    pub fn or_cardinality(&self, other: &RoaringBitmap) -> u64 {
        self.len() + other.len() - self.and_cardinality(other)
    }

    pub fn xor_cardinality(&self, other: &RoaringBitmap) -> u64 {
        self.len() + other.len() - 2 * self.and_cardinality(other)
    }

    pub fn and_not_cardinality(&self, other: &RoaringBitmap) -> u64 {
        self.len() - self.and_cardinality(other)
    }

    /// Whether the bitmaps share at least one value.
    pub fn intersects(&self, other: &RoaringBitmap) -> bool {
        let mut found = false;
        self.for_each_matching(other, |a, b| found = found || a.intersects(b));
        found
    }

    /// Whether every value of `self` is in `other`.
    pub fn is_subset(&self, other: &RoaringBitmap) -> bool {
        let mut j = 0;
        for (&key, container) in self.keys.iter().zip(&self.containers) {
            while j < other.keys.len() && other.keys[j] < key {
                j += 1;
            }
            if j >= other.keys.len() || other.keys[j] != key {
                return false;
            }
            if !container.is_subset(&other.containers[j]) {
                return false;
            }
        }
        true
    }
}

impl PartialEq for RoaringBitmap {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
            && self
                .containers
                .iter()
                .zip(&other.containers)
                .all(|(a, b)| a.is_equal_to(b))
    }
}

impl Eq for RoaringBitmap {}

impl std::fmt::Debug for RoaringBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.len();
        if len <= 16 {
            f.debug_set().entries(self.iter()).finish()
        } else {
            write!(
                f,
                "RoaringBitmap<{len} values between {:?} and {:?} in {} containers>",
                self.min(),
                self.max(),
                self.keys.len()
            )
        }
    }
}

impl FromIterator<u32> for RoaringBitmap {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut bitmap = RoaringBitmap::new();
        bitmap.extend(iter);
        bitmap
    }
}

impl Extend<u32> for RoaringBitmap {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a> IntoIterator for &'a RoaringBitmap {
    type Item = u32;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Ascending (and, from the back, descending) iterator over a [`RoaringBitmap`].
#[derive(Clone)]
pub struct Iter<'a> {
    inner: std::iter::Zip<std::slice::Iter<'a, u16>, std::slice::Iter<'a, Container>>,
    front: Option<(u16, container::Iter<'a>)>,
    back: Option<(u16, container::Iter<'a>)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = u32;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, values)) = &mut self.front {
                if let Some(low) = values.next() {
                    return Some(join(*key, low));
                }
                self.front = None;
            }
            match self.inner.next() {
                Some((&key, container)) => self.front = Some((key, container.iter())),
                None => {
                    let (key, values) = self.back.as_mut()?;
                    let value = values.next().map(|low| join(*key, low));
                    if value.is_none() {
                        self.back = None;
                    }
                    return value;
                }
            }
        }
    }
}

impl<'a> DoubleEndedIterator for Iter<'a> {
    fn next_back(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, values)) = &mut self.back {
                if let Some(low) = values.next_back() {
                    return Some(join(*key, low));
                }
                self.back = None;
            }
            match self.inner.next_back() {
                Some((&key, container)) => self.back = Some((key, container.iter())),
                None => {
                    let (key, values) = self.front.as_mut()?;
                    let value = values.next_back().map(|low| join(*key, low));
                    if value.is_none() {
                        self.front = None;
                    }
                    return value;
                }
            }
        }
    }
}

/// Iterator over `(rank, value)` pairs; see [`RoaringBitmap::iter_with_rank`].
#[derive(Clone)]
pub struct RankIter<'a> {
    iter: Iter<'a>,
    rank: u64,
}

impl<'a> RankIter<'a> {
    /// Rank of the last value returned, or 0 before the first call to `next`.
    #[inline]
    pub fn rank(&self) -> u64 {
        self.rank
    }
}

impl<'a> Iterator for RankIter<'a> {
    type Item = (u64, u32);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.iter.next()?;
        self.rank += 1;
        Some((self.rank, value))
    }
}

impl std::ops::BitAnd for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl std::ops::BitOr for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl std::ops::BitXor for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn bitxor(self, rhs: Self) -> Self::Output {
        self.xor(rhs)
    }
}

impl std::ops::Sub for &RoaringBitmap {
    type Output = RoaringBitmap;
    fn sub(self, rhs: Self) -> Self::Output {
        self.and_not(rhs)
    }
}

impl std::ops::BitAndAssign<&RoaringBitmap> for RoaringBitmap {
    fn bitand_assign(&mut self, rhs: &RoaringBitmap) {
        self.and_inplace(rhs);
    }
}

impl std::ops::BitOrAssign<&RoaringBitmap> for RoaringBitmap {
    fn bitor_assign(&mut self, rhs: &RoaringBitmap) {
        self.or_inplace(rhs);
    }
}

impl std::ops::BitXorAssign<&RoaringBitmap> for RoaringBitmap {
    fn bitxor_assign(&mut self, rhs: &RoaringBitmap) {
        self.xor_inplace(rhs);
    }
}

impl std::ops::SubAssign<&RoaringBitmap> for RoaringBitmap {
    fn sub_assign(&mut self, rhs: &RoaringBitmap) {
        self.and_not_inplace(rhs);
    }
}
