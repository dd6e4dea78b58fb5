//! A container that stores low values as a list of maximal intervals.

use std::ops::{Range, RangeInclusive};

use itertools::Itertools;

use crate::container::{Container, array::ArrayContainer, bitmap::BitmapContainer};

/// A non-empty interval of low values, encoded as in the portable format: the
/// interval covers `start..=start + length`, so `length` is the value count minus
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Run {
    pub start: u16,
    pub length: u16,
}

impl Run {
    #[inline]
    pub fn new(start: u16, length: u16) -> Run {
        Run { start, length }
    }

    #[inline]
    pub fn point(value: u16) -> Run {
        Run {
            start: value,
            length: 0,
        }
    }

    /// Builds a run covering `range` (end-exclusive, `range.end <= 65536`).
    #[inline]
    pub fn from_range(range: Range<u32>) -> Run {
        debug_assert!(range.start < range.end);
        debug_assert!(range.end <= Container::SPAN);
        Run {
            start: range.start as u16,
            length: (range.end - range.start - 1) as u16,
        }
    }

    /// The last value covered by the run.
    #[inline]
    pub fn last(&self) -> u16 {
        self.start + self.length
    }

    /// Exclusive end of the run, may be `65536`.
    #[inline]
    pub fn end(&self) -> u32 {
        self.start as u32 + self.length as u32 + 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.length as usize + 1
    }

    #[inline]
    pub fn as_range(&self) -> Range<u32> {
        self.start as u32..self.end()
    }

    #[inline]
    pub fn values(&self) -> RangeInclusive<u16> {
        self.start..=self.last()
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        value >= self.start && (value - self.start) <= self.length
    }

    /// Merges `next` into `self` when they overlap or touch, for use with
    /// [`Itertools::coalesce`]. Runs must arrive ordered by `start`.
    #[inline]
    pub fn coalesce(&self, next: Run) -> Result<Run, (Run, Run)> {
        if self.start <= next.start && next.start as u32 <= self.end() {
            let end = self.end().max(next.end());
            Ok(Run::from_range(self.start as u32..end))
        } else {
            Err((*self, next))
        }
    }
}

impl From<Range<u32>> for Run {
    #[inline]
    fn from(r: Range<u32>) -> Self {
        Run::from_range(r)
    }
}

pub type RunValuesIter<'a> = std::iter::FlatMap<
    std::slice::Iter<'a, Run>,
    RangeInclusive<u16>,
    fn(&Run) -> RangeInclusive<u16>,
>;

/// Run-length encoded container.
///
/// # Invariants
///
/// - runs are sorted by `start`
/// - runs neither overlap nor touch: `prev.end() < next.start`
/// - every run stays inside the 16-bit domain
///
/// Runs read from untrusted bytes may break these; such containers are only
/// meant to be inspected by the validator.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RunContainer {
    runs: Vec<Run>,
}

impl RunContainer {
    pub(crate) fn new(runs: Vec<Run>) -> RunContainer {
        let container = RunContainer { runs };

        #[cfg(debug_assertions)]
        container.check_full_invariants();

        container
    }

    /// Wraps runs exactly as given, without any checks.
    pub(crate) fn from_raw_runs(runs: Vec<Run>) -> RunContainer {
        RunContainer { runs }
    }

    pub fn empty() -> RunContainer {
        RunContainer { runs: Vec::new() }
    }

    pub fn full() -> RunContainer {
        RunContainer::new(vec![Run::new(0, u16::MAX)])
    }

    pub fn from_range(range: Range<u32>) -> RunContainer {
        if range.start >= range.end {
            return RunContainer::empty();
        }
        RunContainer::new(vec![Run::from_range(range)])
    }

    /// Builds a container from ranges sorted by start. Overlapping or touching
    /// ranges are merged.
    pub fn from_ranges(ranges: impl Iterator<Item = Range<u32>>) -> RunContainer {
        let runs = ranges
            .filter(|r| r.start < r.end)
            .map(Run::from_range)
            .coalesce(|prev, next| prev.coalesce(next))
            .collect();
        RunContainer::new(runs)
    }

    pub fn from_sorted_values(values: &[u16]) -> RunContainer {
        let mut runs = Vec::with_capacity(crate::container::array::count_runs(values));
        runs.extend(
            values
                .iter()
                .map(|&v| Run::point(v))
                .coalesce(|prev, next| prev.coalesce(next)),
        );
        RunContainer::new(runs)
    }

    #[inline]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    #[inline]
    pub fn count_runs(&self) -> usize {
        self.runs.len()
    }

    pub fn cardinality(&self) -> usize {
        self.runs.iter().map(Run::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.runs.len() == 1 && self.runs[0].start == 0 && self.runs[0].length == u16::MAX
    }

    /// Index of the first run whose last value is `>= value`.
    #[inline]
    fn find(&self, value: u16) -> usize {
        self.runs.partition_point(|run| run.end() <= value as u32)
    }

    pub fn contains(&self, value: u16) -> bool {
        match self.runs.get(self.find(value)) {
            Some(run) => run.start <= value,
            None => false,
        }
    }

    pub fn contains_range(&self, range: Range<u32>) -> bool {
        if range.start >= range.end {
            return true;
        }
        match self.runs.get(self.find(range.start as u16)) {
            Some(run) => run.start as u32 <= range.start && range.end <= run.end(),
            None => false,
        }
    }

    /// Inserts a single value, merging it with neighboring runs.
    /// Returns `false` if the value was already present.
    pub fn insert(&mut self, value: u16) -> bool {
        let idx = self.find(value);
        if let Some(run) = self.runs.get(idx) {
            if run.start <= value {
                return false;
            }
        }

        let joins_prev = idx > 0 && self.runs[idx - 1].end() == value as u32;
        let joins_next = idx < self.runs.len() && self.runs[idx].start as u32 == value as u32 + 1;
        match (joins_prev, joins_next) {
            (true, true) => {
                let next = self.runs.remove(idx);
                let prev = &mut self.runs[idx - 1];
                prev.length = next.last() - prev.start;
            }
            (true, false) => self.runs[idx - 1].length += 1,
            (false, true) => {
                let next = &mut self.runs[idx];
                next.start -= 1;
                next.length += 1;
            }
            (false, false) => self.runs.insert(idx, Run::point(value)),
        }
        true
    }

    /// Removes a single value, splitting the covering run if needed.
    /// Returns `false` if the value was absent.
    pub fn remove(&mut self, value: u16) -> bool {
        let idx = self.find(value);
        let run = match self.runs.get(idx) {
            Some(run) if run.start <= value => *run,
            _ => return false,
        };

        if run.length == 0 {
            self.runs.remove(idx);
        } else if value == run.start {
            self.runs[idx] = Run::new(run.start + 1, run.length - 1);
        } else if value == run.last() {
            self.runs[idx].length -= 1;
        } else {
            self.runs[idx] = Run::new(run.start, value - 1 - run.start);
            self.runs
                .insert(idx + 1, Run::new(value + 1, run.last() - (value + 1)));
        }
        true
    }

    /// Appends a value not less than any present value. Pushing the current
    /// maximum again is a no-op.
    ///
    /// # Panics
    ///
    /// If `value` is less than the current maximum.
    #[inline]
    pub fn push(&mut self, value: u16) {
        match self.runs.last_mut() {
            None => self.runs.push(Run::point(value)),
            Some(last) => {
                let max = last.last();
                assert!(
                    value >= max,
                    "Attempted to push value {value} which is less than last value {max}"
                );
                if value == max {
                    return;
                }
                if value as u32 == last.end() {
                    last.length += 1;
                } else {
                    self.runs.push(Run::point(value));
                }
            }
        }
    }

    pub fn insert_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        // Runs strictly before `range` that do not touch it.
        let lo = self.runs.partition_point(|run| run.end() < range.start);
        // Runs that start at or before `range.end` overlap or touch it.
        let hi = self.runs.partition_point(|run| run.start as u32 <= range.end);

        let mut start = range.start;
        let mut end = range.end;
        if lo < hi {
            start = start.min(self.runs[lo].start as u32);
            end = end.max(self.runs[hi - 1].end());
        }
        self.runs.splice(lo..hi, [Run::from_range(start..end)]);
    }

    pub fn remove_range(&mut self, range: Range<u32>) {
        if range.start >= range.end {
            return;
        }
        let lo = self.runs.partition_point(|run| run.end() <= range.start);
        let hi = self.runs.partition_point(|run| (run.start as u32) < range.end);
        if lo >= hi {
            return;
        }

        let first = self.runs[lo];
        let last = self.runs[hi - 1];
        let mut pieces = Vec::with_capacity(2);
        if (first.start as u32) < range.start {
            pieces.push(Run::from_range(first.start as u32..range.start));
        }
        if last.end() > range.end {
            pieces.push(Run::from_range(range.end..last.end()));
        }
        self.runs.splice(lo..hi, pieces);
    }

    /// Number of values `<= value`.
    pub fn rank(&self, value: u16) -> usize {
        let mut rank = 0;
        for run in &self.runs {
            if value < run.start {
                break;
            }
            if value >= run.last() {
                rank += run.len();
            } else {
                rank += (value - run.start) as usize + 1;
                break;
            }
        }
        rank
    }

    /// The `n`-th smallest value (0-based).
    pub fn select(&self, n: usize) -> Option<u16> {
        let mut n = n;
        for run in &self.runs {
            if n < run.len() {
                return Some(run.start + n as u16);
            }
            n -= run.len();
        }
        None
    }

    #[inline]
    pub fn min(&self) -> Option<u16> {
        self.runs.first().map(|r| r.start)
    }

    #[inline]
    pub fn max(&self) -> Option<u16> {
        self.runs.last().map(|r| r.last())
    }

    pub fn iter(&self) -> RunValuesIter<'_> {
        self.runs.iter().flat_map(Run::values as fn(&Run) -> RangeInclusive<u16>)
    }

    pub fn ranges(&self) -> impl Iterator<Item = Range<u32>> + '_ {
        self.runs.iter().map(Run::as_range)
    }

    /// Expands the runs. The result exceeds [`ArrayContainer::MAX_LEN`] for dense
    /// containers.
    pub fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.cardinality());
        values.extend(self.iter());
        ArrayContainer::from_raw_values(values)
    }

    pub fn to_bitmap(&self) -> BitmapContainer {
        BitmapContainer::from_runs(&self.runs)
    }

    pub fn union(&self, other: &RunContainer) -> RunContainer {
        RunContainer::new(union_runs(&self.runs, &other.runs))
    }

    pub fn intersect(&self, other: &RunContainer) -> RunContainer {
        RunContainer::new(intersect_runs(&self.runs, &other.runs))
    }

    pub fn difference(&self, other: &RunContainer) -> RunContainer {
        RunContainer::new(difference_runs(&self.runs, &other.runs))
    }

    pub fn symmetric_difference(&self, other: &RunContainer) -> RunContainer {
        RunContainer::new(xor_runs(&self.runs, &other.runs))
    }

    /// Number of values shared with `other`, without materializing them.
    pub fn intersect_len(&self, other: &RunContainer) -> usize {
        let (a, b) = (&self.runs, &other.runs);
        let (mut i, mut j) = (0, 0);
        let mut count = 0usize;
        while i < a.len() && j < b.len() {
            let start = a[i].start.max(b[j].start) as u32;
            let end = a[i].end().min(b[j].end());
            if start < end {
                count += (end - start) as usize;
            }
            if a[i].end() < b[j].end() {
                i += 1;
            } else {
                j += 1;
            }
        }
        count
    }

    #[inline]
    pub fn serialized_size(&self) -> usize {
        Self::serialized_size_for(self.runs.len())
    }

    #[inline]
    pub fn serialized_size_for(run_count: usize) -> usize {
        2 + 4 * run_count
    }

    pub fn shrink_to_fit(&mut self) {
        self.runs.shrink_to_fit();
    }

    pub fn check_full_invariants(&self) {
        for run in &self.runs {
            assert!(run.start as u32 + run.length as u32 <= u16::MAX as u32);
        }
        for w in self.runs.windows(2) {
            assert!(
                w[0].end() < w[1].start as u32,
                "runs must be sorted and merged: {:?}, {:?}",
                w[0],
                w[1]
            );
        }
    }
}

impl std::fmt::Debug for RunContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.runs.iter().map(|r| r.start..=r.last()))
            .finish()
    }
}

/// Union of two canonical run lists.
pub fn union_runs(a: &[Run], b: &[Run]) -> Vec<Run> {
    a.iter()
        .copied()
        .merge_by(b.iter().copied(), |x, y| x.start <= y.start)
        .coalesce(|prev, next| prev.coalesce(next))
        .collect()
}

/// Intersection of two canonical run lists.
pub fn intersect_runs(a: &[Run], b: &[Run]) -> Vec<Run> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        let start = a[i].start.max(b[j].start) as u32;
        let end = a[i].end().min(b[j].end());
        if start < end {
            out.push(Run::from_range(start..end));
        }
        if a[i].end() < b[j].end() {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Values of `a` not covered by `b`.
pub fn difference_runs(a: &[Run], b: &[Run]) -> Vec<Run> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for run in a {
        let mut start = run.start as u32;
        let end = run.end();
        while j < b.len() && b[j].end() <= start {
            j += 1;
        }
        let mut k = j;
        while k < b.len() && (b[k].start as u32) < end {
            let cut = b[k].as_range();
            if cut.start > start {
                out.push(Run::from_range(start..cut.start));
            }
            start = start.max(cut.end);
            if cut.end >= end {
                break;
            }
            k += 1;
        }
        if start < end {
            out.push(Run::from_range(start..end));
        }
    }
    out
}

/// Symmetric difference of two canonical run lists.
///
/// Each list contributes a toggle at every run boundary; a value is in the
/// result when an odd number of toggles precede it. Coinciding boundaries
/// cancel, which keeps the output merged.
pub fn xor_runs(a: &[Run], b: &[Run]) -> Vec<Run> {
    let boundaries = |runs: &[Run]| -> Vec<u32> {
        runs.iter().flat_map(|r| [r.start as u32, r.end()]).collect()
    };
    let left = boundaries(a);
    let right = boundaries(b);

    let mut out = Vec::new();
    let mut open: Option<u32> = None;
    let mut events = left.into_iter().merge(right).peekable();
    while let Some(pos) = events.next() {
        if events.peek() == Some(&pos) {
            events.next();
            continue;
        }
        match open.take() {
            None => open = Some(pos),
            Some(start) => out.push(Run::from_range(start..pos)),
        }
    }
    out
}
