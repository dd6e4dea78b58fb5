//! A dense container storing one bit per low value.

use std::ops::Range;

use crate::container::{
    Container,
    array::ArrayContainer,
    run::{Run, RunContainer},
};

/// Dense container: a fixed vector of 65,536 bits with a cached cardinality.
///
/// Bit `i` of word `i / 64` (LSB first) is set when the low value `i` is present.
/// The cached cardinality is maintained by every mutating method; containers read
/// from untrusted bytes carry whatever cardinality the input declared, which the
/// validator compares against the actual popcount.
#[derive(Clone, PartialEq, Eq)]
pub struct BitmapContainer {
    words: Box<[u64; BitmapContainer::WORDS]>,
    cardinality: usize,
}

impl BitmapContainer {
    /// Number of 64-bit words backing a bitmap container.
    pub const WORDS: usize = Container::SPAN as usize / 64;

    /// Serialized payload size in bytes.
    pub const SERIALIZED_SIZE: usize = Self::WORDS * 8;

    pub fn empty() -> BitmapContainer {
        BitmapContainer {
            words: Box::new([0u64; Self::WORDS]),
            cardinality: 0,
        }
    }

    pub fn full() -> BitmapContainer {
        BitmapContainer {
            words: Box::new([u64::MAX; Self::WORDS]),
            cardinality: Container::SPAN as usize,
        }
    }

    /// Wraps `words` and computes the cardinality.
    pub fn from_words(words: Box<[u64; Self::WORDS]>) -> BitmapContainer {
        let cardinality = popcount(&words[..]);
        BitmapContainer { words, cardinality }
    }

    /// Wraps `words` with a declared cardinality that is not checked.
    pub(crate) fn from_raw_parts(
        words: Box<[u64; Self::WORDS]>,
        cardinality: usize,
    ) -> BitmapContainer {
        BitmapContainer { words, cardinality }
    }

    pub fn from_sorted_values(values: &[u16]) -> BitmapContainer {
        let mut bitmap = BitmapContainer::empty();
        for &v in values {
            bitmap.words[(v >> 6) as usize] |= 1u64 << (v & 63);
        }
        bitmap.cardinality = popcount(&bitmap.words[..]);
        bitmap
    }

    pub fn from_runs(runs: &[Run]) -> BitmapContainer {
        let mut bitmap = BitmapContainer::empty();
        for run in runs {
            bitmap.insert_range(run.as_range());
        }
        bitmap
    }

    #[inline]
    pub fn words(&self) -> &[u64; Self::WORDS] {
        &self.words
    }

    /// The cached cardinality.
    #[inline]
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Recomputes the cardinality from the words.
    #[inline]
    pub fn count_ones(&self) -> usize {
        popcount(&self.words[..])
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cardinality == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.cardinality == Container::SPAN as usize
    }

    #[inline]
    fn bit_position(value: u16) -> (usize, u32) {
        ((value >> 6) as usize, (value & 63) as u32)
    }

    #[inline]
    pub fn contains(&self, value: u16) -> bool {
        let (word, bit) = Self::bit_position(value);
        self.words[word] & (1u64 << bit) != 0
    }

    /// Sets the bit for `value`. Returns `false` if it was already set.
    #[inline]
    pub fn insert(&mut self, value: u16) -> bool {
        let (word, bit) = Self::bit_position(value);
        let old = self.words[word];
        let new = old | (1u64 << bit);
        self.words[word] = new;
        let inserted = old != new;
        self.cardinality += inserted as usize;
        inserted
    }

    /// Clears the bit for `value`. Returns `false` if it was not set.
    #[inline]
    pub fn remove(&mut self, value: u16) -> bool {
        let (word, bit) = Self::bit_position(value);
        let old = self.words[word];
        let new = old & !(1u64 << bit);
        self.words[word] = new;
        let removed = old != new;
        self.cardinality -= removed as usize;
        removed
    }

    pub fn insert_range(&mut self, range: Range<u32>) {
        self.process_range(range, |word, mask| word | mask);
    }

    pub fn remove_range(&mut self, range: Range<u32>) {
        self.process_range(range, |word, mask| word & !mask);
    }

    pub fn flip_range(&mut self, range: Range<u32>) {
        self.process_range(range, |word, mask| word ^ mask);
    }

    /// Applies `mask_fn` to every word overlapped by `range`, keeping the cached
    /// cardinality in sync.
    ///
    /// The mask passed for each word has exactly the bits of that word that fall
    /// inside `range`; whole middle words receive `u64::MAX`, so a full-domain
    /// range is a plain word fill. Empty ranges are a no-op.
    ///
    /// # Panics
    ///
    /// If `range.end > 65536`.
    fn process_range(&mut self, range: Range<u32>, mask_fn: impl Fn(u64, u64) -> u64) {
        let (start, end) = (range.start as usize, range.end as usize);
        if start >= end {
            return;
        }
        assert!(
            end <= Container::SPAN as usize,
            "Range end {end} out of bounds (len: {})",
            Container::SPAN
        );

        let (start_word, start_bit) = (start / 64, start % 64);
        let (end_word, end_bit) = (end / 64, end % 64);
        let mut delta = 0isize;
        let mut apply = |word: &mut u64, mask: u64| {
            let new = mask_fn(*word, mask);
            delta += new.count_ones() as isize - word.count_ones() as isize;
            *word = new;
        };

        if start_word == end_word {
            let mask = ((1u64 << end_bit) - 1) & !((1u64 << start_bit) - 1);
            apply(&mut self.words[start_word], mask);
        } else {
            apply(&mut self.words[start_word], !((1u64 << start_bit) - 1));
            for word in self.words.iter_mut().take(end_word).skip(start_word + 1) {
                apply(word, u64::MAX);
            }
            if end_bit > 0 {
                apply(&mut self.words[end_word], (1u64 << end_bit) - 1);
            }
        }
        self.cardinality = (self.cardinality as isize + delta) as usize;
    }

    /// Number of set bits inside `range`.
    pub fn range_cardinality(&self, range: Range<u32>) -> usize {
        let (start, end) = (range.start as usize, range.end as usize);
        if start >= end {
            return 0;
        }
        let (start_word, start_bit) = (start / 64, start % 64);
        let (end_word, end_bit) = (end / 64, end % 64);
        if start_word == end_word {
            let mask = ((1u64 << end_bit) - 1) & !((1u64 << start_bit) - 1);
            return (self.words[start_word] & mask).count_ones() as usize;
        }
        let mut count = (self.words[start_word] & !((1u64 << start_bit) - 1)).count_ones() as usize;
        count += popcount(&self.words[start_word + 1..end_word]);
        if end_bit > 0 {
            count += (self.words[end_word] & ((1u64 << end_bit) - 1)).count_ones() as usize;
        }
        count
    }

    pub fn contains_range(&self, range: Range<u32>) -> bool {
        let len = range.end.saturating_sub(range.start) as usize;
        self.range_cardinality(range) == len
    }

    /// Number of set bits at positions `<= value`.
    pub fn rank(&self, value: u16) -> usize {
        let (word_index, bit_position) = Self::bit_position(value);
        popcount(&self.words[..word_index])
            + (self.words[word_index] << (63 - bit_position)).count_ones() as usize
    }

    /// Position of the `n`-th set bit (0-based).
    pub fn select(&self, n: usize) -> Option<u16> {
        fn select_u64(mut value: u64, n: u64) -> u32 {
            for _ in 0..n {
                value &= value - 1;
            }
            value.trailing_zeros()
        }

        let mut n = n as u64;
        for (word_index, &word) in self.words.iter().enumerate() {
            let len = word.count_ones() as u64;
            if n < len {
                let bit = select_u64(word, n);
                return Some((64 * word_index as u32 + bit) as u16);
            }
            n -= len;
        }
        None
    }

    pub fn min(&self) -> Option<u16> {
        self.words
            .iter()
            .position(|&w| w != 0)
            .map(|i| (i * 64) as u16 + self.words[i].trailing_zeros() as u16)
    }

    pub fn max(&self) -> Option<u16> {
        self.words
            .iter()
            .rposition(|&w| w != 0)
            .map(|i| (i * 64) as u16 + 63 - self.words[i].leading_zeros() as u16)
    }

    /// Counts maximal runs of set bits.
    ///
    /// A run starts at bit `i` when bit `i` is set and bit `i - 1` is not; the
    /// previous word's top bit is carried into bit 0 of the next word.
    pub fn count_runs(&self) -> usize {
        let mut runs = 0usize;
        let mut prev_word = 0u64;
        for &word in self.words.iter() {
            let shifted_prev = (word << 1) | (prev_word >> 63);
            runs += (word & !shifted_prev).count_ones() as usize;
            prev_word = word;
        }
        runs
    }

    /// Returns `true` as soon as the run count is known to exceed `limit`.
    pub fn count_runs_exceeds(&self, limit: usize) -> bool {
        let mut runs = 0usize;
        let mut prev_word = 0u64;
        for chunk in self.words.chunks(64) {
            for &word in chunk {
                let shifted_prev = (word << 1) | (prev_word >> 63);
                runs += (word & !shifted_prev).count_ones() as usize;
                prev_word = word;
            }
            if runs > limit {
                return true;
            }
        }
        false
    }

    pub fn iter(&self) -> BitmapIter<'_> {
        BitmapIter::new(&self.words[..], self.cardinality)
    }

    /// Maximal ranges of set bits, in ascending order.
    pub fn ranges(&self) -> BitmapRangesIter<'_> {
        BitmapRangesIter {
            words: &self.words[..],
            index: 0,
            current: self.words[0],
        }
    }

    /// Lists the set bits. The result exceeds [`ArrayContainer::MAX_LEN`] when the
    /// bitmap is dense.
    pub fn to_array(&self) -> ArrayContainer {
        let mut values = Vec::with_capacity(self.cardinality);
        values.extend(self.iter());
        ArrayContainer::from_raw_values(values)
    }

    pub fn to_run(&self) -> RunContainer {
        RunContainer::from_ranges(self.ranges())
    }

    fn combine(&self, other: &BitmapContainer, op: impl Fn(u64, u64) -> u64) -> BitmapContainer {
        let mut words = Box::new([0u64; Self::WORDS]);
        let mut cardinality = 0usize;
        for ((out, &a), &b) in words.iter_mut().zip(self.words.iter()).zip(other.words.iter()) {
            *out = op(a, b);
            cardinality += out.count_ones() as usize;
        }
        BitmapContainer { words, cardinality }
    }

    fn combine_with(&mut self, other: &BitmapContainer, op: impl Fn(u64, u64) -> u64) {
        let mut cardinality = 0usize;
        for (a, &b) in self.words.iter_mut().zip(other.words.iter()) {
            *a = op(*a, b);
            cardinality += a.count_ones() as usize;
        }
        self.cardinality = cardinality;
    }

    pub fn union(&self, other: &BitmapContainer) -> BitmapContainer {
        self.combine(other, |a, b| a | b)
    }

    pub fn intersect(&self, other: &BitmapContainer) -> BitmapContainer {
        self.combine(other, |a, b| a & b)
    }

    pub fn symmetric_difference(&self, other: &BitmapContainer) -> BitmapContainer {
        self.combine(other, |a, b| a ^ b)
    }

    pub fn difference(&self, other: &BitmapContainer) -> BitmapContainer {
        self.combine(other, |a, b| a & !b)
    }

    pub fn union_with(&mut self, other: &BitmapContainer) {
        self.combine_with(other, |a, b| a | b);
    }

    pub fn intersect_with(&mut self, other: &BitmapContainer) {
        self.combine_with(other, |a, b| a & b);
    }

    pub fn symmetric_difference_with(&mut self, other: &BitmapContainer) {
        self.combine_with(other, |a, b| a ^ b);
    }

    pub fn difference_with(&mut self, other: &BitmapContainer) {
        self.combine_with(other, |a, b| a & !b);
    }

    pub fn intersect_len(&self, other: &BitmapContainer) -> usize {
        self.words
            .iter()
            .zip(other.words.iter())
            .map(|(&a, &b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Clears every bit outside of `runs`.
    pub fn retain_runs(&mut self, runs: &[Run]) {
        let mut cursor = 0u32;
        for run in runs {
            self.remove_range(cursor..run.start as u32);
            cursor = run.end();
        }
        self.remove_range(cursor..Container::SPAN);
    }

    #[inline]
    pub fn serialized_size(&self) -> usize {
        Self::SERIALIZED_SIZE
    }
}

impl Default for BitmapContainer {
    fn default() -> Self {
        BitmapContainer::empty()
    }
}

impl std::fmt::Debug for BitmapContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitmapContainer")
            .field("cardinality", &self.cardinality)
            .finish()
    }
}

#[inline]
pub(crate) fn popcount(words: &[u64]) -> usize {
    words.iter().map(|w| w.count_ones() as usize).sum()
}

/// Double-ended iterator over the set bits of a bitmap container.
///
/// The front and back cursors each keep a scratch copy of their current word with
/// consumed bits cleared. When both cursors reach the same word they hold separate
/// copies; `remaining` stops them before they cross.
#[derive(Clone)]
pub struct BitmapIter<'a> {
    words: &'a [u64],
    front_index: usize,
    front: u64,
    back_index: usize,
    back: u64,
    remaining: usize,
}

impl<'a> BitmapIter<'a> {
    fn new(words: &'a [u64], cardinality: usize) -> Self {
        let last = words.len() - 1;
        BitmapIter {
            words,
            front_index: 0,
            front: words[0],
            back_index: last,
            back: words[last],
            remaining: cardinality,
        }
    }
}

impl<'a> Iterator for BitmapIter<'a> {
    type Item = u16;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.front == 0 {
            self.front_index += 1;
            if self.front_index >= self.words.len() {
                self.remaining = 0;
                return None;
            }
            self.front = self.words[self.front_index];
        }
        let bit = self.front.trailing_zeros() as usize;
        self.front &= self.front - 1;
        self.remaining -= 1;
        Some((self.front_index * 64 + bit) as u16)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a> DoubleEndedIterator for BitmapIter<'a> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        while self.back == 0 {
            if self.back_index == 0 {
                self.remaining = 0;
                return None;
            }
            self.back_index -= 1;
            self.back = self.words[self.back_index];
        }
        let bit = 63 - self.back.leading_zeros() as usize;
        self.back &= !(1u64 << bit);
        self.remaining -= 1;
        Some((self.back_index * 64 + bit) as u16)
    }
}

impl<'a> ExactSizeIterator for BitmapIter<'a> {}

/// Iterator over maximal ranges of set bits, as end-exclusive `u32` ranges.
#[derive(Clone)]
pub struct BitmapRangesIter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl<'a> Iterator for BitmapRangesIter<'a> {
    type Item = Range<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.current == 0 {
            self.index += 1;
            if self.index >= self.words.len() {
                return None;
            }
            self.current = self.words[self.index];
        }
        let start = self.index * 64 + self.current.trailing_zeros() as usize;

        // Extend the run across words while the ones continue.
        let filled = self.current | (self.current - 1);
        let mut end;
        if filled == u64::MAX {
            loop {
                self.index += 1;
                if self.index >= self.words.len() {
                    self.current = 0;
                    return Some(start as u32..Container::SPAN);
                }
                self.current = self.words[self.index];
                if self.current != u64::MAX {
                    break;
                }
            }
            let ones = self.current.trailing_ones() as usize;
            end = self.index * 64 + ones;
            self.current &= !((1u64 << ones) - 1);
        } else {
            let ones = (!filled).trailing_zeros() as usize;
            end = self.index * 64 + ones;
            self.current &= !((1u64 << ones) - 1);
        }
        if end > Container::SPAN as usize {
            end = Container::SPAN as usize;
        }
        Some(start as u32..end as u32)
    }
}
