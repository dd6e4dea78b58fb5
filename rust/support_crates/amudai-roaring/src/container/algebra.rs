//! Binary set operations between containers of any two encodings.
//!
//! Every operator matches on the pair of encodings and picks the algorithm that
//! suits it:
//! - Array/Array: sorted merges, O(n + m).
//! - Array/Bitmap: test or flip one bitmap bit per array value.
//! - Array/Run: walk the array and the runs together.
//! - Bitmap/Bitmap: word-wise operations over the 1024 words.
//! - Bitmap/Run: apply the runs as word-masked ranges.
//! - Run/Run: interval merges.
//!
//! Results are wrapped by cardinality ([`Container::from_bitmap`]) or by overall
//! size ([`Container::from_run`]), so an empty result is always an empty array.

use crate::container::{Container, array::ArrayContainer, run};

impl Container {
    /// Cheap check that no value of `self` can be in `other`, by comparing bounds.
    fn is_disjoint_by_bounds(&self, other: &Container) -> bool {
        match (self.min(), self.max(), other.min(), other.max()) {
            (Some(min), Some(max), Some(other_min), Some(other_max)) => {
                max < other_min || other_max < min
            }
            _ => true,
        }
    }

    /// Intersection (`self AND other`).
    pub fn and(&self, other: &Container) -> Container {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => Container::from_array(a.intersect(b)),
            (Container::Array(a), Container::Bitmap(b))
            | (Container::Bitmap(b), Container::Array(a)) => {
                Container::from_array(a.filtered(|v| b.contains(v)))
            }
            (Container::Array(a), Container::Run(r)) | (Container::Run(r), Container::Array(a)) => {
                Container::from_array(a.intersect_runs(r.runs()))
            }
            (Container::Bitmap(a), Container::Bitmap(b)) => Container::from_bitmap(a.intersect(b)),
            (Container::Bitmap(b), Container::Run(r))
            | (Container::Run(r), Container::Bitmap(b)) => {
                let mut bitmap = b.clone();
                if !r.is_full() {
                    bitmap.retain_runs(r.runs());
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Run(a), Container::Run(b)) => {
                if a.is_full() {
                    return Container::from_run(b.clone());
                }
                if b.is_full() {
                    return Container::from_run(a.clone());
                }
                Container::from_run(a.intersect(b))
            }
        }
    }

    /// Union (`self OR other`).
    pub fn or(&self, other: &Container) -> Container {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => {
                Container::from_sorted_values(a.union_values(b))
            }
            (Container::Array(a), Container::Bitmap(b))
            | (Container::Bitmap(b), Container::Array(a)) => {
                let mut bitmap = b.clone();
                for v in a.iter() {
                    bitmap.insert(v);
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Array(a), Container::Run(r)) | (Container::Run(r), Container::Array(a)) => {
                if r.is_full() {
                    return Container::full();
                }
                let runs = run::union_runs(r.runs(), a.to_run().runs());
                Container::from_run(run::RunContainer::new(runs))
            }
            (Container::Bitmap(a), Container::Bitmap(b)) => Container::from_bitmap(a.union(b)),
            (Container::Bitmap(b), Container::Run(r))
            | (Container::Run(r), Container::Bitmap(b)) => {
                if r.is_full() {
                    return Container::full();
                }
                let mut bitmap = b.clone();
                for range in r.ranges() {
                    bitmap.insert_range(range);
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Run(a), Container::Run(b)) => {
                if a.is_full() || b.is_full() {
                    return Container::full();
                }
                Container::from_run(a.union(b))
            }
        }
    }

    /// Symmetric difference (`self XOR other`).
    pub fn xor(&self, other: &Container) -> Container {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => {
                Container::from_sorted_values(a.xor_values(b))
            }
            (Container::Array(a), Container::Bitmap(b))
            | (Container::Bitmap(b), Container::Array(a)) => {
                let mut bitmap = b.clone();
                for v in a.iter() {
                    if !bitmap.insert(v) {
                        bitmap.remove(v);
                    }
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Array(a), Container::Run(r)) | (Container::Run(r), Container::Array(a)) => {
                let runs = run::xor_runs(r.runs(), a.to_run().runs());
                Container::from_run(run::RunContainer::new(runs))
            }
            (Container::Bitmap(a), Container::Bitmap(b)) => {
                Container::from_bitmap(a.symmetric_difference(b))
            }
            (Container::Bitmap(b), Container::Run(r))
            | (Container::Run(r), Container::Bitmap(b)) => {
                let mut bitmap = b.clone();
                for range in r.ranges() {
                    bitmap.flip_range(range);
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Run(a), Container::Run(b)) => {
                Container::from_run(a.symmetric_difference(b))
            }
        }
    }

    /// Difference (`self AND NOT other`).
    ///
    /// When the bounds of the operands do not overlap the result is a plain copy
    /// of `self`.
    pub fn and_not(&self, other: &Container) -> Container {
        if self.is_disjoint_by_bounds(other) {
            return if self.is_empty() {
                Container::empty()
            } else {
                self.clone()
            };
        }
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => Container::from_array(a.difference(b)),
            (Container::Array(a), Container::Bitmap(b)) => {
                Container::from_array(a.filtered(|v| !b.contains(v)))
            }
            (Container::Array(a), Container::Run(r)) => {
                Container::from_array(a.difference_runs(r.runs()))
            }
            (Container::Bitmap(a), Container::Array(b)) => {
                let mut bitmap = a.clone();
                for v in b.iter() {
                    bitmap.remove(v);
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Bitmap(a), Container::Bitmap(b)) => Container::from_bitmap(a.difference(b)),
            (Container::Bitmap(a), Container::Run(r)) => {
                let mut bitmap = a.clone();
                for range in r.ranges() {
                    bitmap.remove_range(range);
                }
                Container::from_bitmap(bitmap)
            }
            (Container::Run(r), Container::Array(a)) => {
                let runs = run::difference_runs(r.runs(), a.to_run().runs());
                Container::from_run(run::RunContainer::new(runs))
            }
            (Container::Run(r), Container::Bitmap(b)) => {
                if r.cardinality() <= ArrayContainer::MAX_LEN {
                    let mut values = Vec::with_capacity(r.cardinality());
                    values.extend(r.iter().filter(|&v| !b.contains(v)));
                    return Container::from_array(ArrayContainer::new(values));
                }
                let mut bitmap = r.to_bitmap();
                bitmap.difference_with(b);
                Container::from_bitmap(bitmap)
            }
            (Container::Run(a), Container::Run(b)) => Container::from_run(a.difference(b)),
        }
    }

    /// In-place intersection.
    pub fn and_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Container::Array(a), Container::Array(b)) => a.intersect_with(b),
            (Container::Array(a), Container::Bitmap(b)) => a.retain(|&v| b.contains(v)),
            (Container::Bitmap(a), Container::Bitmap(b)) => {
                a.intersect_with(b);
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (Container::Bitmap(a), Container::Run(r)) => {
                if !r.is_full() {
                    a.retain_runs(r.runs());
                }
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (_, other) => *self = self.and(other),
        }
    }

    /// In-place union.
    pub fn or_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Container::Bitmap(a), Container::Bitmap(b)) => a.union_with(b),
            (Container::Bitmap(a), Container::Array(b)) => {
                for v in b.iter() {
                    a.insert(v);
                }
            }
            (Container::Bitmap(a), Container::Run(r)) if !r.is_full() => {
                for range in r.ranges() {
                    a.insert_range(range);
                }
            }
            (_, other) => {
                *self = self.or(other);
                return;
            }
        }
        if let Container::Bitmap(a) = &*self {
            if a.cardinality() <= ArrayContainer::MAX_LEN {
                *self = Container::Array(a.to_array());
            }
        }
    }

    /// In-place symmetric difference.
    pub fn xor_inplace(&mut self, other: &Container) {
        match (&mut *self, other) {
            (Container::Bitmap(a), Container::Bitmap(b)) => {
                a.symmetric_difference_with(b);
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (Container::Bitmap(a), Container::Run(r)) => {
                for range in r.ranges() {
                    a.flip_range(range);
                }
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (_, other) => *self = self.xor(other),
        }
    }

    /// In-place difference.
    pub fn and_not_inplace(&mut self, other: &Container) {
        if self.is_disjoint_by_bounds(other) {
            if self.is_empty() {
                *self = Container::empty();
            }
            return;
        }
        match (&mut *self, other) {
            (Container::Array(a), Container::Array(b)) => a.difference_with(b),
            (Container::Array(a), Container::Bitmap(b)) => a.retain(|&v| !b.contains(v)),
            (Container::Bitmap(a), Container::Bitmap(b)) => {
                a.difference_with(b);
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (Container::Bitmap(a), Container::Array(b)) => {
                for v in b.iter() {
                    a.remove(v);
                }
                if a.cardinality() <= ArrayContainer::MAX_LEN {
                    *self = Container::Array(a.to_array());
                }
            }
            (_, other) => *self = self.and_not(other),
        }
    }

    /// `|self AND other|`, without building the result.
    pub fn and_cardinality(&self, other: &Container) -> usize {
        match (self, other) {
            (Container::Array(a), Container::Array(b)) => a.intersect_len(b),
            (Container::Array(a), Container::Bitmap(b))
            | (Container::Bitmap(b), Container::Array(a)) => {
                a.iter().filter(|&v| b.contains(v)).count()
            }
            (Container::Array(a), Container::Run(r)) | (Container::Run(r), Container::Array(a)) => {
                a.iter().filter(|&v| r.contains(v)).count()
            }
            (Container::Bitmap(a), Container::Bitmap(b)) => a.intersect_len(b),
            (Container::Bitmap(b), Container::Run(r))
            | (Container::Run(r), Container::Bitmap(b)) => {
                r.ranges().map(|range| b.range_cardinality(range)).sum()
            }
            (Container::Run(a), Container::Run(b)) => a.intersect_len(b),
        }
    }

    /// `|self OR other|`, without building the result.
    pub fn or_cardinality(&self, other: &Container) -> usize {
        self.cardinality() + other.cardinality() - self.and_cardinality(other)
    }

    /// `|self XOR other|`, without building the result.
    pub fn xor_cardinality(&self, other: &Container) -> usize {
        self.cardinality() + other.cardinality() - 2 * self.and_cardinality(other)
    }

    /// `|self AND NOT other|`, without building the result.
    pub fn and_not_cardinality(&self, other: &Container) -> usize {
        self.cardinality() - self.and_cardinality(other)
    }

    /// Whether `self` and `other` share at least one value.
    pub fn intersects(&self, other: &Container) -> bool {
        if self.is_disjoint_by_bounds(other) {
            return false;
        }
        match (self, other) {
            (Container::Array(a), _) => a.iter().any(|v| other.contains(v)),
            (_, Container::Array(b)) => b.iter().any(|v| self.contains(v)),
            (Container::Bitmap(a), Container::Bitmap(b)) => {
                a.words().iter().zip(b.words().iter()).any(|(&x, &y)| x & y != 0)
            }
            _ => self.and_cardinality(other) != 0,
        }
    }

    /// Whether every value of `self` is also in `other`.
    pub fn is_subset(&self, other: &Container) -> bool {
        self.cardinality() <= other.cardinality()
            && self.and_cardinality(other) == self.cardinality()
    }
}

impl std::ops::BitAnd for &Container {
    type Output = Container;
    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl std::ops::BitOr for &Container {
    type Output = Container;
    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl std::ops::BitXor for &Container {
    type Output = Container;
    fn bitxor(self, rhs: Self) -> Self::Output {
        self.xor(rhs)
    }
}

impl std::ops::Sub for &Container {
    type Output = Container;
    fn sub(self, rhs: Self) -> Self::Output {
        self.and_not(rhs)
    }
}
