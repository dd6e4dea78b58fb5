//! Structural validation of a roaring bitmap.
//!
//! The validator walks read-only views of the key index and of every container and
//! reports the first violated invariant as a [`ValidationResult`]. It never panics
//! on malformed data: absent arrays, negative counts and unknown container tags are
//! all representable in the views and reported as violations.
//!
//! Check order (the first failing check wins):
//!
//! 1. Index: structure present, `size >= 0`, container slots present, keys present,
//!    `size` within the capacity of both, keys strictly increasing, every populated
//!    slot holds a container.
//! 2. Containers, in key order; the first invalid one is reported as
//!    [`ValidationCode::InvalidContainer`] with its key prepended to the parameters:
//!    - Array: cardinality non-negative, within the sparse threshold, content present,
//!      cardinality within the content capacity, content strictly increasing.
//!    - Bitmap: words present, exactly 1024 words, cached cardinality equal to popcount.
//!    - Run: run count non-negative, runs present, run count within capacity, then per
//!      run: no overlap with the previous run, no overflow past 65535, not touching the
//!      previous run.
//!    - Unknown tag.

use std::fmt;

use crate::container::{
    Container, array::ArrayContainer, bitmap::BitmapContainer, bitmap::popcount, run::Run,
};

/// Top-level validation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationCode {
    Ok,
    NullContainers,
    NegativeSize,
    MoreContainersThanSpace,
    NonIncreasingKeys,
    NullKeys,
    NullContainer,
    NullContainerValues,
    InvalidContainer,
}

impl ValidationCode {
    /// Number of parameters a result with this code carries.
    ///
    /// - `NegativeSize`: `[size]`
    /// - `MoreContainersThanSpace`: `[size, capacity]`
    /// - `NonIncreasingKeys`: `[index, previous_key, key]`
    /// - `NullContainer`: `[index, key]`
    /// - `InvalidContainer`: the container sub-code's parameters, preceded by the
    ///   key once the result is attributed to a slot
    pub fn params_count(self) -> usize {
        match self {
            ValidationCode::Ok
            | ValidationCode::NullContainers
            | ValidationCode::NullKeys
            | ValidationCode::NullContainerValues
            | ValidationCode::InvalidContainer => 0,
            ValidationCode::NegativeSize => 1,
            ValidationCode::MoreContainersThanSpace | ValidationCode::NullContainer => 2,
            ValidationCode::NonIncreasingKeys => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::Ok => "OK",
            ValidationCode::NullContainers => "NULL_CONTAINERS",
            ValidationCode::NegativeSize => "NEGATIVE_SIZE",
            ValidationCode::MoreContainersThanSpace => "MORE_CONTAINERS_THAN_SPACE",
            ValidationCode::NonIncreasingKeys => "NON_INCREASING_KEYS",
            ValidationCode::NullKeys => "NULL_KEYS",
            ValidationCode::NullContainer => "NULL_CONTAINER",
            ValidationCode::NullContainerValues => "NULL_CONTAINER_VALUES",
            ValidationCode::InvalidContainer => "INVALID_CONTAINER",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container-level validation outcome. Results that are not about a container
/// carry [`ContainerValidationCode::BitmapViolation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerValidationCode {
    BitmapViolation,
    UnknownContainerType,
    NegativeCardinality,
    TooBigCardinality,
    CardinalityExceedsCapacity,
    NullContent,
    NonIncreasingValues,
    NullBitmap,
    InvalidBitmapLength,
    InvalidCardinality,
    NegativeRunCount,
    CapacityLessThanRunCount,
    NullValuesLength,
    RunOverlap,
    RunOverflow,
    RunsNotMerged,
    /// Reserved: a run with a negative length cannot be expressed, so no check
    /// reports this code.
    BadRange,
}

impl ContainerValidationCode {
    /// Number of parameters a result with this sub-code carries (before the key).
    ///
    /// - `UnknownContainerType`: `[tag]`
    /// - `NegativeCardinality`: `[cardinality]`
    /// - `TooBigCardinality`: `[cardinality, max_cardinality]`
    /// - `CardinalityExceedsCapacity`: `[cardinality, capacity]`
    /// - `NonIncreasingValues`: `[index, previous, value]`
    /// - `InvalidBitmapLength`: `[length]`
    /// - `InvalidCardinality`: `[cached, actual]`
    /// - `NegativeRunCount`: `[run_count]`
    /// - `CapacityLessThanRunCount`: `[run_count, capacity]`
    /// - `RunOverlap`, `RunsNotMerged`: `[index, previous_last, start]`
    /// - `RunOverflow`: `[index, start, length]`
    pub fn params_count(self) -> usize {
        use ContainerValidationCode::*;
        match self {
            BitmapViolation | NullContent | NullBitmap | NullValuesLength | BadRange => 0,
            UnknownContainerType
            | NegativeCardinality
            | InvalidBitmapLength
            | NegativeRunCount => 1,
            TooBigCardinality
            | CardinalityExceedsCapacity
            | InvalidCardinality
            | CapacityLessThanRunCount => 2,
            NonIncreasingValues | RunOverlap | RunOverflow | RunsNotMerged => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        use ContainerValidationCode::*;
        match self {
            BitmapViolation => "BITMAP_VIOLATION",
            UnknownContainerType => "UNKNOWN_CONTAINER_TYPE",
            NegativeCardinality => "NEGATIVE_CARDINALITY",
            TooBigCardinality => "TOO_BIG_CARDINALITY",
            CardinalityExceedsCapacity => "CARDINALITY_EXCEEDS_CAPACITY",
            NullContent => "NULL_CONTENT",
            NonIncreasingValues => "NON_INCREASING_VALUES",
            NullBitmap => "NULL_BITMAP",
            InvalidBitmapLength => "INVALID_BITMAP_LENGTH",
            InvalidCardinality => "INVALID_CARDINALITY",
            NegativeRunCount => "NEGATIVE_RUN_COUNT",
            CapacityLessThanRunCount => "CAPACITY_LESS_THAN_RUN_COUNT",
            NullValuesLength => "NULL_VALUES_LENGTH",
            RunOverlap => "RUN_OVERLAP",
            RunOverflow => "RUN_OVERFLOW",
            RunsNotMerged => "RUNS_NOT_MERGED",
            BadRange => "BAD_RANGE",
        }
    }
}

impl fmt::Display for ContainerValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation outcome: success, or the first violation found together
/// with the parameters that locate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    code: ValidationCode,
    sub_code: ContainerValidationCode,
    params: Vec<i64>,
}

impl ValidationResult {
    pub fn ok() -> ValidationResult {
        ValidationResult {
            code: ValidationCode::Ok,
            sub_code: ContainerValidationCode::BitmapViolation,
            params: Vec::new(),
        }
    }

    /// Creates an index-level violation.
    ///
    /// # Panics
    ///
    /// If the number of `params` does not match [`ValidationCode::params_count`].
    pub fn invalid(code: ValidationCode, params: Vec<i64>) -> ValidationResult {
        assert_eq!(
            params.len(),
            code.params_count(),
            "{code}: expected {} parameters, but given {}",
            code.params_count(),
            params.len()
        );
        ValidationResult {
            code,
            sub_code: ContainerValidationCode::BitmapViolation,
            params,
        }
    }

    /// Creates a container-level violation, not yet attributed to a key.
    ///
    /// # Panics
    ///
    /// If the number of `params` does not match
    /// [`ContainerValidationCode::params_count`].
    pub fn invalid_container(
        sub_code: ContainerValidationCode,
        params: Vec<i64>,
    ) -> ValidationResult {
        assert_eq!(
            params.len(),
            sub_code.params_count(),
            "{sub_code}: expected {} parameters, but given {}",
            sub_code.params_count(),
            params.len()
        );
        ValidationResult {
            code: ValidationCode::InvalidContainer,
            sub_code,
            params,
        }
    }

    /// Attributes a container violation to the container stored under `key`, which
    /// becomes the first parameter.
    ///
    /// # Panics
    ///
    /// If this is not a container violation, or if a key was already prepended.
    pub fn prepend_key(mut self, key: u16) -> ValidationResult {
        assert_eq!(
            self.code,
            ValidationCode::InvalidContainer,
            "validation must be about an invalid container, not: {}",
            self.code
        );
        assert_eq!(
            self.params.len(),
            self.sub_code.params_count(),
            "validation already enriched"
        );
        self.params.insert(0, key as i64);
        self
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.code == ValidationCode::Ok
    }

    #[inline]
    pub fn code(&self) -> ValidationCode {
        self.code
    }

    #[inline]
    pub fn sub_code(&self) -> ContainerValidationCode {
        self.sub_code
    }

    #[inline]
    pub fn params(&self) -> &[i64] {
        &self.params
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValidationResult{{code={}, sub_code={}, params={:?}}}",
            self.code, self.sub_code, self.params
        )
    }
}

/// Read-only view of one container slot, able to express states a live
/// [`Container`] never has.
#[derive(Debug, Clone, Copy)]
pub enum ContainerView<'a> {
    Array {
        cardinality: i64,
        content: Option<&'a [u16]>,
    },
    Bitmap {
        cardinality: i64,
        words: Option<&'a [u64]>,
    },
    Run {
        run_count: i64,
        runs: Option<&'a [Run]>,
    },
    Unknown {
        tag: u8,
    },
}

impl<'a> ContainerView<'a> {
    pub fn of(container: &'a Container) -> ContainerView<'a> {
        match container {
            Container::Array(c) => ContainerView::Array {
                cardinality: c.len() as i64,
                content: Some(c.values()),
            },
            Container::Bitmap(c) => ContainerView::Bitmap {
                cardinality: c.cardinality() as i64,
                words: Some(&c.words()[..]),
            },
            Container::Run(c) => ContainerView::Run {
                run_count: c.count_runs() as i64,
                runs: Some(c.runs()),
            },
        }
    }
}

/// Read-only view of the key index.
#[derive(Debug, Clone, Copy)]
pub struct IndexView<'a> {
    pub size: i64,
    pub keys: Option<&'a [u16]>,
    pub containers: Option<&'a [Option<ContainerView<'a>>]>,
}

/// Validates a whole bitmap given a view of its index (`None` when the index itself
/// is absent).
pub fn validate_index(index: Option<&IndexView<'_>>) -> ValidationResult {
    let Some(index) = index else {
        return ValidationResult::invalid(ValidationCode::NullContainers, Vec::new());
    };
    if index.size < 0 {
        return ValidationResult::invalid(ValidationCode::NegativeSize, vec![index.size]);
    }
    let Some(containers) = index.containers else {
        return ValidationResult::invalid(ValidationCode::NullContainerValues, Vec::new());
    };
    let Some(keys) = index.keys else {
        return ValidationResult::invalid(ValidationCode::NullKeys, Vec::new());
    };

    let capacity = keys.len().min(containers.len()) as i64;
    if index.size > capacity {
        return ValidationResult::invalid(
            ValidationCode::MoreContainersThanSpace,
            vec![index.size, capacity],
        );
    }
    let size = index.size as usize;

    for i in 1..size {
        if keys[i] <= keys[i - 1] {
            return ValidationResult::invalid(
                ValidationCode::NonIncreasingKeys,
                vec![i as i64, keys[i - 1] as i64, keys[i] as i64],
            );
        }
    }

    for (i, slot) in containers[..size].iter().enumerate() {
        if slot.is_none() {
            return ValidationResult::invalid(
                ValidationCode::NullContainer,
                vec![i as i64, keys[i] as i64],
            );
        }
    }

    for (slot, &key) in containers[..size].iter().zip(keys) {
        if let Some(view) = slot {
            let result = validate_container(view);
            if !result.is_valid() {
                return result.prepend_key(key);
            }
        }
    }

    ValidationResult::ok()
}

/// Validates a single container view.
pub fn validate_container(view: &ContainerView<'_>) -> ValidationResult {
    match *view {
        ContainerView::Array {
            cardinality,
            content,
        } => validate_array(cardinality, content),
        ContainerView::Bitmap { cardinality, words } => validate_bitmap(cardinality, words),
        ContainerView::Run { run_count, runs } => validate_runs(run_count, runs),
        ContainerView::Unknown { tag } => ValidationResult::invalid_container(
            ContainerValidationCode::UnknownContainerType,
            vec![tag as i64],
        ),
    }
}

fn validate_array(cardinality: i64, content: Option<&[u16]>) -> ValidationResult {
    use ContainerValidationCode::*;

    if cardinality < 0 {
        return ValidationResult::invalid_container(NegativeCardinality, vec![cardinality]);
    }
    let max_len = ArrayContainer::MAX_LEN as i64;
    if cardinality > max_len {
        return ValidationResult::invalid_container(TooBigCardinality, vec![cardinality, max_len]);
    }
    let Some(content) = content else {
        return ValidationResult::invalid_container(NullContent, Vec::new());
    };
    if cardinality > content.len() as i64 {
        return ValidationResult::invalid_container(
            CardinalityExceedsCapacity,
            vec![cardinality, content.len() as i64],
        );
    }
    let values = &content[..cardinality as usize];
    for i in 1..values.len() {
        if values[i] <= values[i - 1] {
            return ValidationResult::invalid_container(
                NonIncreasingValues,
                vec![i as i64, values[i - 1] as i64, values[i] as i64],
            );
        }
    }
    ValidationResult::ok()
}

fn validate_bitmap(cardinality: i64, words: Option<&[u64]>) -> ValidationResult {
    use ContainerValidationCode::*;

    let Some(words) = words else {
        return ValidationResult::invalid_container(NullBitmap, Vec::new());
    };
    if words.len() != BitmapContainer::WORDS {
        return ValidationResult::invalid_container(InvalidBitmapLength, vec![words.len() as i64]);
    }
    let actual = popcount(words) as i64;
    if cardinality != actual {
        return ValidationResult::invalid_container(InvalidCardinality, vec![cardinality, actual]);
    }
    ValidationResult::ok()
}

fn validate_runs(run_count: i64, runs: Option<&[Run]>) -> ValidationResult {
    use ContainerValidationCode::*;

    if run_count < 0 {
        return ValidationResult::invalid_container(NegativeRunCount, vec![run_count]);
    }
    let Some(runs) = runs else {
        return ValidationResult::invalid_container(NullValuesLength, Vec::new());
    };
    if run_count > runs.len() as i64 {
        return ValidationResult::invalid_container(
            CapacityLessThanRunCount,
            vec![run_count, runs.len() as i64],
        );
    }

    let max_value = (Container::SPAN - 1) as i64;
    let mut prev_last: Option<i64> = None;
    for (i, run) in runs[..run_count as usize].iter().enumerate() {
        let start = run.start as i64;
        let last = start + run.length as i64;
        if let Some(prev_last) = prev_last {
            if start <= prev_last {
                return ValidationResult::invalid_container(
                    RunOverlap,
                    vec![i as i64, prev_last, start],
                );
            }
        }
        if last > max_value {
            return ValidationResult::invalid_container(
                RunOverflow,
                vec![i as i64, start, run.length as i64],
            );
        }
        if let Some(prev_last) = prev_last {
            if start == prev_last + 1 {
                return ValidationResult::invalid_container(
                    RunsNotMerged,
                    vec![i as i64, prev_last, start],
                );
            }
        }
        prev_last = Some(last);
    }
    ValidationResult::ok()
}
