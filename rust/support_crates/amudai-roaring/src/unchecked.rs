//! Raw-parts fixtures for bitmaps in states the regular API never produces.
//!
//! [`UncheckedBitmap`] mirrors the layout of a [`RoaringBitmap`] with every part
//! optional and every count signed, so absent arrays, negative sizes, stale cached
//! cardinalities and unknown container tags can be expressed directly. Fixtures are
//! usually captured from a well-formed bitmap with [`UncheckedBitmap::from_bitmap`],
//! edited through the public fields, and checked with [`UncheckedBitmap::validate`],
//! which runs exactly the validator used by [`RoaringBitmap::validate`].

use crate::{
    RoaringBitmap,
    container::{
        Container, array::ArrayContainer, bitmap::BitmapContainer, run::Run, run::RunContainer,
    },
    validation::{self, ContainerView, IndexView, ValidationResult},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncheckedBitmap {
    pub index: Option<UncheckedIndex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncheckedIndex {
    /// Number of populated slots, which may disagree with the lengths below.
    pub size: i32,
    pub keys: Option<Vec<u16>>,
    pub values: Option<Vec<Option<UncheckedContainer>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UncheckedContainer {
    Array {
        cardinality: i32,
        content: Option<Vec<u16>>,
    },
    Bitmap {
        cardinality: i32,
        words: Option<Vec<u64>>,
    },
    Run {
        run_count: i32,
        runs: Option<Vec<Run>>,
    },
    Unknown {
        tag: u8,
    },
}

impl UncheckedContainer {
    pub fn from_container(container: &Container) -> UncheckedContainer {
        match container {
            Container::Array(c) => UncheckedContainer::Array {
                cardinality: c.len() as i32,
                content: Some(c.values().to_vec()),
            },
            Container::Bitmap(c) => UncheckedContainer::Bitmap {
                cardinality: c.cardinality() as i32,
                words: Some(c.words().to_vec()),
            },
            Container::Run(c) => UncheckedContainer::Run {
                run_count: c.count_runs() as i32,
                runs: Some(c.runs().to_vec()),
            },
        }
    }

    pub fn view(&self) -> ContainerView<'_> {
        match self {
            UncheckedContainer::Array {
                cardinality,
                content,
            } => ContainerView::Array {
                cardinality: *cardinality as i64,
                content: content.as_deref(),
            },
            UncheckedContainer::Bitmap { cardinality, words } => ContainerView::Bitmap {
                cardinality: *cardinality as i64,
                words: words.as_deref(),
            },
            UncheckedContainer::Run { run_count, runs } => ContainerView::Run {
                run_count: *run_count as i64,
                runs: runs.as_deref(),
            },
            UncheckedContainer::Unknown { tag } => ContainerView::Unknown { tag: *tag },
        }
    }

    pub fn validate(&self) -> ValidationResult {
        validation::validate_container(&self.view())
    }

    /// Builds a live container from the parts, when they fit its layout.
    ///
    /// Counts are used to truncate the backing arrays; the values themselves are
    /// taken as-is and may still violate ordering invariants.
    pub fn try_into_container(self) -> Option<Container> {
        match self {
            UncheckedContainer::Array {
                cardinality,
                content,
            } => {
                let mut values = content?;
                let len = usize::try_from(cardinality).ok()?;
                if len > values.len() {
                    return None;
                }
                values.truncate(len);
                Some(Container::Array(ArrayContainer::from_raw_values(values)))
            }
            UncheckedContainer::Bitmap { cardinality, words } => {
                let cardinality = usize::try_from(cardinality).ok()?;
                let words: Box<[u64; BitmapContainer::WORDS]> =
                    words?.into_boxed_slice().try_into().ok()?;
                Some(Container::Bitmap(BitmapContainer::from_raw_parts(
                    words,
                    cardinality,
                )))
            }
            UncheckedContainer::Run { run_count, runs } => {
                let mut runs = runs?;
                let len = usize::try_from(run_count).ok()?;
                if len > runs.len() {
                    return None;
                }
                runs.truncate(len);
                Some(Container::Run(RunContainer::from_raw_runs(runs)))
            }
            UncheckedContainer::Unknown { .. } => None,
        }
    }
}

impl UncheckedBitmap {
    pub fn from_bitmap(bitmap: &RoaringBitmap) -> UncheckedBitmap {
        UncheckedBitmap {
            index: Some(UncheckedIndex {
                size: bitmap.container_count() as i32,
                keys: Some(bitmap.keys().to_vec()),
                values: Some(
                    bitmap
                        .containers()
                        .iter()
                        .map(|c| Some(UncheckedContainer::from_container(c)))
                        .collect(),
                ),
            }),
        }
    }

    /// The container in slot `i`, if the index, the slot array and the slot are
    /// all present.
    pub fn container_mut(&mut self, i: usize) -> Option<&mut UncheckedContainer> {
        self.index
            .as_mut()?
            .values
            .as_mut()?
            .get_mut(i)?
            .as_mut()
    }

    pub fn validate(&self) -> ValidationResult {
        let Some(index) = &self.index else {
            return validation::validate_index(None);
        };
        let views = index.values.as_ref().map(|slots| {
            slots
                .iter()
                .map(|slot| slot.as_ref().map(UncheckedContainer::view))
                .collect::<Vec<_>>()
        });
        let view = IndexView {
            size: index.size as i64,
            keys: index.keys.as_deref(),
            containers: views.as_deref(),
        };
        validation::validate_index(Some(&view))
    }

    /// Re-assembles a [`RoaringBitmap`] from the first `size` slots, when every
    /// part needed for that is present and fits the live layout.
    pub fn try_into_bitmap(self) -> Option<RoaringBitmap> {
        let index = self.index?;
        let size = usize::try_from(index.size).ok()?;
        let mut keys = index.keys?;
        let mut slots = index.values?;
        if size > keys.len() || size > slots.len() {
            return None;
        }
        keys.truncate(size);
        slots.truncate(size);
        let containers = slots
            .into_iter()
            .map(|slot| slot?.try_into_container())
            .collect::<Option<Vec<_>>>()?;
        Some(RoaringBitmap::from_parts_unchecked(keys, containers))
    }
}
