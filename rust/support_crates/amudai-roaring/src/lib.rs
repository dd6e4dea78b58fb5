//! Compressed sets of `u32` values in the roaring layout.
//!
//! Values are partitioned by their high 16 bits into [`Container`]s, each stored
//! as a sorted array, a 65,536-bit bitmap or a list of runs, whichever is the most
//! compact. See [`RoaringBitmap`] for the indexed structure, [`validation`] for the
//! structural checks and [`serialization`] for the portable byte format.

pub mod container;
pub mod error;
pub mod roaring_bitmap;
pub mod serialization;
#[cfg(any(test, feature = "unchecked"))]
pub mod unchecked;
pub mod validation;
#[cfg(test)]
mod tests;

pub use container::{Container, ContainerKind};
pub use error::{Error, ErrorKind, Result};
pub use roaring_bitmap::RoaringBitmap;
pub use validation::{ContainerValidationCode, ValidationCode, ValidationResult};
