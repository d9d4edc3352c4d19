//! Greyscale density fields driving adaptive sampling.
//!
//! - [`DensityField`]: decoded 8-bit intensities with domain-to-pixel lookup.
//! - [`PartitionDescriptor`]: which slice of a shared image a tile reads from.
//! - [`RadiusThresholds`]: intensity-to-radius mapping.
//! - [`DensityRadius`]: a [`crate::sampling::RadiusField`] over a density field.
pub mod field;
pub mod partition;
pub mod radius;

pub use field::DensityField;
pub use partition::PartitionDescriptor;
pub use radius::{DensityRadius, RadiusThresholds};
