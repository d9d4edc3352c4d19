//! Intensity-driven exclusion radius.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::Bounds;
use crate::density::field::DensityField;
use crate::density::partition::PartitionDescriptor;
use crate::error::{Error, Result};
use crate::sampling::RadiusField;

pub const DEFAULT_LOWER_THRESHOLD: f32 = 100.0;
pub const DEFAULT_UPPER_THRESHOLD: f32 = 1000.0;

/// Linear map from intensity `[0, 255]` to radius `[lower, upper]`.
///
/// Black pixels get the lower radius (dense sampling), white pixels the upper one.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadiusThresholds {
    pub lower: f32,
    pub upper: f32,
}

impl Default for RadiusThresholds {
    fn default() -> Self {
        Self {
            lower: DEFAULT_LOWER_THRESHOLD,
            upper: DEFAULT_UPPER_THRESHOLD,
        }
    }
}

impl RadiusThresholds {
    pub fn new(lower: f32, upper: f32) -> Self {
        Self { lower, upper }
    }

    #[inline]
    pub fn radius_for_intensity(&self, intensity: u8) -> f32 {
        self.lower + (intensity as f32 / 255.0) * (self.upper - self.lower)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(Error::InvalidConfig("thresholds must be finite".into()));
        }
        if self.lower <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "lower threshold must be > 0, got {}",
                self.lower
            )));
        }
        if self.lower >= self.upper {
            return Err(Error::InvalidConfig(format!(
                "lower threshold {} must be below upper threshold {}",
                self.lower, self.upper
            )));
        }
        Ok(())
    }
}

/// [`RadiusField`] reading a shared [`DensityField`] for one tile.
#[derive(Clone, Copy, Debug)]
pub struct DensityRadius<'a> {
    pub field: &'a DensityField,
    pub bounds: Bounds,
    pub partition: PartitionDescriptor,
    pub thresholds: RadiusThresholds,
}

impl<'a> DensityRadius<'a> {
    pub fn new(
        field: &'a DensityField,
        bounds: Bounds,
        partition: PartitionDescriptor,
        thresholds: RadiusThresholds,
    ) -> Self {
        Self {
            field,
            bounds,
            partition,
            thresholds,
        }
    }
}

impl RadiusField for DensityRadius<'_> {
    #[inline]
    fn radius_at(&self, p: Vec2) -> Option<f32> {
        self.field
            .lookup(p, &self.bounds, self.partition)
            .map(|i| self.thresholds.radius_for_intensity(i))
    }

    fn min_radius(&self) -> f32 {
        self.thresholds.lower
    }

    fn max_radius(&self) -> f32 {
        self.thresholds.upper
    }
}
