//! Axis-aligned sampling bounds given by two opposite corners.
//!
//! Callers hand in rectangles as `(x0, y0, x1, y1)` where `x0 < x1`, while the Y axis may run
//! either way between the corners. [`Orientation`] names the two conventions; tiling and
//! density lookups branch on it explicitly.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Direction of the Y axis between the first and second corner of a [`Bounds`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// `y0 < y1`.
    YIncreasing,
    /// `y0 > y1`.
    YDecreasing,
}

/// Rectangle spanned by the corners `(x0, y0)` and `(x1, y1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Bounds {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }

    pub fn first_corner(&self) -> Vec2 {
        Vec2::new(self.x0, self.y0)
    }

    pub fn second_corner(&self) -> Vec2 {
        Vec2::new(self.x1, self.y1)
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }

    pub fn extent(&self) -> Vec2 {
        Vec2::new(self.width(), self.height())
    }

    /// Component-wise minimum corner.
    pub fn min(&self) -> Vec2 {
        self.first_corner().min(self.second_corner())
    }

    /// Component-wise maximum corner.
    pub fn max(&self) -> Vec2 {
        self.first_corner().max(self.second_corner())
    }

    pub fn center(&self) -> Vec2 {
        (self.first_corner() + self.second_corner()) * 0.5
    }

    pub fn orientation(&self) -> Orientation {
        if self.y0 < self.y1 {
            Orientation::YIncreasing
        } else {
            Orientation::YDecreasing
        }
    }

    /// Returns `true` if `p` lies inside the half-open rectangle `[min, max)`.
    pub fn contains(&self, p: Vec2) -> bool {
        let min = self.min();
        let max = self.max();
        p.x >= min.x && p.x < max.x && p.y >= min.y && p.y < max.y
    }

    /// Returns `true` if both side lengths agree in whole world units.
    pub fn is_square(&self) -> bool {
        self.width().round() as i64 == self.height().round() as i64
    }

    /// Maps `p` to coordinates relative to the first corner, where `(0, 0)` is `(x0, y0)` and
    /// `(1, 1)` is `(x1, y1)`, for either orientation.
    pub fn normalize(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            (p.x - self.x0) / (self.x1 - self.x0),
            (p.y - self.y0) / (self.y1 - self.y0),
        )
    }

    /// Validates that the corners are finite and span a non-empty rectangle with `x0 < x1`.
    pub fn validate(&self) -> Result<()> {
        if !self.to_array().iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "bounds must be finite, got {self:?}"
            )));
        }
        if self.x0 >= self.x1 {
            return Err(Error::InvalidConfig(format!(
                "bounds require x0 < x1, got x0={} x1={}",
                self.x0, self.x1
            )));
        }
        if self.y0 == self.y1 {
            return Err(Error::InvalidConfig(format!(
                "bounds have zero height (y0 == y1 == {})",
                self.y0
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extent_ignores_corner_order() {
        let up = Bounds::new(0.0, 0.0, 100.0, 50.0);
        let down = Bounds::new(0.0, 50.0, 100.0, 0.0);
        assert_eq!(up.extent(), Vec2::new(100.0, 50.0));
        assert_eq!(down.extent(), Vec2::new(100.0, 50.0));
        assert_eq!(up.min(), down.min());
        assert_eq!(up.max(), down.max());
    }

    #[test]
    fn orientation_follows_y_corners() {
        assert_eq!(
            Bounds::new(0.0, 0.0, 1.0, 1.0).orientation(),
            Orientation::YIncreasing
        );
        assert_eq!(
            Bounds::new(0.0, 1.0, 1.0, 0.0).orientation(),
            Orientation::YDecreasing
        );
    }

    #[test]
    fn contains_is_half_open() {
        let b = Bounds::new(0.0, 10.0, 10.0, 0.0);
        assert!(b.contains(Vec2::new(0.0, 0.0)));
        assert!(b.contains(Vec2::new(9.99, 9.99)));
        assert!(!b.contains(Vec2::new(10.0, 5.0)));
        assert!(!b.contains(Vec2::new(5.0, 10.0)));
        assert!(!b.contains(Vec2::new(-0.01, 5.0)));
    }

    #[test]
    fn normalize_measures_from_first_corner() {
        let down = Bounds::new(0.0, 100.0, 100.0, 0.0);
        assert_eq!(down.normalize(Vec2::new(25.0, 100.0)), Vec2::new(0.25, 0.0));
        assert_eq!(down.normalize(Vec2::new(25.0, 25.0)), Vec2::new(0.25, 0.75));
    }

    #[test]
    fn square_check_rounds_to_units() {
        assert!(Bounds::new(0.0, 0.0, 100.0, 100.2).is_square());
        assert!(!Bounds::new(0.0, 0.0, 100.0, 50.0).is_square());
    }

    #[test]
    fn validate_rejects_degenerate_bounds() {
        assert!(Bounds::new(0.0, 0.0, 10.0, 10.0).validate().is_ok());
        assert!(Bounds::new(0.0, 10.0, 10.0, 0.0).validate().is_ok());
        assert!(Bounds::new(10.0, 0.0, 0.0, 10.0).validate().is_err());
        assert!(Bounds::new(0.0, 5.0, 10.0, 5.0).validate().is_err());
        assert!(Bounds::new(0.0, 0.0, f32::NAN, 10.0).validate().is_err());
    }
}
