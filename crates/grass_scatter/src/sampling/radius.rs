//! Exclusion radius sources.
use glam::Vec2;

/// Supplies the minimum separation enforced around a position.
pub trait RadiusField: Send + Sync {
    /// Radius around `p`, or `None` if `p` cannot hold a sample.
    fn radius_at(&self, p: Vec2) -> Option<f32>;

    /// Smallest radius the field can return.
    fn min_radius(&self) -> f32;

    /// Largest radius the field can return.
    fn max_radius(&self) -> f32;
}

/// The same radius everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedRadius(pub f32);

impl RadiusField for FixedRadius {
    #[inline]
    fn radius_at(&self, _p: Vec2) -> Option<f32> {
        Some(self.0)
    }

    fn min_radius(&self) -> f32 {
        self.0
    }

    fn max_radius(&self) -> f32 {
        self.0
    }
}
