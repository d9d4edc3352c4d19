//! Blue-noise sampling of a single rectangular tile.
//!
//! - [`grid`]: uniform grid answering minimum-distance queries.
//! - [`quadtree`]: node arena driving the level-synchronous schedule.
//! - [`radius`]: fixed or spatially varying exclusion radius.
//! - [`poisson_disk`]: the dart-throwing sampler itself.
use std::f32::consts::TAU;

use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod grid;
pub mod poisson_disk;
pub mod quadtree;
pub mod radius;

pub use grid::{GridEntry, SpatialGrid};
pub use poisson_disk::{sample_tile, LevelStats, PoissonDiskSampler, TileSamples};
pub use quadtree::{NodeId, QuadNode, QuadTree, Quadrant};
pub use radius::{FixedRadius, RadiusField};

/// How dart angles are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AngleSampling {
    /// Uniform real-valued angles.
    #[default]
    Continuous,
    /// Angles restricted to `2π·k / precision` for integer `k` in `[0, precision)`.
    Quantized { precision: u32 },
}

impl AngleSampling {
    /// Draws a fraction of a full turn in `[0, 1)`.
    pub fn fraction(&self, rng: &mut dyn Rng) -> f32 {
        match *self {
            AngleSampling::Continuous => rand01(rng).min(next_down(1.0)),
            AngleSampling::Quantized { precision } => {
                let steps = precision.max(1);
                let k = ((rand01(rng) * steps as f32) as u32).min(steps - 1);
                k as f32 / steps as f32
            }
        }
    }

    /// Draws an angle in radians in `[0, 2π)`.
    pub fn angle(&self, rng: &mut dyn Rng) -> f32 {
        self.fraction(rng) * TAU
    }
}

/// Where the first sample of a tile is placed.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SeedPoint {
    /// Center of the tile.
    #[default]
    Center,
    /// Uniformly random inside the tile.
    Random,
    /// Fixed world-space position; tiles not containing it fall back to their center.
    Fixed { x: f32, y: f32 },
}

/// Order in which active samples are expanded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Schedule {
    /// One active sample per step, picked uniformly at random.
    #[default]
    Sequential,
    /// Whole quad-tree levels at once; proposals are computed in parallel.
    LevelSynchronous,
}

/// Per-tile sampler settings.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SamplerConfig {
    /// Dart attempts per active sample before it is retired.
    pub max_tries: u32,
    pub angle: AngleSampling,
    pub seed_point: SeedPoint,
    pub schedule: Schedule,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            angle: AngleSampling::Continuous,
            seed_point: SeedPoint::Center,
            schedule: Schedule::Sequential,
        }
    }
}

impl SamplerConfig {
    pub fn new(max_tries: u32) -> Self {
        Self {
            max_tries,
            ..Default::default()
        }
    }

    pub fn with_angle(mut self, angle: AngleSampling) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_seed_point(mut self, seed_point: SeedPoint) -> Self {
        self.seed_point = seed_point;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }
}

pub const DEFAULT_MAX_TRIES: u32 = 30;

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn Rng) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Compute the next smaller representable float value.
///
/// Returns a value that is strictly less than the input. Handles edge cases
/// including very small positive values and zero.
#[inline]
pub(crate) fn next_down(val: f32) -> f32 {
    if val.is_nan() {
        return f32::NAN;
    }

    if val == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }

    if val == f32::INFINITY {
        return f32::MAX;
    }

    if val == 0.0 {
        return -f32::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f32::from_bits(bits.saturating_sub(1))
    } else {
        f32::from_bits(bits.saturating_add(1))
    }
}

/// Picks an index in `[0, len)`; `len` must be non-zero.
#[inline]
pub(crate) fn rand_index(rng: &mut dyn Rng, len: usize) -> usize {
    debug_assert!(len > 0, "rand_index requires a non-empty range");
    ((rand01(rng) * len as f32) as usize).min(len - 1)
}

/// Draws a dart distance in `[radius, 2·radius)`.
#[inline]
pub(crate) fn annulus_distance(rng: &mut dyn Rng, radius: f32) -> f32 {
    let t = rand01(rng).min(next_down(1.0));
    (radius + t * radius).min(next_down(2.0 * radius))
}

/// Mixes a base seed with a per-item key into an independent seed.
#[inline]
pub(crate) fn mix_seed(base: u64, key: u64) -> u64 {
    let mut x = base ^ key.wrapping_mul(0x9E3779B97F4A7C15);
    x ^= x >> 30;
    x = x.wrapping_mul(0xBF58476D1CE4E5B9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) struct FixedRng {
        pub(crate) value: u32,
    }

    impl rand::TryRng for FixedRng {
        type Error = core::convert::Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Ok(self.value)
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Ok(self.value as u64)
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Self::Error> {
            let bytes = self.value.to_le_bytes();
            for (i, b) in dest.iter_mut().enumerate() {
                *b = bytes[i % 4];
            }
            Ok(())
        }
    }

    #[test]
    fn rand01_returns_zero_for_zero_input() {
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand01(&mut rng), 0.0);
    }

    #[test]
    fn rand01_values_in_range() {
        let test_values = vec![0, 1, 100, 1000, u32::MAX / 2, u32::MAX - 1, u32::MAX];

        for value in test_values {
            let mut rng = FixedRng { value };
            let result = rand01(&mut rng);
            assert!(
                (0.0..=1.0).contains(&result),
                "rand01({}) = {} is out of range [0,1]",
                value,
                result
            );
        }
    }

    #[test]
    fn next_down_handles_edge_cases() {
        assert!(next_down(1.0) < 1.0);
        assert_eq!(next_down(0.0), -f32::MIN_POSITIVE);
        assert!(next_down(-1.0) < -1.0);
        assert_eq!(next_down(f32::INFINITY), f32::MAX);
        assert_eq!(next_down(f32::NEG_INFINITY), f32::NEG_INFINITY);
        assert!(next_down(f32::NAN).is_nan());
    }

    #[test]
    fn rand_index_never_reaches_len() {
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(rand_index(&mut rng, 7), 6);
        let mut rng = FixedRng { value: 0 };
        assert_eq!(rand_index(&mut rng, 7), 0);
    }

    #[test]
    fn continuous_fraction_stays_below_one() {
        let mut rng = FixedRng { value: u32::MAX };
        let t = AngleSampling::Continuous.fraction(&mut rng);
        assert!(t < 1.0);
    }

    #[test]
    fn quantized_fraction_snaps_to_steps() {
        let sampling = AngleSampling::Quantized { precision: 4 };
        let mut rng = FixedRng {
            value: u32::MAX / 2 + 1000,
        };
        assert_eq!(sampling.fraction(&mut rng), 0.5);
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(sampling.fraction(&mut rng), 0.75);
    }

    #[test]
    fn quantized_with_zero_precision_is_clamped() {
        let sampling = AngleSampling::Quantized { precision: 0 };
        let mut rng = FixedRng { value: u32::MAX };
        assert_eq!(sampling.fraction(&mut rng), 0.0);
    }

    #[test]
    fn annulus_distance_excludes_outer_radius() {
        for radius in [0.75, 10.0, 1000.0] {
            let mut rng = FixedRng { value: u32::MAX };
            let d = annulus_distance(&mut rng, radius);
            assert!(d < 2.0 * radius, "distance {d} reached 2 * {radius}");
            let mut rng = FixedRng { value: 0 };
            assert_eq!(annulus_distance(&mut rng, radius), radius);
        }
    }

    #[test]
    fn mix_seed_separates_keys() {
        assert_ne!(mix_seed(7, 1), mix_seed(7, 2));
        assert_eq!(mix_seed(7, 1), mix_seed(7, 1));
    }
}
