#![forbid(unsafe_code)]
//! grass_scatter: Blue-noise point scattering over large planar domains.
//!
//! Modules:
//! - bounds: rectangles in either Y orientation
//! - sampling: spatial grid, quad-tree and the per-tile Poisson disk sampler
//! - density: greyscale density images and intensity-to-radius mapping
//! - scatter: tiling, partial generation, guards, events and the runner
//! - cancel: cooperative cancellation checkpoints
//!
//! For examples and docs, see README and docs.rs.
pub mod bounds;
pub mod cancel;
pub mod density;
pub mod error;
pub mod sampling;
pub mod scatter;

/// Convenient re-exports for common types. Import with `use grass_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::bounds::{Bounds, Orientation};
    pub use crate::cancel::{Cancellation, FnCancel, RunStatus};
    pub use crate::density::{
        DensityField, DensityRadius, PartitionDescriptor, RadiusThresholds,
    };
    pub use crate::error::{Error, Result};
    pub use crate::sampling::{
        sample_tile, AngleSampling, FixedRadius, PoissonDiskSampler, RadiusField,
        SamplerConfig, Schedule, SeedPoint, TileSamples,
    };
    pub use crate::scatter::events::{
        AsEventSink, EventSink, FnSink, MultiSink, ScatterEvent, ScatterEventKind, VecSink,
    };
    pub use crate::scatter::guard::{
        GuardConfig, InstanceCheck, InstanceGuard, MemoryCheck, MemoryProbe,
    };
    pub use crate::scatter::runner::{
        run_scatter, RadiusMode, RunResult, RunSummary, ScatterConfig, ScatterRunner,
    };
    pub use crate::scatter::tiling::{tile, PartialGeneration, SegmentLayout, Tile};
}
