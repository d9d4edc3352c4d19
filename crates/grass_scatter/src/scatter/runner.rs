//! High-level runner that validates a request, tiles the bounds and samples every tile.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec2;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bounds::Bounds;
use crate::cancel::Cancellation;
pub use crate::cancel::RunStatus;
use crate::density::{DensityField, DensityRadius, PartitionDescriptor, RadiusThresholds};
use crate::error::{Error, Result};
use crate::sampling::{sample_tile, AngleSampling, FixedRadius, SamplerConfig, Schedule};
use crate::scatter::events::{EventSink, ScatterEvent, ScatterEventKind};
use crate::scatter::tiling::{PartialGeneration, SegmentLayout, Tile};

pub const DEFAULT_MAX_SEGMENT_WIDTH: f32 = 2000.0;

/// Source of the exclusion radius.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RadiusMode {
    /// The same radius everywhere.
    Fixed { radius: f32 },
    /// Radius derived from the intensity of a greyscale image stretched over the bounds.
    Adaptive {
        thresholds: RadiusThresholds,
        image: PathBuf,
    },
}

/// Configuration of a scatter request.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScatterConfig {
    pub radius_mode: RadiusMode,
    /// Upper bound for the tile side length in world units.
    pub max_segment_width: f32,
    /// Restricts the run to one slice of the tile list.
    pub partial: Option<PartialGeneration>,
    /// Per-tile sampler settings, including `max_tries`.
    pub sampler: SamplerConfig,
}

impl ScatterConfig {
    /// Creates a configuration with a fixed exclusion radius.
    pub fn fixed(radius: f32) -> Self {
        Self {
            radius_mode: RadiusMode::Fixed { radius },
            max_segment_width: DEFAULT_MAX_SEGMENT_WIDTH,
            partial: None,
            sampler: SamplerConfig::default(),
        }
    }

    /// Creates a configuration whose radius follows the density image at `image`.
    pub fn adaptive(image: impl Into<PathBuf>, thresholds: RadiusThresholds) -> Self {
        Self {
            radius_mode: RadiusMode::Adaptive {
                thresholds,
                image: image.into(),
            },
            ..Self::fixed(1.0)
        }
    }

    pub fn with_max_tries(mut self, max_tries: u32) -> Self {
        self.sampler.max_tries = max_tries;
        self
    }

    pub fn with_max_segment_width(mut self, max_segment_width: f32) -> Self {
        self.max_segment_width = max_segment_width;
        self
    }

    pub fn with_partial(mut self, partial: PartialGeneration) -> Self {
        self.partial = Some(partial);
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.sampler.schedule = schedule;
        self
    }

    pub fn max_tries(&self) -> u32 {
        self.sampler.max_tries
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        match &self.radius_mode {
            RadiusMode::Fixed { radius } => {
                if !radius.is_finite() || *radius <= 0.0 {
                    return Err(Error::InvalidConfig(format!(
                        "radius must be a positive finite number, got {radius}"
                    )));
                }
            }
            RadiusMode::Adaptive { thresholds, .. } => thresholds.validate()?,
        }
        if self.sampler.max_tries == 0 {
            return Err(Error::InvalidConfig("max_tries must be > 0".into()));
        }
        if let AngleSampling::Quantized { precision: 0 } = self.sampler.angle {
            return Err(Error::InvalidConfig("angle precision must be > 0".into()));
        }
        if !self.max_segment_width.is_finite() || self.max_segment_width <= 0.0 {
            return Err(Error::InvalidConfig(
                "max_segment_width must be a positive finite number".into(),
            ));
        }
        if let Some(partial) = &self.partial {
            partial.validate()?;
        }
        Ok(())
    }
}

/// Counters describing how a run ended.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Tiles selected for this run.
    pub tiles_total: usize,
    /// Tiles sampled, including one interrupted by cancellation.
    pub tiles_processed: usize,
    pub positions: usize,
    pub darts: usize,
}

/// Samples produced by a scatter run.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Accepted positions, tile by tile.
    pub positions: Vec<Vec2>,
    /// Exclusion radius of each position, parallel to `positions`.
    pub radii: Vec<f32>,
    pub status: RunStatus,
    /// Bounds the run was requested for.
    pub bounds: Bounds,
    pub radius_mode: RadiusMode,
    /// Density image used by an adaptive run, for reuse across calls.
    pub density: Option<Arc<DensityField>>,
    pub tiles_total: usize,
    pub tiles_processed: usize,
    pub darts: usize,
}

impl RunResult {
    fn empty(bounds: Bounds, radius_mode: RadiusMode, density: Option<Arc<DensityField>>) -> Self {
        Self {
            positions: Vec::new(),
            radii: Vec::new(),
            status: RunStatus::Completed,
            bounds,
            radius_mode,
            density,
            tiles_total: 0,
            tiles_processed: 0,
            darts: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            status: self.status,
            tiles_total: self.tiles_total,
            tiles_processed: self.tiles_processed,
            positions: self.positions.len(),
            darts: self.darts,
        }
    }

    /// Positions as `[x0, y0, x1, y1, ...]`.
    pub fn flat_positions(&self) -> Vec<f32> {
        self.positions.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    pub fn positions_mint(&self) -> Vec<mint::Vector2<f32>> {
        self.positions.iter().copied().map(Into::into).collect()
    }

    /// Density intensity under `position`, looked up over the whole requested bounds.
    pub fn intensity_at(&self, position: Vec2) -> Option<u8> {
        self.density
            .as_ref()?
            .lookup(position, &self.bounds, PartitionDescriptor::WHOLE)
    }

    /// Exclusion radius at `position`; constant for fixed runs.
    pub fn radius_at(&self, position: Vec2) -> Option<f32> {
        match &self.radius_mode {
            RadiusMode::Fixed { radius } => Some(*radius),
            RadiusMode::Adaptive { thresholds, .. } => self
                .intensity_at(position)
                .map(|i| thresholds.radius_for_intensity(i)),
        }
    }
}

/// Density field held by a runner.
#[derive(Clone, Debug)]
struct CachedDensity {
    field: Arc<DensityField>,
    /// Image the field was decoded from; `None` for a field handed in by the caller.
    source: Option<PathBuf>,
}

/// Runs scatter requests with one configuration, caching the density image between runs.
///
/// The cache is keyed by image path, so changing `config` to another image reloads it. A field
/// set through [`ScatterRunner::with_density_field`] is used regardless of the path.
pub struct ScatterRunner {
    /// Configuration applied to every run.
    pub config: ScatterConfig,
    density: Option<CachedDensity>,
}

impl ScatterRunner {
    pub fn try_new(config: ScatterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            density: None,
        })
    }

    pub fn new(config: ScatterConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid scatter configuration");
        Self {
            config,
            density: None,
        }
    }

    /// Uses an already decoded density field instead of loading the configured image.
    pub fn with_density_field(mut self, density: Arc<DensityField>) -> Self {
        self.density = Some(CachedDensity {
            field: density,
            source: None,
        });
        self
    }

    pub fn density_field(&self) -> Option<&Arc<DensityField>> {
        self.density.as_ref().map(|cached| &cached.field)
    }

    fn density_for(&mut self, image: &Path) -> Result<Arc<DensityField>> {
        if let Some(cached) = &self.density {
            match &cached.source {
                None => return Ok(cached.field.clone()),
                Some(source) if source == image => return Ok(cached.field.clone()),
                Some(source) => debug!(
                    "Density image changed from '{}' to '{}'; reloading.",
                    source.display(),
                    image.display()
                ),
            }
        }
        let field = Arc::new(DensityField::load(image)?);
        self.density = Some(CachedDensity {
            field: field.clone(),
            source: Some(image.to_path_buf()),
        });
        Ok(field)
    }

    /// Runs the configuration over `bounds`.
    pub fn run(&mut self, bounds: Bounds, rng: &mut impl Rng) -> Result<RunResult> {
        self.run_with(bounds, rng, &(), &mut ())
    }

    /// Runs the configuration over `bounds`, polling `cancel` and reporting to `sink`.
    pub fn run_with(
        &mut self,
        bounds: Bounds,
        rng: &mut impl Rng,
        cancel: &dyn Cancellation,
        sink: &mut dyn EventSink,
    ) -> Result<RunResult> {
        let layout = check_request(&self.config, &bounds)?;
        let density = match &self.config.radius_mode {
            RadiusMode::Adaptive { image, .. } => {
                let image = image.clone();
                Some(self.density_for(&image)?)
            }
            RadiusMode::Fixed { .. } => None,
        };
        Ok(run_tiles(
            &self.config,
            bounds,
            &layout,
            density,
            rng,
            cancel,
            sink,
        ))
    }
}

/// Runs `config` over `bounds` once, loading the density image if the mode needs it.
pub fn run_scatter(
    config: &ScatterConfig,
    bounds: Bounds,
    rng: &mut impl Rng,
    cancel: &dyn Cancellation,
    sink: &mut dyn EventSink,
) -> Result<RunResult> {
    let layout = check_request(config, &bounds)?;
    let density = match &config.radius_mode {
        RadiusMode::Adaptive { image, .. } => Some(Arc::new(DensityField::load(image)?)),
        RadiusMode::Fixed { .. } => None,
    };
    Ok(run_tiles(config, bounds, &layout, density, rng, cancel, sink))
}

/// Validates a request and lays out its tiles.
fn check_request(config: &ScatterConfig, bounds: &Bounds) -> Result<SegmentLayout> {
    config.validate()?;
    bounds.validate()?;
    if !bounds.is_square() {
        return Err(Error::InvalidConfig(format!(
            "bounds must be square, got {} x {}",
            bounds.width(),
            bounds.height()
        )));
    }
    SegmentLayout::new(bounds, config.max_segment_width)
}

fn run_tiles(
    config: &ScatterConfig,
    bounds: Bounds,
    layout: &SegmentLayout,
    density: Option<Arc<DensityField>>,
    rng: &mut dyn Rng,
    cancel: &dyn Cancellation,
    sink: &mut dyn EventSink,
) -> RunResult {
    let tiles = match config.partial {
        Some(partial) => layout.part_tiles(&bounds, partial),
        None => layout.tiles(&bounds),
    };
    info!(
        "Scattering {} of {} tiles ({}x{}, segment size {}).",
        tiles.len(),
        layout.total(),
        layout.x_segments(),
        layout.y_segments(),
        layout.segment_size()
    );

    let mut result = RunResult::empty(bounds, config.radius_mode.clone(), density);
    result.tiles_total = tiles.len();

    if sink.wants(ScatterEventKind::RunStarted) {
        sink.send(ScatterEvent::RunStarted {
            config: config.clone(),
            bounds,
            tile_count: tiles.len(),
            total_tiles: layout.total() as usize,
        });
    }

    for (index, tile) in tiles.iter().enumerate() {
        if cancel.is_cancelled() {
            result.status = RunStatus::Cancelled;
            break;
        }
        if sink.wants(ScatterEventKind::TileStarted) {
            sink.send(ScatterEvent::TileStarted { index, tile: *tile });
        }

        let samples = match (&config.radius_mode, result.density.as_deref()) {
            (RadiusMode::Fixed { radius }, _) => sample_tile(
                tile.bounds,
                &FixedRadius(*radius),
                &config.sampler,
                rng,
                cancel,
            ),
            (RadiusMode::Adaptive { thresholds, .. }, Some(field)) => {
                let radius = DensityRadius::new(field, tile.bounds, tile.partition, *thresholds);
                sample_tile(tile.bounds, &radius, &config.sampler, rng, cancel)
            }
            (RadiusMode::Adaptive { .. }, None) => {
                warn_missing_density(tile, sink);
                continue;
            }
        };
        result.tiles_processed += 1;
        result.darts += samples.darts;

        if sink.wants(ScatterEventKind::LevelCompleted) {
            for stats in &samples.levels {
                sink.send(ScatterEvent::LevelCompleted {
                    tile_index: index,
                    stats: *stats,
                });
            }
        }
        debug!(
            "Tile ({}, {}) accepted {} samples from {} darts.",
            tile.column,
            tile.row,
            samples.len(),
            samples.darts
        );
        if sink.wants(ScatterEventKind::TileFinished) {
            sink.send(ScatterEvent::TileFinished {
                index,
                accepted: samples.len(),
                darts: samples.darts,
            });
        }

        let cancelled = samples.status.is_cancelled();
        result.positions.extend(samples.positions);
        result.radii.extend(samples.radii);
        if cancelled {
            result.status = RunStatus::Cancelled;
            break;
        }
    }

    if result.status.is_cancelled() {
        warn!(
            "Scatter cancelled after {} of {} tiles with {} samples.",
            result.tiles_processed,
            result.tiles_total,
            result.positions.len()
        );
        if sink.wants(ScatterEventKind::Cancelled) {
            sink.send(ScatterEvent::Cancelled {
                tiles_processed: result.tiles_processed,
                positions: result.positions.len(),
            });
        }
    }

    if sink.wants(ScatterEventKind::RunFinished) {
        sink.send(ScatterEvent::RunFinished {
            summary: result.summary(),
        });
    }

    result
}

fn warn_missing_density(tile: &Tile, sink: &mut dyn EventSink) {
    warn!(
        "No density field for tile ({}, {}); skipping.",
        tile.column, tile.row
    );
    if sink.wants(ScatterEventKind::Warning) {
        sink.send(ScatterEvent::Warning {
            context: format!("tile:{},{}", tile.column, tile.row),
            message: "Adaptive mode without a density field; tile skipped".into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::scatter::events::VecSink;

    fn gradient_field() -> Arc<DensityField> {
        Arc::new(DensityField::from_fn(16, 16, |x, _| (x * 16) as u8).expect("valid field"))
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(ScatterConfig::fixed(5.0).validate().is_ok());
        assert!(ScatterConfig::fixed(0.0).validate().is_err());
        assert!(ScatterConfig::fixed(f32::NAN).validate().is_err());
        assert!(ScatterConfig::fixed(5.0)
            .with_max_tries(0)
            .validate()
            .is_err());
        assert!(ScatterConfig::fixed(5.0)
            .with_max_segment_width(0.0)
            .validate()
            .is_err());
        assert!(ScatterConfig::fixed(5.0)
            .with_partial(PartialGeneration::new(2, 2))
            .validate()
            .is_err());
        assert!(
            ScatterConfig::adaptive("density.png", RadiusThresholds::new(10.0, 5.0))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn builder_routes_max_tries_to_sampler() {
        let config = ScatterConfig::fixed(2.0)
            .with_max_tries(12)
            .with_schedule(Schedule::LevelSynchronous);
        assert_eq!(config.max_tries(), 12);
        assert_eq!(config.sampler.schedule, Schedule::LevelSynchronous);
        assert_eq!(config.max_segment_width, DEFAULT_MAX_SEGMENT_WIDTH);
    }

    #[test]
    fn try_new_validates() {
        assert!(ScatterRunner::try_new(ScatterConfig::fixed(-1.0)).is_err());
        assert!(ScatterRunner::try_new(ScatterConfig::fixed(1.0)).is_ok());
    }

    #[test]
    fn non_square_bounds_are_rejected() {
        let mut runner = ScatterRunner::new(ScatterConfig::fixed(10.0));
        let mut rng = StdRng::seed_from_u64(1);
        let err = runner
            .run(Bounds::new(0.0, 0.0, 100.0, 50.0), &mut rng)
            .expect_err("non-square bounds");
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn fixed_run_reports_summary() {
        let mut runner = ScatterRunner::new(ScatterConfig::fixed(10.0).with_max_segment_width(50.0));
        let mut rng = StdRng::seed_from_u64(3);
        let mut sink = VecSink::new();
        let result = runner
            .run_with(Bounds::new(0.0, 0.0, 100.0, 100.0), &mut rng, &(), &mut sink)
            .expect("run succeeds");

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(result.tiles_total, 4);
        assert_eq!(result.tiles_processed, 4);
        assert_eq!(result.positions.len(), result.radii.len());
        assert!(result.radii.iter().all(|&r| r == 10.0));
        assert_eq!(result.radius_at(Vec2::new(3.0, 3.0)), Some(10.0));

        let events = sink.into_inner();
        assert!(matches!(
            events.first(),
            Some(ScatterEvent::RunStarted { tile_count: 4, .. })
        ));
        let finished = events
            .iter()
            .filter(|e| matches!(e, ScatterEvent::TileFinished { .. }))
            .count();
        assert_eq!(finished, 4);
        match events.last() {
            Some(ScatterEvent::RunFinished { summary }) => {
                assert_eq!(summary.positions, result.positions.len());
            }
            other => panic!("unexpected last event {other:?}"),
        }
    }

    #[test]
    fn adaptive_run_uses_provided_density() {
        let field = gradient_field();
        let config = ScatterConfig::adaptive("unused.png", RadiusThresholds::new(4.0, 12.0));
        let mut runner = ScatterRunner::new(config).with_density_field(field.clone());
        let mut rng = StdRng::seed_from_u64(5);
        let bounds = Bounds::new(0.0, 0.0, 160.0, 160.0);
        let result = runner.run(bounds, &mut rng).expect("run succeeds");

        assert!(!result.is_empty());
        assert!(result.density.is_some());
        assert_eq!(result.intensity_at(Vec2::new(5.0, 5.0)), Some(0));
        assert_eq!(result.radius_at(Vec2::new(5.0, 5.0)), Some(4.0));
        for (p, r) in result.positions.iter().zip(&result.radii) {
            assert_eq!(result.radius_at(*p), Some(*r));
        }
    }

    #[test]
    fn missing_image_fails_before_sampling() {
        let config = ScatterConfig::adaptive(
            "/definitely/not/here/density.png",
            RadiusThresholds::default(),
        );
        let mut runner = ScatterRunner::new(config);
        let mut sink = VecSink::new();
        let mut rng = StdRng::seed_from_u64(1);
        let err = runner
            .run_with(Bounds::new(0.0, 0.0, 100.0, 100.0), &mut rng, &(), &mut sink)
            .expect_err("image is missing");
        assert!(matches!(err, Error::ImageNotFound { .. }));
        assert!(sink.is_empty());
        assert!(runner.density_field().is_none());
    }

    #[test]
    fn cancelled_before_first_tile_returns_empty() {
        let mut runner = ScatterRunner::new(ScatterConfig::fixed(5.0));
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::only([ScatterEventKind::Cancelled]);
        let cancel = std::sync::atomic::AtomicBool::new(true);
        let result = runner
            .run_with(
                Bounds::new(0.0, 0.0, 50.0, 50.0),
                &mut rng,
                &cancel,
                &mut sink,
            )
            .expect("run succeeds");
        assert_eq!(result.status, RunStatus::Cancelled);
        assert!(result.is_empty());
        assert_eq!(result.tiles_processed, 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn flat_positions_interleave_coordinates() {
        let mut result = RunResult::empty(
            Bounds::new(0.0, 0.0, 1.0, 1.0),
            RadiusMode::Fixed { radius: 1.0 },
            None,
        );
        result.positions = vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)];
        assert_eq!(result.flat_positions(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(result.positions_mint()[1].y, 4.0);
        assert_eq!(result.intensity_at(Vec2::ZERO), None);
    }

    fn flat_png(dir: &tempfile::TempDir, name: &str, value: u8) -> PathBuf {
        let path = dir.path().join(name);
        image::GrayImage::from_pixel(8, 8, image::Luma([value]))
            .save(&path)
            .expect("png written");
        path
    }

    #[test]
    fn switching_density_image_reloads_cache() {
        let dir = tempfile::tempdir().expect("temp dir");
        let black = flat_png(&dir, "black.png", 0);
        let white = flat_png(&dir, "white.png", 255);
        let thresholds = RadiusThresholds::new(2.0, 8.0);
        let bounds = Bounds::new(0.0, 0.0, 40.0, 40.0);
        let center = Vec2::new(20.0, 20.0);

        let mut runner = ScatterRunner::new(ScatterConfig::adaptive(&black, thresholds));
        let mut rng = StdRng::seed_from_u64(3);
        let first = runner
            .run_with(bounds, &mut rng, &(), &mut ())
            .expect("black run");
        assert_eq!(first.radius_at(center), Some(2.0));

        runner.config = ScatterConfig::adaptive(&white, thresholds);
        let second = runner
            .run_with(bounds, &mut rng, &(), &mut ())
            .expect("white run");
        assert_eq!(second.radius_at(center), Some(8.0));
        let cached = runner.density_field().expect("cached field");
        assert!(Arc::ptr_eq(cached, second.density.as_ref().expect("density")));
    }

    #[test]
    fn injected_density_survives_config_change() {
        let dir = tempfile::tempdir().expect("temp dir");
        let white = flat_png(&dir, "white.png", 255);
        let field = gradient_field();
        let mut runner = ScatterRunner::new(ScatterConfig::adaptive(
            "/not/loaded.png",
            RadiusThresholds::new(2.0, 8.0),
        ))
        .with_density_field(field.clone());
        runner.config = ScatterConfig::adaptive(&white, RadiusThresholds::new(2.0, 8.0));
        let mut rng = StdRng::seed_from_u64(4);
        let result = runner
            .run_with(Bounds::new(0.0, 0.0, 40.0, 40.0), &mut rng, &(), &mut ())
            .expect("run succeeds");
        assert!(Arc::ptr_eq(result.density.as_ref().expect("density"), &field));
    }

    #[test]
    fn oversized_tile_layout_fails_before_sampling() {
        let config = ScatterConfig::fixed(1.0).with_max_segment_width(1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut sink = VecSink::new();
        let err = run_scatter(
            &config,
            Bounds::new(0.0, 0.0, 1.0e5, 1.0e5),
            &mut rng,
            &(),
            &mut sink,
        )
        .expect_err("tile count is too large");
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(sink.is_empty());
    }
}
