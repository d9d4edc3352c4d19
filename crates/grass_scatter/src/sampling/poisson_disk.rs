//! Dart-throwing Poisson disk sampler for a single tile.
//!
//! Two schedules share the same acceptance rule (inside the tile, and no stored sample closer
//! than the larger of the two radii):
//!
//! - [`Schedule::Sequential`]: repeatedly pick a random active sample, throw up to `max_tries`
//!   darts into the annulus `[r, 2r)` around it, keep the first valid one, and retire the
//!   sample if none is valid.
//! - [`Schedule::LevelSynchronous`]: every real node of the [`QuadTree`] proposes one dart in
//!   parallel against a read-only grid; proposals are then committed serially in frontier
//!   order and re-validated, so two proposals of the same level never violate the radius.
//!   A node without a proposal is retired. The run ends when a level has no real nodes.
//!
//! Both schedules poll the cancellation signal before every step or level.
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::bounds::Bounds;
use crate::cancel::{Cancellation, RunStatus};
use crate::sampling::grid::SpatialGrid;
use crate::sampling::quadtree::{NodeId, QuadNode, QuadTree, Quadrant};
use crate::sampling::radius::RadiusField;
use crate::sampling::{
    annulus_distance, mix_seed, next_down, rand01, rand_index, SamplerConfig, Schedule, SeedPoint,
};

/// Accepted samples of one tile.
#[derive(Clone, Debug, Default)]
pub struct TileSamples {
    /// Accepted positions in acceptance order.
    pub positions: Vec<Vec2>,
    /// Radius enforced around each position, parallel to `positions`.
    pub radii: Vec<f32>,
    pub status: RunStatus,
    /// Per-level statistics; empty for the sequential schedule.
    pub levels: Vec<LevelStats>,
    /// Total darts thrown.
    pub darts: usize,
}

impl TileSamples {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Outcome of one level of the level-synchronous schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelStats {
    pub level: u32,
    /// Real nodes that proposed during this level.
    pub frontier: usize,
    /// Proposals that survived the commit phase.
    pub accepted: usize,
}

#[derive(Clone, Copy, Debug)]
struct Proposal {
    quadrant: Quadrant,
    position: Vec2,
    radius: f32,
}

pub struct PoissonDiskSampler<'a> {
    bounds: Bounds,
    field: &'a dyn RadiusField,
    config: &'a SamplerConfig,
    grid: SpatialGrid,
    out: TileSamples,
}

impl<'a> PoissonDiskSampler<'a> {
    pub fn new(bounds: Bounds, field: &'a dyn RadiusField, config: &'a SamplerConfig) -> Self {
        debug_assert!(field.min_radius() > 0.0, "radius must be > 0");
        let grid = SpatialGrid::new(bounds, field.min_radius(), field.max_radius());
        Self {
            bounds,
            field,
            config,
            grid,
            out: TileSamples::default(),
        }
    }

    /// Runs the configured schedule until the active set is empty or `cancel` fires.
    pub fn run(mut self, rng: &mut dyn Rng, cancel: &dyn Cancellation) -> TileSamples {
        let seed = self.seed_position(rng);
        let Some(seed_radius) = self.field.radius_at(seed) else {
            debug!(
                "Seed {:?} of tile {:?} has no radius; tile left empty.",
                seed, self.bounds
            );
            return self.out;
        };
        self.accept(seed, seed_radius);

        match self.config.schedule {
            Schedule::Sequential => self.run_sequential(seed, seed_radius, rng, cancel),
            Schedule::LevelSynchronous => self.run_levels(seed, seed_radius, rng, cancel),
        }

        self.out
    }

    fn seed_position(&self, rng: &mut dyn Rng) -> Vec2 {
        match self.config.seed_point {
            SeedPoint::Center => self.bounds.center(),
            SeedPoint::Random => {
                let min = self.bounds.min();
                let max = self.bounds.max();
                let extent = max - min;
                Vec2::new(
                    (min.x + rand01(rng) * extent.x).min(next_down(max.x)),
                    (min.y + rand01(rng) * extent.y).min(next_down(max.y)),
                )
            }
            SeedPoint::Fixed { x, y } => {
                let p = Vec2::new(x, y);
                if self.bounds.contains(p) {
                    p
                } else {
                    self.bounds.center()
                }
            }
        }
    }

    fn accept(&mut self, position: Vec2, radius: f32) {
        self.grid.insert(position, radius);
        self.out.positions.push(position);
        self.out.radii.push(radius);
    }

    fn run_sequential(
        &mut self,
        seed: Vec2,
        seed_radius: f32,
        rng: &mut dyn Rng,
        cancel: &dyn Cancellation,
    ) {
        let mut active: Vec<(Vec2, f32)> = vec![(seed, seed_radius)];

        while !active.is_empty() {
            if cancel.is_cancelled() {
                self.out.status = RunStatus::Cancelled;
                return;
            }

            let pick = rand_index(rng, active.len());
            let (origin, radius) = active[pick];
            let mut found = None;

            for _ in 0..self.config.max_tries {
                self.out.darts += 1;
                let theta = self.config.angle.angle(rng);
                let distance = annulus_distance(rng, radius);
                let candidate = Vec2::new(
                    origin.x + theta.cos() * distance,
                    origin.y + theta.sin() * distance,
                );
                if let Some(r) = validate(&self.grid, self.field, candidate) {
                    found = Some((candidate, r));
                    break;
                }
            }

            match found {
                Some((p, r)) => {
                    self.accept(p, r);
                    active.push((p, r));
                }
                None => {
                    active.swap_remove(pick);
                }
            }
        }
    }

    fn run_levels(
        &mut self,
        seed: Vec2,
        seed_radius: f32,
        rng: &mut dyn Rng,
        cancel: &dyn Cancellation,
    ) {
        let mut tree = QuadTree::new(&self.bounds, seed, seed_radius);
        let mut frontier: Vec<NodeId> = tree.real_nodes().collect();
        let mut level = 0u32;

        while !frontier.is_empty() {
            if cancel.is_cancelled() {
                self.out.status = RunStatus::Cancelled;
                return;
            }

            let base = rng.next_u64();
            let proposals: Vec<(Option<Proposal>, usize)> = {
                let grid = &self.grid;
                let field = self.field;
                let config = self.config;
                let tree = &tree;
                frontier
                    .par_iter()
                    .map(|&id| {
                        let mut local = StdRng::seed_from_u64(mix_seed(base, id.index() as u64));
                        propose(tree.node(id), grid, field, config, &mut local)
                    })
                    .collect()
            };

            let mut survivors = Vec::with_capacity(frontier.len());
            let mut children = Vec::new();
            let mut accepted = 0;

            for (&id, (proposal, darts)) in frontier.iter().zip(proposals) {
                self.out.darts += darts;
                match proposal {
                    Some(p) => {
                        if self.grid.is_valid(p.position, p.radius) {
                            self.accept(p.position, p.radius);
                            accepted += 1;
                            if let Some(child) = tree.attach(id, p.quadrant, p.position, p.radius)
                            {
                                if tree.node(child).is_real() {
                                    children.push(child);
                                }
                            }
                        }
                    }
                    None => tree.retire(id),
                }
                if tree.node(id).is_real() {
                    survivors.push(id);
                }
            }

            self.out.levels.push(LevelStats {
                level,
                frontier: frontier.len(),
                accepted,
            });

            survivors.extend(children);
            frontier = survivors;
            level += 1;
        }

        debug!(
            "Quad-tree finished with {} nodes over {} levels.",
            tree.len(),
            tree.depth()
        );
    }
}

/// Returns the radius at `candidate` if it may be accepted.
#[inline]
fn validate(grid: &SpatialGrid, field: &dyn RadiusField, candidate: Vec2) -> Option<f32> {
    let radius = field.radius_at(candidate)?;
    grid.is_valid(candidate, radius).then_some(radius)
}

/// Throws up to `max_tries` darts around `node` into its open quadrants.
fn propose(
    node: &QuadNode,
    grid: &SpatialGrid,
    field: &dyn RadiusField,
    config: &SamplerConfig,
    rng: &mut dyn Rng,
) -> (Option<Proposal>, usize) {
    let open = node.open_quadrants();
    if open.is_empty() {
        return (None, 0);
    }

    for attempt in 0..config.max_tries as usize {
        let theta = config.angle.angle(rng);
        let distance = annulus_distance(rng, node.radius);
        let candidate = Vec2::new(
            node.position.x + theta.cos() * distance,
            node.position.y + theta.sin() * distance,
        );
        let quadrant = Quadrant::of(node.position, candidate);
        if !open.contains(&quadrant) {
            continue;
        }
        if let Some(radius) = validate(grid, field, candidate) {
            return (
                Some(Proposal {
                    quadrant,
                    position: candidate,
                    radius,
                }),
                attempt + 1,
            );
        }
    }

    (None, config.max_tries as usize)
}

/// Samples `bounds` with the exclusion radius given by `field`.
///
/// Returns an empty result if the field's radius is not a positive finite number.
pub fn sample_tile(
    bounds: Bounds,
    field: &dyn RadiusField,
    config: &SamplerConfig,
    rng: &mut dyn Rng,
    cancel: &dyn Cancellation,
) -> TileSamples {
    let (min_r, max_r) = (field.min_radius(), field.max_radius());
    if !min_r.is_finite() || !max_r.is_finite() || min_r <= 0.0 || max_r < min_r {
        return TileSamples::default();
    }
    if bounds.validate().is_err() {
        return TileSamples::default();
    }
    PoissonDiskSampler::new(bounds, field, config).run(rng, cancel)
}
