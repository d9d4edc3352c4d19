//! Uniform background grid for minimum-distance queries.
//!
//! Cells are sized so that their diagonal never exceeds the smallest exclusion radius, which
//! means an accepted sample always lands in an empty cell. Each cell stores a single entry and
//! a later insert into the same cell overwrites the earlier one.
use std::f32::consts::SQRT_2;

use glam::Vec2;

use crate::bounds::Bounds;

/// A sample stored in the grid together with the radius it enforces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridEntry {
    pub position: Vec2,
    pub radius: f32,
}

/// Cell edge length for a given exclusion radius.
///
/// The exact `radius / √2` is floored to whole units once it reaches one unit; smaller values
/// are kept as-is so that fractional radii still produce a usable grid.
pub fn cell_size_for_radius(radius: f32) -> f32 {
    let exact = radius / SQRT_2;
    if exact >= 1.0 {
        exact.floor()
    } else {
        exact
    }
}

#[derive(Clone, Debug)]
pub struct SpatialGrid {
    origin: Vec2,
    bounds: Bounds,
    cell_size: f32,
    reach: usize,
    cols: usize,
    rows: usize,
    cells: Vec<Option<GridEntry>>,
}

impl SpatialGrid {
    /// Grid over `bounds` for radii in `[min_radius, max_radius]`.
    pub fn new(bounds: Bounds, min_radius: f32, max_radius: f32) -> Self {
        debug_assert!(min_radius > 0.0, "min_radius must be > 0");
        debug_assert!(max_radius >= min_radius, "max_radius must be >= min_radius");
        let cell_size = cell_size_for_radius(min_radius);
        let extent = bounds.extent();
        let cols = (extent.x / cell_size).floor() as usize + 1;
        let rows = (extent.y / cell_size).floor() as usize + 1;
        let reach = ((max_radius / cell_size).ceil() as usize).max(1);

        Self {
            origin: bounds.min(),
            bounds,
            cell_size,
            reach,
            cols,
            rows,
            cells: vec![None; cols * rows],
        }
    }

    /// Grid for a single fixed radius.
    pub fn with_radius(bounds: Bounds, radius: f32) -> Self {
        Self::new(bounds, radius, radius)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of cells checked on each side of the candidate's cell.
    pub fn reach(&self) -> usize {
        self.reach
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Number of occupied cells.
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    /// Cell containing `p`, or `None` if `p` lies outside the bounds.
    pub fn cell_of(&self, p: Vec2) -> Option<(usize, usize)> {
        if !self.bounds.contains(p) {
            return None;
        }
        let rel = (p - self.origin) / self.cell_size;
        let x = (rel.x.floor() as usize).min(self.cols - 1);
        let y = (rel.y.floor() as usize).min(self.rows - 1);
        Some((x, y))
    }

    pub fn get(&self, x: usize, y: usize) -> Option<GridEntry> {
        if x >= self.cols || y >= self.rows {
            return None;
        }
        self.cells[self.index(x, y)]
    }

    /// Stores `p` in its cell, replacing any previous occupant. Returns `false` if `p` is
    /// outside the bounds.
    pub fn insert(&mut self, p: Vec2, radius: f32) -> bool {
        match self.cell_of(p) {
            Some((x, y)) => {
                let idx = self.index(x, y);
                self.cells[idx] = Some(GridEntry {
                    position: p,
                    radius,
                });
                true
            }
            None => false,
        }
    }

    /// Returns `true` if `candidate` is inside the bounds and no stored sample is closer than
    /// the larger of `radius` and that sample's own radius.
    pub fn is_valid(&self, candidate: Vec2, radius: f32) -> bool {
        let Some((cx, cy)) = self.cell_of(candidate) else {
            return false;
        };

        let x0 = cx.saturating_sub(self.reach);
        let x1 = (cx + self.reach).min(self.cols - 1);
        let y0 = cy.saturating_sub(self.reach);
        let y1 = (cy + self.reach).min(self.rows - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                if let Some(entry) = self.cells[self.index(x, y)] {
                    let required = radius.max(entry.radius);
                    if candidate.distance_squared(entry.position) < required * required {
                        return false;
                    }
                }
            }
        }

        true
    }
}
