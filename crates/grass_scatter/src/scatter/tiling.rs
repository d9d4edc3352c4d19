//! Splitting large bounds into independently sampled tiles.
//!
//! The larger side of the bounds decides the tile size: it is cut into
//! `max(1, round(side / max_segment_width))` equal segments, and the smaller side uses as many
//! segments of that same size as it rounds to. Tiles never share sampling state, so samples on
//! either side of a tile border are not checked against each other.
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, Orientation};
use crate::density::PartitionDescriptor;
use crate::error::{Error, Result};

/// Selects a contiguous slice of the tile list for one of several invocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartialGeneration {
    pub amount_of_parts: u32,
    pub part_index: u32,
}

impl PartialGeneration {
    pub fn new(amount_of_parts: u32, part_index: u32) -> Self {
        Self {
            amount_of_parts,
            part_index,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.amount_of_parts == 0 {
            return Err(Error::InvalidConfig("amount_of_parts must be > 0".into()));
        }
        if self.part_index >= self.amount_of_parts {
            return Err(Error::InvalidConfig(format!(
                "part_index {} out of range for {} parts",
                self.part_index, self.amount_of_parts
            )));
        }
        Ok(())
    }
}

/// One tile of a [`SegmentLayout`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub column: u32,
    pub row: u32,
    pub bounds: Bounds,
    pub partition: PartitionDescriptor,
}

/// Number of segments for one side.
pub fn segments_for(dimension: f32, max_segment_width: f32) -> u32 {
    let n = (dimension / max_segment_width).round();
    if n.is_finite() && n >= 1.0 {
        n as u32
    } else {
        1
    }
}

/// Upper limit on the number of tiles in one layout.
pub const MAX_TILES: u64 = 1 << 20;

/// Tile grid over square-ish bounds. Built through [`SegmentLayout::new`], which rejects
/// layouts with more than [`MAX_TILES`] tiles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentLayout {
    x_segments: u32,
    y_segments: u32,
    segment_size: f32,
    width: f32,
    height: f32,
}

impl SegmentLayout {
    pub fn new(bounds: &Bounds, max_segment_width: f32) -> Result<Self> {
        if !max_segment_width.is_finite() || max_segment_width <= 0.0 {
            return Err(Error::InvalidConfig(
                "max_segment_width must be a positive finite number".into(),
            ));
        }
        let mut width = bounds.width();
        let mut height = bounds.height();

        let (x_segments, y_segments, segment_size);
        if height > width {
            y_segments = segments_for(height, max_segment_width);
            segment_size = height / y_segments as f32;
            x_segments = segments_for(width, max_segment_width);
            width = segment_size * x_segments as f32;
        } else {
            x_segments = segments_for(width, max_segment_width);
            segment_size = width / x_segments as f32;
            y_segments = segments_for(height, max_segment_width);
            height = segment_size * y_segments as f32;
        }

        let total = u64::from(x_segments) * u64::from(y_segments);
        if total > MAX_TILES {
            return Err(Error::InvalidConfig(format!(
                "{x_segments} x {y_segments} tiles exceed the limit of {MAX_TILES}; \
                 increase max_segment_width"
            )));
        }

        Ok(Self {
            x_segments,
            y_segments,
            segment_size,
            width,
            height,
        })
    }

    pub fn x_segments(&self) -> u32 {
        self.x_segments
    }

    pub fn y_segments(&self) -> u32 {
        self.y_segments
    }

    pub fn segment_size(&self) -> f32 {
        self.segment_size
    }

    /// Side lengths after the smaller side was snapped to whole segments.
    pub fn extent(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn total(&self) -> u32 {
        self.x_segments * self.y_segments
    }

    /// Rectangle of segment `(column, row)`, offset from the corners of `bounds` in the
    /// direction its Y orientation dictates.
    pub fn sub_bounds(&self, bounds: &Bounds, column: u32, row: u32) -> Bounds {
        let s = self.segment_size;
        let i = column as f32;
        let j = row as f32;
        let from_far_x = (self.x_segments - 1 - column) as f32;
        let from_far_y = (self.y_segments - 1 - row) as f32;

        match bounds.orientation() {
            Orientation::YIncreasing => Bounds::new(
                bounds.x0 + i * s,
                bounds.y0 + j * s,
                bounds.x1 - from_far_x * s,
                bounds.y1 - from_far_y * s,
            ),
            Orientation::YDecreasing => Bounds::new(
                bounds.x0 + i * s,
                bounds.y0 - from_far_y * s,
                bounds.x1 - from_far_x * s,
                bounds.y1 + j * s,
            ),
        }
    }

    pub fn tile(&self, bounds: &Bounds, column: u32, row: u32) -> Tile {
        Tile {
            column,
            row,
            bounds: self.sub_bounds(bounds, column, row),
            partition: PartitionDescriptor::for_tile(
                self.x_segments,
                self.y_segments,
                column,
                row,
            ),
        }
    }

    /// All tiles, columns outermost.
    pub fn tiles(&self, bounds: &Bounds) -> Vec<Tile> {
        let mut tiles = Vec::with_capacity(self.total() as usize);
        for i in 0..self.x_segments {
            for j in 0..self.y_segments {
                tiles.push(self.tile(bounds, i, j));
            }
        }
        tiles
    }

    /// Linear tile range `[round(k·t/p), round((k+1)·t/p))` of part `k`, where the number of
    /// parts `p` is clamped to the tile count `t`.
    pub fn part_range(&self, partial: PartialGeneration) -> Range<u32> {
        let total = self.total();
        let parts = partial.amount_of_parts.clamp(1, total);
        let part_size = total as f32 / parts as f32;
        let lower = ((partial.part_index as f32 * part_size).round() as u32).min(total);
        let upper = (((partial.part_index + 1) as f32 * part_size).round() as u32).min(total);
        lower..upper.max(lower)
    }

    /// Tiles of one part, in linear order `k` with `column = k mod x_segments`.
    pub fn part_tiles(&self, bounds: &Bounds, partial: PartialGeneration) -> Vec<Tile> {
        self.part_range(partial)
            .map(|k| self.tile(bounds, k % self.x_segments, k / self.x_segments))
            .collect()
    }
}

/// Splits `bounds` into tiles no wider than roughly `max_segment_width`.
pub fn tile(bounds: &Bounds, max_segment_width: f32) -> Result<Vec<Bounds>> {
    let layout = SegmentLayout::new(bounds, max_segment_width)?;
    Ok(layout.tiles(bounds).into_iter().map(|t| t.bounds).collect())
}
