//! Tile-to-image slice mapping.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifies tile `index = column + width_segments * row` of a `width_segments` by
/// `height_segments` layout. Only density lookups use it; sample geometry does not depend on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PartitionDescriptor {
    pub width_segments: u32,
    pub height_segments: u32,
    pub index: u32,
}

impl Default for PartitionDescriptor {
    fn default() -> Self {
        Self::WHOLE
    }
}

impl PartitionDescriptor {
    /// The whole image mapped onto the whole bounds.
    pub const WHOLE: Self = Self {
        width_segments: 1,
        height_segments: 1,
        index: 0,
    };

    pub fn new(width_segments: u32, height_segments: u32, index: u32) -> Self {
        Self {
            width_segments,
            height_segments,
            index,
        }
    }

    /// Descriptor for the tile at `(column, row)`.
    pub fn for_tile(width_segments: u32, height_segments: u32, column: u32, row: u32) -> Self {
        Self::new(width_segments, height_segments, column + width_segments * row)
    }

    pub fn column(&self) -> u32 {
        self.index % self.width_segments.max(1)
    }

    pub fn row(&self) -> u32 {
        self.index / self.width_segments.max(1)
    }

    pub fn segment_count(&self) -> u32 {
        self.width_segments * self.height_segments
    }

    pub fn validate(&self) -> Result<()> {
        if self.width_segments == 0 || self.height_segments == 0 {
            return Err(Error::InvalidConfig(
                "partition needs at least one segment per axis".into(),
            ));
        }
        if self.index >= self.segment_count() {
            return Err(Error::InvalidConfig(format!(
                "partition index {} out of range for {}x{} segments",
                self.index, self.width_segments, self.height_segments
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_decomposes_row_major() {
        let p = PartitionDescriptor::for_tile(3, 2, 2, 1);
        assert_eq!(p.index, 5);
        assert_eq!(p.column(), 2);
        assert_eq!(p.row(), 1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range_index() {
        assert!(PartitionDescriptor::new(2, 2, 4).validate().is_err());
        assert!(PartitionDescriptor::new(0, 2, 0).validate().is_err());
        assert!(PartitionDescriptor::WHOLE.validate().is_ok());
    }
}
