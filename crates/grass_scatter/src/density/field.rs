//! Decoded greyscale density images.
use std::path::Path;

use glam::Vec2;
use image::GrayImage;
use tracing::debug;

use crate::bounds::{Bounds, Orientation};
use crate::density::partition::PartitionDescriptor;
use crate::error::{Error, Result};

/// Row-major 8-bit intensities, indexed `y * width + x`.
///
/// The field is immutable once built and can be shared read-only across tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DensityField {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DensityField {
    /// Wraps raw intensities. Fails if `pixels.len() != width * height` or the image is empty.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidConfig(format!(
                "density field must not be empty, got {width}x{height}"
            )));
        }
        if pixels.len() != width as usize * height as usize {
            return Err(Error::InvalidConfig(format!(
                "density field {}x{} expects {} pixels, got {}",
                width,
                height,
                width as usize * height as usize,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds a field by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Result<Self> {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self::new(width, height, pixels)
    }

    pub fn from_luma(image: GrayImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        Self::new(width, height, image.into_raw())
    }

    /// Loads an image from disk and converts it to 8-bit greyscale.
    ///
    /// A missing file yields [`Error::ImageNotFound`] before any decoding is attempted.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::ImageNotFound {
                path: path.to_path_buf(),
            });
        }
        let image = image::open(path)?.into_luma8();
        debug!(
            "Loaded density image '{}' ({}x{}).",
            path.display(),
            image.width(),
            image.height()
        );
        Self::from_luma(image)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns `(pixels, width, height)`.
    pub fn into_parts(self) -> (Vec<u8>, u32, u32) {
        (self.pixels, self.width, self.height)
    }

    pub fn to_image(&self) -> Option<GrayImage> {
        GrayImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Intensity of pixel `(x, y)`.
    #[inline]
    pub fn intensity(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Pixel under `position`, where `bounds` is the rectangle of the tile described by
    /// `partition` and the whole image spans the union of all tiles.
    ///
    /// Pixel `(0, 0)` sits at the first corner `(x0, y0)` of the full layout. Tiles laid out
    /// with decreasing Y count their rows from the far side, so the row slice is mirrored.
    pub fn pixel_for(
        &self,
        position: Vec2,
        bounds: &Bounds,
        partition: PartitionDescriptor,
    ) -> Option<(u32, u32)> {
        let nx = partition.width_segments.max(1);
        let ny = partition.height_segments.max(1);
        let column = partition.column();
        let row = match bounds.orientation() {
            Orientation::YIncreasing => partition.row(),
            Orientation::YDecreasing => (ny - 1).checked_sub(partition.row())?,
        };

        let local = bounds.normalize(position);
        let u = (column as f32 + local.x) / nx as f32;
        let v = (row as f32 + local.y) / ny as f32;
        if !u.is_finite() || !v.is_finite() {
            return None;
        }

        let px = (u * self.width as f32).floor();
        let py = (v * self.height as f32).floor();
        if px < 0.0 || py < 0.0 || px >= self.width as f32 || py >= self.height as f32 {
            return None;
        }
        Some((px as u32, py as u32))
    }

    /// Intensity under `position`, or `None` if it maps outside the image.
    pub fn lookup(
        &self,
        position: Vec2,
        bounds: &Bounds,
        partition: PartitionDescriptor,
    ) -> Option<u8> {
        let (x, y) = self.pixel_for(position, bounds, partition)?;
        self.intensity(x, y)
    }
}
