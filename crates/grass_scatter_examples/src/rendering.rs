use std::path::Path;

use glam::Vec2;
use grass_scatter::bounds::Bounds;
use grass_scatter::density::DensityField;
use grass_scatter::scatter::runner::RunResult;
use image::{GrayImage, Rgb, RgbImage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// How points are drawn into the output image.
#[derive(Clone, Debug)]
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub background: [u8; 3],
    pub color: [u8; 3],
    /// Dot radius in pixels.
    pub dot_radius: i32,
    /// Draw the density image underneath the points when the run has one.
    pub show_density: bool,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32)) -> Self {
        Self {
            image_size,
            background: [235, 235, 225],
            color: [40, 120, 40],
            dot_radius: 2,
            show_density: true,
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    pub fn with_color(mut self, color: [u8; 3]) -> Self {
        self.color = color;
        self
    }

    pub fn with_dot_radius(mut self, dot_radius: i32) -> Self {
        self.dot_radius = dot_radius;
        self
    }

    pub fn with_density(mut self, show_density: bool) -> Self {
        self.show_density = show_density;
        self
    }
}

/// Renders the samples of `result` over its bounds and writes a PNG to `out`.
pub fn render_points_to_png(
    result: &RunResult,
    config: &RenderConfig,
    out: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = config.image_size;
    let mut img = RgbImage::from_pixel(w, h, Rgb(config.background));

    if config.show_density {
        if let Some(density) = &result.density {
            paint_density(&mut img, density, &result.bounds);
        }
    }

    for p in &result.positions {
        let (px, py) = to_pixel(*p, &result.bounds, (w, h));
        draw_disk(&mut img, px, py, config.dot_radius, Rgb(config.color));
    }

    let out = out.as_ref();
    img.save(out)?;
    info!(
        "Wrote {} samples to '{}' ({}x{}).",
        result.len(),
        out.display(),
        w,
        h
    );
    Ok(())
}

/// Writes a greyscale PNG whose pixel `(x, y)` is `f(x, y)`.
pub fn write_density_png(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    f: impl Fn(u32, u32) -> u8,
) -> anyhow::Result<()> {
    let img = GrayImage::from_fn(width, height, |x, y| image::Luma([f(x, y)]));
    img.save(path.as_ref())?;
    Ok(())
}

/// Pixel `(0, 0)` is the first corner of `bounds`, matching density lookups.
fn to_pixel(p: Vec2, bounds: &Bounds, size: (u32, u32)) -> (i32, i32) {
    let local = bounds.normalize(p);
    (
        (local.x * size.0 as f32).floor() as i32,
        (local.y * size.1 as f32).floor() as i32,
    )
}

fn paint_density(img: &mut RgbImage, density: &DensityField, bounds: &Bounds) {
    let (w, h) = img.dimensions();
    let first = bounds.first_corner();
    let second = bounds.second_corner();
    for y in 0..h {
        for x in 0..w {
            let world = Vec2::new(
                first.x + (x as f32 + 0.5) / w as f32 * (second.x - first.x),
                first.y + (y as f32 + 0.5) / h as f32 * (second.y - first.y),
            );
            if let Some(v) = density.lookup(world, bounds, Default::default()) {
                let shade = 128 + v / 2;
                img.put_pixel(x, y, Rgb([shade, shade, shade]));
            }
        }
    }
}

fn draw_disk(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (w, h) = img.dimensions();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as u32) < w && (y as u32) < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
