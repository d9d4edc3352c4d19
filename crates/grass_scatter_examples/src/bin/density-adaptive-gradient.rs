use grass_scatter::prelude::*;
use grass_scatter_examples::{
    init_tracing, render_points_to_png, write_density_png, RenderConfig,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    // Dark on the left, bright on the right, with a dark disk in the middle.
    let density_path = std::env::temp_dir().join("grass-scatter-gradient.png");
    write_density_png(&density_path, 256, 256, |x, y| {
        let (dx, dy) = (x as f32 - 128.0, y as f32 - 128.0);
        if dx * dx + dy * dy < 40.0 * 40.0 {
            0
        } else {
            x as u8
        }
    })?;

    let bounds = Bounds::new(0.0, 0.0, 200.0, 200.0);
    let config = ScatterConfig::adaptive(&density_path, RadiusThresholds::new(1.5, 8.0))
        .with_max_tries(30);
    let mut runner = ScatterRunner::try_new(config)?;
    let mut rng = StdRng::seed_from_u64(7);
    let result = runner.run(bounds, &mut rng)?;

    let probe = glam::Vec2::new(100.0, 100.0);
    tracing::info!(
        "Radius at the center is {:?}, {} samples in total.",
        result.radius_at(probe),
        result.len()
    );

    let render = RenderConfig::new((800, 800)).with_dot_radius(2);
    render_points_to_png(&result, &render, "density-adaptive-gradient.png")?;
    Ok(())
}
