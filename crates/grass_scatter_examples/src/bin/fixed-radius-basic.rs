use grass_scatter::prelude::*;
use grass_scatter_examples::{init_tracing, render_points_to_png, RenderConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let bounds = Bounds::new(0.0, 0.0, 100.0, 100.0);
    let config = ScatterConfig::fixed(3.0).with_max_tries(30);

    let mut runner = ScatterRunner::try_new(config)?;
    let mut rng = StdRng::seed_from_u64(42);
    let result = runner.run(bounds, &mut rng)?;

    let render = RenderConfig::new((800, 800)).with_dot_radius(3);
    render_points_to_png(&result, &render, "fixed-radius-basic.png")?;
    Ok(())
}
