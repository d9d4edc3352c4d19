use std::time::Instant;

use grass_scatter::prelude::*;
use grass_scatter_examples::{init_tracing, render_points_to_png, RenderConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let bounds = Bounds::new(0.0, 0.0, 500.0, 500.0);

    for (schedule, name) in [
        (Schedule::Sequential, "sequential"),
        (Schedule::LevelSynchronous, "level-sync"),
    ] {
        let config = ScatterConfig::fixed(2.5).with_schedule(schedule);
        let mut runner = ScatterRunner::try_new(config)?;
        let mut rng = StdRng::seed_from_u64(1234);
        let mut levels = VecSink::only([ScatterEventKind::LevelCompleted]);

        let start = Instant::now();
        let result = runner.run_with(bounds, &mut rng, &(), &mut levels)?;
        info!(
            "{name}: {} samples, {} darts, {} levels in {:?}",
            result.len(),
            result.darts,
            levels.len(),
            start.elapsed()
        );

        let render = RenderConfig::new((1000, 1000)).with_dot_radius(1);
        render_points_to_png(&result, &render, format!("schedules-{name}.png"))?;
    }
    Ok(())
}
