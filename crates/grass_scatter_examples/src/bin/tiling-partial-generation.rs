use grass_scatter::prelude::*;
use grass_scatter_examples::{init_tracing, render_points_to_png, RenderConfig};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

const PARTS: u32 = 3;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let bounds = Bounds::new(0.0, 600.0, 600.0, 0.0);
    let base = ScatterConfig::fixed(6.0).with_max_segment_width(200.0);
    let guard = InstanceGuard::new(GuardConfig::default().with_max_instances(10_000));

    let mut total = 0;
    for part in 0..PARTS {
        let config = base.clone().with_partial(PartialGeneration::new(PARTS, part));
        let mut sink = FnSink::new(|event| {
            if let ScatterEvent::TileFinished { index, accepted, .. } = event {
                info!("part {part} tile {index}: {accepted} samples");
            }
        });
        let mut rng = StdRng::seed_from_u64(u64::from(part));
        let result = run_scatter(&config, bounds, &mut rng, &(), &mut sink)?;
        total += result.len();

        if let InstanceCheck::Exceeded { count, limit } = guard.check(total) {
            warn!("{count} instances so far exceed the limit of {limit}");
        }

        let render = RenderConfig::new((600, 600)).with_dot_radius(1);
        render_points_to_png(&result, &render, format!("tiling-partial-{part}.png"))?;
    }

    info!("{total} samples over {PARTS} parts");
    Ok(())
}
