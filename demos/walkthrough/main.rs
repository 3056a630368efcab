//! Wallcraft walkthrough: build a small floor plan, cut its openings, then
//! push-pull a face and consume a cutting panel.
//!
//! Usage:
//! ```text
//! cargo run --example walkthrough
//! RUST_LOG=wallcraft=debug cargo run --example walkthrough
//! ```

use std::error::Error;

use wallcraft::graph::OpeningParams;
use wallcraft::math::{Isometry3, Point2, Point3};
use wallcraft::operations::creation::MakeBox;
use wallcraft::operations::query::Volume;
use wallcraft::pushpull::{LocalExtrusion, ReleaseOutcome};
use wallcraft::{ObjectKind, PushPullEngine, Scene, SolidConfig, SolidGenerator, WallGraph};

fn main() -> Result<(), Box<dyn Error>> {
    // Default: WARN for everything, INFO for wallcraft.
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("walkthrough=info".parse()?)
        .add_directive("wallcraft=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // U-shaped room with a door and a window.
    let mut graph = WallGraph::new();
    let a = graph.add_node(Point2::new(0.0, 0.0))?;
    let b = graph.add_node(Point2::new(0.0, 300.0))?;
    let c = graph.add_node(Point2::new(300.0, 300.0))?;
    let d = graph.add_node(Point2::new(300.0, 0.0))?;
    let left = graph.add_wall(a, b, 10.0)?;
    graph.add_wall(b, c, 10.0)?;
    let right = graph.add_wall(c, d, 10.0)?;
    graph.add_opening(left, OpeningParams::door(150.0, 80.0, 210.0))?;
    graph.add_opening(right, OpeningParams::window(150.0, 120.0, 100.0, 90.0))?;

    let solids = SolidGenerator::new(&graph, SolidConfig::default()).execute()?;
    let mut scene = Scene::new();
    for solid in solids {
        tracing::info!(
            wall = ?solid.wall,
            triangles = solid.mesh.triangle_count(),
            openings = solid.placements.len(),
            recovered = solid.errors.len(),
            "wall solid"
        );
        scene.insert(solid.mesh, ObjectKind::Extrudable);
    }

    // Pull the top of a free-standing block up by 50.
    let block = scene.insert(
        MakeBox::new(Point3::new(400.0, 0.0, 0.0), Point3::new(500.0, 100.0, 50.0)).execute()?,
        ObjectKind::Extrudable,
    );
    let mut engine = PushPullEngine::default();
    let top = top_triangle(&scene, block)?;
    engine.hover(&scene, block, top)?;
    engine.press(&scene)?;
    engine.update(&mut scene, 50.0)?;
    if let ReleaseOutcome::Replaced { superseded, .. } = engine.release(&mut scene, &LocalExtrusion::default())? {
        tracing::info!(
            before = Volume::new(&superseded).execute(),
            after = Volume::new(&scene.get(block)?.mesh).execute(),
            "block re-extruded"
        );
    }

    // Push a 20×20 panel lying on the block 20 units into it.
    let panel = scene.insert_placed(
        MakeBox::new(Point3::origin(), Point3::new(20.0, 20.0, 1.0)).execute()?,
        ObjectKind::CuttingPanel { support: None },
        Isometry3::translation(440.0, 40.0, 100.0),
    );
    let top = top_triangle(&scene, panel)?;
    engine.hover(&scene, panel, top)?;
    engine.press(&scene)?;
    engine.update(&mut scene, -20.0)?;
    if let ReleaseOutcome::Cut { support, .. } = engine.release(&mut scene, &LocalExtrusion::default())? {
        tracing::info!(
            ?support,
            volume = Volume::new(&scene.get(support)?.mesh).execute(),
            objects = scene.len(),
            "panel consumed"
        );
    }
    Ok(())
}

fn top_triangle(scene: &Scene, id: wallcraft::ObjectId) -> Result<usize, Box<dyn Error>> {
    let mesh = &scene.get(id)?.mesh;
    (0..mesh.triangle_count())
        .find(|&i| mesh.triangle_normal(i).is_some_and(|n| n.z > 0.99))
        .ok_or_else(|| "object has no upward face".into())
}
