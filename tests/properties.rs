//! Property-based tests for graph, outline and push-pull invariants.

#![allow(clippy::unwrap_used)]

use std::f64::consts::TAU;

use proptest::prelude::*;

use wallcraft::graph::{OpeningParams, WallGraph};
use wallcraft::math::polygon_2d::is_simple_polygon;
use wallcraft::math::{Point2, Point3, Tolerances, Vector2};
use wallcraft::operations::creation::MakeBox;
use wallcraft::operations::offset::{MiterConfig, MiteredPolygonBuilder};
use wallcraft::operations::query::{BoundingBox, FaceIndex};
use wallcraft::{ObjectKind, PushPullEngine, Scene, SolidConfig, SolidGenerator, TriangleMesh};

// ---------------------------------------------------------------------------
// Strategy helpers
// ---------------------------------------------------------------------------

/// Wall thickness in a typical range.
fn arb_thickness() -> impl Strategy<Value = f64> {
    5.0f64..30.0
}

/// Open polyline of 2..6 walls, each turning by up to ±150°.
fn arb_chain() -> impl Strategy<Value = WallGraph> {
    (
        prop::collection::vec((60.0f64..300.0, -2.6f64..2.6), 2..=6),
        arb_thickness(),
    )
        .prop_map(|(steps, thickness)| {
            let mut g = WallGraph::new();
            let mut at = Point2::origin();
            let mut heading = 0.0_f64;
            let mut prev = g.add_node(at).unwrap();
            for (length, turn) in steps {
                heading += turn;
                at += Vector2::new(heading.cos(), heading.sin()) * length;
                let next = g.add_node(at).unwrap();
                g.add_wall(prev, next, thickness).unwrap();
                prev = next;
            }
            g
        })
}

/// 2..6 arms around a shared hub with jittered, never-coincident angles.
fn arb_star() -> impl Strategy<Value = WallGraph> {
    (
        prop::collection::vec((80.0f64..300.0, -0.3f64..0.3), 2..=6),
        arb_thickness(),
    )
        .prop_map(|(arms, thickness)| {
            let mut g = WallGraph::new();
            let hub = g.add_node(Point2::origin()).unwrap();
            let sector = TAU / arms.len() as f64;
            for (i, (length, jitter)) in arms.iter().enumerate() {
                let angle = sector * (i as f64 + jitter);
                let tip = g
                    .add_node(Point2::new(angle.cos() * length, angle.sin() * length))
                    .unwrap();
                g.add_wall(hub, tip, thickness).unwrap();
            }
            g
        })
}

/// Closed star-shaped room of 3..8 walls.
fn arb_loop() -> impl Strategy<Value = WallGraph> {
    (
        prop::collection::vec((150.0f64..300.0, -0.25f64..0.25), 3..=8),
        arb_thickness(),
    )
        .prop_map(|(corners, thickness)| {
            let mut g = WallGraph::new();
            let sector = TAU / corners.len() as f64;
            let ids: Vec<_> = corners
                .iter()
                .enumerate()
                .map(|(i, (radius, jitter))| {
                    let angle = sector * (i as f64 + jitter);
                    g.add_node(Point2::new(angle.cos() * radius, angle.sin() * radius))
                        .unwrap()
                })
                .collect();
            for i in 0..ids.len() {
                g.add_wall(ids[i], ids[(i + 1) % ids.len()], thickness).unwrap();
            }
            g
        })
}

fn arb_graph() -> impl Strategy<Value = WallGraph> {
    prop_oneof![arb_chain(), arb_star(), arb_loop()]
}

/// Sum of triangle counts and the union bounding box of every wall solid.
fn regenerate(g: &WallGraph) -> (usize, Point3, Point3) {
    let solids = SolidGenerator::new(g, SolidConfig::default()).execute().unwrap();
    let mut triangles = 0;
    let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
    let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);
    for solid in &solids {
        triangles += solid.mesh.triangle_count();
        let bb = BoundingBox::new(&solid.mesh).execute().unwrap();
        min = min.inf(&bb.min);
        max = max.sup(&bb.max);
    }
    (triangles, min, max)
}

fn box_mesh(size: (f64, f64, f64)) -> TriangleMesh {
    MakeBox::new(Point3::origin(), Point3::new(size.0, size.1, size.2))
        .execute()
        .unwrap()
}

fn arb_size() -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0f64..500.0, 1.0f64..500.0, 1.0f64..500.0)
}

const TOL: f64 = 1e-6;

// ---------------------------------------------------------------------------
// 1. Every outline polygon is simple
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn outlines_are_simple(g in arb_graph()) {
        let outlines = MiteredPolygonBuilder::new(&g, MiterConfig::default())
            .execute()
            .unwrap();
        prop_assert_eq!(outlines.len(), g.wall_count());
        for o in &outlines {
            prop_assert!(o.polygon.len() >= 4);
            prop_assert!(is_simple_polygon(&o.polygon, 1e-9),
                "wall {:?} outline not simple: {:?}", o.wall, o.polygon);
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Snapshot round trip regenerates identical solids
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn snapshot_round_trip_regenerates_same_solids(g in arb_graph(), door in any::<bool>()) {
        let mut g = g;
        if door {
            let (wall, _) = g.walls().next().unwrap();
            let length = g.wall_length(wall).unwrap();
            g.add_opening(wall, OpeningParams::door(length * 0.5, length * 0.25, 200.0)).unwrap();
        }
        let decoded = WallGraph::from_json(&g.to_json().unwrap()).unwrap();
        prop_assert_eq!(decoded.wall_count(), g.wall_count());
        prop_assert_eq!(decoded.opening_count(), g.opening_count());

        let (tri_a, min_a, max_a) = regenerate(&g);
        let (tri_b, min_b, max_b) = regenerate(&decoded);
        prop_assert_eq!(tri_a, tri_b);
        prop_assert!((min_a - min_b).norm() < TOL && (max_a - max_b).norm() < TOL);
    }
}

// ---------------------------------------------------------------------------
// 3. Push-pull updates depend only on the latest distance
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn push_pull_update_is_idempotent(
        size in arb_size(),
        d1 in -0.9f64..200.0,
        d2 in -0.9f64..200.0,
    ) {
        let mut scene = Scene::new();
        let id = scene.insert(box_mesh(size), ObjectKind::Extrudable);
        let top = {
            let mesh = &scene.get(id).unwrap().mesh;
            (0..mesh.triangle_count())
                .find(|&i| mesh.triangle_normal(i).unwrap().z > 0.99)
                .unwrap()
        };
        let mut engine = PushPullEngine::default();
        engine.hover(&scene, id, top).unwrap();
        engine.press(&scene).unwrap();

        engine.update(&mut scene, d1).unwrap();
        let first = scene.get(id).unwrap().mesh.clone();
        engine.update(&mut scene, d2).unwrap();
        engine.update(&mut scene, d1).unwrap();
        prop_assert_eq!(&scene.get(id).unwrap().mesh, &first);
    }
}

// ---------------------------------------------------------------------------
// 4. FaceIndex ignores triangle order and winding
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn face_index_ignores_order_and_winding(
        size in arb_size(),
        order in Just((0..12).collect::<Vec<usize>>()).prop_shuffle(),
        flips in prop::collection::vec(any::<bool>(), 12),
        pick in 0usize..12,
    ) {
        let reference = box_mesh(size);
        let mut shuffled = TriangleMesh::new();
        for &i in &order {
            let [a, b, c] = reference.triangle(i).unwrap();
            shuffled.push_triangle(a, b, c);
        }
        // Reverse some windings but keep their stored outward normals.
        for (tri, flip) in shuffled.indices.iter_mut().zip(&flips) {
            if *flip {
                tri.swap(1, 2);
            }
        }

        let tolerances = Tolerances::default();
        let expected = FaceIndex::new(&reference, tolerances).execute(order[pick]).unwrap();
        let actual = FaceIndex::new(&shuffled, tolerances).execute(pick).unwrap();

        prop_assert_eq!(actual.triangle_indices.len(), expected.triangle_indices.len());
        prop_assert!((actual.normal - expected.normal).norm() < TOL);
        prop_assert!((actual.area - expected.area).abs() < TOL * expected.area.max(1.0));
        prop_assert!((actual.center - expected.center).norm() < TOL * size.0.max(size.1).max(size.2));
        let mut mapped: Vec<usize> = actual.triangle_indices.iter().map(|&k| order[k]).collect();
        mapped.sort_unstable();
        prop_assert_eq!(mapped, expected.triangle_indices);
    }
}
