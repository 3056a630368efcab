use tracing::debug;

use crate::error::{PushPullError, Result};
use crate::operations::boolean::{BooleanEvaluator, Subtract};
use crate::operations::query::Ray;
use crate::operations::shaping::extrude_patch;
use crate::scene::{FaceDescriptor, ObjectId, Scene, SceneObject};
use crate::tessellation::TriangleMesh;

/// Result of consuming a cutting panel.
#[derive(Debug)]
pub(crate) struct PanelCut {
    pub support: ObjectId,
    pub superseded: TriangleMesh,
    pub panel: SceneObject,
}

/// Cuts the panel's footprint `depth` deep into the object it rests on.
///
/// `panel_mesh` is the panel as it was before the drag. The cutter starts
/// `clearance` outside the support surface so the cut opens cleanly. On
/// success the support's mesh is replaced and the panel leaves the scene.
pub(crate) fn cut_into_support(
    scene: &mut Scene,
    face: &FaceDescriptor,
    panel_mesh: &TriangleMesh,
    support: Option<ObjectId>,
    depth: f64,
    clearance: f64,
    evaluator: &dyn BooleanEvaluator,
) -> Result<PanelCut> {
    let panel = scene.get(face.object)?;
    let placement = panel.placement;
    let normal = face.normal;

    // Distance from the pushed face back to the panel's rear surface.
    let thickness = panel_mesh
        .vertices
        .iter()
        .map(|v| face.plane_offset - normal.dot(&v.coords))
        .fold(0.0, f64::max);

    let mut footprint = TriangleMesh::new();
    for [a, b, c] in face.triangle_indices.iter().filter_map(|&i| panel_mesh.triangle(i)) {
        footprint.push_triangle(a, b, c);
    }
    let lift = normal * (clearance - thickness);
    for v in &mut footprint.vertices {
        *v += lift;
    }
    let cutter = extrude_patch(&footprint, &(-normal * (depth + clearance))).transformed(&placement);

    let support = match support {
        Some(id) => Some(id).filter(|&id| id != face.object && scene.contains(id)),
        None => {
            let ray = Ray::new(face.world_center, -face.world_normal(&placement));
            scene.ray_cast(&ray, Some(face.object)).map(|(id, _)| id)
        }
    }
    .ok_or(PushPullError::NoSupportObjectFound)?;

    let target = scene.get(support)?;
    let cutter = cutter.transformed(&target.placement.inverse());
    let cut = Subtract::new(&target.mesh, &cutter).execute_with(evaluator)?;

    debug!(
        ?support,
        depth,
        thickness,
        triangles = cut.triangle_count(),
        "panel cut evaluated"
    );
    let superseded = scene.replace_mesh(support, cut)?;
    let panel = scene.release(face.object)?;
    Ok(PanelCut {
        support,
        superseded,
        panel,
    })
}
