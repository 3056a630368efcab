use crate::math::{Point3, Vector3};
use crate::scene::{FaceDescriptor, Scene};
use crate::tessellation::TriangleMesh;

/// State captured when a drag starts.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub face: FaceDescriptor,
    /// Every vertex on the face's plane, including those of neighbouring
    /// faces that share its boundary.
    pub affected: Vec<usize>,
    /// Most recently applied distance.
    pub distance: f64,
    /// Object revision after the last edit made by this session.
    revision: u64,
    vertices: Vec<Point3>,
    normals: Vec<Vector3>,
}

impl DragSession {
    pub(crate) fn start(face: FaceDescriptor, mesh: &TriangleMesh, plane_eps: f64) -> Self {
        let affected = mesh
            .vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| (face.normal.dot(&v.coords) - face.plane_offset).abs() <= plane_eps)
            .map(|(i, _)| i)
            .collect();
        Self {
            revision: face.revision,
            face,
            affected,
            distance: 0.0,
            vertices: mesh.vertices.clone(),
            normals: mesh.normals.clone(),
        }
    }

    /// Whether the object still holds the mesh this session last touched.
    /// False once anything else has replaced or edited it.
    pub(crate) fn is_current(&self, scene: &Scene) -> bool {
        scene
            .get(self.face.object)
            .is_ok_and(|object| object.revision() == self.revision)
    }

    pub(crate) fn mark_current(&mut self, scene: &Scene) {
        if let Ok(object) = scene.get(self.face.object) {
            self.revision = object.revision();
        }
    }

    /// The mesh exactly as it was when the drag started.
    pub(crate) fn original(&self, current: &TriangleMesh) -> TriangleMesh {
        TriangleMesh {
            vertices: self.vertices.clone(),
            normals: self.normals.clone(),
            indices: current.indices.clone(),
        }
    }

    /// Puts the snapshot back into `mesh`.
    pub(crate) fn restore(&self, mesh: &mut TriangleMesh) {
        mesh.vertices.clone_from(&self.vertices);
        mesh.normals.clone_from(&self.normals);
    }

    /// Restores the snapshot, then moves the affected vertices along the face
    /// normal. The result depends only on `distance`, never on earlier calls.
    pub(crate) fn apply(&mut self, mesh: &mut TriangleMesh, distance: f64) {
        self.restore(mesh);
        let offset = self.face.normal * distance;
        for &i in &self.affected {
            if let Some(v) = mesh.vertices.get_mut(i) {
                *v += offset;
            }
        }
        if distance != 0.0 {
            mesh.recompute_normals();
        }
        self.distance = distance;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::{Isometry3, Tolerances};
    use crate::operations::creation::MakeBox;
    use crate::scene::{ObjectKind, Scene};
    use approx::assert_relative_eq;

    fn session_on_box_top() -> (TriangleMesh, DragSession) {
        let mesh = MakeBox::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0))
            .execute()
            .unwrap();
        let top = (0..mesh.triangle_count())
            .find(|&i| mesh.triangle_normal(i).unwrap().z > 0.99)
            .unwrap();
        let mut scene = Scene::new();
        let id = scene.insert_placed(mesh.clone(), ObjectKind::Extrudable, Isometry3::identity());
        let face = scene.describe_face(id, top, Tolerances::default()).unwrap();
        let session = DragSession::start(face, &mesh, Tolerances::default().plane);
        (mesh, session)
    }

    #[test]
    fn affected_includes_shared_boundary_vertices() {
        let (mesh, session) = session_on_box_top();
        // Top corners of the side faces move too.
        let expected = mesh.vertices.iter().filter(|v| v.z == 2.0).count();
        assert_eq!(session.affected.len(), expected);
        assert!(session.affected.len() > session.face.vertex_indices.len());
    }

    #[test]
    fn apply_moves_plane_and_stretches_sides() {
        let (mut mesh, mut session) = session_on_box_top();
        session.apply(&mut mesh, 3.0);
        let max_z = mesh.vertices.iter().map(|v| v.z).fold(f64::MIN, f64::max);
        assert_relative_eq!(max_z, 5.0);
        let min_z = mesh.vertices.iter().map(|v| v.z).fold(f64::MAX, f64::min);
        assert_relative_eq!(min_z, 0.0);
    }

    #[test]
    fn apply_is_idempotent() {
        let (mut mesh, mut session) = session_on_box_top();
        session.apply(&mut mesh, 7.5);
        let once = mesh.clone();
        session.apply(&mut mesh, -1.0);
        session.apply(&mut mesh, 7.5);
        assert_eq!(mesh, once);
    }

    #[test]
    fn outside_edit_makes_session_stale() {
        let mut scene = Scene::new();
        let id = scene.insert(
            MakeBox::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0))
                .execute()
                .unwrap(),
            ObjectKind::Extrudable,
        );
        let face = scene.describe_face(id, 0, Tolerances::default()).unwrap();
        let mut session = DragSession::start(face, &scene.get(id).unwrap().mesh, Tolerances::default().plane);
        assert!(session.is_current(&scene));

        session.apply(scene.mesh_mut(id).unwrap(), 1.0);
        assert!(!session.is_current(&scene));
        session.mark_current(&scene);
        assert!(session.is_current(&scene));

        scene.replace_mesh(id, TriangleMesh::new()).unwrap();
        assert!(!session.is_current(&scene));
        scene.release(id).unwrap();
        assert!(!session.is_current(&scene));
    }

    #[test]
    fn restore_is_bit_identical() {
        let (mut mesh, mut session) = session_on_box_top();
        let before = mesh.clone();
        session.apply(&mut mesh, 50.0);
        session.restore(&mut mesh);
        assert_eq!(mesh, before);
    }
}
