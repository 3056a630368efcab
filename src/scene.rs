use slotmap::SlotMap;

use crate::error::{PushPullError, Result};
use crate::math::{Isometry3, Point3, Tolerances, Vector3};
use crate::operations::query::{FaceIndex, Ray, RayCast, RayHit};
use crate::tessellation::TriangleMesh;

slotmap::new_key_type! {
    /// Unique identifier for an object in the scene.
    pub struct ObjectId;
}

/// How push-pull treats an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Ordinary solid; pushing or pulling re-extrudes it.
    Extrudable,
    /// Thin panel that, when pushed inward, cuts into the object behind it
    /// and is consumed.
    CuttingPanel {
        /// Object the panel rests against; found by ray cast when `None`.
        support: Option<ObjectId>,
    },
}

/// One mesh in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Geometry in object-local coordinates.
    pub mesh: TriangleMesh,
    pub kind: ObjectKind,
    /// Local-to-world transform.
    pub placement: Isometry3,
    revision: u64,
}

impl SceneObject {
    /// Incremented every time the mesh is replaced or edited in place.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

/// A maximal coplanar face of one scene object.
///
/// Only valid for the mesh revision it was taken from.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDescriptor {
    pub object: ObjectId,
    pub triangle_indices: Vec<usize>,
    pub vertex_indices: Vec<usize>,
    /// Unit normal in object-local coordinates.
    pub normal: Vector3,
    /// Local plane offset, `normal · p`.
    pub plane_offset: f64,
    /// Local centroid of the face.
    pub center: Point3,
    pub world_center: Point3,
    pub area: f64,
    pub revision: u64,
}

impl FaceDescriptor {
    /// The face normal in world coordinates.
    #[must_use]
    pub fn world_normal(&self, placement: &Isometry3) -> Vector3 {
        placement.rotation * self.normal
    }
}

/// Owns every mesh that push-pull can act on.
///
/// Meshes are never dropped implicitly: replacing one returns the old mesh
/// and removing an object returns it, so the caller can release whatever it
/// derived from them.
#[derive(Debug, Default)]
pub struct Scene {
    objects: SlotMap<ObjectId, SceneObject>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an object at the world origin.
    pub fn insert(&mut self, mesh: TriangleMesh, kind: ObjectKind) -> ObjectId {
        self.insert_placed(mesh, kind, Isometry3::identity())
    }

    pub fn insert_placed(&mut self, mesh: TriangleMesh, kind: ObjectKind, placement: Isometry3) -> ObjectId {
        self.objects.insert(SceneObject {
            mesh,
            kind,
            placement,
            revision: 0,
        })
    }

    /// # Errors
    ///
    /// Returns [`PushPullError::UnknownObject`] if `id` is not in the scene.
    pub fn get(&self, id: ObjectId) -> Result<&SceneObject> {
        Ok(self.objects.get(id).ok_or(PushPullError::UnknownObject)?)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &SceneObject)> {
        self.objects.iter()
    }

    /// Swaps in a new mesh and returns the superseded one.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::UnknownObject`] if `id` is not in the scene.
    pub fn replace_mesh(&mut self, id: ObjectId, mesh: TriangleMesh) -> Result<TriangleMesh> {
        let object = self.objects.get_mut(id).ok_or(PushPullError::UnknownObject)?;
        object.revision += 1;
        Ok(std::mem::replace(&mut object.mesh, mesh))
    }

    /// Removes an object and hands it back to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::UnknownObject`] if `id` is not in the scene.
    pub fn release(&mut self, id: ObjectId) -> Result<SceneObject> {
        Ok(self.objects.remove(id).ok_or(PushPullError::UnknownObject)?)
    }

    /// Mutable mesh access for in-place vertex edits. Bumps the revision.
    pub(crate) fn mesh_mut(&mut self, id: ObjectId) -> Result<&mut TriangleMesh> {
        let object = self.objects.get_mut(id).ok_or(PushPullError::UnknownObject)?;
        object.revision += 1;
        Ok(&mut object.mesh)
    }

    /// Groups the face of `object` containing `triangle`.
    ///
    /// # Errors
    ///
    /// Returns [`PushPullError::UnknownObject`] or
    /// [`PushPullError::FaceNotFound`].
    pub fn describe_face(
        &self,
        object: ObjectId,
        triangle: usize,
        tolerances: Tolerances,
    ) -> Result<FaceDescriptor> {
        let obj = self.get(object)?;
        let face = FaceIndex::new(&obj.mesh, tolerances).execute(triangle)?;
        Ok(FaceDescriptor {
            object,
            triangle_indices: face.triangle_indices,
            vertex_indices: face.vertex_indices,
            normal: face.normal,
            plane_offset: face.plane_offset,
            center: face.center,
            world_center: obj.placement * face.center,
            area: face.area,
            revision: obj.revision,
        })
    }

    /// Nearest object hit by a world-space ray, skipping `exclude`.
    #[must_use]
    pub fn ray_cast(&self, ray: &Ray, exclude: Option<ObjectId>) -> Option<(ObjectId, RayHit)> {
        let mut best: Option<(ObjectId, RayHit)> = None;
        for (id, object) in &self.objects {
            if Some(id) == exclude {
                continue;
            }
            let inverse = object.placement.inverse();
            let local = Ray::new(inverse * ray.origin, inverse * ray.direction);
            let Some(hit) = RayCast::new(&object.mesh, local).execute() else {
                continue;
            };
            if best.as_ref().is_none_or(|(_, b)| hit.distance < b.distance) {
                let world = RayHit {
                    point: object.placement * hit.point,
                    ..hit
                };
                best = Some((id, world));
            }
        }
        best
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::creation::MakeBox;
    use approx::assert_relative_eq;

    fn cube(min: [f64; 3], max: [f64; 3]) -> TriangleMesh {
        MakeBox::new(Point3::from(min), Point3::from(max))
            .execute()
            .unwrap()
    }

    fn top_triangle(mesh: &TriangleMesh) -> usize {
        (0..mesh.triangle_count())
            .find(|&i| mesh.triangle_normal(i).unwrap().z > 0.99)
            .unwrap()
    }

    // ── Ownership ──

    #[test]
    fn replace_returns_superseded_mesh() {
        let mut scene = Scene::new();
        let a = cube([0.0; 3], [1.0; 3]);
        let b = cube([0.0; 3], [2.0; 3]);
        let id = scene.insert(a.clone(), ObjectKind::Extrudable);
        let old = scene.replace_mesh(id, b.clone()).unwrap();
        assert_eq!(old, a);
        assert_eq!(scene.get(id).unwrap().mesh, b);
        assert_eq!(scene.get(id).unwrap().revision(), 1);
    }

    #[test]
    fn release_removes_object() {
        let mut scene = Scene::new();
        let id = scene.insert(cube([0.0; 3], [1.0; 3]), ObjectKind::Extrudable);
        assert_eq!(scene.len(), 1);
        scene.release(id).unwrap();
        assert!(scene.is_empty());
        assert!(scene.get(id).is_err());
        assert!(scene.release(id).is_err());
    }

    // ── Faces ──

    #[test]
    fn face_world_center_uses_placement() {
        let mut scene = Scene::new();
        let mesh = cube([0.0; 3], [2.0; 3]);
        let top = top_triangle(&mesh);
        let placement = Isometry3::translation(10.0, 0.0, 0.0);
        let id = scene.insert_placed(mesh, ObjectKind::Extrudable, placement);
        let face = scene.describe_face(id, top, Tolerances::default()).unwrap();
        assert_relative_eq!(face.center, Point3::new(1.0, 1.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(face.world_center, Point3::new(11.0, 1.0, 2.0), epsilon = 1e-12);
        assert_eq!(face.triangle_indices.len(), 2);
    }

    // ── Ray cast ──

    #[test]
    fn ray_cast_finds_nearest_and_skips_excluded() {
        let mut scene = Scene::new();
        let near = scene.insert(cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), ObjectKind::Extrudable);
        let far = scene.insert_placed(
            cube([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]),
            ObjectKind::Extrudable,
            Isometry3::translation(0.0, 0.0, -5.0),
        );
        let ray = Ray::new(Point3::new(0.5, 0.5, 10.0), -Vector3::z());
        let (hit_id, hit) = scene.ray_cast(&ray, None).unwrap();
        assert_eq!(hit_id, near);
        assert_relative_eq!(hit.distance, 9.0, epsilon = 1e-12);

        let (hit_id, hit) = scene.ray_cast(&ray, Some(near)).unwrap();
        assert_eq!(hit_id, far);
        assert_relative_eq!(hit.point, Point3::new(0.5, 0.5, -4.0), epsilon = 1e-12);
    }
}
