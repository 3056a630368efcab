use super::plane::Plane;
use super::polygon::Polygon;

/// A node of a solid BSP tree.
///
/// Space in front of every plane on a path to an empty front slot is
/// outside the solid; space behind a missing back child is inside.
#[derive(Debug, Default)]
pub(super) struct BspNode {
    plane: Option<Plane>,
    polygons: Vec<Polygon>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
}

impl BspNode {
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Adds polygons to the tree, splitting them by existing planes.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);

        let mut front = Vec::new();
        let mut back = Vec::new();
        let mut coplanar = Vec::new();
        for poly in polygons {
            // Coplanar polygons of either facing live on this node.
            let mut coplanar_back = Vec::new();
            poly.split(&plane, &mut coplanar, &mut coplanar_back, &mut front, &mut back);
            coplanar.append(&mut coplanar_back);
        }
        self.polygons.append(&mut coplanar);

        if !front.is_empty() {
            self.front.get_or_insert_with(Box::default).build(front);
        }
        if !back.is_empty() {
            self.back.get_or_insert_with(Box::default).build(back);
        }
    }

    /// Swaps inside and outside.
    pub fn invert(&mut self) {
        for poly in &mut self.polygons {
            poly.flip();
        }
        if let Some(plane) = &mut self.plane {
            *plane = plane.flipped();
        }
        if let Some(front) = &mut self.front {
            front.invert();
        }
        if let Some(back) = &mut self.back {
            back.invert();
        }
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Removes the parts of `polygons` inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        let mut front = Vec::new();
        let mut back = Vec::new();
        for poly in polygons {
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            poly.split(&plane, &mut coplanar_front, &mut coplanar_back, &mut front, &mut back);
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);
        }

        let mut kept = match &self.front {
            Some(node) => node.clip_polygons(front),
            None => front,
        };
        if let Some(node) = &self.back {
            kept.extend(node.clip_polygons(back));
        }
        kept
    }

    /// Removes the parts of this tree's polygons inside `other`.
    pub fn clip_to(&mut self, other: &BspNode) {
        self.polygons = other.clip_polygons(std::mem::take(&mut self.polygons));
        if let Some(front) = &mut self.front {
            front.clip_to(other);
        }
        if let Some(back) = &mut self.back {
            back.clip_to(other);
        }
    }

    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Polygon>) {
        out.extend(self.polygons.iter().cloned());
        if let Some(front) = &self.front {
            front.collect_into(out);
        }
        if let Some(back) = &self.back {
            back.collect_into(out);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn triangle_at(z: f64) -> Polygon {
        Polygon::from_triangle(p(0.0, 0.0, z), p(1.0, 0.0, z), p(0.0, 1.0, z)).unwrap()
    }

    #[test]
    fn build_keeps_every_polygon() {
        let tree = BspNode::new(vec![triangle_at(0.0), triangle_at(1.0), triangle_at(-1.0)]);
        assert_eq!(tree.all_polygons().len(), 3);
    }

    #[test]
    fn clip_drops_polygons_behind_a_leaf_plane() {
        let tree = BspNode::new(vec![triangle_at(0.0)]);
        let kept = tree.clip_polygons(vec![triangle_at(1.0), triangle_at(-1.0)]);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].vertices[0].z > 0.0);
    }

    #[test]
    fn invert_flips_polygons() {
        let mut tree = BspNode::new(vec![triangle_at(0.0)]);
        tree.invert();
        let polys = tree.all_polygons();
        assert!(polys[0].plane.normal.z < 0.0);
        let kept = tree.clip_polygons(vec![triangle_at(1.0), triangle_at(-1.0)]);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].vertices[0].z < 0.0);
    }
}
