//! Object median tree. Despite the name no planes are stored: every
//! level sorts its triangles by centroid along the dominant axis of
//! their bounds and hands each half to one child, until a single
//! triangle remains.

// others
use smallvec::SmallVec;
// pbrt
use crate::core::geometry::{Bounds3f, Ray, XYZEnum};
use crate::core::interaction::Hitpoint;
use crate::shapes::triangle::Triangle;

#[derive(Debug, Copy, Clone)]
pub struct KdTreeNode {
    pub bounds: Bounds3f,
    /// child indices, `None` for a leaf
    pub children: Option<(usize, usize)>,
    pub triangle: usize,
}

impl KdTreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Debug, Default, Clone)]
pub struct KdTreeAccel {
    pub triangles: Vec<Triangle>,
    pub nodes: Vec<KdTreeNode>,
    root: Option<usize>,
}

impl KdTreeAccel {
    pub fn new(triangles: &[Triangle]) -> Self {
        let mut kdtree: KdTreeAccel = KdTreeAccel::default();
        kdtree.construct(triangles);
        kdtree
    }
    /// Throw away any previous tree and build a new one over a copy of
    /// *triangles*.
    pub fn construct(&mut self, triangles: &[Triangle]) {
        self.triangles = triangles.to_vec();
        self.nodes = Vec::with_capacity(2 * triangles.len());
        let mut indices: Vec<usize> = (0..triangles.len()).collect();
        self.root = if indices.is_empty() {
            None
        } else {
            Some(self.recursive_build(&mut indices))
        };
        debug!(
            "KdTree: {} triangles, {} nodes",
            self.triangles.len(),
            self.nodes.len()
        );
    }
    fn recursive_build(&mut self, indices: &mut [usize]) -> usize {
        let mut bounds: Bounds3f = Bounds3f::default();
        for &i in indices.iter() {
            bounds.merge_bnd(&self.triangles[i].world_bound());
        }
        if indices.len() == 1 {
            self.nodes.push(KdTreeNode {
                bounds,
                children: None,
                triangle: indices[0],
            });
            return self.nodes.len() - 1;
        }
        let axis: XYZEnum = XYZEnum::from(bounds.maximum_extent());
        let triangles: &[Triangle] = &self.triangles;
        indices.sort_by(|&a, &b| {
            triangles[a].centroid()[axis].total_cmp(&triangles[b].centroid()[axis])
        });
        let mid: usize = indices.len() / 2;
        let (left, right) = indices.split_at_mut(mid);
        let left: usize = self.recursive_build(left);
        let right: usize = self.recursive_build(right);
        self.nodes.push(KdTreeNode {
            bounds,
            children: Some((left, right)),
            triangle: 0,
        });
        self.nodes.len() - 1
    }
    pub fn world_bound(&self) -> Bounds3f {
        match self.root {
            Some(root) => self.nodes[root].bounds,
            None => Bounds3f::default(),
        }
    }
    /// Nearest hit along *ray* closer than `hit.distance`. On success
    /// *hit* describes the surface and the triangle index is returned.
    pub fn intersect(&self, ray: &Ray, hit: &mut Hitpoint) -> Option<usize> {
        let root: usize = self.root?;
        self.nodes[root].bounds.intersect(ray)?;
        let mut hit_id: Option<usize> = None;
        let mut nodes_to_visit: SmallVec<[usize; 64]> = SmallVec::new();
        nodes_to_visit.push(root);
        while let Some(node_index) = nodes_to_visit.pop() {
            let node: &KdTreeNode = &self.nodes[node_index];
            match node.children {
                None => {
                    if let Some(isect) = self.triangles[node.triangle].intersect(ray) {
                        if isect.distance < hit.distance {
                            *hit = isect;
                            hit_id = Some(node.triangle);
                        }
                    }
                }
                Some((left, right)) => {
                    for &child in &[left, right] {
                        if self.nodes[child].bounds.intersect(ray).is_some() {
                            nodes_to_visit.push(child);
                        }
                    }
                }
            }
        }
        hit_id
    }
    /// Every leaf as (bounds, triangle index).
    pub fn leaf_triangles(&self) -> Vec<(Bounds3f, usize)> {
        self.nodes
            .iter()
            .filter(|node| node.is_leaf())
            .map(|node| (node.bounds, node.triangle))
            .collect()
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::{Point3f, Vector3f};
    use crate::core::pbrt::Float;

    fn column(n: usize) -> Vec<Triangle> {
        (0..n)
            .map(|i| {
                let y: Float = i as Float * 3.0;
                Triangle::new(
                    Point3f::new(0.0, y, 0.0),
                    Point3f::new(1.0, y, 0.0),
                    Point3f::new(0.0, y + 1.0, 0.0),
                )
            })
            .collect()
    }

    #[test]
    fn one_triangle_per_leaf() {
        let tris = column(13);
        let kdtree = KdTreeAccel::new(&tris);
        let leaves = kdtree.leaf_triangles();
        assert_eq!(leaves.len(), 13);
        let mut seen = vec![false; 13];
        for (bounds, tri) in leaves {
            assert!(!seen[tri]);
            seen[tri] = true;
            assert_eq!(bounds, tris[tri].world_bound());
        }
        assert_eq!(kdtree.node_count(), 25);
    }

    #[test]
    fn nearest_of_stacked_triangles_wins() {
        let tri = column(1)[0];
        let mut tris = Vec::new();
        for z in &[3.0, 1.0, 2.0] {
            let mut t = tri;
            for p in t.p.iter_mut() {
                p.z = *z;
            }
            tris.push(t);
        }
        let kdtree = KdTreeAccel::new(&tris);
        let ray = Ray::new(Point3f::new(0.2, 0.2, 0.0), Vector3f::new(0.0, 0.0, 1.0));
        let mut hit = Hitpoint::default();
        assert_eq!(kdtree.intersect(&ray, &mut hit), Some(1));
        assert!((hit.distance - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn empty_tree_never_hits() {
        let kdtree = KdTreeAccel::new(&[]);
        let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let mut hit = Hitpoint::default();
        assert_eq!(kdtree.intersect(&ray, &mut hit), None);
        assert_eq!(kdtree.world_bound(), Bounds3f::default());
    }
}
