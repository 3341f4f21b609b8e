//! Binary bounding volume hierarchy built top-down with the surface
//! area heuristic. Every leaf holds exactly one triangle; all nodes
//! live in one `Vec` and refer to their children by index.

// others
use smallvec::SmallVec;
// pbrt
use crate::core::geometry::{bnd3_union_bnd3f, bnd3_union_pnt3f};
use crate::core::geometry::{Bounds3f, Point3f, Ray, XYZEnum};
use crate::core::interaction::Hitpoint;
use crate::core::pbrt::{clamp_t, Float};
use crate::shapes::triangle::Triangle;

/// Ranges up to this size are split at the centroid median instead of
/// running the bucketed SAH sweep.
const MEDIAN_SPLIT_MAX_PRIMS: usize = 8;
const N_BUCKETS: usize = 16;
/// Relative cost of one extra traversal step compared to a triangle
/// test.
const TRAVERSAL_COST: Float = 0.125;

#[derive(Debug, Default, Copy, Clone)]
pub struct BVHPrimitiveInfo {
    pub primitive_number: usize,
    pub bounds: Bounds3f,
    pub centroid: Point3f,
}

impl BVHPrimitiveInfo {
    pub fn new(primitive_number: usize, bounds: Bounds3f) -> Self {
        BVHPrimitiveInfo {
            primitive_number,
            bounds,
            centroid: bounds.p_min * 0.5 + bounds.p_max * 0.5,
        }
    }
    pub fn from_triangles(triangles: &[Triangle]) -> Vec<BVHPrimitiveInfo> {
        triangles
            .iter()
            .enumerate()
            .map(|(i, tri)| BVHPrimitiveInfo::new(i, tri.world_bound()))
            .collect()
    }
}

/// Sort the range in place so the element at *mid* is the one a full
/// sort by centroid along *dim* would put there.
pub fn partition_at_median(primitive_info: &mut [BVHPrimitiveInfo], mid: usize, dim: u8) {
    let axis: XYZEnum = XYZEnum::from(dim);
    primitive_info.select_nth_unstable_by(mid, |a, b| a.centroid[axis].total_cmp(&b.centroid[axis]));
}

#[derive(Debug, Default, Copy, Clone)]
struct BucketInfo {
    count: usize,
    bounds: Bounds3f,
}

fn bucket_index(centroid_bounds: &Bounds3f, centroid: &Point3f, dim: u8) -> usize {
    let axis: XYZEnum = XYZEnum::from(dim);
    let b: usize = (N_BUCKETS as Float * centroid_bounds.offset(centroid)[axis]) as usize;
    clamp_t(b, 0_usize, N_BUCKETS - 1)
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum BBVHNodeKind {
    Leaf {
        triangle: usize,
    },
    Interior {
        left: usize,
        right: usize,
        split_axis: u8,
    },
}

#[derive(Debug, Copy, Clone)]
pub struct BBVHNode {
    pub bounds: Bounds3f,
    pub kind: BBVHNodeKind,
}

impl BBVHNode {
    pub fn is_leaf(&self) -> bool {
        match self.kind {
            BBVHNodeKind::Leaf { .. } => true,
            BBVHNodeKind::Interior { .. } => false,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct BBVHAccel {
    pub triangles: Vec<Triangle>,
    pub nodes: Vec<BBVHNode>,
    root: Option<usize>,
}

impl BBVHAccel {
    pub fn new(triangles: &[Triangle]) -> Self {
        let mut bvh: BBVHAccel = BBVHAccel::default();
        bvh.construct(triangles);
        bvh
    }
    /// Throw away any previous tree and build a new one over a copy of
    /// *triangles*.
    pub fn construct(&mut self, triangles: &[Triangle]) {
        self.triangles = triangles.to_vec();
        self.nodes = Vec::with_capacity(2 * triangles.len());
        self.root = None;
        let mut primitive_info: Vec<BVHPrimitiveInfo> =
            BVHPrimitiveInfo::from_triangles(&self.triangles);
        let n_prims: usize = primitive_info.len();
        self.root = self.recursive_build(&mut primitive_info, 0, n_prims);
        debug!(
            "BBVH: {} triangles, {} nodes",
            self.triangles.len(),
            self.nodes.len()
        );
    }
    fn recursive_build(
        &mut self,
        primitive_info: &mut Vec<BVHPrimitiveInfo>,
        start: usize,
        end: usize,
    ) -> Option<usize> {
        if start == end {
            return None;
        }
        // compute bounds of all primitives in BVH node
        let mut bounds: Bounds3f = Bounds3f::default();
        for info in &primitive_info[start..end] {
            bounds = bnd3_union_bnd3f(&bounds, &info.bounds);
        }
        let n_primitives: usize = end - start;
        if n_primitives == 1 {
            self.nodes.push(BBVHNode {
                bounds,
                kind: BBVHNodeKind::Leaf {
                    triangle: primitive_info[start].primitive_number,
                },
            });
            return Some(self.nodes.len() - 1);
        }
        // compute bound of primitive centroids, choose split dimension _dim_
        let mut centroid_bounds: Bounds3f = Bounds3f::default();
        for info in &primitive_info[start..end] {
            centroid_bounds = bnd3_union_pnt3f(&centroid_bounds, &info.centroid);
        }
        let dim: u8 = centroid_bounds.maximum_extent();
        let mut mid: usize = (start + end) / 2;
        if n_primitives <= MEDIAN_SPLIT_MAX_PRIMS {
            partition_at_median(&mut primitive_info[start..end], mid - start, dim);
        } else {
            // initialize _BucketInfo_ for SAH partition buckets
            let mut buckets: [BucketInfo; N_BUCKETS] = [BucketInfo::default(); N_BUCKETS];
            for info in &primitive_info[start..end] {
                let b: usize = bucket_index(&centroid_bounds, &info.centroid, dim);
                buckets[b].count += 1;
                buckets[b].bounds = bnd3_union_bnd3f(&buckets[b].bounds, &info.bounds);
            }
            // compute costs for splitting after each bucket
            let total_area: Float = bounds.surface_area();
            let mut cost: [Float; N_BUCKETS - 1] = [0.0; N_BUCKETS - 1];
            for (i, c) in cost.iter_mut().enumerate() {
                let mut b0: Bounds3f = Bounds3f::default();
                let mut b1: Bounds3f = Bounds3f::default();
                let mut count0: usize = 0;
                let mut count1: usize = 0;
                for bucket in &buckets[..=i] {
                    b0 = bnd3_union_bnd3f(&b0, &bucket.bounds);
                    count0 += bucket.count;
                }
                for bucket in &buckets[(i + 1)..] {
                    b1 = bnd3_union_bnd3f(&b1, &bucket.bounds);
                    count1 += bucket.count;
                }
                *c = TRAVERSAL_COST
                    + (count0 as Float * b0.surface_area() + count1 as Float * b1.surface_area())
                        / total_area;
            }
            // find bucket to split at that minimizes SAH metric
            let mut min_cost: Float = cost[0];
            let mut min_cost_split_bucket: usize = 0;
            for (i, &c) in cost.iter().enumerate().skip(1) {
                if c < min_cost {
                    min_cost = c;
                    min_cost_split_bucket = i;
                }
            }
            // split at the SAH bucket unless one leaf per primitive is
            // cheaper, then keep the median fallback
            if min_cost < n_primitives as Float {
                let (left, right): (Vec<BVHPrimitiveInfo>, Vec<BVHPrimitiveInfo>) =
                    primitive_info[start..end].iter().partition(|pi| {
                        bucket_index(&centroid_bounds, &pi.centroid, dim) <= min_cost_split_bucket
                    });
                let split: usize = start + left.len();
                if split != start && split != end {
                    mid = split;
                    primitive_info.splice(start..end, left.into_iter().chain(right.into_iter()));
                }
            }
        }
        let left: Option<usize> = self.recursive_build(primitive_info, start, mid);
        let right: Option<usize> = self.recursive_build(primitive_info, mid, end);
        match (left, right) {
            (Some(left), Some(right)) => {
                self.nodes.push(BBVHNode {
                    bounds,
                    kind: BBVHNodeKind::Interior {
                        left,
                        right,
                        split_axis: dim,
                    },
                });
                Some(self.nodes.len() - 1)
            }
            // both halves of a range with two or more primitives are non-empty
            (only, None) | (None, only) => only,
        }
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
        let mut hit_id: Option<usize> = None;
        let mut nodes_to_visit: SmallVec<[usize; 64]> = SmallVec::new();
        nodes_to_visit.push(root);
        while let Some(node_index) = nodes_to_visit.pop() {
            let node: &BBVHNode = &self.nodes[node_index];
            match node.kind {
                BBVHNodeKind::Leaf { triangle } => {
                    if let Some(isect) = self.triangles[triangle].intersect(ray) {
                        if isect.distance < hit.distance {
                            *hit = isect;
                            hit_id = Some(triangle);
                        }
                    }
                }
                BBVHNodeKind::Interior { left, right, .. } => {
                    if let Some((t_min, _t_max)) = node.bounds.intersect(ray) {
                        if t_min < hit.distance {
                            nodes_to_visit.push(left);
                            nodes_to_visit.push(right);
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
            .filter_map(|node| match node.kind {
                BBVHNodeKind::Leaf { triangle } => Some((node.bounds, triangle)),
                BBVHNodeKind::Interior { .. } => None,
            })
            .collect()
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
