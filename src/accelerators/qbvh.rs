//! Four-wide bounding volume hierarchy.
//!
//! A binary tree is split at the centroid median first, cycling the
//! split axis from level to level, with up to four triangles per leaf.
//! Every two levels of that tree are then collapsed into one
//! [QBVHNode], which keeps the boxes of its four children transposed
//! into [Float4] lanes, so one slab test per axis and side checks all
//! children at once. The order in which the hit children get visited
//! comes from [ORDER_TABLE], keyed by the hit mask and the ray's
//! direction signs along the three split axes of the node.
//!
//! Leaves only report hits on the front face of a triangle, the side
//! the normal of the winding p0 -> p1 -> p2 points to.
//!
//! [QBVHNode]: struct.QBVHNode.html
//! [Float4]: ../../core/simd/struct.Float4.html
//! [ORDER_TABLE]: constant.ORDER_TABLE.html

// others
use smallvec::SmallVec;
use typed_arena::Arena;
// pbrt
use crate::accelerators::bvh::{partition_at_median, BVHPrimitiveInfo};
use crate::core::geometry::{bnd3_union_bnd3f, bnd3_union_pnt3f, vec3_cross_vec3, vec3_dot_nrmf};
use crate::core::geometry::{Bounds3f, Point3f, Ray, Vector3f, XYZEnum};
use crate::core::interaction::Hitpoint;
use crate::core::pbrt::{Float, INFINITY, TRIANGLE_EPSILON};
use crate::core::simd::{Bool4, Float4, LANE_WIDTH};
use crate::shapes::triangle::Triangle;

/// Largest number of triangles a leaf holds, one per lane.
pub const MAX_TRIANGLES_IN_LEAF: usize = LANE_WIDTH;

/// Traversal order for every combination of hit mask (bits 0..3 set
/// for the children whose box was hit) and octant (bit 2: ray runs
/// towards negative values along the top split axis, bit 1: along the
/// split axis of children 0/1, bit 0: along the split axis of
/// children 2/3). Indexed by `mask * 8 + octant`.
///
/// Each entry lists the children to push onto the traversal stack,
/// one per nibble starting with the lowest, and is terminated by a
/// nibble with bit 2 set. Children are pushed back to front, so the
/// one popped first is the one nearest to the ray origin. See
/// [traversal_order] for how every entry is derived.
///
/// [traversal_order]: fn.traversal_order.html
#[rustfmt::skip]
pub const ORDER_TABLE: [u32; 128] = [
    0x44444, 0x44444, 0x44444, 0x44444, 0x44444, 0x44444, 0x44444, 0x44444,
    0x44440, 0x44440, 0x44440, 0x44440, 0x44440, 0x44440, 0x44440, 0x44440,
    0x44441, 0x44441, 0x44441, 0x44441, 0x44441, 0x44441, 0x44441, 0x44441,
    0x44401, 0x44401, 0x44410, 0x44410, 0x44401, 0x44401, 0x44410, 0x44410,
    0x44442, 0x44442, 0x44442, 0x44442, 0x44442, 0x44442, 0x44442, 0x44442,
    0x44402, 0x44402, 0x44402, 0x44402, 0x44420, 0x44420, 0x44420, 0x44420,
    0x44412, 0x44412, 0x44412, 0x44412, 0x44421, 0x44421, 0x44421, 0x44421,
    0x44012, 0x44012, 0x44102, 0x44102, 0x44201, 0x44201, 0x44210, 0x44210,
    0x44443, 0x44443, 0x44443, 0x44443, 0x44443, 0x44443, 0x44443, 0x44443,
    0x44403, 0x44403, 0x44403, 0x44403, 0x44430, 0x44430, 0x44430, 0x44430,
    0x44413, 0x44413, 0x44413, 0x44413, 0x44431, 0x44431, 0x44431, 0x44431,
    0x44013, 0x44013, 0x44103, 0x44103, 0x44301, 0x44301, 0x44310, 0x44310,
    0x44423, 0x44432, 0x44423, 0x44432, 0x44423, 0x44432, 0x44423, 0x44432,
    0x44023, 0x44032, 0x44023, 0x44032, 0x44230, 0x44320, 0x44230, 0x44320,
    0x44123, 0x44132, 0x44123, 0x44132, 0x44231, 0x44321, 0x44231, 0x44321,
    0x40123, 0x40132, 0x41023, 0x41032, 0x42301, 0x43201, 0x42310, 0x43210,
];

/// Compute one [ORDER_TABLE] entry. Children 0 and 1 lie on the low
/// side of the top split, children 0 and 2 on the low side of their
/// pair's split; a ray running towards positive values along an axis
/// reaches the low side first.
///
/// [ORDER_TABLE]: constant.ORDER_TABLE.html
pub fn traversal_order(mask: u8, octant: u8) -> u32 {
    let sign_top: u8 = (octant >> 2) & 1;
    let sign_left: u8 = (octant >> 1) & 1;
    let sign_right: u8 = octant & 1;
    let left: [u32; 2] = if sign_left == 0 { [0, 1] } else { [1, 0] };
    let right: [u32; 2] = if sign_right == 0 { [2, 3] } else { [3, 2] };
    let front_to_back: [u32; 4] = if sign_top == 0 {
        [left[0], left[1], right[0], right[1]]
    } else {
        [right[0], right[1], left[0], left[1]]
    };
    let mut order: u32 = 0;
    let mut shift: u32 = 0;
    for &child in front_to_back.iter().rev() {
        if mask & (1 << child) != 0 {
            order |= child << shift;
            shift += 4;
        }
    }
    while shift < 20 {
        order |= 4 << shift;
        shift += 4;
    }
    order
}

#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub enum QBVHChild {
    #[default]
    Empty,
    Node(u32),
    Leaf(u32),
}

#[derive(Debug, Copy, Clone)]
pub struct QBVHNode {
    /// `bboxes[0][axis]` holds the four minima, `bboxes[1][axis]` the
    /// four maxima; empty slots carry an inverted infinite box
    pub bboxes: [[Float4; 3]; 2],
    pub children: [QBVHChild; 4],
    pub axis_top: u8,
    pub axis_left: u8,
    pub axis_right: u8,
}

impl Default for QBVHNode {
    fn default() -> Self {
        QBVHNode {
            bboxes: [[Float4::splat(INFINITY); 3], [Float4::splat(-INFINITY); 3]],
            children: [QBVHChild::Empty; 4],
            axis_top: 0_u8,
            axis_left: 0_u8,
            axis_right: 0_u8,
        }
    }
}

impl QBVHNode {
    fn set_child(&mut self, slot: usize, bounds: &Bounds3f, child: QBVHChild) {
        for axis in 0..3_u8 {
            let i: XYZEnum = XYZEnum::from(axis);
            self.bboxes[0][axis as usize].0[slot] = bounds.p_min[i];
            self.bboxes[1][axis as usize].0[slot] = bounds.p_max[i];
        }
        self.children[slot] = child;
    }
    pub fn child_bounds(&self, slot: usize) -> Bounds3f {
        Bounds3f {
            p_min: Point3f::new(
                self.bboxes[0][0].0[slot],
                self.bboxes[0][1].0[slot],
                self.bboxes[0][2].0[slot],
            ),
            p_max: Point3f::new(
                self.bboxes[1][0].0[slot],
                self.bboxes[1][1].0[slot],
                self.bboxes[1][2].0[slot],
            ),
        }
    }
    /// Slab test of all four child boxes against the ray segment
    /// `[0, max_distance]`. Bit *i* of the result is set if child *i*
    /// may contain a hit.
    fn intersect_children(
        &self,
        org: &[Float4; 3],
        inv_dir: &[Float4; 3],
        dir_is_neg: &[u8; 3],
        max_distance: Float,
    ) -> u8 {
        let mut t_min: Float4 = Float4::splat(0.0 as Float);
        let mut t_max: Float4 = Float4::splat(max_distance);
        for axis in 0..3_usize {
            let near: &Float4 = &self.bboxes[dir_is_neg[axis] as usize][axis];
            let far: &Float4 = &self.bboxes[1 - dir_is_neg[axis] as usize][axis];
            t_min = t_min.max(&((near - org[axis]) * inv_dir[axis]));
            t_max = t_max.min(&((far - org[axis]) * inv_dir[axis]));
        }
        t_max.ge(&t_min).move_mask()
    }
    /// Row of [ORDER_TABLE] to use for a ray with the given direction
    /// signs.
    ///
    /// [ORDER_TABLE]: constant.ORDER_TABLE.html
    fn octant(&self, dir_is_neg: &[u8; 3]) -> usize {
        ((dir_is_neg[self.axis_top as usize] << 2)
            | (dir_is_neg[self.axis_left as usize] << 1)
            | dir_is_neg[self.axis_right as usize]) as usize
    }
}

/// Up to four triangles transposed into lanes: first vertex and both
/// edges leaving it, one [Float4] per axis.
///
/// [Float4]: ../../core/simd/struct.Float4.html
#[derive(Debug, Default, Clone)]
pub struct TrianglePack {
    pub v0: [Float4; 3],
    pub e1: [Float4; 3],
    pub e2: [Float4; 3],
    /// determinant magnitude below which a lane counts as parallel
    pub det_eps: Float4,
    /// index into the triangle list, one per used lane
    pub indices: SmallVec<[u32; 4]>,
}

impl TrianglePack {
    pub fn new(triangles: &[Triangle], indices: &[usize]) -> Self {
        let mut pack: TrianglePack = TrianglePack::default();
        for (lane, &index) in indices.iter().take(LANE_WIDTH).enumerate() {
            let tri: &Triangle = &triangles[index];
            let e1: Vector3f = tri.p[1] - tri.p[0];
            let e2: Vector3f = tri.p[2] - tri.p[0];
            for axis in 0..3_u8 {
                let i: XYZEnum = XYZEnum::from(axis);
                pack.v0[axis as usize].0[lane] = tri.p[0][i];
                pack.e1[axis as usize].0[lane] = e1[i];
                pack.e2[axis as usize].0[lane] = e2[i];
            }
            pack.det_eps.0[lane] = Triangle::parallel_threshold(&e1, &e2);
            pack.indices.push(index as u32);
        }
        pack
    }
    /// Lanes which hold a triangle the ray hits closer than
    /// *max_distance*. Performs the same arithmetic in the same order
    /// as `Triangle::intersect`, so both agree on every lane.
    pub fn intersect_lanes(&self, ray: &Ray, max_distance: Float) -> u8 {
        let d: [Float4; 3] = [
            Float4::splat(ray.d.x),
            Float4::splat(ray.d.y),
            Float4::splat(ray.d.z),
        ];
        let p_vec: [Float4; 3] = cross4(&d, &self.e2);
        let det: Float4 = dot4(&self.e1, &p_vec);
        // NaN lanes fail the comparison and count as parallel
        let mut valid: Bool4 = det.abs().gt(&self.det_eps);
        let inv_det: Float4 = Float4::splat(1.0 as Float) / det;
        let t_vec: [Float4; 3] = [
            Float4::splat(ray.o.x) - self.v0[0],
            Float4::splat(ray.o.y) - self.v0[1],
            Float4::splat(ray.o.z) - self.v0[2],
        ];
        let zero: Float4 = Float4::splat(0.0 as Float);
        let one: Float4 = Float4::splat(1.0 as Float);
        let u: Float4 = dot4(&t_vec, &p_vec) * inv_det;
        valid = valid & !(u.lt(&zero) | u.gt(&one));
        let q_vec: [Float4; 3] = cross4(&t_vec, &self.e1);
        let v: Float4 = dot4(&d, &q_vec) * inv_det;
        valid = valid & !(v.lt(&zero) | (u + v).gt(&one));
        let t: Float4 = dot4(&self.e2, &q_vec) * inv_det;
        valid = valid & t.gt(&Float4::splat(TRIANGLE_EPSILON)) & t.lt(&Float4::splat(max_distance));
        let used: u8 = (1_u8 << self.indices.len()) - 1;
        valid.move_mask() & used
    }
}

fn dot4(a: &[Float4; 3], b: &[Float4; 3]) -> Float4 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross4(a: &[Float4; 3], b: &[Float4; 3]) -> [Float4; 3] {
    let mut r: [Float4; 3] = [Float4::default(); 3];
    for lane in 0..LANE_WIDTH {
        let c: Vector3f = vec3_cross_vec3(
            &Vector3f::new(a[0].0[lane], a[1].0[lane], a[2].0[lane]),
            &Vector3f::new(b[0].0[lane], b[1].0[lane], b[2].0[lane]),
        );
        r[0].0[lane] = c.x;
        r[1].0[lane] = c.y;
        r[2].0[lane] = c.z;
    }
    r
}

enum QBVHBuildNode<'a> {
    Leaf {
        bounds: Bounds3f,
        first: usize,
        count: usize,
    },
    Interior {
        bounds: Bounds3f,
        axis: u8,
        children: [&'a QBVHBuildNode<'a>; 2],
    },
}

impl<'a> QBVHBuildNode<'a> {
    fn bounds(&self) -> &Bounds3f {
        match self {
            QBVHBuildNode::Leaf { bounds, .. } => bounds,
            QBVHBuildNode::Interior { bounds, .. } => bounds,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct QBVHAccel {
    pub triangles: Vec<Triangle>,
    /// `nodes[0]` is the root unless the tree is empty
    pub nodes: Vec<QBVHNode>,
    pub packs: Vec<TrianglePack>,
}

impl QBVHAccel {
    pub fn new(triangles: &[Triangle]) -> Self {
        let mut qbvh: QBVHAccel = QBVHAccel::default();
        qbvh.construct(triangles);
        qbvh
    }
    /// Throw away any previous tree and build a new one over a copy of
    /// *triangles*.
    pub fn construct(&mut self, triangles: &[Triangle]) {
        self.triangles = triangles.to_vec();
        self.nodes = Vec::new();
        self.packs = Vec::new();
        if triangles.is_empty() {
            debug!("QBVH: no triangles");
            return;
        }
        let mut primitive_info: Vec<BVHPrimitiveInfo> =
            BVHPrimitiveInfo::from_triangles(&self.triangles);
        let mut centroid_bounds: Bounds3f = Bounds3f::default();
        for info in &primitive_info {
            centroid_bounds = bnd3_union_pnt3f(&centroid_bounds, &info.centroid);
        }
        let n_prims: usize = primitive_info.len();
        let arena: Arena<QBVHBuildNode> = Arena::with_capacity(n_prims);
        let root: &QBVHBuildNode = QBVHAccel::recursive_build(
            &arena,
            &mut primitive_info,
            0,
            n_prims,
            centroid_bounds.maximum_extent(),
        );
        match root {
            QBVHBuildNode::Leaf { .. } => {
                // a handful of triangles still gets a root node
                let mut node: QBVHNode = QBVHNode::default();
                let child: QBVHChild = self.push_leaf(root, &primitive_info);
                node.set_child(0, root.bounds(), child);
                self.nodes.push(node);
            }
            QBVHBuildNode::Interior { .. } => {
                self.collapse(root, &primitive_info);
            }
        }
        debug!(
            "QBVH: {} triangles, {} nodes, {} leaves",
            self.triangles.len(),
            self.nodes.len(),
            self.packs.len()
        );
    }
    fn recursive_build<'a>(
        arena: &'a Arena<QBVHBuildNode<'a>>,
        primitive_info: &mut Vec<BVHPrimitiveInfo>,
        start: usize,
        end: usize,
        axis: u8,
    ) -> &'a QBVHBuildNode<'a> {
        let mut bounds: Bounds3f = Bounds3f::default();
        for info in &primitive_info[start..end] {
            bounds = bnd3_union_bnd3f(&bounds, &info.bounds);
        }
        let n_primitives: usize = end - start;
        if n_primitives <= MAX_TRIANGLES_IN_LEAF {
            return arena.alloc(QBVHBuildNode::Leaf {
                bounds,
                first: start,
                count: n_primitives,
            });
        }
        let mid: usize = (start + end) / 2;
        partition_at_median(&mut primitive_info[start..end], mid - start, axis);
        let next_axis: u8 = (axis + 1) % 3;
        let c0 = QBVHAccel::recursive_build(arena, primitive_info, start, mid, next_axis);
        let c1 = QBVHAccel::recursive_build(arena, primitive_info, mid, end, next_axis);
        arena.alloc(QBVHBuildNode::Interior {
            bounds,
            axis,
            children: [c0, c1],
        })
    }
    /// Turn a binary interior node and its children into one 4-wide
    /// node; returns its index.
    fn collapse(&mut self, node: &QBVHBuildNode, primitive_info: &[BVHPrimitiveInfo]) -> u32 {
        let node_index: usize = self.nodes.len();
        self.nodes.push(QBVHNode::default());
        let (axis_top, halves) = match node {
            QBVHBuildNode::Interior { axis, children, .. } => (*axis, *children),
            QBVHBuildNode::Leaf { .. } => unreachable!("only interior nodes get collapsed"),
        };
        let mut qnode: QBVHNode = QBVHNode {
            axis_top,
            axis_left: axis_top,
            axis_right: axis_top,
            ..QBVHNode::default()
        };
        for (half, side) in halves.iter().enumerate() {
            let (pair, axis): ([Option<&QBVHBuildNode>; 2], u8) = match side {
                QBVHBuildNode::Interior { axis, children, .. } => {
                    ([Some(children[0]), Some(children[1])], *axis)
                }
                QBVHBuildNode::Leaf { .. } => ([Some(*side), None], axis_top),
            };
            if half == 0 {
                qnode.axis_left = axis;
            } else {
                qnode.axis_right = axis;
            }
            for (i, grandchild) in pair.iter().enumerate() {
                if let Some(grandchild) = grandchild {
                    let child: QBVHChild = match grandchild {
                        QBVHBuildNode::Leaf { .. } => self.push_leaf(grandchild, primitive_info),
                        QBVHBuildNode::Interior { .. } => {
                            QBVHChild::Node(self.collapse(grandchild, primitive_info))
                        }
                    };
                    qnode.set_child(half * 2 + i, grandchild.bounds(), child);
                }
            }
        }
        self.nodes[node_index] = qnode;
        node_index as u32
    }
    fn push_leaf(&mut self, leaf: &QBVHBuildNode, primitive_info: &[BVHPrimitiveInfo]) -> QBVHChild {
        match leaf {
            QBVHBuildNode::Leaf { first, count, .. } => {
                let indices: SmallVec<[usize; 4]> = primitive_info[*first..(*first + *count)]
                    .iter()
                    .map(|info| info.primitive_number)
                    .collect();
                self.packs.push(TrianglePack::new(&self.triangles, &indices));
                QBVHChild::Leaf((self.packs.len() - 1) as u32)
            }
            QBVHBuildNode::Interior { .. } => unreachable!("only leaves become triangle packs"),
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        let mut bounds: Bounds3f = Bounds3f::default();
        if let Some(root) = self.nodes.first() {
            for slot in 0..4 {
                if root.children[slot] != QBVHChild::Empty {
                    bounds = bnd3_union_bnd3f(&bounds, &root.child_bounds(slot));
                }
            }
        }
        bounds
    }
    /// Nearest front-facing hit along *ray* closer than
    /// `hit.distance`. On success *hit* describes the surface and the
    /// triangle index is returned.
    pub fn intersect(&self, ray: &Ray, hit: &mut Hitpoint) -> Option<usize> {
        if self.nodes.is_empty() {
            return None;
        }
        let inv: Vector3f = ray.inv_dir();
        let dir_is_neg: [u8; 3] = ray.dir_is_neg();
        let org: [Float4; 3] = [
            Float4::splat(ray.o.x),
            Float4::splat(ray.o.y),
            Float4::splat(ray.o.z),
        ];
        let inv_dir: [Float4; 3] = [
            Float4::splat(inv.x),
            Float4::splat(inv.y),
            Float4::splat(inv.z),
        ];
        let mut hit_id: Option<usize> = None;
        let mut nodes_to_visit: SmallVec<[QBVHChild; 64]> = SmallVec::new();
        nodes_to_visit.push(QBVHChild::Node(0));
        while let Some(child) = nodes_to_visit.pop() {
            match child {
                QBVHChild::Empty => {}
                QBVHChild::Leaf(pack) => {
                    self.intersect_pack(&self.packs[pack as usize], ray, hit, &mut hit_id);
                }
                QBVHChild::Node(node_index) => {
                    let node: &QBVHNode = &self.nodes[node_index as usize];
                    let mask: u8 =
                        node.intersect_children(&org, &inv_dir, &dir_is_neg, hit.distance);
                    let mut order: u32 = ORDER_TABLE[mask as usize * 8 + node.octant(&dir_is_neg)];
                    while order & 4 == 0 {
                        nodes_to_visit.push(node.children[(order & 3) as usize]);
                        order >>= 4;
                    }
                }
            }
        }
        hit_id
    }
    fn intersect_pack(
        &self,
        pack: &TrianglePack,
        ray: &Ray,
        hit: &mut Hitpoint,
        hit_id: &mut Option<usize>,
    ) {
        let candidates: u8 = pack.intersect_lanes(ray, hit.distance);
        if candidates == 0 {
            return;
        }
        for (lane, &index) in pack.indices.iter().enumerate() {
            if candidates & (1 << lane) == 0 {
                continue;
            }
            let tri: &Triangle = &self.triangles[index as usize];
            if let Some(isect) = tri.intersect(ray) {
                // back faces never count
                if isect.distance < hit.distance && vec3_dot_nrmf(&ray.d, &isect.normal) < 0.0 {
                    *hit = isect;
                    *hit_id = Some(index as usize);
                }
            }
        }
    }
    /// Every triangle with the bounds of the leaf slot holding it.
    pub fn leaf_triangles(&self) -> Vec<(Bounds3f, usize)> {
        let mut leaves: Vec<(Bounds3f, usize)> = Vec::with_capacity(self.triangles.len());
        for node in &self.nodes {
            for slot in 0..4 {
                if let QBVHChild::Leaf(pack) = node.children[slot] {
                    let bounds: Bounds3f = node.child_bounds(slot);
                    for &index in &self.packs[pack as usize].indices {
                        leaves.push((bounds, index as usize));
                    }
                }
            }
        }
        leaves
    }
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn grid(n: usize) -> Vec<Triangle> {
        let mut tris: Vec<Triangle> = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let x: Float = i as Float * 2.0;
                let y: Float = j as Float * 2.0;
                tris.push(Triangle::new(
                    Point3f::new(x, y, 0.0),
                    Point3f::new(x, y + 1.0, 0.0),
                    Point3f::new(x + 1.0, y, 0.0),
                ));
            }
        }
        tris
    }

    #[test]
    fn order_table_matches_derivation() {
        for mask in 0..16_u8 {
            for octant in 0..8_u8 {
                assert_eq!(
                    ORDER_TABLE[mask as usize * 8 + octant as usize],
                    traversal_order(mask, octant),
                    "mask {:04b} octant {:03b}",
                    mask,
                    octant
                );
            }
        }
    }

    #[test]
    fn order_visits_every_hit_child_once() {
        for mask in 0..16_u8 {
            for octant in 0..8_u8 {
                let mut order: u32 = ORDER_TABLE[mask as usize * 8 + octant as usize];
                let mut visited: u8 = 0;
                while order & 4 == 0 {
                    let child: u8 = (order & 3) as u8;
                    assert_eq!(visited & (1 << child), 0);
                    visited |= 1 << child;
                    order >>= 4;
                }
                assert_eq!(visited, mask);
            }
        }
    }

    #[test]
    fn empty_slots_never_hit() {
        let node = QBVHNode::default();
        assert!(node.children.iter().all(|c| *c == QBVHChild::default()));
        assert_eq!(QBVHChild::default(), QBVHChild::Empty);
        let ray = Ray::new(Point3f::new(0.0, 0.0, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let inv = ray.inv_dir();
        let org = [Float4::splat(0.0), Float4::splat(0.0), Float4::splat(-1.0)];
        let inv_dir = [Float4::splat(inv.x), Float4::splat(inv.y), Float4::splat(inv.z)];
        assert_eq!(
            node.intersect_children(&org, &inv_dir, &ray.dir_is_neg(), INFINITY),
            0
        );
    }

    #[test]
    fn lane_test_agrees_with_scalar_test() {
        let tris = grid(2);
        let pack = TrianglePack::new(&tris, &[0, 1, 2, 3]);
        let ray = Ray::new(Point3f::new(2.2, 0.2, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        assert_eq!(pack.intersect_lanes(&ray, INFINITY), 0b0010);
        assert!(tris[1].intersect(&ray).is_some());
        // the hit at distance one is not closer than 0.5
        assert_eq!(pack.intersect_lanes(&ray, 0.5), 0);
    }

    #[test]
    fn lane_test_keeps_tiny_triangles() {
        let s: Float = 5.0e-4;
        let tris: Vec<Triangle> = (0..4)
            .map(|i| {
                let x: Float = i as Float * 2.0 * s;
                Triangle::new(
                    Point3f::new(x, 0.0, 0.0),
                    Point3f::new(x + s, 0.0, 0.0),
                    Point3f::new(x, s, 0.0),
                )
            })
            .collect();
        let pack = TrianglePack::new(&tris, &[0, 1, 2, 3]);
        for (lane, tri) in tris.iter().enumerate() {
            let ray = Ray::new(
                Point3f::new(tri.p[0].x + 1.0e-4, 1.0e-4, 1.0),
                Vector3f::new(0.0, 0.0, -1.0),
            );
            assert!(tri.intersect(&ray).is_some());
            assert_eq!(pack.intersect_lanes(&ray, INFINITY), 1 << lane);
        }
    }

    #[test]
    fn partial_pack_ignores_unused_lanes() {
        let tris = grid(1);
        let pack = TrianglePack::new(&tris, &[0]);
        assert_eq!(pack.indices.len(), 1);
        let ray = Ray::new(Point3f::new(0.2, 0.2, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        assert_eq!(pack.intersect_lanes(&ray, INFINITY), 0b0001);
    }

    #[test]
    fn small_scene_gets_a_root_node() {
        let qbvh = QBVHAccel::new(&grid(1));
        assert_eq!(qbvh.node_count(), 1);
        assert_eq!(qbvh.leaf_triangles().len(), 1);
    }

    #[test]
    fn finds_front_faces_and_skips_back_faces() {
        let tris = grid(8);
        let qbvh = QBVHAccel::new(&tris);
        assert!(qbvh.node_count() > 1);
        for (i, tri) in tris.iter().enumerate() {
            let c = tri.centroid();
            // normal of (0,0)-(0,1)-(1,0) points towards -z
            let front = Ray::new(Point3f::new(c.x, c.y, -3.0), Vector3f::new(0.0, 0.0, 1.0));
            let mut hit = Hitpoint::default();
            assert_eq!(qbvh.intersect(&front, &mut hit), Some(i));
            assert!((hit.distance - 3.0).abs() < 1.0e-5);
            let back = Ray::new(Point3f::new(c.x, c.y, 3.0), Vector3f::new(0.0, 0.0, -1.0));
            let mut hit = Hitpoint::default();
            assert_eq!(qbvh.intersect(&back, &mut hit), None);
            assert_eq!(hit.distance, INFINITY);
        }
    }

    #[test]
    fn every_triangle_sits_in_one_leaf() {
        let tris = grid(9);
        let qbvh = QBVHAccel::new(&tris);
        let mut seen = vec![0_usize; tris.len()];
        for (bounds, index) in qbvh.leaf_triangles() {
            seen[index] += 1;
            assert!(bounds.inside(&tris[index].world_bound()));
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert!(qbvh.world_bound().inside(&bnd3_union_bnd3f(
            &tris[0].world_bound(),
            &tris[tris.len() - 1].world_bound()
        )));
    }
}
