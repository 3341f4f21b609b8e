//! Acceleration structures are one of the components at the heart of
//! any ray tracer. Without algorithms to reduce the number of
//! unnecessary ray intersection tests, tracing a single ray through a
//! scene would take time linear in the number of primitives in the
//! scene, since the ray would need to be tested against each
//! primitive in turn to find the closest intersection.
//!
//! - BBVHAccel
//! - QBVHAccel
//! - KdTreeAccel
//!
//! The [Accelerator] picks one of them by [AccelType]:
//!
//! ```rust
//! use rs_accel::accelerators::{AccelType, Accelerator};
//! use rs_accel::core::geometry::{Point3f, Ray, Vector3f};
//! use rs_accel::core::interaction::Hitpoint;
//! use rs_accel::shapes::triangle::Triangle;
//!
//!     let triangles = vec![Triangle::new(
//!         Point3f::new(0.0, 0.0, 0.0),
//!         Point3f::new(1.0, 0.0, 0.0),
//!         Point3f::new(0.0, 1.0, 0.0),
//!     )];
//!     let mut accel = Accelerator::new(AccelType::Bbvh);
//!     accel.construct(&triangles);
//!     let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
//!     let mut hit = Hitpoint::default();
//!     assert_eq!(accel.intersect(&ray, &mut hit), Some(0));
//! ```
//!
//! Only the QBVH filters back faces; the other two report whichever
//! side of a triangle the ray hits first.
//!
//! [Accelerator]: struct.Accelerator.html
//! [AccelType]: enum.AccelType.html

// std
use std::str::FromStr;
use std::sync::Arc;
// others
use rayon::prelude::*;
use strum_macros::{Display, EnumIter, EnumString};
// pbrt
use crate::core::error::{Error, Result};
use crate::core::geometry::{vec3_dot_nrmf, Bounds3f, Ray};
use crate::core::interaction::Hitpoint;
use crate::shapes::triangle::Triangle;

pub mod bvh;
pub mod kdtreeaccel;
pub mod qbvh;

use bvh::BBVHAccel;
use kdtreeaccel::KdTreeAccel;
use qbvh::QBVHAccel;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, EnumIter, EnumString, Display)]
#[strum(ascii_case_insensitive)]
pub enum AccelType {
    #[strum(serialize = "kdtree")]
    KdTree,
    #[strum(serialize = "bbvh")]
    Bbvh,
    #[default]
    #[strum(serialize = "qbvh")]
    Qbvh,
}

impl AccelType {
    pub fn from_name(name: &str) -> Result<AccelType> {
        AccelType::from_str(name).map_err(|_| Error::UnknownAccelerator(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub enum Accel {
    KdTree(KdTreeAccel),
    Bbvh(BBVHAccel),
    Qbvh(QBVHAccel),
}

impl Accel {
    pub fn new(accel_type: AccelType, triangles: &[Triangle]) -> Self {
        match accel_type {
            AccelType::KdTree => Accel::KdTree(KdTreeAccel::new(triangles)),
            AccelType::Bbvh => Accel::Bbvh(BBVHAccel::new(triangles)),
            AccelType::Qbvh => Accel::Qbvh(QBVHAccel::new(triangles)),
        }
    }
    pub fn intersect(&self, ray: &Ray, hit: &mut Hitpoint) -> Option<usize> {
        match self {
            Accel::KdTree(accel) => accel.intersect(ray, hit),
            Accel::Bbvh(accel) => accel.intersect(ray, hit),
            Accel::Qbvh(accel) => accel.intersect(ray, hit),
        }
    }
    pub fn world_bound(&self) -> Bounds3f {
        match self {
            Accel::KdTree(accel) => accel.world_bound(),
            Accel::Bbvh(accel) => accel.world_bound(),
            Accel::Qbvh(accel) => accel.world_bound(),
        }
    }
    pub fn leaf_triangles(&self) -> Vec<(Bounds3f, usize)> {
        match self {
            Accel::KdTree(accel) => accel.leaf_triangles(),
            Accel::Bbvh(accel) => accel.leaf_triangles(),
            Accel::Qbvh(accel) => accel.leaf_triangles(),
        }
    }
    pub fn node_count(&self) -> usize {
        match self {
            Accel::KdTree(accel) => accel.node_count(),
            Accel::Bbvh(accel) => accel.node_count(),
            Accel::Qbvh(accel) => accel.node_count(),
        }
    }
}

/// Selected structure plus, once `construct` was called, the built
/// tree. Clones share the tree. Any query before `construct` panics.
#[derive(Debug, Default, Clone)]
pub struct Accelerator {
    accel_type: AccelType,
    accel: Option<Arc<Accel>>,
}

impl Accelerator {
    pub fn new(accel_type: AccelType) -> Self {
        Accelerator {
            accel_type,
            accel: None,
        }
    }
    pub fn accel_type(&self) -> AccelType {
        self.accel_type
    }
    /// Select another structure. A tree built before no longer
    /// matches and is dropped, `construct` has to be called again.
    pub fn set_accel_type(&mut self, accel_type: AccelType) {
        if accel_type != self.accel_type {
            self.accel = None;
        }
        self.accel_type = accel_type;
    }
    pub fn is_constructed(&self) -> bool {
        self.accel.is_some()
    }
    /// Build the selected structure over *triangles*, replacing the
    /// previous one. Clones made earlier keep the old tree.
    pub fn construct(&mut self, triangles: &[Triangle]) {
        info!(
            "Building {} over {} triangle(s) ...",
            self.accel_type,
            triangles.len()
        );
        self.accel = None;
        self.accel = Some(Arc::new(Accel::new(self.accel_type, triangles)));
    }
    fn built(&self) -> &Accel {
        match self.accel {
            Some(ref accel) => accel.as_ref(),
            None => panic!(
                "{} accelerator queried before construct() was called",
                self.accel_type
            ),
        }
    }
    /// Index of the nearest triangle along *ray* closer than
    /// `hit.distance`, with *hit* updated to describe it, or `None`
    /// (and *hit* untouched) if there is none.
    pub fn intersect(&self, ray: &Ray, hit: &mut Hitpoint) -> Option<usize> {
        self.built().intersect(ray, hit)
    }
    /// Answer many independent queries on the rayon thread pool. The
    /// results are in the order of *rays*.
    pub fn intersect_batch(&self, rays: &[Ray]) -> Vec<(Option<usize>, Hitpoint)> {
        let accel: &Accel = self.built();
        rays.par_iter()
            .map(|ray| {
                let mut hit: Hitpoint = Hitpoint::default();
                let hit_id: Option<usize> = accel.intersect(ray, &mut hit);
                (hit_id, hit)
            })
            .collect()
    }
    pub fn world_bound(&self) -> Bounds3f {
        self.built().world_bound()
    }
    pub fn leaf_triangles(&self) -> Vec<(Bounds3f, usize)> {
        self.built().leaf_triangles()
    }
    pub fn node_count(&self) -> usize {
        self.built().node_count()
    }
}

/// Test *ray* against every triangle. With *cull_back_faces* only hits
/// on the front face count, which is what the QBVH reports.
pub fn intersect_brute_force(
    triangles: &[Triangle],
    ray: &Ray,
    hit: &mut Hitpoint,
    cull_back_faces: bool,
) -> Option<usize> {
    let mut hit_id: Option<usize> = None;
    for (i, tri) in triangles.iter().enumerate() {
        if let Some(isect) = tri.intersect(ray) {
            if isect.distance < hit.distance
                && (!cull_back_faces || vec3_dot_nrmf(&ray.d, &isect.normal) < 0.0)
            {
                *hit = isect;
                hit_id = Some(i);
            }
        }
    }
    hit_id
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::geometry::{Point3f, Vector3f};
    use strum::IntoEnumIterator;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn accel_type_names() {
        assert_eq!(AccelType::default(), AccelType::Qbvh);
        let names: Vec<String> = AccelType::iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["kdtree", "bbvh", "qbvh"]);
        assert_eq!(AccelType::from_name("BBVH").unwrap(), AccelType::Bbvh);
        match AccelType::from_name("octree") {
            Err(Error::UnknownAccelerator(name)) => assert_eq!(name, "octree"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "before construct")]
    fn query_before_construct_panics() {
        let accel = Accelerator::new(AccelType::KdTree);
        let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let mut hit = Hitpoint::default();
        accel.intersect(&ray, &mut hit);
    }

    #[test]
    fn changing_type_drops_the_tree() {
        let mut accel = Accelerator::new(AccelType::Bbvh);
        accel.construct(&[unit_triangle()]);
        assert!(accel.is_constructed());
        accel.set_accel_type(AccelType::Bbvh);
        assert!(accel.is_constructed());
        accel.set_accel_type(AccelType::KdTree);
        assert!(!accel.is_constructed());
        assert_eq!(accel.accel_type(), AccelType::KdTree);
    }

    #[test]
    fn clones_keep_their_tree_across_rebuilds() {
        let mut accel = Accelerator::new(AccelType::Bbvh);
        accel.construct(&[unit_triangle()]);
        let old = accel.clone();
        accel.construct(&[]);
        let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let mut hit = Hitpoint::default();
        assert_eq!(old.intersect(&ray, &mut hit), Some(0));
        let mut hit = Hitpoint::default();
        assert_eq!(accel.intersect(&ray, &mut hit), None);
    }

    #[test]
    fn brute_force_culling() {
        let tris = vec![unit_triangle()];
        let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let mut hit = Hitpoint::default();
        assert_eq!(intersect_brute_force(&tris, &ray, &mut hit, false), Some(0));
        let mut hit = Hitpoint::default();
        assert_eq!(intersect_brute_force(&tris, &ray, &mut hit, true), None);
    }

    #[test]
    fn batch_matches_single_queries() {
        let tris = vec![unit_triangle()];
        let mut accel = Accelerator::default();
        accel.construct(&tris);
        let rays: Vec<Ray> = (0..16)
            .map(|i| {
                let x = i as f32 * 0.1;
                Ray::new(Point3f::new(x, 0.1, 1.0), Vector3f::new(0.0, 0.0, -1.0))
            })
            .collect();
        let results = accel.intersect_batch(&rays);
        assert_eq!(results.len(), rays.len());
        for (ray, (hit_id, hit)) in rays.iter().zip(results.iter()) {
            let mut single = Hitpoint::default();
            assert_eq!(accel.intersect(ray, &mut single), *hit_id);
            assert_eq!(single.distance, hit.distance);
        }
    }
}
