//! The geometry of a particular point on a surface is represented by
//! a **Hitpoint**. The accelerators fill one in for the closest
//! triangle a ray hits; its distance doubles as the upper bound of
//! the search, so a caller can restrict a query to a segment of the
//! ray by lowering it before the call.

// pbrt
use crate::core::geometry::{Normal3f, Point2f, Point3f};
use crate::core::pbrt::{Float, INFINITY};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Hitpoint {
    /// parametric distance along the ray
    pub distance: Float,
    pub position: Point3f,
    /// geometric normal of the triangle that was hit
    pub normal: Normal3f,
    /// barycentric (u, v) of the hit inside the triangle
    pub texcoord: Point2f,
}

impl Default for Hitpoint {
    fn default() -> Self {
        Hitpoint {
            distance: INFINITY,
            position: Point3f::default(),
            normal: Normal3f::default(),
            texcoord: Point2f {
                x: INFINITY,
                y: INFINITY,
            },
        }
    }
}

impl Hitpoint {
    pub fn with_max_distance(max_distance: Float) -> Self {
        Hitpoint {
            distance: max_distance,
            ..Hitpoint::default()
        }
    }
}
