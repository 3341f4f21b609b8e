// std
use std::ops::Index;
// pbrt
use crate::core::geometry::{bnd3_union_pnt3f, vec3_cross_vec3, vec3_dot_vec3f};
use crate::core::geometry::{Bounds3f, Normal3f, Point2f, Point3f, Ray, Vector3f};
use crate::core::interaction::Hitpoint;
use crate::core::pbrt::{Float, TRIANGLE_EPSILON};

/// Three points in world space. Centroid, normal and area are
/// derived on demand, nothing else is stored.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub p: [Point3f; 3],
}

impl Triangle {
    pub fn new(p0: Point3f, p1: Point3f, p2: Point3f) -> Self {
        Triangle { p: [p0, p1, p2] }
    }
    /// Center of gravity of the three vertices.
    pub fn centroid(&self) -> Point3f {
        (self.p[0] + self.p[1] + self.p[2]) / 3.0 as Float
    }
    /// Unit normal following the winding p0 -> p1 -> p2. NaN for a
    /// degenerate triangle.
    pub fn normal(&self) -> Normal3f {
        let e1: Vector3f = self.p[1] - self.p[0];
        let e2: Vector3f = self.p[2] - self.p[0];
        Normal3f::from(vec3_cross_vec3(&e1, &e2).normalize())
    }
    pub fn area(&self) -> Float {
        let e1: Vector3f = self.p[1] - self.p[0];
        let e2: Vector3f = self.p[2] - self.p[0];
        0.5 as Float * vec3_cross_vec3(&e1, &e2).length()
    }
    /// Largest determinant magnitude the ray/triangle test treats as
    /// parallel for the edges *e1* and *e2*. Scales with the edges, so
    /// tiny triangles are not mistaken for parallel ones.
    pub fn parallel_threshold(e1: &Vector3f, e2: &Vector3f) -> Float {
        TRIANGLE_EPSILON * e1.length() * e2.length()
    }
    pub fn world_bound(&self) -> Bounds3f {
        let b: Bounds3f = Bounds3f::new(self.p[0], self.p[1]);
        bnd3_union_pnt3f(&b, &self.p[2])
    }
    /// Möller–Trumbore ray/triangle test. Returns the hit in front of
    /// the ray origin, if any; rays (nearly) parallel to the plane of
    /// the triangle miss.
    pub fn intersect(&self, ray: &Ray) -> Option<Hitpoint> {
        let e1: Vector3f = self.p[1] - self.p[0];
        let e2: Vector3f = self.p[2] - self.p[0];
        let p_vec: Vector3f = vec3_cross_vec3(&ray.d, &e2);
        let det: Float = vec3_dot_vec3f(&e1, &p_vec);
        // NaN counts as parallel
        if det.abs() <= Triangle::parallel_threshold(&e1, &e2) || det.is_nan() {
            return None;
        }
        let inv_det: Float = 1.0 as Float / det;
        let t_vec: Vector3f = ray.o - self.p[0];
        let u: Float = vec3_dot_vec3f(&t_vec, &p_vec) * inv_det;
        if u < 0.0 || u > 1.0 {
            return None;
        }
        let q_vec: Vector3f = vec3_cross_vec3(&t_vec, &e1);
        let v: Float = vec3_dot_vec3f(&ray.d, &q_vec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t: Float = vec3_dot_vec3f(&e2, &q_vec) * inv_det;
        if t > TRIANGLE_EPSILON {
            Some(Hitpoint {
                distance: t,
                position: ray.position(t),
                normal: self.normal(),
                texcoord: Point2f { x: u, y: v },
            })
        } else {
            None
        }
    }
}

impl Index<usize> for Triangle {
    type Output = Point3f;
    fn index(&self, i: usize) -> &Point3f {
        &self.p[i]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_triangle() -> Triangle {
        Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        )
    }

    #[test]
    fn derived_quantities() {
        let tri = unit_triangle();
        assert_eq!(tri.area(), 0.5);
        assert_eq!(tri.normal(), Normal3f { x: 0.0, y: 0.0, z: 1.0 });
        let c = tri.centroid();
        assert!((c.x - 1.0 / 3.0).abs() < 1.0e-6 && (c.y - 1.0 / 3.0).abs() < 1.0e-6);
        let b = tri.world_bound();
        assert_eq!(b.p_min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(b.p_max, Point3f::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn ray_through_interior_hits() {
        let ray = Ray::new(Point3f::new(0.2, 0.2, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        let hit = unit_triangle().intersect(&ray).unwrap();
        assert!((hit.distance - 1.0).abs() < 1.0e-6);
        assert!((hit.position.x - 0.2).abs() < 1.0e-6);
        assert!(hit.position.z.abs() < 1.0e-6);
        assert!((hit.texcoord.x - 0.2).abs() < 1.0e-6);
        assert!((hit.texcoord.y - 0.2).abs() < 1.0e-6);
    }

    #[test]
    fn ray_beside_triangle_misses() {
        let ray = Ray::new(Point3f::new(5.0, 5.0, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(unit_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn triangle_behind_origin_misses() {
        let ray = Ray::new(Point3f::new(0.2, 0.2, 1.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(unit_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let ray = Ray::new(Point3f::new(-1.0, 0.2, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        assert!(unit_triangle().intersect(&ray).is_none());
    }

    #[test]
    fn back_face_still_hits() {
        let ray = Ray::new(Point3f::new(0.2, 0.2, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let hit = unit_triangle().intersect(&ray).unwrap();
        assert!((hit.distance - 1.0).abs() < 1.0e-6);
    }

    #[test]
    fn sub_millimetre_triangle_hits() {
        let tri = Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(5.0e-4, 0.0, 0.0),
            Point3f::new(0.0, 5.0e-4, 0.0),
        );
        let ray = Ray::new(Point3f::new(1.0e-4, 1.0e-4, 1.0), Vector3f::new(0.0, 0.0, -1.0));
        let hit = tri.intersect(&ray).unwrap();
        assert!((hit.distance - 1.0).abs() < 1.0e-5);
        assert!((hit.texcoord.x - 0.2).abs() < 1.0e-3);
        assert!((hit.texcoord.y - 0.2).abs() < 1.0e-3);
    }

    #[test]
    fn grazing_ray_on_tiny_triangle_misses() {
        let tri = Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(5.0e-4, 0.0, 0.0),
            Point3f::new(0.0, 5.0e-4, 0.0),
        );
        let ray = Ray::new(Point3f::new(-1.0, 1.0e-4, 0.0), Vector3f::new(1.0, 0.0, 0.0));
        assert!(tri.intersect(&ray).is_none());
    }

    #[test]
    fn degenerate_triangle_never_hits() {
        let tri = Triangle::new(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 1.0, 0.0),
            Point3f::new(2.0, 2.0, 0.0),
        );
        assert_eq!(tri.area(), 0.0);
        let ray = Ray::new(Point3f::new(1.0, 1.0, -1.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(tri.intersect(&ray).is_none());
    }
}
