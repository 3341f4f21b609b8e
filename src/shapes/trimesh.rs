//! Indexed triangle mesh owning its vertex data and, once built, an
//! [Accelerator] over its faces.
//!
//! [Accelerator]: ../../accelerators/struct.Accelerator.html

// std
use std::path::Path;
// pbrt
use crate::accelerators::{AccelType, Accelerator};
use crate::core::error::{Error, Result};
use crate::core::geometry::{bnd3_union_pnt3f, Bounds3f, Normal3f, Point3f, Ray, Vector3f};
use crate::core::interaction::Hitpoint;
use crate::core::pbrt::{Float, INFINITY};
use crate::shapes::plymesh::read_ply;
use crate::shapes::triangle::Triangle;

#[derive(Debug, Default, Clone)]
pub struct TriangleMesh {
    /// vertex positions
    pub p: Vec<Point3f>,
    /// per-vertex normals, averaged over the faces sharing a vertex
    pub n: Vec<Normal3f>,
    pub vertex_indices: Vec<[usize; 3]>,
    accel: Accelerator,
}

impl TriangleMesh {
    /// Mesh from vertex positions and faces. Fails if a face refers to
    /// a vertex that does not exist.
    pub fn new(p: Vec<Point3f>, vertex_indices: Vec<[usize; 3]>) -> Result<Self> {
        if let Some(face) = vertex_indices.iter().find(|f| f.iter().any(|&i| i >= p.len())) {
            return Err(Error::InvalidMesh {
                path: Default::default(),
                reason: format!("face {:?} refers to one of {} vertices", face, p.len()),
            });
        }
        let mut mesh: TriangleMesh = TriangleMesh {
            p,
            n: Vec::new(),
            vertex_indices,
            accel: Accelerator::default(),
        };
        mesh.calc_vertex_normals();
        Ok(mesh)
    }
    /// Mesh with three vertices of its own per triangle.
    pub fn from_triangles(triangles: &[Triangle]) -> Self {
        let mut p: Vec<Point3f> = Vec::with_capacity(3 * triangles.len());
        let mut vertex_indices: Vec<[usize; 3]> = Vec::with_capacity(triangles.len());
        for tri in triangles {
            let first: usize = p.len();
            p.extend_from_slice(&tri.p);
            vertex_indices.push([first, first + 1, first + 2]);
        }
        let mut mesh: TriangleMesh = TriangleMesh {
            p,
            n: Vec::new(),
            vertex_indices,
            accel: Accelerator::default(),
        };
        mesh.calc_vertex_normals();
        mesh
    }
    /// Read a mesh file, the format is picked by the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let extension: Option<String> = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("ply") => read_ply(path),
            _ => Err(Error::UnsupportedMeshFormat(path.to_path_buf())),
        }
    }
    pub fn n_triangles(&self) -> usize {
        self.vertex_indices.len()
    }
    pub fn n_vertices(&self) -> usize {
        self.p.len()
    }
    pub fn triangle(&self, i: usize) -> Triangle {
        let face: &[usize; 3] = &self.vertex_indices[i];
        Triangle::new(self.p[face[0]], self.p[face[1]], self.p[face[2]])
    }
    pub fn triangles(&self) -> Vec<Triangle> {
        (0..self.n_triangles()).map(|i| self.triangle(i)).collect()
    }
    pub fn area(&self) -> Float {
        (0..self.n_triangles()).map(|i| self.triangle(i).area()).sum()
    }
    pub fn bounds(&self) -> Bounds3f {
        self.p
            .iter()
            .fold(Bounds3f::default(), |b, p| bnd3_union_pnt3f(&b, p))
    }
    pub fn translate(&mut self, delta: &Vector3f) {
        for p in self.p.iter_mut() {
            *p += *delta;
        }
    }
    /// Scale every vertex position per axis about the origin.
    pub fn scale(&mut self, s: &Vector3f) {
        for p in self.p.iter_mut() {
            p.x *= s.x;
            p.y *= s.y;
            p.z *= s.z;
        }
        self.calc_vertex_normals();
    }
    /// Scale uniformly and translate the mesh so it is centered in
    /// *target* and as large as possible without leaving it.
    pub fn fit_to_bounds(&mut self, target: &Bounds3f) {
        let org: Bounds3f = self.bounds();
        if org.is_empty() {
            return;
        }
        let target_size: Vector3f = target.diagonal();
        let org_size: Vector3f = org.diagonal();
        let mut scale: Float = INFINITY;
        for (t, o) in [
            (target_size.x, org_size.x),
            (target_size.y, org_size.y),
            (target_size.z, org_size.z),
        ]
        .iter()
        {
            if *o > 0.0 as Float {
                scale = scale.min(t / o);
            }
        }
        if scale.is_finite() {
            self.scale(&Vector3f::new(scale, scale, scale));
        }
        let center: Point3f = self.bounds().centroid();
        self.translate(&(target.centroid() - center));
    }
    fn calc_vertex_normals(&mut self) {
        let mut normals: Vec<Normal3f> = vec![Normal3f::default(); self.p.len()];
        for i in 0..self.n_triangles() {
            let n: Normal3f = self.triangle(i).normal();
            if n.x.is_nan() || n.y.is_nan() || n.z.is_nan() {
                continue;
            }
            for &v in &self.vertex_indices[i] {
                normals[v] += n;
            }
        }
        for n in normals.iter_mut() {
            if n.length_squared() > 0.0 as Float {
                *n = n.normalize();
            }
        }
        self.n = normals;
    }
    /// Build an accelerator of the given type over the faces,
    /// replacing any previous one.
    pub fn build_accel(&mut self, accel_type: AccelType) {
        let triangles: Vec<Triangle> = self.triangles();
        self.accel.set_accel_type(accel_type);
        self.accel.construct(&triangles);
    }
    pub fn accelerator(&self) -> &Accelerator {
        &self.accel
    }
    /// Nearest hit anywhere along *ray*; the incoming distance in *hit*
    /// is ignored. Panics if `build_accel` was never called.
    pub fn intersect(&self, ray: &Ray, hit: &mut Hitpoint) -> bool {
        hit.distance = INFINITY;
        self.accel.intersect(ray, hit).is_some()
    }
}
