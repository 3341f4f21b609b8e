use std::io::Write;

use rs_accel::accelerators::AccelType;
use rs_accel::core::error::Error;
use rs_accel::core::geometry::{Point3f, Ray, Vector3f};
use rs_accel::core::interaction::Hitpoint;
use rs_accel::shapes::trimesh::TriangleMesh;
use strum::IntoEnumIterator;

const CUBE_VERTICES: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

// counter-clockwise seen from outside, so every normal points outwards
const CUBE_FACES: [[i32; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [1, 2, 6, 5],
    [0, 4, 7, 3],
];

fn header(format: &str) -> String {
    format!(
        "ply\n\
         format {} 1.0\n\
         comment unit cube\n\
         element vertex 8\n\
         property float x\n\
         property float y\n\
         property float z\n\
         element face 6\n\
         property list uchar int vertex_indices\n\
         end_header\n",
        format
    )
}

fn ascii_cube() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".ply").tempfile().unwrap();
    let mut contents = header("ascii");
    for v in CUBE_VERTICES.iter() {
        contents.push_str(&format!("{} {} {}\n", v[0], v[1], v[2]));
    }
    for f in CUBE_FACES.iter() {
        contents.push_str(&format!("4 {} {} {} {}\n", f[0], f[1], f[2], f[3]));
    }
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn binary_cube() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".PLY").tempfile().unwrap();
    let mut contents: Vec<u8> = header("binary_little_endian").into_bytes();
    for v in CUBE_VERTICES.iter() {
        for c in v.iter() {
            contents.extend_from_slice(&c.to_le_bytes());
        }
    }
    for f in CUBE_FACES.iter() {
        contents.push(4_u8);
        for i in f.iter() {
            contents.extend_from_slice(&i.to_le_bytes());
        }
    }
    file.write_all(&contents).unwrap();
    file.flush().unwrap();
    file
}

fn check_cube(mesh: &TriangleMesh) {
    assert_eq!(mesh.n_vertices(), 8);
    assert_eq!(mesh.n_triangles(), 12);
    assert!((mesh.area() - 6.0).abs() < 1.0e-5);
    let b = mesh.bounds();
    assert_eq!(b.p_min, Point3f::new(0.0, 0.0, 0.0));
    assert_eq!(b.p_max, Point3f::new(1.0, 1.0, 1.0));
}

#[test]
fn ascii_and_binary_ply_agree() {
    let ascii = ascii_cube();
    let binary = binary_cube();
    let a = TriangleMesh::load(ascii.path()).unwrap();
    let b = TriangleMesh::load(binary.path()).unwrap();
    check_cube(&a);
    check_cube(&b);
    assert_eq!(a.vertex_indices, b.vertex_indices);
    assert_eq!(a.triangles(), b.triangles());
}

#[test]
fn rays_from_outside_hit_the_cube() {
    let file = ascii_cube();
    let mut mesh = TriangleMesh::load(file.path()).unwrap();
    let ray = Ray::new(Point3f::new(0.3, 0.6, -2.0), Vector3f::new(0.0, 0.0, 1.0));
    for accel_type in AccelType::iter() {
        mesh.build_accel(accel_type);
        assert_eq!(mesh.accelerator().accel_type(), accel_type);
        let mut hit = Hitpoint::default();
        assert!(mesh.intersect(&ray, &mut hit), "{}", accel_type);
        assert!((hit.distance - 2.0).abs() < 1.0e-5);
        assert!((hit.normal.z + 1.0).abs() < 1.0e-6);
    }
}

#[test]
fn only_qbvh_ignores_the_inside_of_the_cube() {
    let file = binary_cube();
    let mut mesh = TriangleMesh::load(file.path()).unwrap();
    let ray = Ray::new(Point3f::new(0.5, 0.3, 0.6), Vector3f::new(1.0, 0.0, 0.0));
    for accel_type in AccelType::iter() {
        mesh.build_accel(accel_type);
        let mut hit = Hitpoint::default();
        let hit_any: bool = mesh.intersect(&ray, &mut hit);
        if accel_type == AccelType::Qbvh {
            assert!(!hit_any);
        } else {
            assert!(hit_any);
            assert!((hit.distance - 0.5).abs() < 1.0e-6);
        }
    }
}

#[test]
fn fitted_mesh_is_centered() {
    let file = ascii_cube();
    let mut mesh = TriangleMesh::load(file.path()).unwrap();
    let target = rs_accel::core::geometry::Bounds3f::new(
        Point3f::new(-2.0, -1.0, -1.0),
        Point3f::new(2.0, 1.0, 1.0),
    );
    mesh.fit_to_bounds(&target);
    let b = mesh.bounds();
    assert!((b.p_min.x + 1.0).abs() < 1.0e-6 && (b.p_max.x - 1.0).abs() < 1.0e-6);
    assert!((b.p_min.z + 1.0).abs() < 1.0e-6 && (b.p_max.z - 1.0).abs() < 1.0e-6);
    assert!((mesh.area() - 24.0).abs() < 1.0e-4);
}

#[test]
fn unsupported_and_missing_files() {
    let stl = tempfile::Builder::new().suffix(".stl").tempfile().unwrap();
    assert!(matches!(
        TriangleMesh::load(stl.path()),
        Err(Error::UnsupportedMeshFormat(_))
    ));
    assert!(matches!(
        TriangleMesh::load(std::path::Path::new("/no/such/mesh.ply")),
        Err(Error::Io(_))
    ));
}
