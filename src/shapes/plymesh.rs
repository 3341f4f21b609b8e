//! Read triangle meshes from PLY files with `ply-rs`. Only the vertex
//! positions (`x`, `y`, `z`) and the face index lists
//! (`vertex_indices` or `vertex_index`) are used, every other element
//! and property is ignored.

// std
use std::fs::File;
use std::path::Path;
// others
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Ply, Property};
// pbrt
use crate::core::error::{Error, Result};
use crate::core::geometry::Point3f;
use crate::core::pbrt::Float;
use crate::shapes::trimesh::TriangleMesh;

fn property_as_float(property: &Property) -> Option<Float> {
    match *property {
        Property::Char(v) => Some(v as Float),
        Property::UChar(v) => Some(v as Float),
        Property::Short(v) => Some(v as Float),
        Property::UShort(v) => Some(v as Float),
        Property::Int(v) => Some(v as Float),
        Property::UInt(v) => Some(v as Float),
        Property::Float(v) => Some(v),
        Property::Double(v) => Some(v as Float),
        _ => None,
    }
}

fn property_as_indices(property: &Property) -> Option<Vec<i64>> {
    match property {
        Property::ListChar(l) => Some(l.iter().map(|&i| i as i64).collect()),
        Property::ListUChar(l) => Some(l.iter().map(|&i| i as i64).collect()),
        Property::ListShort(l) => Some(l.iter().map(|&i| i as i64).collect()),
        Property::ListUShort(l) => Some(l.iter().map(|&i| i as i64).collect()),
        Property::ListInt(l) => Some(l.iter().map(|&i| i as i64).collect()),
        Property::ListUInt(l) => Some(l.iter().map(|&i| i as i64).collect()),
        _ => None,
    }
}

fn invalid(path: &Path, reason: String) -> Error {
    Error::InvalidMesh {
        path: path.to_path_buf(),
        reason,
    }
}

/// Load *path* as a triangle mesh. Polygons are split into a fan of
/// triangles around their first corner; faces with fewer than three
/// corners are skipped.
pub fn read_ply(path: &Path) -> Result<TriangleMesh> {
    let mut file: File = File::open(path)?;
    let parser = Parser::<DefaultElement>::new();
    let ply: Ply<DefaultElement> = parser.read_ply(&mut file)?;
    let vertices: &Vec<DefaultElement> = ply
        .payload
        .get("vertex")
        .ok_or_else(|| invalid(path, "no vertex element".to_string()))?;
    let mut p: Vec<Point3f> = Vec::with_capacity(vertices.len());
    for (i, vertex) in vertices.iter().enumerate() {
        let mut xyz: [Float; 3] = [0.0; 3];
        for (c, name) in ["x", "y", "z"].iter().enumerate() {
            xyz[c] = vertex
                .get(*name)
                .and_then(property_as_float)
                .ok_or_else(|| invalid(path, format!("vertex {} has no scalar {}", i, name)))?;
        }
        p.push(Point3f::new(xyz[0], xyz[1], xyz[2]));
    }
    let mut vertex_indices: Vec<[usize; 3]> = Vec::new();
    let mut n_skipped: usize = 0;
    if let Some(faces) = ply.payload.get("face") {
        for (i, face) in faces.iter().enumerate() {
            let indices: Vec<i64> = face
                .get("vertex_indices")
                .or_else(|| face.get("vertex_index"))
                .and_then(property_as_indices)
                .ok_or_else(|| invalid(path, format!("face {} has no index list", i)))?;
            if let Some(&bad) = indices.iter().find(|&&v| v < 0 || v as usize >= p.len()) {
                return Err(invalid(
                    path,
                    format!("face {} refers to vertex {} of {}", i, bad, p.len()),
                ));
            }
            if indices.len() < 3 {
                n_skipped += 1;
                continue;
            }
            for k in 1..(indices.len() - 1) {
                vertex_indices.push([
                    indices[0] as usize,
                    indices[k] as usize,
                    indices[k + 1] as usize,
                ]);
            }
        }
    }
    if n_skipped > 0 {
        warn!(
            "{}: skipped {} face(s) with fewer than three corners",
            path.display(),
            n_skipped
        );
    }
    info!(
        "{}: {} vertices, {} triangles",
        path.display(),
        p.len(),
        vertex_indices.len()
    );
    TriangleMesh::new(p, vertex_indices).map_err(|e| match e {
        Error::InvalidMesh { reason, .. } => invalid(path, reason),
        other => other,
    })
}
