//! The accelerators only know about individual triangles, each one
//! storing the positions of its three vertices.
//!
//! ## Triangles
//!
//! A **Triangle** is three points plus the Möller–Trumbore ray test;
//! centroid, normal and area are derived when needed.
//!
//! ## Triangle Meshes
//!
//! A more memory-efficient representation is to separately store
//! entire triangle meshes with an array of vertex positions where each
//! individual triangle just stores three offsets into this array for
//! its three vertices. The **TriangleMesh** expands its faces into
//! triangles when an accelerator gets built over it.
//!
//! ## PLY Files
//!
//! Meshes can be read from [PLY][ply] files, ASCII or binary. Faces
//! with more than three corners are split into a fan of triangles.
//!
//! [ply]: http://paulbourke.net/dataformats/ply/

pub mod plymesh;
pub mod triangle;
pub mod trimesh;
