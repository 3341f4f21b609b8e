//! # rs_accel
//!
//! Acceleration structures answering closest-hit queries of rays
//! against a static soup of triangles, the way an offline ray tracer
//! needs them:
//!
//! 1. [bbvh] binary bounding volume hierarchy built with the surface
//!    area heuristic, one triangle per leaf
//! 2. [qbvh] four-wide hierarchy, testing four child boxes and up to
//!    four triangles per step
//! 3. [kdtree] median split tree with a plain stack traversal
//!
//! All three sit behind the [Accelerator] façade, which picks the
//! structure by name and answers `intersect` queries from any number
//! of threads once it has been constructed.
//!
//! [bbvh]: accelerators/bvh/struct.BBVHAccel.html
//! [qbvh]: accelerators/qbvh/struct.QBVHAccel.html
//! [kdtree]: accelerators/kdtreeaccel/struct.KdTreeAccel.html
//! [Accelerator]: accelerators/struct.Accelerator.html

#[macro_use]
extern crate impl_ops;
#[macro_use]
extern crate log;

pub mod accelerators;
pub mod blockqueue;
pub mod core;
pub mod shapes;
