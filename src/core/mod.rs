pub mod error;
pub mod geometry;
pub mod interaction;
pub mod pbrt;
pub mod rng;
pub mod simd;
