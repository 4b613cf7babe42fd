//! Geometric analysis stages for planecrate
//!
//! This crate turns a dense mesh into the combinatorial input of the
//! polygonization optimizer:
//! - Per-vertex and per-face planarity estimation
//! - Region-growing planar segmentation with chart refinement
//! - Chart queries (orientation, border, centroid, ...)
//! - Structure graph over charts with importance weights
//! - Candidate faces and intersection edges with their fans

pub mod parallel;
pub mod planarity;
pub mod segmentation;
pub mod segment;
pub mod structure_graph;
pub mod hypothesis;

pub use parallel::*;
pub use planarity::*;
pub use segmentation::*;
pub use structure_graph::*;
pub use hypothesis::*;
