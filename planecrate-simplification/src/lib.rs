//! Structure-aware mesh polygonization
//!
//! This crate turns the candidate faces of a structure graph into a compact
//! polygonal mesh:
//! - Binary program model and solver backends
//! - Optimization formulation with fitting, coverage and complexity terms
//! - Result extraction into a welded, consistently oriented polygon mesh
//! - The end-to-end polygonization pipeline

pub mod program;
pub mod solver;
#[cfg(feature = "microlp")]
pub mod microlp;
pub mod optimization;
pub mod extraction;
pub mod simplification;
pub mod pipeline;

pub use program::*;
pub use solver::*;
#[cfg(feature = "microlp")]
pub use microlp::*;
pub use optimization::*;
pub use extraction::*;
pub use simplification::*;
pub use pipeline::*;

use planecrate_core::{PolygonMesh, Result};

/// Simplify a mesh into a compact polygonal mesh
pub trait MeshSimplifier {
    /// Simplify a copy of `mesh`; the input is left untouched
    fn simplify(&self, mesh: &PolygonMesh) -> Result<SimplificationOutcome>;
}
