//! Planarity estimation
//!
//! Each vertex gets the quality of the least-squares plane through its k-ring,
//! and each face the mean score of its vertices.

use crate::parallel::{ThreadPoolConfig, WorkerPool};
use planecrate_core::{Plane, Point3d, PolygonMesh, Result};
use tracing::{debug, info};

/// Score given to neighborhoods that admit no plane (single points, collinear rings)
pub const DEGENERATE_PLANARITY: f64 = 0.0;

/// Planarity estimator running on a bounded worker pool
#[derive(Debug)]
pub struct Planarity {
    pool: WorkerPool,
}

impl Planarity {
    pub fn new(threads: &ThreadPoolConfig) -> Result<Self> {
        Ok(Self {
            pool: WorkerPool::new(threads)?,
        })
    }

    pub fn with_pool(pool: WorkerPool) -> Self {
        Self { pool }
    }

    /// Compute vertex and face planarity and store both on the mesh.
    ///
    /// # Arguments
    /// * `mesh` - Mesh whose planarity attributes are overwritten
    /// * `num_rings` - Neighborhood radius in edge hops
    ///
    /// Scores lie in [0, 1]. The face pass only starts once every vertex score
    /// is available.
    pub fn compute(&self, mesh: &mut PolygonMesh, num_rings: usize) -> Result<()> {
        let vertex_scores = {
            let mesh: &PolygonMesh = mesh;
            self.pool.map_indexed(mesh.vertex_count(), |v| vertex_planarity(mesh, v, num_rings))
        };

        let face_scores = {
            let mesh: &PolygonMesh = mesh;
            let scores = &vertex_scores;
            self.pool.map_indexed(mesh.face_count(), |f| {
                let face = mesh.face(f);
                face.iter().map(|&v| scores[v]).sum::<f64>() / face.len() as f64
            })
        };

        let degenerate = vertex_scores.iter().filter(|&&s| s == DEGENERATE_PLANARITY).count();
        debug!(degenerate, "vertices without a fitting plane");

        mesh.set_vertex_planarity(vertex_scores)?;
        mesh.set_face_planarity(face_scores)?;

        info!(
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            num_rings,
            threads = self.pool.current_num_threads(),
            "planarity computed"
        );
        Ok(())
    }
}

/// Planarity of one vertex's `num_rings`-ring
pub fn vertex_planarity(mesh: &PolygonMesh, vertex: usize, num_rings: usize) -> f64 {
    let ring = mesh.topology().vertex_k_ring(vertex, num_rings);
    let points: Vec<Point3d> = ring.iter().map(|&v| *mesh.vertex(v)).collect();
    Plane::fit(&points).map_or(DEGENERATE_PLANARITY, |fit| fit.quality)
}
