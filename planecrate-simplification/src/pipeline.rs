//! End-to-end polygonization pipeline
//!
//! Planarity, segmentation, structure graph and simplification run in order
//! on one mesh. Each phase writes its own attributes, so after a run the
//! mesh can be inspected or exported whatever the solver outcome.

use crate::optimization::ObjectiveWeights;
use crate::simplification::{Simplification, SimplificationOutcome};
use crate::solver::SolverName;
use crate::MeshSimplifier;
use planecrate_algorithms::{PlanarSegmentation, Planarity, StructureGraph, ThreadPoolConfig};
use planecrate_core::{Error, PolygonMesh, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

/// Configuration for the polygonization pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolygonizationConfig {
    /// Neighborhood radius for planarity and seed planes, in edge hops
    pub num_rings: usize,
    /// Maximum distance of a face vertex from its chart plane
    pub dist_threshold: f64,
    /// Minimum structure graph edge importance, in percent
    pub importance_threshold: f64,
    /// Objective term weights
    pub weights: ObjectiveWeights,
    /// Solver backend
    pub solver: SolverName,
    /// Worker pool for the planarity passes
    pub threads: ThreadPoolConfig,
}

impl Default for PolygonizationConfig {
    fn default() -> Self {
        Self {
            num_rings: 3,
            dist_threshold: 0.8,
            importance_threshold: 0.0,
            weights: ObjectiveWeights::default(),
            solver: SolverName::default(),
            threads: ThreadPoolConfig::default(),
        }
    }
}

impl PolygonizationConfig {
    pub fn with_num_rings(mut self, num_rings: usize) -> Self {
        self.num_rings = num_rings;
        self
    }

    pub fn with_dist_threshold(mut self, dist_threshold: f64) -> Self {
        self.dist_threshold = dist_threshold;
        self
    }

    pub fn with_importance_threshold(mut self, importance_threshold: f64) -> Self {
        self.importance_threshold = importance_threshold;
        self
    }

    pub fn with_weights(mut self, weights: ObjectiveWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_solver(mut self, solver: SolverName) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_threads(mut self, threads: ThreadPoolConfig) -> Self {
        self.threads = threads;
        self
    }

    /// Check every parameter before any work starts
    pub fn validate(&self) -> Result<()> {
        if !self.dist_threshold.is_finite() || self.dist_threshold <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "distance threshold must be positive, got {}",
                self.dist_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.importance_threshold) {
            return Err(Error::InvalidParameter(format!(
                "importance threshold must be in [0, 100], got {}",
                self.importance_threshold
            )));
        }
        self.weights.validate()?;
        self.threads.validate()
    }
}

/// Seconds spent in each phase
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub planarity: f32,
    pub segmentation: f32,
    pub structure_graph: f32,
    pub simplification: f32,
}

impl PhaseTimings {
    pub fn total(&self) -> f32 {
        self.planarity + self.segmentation + self.structure_graph + self.simplification
    }
}

/// What a pipeline run produced
#[derive(Debug, Clone)]
pub struct PolygonizationReport {
    pub segment_count: usize,
    pub graph: StructureGraph,
    pub outcome: SimplificationOutcome,
    pub timings: PhaseTimings,
}

/// Runs every stage of the polygonization on a mesh
#[derive(Debug, Clone)]
pub struct Polygonizer {
    config: PolygonizationConfig,
}

impl Polygonizer {
    pub fn new(config: PolygonizationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PolygonizationConfig {
        &self.config
    }

    /// Run the pipeline.
    ///
    /// The mesh receives the planarity, segmentation and importance
    /// attributes; its geometry is not changed. A solver failure is reported
    /// in the outcome and is not an error.
    pub fn run(&self, mesh: &mut PolygonMesh) -> Result<PolygonizationReport> {
        let config = &self.config;
        let mut timings = PhaseTimings::default();

        let start = Instant::now();
        Planarity::new(&config.threads)?.compute(mesh, config.num_rings)?;
        timings.planarity = start.elapsed().as_secs_f32();

        let start = Instant::now();
        let segment_count = PlanarSegmentation::new(config.dist_threshold, config.num_rings).apply(mesh)?;
        timings.segmentation = start.elapsed().as_secs_f32();

        let start = Instant::now();
        let graph = StructureGraph::construct(mesh, segment_count, config.importance_threshold)?;
        timings.structure_graph = start.elapsed().as_secs_f32();

        let start = Instant::now();
        let outcome = Simplification::new(config.weights)?.apply(mesh, &graph, config.solver)?;
        timings.simplification = start.elapsed().as_secs_f32();

        info!(
            segment_count,
            simplified = outcome.is_simplified(),
            planarity_s = timings.planarity,
            segmentation_s = timings.segmentation,
            structure_graph_s = timings.structure_graph,
            simplification_s = timings.simplification,
            "polygonization finished"
        );

        Ok(PolygonizationReport {
            segment_count,
            graph,
            outcome,
            timings,
        })
    }
}

impl MeshSimplifier for Polygonizer {
    fn simplify(&self, mesh: &PolygonMesh) -> Result<SimplificationOutcome> {
        let mut working = mesh.clone();
        Ok(self.run(&mut working)?.outcome)
    }
}
