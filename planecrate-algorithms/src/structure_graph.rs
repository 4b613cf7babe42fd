//! Structure graph over planar charts
//!
//! Nodes are charts, weighted by their share of the mesh area. Edges join
//! charts sharing mesh edges when the shared boundary is a large enough part
//! of the smaller chart's border. The graph also carries the candidate faces
//! and intersection edges, which are built from every adjacency regardless of
//! the importance threshold.

use crate::hypothesis::{ChartAdjacency, Hypothesis};
use planecrate_core::{Error, PolygonMesh, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// A chart in the structure graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphNode {
    pub chart: usize,
    pub area: f64,
    /// Percentage of the total mesh area
    pub importance: f64,
}

/// A significant adjacency between two charts, `a < b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphEdge {
    pub a: usize,
    pub b: usize,
    pub shared_length: f64,
    /// Shared length as a percentage of the shorter chart border
    pub importance: f64,
}

/// Chart graph built once from a segmented mesh
#[derive(Debug, Clone)]
pub struct StructureGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    adjacencies: Vec<ChartAdjacency>,
    hypothesis: Hypothesis,
    importance_threshold: f64,
    face_count: usize,
}

impl StructureGraph {
    /// Build the graph of a segmented mesh.
    ///
    /// # Arguments
    /// * `mesh` - Mesh with chart attributes; receives the importance attribute
    /// * `segment_count` - Number of charts returned by segmentation
    /// * `importance_threshold` - Minimum edge importance in percent, exclusive
    pub fn construct(
        mesh: &mut PolygonMesh,
        segment_count: usize,
        importance_threshold: f64,
    ) -> Result<Self> {
        if !(0.0..=100.0).contains(&importance_threshold) {
            return Err(Error::InvalidParameter(format!(
                "importance threshold must be in [0, 100], got {}",
                importance_threshold
            )));
        }
        let charts = mesh.charts()?.to_vec();
        if let Some(&bad) = charts.iter().find(|&&c| c >= segment_count) {
            return Err(Error::InvalidData(format!(
                "chart {} out of range for {} segments",
                bad, segment_count
            )));
        }

        let total_area = mesh.total_area();
        let mut areas = vec![0.0; segment_count];
        let mut sizes = vec![0usize; segment_count];
        for (f, &c) in charts.iter().enumerate() {
            areas[c] += mesh.face_area(f);
            sizes[c] += 1;
        }
        let node_importance: Vec<f64> = areas
            .iter()
            .map(|&area| if total_area > 0.0 { area / total_area * 100.0 } else { 0.0 })
            .collect();
        let nodes: Vec<GraphNode> = (0..segment_count)
            .filter(|&c| sizes[c] > 0)
            .map(|c| GraphNode {
                chart: c,
                area: areas[c],
                importance: node_importance[c],
            })
            .collect();
        mesh.set_importance(charts.iter().map(|&c| node_importance[c]).collect())?;

        let adjacencies = chart_adjacencies(mesh)?;
        let borders = border_lengths(mesh, segment_count)?;
        let edges: Vec<GraphEdge> = adjacencies
            .iter()
            .filter_map(|adjacency| {
                let shorter = borders[adjacency.a].min(borders[adjacency.b]);
                let importance = if shorter > 0.0 {
                    100.0 * adjacency.shared_length / shorter
                } else {
                    0.0
                };
                debug!(a = adjacency.a, b = adjacency.b, importance, "chart adjacency");
                (importance > importance_threshold).then_some(GraphEdge {
                    a: adjacency.a,
                    b: adjacency.b,
                    shared_length: adjacency.shared_length,
                    importance,
                })
            })
            .collect();

        let hypothesis = Hypothesis::generate(mesh, segment_count, &adjacencies)?;

        info!(
            nodes = nodes.len(),
            edges = edges.len(),
            adjacencies = adjacencies.len(),
            importance_threshold,
            "structure graph constructed"
        );

        Ok(Self {
            nodes,
            edges,
            adjacencies,
            hypothesis,
            importance_threshold,
            face_count: mesh.face_count(),
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn node(&self, chart: usize) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.chart == chart)
    }

    /// Edges above the importance threshold
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Every chart pair sharing mesh edges
    pub fn adjacencies(&self) -> &[ChartAdjacency] {
        &self.adjacencies
    }

    /// Charts joined to `chart` by a graph edge, ascending
    pub fn neighbors(&self, chart: usize) -> Vec<usize> {
        let mut result: Vec<usize> = self
            .edges
            .iter()
            .filter_map(|e| match (e.a == chart, e.b == chart) {
                (true, _) => Some(e.b),
                (_, true) => Some(e.a),
                _ => None,
            })
            .collect();
        result.sort_unstable();
        result
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        let (a, b) = (a.min(b), a.max(b));
        self.edges.iter().any(|e| e.a == a && e.b == b)
    }

    pub fn hypothesis(&self) -> &Hypothesis {
        &self.hypothesis
    }

    pub fn importance_threshold(&self) -> f64 {
        self.importance_threshold
    }

    /// Number of faces of the mesh the graph was built from
    pub fn face_count(&self) -> usize {
        self.face_count
    }
}

/// Chart pairs sharing at least one mesh edge, with the shared length
pub fn chart_adjacencies(mesh: &PolygonMesh) -> Result<Vec<ChartAdjacency>> {
    let charts = mesh.charts()?;
    let topology = mesh.topology();
    let mut shared: BTreeMap<(usize, usize), f64> = BTreeMap::new();

    for (he, half_edge) in topology.half_edges().iter().enumerate() {
        let Some(opposite) = topology.opposite_face(he) else { continue };
        let (a, b) = (charts[half_edge.face], charts[opposite]);
        // Each mesh edge is seen from both sides; count it from the lower chart
        if a < b {
            *shared.entry((a, b)).or_insert(0.0) += mesh.edge_length(he);
        }
    }

    Ok(shared
        .into_iter()
        .map(|((a, b), shared_length)| ChartAdjacency { a, b, shared_length })
        .collect())
}

/// Length of each chart's border: edges on the open mesh boundary or shared
/// with another chart
fn border_lengths(mesh: &PolygonMesh, segment_count: usize) -> Result<Vec<f64>> {
    let charts = mesh.charts()?;
    let topology = mesh.topology();
    let mut lengths = vec![0.0; segment_count];
    for (he, half_edge) in topology.half_edges().iter().enumerate() {
        let chart = charts[half_edge.face];
        let on_border = match topology.opposite_face(he) {
            Some(opposite) => charts[opposite] != chart,
            None => true,
        };
        if on_border {
            lengths[chart] += mesh.edge_length(he);
        }
    }
    Ok(lengths)
}
