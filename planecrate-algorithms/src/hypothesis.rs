//! Candidate faces and intersection edges
//!
//! Every chart gets a supporting plane, clipped to a slightly enlarged mesh
//! bounding box and cut by the planes of its adjacent charts. The resulting
//! convex cells are the candidate faces. Where two adjacent planes meet, their
//! intersection line is cut at every cell corner lying on it; each piece is an
//! intersection edge whose fan lists the candidate faces bordering it.

use crate::segment::fit_plane_to_faces;
use planecrate_core::{
    BoundingBox, ConvexPolygon, Drawable, Error, Plane, Point3d, PolygonMesh, Result, Vector3d,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Share of the bounding box diagonal added around the box before clipping planes
pub const BOX_MARGIN: f64 = 0.05;

/// A convex candidate polygon on one chart's supporting plane
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFace {
    pub chart: usize,
    pub polygon: ConvexPolygon,
    /// Number of input faces this candidate represents
    pub supporting_face_num: usize,
    pub area: f64,
    /// Part of `area` explained by the supporting input faces
    pub covered_area: f64,
}

/// A piece of the line shared by two chart planes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionEdge {
    pub charts: (usize, usize),
    pub start: Point3d,
    pub end: Point3d,
    /// Candidate faces bordering this piece, ascending
    pub fan: Vec<usize>,
}

impl IntersectionEdge {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Whether two faces of the fan can meet along this edge
    pub fn is_shareable(&self) -> bool {
        self.fan.len() >= 2
    }
}

/// Candidate faces and intersection edges of a segmented mesh
#[derive(Debug, Clone)]
pub struct Hypothesis {
    planes: Vec<Option<Plane>>,
    faces: Vec<CandidateFace>,
    edges: Vec<IntersectionEdge>,
    bbox: BoundingBox,
}

/// Chart pair sharing mesh edges, `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartAdjacency {
    pub a: usize,
    pub b: usize,
    /// Total length of the mesh edges the charts share
    pub shared_length: f64,
}

impl Hypothesis {
    /// Assemble a hypothesis from explicit parts, checking that every fan
    /// entry names an existing candidate face.
    pub fn new(
        faces: Vec<CandidateFace>,
        edges: Vec<IntersectionEdge>,
        bbox: BoundingBox,
    ) -> Result<Self> {
        for (i, edge) in edges.iter().enumerate() {
            if let Some(&f) = edge.fan.iter().find(|&&f| f >= faces.len()) {
                return Err(Error::InvalidData(format!(
                    "intersection edge {} references candidate {} of {}",
                    i,
                    f,
                    faces.len()
                )));
            }
        }
        let chart_count = faces.iter().map(|f| f.chart + 1).max().unwrap_or(0);
        let mut planes = vec![None; chart_count];
        for face in &faces {
            planes[face.chart] = Some(face.polygon.plane);
        }
        Ok(Self {
            planes,
            faces,
            edges,
            bbox,
        })
    }

    /// Generate candidates for a segmented mesh.
    ///
    /// # Arguments
    /// * `mesh` - Mesh with chart and covered area attributes
    /// * `segment_count` - Number of charts
    /// * `adjacencies` - Chart pairs sharing mesh edges
    pub fn generate(
        mesh: &PolygonMesh,
        segment_count: usize,
        adjacencies: &[ChartAdjacency],
    ) -> Result<Self> {
        let charts = mesh.charts()?;
        let covered = mesh.covered_areas()?;

        let mut chart_faces = vec![Vec::new(); segment_count];
        for (f, &c) in charts.iter().enumerate() {
            if c >= segment_count {
                return Err(Error::InvalidData(format!(
                    "face {} has chart {} but there are {} charts",
                    f, c, segment_count
                )));
            }
            chart_faces[c].push(f);
        }

        let bbox = mesh.bounding_box();
        let scale = bbox.diagonal().max(1.0);
        let eps = 1e-9 * scale;
        let region = bbox.enlarged(BOX_MARGIN * bbox.diagonal());

        let planes: Vec<Option<Plane>> = chart_faces
            .iter()
            .map(|faces| supporting_plane(mesh, faces))
            .collect();

        let mut neighbors = vec![Vec::new(); segment_count];
        for adjacency in adjacencies {
            if adjacency.a.max(adjacency.b) >= segment_count {
                return Err(Error::InvalidData(format!(
                    "adjacency ({}, {}) names a chart beyond {}",
                    adjacency.a, adjacency.b, segment_count
                )));
            }
            neighbors[adjacency.a].push(adjacency.b);
            neighbors[adjacency.b].push(adjacency.a);
        }

        let mut faces = Vec::new();
        for chart in 0..segment_count {
            let Some(plane) = planes[chart] else {
                debug!(chart, "chart has no supporting plane");
                continue;
            };
            let Some(polygon) = ConvexPolygon::from_plane_in_box(&plane, &region, eps) else {
                continue;
            };

            let mut cells = vec![polygon];
            let mut cutters = neighbors[chart].clone();
            cutters.sort_unstable();
            cutters.dedup();
            for other in cutters {
                let Some(cutter) = planes[other] else { continue };
                if plane.is_parallel(&cutter) {
                    continue;
                }
                cells = cells
                    .into_iter()
                    .flat_map(|cell| {
                        let (front, back) = cell.split(&cutter, eps);
                        front.into_iter().chain(back)
                    })
                    .collect();
            }

            let mut support = vec![(0usize, 0.0f64); cells.len()];
            for &f in &chart_faces[chart] {
                let center = mesh.face_centroid(f);
                if let Some(cell) = cells.iter().position(|cell| cell.contains(&center, eps)) {
                    support[cell].0 += 1;
                    support[cell].1 += covered[f];
                }
            }

            for (cell, (count, covered_sum)) in cells.into_iter().zip(support) {
                let area = cell.area();
                faces.push(CandidateFace {
                    chart,
                    polygon: cell,
                    supporting_face_num: count,
                    area,
                    covered_area: covered_sum.min(area),
                });
            }
        }

        let edges = intersection_edges(&planes, &faces, adjacencies, scale);
        info!(
            candidates = faces.len(),
            edges = edges.len(),
            shareable = edges.iter().filter(|e| e.is_shareable()).count(),
            "candidate faces generated"
        );

        Ok(Self {
            planes,
            faces,
            edges,
            bbox,
        })
    }

    pub fn faces(&self) -> &[CandidateFace] {
        &self.faces
    }

    pub fn edges(&self) -> &[IntersectionEdge] {
        &self.edges
    }

    /// Supporting plane of a chart, if it has one
    pub fn plane(&self, chart: usize) -> Option<&Plane> {
        self.planes.get(chart).and_then(|p| p.as_ref())
    }

    /// Bounding box of the input mesh
    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn total_supporting_faces(&self) -> usize {
        self.faces.iter().map(|f| f.supporting_face_num).sum()
    }

    pub fn shareable_edge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_shareable()).count()
    }
}

/// Least-squares plane of a chart, oriented along the chart's area-weighted normal
fn supporting_plane(mesh: &PolygonMesh, faces: &[usize]) -> Option<Plane> {
    let mut direction = Vector3d::zeros();
    for &f in faces {
        direction += mesh.face_normal(f) * mesh.face_area(f);
    }
    let plane = fit_plane_to_faces(mesh, faces).or_else(|| {
        let first = *faces.first()?;
        Plane::from_point_normal(&mesh.face_centroid(first), &direction)
    })?;
    if plane.normal.dot(&direction) < 0.0 {
        Some(plane.flipped())
    } else {
        Some(plane)
    }
}

/// Cut each adjacent pair's intersection line at the corners of the
/// candidate faces lying on it
fn intersection_edges(
    planes: &[Option<Plane>],
    faces: &[CandidateFace],
    adjacencies: &[ChartAdjacency],
    scale: f64,
) -> Vec<IntersectionEdge> {
    let tolerance = 1e-6 * scale;
    let mut pairs: Vec<(usize, usize)> = adjacencies.iter().map(|a| (a.a.min(a.b), a.a.max(a.b))).collect();
    pairs.sort_unstable();
    pairs.dedup();

    let mut edges = Vec::new();
    for (a, b) in pairs {
        let (Some(plane_a), Some(plane_b)) = (planes[a], planes[b]) else {
            continue;
        };
        let Some(line) = plane_a.intersection_line(&plane_b) else {
            continue;
        };

        // Parameter intervals of candidate edges lying on the line
        let mut intervals: Vec<(usize, f64, f64)> = Vec::new();
        for (id, face) in faces.iter().enumerate() {
            if face.chart != a && face.chart != b {
                continue;
            }
            for (p, q) in face.polygon.edges() {
                if line.distance(&p) <= tolerance && line.distance(&q) <= tolerance {
                    let (tp, tq) = (line.parameter(&p), line.parameter(&q));
                    if (tq - tp).abs() > tolerance {
                        intervals.push((id, tp.min(tq), tp.max(tq)));
                    }
                }
            }
        }
        if intervals.is_empty() {
            continue;
        }

        let mut breaks: Vec<f64> = intervals.iter().flat_map(|&(_, lo, hi)| [lo, hi]).collect();
        breaks.sort_by(f64::total_cmp);
        breaks.dedup_by(|next, kept| (*next - *kept).abs() <= tolerance);

        for window in breaks.windows(2) {
            let (lo, hi) = (window[0], window[1]);
            let mid = 0.5 * (lo + hi);
            let mut fan: Vec<usize> = intervals
                .iter()
                .filter(|&&(_, start, end)| start - tolerance <= mid && mid <= end + tolerance)
                .map(|&(id, _, _)| id)
                .collect();
            fan.sort_unstable();
            fan.dedup();
            if fan.is_empty() {
                continue;
            }
            edges.push(IntersectionEdge {
                charts: (a, b),
                start: line.point_at(lo),
                end: line.point_at(hi),
                fan,
            });
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::WorkerPool;
    use crate::planarity::Planarity;
    use crate::segmentation::PlanarSegmentation;
    use crate::structure_graph::chart_adjacencies;
    use approx::assert_relative_eq;
    use planecrate_core::primitives::{folded_strip, subdivided_cube};

    fn hypothesis_for(mut mesh: PolygonMesh, dist: f64) -> (PolygonMesh, Hypothesis) {
        Planarity::with_pool(WorkerPool::sequential()).compute(&mut mesh, 3).unwrap();
        let count = PlanarSegmentation::new(dist, 3).apply(&mut mesh).unwrap();
        let adjacencies = chart_adjacencies(&mesh).unwrap();
        let hypothesis = Hypothesis::generate(&mesh, count, &adjacencies).unwrap();
        (mesh, hypothesis)
    }

    #[test]
    fn test_cube_candidates() {
        let (mesh, hypothesis) = hypothesis_for(subdivided_cube(6, 10.0, 0.01).unwrap(), 0.5);

        // Each side plane is cut by its four neighbors into a 3x3 grid
        assert_eq!(hypothesis.faces().len(), 54);
        assert_eq!(hypothesis.total_supporting_faces(), mesh.face_count());
        let supported: Vec<&CandidateFace> = hypothesis
            .faces()
            .iter()
            .filter(|f| f.supporting_face_num > 0)
            .collect();
        assert_eq!(supported.len(), 6);
        for face in supported {
            assert_eq!(face.supporting_face_num, 72);
            assert_relative_eq!(face.area, 100.0, epsilon = 1.0);
            assert!(face.covered_area <= face.area);
        }

        // Three pieces per adjacent side pair, each bordered by four cells
        assert_eq!(hypothesis.edges().len(), 36);
        assert!(hypothesis.edges().iter().all(|e| e.fan.len() == 4));
        assert_eq!(hypothesis.shareable_edge_count(), 36);
    }

    #[test]
    fn test_plane_orientation_follows_faces() {
        let (_, hypothesis) = hypothesis_for(subdivided_cube(4, 10.0, 0.0).unwrap(), 0.5);
        for face in hypothesis.faces() {
            let center = face.polygon.centroid().unwrap();
            // Outward normals point away from the cube center
            assert!(face.polygon.plane.normal.dot(&center.coords) > 0.0);
        }
    }

    #[test]
    fn test_folded_strip_candidates() {
        let (_, hypothesis) = hypothesis_for(folded_strip(4.0, 4.0, 2.0, 8, 8, 4).unwrap(), 0.1);
        assert_eq!(hypothesis.faces().len(), 4);
        assert_eq!(hypothesis.edges().len(), 1);
        let edge = &hypothesis.edges()[0];
        assert_eq!(edge.fan, vec![0, 1, 2, 3]);
        assert_relative_eq!(edge.length(), 2.6, epsilon = 1e-6);

        let supports: Vec<usize> = hypothesis.faces().iter().map(|f| f.supporting_face_num).collect();
        assert_eq!(supports.iter().sum::<usize>(), 128);
        assert_eq!(supports.iter().filter(|&&s| s == 64).count(), 2);
        assert_eq!(supports.iter().filter(|&&s| s == 0).count(), 2);
    }

    #[test]
    fn test_new_rejects_unknown_fan_faces() {
        let bbox = BoundingBox {
            min: Point3d::origin(),
            max: Point3d::new(1.0, 1.0, 1.0),
        };
        let edge = IntersectionEdge {
            charts: (0, 1),
            start: Point3d::origin(),
            end: Point3d::new(1.0, 0.0, 0.0),
            fan: vec![0],
        };
        assert!(Hypothesis::new(Vec::new(), vec![edge], bbox).is_err());
    }
}
