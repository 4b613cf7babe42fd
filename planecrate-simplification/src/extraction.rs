//! Assembly of selected candidate faces into a polygon mesh

use itertools::iproduct;
use planecrate_algorithms::{Hypothesis, IntersectionEdge};
use planecrate_core::{Error, Point3d, PolygonMesh, Result};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// Welding distance as a share of the bounding box diagonal
pub const WELD_TOLERANCE: f64 = 1e-6;

/// The polygonal mesh chosen by the optimization
#[derive(Debug, Clone)]
pub struct SimplifiedMesh {
    pub mesh: PolygonMesh,
    /// Chart of each output face
    pub face_charts: Vec<usize>,
    /// Candidate face behind each output face
    pub selected_faces: Vec<usize>,
    /// Intersection edges used by two selected faces
    pub retained_edges: Vec<IntersectionEdge>,
    pub objective_value: f64,
}

impl SimplifiedMesh {
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }
}

/// Build the output mesh from selected candidate faces.
///
/// # Arguments
/// * `hypothesis` - Candidates the selection refers to
/// * `selected` - Selected candidate ids, ascending
/// * `retained` - Ids of the intersection edges in use
/// * `objective_value` - Objective of the assignment, for reporting
pub fn extract(
    hypothesis: &Hypothesis,
    selected: &[usize],
    retained: &[usize],
    objective_value: f64,
) -> Result<SimplifiedMesh> {
    let tolerance = (WELD_TOLERANCE * hypothesis.bbox().diagonal()).max(1e-12);
    let mut welder = Welder::new(tolerance);

    let mut rings = Vec::with_capacity(selected.len());
    let mut face_charts = Vec::with_capacity(selected.len());
    let mut selected_faces = Vec::with_capacity(selected.len());
    for &id in selected {
        let candidate = hypothesis.faces().get(id).ok_or_else(|| {
            Error::InvalidData(format!("selected candidate {} does not exist", id))
        })?;
        let mut ring: Vec<usize> = candidate.polygon.vertices.iter().map(|p| welder.insert(p)).collect();
        ring.dedup();
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            debug!(candidate = id, "candidate collapsed while welding");
            continue;
        }
        rings.push(ring);
        face_charts.push(candidate.chart);
        selected_faces.push(id);
    }

    let points = welder.into_points();
    let mut faces: Vec<Vec<usize>> = rings
        .iter()
        .map(|ring| split_at_junctions(ring, &points, tolerance))
        .collect();
    let flipped = orient(&mut faces);

    let mut mesh = PolygonMesh::new(points, faces)?;
    if mesh.is_closed() && mesh.signed_volume() < 0.0 {
        let (points, faces) = (
            mesh.vertices().to_vec(),
            mesh.faces().iter().map(|f| f.iter().rev().copied().collect()).collect(),
        );
        mesh = PolygonMesh::new(points, faces)?;
        debug!("closed result turned outward");
    }
    mesh.set_charts(face_charts.clone())?;

    let retained_edges = retained
        .iter()
        .map(|&i| {
            hypothesis
                .edges()
                .get(i)
                .cloned()
                .ok_or_else(|| Error::InvalidData(format!("retained edge {} does not exist", i)))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        faces = mesh.face_count(),
        vertices = mesh.vertex_count(),
        flipped,
        "simplified mesh extracted"
    );

    Ok(SimplifiedMesh {
        mesh,
        face_charts,
        selected_faces,
        retained_edges,
        objective_value,
    })
}

/// Merges points closer than a tolerance, using a grid with one tolerance per cell
struct Welder {
    tolerance: f64,
    cells: HashMap<[i64; 3], Vec<usize>>,
    points: Vec<Point3d>,
}

impl Welder {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: HashMap::new(),
            points: Vec::new(),
        }
    }

    fn cell(&self, p: &Point3d) -> [i64; 3] {
        [
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
            (p.z / self.tolerance).floor() as i64,
        ]
    }

    fn insert(&mut self, p: &Point3d) -> usize {
        let [x, y, z] = self.cell(p);
        for (dx, dy, dz) in iproduct!(-1..=1, -1..=1, -1..=1) {
            if let Some(ids) = self.cells.get(&[x + dx, y + dy, z + dz]) {
                if let Some(&id) = ids.iter().find(|&&id| (self.points[id] - p).norm() <= self.tolerance) {
                    return id;
                }
            }
        }
        let id = self.points.len();
        self.points.push(*p);
        self.cells.entry([x, y, z]).or_default().push(id);
        id
    }

    fn into_points(self) -> Vec<Point3d> {
        self.points
    }
}

/// Insert welded points lying inside the ring's edges, so neighbors with a
/// finer subdivision of a shared edge stay connected
fn split_at_junctions(ring: &[usize], points: &[Point3d], tolerance: f64) -> Vec<usize> {
    let n = ring.len();
    let mut result = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b) = (ring[i], ring[(i + 1) % n]);
        result.push(a);
        let (pa, pb) = (points[a], points[b]);
        let direction = pb - pa;
        let length = direction.norm();
        if length <= tolerance {
            continue;
        }
        let unit = direction / length;
        let mut inner: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            .filter(|&(v, _)| v != a && v != b)
            .filter_map(|(v, p)| {
                let t = (p - pa).dot(&unit);
                let offset = (p - pa) - unit * t;
                (t > tolerance && t < length - tolerance && offset.norm() <= tolerance).then_some((t, v))
            })
            .collect();
        inner.sort_by(|x, y| x.0.total_cmp(&y.0));
        result.extend(inner.into_iter().map(|(_, v)| v));
    }
    result
}

/// Make faces sharing an edge traverse it in opposite directions. Each
/// connected component keeps the winding of its lowest face. Returns the
/// number of reversed faces.
fn orient(faces: &mut [Vec<usize>]) -> usize {
    let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for (f, face) in faces.iter().enumerate() {
        for (a, b) in ring_edges(face) {
            edge_faces.entry((a.min(b), a.max(b))).or_default().push(f);
        }
    }

    let mut visited = vec![false; faces.len()];
    let mut flipped = 0;
    for seed in 0..faces.len() {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(f) = queue.pop_front() {
            let edges: Vec<(usize, usize)> = ring_edges(&faces[f]).collect();
            for (a, b) in edges {
                let Some(shared) = edge_faces.get(&(a.min(b), a.max(b))) else { continue };
                // Only manifold edges say anything about orientation
                if shared.len() != 2 {
                    continue;
                }
                for &g in shared {
                    if g == f || visited[g] {
                        continue;
                    }
                    if ring_edges(&faces[g]).any(|e| e == (a, b)) {
                        faces[g].reverse();
                        flipped += 1;
                    }
                    visited[g] = true;
                    queue.push_back(g);
                }
            }
        }
    }
    flipped
}

fn ring_edges(face: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let n = face.len();
    (0..n).map(move |i| (face[i], face[(i + 1) % n]))
}
