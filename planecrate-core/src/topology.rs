//! Half-edge connectivity for polygon meshes
//!
//! Built once from the face list and never edited afterwards: vertex and face
//! ids stay stable for the whole pipeline, so every query here is a pure
//! lookup over those ids.

use std::collections::{BTreeSet, HashMap};

/// Marker for a missing twin or face.
pub const INVALID: usize = usize::MAX;

#[derive(Debug, Clone)]
pub struct HalfEdge {
    pub target: usize,
    pub twin: usize,
    pub next: usize,
    pub prev: usize,
    pub face: usize,
}

/// Half-edge topology of a polygon mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshTopology {
    half_edges: Vec<HalfEdge>,
    /// First half-edge of each face
    face_edge: Vec<usize>,
    vertex_faces: Vec<Vec<usize>>,
    vertex_neighbors: Vec<Vec<usize>>,
}

impl MeshTopology {
    /// Build the topology of `faces` over `vertex_count` vertices.
    ///
    /// Face indices are assumed to be validated by the caller.
    pub fn build(vertex_count: usize, faces: &[Vec<usize>]) -> Self {
        let corner_count: usize = faces.iter().map(|f| f.len()).sum();
        let mut half_edges = Vec::with_capacity(corner_count);
        let mut face_edge = Vec::with_capacity(faces.len());
        let mut vertex_faces = vec![Vec::new(); vertex_count];
        let mut neighbor_sets = vec![BTreeSet::new(); vertex_count];

        for (fi, face) in faces.iter().enumerate() {
            let base = half_edges.len();
            let n = face.len();
            for j in 0..n {
                let src = face[j];
                let tgt = face[(j + 1) % n];
                half_edges.push(HalfEdge {
                    target: tgt,
                    twin: INVALID,
                    next: base + (j + 1) % n,
                    prev: base + (j + n - 1) % n,
                    face: fi,
                });
                if vertex_faces[src].last() != Some(&fi) {
                    vertex_faces[src].push(fi);
                }
                if src != tgt {
                    neighbor_sets[src].insert(tgt);
                    neighbor_sets[tgt].insert(src);
                }
            }
            face_edge.push(base);
        }

        // Build twin pointers; on non-manifold edges only the first pair is linked
        let mut edge_map: HashMap<(usize, usize), usize> = HashMap::with_capacity(half_edges.len());
        for (he_idx, he) in half_edges.iter().enumerate() {
            let src = half_edges[he.prev].target;
            edge_map.entry((src, he.target)).or_insert(he_idx);
        }
        for he_idx in 0..half_edges.len() {
            if half_edges[he_idx].twin != INVALID {
                continue;
            }
            let src = half_edges[half_edges[he_idx].prev].target;
            let tgt = half_edges[he_idx].target;
            if let Some(&twin_idx) = edge_map.get(&(tgt, src)) {
                if half_edges[twin_idx].twin == INVALID && twin_idx != he_idx {
                    half_edges[he_idx].twin = twin_idx;
                    half_edges[twin_idx].twin = he_idx;
                }
            }
        }

        for faces in vertex_faces.iter_mut() {
            faces.sort_unstable();
            faces.dedup();
        }

        Self {
            half_edges,
            face_edge,
            vertex_faces,
            vertex_neighbors: neighbor_sets
                .into_iter()
                .map(|s| s.into_iter().collect())
                .collect(),
        }
    }

    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.half_edges
    }

    #[inline]
    pub fn source(&self, he: usize) -> usize {
        self.half_edges[self.half_edges[he].prev].target
    }

    #[inline]
    pub fn target(&self, he: usize) -> usize {
        self.half_edges[he].target
    }

    /// Face on the other side of a half-edge, `None` on the mesh boundary.
    pub fn opposite_face(&self, he: usize) -> Option<usize> {
        match self.half_edges[he].twin {
            INVALID => None,
            twin => Some(self.half_edges[twin].face),
        }
    }

    /// Half-edges bounding a face, in face order.
    pub fn face_half_edges(&self, face: usize) -> Vec<usize> {
        let start = self.face_edge[face];
        let mut result = vec![start];
        let mut current = self.half_edges[start].next;
        while current != start {
            result.push(current);
            current = self.half_edges[current].next;
        }
        result
    }

    /// Sorted ids of the faces incident to a vertex.
    pub fn vertex_faces(&self, v: usize) -> &[usize] {
        &self.vertex_faces[v]
    }

    /// Sorted ids of the vertices one edge away from `v`.
    pub fn vertex_neighbors(&self, v: usize) -> &[usize] {
        &self.vertex_neighbors[v]
    }

    /// Faces sharing an edge with `face`, sorted.
    pub fn face_edge_neighbors(&self, face: usize) -> Vec<usize> {
        let mut result: Vec<usize> = self
            .face_half_edges(face)
            .into_iter()
            .filter_map(|he| self.opposite_face(he))
            .filter(|&f| f != face)
            .collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Vertices reachable from `v` within `k` edge hops, `v` included.
    pub fn vertex_k_ring(&self, v: usize, k: usize) -> Vec<usize> {
        self.expand_vertices(std::iter::once(v), k)
    }

    /// Faces around `face` at ring distance `k`.
    ///
    /// `k = 0` is the face alone; `k = 1` adds every face sharing a vertex with
    /// it, and each further ring grows the vertex set by one hop.
    pub fn face_k_ring(&self, face: usize, k: usize) -> Vec<usize> {
        if k == 0 {
            return vec![face];
        }
        let seeds: Vec<usize> = self
            .face_half_edges(face)
            .into_iter()
            .map(|he| self.source(he))
            .collect();
        let vertices = self.expand_vertices(seeds, k - 1);
        let faces: BTreeSet<usize> = vertices
            .iter()
            .flat_map(|&v| self.vertex_faces[v].iter().copied())
            .collect();
        faces.into_iter().collect()
    }

    /// True when every half-edge has a twin.
    pub fn is_closed(&self) -> bool {
        !self.half_edges.is_empty() && self.half_edges.iter().all(|he| he.twin != INVALID)
    }

    pub fn is_boundary_vertex(&self, v: usize) -> bool {
        self.vertex_faces[v].iter().any(|&f| {
            self.face_half_edges(f)
                .into_iter()
                .any(|he| self.half_edges[he].twin == INVALID && (self.source(he) == v || self.target(he) == v))
        })
    }

    fn expand_vertices<I: IntoIterator<Item = usize>>(&self, seeds: I, hops: usize) -> Vec<usize> {
        let mut visited: BTreeSet<usize> = seeds.into_iter().collect();
        let mut frontier: Vec<usize> = visited.iter().copied().collect();
        for _ in 0..hops {
            let mut next = Vec::new();
            for &v in &frontier {
                for &n in &self.vertex_neighbors[v] {
                    if visited.insert(n) {
                        next.push(n);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        visited.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_faces(size: usize) -> Vec<Vec<usize>> {
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                let tr = tl + 1;
                let bl = (y + 1) * size + x;
                let br = bl + 1;
                faces.push(vec![tl, bl, tr]);
                faces.push(vec![tr, bl, br]);
            }
        }
        faces
    }

    fn tetrahedron_faces() -> Vec<Vec<usize>> {
        vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]]
    }

    #[test]
    fn test_halfedge_construction() {
        let topo = MeshTopology::build(4, &tetrahedron_faces());
        assert_eq!(topo.half_edges().len(), 12);
        for he in topo.half_edges() {
            assert_ne!(he.twin, INVALID, "interior half-edge should have twin");
        }
        assert!(topo.is_closed());
    }

    #[test]
    fn test_boundary_detection() {
        let topo = MeshTopology::build(3, &[vec![0, 1, 2]]);
        assert!(!topo.is_closed());
        for v in 0..3 {
            assert!(topo.is_boundary_vertex(v));
        }
        assert!(topo.face_edge_neighbors(0).is_empty());
    }

    #[test]
    fn test_vertex_k_ring_grows_by_hops() {
        let topo = MeshTopology::build(25, &grid_faces(5));
        let center = 12;
        assert_eq!(topo.vertex_k_ring(center, 0), vec![center]);
        // Diagonal triangulation gives the center six neighbors
        assert_eq!(topo.vertex_k_ring(center, 1).len(), 7);
        assert_eq!(topo.vertex_k_ring(center, 2).len(), 19);
        assert_eq!(topo.vertex_k_ring(center, 10).len(), 25);
    }

    #[test]
    fn test_face_k_ring() {
        let topo = MeshTopology::build(4, &tetrahedron_faces());
        assert_eq!(topo.face_k_ring(2, 0), vec![2]);
        assert_eq!(topo.face_k_ring(2, 1), vec![0, 1, 2, 3]);
        assert_eq!(topo.face_edge_neighbors(0), vec![1, 2, 3]);
    }

    #[test]
    fn test_polygon_faces() {
        // Two quads sharing the edge 1-4
        let faces = vec![vec![0, 1, 4, 3], vec![1, 2, 5, 4]];
        let topo = MeshTopology::build(6, &faces);
        assert_eq!(topo.face_half_edges(0).len(), 4);
        assert_eq!(topo.face_edge_neighbors(0), vec![1]);
        assert_eq!(topo.vertex_faces(1), &[0, 1]);
        assert_eq!(topo.vertex_neighbors(4), &[1, 3, 5]);
    }
}
