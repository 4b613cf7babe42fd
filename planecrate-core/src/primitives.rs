//! Procedural meshes for tests and benchmarks
//!
//! All generators are deterministic: noise comes from a hash of the vertex
//! lattice coordinates, never from a global random source.

use crate::error::{Error, Result};
use crate::mesh::PolygonMesh;
use crate::point::*;
use std::collections::HashMap;

/// SplitMix64 finalizer, used as a stateless hash
pub fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Hash mapped to [-1, 1]
fn jitter(seed: u64) -> f64 {
    let bits = splitmix64(seed) >> 11;
    bits as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
}

/// Triangulated grid in the z = 0 plane with `nx` by `ny` cells, facing +z
pub fn grid_plane(nx: usize, ny: usize, spacing: f64) -> Result<PolygonMesh> {
    if nx == 0 || ny == 0 {
        return Err(Error::InvalidParameter("grid needs at least one cell per axis".to_string()));
    }
    let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1));
    for j in 0..=ny {
        for i in 0..=nx {
            vertices.push(Point3d::new(i as f64 * spacing, j as f64 * spacing, 0.0));
        }
    }
    let index = |i: usize, j: usize| j * (nx + 1) + i;
    let mut faces = Vec::with_capacity(2 * nx * ny);
    for j in 0..ny {
        for i in 0..nx {
            let (a, b, c, d) = (index(i, j), index(i + 1, j), index(i + 1, j + 1), index(i, j + 1));
            faces.push(vec![a, b, c]);
            faces.push(vec![a, c, d]);
        }
    }
    PolygonMesh::new(vertices, faces)
}

/// Outward-facing triangulated cube centered at the origin.
///
/// Each side is split into `n` by `n` quads of two triangles. Every vertex is
/// pushed radially by up to `noise`.
pub fn subdivided_cube(n: usize, size: f64, noise: f64) -> Result<PolygonMesh> {
    if n == 0 || size <= 0.0 {
        return Err(Error::InvalidParameter("cube needs n > 0 and size > 0".to_string()));
    }
    // (normal axis, at max side, u axis, v axis) with u x v pointing outward
    const SIDES: [(usize, bool, usize, usize); 6] = [
        (0, true, 1, 2),
        (0, false, 2, 1),
        (1, true, 2, 0),
        (1, false, 0, 2),
        (2, true, 0, 1),
        (2, false, 1, 0),
    ];

    let mut lookup: HashMap<[usize; 3], usize> = HashMap::new();
    let mut vertices = Vec::new();
    let mut faces = Vec::with_capacity(12 * n * n);

    let mut vertex_at = |key: [usize; 3], vertices: &mut Vec<Point3d>| -> usize {
        *lookup.entry(key).or_insert_with(|| {
            let mut p = Point3d::new(
                (key[0] as f64 / n as f64 - 0.5) * size,
                (key[1] as f64 / n as f64 - 0.5) * size,
                (key[2] as f64 / n as f64 - 0.5) * size,
            );
            if noise > 0.0 {
                let seed = ((key[0] as u64) << 42) ^ ((key[1] as u64) << 21) ^ key[2] as u64;
                let radial = p.coords.normalize();
                p += radial * (noise * jitter(seed));
            }
            vertices.push(p);
            vertices.len() - 1
        })
    };

    for &(axis, at_max, u_axis, v_axis) in SIDES.iter() {
        let lattice = |i: usize, j: usize| {
            let mut key = [0usize; 3];
            key[axis] = if at_max { n } else { 0 };
            key[u_axis] = i;
            key[v_axis] = j;
            key
        };
        for j in 0..n {
            for i in 0..n {
                let a = vertex_at(lattice(i, j), &mut vertices);
                let b = vertex_at(lattice(i + 1, j), &mut vertices);
                let c = vertex_at(lattice(i + 1, j + 1), &mut vertices);
                let d = vertex_at(lattice(i, j + 1), &mut vertices);
                faces.push(vec![a, b, c]);
                faces.push(vec![a, c, d]);
            }
        }
    }

    PolygonMesh::new(vertices, faces)
}

/// Two triangulated rectangles meeting at a right-angle fold along the y axis.
///
/// The floor spans `x ∈ [0, length]`, the wall spans `z ∈ [0, height]` at
/// `x = 0`, both `y ∈ [0, width]`. The floor faces +z and the wall faces +x.
pub fn folded_strip(
    length: f64,
    height: f64,
    width: f64,
    n_length: usize,
    n_height: usize,
    n_width: usize,
) -> Result<PolygonMesh> {
    if n_length == 0 || n_height == 0 || n_width == 0 {
        return Err(Error::InvalidParameter("strip needs at least one cell per axis".to_string()));
    }
    let mut vertices = Vec::new();
    // Floor rows, x = 0 row shared with the wall
    for j in 0..=n_width {
        for i in 0..=n_length {
            vertices.push(Point3d::new(
                length * i as f64 / n_length as f64,
                width * j as f64 / n_width as f64,
                0.0,
            ));
        }
    }
    let floor = |i: usize, j: usize| j * (n_length + 1) + i;
    let wall_base = vertices.len();
    for j in 0..=n_width {
        for k in 1..=n_height {
            vertices.push(Point3d::new(
                0.0,
                width * j as f64 / n_width as f64,
                height * k as f64 / n_height as f64,
            ));
        }
    }
    let wall = |j: usize, k: usize| {
        if k == 0 {
            floor(0, j)
        } else {
            wall_base + j * n_height + (k - 1)
        }
    };

    let mut faces = Vec::new();
    for j in 0..n_width {
        for i in 0..n_length {
            let (a, b, c, d) = (floor(i, j), floor(i + 1, j), floor(i + 1, j + 1), floor(i, j + 1));
            faces.push(vec![a, b, c]);
            faces.push(vec![a, c, d]);
        }
    }
    for k in 0..n_height {
        for j in 0..n_width {
            let (a, b, c, d) = (wall(j, k), wall(j + 1, k), wall(j + 1, k + 1), wall(j, k + 1));
            faces.push(vec![a, b, c]);
            faces.push(vec![a, c, d]);
        }
    }
    PolygonMesh::new(vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_grid_plane() {
        let grid = grid_plane(4, 3, 0.5).unwrap();
        assert_eq!(grid.vertex_count(), 20);
        assert_eq!(grid.face_count(), 24);
        assert_relative_eq!(grid.total_area(), 3.0, epsilon = 1e-12);
        assert_relative_eq!(grid.face_normal(0), Vector3d::z(), epsilon = 1e-12);
        assert!(!grid.is_closed());
    }

    #[test]
    fn test_cube_is_closed_and_outward() {
        let cube = subdivided_cube(3, 2.0, 0.0).unwrap();
        assert_eq!(cube.vertex_count(), 6 * 9 + 2);
        assert_eq!(cube.face_count(), 108);
        assert!(cube.is_closed());
        assert_relative_eq!(cube.signed_volume(), 8.0, epsilon = 1e-9);
        assert_relative_eq!(cube.total_area(), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_noisy_cube_is_deterministic() {
        let a = subdivided_cube(4, 10.0, 0.05).unwrap();
        let b = subdivided_cube(4, 10.0, 0.05).unwrap();
        assert_eq!(a.vertices(), b.vertices());
        assert!(a.signed_volume() > 0.0);
    }

    #[test]
    fn test_folded_strip() {
        let strip = folded_strip(4.0, 3.0, 2.0, 4, 3, 2).unwrap();
        assert_eq!(strip.vertex_count(), 15 + 9);
        assert_eq!(strip.face_count(), 16 + 12);
        assert_relative_eq!(strip.total_area(), 8.0 + 6.0, epsilon = 1e-12);
        assert_relative_eq!(strip.face_normal(0), Vector3d::z(), epsilon = 1e-12);
        assert_relative_eq!(strip.face_normal(16), Vector3d::x(), epsilon = 1e-12);
        // The fold edges are shared, so only the outer rim is open
        let fold_face = 16;
        assert!(!strip.topology().face_edge_neighbors(fold_face).is_empty());
    }
}
