//! Chart queries
//!
//! A chart is the set of faces sharing one chart id. Nothing about a chart is
//! stored besides that id: every query here scans the mesh again, so results
//! always reflect the current attributes.

use planecrate_core::{centroid, Color, Error, Plane, Point3d, PolygonMesh, Result, Vector3d};
use std::collections::BTreeSet;

/// A straight mesh edge between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub source: Point3d,
    pub target: Point3d,
}

impl LineSegment {
    pub fn length(&self) -> f64 {
        (self.target - self.source).norm()
    }
}

/// Faces of chart `id`, ascending
pub fn select_segment(mesh: &PolygonMesh, id: usize) -> Result<Vec<usize>> {
    Ok(mesh
        .charts()?
        .iter()
        .enumerate()
        .filter(|(_, &chart)| chart == id)
        .map(|(f, _)| f)
        .collect())
}

/// Color of the chart's first face, black for an empty chart
pub fn segment_color(mesh: &PolygonMesh, id: usize) -> Result<Color> {
    let colors = mesh.colors()?;
    Ok(select_segment(mesh, id)?
        .first()
        .map_or([0, 0, 0], |&f| colors[f]))
}

/// Normal of the chart's most planar face
pub fn segment_orientation(mesh: &PolygonMesh, id: usize) -> Result<Vector3d> {
    let planarity = mesh.face_planarity()?;
    let faces = select_segment(mesh, id)?;
    let best = faces
        .iter()
        .copied()
        .max_by(|&a, &b| planarity[a].total_cmp(&planarity[b]).then(b.cmp(&a)))
        .ok_or_else(|| Error::InvalidData(format!("chart {} has no faces", id)))?;
    Ok(mesh.face_normal(best))
}

/// Vertices used by the chart's faces, ascending
pub fn segment_vertices(mesh: &PolygonMesh, id: usize) -> Result<Vec<usize>> {
    let faces = select_segment(mesh, id)?;
    Ok(faces_vertices(mesh, &faces))
}

/// Edges the chart shares with other charts.
///
/// Edges on the open mesh boundary are not part of the border.
pub fn segment_border(mesh: &PolygonMesh, id: usize) -> Result<Vec<LineSegment>> {
    let charts = mesh.charts()?;
    let topology = mesh.topology();
    let mut border = Vec::new();
    for f in select_segment(mesh, id)? {
        for he in topology.face_half_edges(f) {
            if let Some(opposite) = topology.opposite_face(he) {
                if charts[opposite] != id {
                    border.push(LineSegment {
                        source: *mesh.vertex(topology.source(he)),
                        target: *mesh.vertex(topology.target(he)),
                    });
                }
            }
        }
    }
    Ok(border)
}

/// Positions of chart vertices whose incident faces all belong to the chart
pub fn interior_points(mesh: &PolygonMesh, id: usize) -> Result<Vec<Point3d>> {
    let charts = mesh.charts()?;
    let topology = mesh.topology();
    Ok(segment_vertices(mesh, id)?
        .into_iter()
        .filter(|&v| topology.vertex_faces(v).iter().all(|&f| charts[f] == id))
        .map(|v| *mesh.vertex(v))
        .collect())
}

/// Mean position of the chart's vertices
pub fn segment_centroid(mesh: &PolygonMesh, id: usize) -> Result<Point3d> {
    let vertices = segment_vertices(mesh, id)?;
    centroid(vertices.iter().map(|&v| mesh.vertex(v)))
        .ok_or_else(|| Error::InvalidData(format!("chart {} has no faces", id)))
}

pub fn segment_area(mesh: &PolygonMesh, id: usize) -> Result<f64> {
    Ok(select_segment(mesh, id)?.iter().map(|&f| mesh.face_area(f)).sum())
}

/// Least-squares plane through the vertices of `faces`
pub fn fit_plane_to_faces(mesh: &PolygonMesh, faces: &[usize]) -> Option<Plane> {
    let points: Vec<Point3d> = faces_vertices(mesh, faces)
        .into_iter()
        .map(|v| *mesh.vertex(v))
        .collect();
    Plane::fit(&points).map(|fit| fit.plane)
}

fn faces_vertices(mesh: &PolygonMesh, faces: &[usize]) -> Vec<usize> {
    let vertices: BTreeSet<usize> = faces.iter().flat_map(|&f| mesh.face(f).iter().copied()).collect();
    vertices.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planecrate_core::primitives::grid_plane;

    /// 2x1 grid split into a left and a right chart
    fn two_chart_grid() -> PolygonMesh {
        let mut grid = grid_plane(2, 1, 1.0).unwrap();
        grid.set_charts(vec![0, 0, 1, 1]).unwrap();
        grid.set_colors(vec![[100, 100, 100], [100, 100, 100], [200, 210, 220], [200, 210, 220]])
            .unwrap();
        grid.set_face_planarity(vec![1.0, 0.9, 0.8, 1.0]).unwrap();
        grid
    }

    #[test]
    fn test_select_and_color() {
        let mesh = two_chart_grid();
        assert_eq!(select_segment(&mesh, 1).unwrap(), vec![2, 3]);
        assert!(select_segment(&mesh, 7).unwrap().is_empty());
        assert_eq!(segment_color(&mesh, 1).unwrap(), [200, 210, 220]);
        assert_eq!(segment_color(&mesh, 7).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn test_orientation_and_centroid() {
        let mesh = two_chart_grid();
        assert_relative_eq!(segment_orientation(&mesh, 0).unwrap(), Vector3d::z(), epsilon = 1e-12);
        assert_relative_eq!(segment_centroid(&mesh, 0).unwrap(), Point3d::new(0.5, 0.5, 0.0), epsilon = 1e-12);
        assert_relative_eq!(segment_area(&mesh, 1).unwrap(), 1.0, epsilon = 1e-12);
        assert!(segment_orientation(&mesh, 5).is_err());
    }

    #[test]
    fn test_border_and_interior() {
        let mesh = two_chart_grid();
        let border = segment_border(&mesh, 0).unwrap();
        assert_eq!(border.len(), 1);
        assert_relative_eq!(border[0].length(), 1.0, epsilon = 1e-12);
        // Vertices on the shared column also touch chart 1
        assert_eq!(
            interior_points(&mesh, 0).unwrap(),
            vec![Point3d::new(0.0, 0.0, 0.0), Point3d::new(0.0, 1.0, 0.0)]
        );
        assert_eq!(segment_vertices(&mesh, 0).unwrap(), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_interior_of_single_chart() {
        let mut grid = grid_plane(2, 2, 1.0).unwrap();
        grid.set_charts(vec![0; 8]).unwrap();
        // Open boundary vertices still count as interior
        assert_eq!(interior_points(&grid, 0).unwrap().len(), 9);
        let plane = fit_plane_to_faces(&grid, &[0, 1, 2]).unwrap();
        assert_relative_eq!(plane.normal.z.abs(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_chart_attribute() {
        let grid = grid_plane(1, 1, 1.0).unwrap();
        assert!(matches!(select_segment(&grid, 0), Err(Error::MissingAttribute(_))));
    }
}
