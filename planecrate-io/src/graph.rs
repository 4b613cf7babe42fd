//! Chart diagnostics as OBJ
//!
//! Each structure graph node becomes a `v` line at its chart's vertex centroid
//! and each graph edge an `l` line between two of them, so the graph can be
//! overlaid on the mesh in any OBJ viewer. Chart borders and interior points
//! are written the same way, one object per chart.

use planecrate_algorithms::segment::{interior_points, segment_border, segment_centroid, segment_color};
use planecrate_algorithms::StructureGraph;
use planecrate_core::{Color, Point3d, PolygonMesh, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub fn write_graph<P: AsRef<Path>>(mesh: &PolygonMesh, graph: &StructureGraph, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_graph_to(mesh, graph, &mut BufWriter::new(file))
}

pub fn write_graph_to<W: Write>(mesh: &PolygonMesh, graph: &StructureGraph, writer: &mut W) -> Result<()> {
    // OBJ indices are 1-based
    let mut index = HashMap::with_capacity(graph.node_count());
    for (i, node) in graph.nodes().iter().enumerate() {
        let center = segment_centroid(mesh, node.chart)?;
        writeln!(writer, "v {} {} {}", center.x, center.y, center.z)?;
        index.insert(node.chart, i + 1);
    }
    for edge in graph.edges() {
        if let (Some(a), Some(b)) = (index.get(&edge.a), index.get(&edge.b)) {
            writeln!(writer, "l {} {}", a, b)?;
        }
    }
    writer.flush()?;
    info!(nodes = graph.node_count(), edges = graph.edges().len(), "structure graph written");
    Ok(())
}

/// Write every chart as an OBJ object: its border edges as `l` lines and its
/// interior points as one `p` line. Vertices carry the chart color when the
/// mesh has one.
pub fn write_segment_borders<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()> {
    let file = File::create(path)?;
    write_segment_borders_to(mesh, &mut BufWriter::new(file))
}

pub fn write_segment_borders_to<W: Write>(mesh: &PolygonMesh, writer: &mut W) -> Result<()> {
    let segment_count = mesh.charts()?.iter().max().map_or(0, |&max| max + 1);
    let mut next = 1;
    let mut border_edges = 0;
    for id in 0..segment_count {
        let color = segment_color(mesh, id).ok();
        writeln!(writer, "o chart_{}", id)?;

        for edge in segment_border(mesh, id)? {
            write_vertex(writer, &edge.source, color)?;
            write_vertex(writer, &edge.target, color)?;
            writeln!(writer, "l {} {}", next, next + 1)?;
            next += 2;
            border_edges += 1;
        }

        let interior = interior_points(mesh, id)?;
        if !interior.is_empty() {
            for point in &interior {
                write_vertex(writer, point, color)?;
            }
            let indices: Vec<String> = (next..next + interior.len()).map(|i| i.to_string()).collect();
            writeln!(writer, "p {}", indices.join(" "))?;
            next += interior.len();
        }
    }
    writer.flush()?;
    info!(charts = segment_count, border_edges, "chart borders written");
    Ok(())
}

fn write_vertex<W: Write>(writer: &mut W, p: &Point3d, color: Option<Color>) -> Result<()> {
    match color {
        Some([r, g, b]) => writeln!(
            writer,
            "v {} {} {} {} {} {}",
            p.x,
            p.y,
            p.z,
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0
        )?,
        None => writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use planecrate_algorithms::{PlanarSegmentation, Planarity, WorkerPool};
    use planecrate_core::primitives::{folded_strip, grid_plane};

    #[test]
    fn test_two_chart_borders() {
        let mut grid = grid_plane(2, 1, 1.0).unwrap();
        grid.set_charts(vec![0, 0, 1, 1]).unwrap();
        grid.set_colors(vec![[100, 100, 100], [100, 100, 100], [255, 0, 0], [255, 0, 0]])
            .unwrap();

        let mut buffer = Vec::new();
        write_segment_borders_to(&grid, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let structure: Vec<&str> = text.lines().filter(|l| !l.starts_with("v ")).collect();
        assert_eq!(
            structure,
            vec!["o chart_0", "l 1 2", "p 3 4", "o chart_1", "l 5 6", "p 7 8"]
        );

        let vertices: Vec<&str> = text.lines().filter(|l| l.starts_with("v ")).collect();
        assert_eq!(vertices.len(), 8);
        assert!(vertices.iter().all(|v| v.split_whitespace().count() == 7));
        assert!(vertices[7].ends_with(" 1 0 0"));
    }

    #[test]
    fn test_borders_without_colors() {
        let mut grid = grid_plane(1, 1, 1.0).unwrap();
        grid.set_charts(vec![0, 0]).unwrap();

        let mut buffer = Vec::new();
        write_segment_borders_to(&grid, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        // A single chart has no border; every vertex is interior
        assert!(!text.contains("l "));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
        assert!(text.lines().filter(|l| l.starts_with("v ")).all(|v| v.split_whitespace().count() == 4));
        assert!(text.lines().any(|l| l == "p 1 2 3 4"));
    }

    #[test]
    fn test_borders_need_charts() {
        let grid = grid_plane(1, 1, 1.0).unwrap();
        assert!(write_segment_borders_to(&grid, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_folded_strip_graph() {
        let mut mesh = folded_strip(4.0, 4.0, 2.0, 8, 8, 4).unwrap();
        Planarity::with_pool(WorkerPool::sequential()).compute(&mut mesh, 3).unwrap();
        let count = PlanarSegmentation::new(0.1, 3).apply(&mut mesh).unwrap();
        let graph = StructureGraph::construct(&mut mesh, count, 0.0).unwrap();

        let mut buffer = Vec::new();
        write_graph_to(&mesh, &graph, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("v "));
        assert!(lines[1].starts_with("v "));
        assert_eq!(lines[2], "l 1 2");
    }
}
