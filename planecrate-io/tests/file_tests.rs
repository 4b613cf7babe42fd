//! File-level tests for mesh reading and diagnostic output

use planecrate_algorithms::{PlanarSegmentation, Planarity, StructureGraph, WorkerPool};
use planecrate_core::primitives::{folded_strip, subdivided_cube};
use planecrate_core::Error;
use planecrate_io::{read_mesh, write_graph, write_mesh, write_segment_borders, write_segmentation};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_mesh_files_by_extension() {
    let dir = tempdir().unwrap();
    let mesh = subdivided_cube(2, 1.0, 0.0).unwrap();

    for name in ["cube.off", "cube.ply", "CUBE.OFF"] {
        let path = dir.path().join(name);
        write_mesh(&mesh, &path).unwrap();
        let loaded = read_mesh(&path).unwrap();
        assert_eq!(loaded.faces(), mesh.faces(), "{}", name);
        assert_eq!(loaded.vertices(), mesh.vertices(), "{}", name);
        assert!(loaded.is_closed());
    }

    assert!(matches!(
        write_mesh(&mesh, dir.path().join("cube.obj")),
        Err(Error::UnsupportedFormat(_))
    ));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(read_mesh(dir.path().join("absent.off")), Err(Error::Io(_))));
}

#[test]
fn test_diagnostic_outputs() {
    let dir = tempdir().unwrap();
    let mut mesh = folded_strip(4.0, 4.0, 2.0, 8, 8, 4).unwrap();
    Planarity::with_pool(WorkerPool::sequential()).compute(&mut mesh, 3).unwrap();
    let count = PlanarSegmentation::new(0.1, 3).apply(&mut mesh).unwrap();
    let graph = StructureGraph::construct(&mut mesh, count, 0.0).unwrap();

    let segmentation = dir.path().join("segmentation.ply");
    write_segmentation(&mesh, &segmentation).unwrap();
    let header = fs::read_to_string(&segmentation).unwrap();
    for property in ["planarity", "chart", "importance", "red", "green", "blue"] {
        assert!(header.contains(&format!(" {}\n", property)), "missing {}", property);
    }
    // Extra properties do not get in the way of reading the geometry back
    let loaded = read_mesh(&segmentation).unwrap();
    assert_eq!(loaded.face_count(), mesh.face_count());

    let graph_path = dir.path().join("graph.obj");
    write_graph(&mesh, &graph, &graph_path).unwrap();
    let text = fs::read_to_string(&graph_path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 2);
    assert_eq!(text.lines().filter(|l| l.starts_with("l ")).count(), 1);

    let borders_path = dir.path().join("borders.obj");
    write_segment_borders(&mesh, &borders_path).unwrap();
    let text = fs::read_to_string(&borders_path).unwrap();
    assert_eq!(text.lines().filter(|l| l.starts_with("o chart_")).count(), 2);
    // Both charts see the same fold edges from their own side
    let mut per_chart = vec![0; 2];
    let mut chart = 0;
    for line in text.lines() {
        if let Some(id) = line.strip_prefix("o chart_") {
            chart = id.parse::<usize>().unwrap();
        } else if line.starts_with("l ") {
            per_chart[chart] += 1;
        }
    }
    assert!(per_chart[0] > 0);
    assert_eq!(per_chart[0], per_chart[1]);
}
