//! Mesh input and output for planecrate
//!
//! Input meshes are read from OFF or PLY files. Results and diagnostics are
//! written as:
//! - polygon meshes (OFF or PLY)
//! - a segmentation PLY carrying planarity, chart, importance and colors
//! - the structure graph as OBJ points and lines
//! - chart borders and interior points as OBJ

pub mod off;
pub mod ply;
pub mod graph;

pub use off::{OffReader, OffWriter};
pub use ply::{write_segmentation, PlyReader, PlyWriter};
pub use graph::{write_graph, write_segment_borders};

use planecrate_core::{Error, PolygonMesh, Result};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolygonMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()>;
}

/// Auto-detect format and read mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => OffReader::read_mesh(path),
        Some("ply") => PlyReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

/// Auto-detect format and write mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("off") => OffWriter::write_mesh(mesh, path),
        Some("ply") => PlyWriter::write_mesh(mesh, path),
        _ => Err(Error::UnsupportedFormat(format!(
            "Unsupported mesh format: {:?}",
            path.extension()
        ))),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}
