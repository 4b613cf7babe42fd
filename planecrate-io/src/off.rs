//! OFF format support

use crate::{MeshReader, MeshWriter};
use planecrate_core::{Error, Point3d, PolygonMesh, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

pub struct OffReader;
pub struct OffWriter;

impl OffReader {
    /// Parse an OFF document. Comments start with `#`; per-face colors after
    /// the vertex indices are ignored.
    pub fn parse<R: BufRead>(reader: R) -> Result<PolygonMesh> {
        let mut tokens = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let content = line.split('#').next().unwrap_or("");
            tokens.push(content.split_whitespace().map(str::to_string).collect::<Vec<_>>());
        }
        let mut lines = tokens.into_iter().filter(|t| !t.is_empty());

        let mut header = lines
            .next()
            .ok_or_else(|| Error::InvalidData("empty OFF file".to_string()))?;
        if header[0] == "OFF" {
            header.remove(0);
            if header.is_empty() {
                header = lines
                    .next()
                    .ok_or_else(|| Error::InvalidData("OFF counts missing".to_string()))?;
            }
        }
        if header.len() < 2 {
            return Err(Error::InvalidData(format!("bad OFF counts line: {:?}", header)));
        }
        let vertex_count: usize = parse_number(&header[0])?;
        let face_count: usize = parse_number(&header[1])?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for i in 0..vertex_count {
            let line = lines
                .next()
                .ok_or_else(|| Error::InvalidData(format!("OFF vertex {} missing", i)))?;
            if line.len() < 3 {
                return Err(Error::InvalidData(format!("OFF vertex {} has {} coordinates", i, line.len())));
            }
            vertices.push(Point3d::new(
                parse_number(&line[0])?,
                parse_number(&line[1])?,
                parse_number(&line[2])?,
            ));
        }

        let mut faces = Vec::with_capacity(face_count);
        for i in 0..face_count {
            let line = lines
                .next()
                .ok_or_else(|| Error::InvalidData(format!("OFF face {} missing", i)))?;
            let n: usize = parse_number(&line[0])?;
            if line.len() < n + 1 {
                return Err(Error::InvalidData(format!("OFF face {} is truncated", i)));
            }
            let face = line[1..=n]
                .iter()
                .map(|s| parse_number(s))
                .collect::<Result<Vec<usize>>>()?;
            faces.push(face);
        }

        debug!(vertices = vertices.len(), faces = faces.len(), "OFF parsed");
        PolygonMesh::new(vertices, faces)
    }
}

impl MeshReader for OffReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

impl OffWriter {
    pub fn write_to<W: Write>(mesh: &PolygonMesh, mut writer: W) -> Result<()> {
        writeln!(writer, "OFF")?;
        writeln!(writer, "{} {} 0", mesh.vertex_count(), mesh.face_count())?;
        for p in mesh.vertices() {
            writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
        }
        for face in mesh.faces() {
            write!(writer, "{}", face.len())?;
            for v in face {
                write!(writer, " {}", v)?;
            }
            writeln!(writer)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl MeshWriter for OffWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        Self::write_to(mesh, BufWriter::new(file))
    }
}

fn parse_number<T: std::str::FromStr>(token: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::InvalidData(format!("cannot parse '{}' in OFF file", token)))
}
