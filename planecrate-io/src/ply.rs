//! PLY format support

use crate::{MeshReader, MeshWriter};
use planecrate_core::{Error, Point3d, PolygonMesh, Result};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

pub struct PlyReader;
pub struct PlyWriter;

impl PlyReader {
    /// Parse a PLY document, keeping faces with any number of vertices
    pub fn parse<R: BufRead>(mut reader: R) -> Result<PolygonMesh> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut vertices = Vec::new();
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                vertices.push(Point3d::new(
                    extract_property_value(vertex, "x")?,
                    extract_property_value(vertex, "y")?,
                    extract_property_value(vertex, "z")?,
                ));
            }
        }

        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                faces.push(extract_face_indices(face)?);
            }
        }

        debug!(vertices = vertices.len(), faces = faces.len(), "PLY parsed");
        PolygonMesh::new(vertices, faces)
    }
}

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<PolygonMesh> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

impl PlyWriter {
    pub fn write_to<W: Write>(mesh: &PolygonMesh, writer: &mut W) -> Result<()> {
        let mut ply = mesh_ply(mesh, &[], &[]);
        Writer::new().write_ply(writer, &mut ply)?;
        writer.flush()?;
        Ok(())
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(mesh, &mut writer)
    }
}

/// An extra per-element property of the segmentation file
struct Column {
    name: &'static str,
    scalar: ScalarType,
    values: Vec<Property>,
}

impl Column {
    fn double(name: &'static str, values: &[f64]) -> Self {
        Self {
            name,
            scalar: ScalarType::Double,
            values: values.iter().map(|&v| Property::Double(v)).collect(),
        }
    }

    fn int(name: &'static str, values: &[usize]) -> Self {
        Self {
            name,
            scalar: ScalarType::Int,
            values: values.iter().map(|&v| Property::Int(v as i32)).collect(),
        }
    }

    fn uchar(name: &'static str, values: impl Iterator<Item = u8>) -> Self {
        Self {
            name,
            scalar: ScalarType::UChar,
            values: values.map(Property::UChar).collect(),
        }
    }
}

/// Write a segmented mesh with every available per-element attribute: vertex
/// planarity, and face planarity, chart, importance and color.
pub fn write_segmentation<P: AsRef<Path>>(mesh: &PolygonMesh, path: P) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_segmentation_to(mesh, &mut writer)
}

pub fn write_segmentation_to<W: Write>(mesh: &PolygonMesh, writer: &mut W) -> Result<()> {
    let mut vertex_columns = Vec::new();
    if let Ok(planarity) = mesh.vertex_planarity() {
        vertex_columns.push(Column::double("planarity", planarity));
    }

    let mut face_columns = Vec::new();
    if let Ok(planarity) = mesh.face_planarity() {
        face_columns.push(Column::double("planarity", planarity));
    }
    if let Ok(charts) = mesh.charts() {
        face_columns.push(Column::int("chart", charts));
    }
    if let Ok(importance) = mesh.importance() {
        face_columns.push(Column::double("importance", importance));
    }
    if let Ok(colors) = mesh.colors() {
        for (channel, name) in ["red", "green", "blue"].into_iter().enumerate() {
            face_columns.push(Column::uchar(name, colors.iter().map(|c| c[channel])));
        }
    }

    info!(
        vertex_properties = vertex_columns.len(),
        face_properties = face_columns.len(),
        "writing segmentation"
    );
    let mut ply = mesh_ply(mesh, &vertex_columns, &face_columns);
    Writer::new().write_ply(writer, &mut ply)?;
    writer.flush()?;
    Ok(())
}

fn mesh_ply(mesh: &PolygonMesh, vertex_columns: &[Column], face_columns: &[Column]) -> Ply<DefaultElement> {
    let mut ply = Ply::<DefaultElement>::new();

    let mut vertex_element = ElementDef::new("vertex".to_string());
    vertex_element.count = mesh.vertex_count();
    for name in ["x", "y", "z"] {
        vertex_element.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    for column in vertex_columns {
        vertex_element.properties.add(PropertyDef::new(
            column.name.to_string(),
            PropertyType::Scalar(column.scalar.clone()),
        ));
    }
    ply.header.elements.add(vertex_element);

    let mut face_element = ElementDef::new("face".to_string());
    face_element.count = mesh.face_count();
    face_element.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    for column in face_columns {
        face_element.properties.add(PropertyDef::new(
            column.name.to_string(),
            PropertyType::Scalar(column.scalar.clone()),
        ));
    }
    ply.header.elements.add(face_element);

    let vertices = mesh
        .vertices()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Double(p.x));
            element.insert("y".to_string(), Property::Double(p.y));
            element.insert("z".to_string(), Property::Double(p.z));
            for column in vertex_columns {
                element.insert(column.name.to_string(), column.values[i].clone());
            }
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let faces = mesh
        .faces()
        .iter()
        .enumerate()
        .map(|(i, face)| {
            let mut element = DefaultElement::new();
            element.insert(
                "vertex_indices".to_string(),
                Property::ListInt(face.iter().map(|&v| v as i32).collect()),
            );
            for column in face_columns {
                element.insert(column.name.to_string(), column.values[i].clone());
            }
            element
        })
        .collect();
    ply.payload.insert("face".to_string(), faces);

    ply
}

/// Extract a property value as f64 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f64> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val as f64),
        Some(Property::Double(val)) => Ok(*val),
        Some(Property::Int(val)) => Ok(*val as f64),
        Some(Property::UInt(val)) => Ok(*val as f64),
        Some(Property::Short(val)) => Ok(*val as f64),
        Some(Property::UShort(val)) => Ok(*val as f64),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    let indices = match element.get("vertex_indices").or_else(|| element.get("vertex_index")) {
        Some(Property::ListInt(indices)) => indices.iter().map(|&i| i as i64).collect::<Vec<_>>(),
        Some(Property::ListUInt(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListShort(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListUShort(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListUChar(indices)) => indices.iter().map(|&i| i as i64).collect(),
        _ => return Err(Error::InvalidData("Face indices not found".to_string())),
    };
    indices
        .into_iter()
        .map(|i| {
            usize::try_from(i).map_err(|_| Error::InvalidData(format!("negative vertex index {}", i)))
        })
        .collect()
}
