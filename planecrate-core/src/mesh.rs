//! Polygon mesh data structure and functionality

use crate::attributes::MeshAttributes;
use crate::error::{Error, Result};
use crate::point::*;
use crate::topology::MeshTopology;
use crate::traits::{BoundingBox, Drawable};
use itertools::Itertools;

/// A polygon mesh with half-edge connectivity and typed attributes.
///
/// Vertex and face ids are indices into the vertex and face lists. The
/// connectivity is fixed at construction; only attributes change afterwards.
#[derive(Debug, Clone)]
pub struct PolygonMesh {
    vertices: Vec<Point3d>,
    faces: Vec<Vec<usize>>,
    topology: MeshTopology,
    pub attributes: MeshAttributes,
}

impl PolygonMesh {
    /// Create a mesh, checking that every face has at least three valid and
    /// distinct vertex indices.
    pub fn new(vertices: Vec<Point3d>, faces: Vec<Vec<usize>>) -> Result<Self> {
        for (fi, face) in faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(Error::InvalidData(format!(
                    "face {} has {} vertices, at least 3 required",
                    fi,
                    face.len()
                )));
            }
            if let Some(&v) = face.iter().find(|&&v| v >= vertices.len()) {
                return Err(Error::InvalidData(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    fi,
                    v,
                    vertices.len()
                )));
            }
            if !face.iter().all_unique() {
                return Err(Error::InvalidData(format!("face {} repeats a vertex", fi)));
            }
        }
        if let Some(p) = vertices.iter().find(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidData(format!("non-finite vertex {:?}", p)));
        }

        let topology = MeshTopology::build(vertices.len(), &faces);
        Ok(Self {
            vertices,
            faces,
            topology,
            attributes: MeshAttributes::default(),
        })
    }

    pub fn from_triangles(vertices: Vec<Point3d>, triangles: &[[usize; 3]]) -> Result<Self> {
        Self::new(vertices, triangles.iter().map(|t| t.to_vec()).collect())
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    pub fn vertices(&self) -> &[Point3d] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    pub fn vertex(&self, v: usize) -> &Point3d {
        &self.vertices[v]
    }

    pub fn face(&self, f: usize) -> &[usize] {
        &self.faces[f]
    }

    pub fn topology(&self) -> &MeshTopology {
        &self.topology
    }

    pub fn face_points(&self, f: usize) -> Vec<Point3d> {
        self.faces[f].iter().map(|&v| self.vertices[v]).collect()
    }

    /// Unnormalized Newell normal; its length is twice the face area
    fn newell(&self, f: usize) -> Vector3d {
        let face = &self.faces[f];
        let n = face.len();
        let mut normal = Vector3d::zeros();
        for j in 0..n {
            let a = self.vertices[face[j]];
            let b = self.vertices[face[(j + 1) % n]];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        normal
    }

    /// Unit face normal, zero for degenerate faces
    pub fn face_normal(&self, f: usize) -> Vector3d {
        let normal = self.newell(f);
        let norm = normal.norm();
        if norm > f64::EPSILON {
            normal / norm
        } else {
            Vector3d::zeros()
        }
    }

    pub fn face_area(&self, f: usize) -> f64 {
        0.5 * self.newell(f).norm()
    }

    pub fn face_centroid(&self, f: usize) -> Point3d {
        centroid(self.faces[f].iter().map(|&v| &self.vertices[v])).unwrap_or_else(Point3d::origin)
    }

    pub fn total_area(&self) -> f64 {
        (0..self.faces.len()).map(|f| self.face_area(f)).sum()
    }

    pub fn edge_length(&self, he: usize) -> f64 {
        let a = self.vertices[self.topology.source(he)];
        let b = self.vertices[self.topology.target(he)];
        (b - a).norm()
    }

    pub fn is_closed(&self) -> bool {
        self.topology.is_closed()
    }

    /// Signed enclosed volume; positive when faces point outward
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let a = self.vertices[face[0]].coords;
                face[1..]
                    .windows(2)
                    .map(|w| a.dot(&self.vertices[w[0]].coords.cross(&self.vertices[w[1]].coords)))
                    .sum::<f64>()
            })
            .sum::<f64>()
            / 6.0
    }

    /// Fan triangulation of every face
    pub fn triangulated(&self) -> Vec<[usize; 3]> {
        self.faces
            .iter()
            .flat_map(|face| face[1..].windows(2).map(move |w| [face[0], w[0], w[1]]))
            .collect()
    }

    pub fn set_vertex_planarity(&mut self, values: Vec<f64>) -> Result<()> {
        check_len("vertex planarity", values.len(), self.vertices.len())?;
        self.attributes.vertex_planarity = Some(values);
        Ok(())
    }

    pub fn vertex_planarity(&self) -> Result<&[f64]> {
        self.attributes
            .vertex_planarity
            .as_deref()
            .ok_or(Error::MissingAttribute("vertex planarity"))
    }

    pub fn set_face_planarity(&mut self, values: Vec<f64>) -> Result<()> {
        check_len("face planarity", values.len(), self.faces.len())?;
        self.attributes.face_planarity = Some(values);
        Ok(())
    }

    pub fn face_planarity(&self) -> Result<&[f64]> {
        self.attributes
            .face_planarity
            .as_deref()
            .ok_or(Error::MissingAttribute("face planarity"))
    }

    pub fn set_charts(&mut self, values: Vec<usize>) -> Result<()> {
        check_len("chart", values.len(), self.faces.len())?;
        self.attributes.chart = Some(values);
        Ok(())
    }

    pub fn charts(&self) -> Result<&[usize]> {
        self.attributes.chart.as_deref().ok_or(Error::MissingAttribute("chart"))
    }

    pub fn set_colors(&mut self, values: Vec<Color>) -> Result<()> {
        check_len("color", values.len(), self.faces.len())?;
        self.attributes.color = Some(values);
        Ok(())
    }

    pub fn colors(&self) -> Result<&[Color]> {
        self.attributes.color.as_deref().ok_or(Error::MissingAttribute("color"))
    }

    pub fn set_areas(&mut self, values: Vec<f64>) -> Result<()> {
        check_len("area", values.len(), self.faces.len())?;
        self.attributes.area = Some(values);
        Ok(())
    }

    pub fn areas(&self) -> Result<&[f64]> {
        self.attributes.area.as_deref().ok_or(Error::MissingAttribute("area"))
    }

    pub fn set_covered_areas(&mut self, values: Vec<f64>) -> Result<()> {
        check_len("covered area", values.len(), self.faces.len())?;
        self.attributes.covered_area = Some(values);
        Ok(())
    }

    pub fn covered_areas(&self) -> Result<&[f64]> {
        self.attributes
            .covered_area
            .as_deref()
            .ok_or(Error::MissingAttribute("covered area"))
    }

    pub fn set_importance(&mut self, values: Vec<f64>) -> Result<()> {
        check_len("importance", values.len(), self.faces.len())?;
        self.attributes.importance = Some(values);
        Ok(())
    }

    pub fn importance(&self) -> Result<&[f64]> {
        self.attributes
            .importance
            .as_deref()
            .ok_or(Error::MissingAttribute("importance"))
    }
}

fn check_len(name: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(Error::InvalidData(format!(
            "{} attribute has {} values, mesh has {}",
            name, got, expected
        )));
    }
    Ok(())
}

impl Drawable for PolygonMesh {
    fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }
}
