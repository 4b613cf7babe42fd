//! Core data structures for planecrate
//!
//! This crate provides the geometric kernel the polygonization pipeline is
//! built on: polygon meshes with half-edge topology and typed per-element
//! attributes, planes with least-squares fitting, convex polygons and
//! bounding boxes.

pub mod point;
pub mod mesh;
pub mod topology;
pub mod attributes;
pub mod plane;
pub mod polygon;
pub mod traits;
pub mod primitives;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use topology::*;
pub use attributes::*;
pub use plane::*;
pub use polygon::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3};
