//! Per-vertex and per-face attributes attached to a mesh by the pipeline stages
//!
//! Every slot is `None` until the stage owning it runs. Stages overwrite only
//! their own slots, so a later stage can always inspect what an earlier one
//! produced.

use crate::point::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshAttributes {
    /// Planarity score of each vertex's k-ring, in [0, 1]
    pub vertex_planarity: Option<Vec<f64>>,
    /// Mean planarity of each face's vertices
    pub face_planarity: Option<Vec<f64>>,
    /// Planar segment id of each face
    pub chart: Option<Vec<usize>>,
    /// Display color of each face's chart
    pub color: Option<Vec<Color>>,
    pub area: Option<Vec<f64>>,
    /// Part of the face area explained by its chart plane
    pub covered_area: Option<Vec<f64>>,
    /// Area percentage of each face's chart
    pub importance: Option<Vec<f64>>,
}

impl MeshAttributes {
    /// Drop everything produced by segmentation and later stages.
    pub fn clear_segmentation(&mut self) {
        self.chart = None;
        self.color = None;
        self.area = None;
        self.covered_area = None;
        self.importance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_segmentation_keeps_planarity() {
        let mut attributes = MeshAttributes {
            vertex_planarity: Some(vec![1.0]),
            face_planarity: Some(vec![0.5]),
            chart: Some(vec![0]),
            color: Some(vec![[100, 120, 140]]),
            area: Some(vec![2.0]),
            covered_area: Some(vec![1.5]),
            importance: Some(vec![100.0]),
        };
        attributes.clear_segmentation();
        assert_eq!(attributes.vertex_planarity, Some(vec![1.0]));
        assert_eq!(attributes.face_planarity, Some(vec![0.5]));
        assert!(attributes.chart.is_none());
        assert!(attributes.importance.is_none());
    }
}
