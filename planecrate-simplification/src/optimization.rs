//! Binary program formulation over candidate faces
//!
//! Variables `[0, num_faces)` select candidate faces. Variables
//! `[num_faces, num_faces + num_edges)` mark intersection edges with a fan of
//! at least two faces as used. Each intersection edge constrains its fan:
//! a shareable edge is either unused with no selected face or used by exactly
//! two, and an edge no two faces can share excludes its face.

use crate::program::{BinaryProgram, ConstraintSense, ProgramBuilder};
use planecrate_algorithms::Hypothesis;
use planecrate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Weights of the three objective terms; they sum to one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    /// Reward for faces supported by many input faces
    pub fitting: f64,
    /// Penalty for candidate area not explained by input faces
    pub coverage: f64,
    /// Penalty per retained intersection edge
    pub complexity: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            fitting: 0.43,
            coverage: 0.27,
            complexity: 0.30,
        }
    }
}

impl ObjectiveWeights {
    pub fn new(fitting: f64, coverage: f64, complexity: f64) -> Result<Self> {
        let weights = Self {
            fitting,
            coverage,
            complexity,
        };
        weights.validate()?;
        Ok(weights)
    }

    pub fn validate(&self) -> Result<()> {
        let all = [self.fitting, self.coverage, self.complexity];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(Error::InvalidParameter(format!(
                "objective weights must be finite and non-negative, got {:?}",
                self
            )));
        }
        let sum: f64 = all.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(Error::InvalidParameter(format!(
                "objective weights must sum to 1, got {}",
                sum
            )));
        }
        Ok(())
    }
}

/// Where each variable of a formulation lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableLayout {
    face_count: usize,
    /// Hypothesis edge index of each edge variable
    edges: Vec<usize>,
}

impl VariableLayout {
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// Number of edge variables
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn variable_count(&self) -> usize {
        self.face_count + self.edges.len()
    }

    pub fn face_variable(&self, face: usize) -> usize {
        face
    }

    /// Variable of hypothesis edge `edge`, if it has one
    pub fn edge_variable(&self, edge: usize) -> Option<usize> {
        self.edges
            .binary_search(&edge)
            .ok()
            .map(|slot| self.face_count + slot)
    }

    /// Candidate faces set in `assignment`, ascending
    pub fn selected_faces(&self, assignment: &[bool]) -> Vec<usize> {
        (0..self.face_count).filter(|&f| assignment[f]).collect()
    }

    /// Hypothesis edges whose variable is set in `assignment`, ascending
    pub fn retained_edges(&self, assignment: &[bool]) -> Vec<usize> {
        self.edges
            .iter()
            .enumerate()
            .filter(|&(slot, _)| assignment[self.face_count + slot])
            .map(|(_, &edge)| edge)
            .collect()
    }
}

/// A frozen program together with its variable layout
#[derive(Debug, Clone)]
pub struct Formulation {
    pub program: BinaryProgram,
    pub layout: VariableLayout,
}

/// Builds the face selection program of a hypothesis
#[derive(Debug, Clone, Default)]
pub struct Optimization {
    pub weights: ObjectiveWeights,
}

impl Optimization {
    pub fn new(weights: ObjectiveWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Build the program without freezing it, so callers can append
    /// constraints before solving.
    pub fn builder(&self, hypothesis: &Hypothesis) -> Result<(ProgramBuilder, VariableLayout)> {
        self.weights.validate()?;

        let faces = hypothesis.faces();
        let edges = hypothesis.edges();
        let shareable: Vec<usize> = edges
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_shareable())
            .map(|(i, _)| i)
            .collect();
        let layout = VariableLayout {
            face_count: faces.len(),
            edges: shareable,
        };

        let mut builder = ProgramBuilder::new();
        builder.add_variables(layout.variable_count());

        let total_support = hypothesis.total_supporting_faces() as f64;
        let surface = hypothesis.bbox().surface_area();
        for (f, face) in faces.iter().enumerate() {
            let mut cost = 0.0;
            if total_support > 0.0 {
                cost -= self.weights.fitting * face.supporting_face_num as f64 / total_support;
            }
            if surface > 0.0 {
                cost += self.weights.coverage * (face.area - face.covered_area) / surface;
            }
            builder.add_objective_coefficient(layout.face_variable(f), cost)?;
        }

        let per_edge = if layout.edge_count() > 0 {
            self.weights.complexity / layout.edge_count() as f64
        } else {
            0.0
        };
        for (i, edge) in edges.iter().enumerate() {
            let fan = edge.fan.iter().map(|&f| (layout.face_variable(f), 1.0));
            match layout.edge_variable(i) {
                Some(var) => {
                    builder.add_objective_coefficient(var, per_edge)?;
                    builder.add_constraint(fan.chain([(var, -2.0)]), ConstraintSense::Equal, 0.0)?;
                }
                None => {
                    builder.add_constraint(fan, ConstraintSense::Equal, 0.0)?;
                }
            }
        }

        Ok((builder, layout))
    }

    /// Build and freeze the program
    pub fn formulate(&self, hypothesis: &Hypothesis) -> Result<Formulation> {
        let (builder, layout) = self.builder(hypothesis)?;
        let program = builder.build();
        info!(
            faces = layout.face_count(),
            edge_variables = layout.edge_count(),
            constraints = program.constraints().len(),
            "optimization formulated"
        );
        Ok(Formulation { program, layout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use planecrate_algorithms::{CandidateFace, IntersectionEdge};
    use planecrate_core::{BoundingBox, ConvexPolygon, Plane, Point3d, Vector3d};

    fn square(chart: usize, support: usize, covered: f64) -> CandidateFace {
        let plane = Plane::from_point_normal(&Point3d::origin(), &Vector3d::z()).unwrap();
        let polygon = ConvexPolygon {
            vertices: vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
            ],
            plane,
        };
        CandidateFace {
            chart,
            polygon,
            supporting_face_num: support,
            area: 1.0,
            covered_area: covered,
        }
    }

    fn edge(fan: Vec<usize>) -> IntersectionEdge {
        IntersectionEdge {
            charts: (0, 1),
            start: Point3d::origin(),
            end: Point3d::new(1.0, 0.0, 0.0),
            fan,
        }
    }

    fn unit_box() -> BoundingBox {
        BoundingBox {
            min: Point3d::origin(),
            max: Point3d::new(1.0, 1.0, 1.0),
        }
    }

    #[test]
    fn test_weights_validation() {
        assert!(ObjectiveWeights::default().validate().is_ok());
        assert!(ObjectiveWeights::new(0.5, 0.5, 0.5).is_err());
        assert!(ObjectiveWeights::new(1.2, -0.2, 0.0).is_err());
        assert!(ObjectiveWeights::new(f64::NAN, 0.5, 0.5).is_err());
        assert!(ObjectiveWeights::new(0.2, 0.3, 0.5).is_ok());
    }

    #[test]
    fn test_layout_and_coefficients() {
        let faces = vec![square(0, 3, 1.0), square(0, 1, 0.5), square(1, 0, 0.0)];
        let edges = vec![edge(vec![0, 1, 2]), edge(vec![2]), edge(vec![0, 2])];
        let hypothesis = Hypothesis::new(faces, edges, unit_box()).unwrap();
        let formulation = Optimization::default().formulate(&hypothesis).unwrap();
        let layout = &formulation.layout;
        let program = &formulation.program;

        // Three faces plus the two shareable edges; no extra block
        assert_eq!(layout.variable_count(), 5);
        assert_eq!(program.variable_count(), 5);
        assert_eq!(layout.edge_variable(0), Some(3));
        assert_eq!(layout.edge_variable(1), None);
        assert_eq!(layout.edge_variable(2), Some(4));

        let c = program.objective();
        assert_relative_eq!(c[0], -0.43 * 3.0 / 4.0, epsilon = 1e-12);
        assert_relative_eq!(c[1], -0.43 * 1.0 / 4.0 + 0.27 * 0.5 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(c[2], 0.27 * 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(c[3], 0.15, epsilon = 1e-12);
        assert_relative_eq!(c[4], 0.15, epsilon = 1e-12);

        let rows = program.constraints();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].coefficients, vec![(0, 1.0), (1, 1.0), (2, 1.0), (3, -2.0)]);
        assert_eq!(rows[1].coefficients, vec![(2, 1.0)]);
        assert_eq!(rows[2].coefficients, vec![(0, 1.0), (2, 1.0), (4, -2.0)]);
        assert!(rows.iter().all(|r| r.sense == ConstraintSense::Equal && r.rhs == 0.0));

        let assignment = [true, true, false, true, false];
        assert_eq!(layout.selected_faces(&assignment), vec![0, 1]);
        assert_eq!(layout.retained_edges(&assignment), vec![0]);
    }

    #[test]
    fn test_no_shareable_edges() {
        let hypothesis = Hypothesis::new(vec![square(0, 0, 0.0)], vec![edge(vec![0])], unit_box()).unwrap();
        let formulation = Optimization::default().formulate(&hypothesis).unwrap();
        assert_eq!(formulation.program.variable_count(), 1);
        // No support anywhere: only the coverage term remains
        assert_relative_eq!(formulation.program.objective()[0], 0.27 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_invalid_weights() {
        let hypothesis = Hypothesis::new(Vec::new(), Vec::new(), unit_box()).unwrap();
        let optimization = Optimization {
            weights: ObjectiveWeights {
                fitting: 1.0,
                coverage: 1.0,
                complexity: 0.0,
            },
        };
        assert!(matches!(
            optimization.formulate(&hypothesis),
            Err(Error::InvalidParameter(_))
        ));
    }
}
