//! Face selection and extraction for a structure graph
//!
//! A solver failure is an outcome, not an error: the caller decides whether
//! to keep the unsimplified mesh or give up. Errors are reserved for invalid
//! input.

use crate::extraction::{extract, SimplifiedMesh};
use crate::optimization::{Formulation, ObjectiveWeights, Optimization};
use crate::solver::{create_solver, MilpSolver, SolverError, SolverName};
use planecrate_algorithms::{Hypothesis, StructureGraph};
use planecrate_core::{Error, PolygonMesh, Result};
use tracing::{info, warn};

/// Result of one simplification run
#[derive(Debug, Clone)]
pub enum SimplificationOutcome {
    Simplified(SimplifiedMesh),
    Failed(SolverError),
}

impl SimplificationOutcome {
    pub fn is_simplified(&self) -> bool {
        matches!(self, SimplificationOutcome::Simplified(_))
    }

    pub fn simplified(&self) -> Option<&SimplifiedMesh> {
        match self {
            SimplificationOutcome::Simplified(result) => Some(result),
            SimplificationOutcome::Failed(_) => None,
        }
    }

    pub fn into_simplified(self) -> Option<SimplifiedMesh> {
        match self {
            SimplificationOutcome::Simplified(result) => Some(result),
            SimplificationOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&SolverError> {
        match self {
            SimplificationOutcome::Simplified(_) => None,
            SimplificationOutcome::Failed(err) => Some(err),
        }
    }
}

/// Chooses the output polygons among a graph's candidate faces
#[derive(Debug, Clone, Default)]
pub struct Simplification {
    pub weights: ObjectiveWeights,
}

impl Simplification {
    pub fn new(weights: ObjectiveWeights) -> Result<Self> {
        weights.validate()?;
        Ok(Self { weights })
    }

    /// Formulate, solve with the named backend and extract.
    ///
    /// # Arguments
    /// * `mesh` - The segmented mesh the graph was built from; left untouched
    /// * `graph` - Structure graph holding the candidate faces
    /// * `solver` - Backend to solve with
    pub fn apply(
        &self,
        mesh: &PolygonMesh,
        graph: &StructureGraph,
        solver: SolverName,
    ) -> Result<SimplificationOutcome> {
        let backend = match create_solver(solver) {
            Ok(backend) => backend,
            Err(err) => {
                warn!(%solver, error = %err, "solver could not be created");
                return Ok(SimplificationOutcome::Failed(err));
            }
        };
        self.apply_with(mesh, graph, backend.as_ref())
    }

    /// Same as [`Simplification::apply`] with an explicit solver instance
    pub fn apply_with(
        &self,
        mesh: &PolygonMesh,
        graph: &StructureGraph,
        solver: &dyn MilpSolver,
    ) -> Result<SimplificationOutcome> {
        if graph.face_count() != mesh.face_count() {
            return Err(Error::InvalidParameter(format!(
                "structure graph was built from {} faces but the mesh has {}",
                graph.face_count(),
                mesh.face_count()
            )));
        }
        let formulation = Optimization::new(self.weights)?.formulate(graph.hypothesis())?;
        solve_formulation(graph.hypothesis(), &formulation, solver)
    }
}

/// Solve a formulation and extract the selected faces.
///
/// Assignments of the wrong length, violating a constraint, or selecting faces
/// that cannot be assembled into a mesh are reported as [`SolverError::Aborted`].
pub fn solve_formulation(
    hypothesis: &Hypothesis,
    formulation: &Formulation,
    solver: &dyn MilpSolver,
) -> Result<SimplificationOutcome> {
    let program = &formulation.program;
    let failed = |err: SolverError| {
        warn!(solver = solver.name(), error = %err, "optimization failed");
        Ok(SimplificationOutcome::Failed(err))
    };

    let assignment = match solver.solve(program) {
        Ok(assignment) => assignment,
        Err(err) => return failed(err),
    };
    if assignment.len() != program.variable_count() {
        return failed(SolverError::Aborted(format!(
            "assignment has {} values for {} variables",
            assignment.len(),
            program.variable_count()
        )));
    }
    let violated = program.violated_constraints(&assignment);
    if !violated.is_empty() {
        return failed(SolverError::Aborted(format!(
            "assignment violates {} constraints",
            violated.len()
        )));
    }

    let objective_value = program.objective_value(&assignment);
    let selected = formulation.layout.selected_faces(&assignment);
    let retained = formulation.layout.retained_edges(&assignment);
    let result = match extract(hypothesis, &selected, &retained, objective_value) {
        Ok(result) => result,
        Err(err) => {
            return failed(SolverError::Aborted(format!(
                "selected faces do not form a valid mesh: {}",
                err
            )))
        }
    };
    info!(
        solver = solver.name(),
        faces = result.face_count(),
        retained_edges = result.retained_edges.len(),
        objective_value,
        "mesh simplified"
    );
    Ok(SimplificationOutcome::Simplified(result))
}
