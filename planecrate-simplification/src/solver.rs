//! Solver capability for binary programs

use crate::program::BinaryProgram;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a solver produced no assignment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("program is infeasible")]
    Infeasible,

    #[error("solver unavailable: {0}")]
    Unavailable(String),

    #[error("solver aborted: {0}")]
    Aborted(String),
}

/// A backend that minimizes a [`BinaryProgram`]
pub trait MilpSolver {
    fn name(&self) -> &str;

    /// Return one value per program variable, or why there is none
    fn solve(&self, program: &BinaryProgram) -> Result<Vec<bool>, SolverError>;
}

/// Backends selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverName {
    /// good_lp with the pure-Rust microlp backend, behind the default
    /// `microlp` feature
    #[default]
    Microlp,
}

impl fmt::Display for SolverName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverName::Microlp => write!(f, "microlp"),
        }
    }
}

/// Instantiate the named backend
pub fn create_solver(name: SolverName) -> Result<Box<dyn MilpSolver>, SolverError> {
    match name {
        #[cfg(feature = "microlp")]
        SolverName::Microlp => Ok(Box::new(crate::microlp::MicrolpSolver)),
        #[cfg(not(feature = "microlp"))]
        SolverName::Microlp => Err(SolverError::Unavailable(
            "planecrate-simplification was built without the `microlp` feature".to_string(),
        )),
    }
}
