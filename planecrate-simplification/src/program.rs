//! Binary linear programs
//!
//! A [`ProgramBuilder`] collects variables, objective coefficients and
//! constraints append-only; [`ProgramBuilder::build`] freezes them into a
//! [`BinaryProgram`] that solvers only read.

use planecrate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Tolerance used when checking constraint activities
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSense {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

/// `Σ coefficient · x (sense) rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// Variable index and coefficient, one entry per variable, ascending
    pub coefficients: Vec<(usize, f64)>,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn activity(&self, assignment: &[bool]) -> f64 {
        self.coefficients
            .iter()
            .filter(|&&(var, _)| assignment.get(var).copied().unwrap_or(false))
            .map(|&(_, c)| c)
            .sum()
    }

    pub fn is_satisfied(&self, assignment: &[bool]) -> bool {
        let activity = self.activity(assignment);
        match self.sense {
            ConstraintSense::Equal => (activity - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
            ConstraintSense::LessOrEqual => activity <= self.rhs + FEASIBILITY_TOLERANCE,
            ConstraintSense::GreaterOrEqual => activity >= self.rhs - FEASIBILITY_TOLERANCE,
        }
    }
}

/// Append-only construction of a [`BinaryProgram`]
#[derive(Debug, Clone, Default)]
pub struct ProgramBuilder {
    objective: Vec<f64>,
    constraints: Vec<LinearConstraint>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` binary variables with zero cost, returning their indices
    pub fn add_variables(&mut self, count: usize) -> Range<usize> {
        let start = self.objective.len();
        self.objective.resize(start + count, 0.0);
        start..start + count
    }

    pub fn variable_count(&self) -> usize {
        self.objective.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Add `coefficient` to the objective cost of `var`
    pub fn add_objective_coefficient(&mut self, var: usize, coefficient: f64) -> Result<()> {
        self.check_variable(var)?;
        check_finite(coefficient)?;
        self.objective[var] += coefficient;
        Ok(())
    }

    /// Append a constraint, merging repeated variables. Returns its index.
    pub fn add_constraint<I>(&mut self, coefficients: I, sense: ConstraintSense, rhs: f64) -> Result<usize>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        check_finite(rhs)?;
        let mut merged: BTreeMap<usize, f64> = BTreeMap::new();
        for (var, coefficient) in coefficients {
            self.check_variable(var)?;
            check_finite(coefficient)?;
            *merged.entry(var).or_insert(0.0) += coefficient;
        }
        self.constraints.push(LinearConstraint {
            coefficients: merged.into_iter().filter(|&(_, c)| c != 0.0).collect(),
            sense,
            rhs,
        });
        Ok(self.constraints.len() - 1)
    }

    /// Freeze the program
    pub fn build(self) -> BinaryProgram {
        BinaryProgram {
            objective: self.objective,
            constraints: self.constraints,
        }
    }

    fn check_variable(&self, var: usize) -> Result<()> {
        if var >= self.objective.len() {
            return Err(Error::InvalidParameter(format!(
                "variable {} does not exist, program has {}",
                var,
                self.objective.len()
            )));
        }
        Ok(())
    }
}

fn check_finite(value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidParameter(format!("non-finite coefficient {}", value)));
    }
    Ok(())
}

/// A minimization problem over binary variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryProgram {
    objective: Vec<f64>,
    constraints: Vec<LinearConstraint>,
}

impl BinaryProgram {
    pub fn variable_count(&self) -> usize {
        self.objective.len()
    }

    /// Cost of each variable
    pub fn objective(&self) -> &[f64] {
        &self.objective
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective_value(&self, assignment: &[bool]) -> f64 {
        self.objective
            .iter()
            .zip(assignment)
            .filter(|(_, &x)| x)
            .map(|(&c, _)| c)
            .sum()
    }

    /// Whether `assignment` has one value per variable and meets every constraint
    pub fn is_feasible(&self, assignment: &[bool]) -> bool {
        assignment.len() == self.objective.len() && self.constraints.iter().all(|c| c.is_satisfied(assignment))
    }

    /// Indices of the constraints `assignment` violates
    pub fn violated_constraints(&self, assignment: &[bool]) -> Vec<usize> {
        self.constraints
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_satisfied(assignment))
            .map(|(i, _)| i)
            .collect()
    }
}
