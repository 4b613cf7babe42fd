//! good_lp backend using the pure-Rust microlp solver

use crate::program::{BinaryProgram, ConstraintSense};
use crate::solver::{MilpSolver, SolverError};
use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};

/// Solves binary programs through good_lp's microlp backend
#[derive(Debug, Clone, Copy, Default)]
pub struct MicrolpSolver;

impl MilpSolver for MicrolpSolver {
    fn name(&self) -> &str {
        "microlp"
    }

    fn solve(&self, program: &BinaryProgram) -> Result<Vec<bool>, SolverError> {
        if program.variable_count() == 0 {
            return if program.is_feasible(&[]) {
                Ok(Vec::new())
            } else {
                Err(SolverError::Infeasible)
            };
        }

        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = (0..program.variable_count())
            .map(|_| vars.add(variable().binary()))
            .collect();

        let objective: Expression = x
            .iter()
            .zip(program.objective())
            .map(|(&var, &cost)| cost * var)
            .sum();

        let mut model = vars.minimise(objective).using(good_lp::microlp);
        for row in program.constraints() {
            let lhs: Expression = row
                .coefficients
                .iter()
                .map(|&(var, coefficient)| coefficient * x[var])
                .sum();
            let rhs = row.rhs;
            model = match row.sense {
                ConstraintSense::Equal => model.with(constraint!(lhs == rhs)),
                ConstraintSense::LessOrEqual => model.with(constraint!(lhs <= rhs)),
                ConstraintSense::GreaterOrEqual => model.with(constraint!(lhs >= rhs)),
            };
        }

        let solution = model.solve().map_err(|err| match err {
            ResolutionError::Infeasible => SolverError::Infeasible,
            other => SolverError::Aborted(other.to_string()),
        })?;
        Ok(x.iter().map(|&var| solution.value(var) > 0.5).collect())
    }
}
