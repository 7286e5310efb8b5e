use super::banded::{LinearSolveError, LinearSolver, solve_dense};
use super::damping::damp_step;
#[allow(unused)]
use super::timing::{finalize_and_print, record_jacobian, record_linear_solve, reset_timing};
use super::{Convergence, Tolerance};
use crate::physics::PhysicsModel;
use crate::physics::assembly::residual_and_jacobian;
use log::{debug, info};
use nalgebra::DVector;
use thiserror::Error;

#[cfg(feature = "timing")]
use std::time::Instant;

/// How the raw Newton step is shortened before it is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Damping {
    /// Component-wise logarithmic compression, see [`super::damping::damp`].
    #[default]
    Logarithmic,
    None,
}

#[derive(Debug, Clone)]
pub struct NewtonSolver {
    pub convergence: Convergence,
    pub max_iterations: u32,
    pub linear_solver: LinearSolver,
    pub damping: Damping,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self {
            convergence: Convergence::default(),
            max_iterations: 300,
            linear_solver: LinearSolver::SparseLu,
            damping: Damping::Logarithmic,
        }
    }
}

/// Diagnostics of one Newton iteration. Norms are taken before the update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationRecord {
    pub iteration: u32,
    pub residual_norm: f64,
    pub step_norm: f64,
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("singular system at Newton iteration {iteration}")]
    SingularSystem {
        iteration: u32,
        #[source]
        source: LinearSolveError,
    },
    #[error(
        "Newton's method failed to converge after {iterations} iterations \
         (|F| = {residual_norm:.3e}, |dx| = {step_norm:.3e})"
    )]
    ConvergenceFailure {
        iterations: u32,
        residual_norm: f64,
        step_norm: f64,
    },
    #[error("initial guess has {actual} entries, the model has {expected} unknowns")]
    DimensionMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub struct SolverResult {
    pub solution: DVector<f64>,
    pub iterations: u32,
    pub final_residual: f64,
    pub final_step: f64,
    pub history: Vec<IterationRecord>,
}

enum NewtonState {
    Iterating,
    Converged,
    Failed(SolverError),
}

impl NewtonSolver {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.convergence.tolerance = Tolerance::Absolute(tolerance);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_linear_solver(mut self, linear_solver: LinearSolver) -> Self {
        self.linear_solver = linear_solver;
        self
    }

    /// Damped Newton iteration from `initial_guess` until the convergence
    /// criterion holds or the iteration cap is hit.
    pub fn solve<M: PhysicsModel>(
        &self,
        model: &M,
        initial_guess: DVector<f64>,
    ) -> Result<SolverResult, SolverError> {
        let expected = model.num_unknowns();
        if initial_guess.len() != expected {
            return Err(SolverError::DimensionMismatch {
                expected,
                actual: initial_guess.len(),
            });
        }

        #[cfg(feature = "timing")]
        reset_timing();
        #[cfg(feature = "timing")]
        let solve_start = Instant::now();

        debug!("{expected} unknowns");
        debug!("    Iter |   Residual |       Step");

        let mut u = initial_guess;
        let mut history = Vec::new();
        let mut state = NewtonState::Iterating;

        let outcome = loop {
            state = match state {
                NewtonState::Iterating => self.advance(model, &mut u, &mut history),
                NewtonState::Converged => break Ok(()),
                NewtonState::Failed(error) => break Err(error),
            };
        };

        #[cfg(feature = "timing")]
        finalize_and_print(solve_start.elapsed());

        outcome?;
        let last = history[history.len() - 1];
        info!(
            "Newton converged in {} iterations (|F| = {:.3e}, |dx| = {:.3e})",
            last.iteration, last.residual_norm, last.step_norm
        );
        Ok(SolverResult {
            solution: u,
            iterations: last.iteration,
            final_residual: last.residual_norm,
            final_step: last.step_norm,
            history,
        })
    }

    fn advance<M: PhysicsModel>(
        &self,
        model: &M,
        u: &mut DVector<f64>,
        history: &mut Vec<IterationRecord>,
    ) -> NewtonState {
        let iteration = history.len() as u32 + 1;
        if iteration > self.max_iterations {
            let last = history.last();
            return NewtonState::Failed(SolverError::ConvergenceFailure {
                iterations: self.max_iterations,
                residual_norm: last.map_or(f64::INFINITY, |r| r.residual_norm),
                step_norm: last.map_or(f64::INFINITY, |r| r.step_norm),
            });
        }

        let (step, residual_norm) = match self.newton_step(model, u) {
            Ok(result) => result,
            Err(source) => return NewtonState::Failed(SolverError::SingularSystem { iteration, source }),
        };

        let step_norm = self.convergence.norm(&step);
        match self.damping {
            Damping::Logarithmic => *u += damp_step(&step),
            Damping::None => *u += step,
        }

        let record = IterationRecord {
            iteration,
            residual_norm,
            step_norm,
        };
        debug!("{iteration:>8} | {residual_norm:>10.3e} | {step_norm:>10.3e}");
        history.push(record);

        let first = history[0];
        if self.convergence.is_converged(
            residual_norm,
            step_norm,
            first.residual_norm,
            first.step_norm,
        ) {
            NewtonState::Converged
        } else {
            NewtonState::Iterating
        }
    }

    /// Solves `J dx = -F` at `u`, returning the undamped step and `|F|`.
    fn newton_step<M: PhysicsModel>(
        &self,
        model: &M,
        u: &DVector<f64>,
    ) -> Result<(DVector<f64>, f64), LinearSolveError> {
        let (residual, jacobian) = record_jacobian(|| residual_and_jacobian(model, u));
        let residual_norm = self.convergence.norm(&residual);
        let rhs = -residual;

        let step = record_linear_solve(|| match self.linear_solver {
            LinearSolver::SparseLu => jacobian.solve(&rhs),
            LinearSolver::Dense => solve_dense(jacobian.to_dense(), &rhs),
        })?;
        Ok((step, residual_norm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::grid::Grid;
    use crate::physics::Formulation;
    use crate::physics::bc::{BoundaryCondition, Side};
    use approx::assert_relative_eq;
    use num_dual::DualNum;

    /// -u'' + k (exp(u) - 1) = 0 with u(0) = 0 and u(1) = `right`.
    struct Reaction {
        grid: Grid,
        k: f64,
        right: f64,
    }

    impl Reaction {
        fn new(right: f64) -> Self {
            Self {
                grid: Grid::uniform(1.0, 41).unwrap(),
                k: 2.0,
                right,
            }
        }
    }

    impl PhysicsModel for Reaction {
        fn formulation(&self) -> Formulation {
            Formulation::Equilibrium
        }

        fn grid(&self) -> &Grid {
            &self.grid
        }

        fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
            out[0] = (left[0].clone() - right[0].clone()) * (1.0 / self.grid.dgrid()[edge]);
        }

        fn source<T: DualNum<f64>>(&self, _node: usize, u: &[T], out: &mut [T]) {
            out[0] = -(u[0].clone().exp() - 1.0) * self.k;
        }

        fn boundary_condition(&self, side: Side, _var: usize) -> BoundaryCondition {
            match side {
                Side::Front => BoundaryCondition::Dirichlet(0.0),
                Side::Back => BoundaryCondition::Dirichlet(self.right),
            }
        }

        fn contact_flux<T: DualNum<f64>>(&self, _side: Side, _var: usize, u: &[T]) -> T {
            u[0].clone() * 0.0
        }
    }

    /// Constant source and no flux: every interior Jacobian row vanishes.
    struct Degenerate(Reaction);

    impl PhysicsModel for Degenerate {
        fn formulation(&self) -> Formulation {
            Formulation::Equilibrium
        }

        fn grid(&self) -> &Grid {
            &self.0.grid
        }

        fn edge_flux<T: DualNum<f64>>(&self, _edge: usize, left: &[T], _right: &[T], out: &mut [T]) {
            out[0] = left[0].clone() * 0.0;
        }

        fn source<T: DualNum<f64>>(&self, _node: usize, u: &[T], out: &mut [T]) {
            out[0] = u[0].clone() * 0.0 + 1.0;
        }

        fn boundary_condition(&self, side: Side, var: usize) -> BoundaryCondition {
            self.0.boundary_condition(side, var)
        }

        fn contact_flux<T: DualNum<f64>>(&self, side: Side, var: usize, u: &[T]) -> T {
            self.0.contact_flux(side, var, u)
        }
    }

    #[test]
    fn converges_and_records_history() {
        let model = Reaction::new(1.0);
        let result = NewtonSolver::default()
            .solve(&model, DVector::zeros(41))
            .unwrap();

        assert!(result.iterations < 20);
        assert_eq!(result.history.len(), result.iterations as usize);
        assert!(result.final_step < 1e-6);
        for (k, record) in result.history.iter().enumerate() {
            assert_eq!(record.iteration, k as u32 + 1);
        }
        assert_relative_eq!(result.solution[0], 0.0);
        assert_relative_eq!(result.solution[40], 1.0, epsilon = 1e-12);
        let f = crate::physics::assembly::residual(&model, &result.solution);
        assert!(f.norm() < 1e-8);
    }

    #[test]
    fn dense_fallback_agrees_with_sparse_lu() {
        let model = Reaction::new(3.0);
        let sparse = NewtonSolver::default()
            .solve(&model, DVector::zeros(41))
            .unwrap();
        let dense = NewtonSolver::default()
            .with_linear_solver(LinearSolver::Dense)
            .solve(&model, DVector::zeros(41))
            .unwrap();
        assert_relative_eq!(sparse.solution, dense.solution, epsilon = 1e-9);
    }

    #[test]
    fn resolving_a_converged_state_takes_one_iteration() {
        let model = Reaction::new(2.0);
        let solver = NewtonSolver::default();
        let first = solver.solve(&model, DVector::zeros(41)).unwrap();
        let again = solver.solve(&model, first.solution.clone()).unwrap();
        assert_eq!(again.iterations, 1);
        assert_relative_eq!(again.solution, first.solution, epsilon = 1e-9);
    }

    #[test]
    fn iteration_cap_reports_last_norms() {
        let model = Reaction::new(30.0);
        let err = NewtonSolver::default()
            .with_max_iterations(3)
            .solve(&model, DVector::zeros(41))
            .unwrap_err();
        match err {
            SolverError::ConvergenceFailure {
                iterations,
                residual_norm,
                step_norm,
            } => {
                assert_eq!(iterations, 3);
                assert!(residual_norm.is_finite());
                assert!(step_norm > 1e-6 && step_norm.is_finite());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn singular_jacobian_is_reported() {
        let model = Degenerate(Reaction::new(1.0));
        for linear_solver in [LinearSolver::SparseLu, LinearSolver::Dense] {
            let err = NewtonSolver::default()
                .with_linear_solver(linear_solver)
                .solve(&model, DVector::zeros(41))
                .unwrap_err();
            assert!(matches!(
                err,
                SolverError::SingularSystem {
                    iteration: 1,
                    source: LinearSolveError::Singular { .. }
                }
            ));
        }
    }

    #[test]
    fn wrong_guess_length_is_rejected() {
        let err = NewtonSolver::default()
            .solve(&Reaction::new(1.0), DVector::zeros(7))
            .unwrap_err();
        assert!(matches!(
            err,
            SolverError::DimensionMismatch {
                expected: 41,
                actual: 7
            }
        ));
    }
}
