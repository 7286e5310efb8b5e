pub mod banded;
pub mod continuation;
pub mod damping;
pub mod solver;
pub mod timing;

use nalgebra::DVector;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    Absolute(f64),
    Relative(f64),
    Combined(f64, f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceMetric {
    L2Norm,
    MaxNorm,
}

/// Convergence criteria for iterative solvers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceCriteria {
    Residual,
    Update,
    Both,
}

/// When a Newton iteration stops.
///
/// The default stops once the Euclidean norm of the undamped Newton step
/// drops below 1e-6; the residual is then only recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Convergence {
    pub criteria: ConvergenceCriteria,
    pub tolerance: Tolerance,
    pub metric: ConvergenceMetric,
}

impl Default for Convergence {
    fn default() -> Self {
        Self {
            criteria: ConvergenceCriteria::Update,
            tolerance: Tolerance::Absolute(1e-6),
            metric: ConvergenceMetric::L2Norm,
        }
    }
}

impl Convergence {
    pub fn norm(&self, vector: &DVector<f64>) -> f64 {
        match self.metric {
            ConvergenceMetric::L2Norm => vector.norm(),
            ConvergenceMetric::MaxNorm => vector.amax(),
        }
    }

    pub fn check_tolerance(&self, norm: f64, initial_norm: f64) -> bool {
        match self.tolerance {
            Tolerance::Absolute(tol) => norm < tol,
            Tolerance::Relative(tol) => norm < tol * initial_norm,
            Tolerance::Combined(abs_tol, rel_tol) => norm < abs_tol || norm < rel_tol * initial_norm,
        }
    }

    /// Norms are measured with `metric`; `initial_*` are the norms of the
    /// first iteration, used by relative tolerances.
    pub fn is_converged(
        &self,
        residual_norm: f64,
        step_norm: f64,
        initial_residual_norm: f64,
        initial_step_norm: f64,
    ) -> bool {
        match self.criteria {
            ConvergenceCriteria::Residual => {
                self.check_tolerance(residual_norm, initial_residual_norm)
            }
            ConvergenceCriteria::Update => self.check_tolerance(step_norm, initial_step_norm),
            ConvergenceCriteria::Both => {
                self.check_tolerance(residual_norm, initial_residual_norm)
                    && self.check_tolerance(step_norm, initial_step_norm)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stops_on_the_step() {
        let c = Convergence::default();
        assert!(c.is_converged(1e3, 5e-7, 1e3, 1.0));
        assert!(!c.is_converged(0.0, 2e-6, 1.0, 1.0));
    }

    #[test]
    fn relative_and_combined_tolerances() {
        let c = Convergence {
            criteria: ConvergenceCriteria::Both,
            tolerance: Tolerance::Relative(1e-3),
            metric: ConvergenceMetric::MaxNorm,
        };
        assert!(c.is_converged(0.5e-3, 0.5e-1, 1.0, 100.0));
        assert!(!c.is_converged(2e-3, 0.5e-1, 1.0, 100.0));

        let c = Convergence {
            tolerance: Tolerance::Combined(1e-8, 1e-3),
            ..c
        };
        assert!(c.check_tolerance(1e-9, 0.0));
        assert!(c.check_tolerance(1e-4, 1.0));
        assert_eq!(c.norm(&DVector::from_vec(vec![1.0, -3.0])), 3.0);
    }
}
