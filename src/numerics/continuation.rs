//! Bias continuation: one Newton solve per applied voltage, each warm-started
//! from the previous converged state.

use super::solver::{IterationRecord, NewtonSolver, SolverError};
use crate::physics::BiasedPhysics;
use log::{info, warn};
use nalgebra::DVector;
use std::ops::ControlFlow;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("{voltages} voltages but {currents} currents")]
    LengthMismatch { voltages: usize, currents: usize },
    #[error("voltages must be finite and strictly increasing (entry {index})")]
    NotIncreasing { index: usize },
}

/// Current density [A / cm^2] against applied voltage [V], ordered by
/// strictly increasing voltage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IvCurve {
    voltages: Vec<f64>,
    currents: Vec<f64>,
}

impl IvCurve {
    pub fn new(voltages: Vec<f64>, currents: Vec<f64>) -> Result<Self, CurveError> {
        if voltages.len() != currents.len() {
            return Err(CurveError::LengthMismatch {
                voltages: voltages.len(),
                currents: currents.len(),
            });
        }
        if let Some(index) = first_unordered(&voltages) {
            return Err(CurveError::NotIncreasing { index });
        }
        Ok(Self { voltages, currents })
    }

    pub fn len(&self) -> usize {
        self.voltages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltages.is_empty()
    }

    pub fn voltages(&self) -> &[f64] {
        &self.voltages
    }

    pub fn currents(&self) -> &[f64] {
        &self.currents
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.voltages.iter().copied().zip(self.currents.iter().copied())
    }
}

/// First index that is not finite or breaks strict ordering.
fn first_unordered(values: &[f64]) -> Option<usize> {
    values.iter().enumerate().position(|(i, v)| {
        !v.is_finite() || (i > 0 && *v <= values[i - 1])
    })
}

/// A converged bias point.
#[derive(Debug, Clone)]
pub struct BiasPoint {
    pub voltage: f64,
    pub current: f64,
    pub iterations: u32,
    /// Converged unknowns of the bias model.
    pub solution: DVector<f64>,
    /// Newton iterations taken at this voltage.
    pub history: Vec<IterationRecord>,
}

#[derive(Debug)]
pub enum SweepTermination {
    /// Every requested voltage converged.
    Completed,
    /// Stopped after the first point with a negative current.
    CurrentReversed { voltage: f64 },
    /// Newton failed at `voltage`; the points before it are kept.
    Diverged { voltage: f64, error: SolverError },
}

#[derive(Debug, Error, PartialEq)]
pub enum SweepError {
    #[error("bias voltages must be finite and strictly increasing (entry {index})")]
    VoltagesNotIncreasing { index: usize },
}

#[derive(Debug)]
pub struct SweepResult {
    pub points: Vec<BiasPoint>,
    pub termination: SweepTermination,
}

impl SweepResult {
    pub fn curve(&self) -> IvCurve {
        IvCurve {
            voltages: self.points.iter().map(|p| p.voltage).collect(),
            currents: self.points.iter().map(|p| p.current).collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self.termination, SweepTermination::Diverged { .. })
    }

    /// Voltage at which Newton failed, if it did.
    pub fn failed_voltage(&self) -> Option<f64> {
        match self.termination {
            SweepTermination::Diverged { voltage, .. } => Some(voltage),
            _ => None,
        }
    }

    pub fn last_solution(&self) -> Option<&DVector<f64>> {
        self.points.last().map(|p| &p.solution)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContinuationTracer {
    pub solver: NewtonSolver,
    /// End the sweep at the first point whose current is negative, i.e.
    /// just past open circuit.
    pub stop_on_current_reversal: bool,
}

impl ContinuationTracer {
    pub fn new(solver: NewtonSolver) -> Self {
        Self {
            solver,
            stop_on_current_reversal: false,
        }
    }

    /// Steps `model` through `voltages` starting from `initial`, the
    /// converged state at (or before) the first voltage.
    ///
    /// A bias point that fails to converge ends the sweep; the result then
    /// holds the converged prefix and the failing voltage.
    pub fn trace<M: BiasedPhysics>(
        &self,
        model: &mut M,
        initial: DVector<f64>,
        voltages: &[f64],
    ) -> Result<SweepResult, SweepError> {
        if let Some(index) = first_unordered(voltages) {
            return Err(SweepError::VoltagesNotIncreasing { index });
        }

        let mut points = Vec::with_capacity(voltages.len());
        let flow = voltages.iter().try_fold(initial, |guess, &voltage| {
            model.set_bias(voltage);
            match self.solver.solve(&*model, guess) {
                Ok(mut result) => {
                    let current = model.total_current(&result.solution);
                    info!(
                        "V = {voltage:.4} V: J = {current:.6e} A/cm^2 ({} iterations)",
                        result.iterations
                    );
                    points.push(BiasPoint {
                        voltage,
                        current,
                        iterations: result.iterations,
                        solution: result.solution.clone(),
                        history: std::mem::take(&mut result.history),
                    });
                    if self.stop_on_current_reversal && current < 0.0 {
                        ControlFlow::Break(SweepTermination::CurrentReversed { voltage })
                    } else {
                        ControlFlow::Continue(result.solution)
                    }
                }
                Err(error) => {
                    warn!("bias sweep stopped at V = {voltage:.4} V: {error}");
                    ControlFlow::Break(SweepTermination::Diverged { voltage, error })
                }
            }
        });

        let termination = match flow {
            ControlFlow::Continue(_) => SweepTermination::Completed,
            ControlFlow::Break(termination) => termination,
        };
        Ok(SweepResult {
            points,
            termination,
        })
    }
}

pub const DEFAULT_MAX_VOLTAGE: f64 = 0.95; // [V]
pub const DEFAULT_VOLTAGE_STEP: f64 = 0.05; // [V]

/// 0 to 0.95 V in steps of 0.05 V.
pub fn default_voltages() -> Vec<f64> {
    bias_voltages(0.0, DEFAULT_MAX_VOLTAGE, DEFAULT_VOLTAGE_STEP)
}

/// `start, start + step, ...` up to `stop` (inclusive within half a step).
pub fn bias_voltages(start: f64, stop: f64, step: f64) -> Vec<f64> {
    if !(step > 0.0) || !start.is_finite() || !stop.is_finite() || stop < start {
        return Vec::new();
    }
    let count = ((stop - start) / step + 0.5).floor() as usize + 1;
    (0..count).map(|k| start + k as f64 * step).collect()
}
