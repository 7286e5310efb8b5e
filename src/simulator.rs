//! End-to-end simulation of a device: dark equilibrium, bias sweep under
//! light, and figures of merit.

use crate::models::device::Device;
use crate::models::drift_diffusion::{BiasModel, EquilibriumModel};
use crate::models::light::LightSource;
use crate::models::potentials::Potentials;
use crate::numerics::continuation::{
    ContinuationTracer, SweepError, SweepResult, default_voltages,
};
use crate::numerics::solver::{IterationRecord, NewtonSolver, SolverError};
use crate::physics::PhysicsModel;
use crate::processing::metrics::{Metrics, MetricsError, extract_metrics};
use log::info;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("equilibrium solve failed")]
    Equilibrium(#[from] SolverError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
}

#[derive(Debug, Clone)]
pub struct EquilibriumSolution {
    pub potentials: Potentials,
    pub iterations: u32,
    pub history: Vec<IterationRecord>,
}

impl EquilibriumSolution {
    /// Built-in voltage [V] between the front and back contacts.
    pub fn built_in_voltage(&self, device: &Device) -> f64 {
        let phi = &self.potentials.phi;
        (phi[0] - phi[phi.len() - 1]) * device.scales.potential
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub solver: NewtonSolver,
    /// Applied voltages [V], strictly increasing.
    pub voltages: Vec<f64>,
    pub stop_on_current_reversal: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            solver: NewtonSolver::default(),
            voltages: default_voltages(),
            stop_on_current_reversal: false,
        }
    }
}

impl SimulationConfig {
    pub fn tracer(&self) -> ContinuationTracer {
        ContinuationTracer {
            solver: self.solver.clone(),
            stop_on_current_reversal: self.stop_on_current_reversal,
        }
    }
}

#[derive(Debug)]
pub struct Simulation {
    pub equilibrium: EquilibriumSolution,
    pub sweep: SweepResult,
    pub metrics: Result<Metrics, MetricsError>,
    /// Power conversion efficiency as a fraction, when the light carries power
    /// and the curve yields metrics.
    pub efficiency: Option<f64>,
}

impl Simulation {
    /// Potentials at the last converged bias point.
    pub fn final_potentials(&self) -> Option<Potentials> {
        self.sweep.last_solution().map(Potentials::from_interleaved)
    }
}

/// Dark, zero-bias electrostatic potential, starting from local charge
/// neutrality.
pub fn solve_equilibrium(
    device: &Device,
    solver: &NewtonSolver,
) -> Result<EquilibriumSolution, SolverError> {
    let model = EquilibriumModel::new(device);
    let result = solver.solve(&model, model.initial_condition())?;
    Ok(EquilibriumSolution {
        potentials: Potentials::equilibrium(result.solution),
        iterations: result.iterations,
        history: result.history,
    })
}

/// Illuminated I-V curve, continued from the equilibrium state.
pub fn trace_iv_curve(
    device: &Device,
    equilibrium: &EquilibriumSolution,
    light: &LightSource,
    voltages: &[f64],
    tracer: &ContinuationTracer,
) -> Result<SweepResult, SweepError> {
    let mut model = BiasModel::new(device, light);
    tracer.trace(&mut model, equilibrium.potentials.interleave(), voltages)
}

pub fn simulate(
    device: &Device,
    light: &LightSource,
    config: &SimulationConfig,
) -> Result<Simulation, SimulationError> {
    let equilibrium = solve_equilibrium(device, &config.solver)?;
    info!(
        "equilibrium reached in {} iterations, built-in voltage {:.4} V",
        equilibrium.iterations,
        equilibrium.built_in_voltage(device)
    );

    let sweep = trace_iv_curve(device, &equilibrium, light, &config.voltages, &config.tracer())?;
    let metrics = extract_metrics(&sweep.curve());
    let efficiency = metrics
        .as_ref()
        .ok()
        .and_then(|m| m.efficiency(light.incident_power()));

    Ok(Simulation {
        equilibrium,
        sweep,
        metrics,
        efficiency,
    })
}

/// Runs independent devices in parallel.
pub fn simulate_batch(
    devices: &[Device],
    light: &LightSource,
    config: &SimulationConfig,
) -> Vec<Result<Simulation, SimulationError>> {
    devices
        .par_iter()
        .map(|device| simulate(device, light, config))
        .collect()
}
