//! One-dimensional drift-diffusion simulation of photovoltaic devices.
//!
//! A device is described on a 1D grid ([`models::device::Device`]), its
//! equilibrium electrostatic potential is found with a damped Newton solver
//! ([`numerics::solver::NewtonSolver`]), and applied bias is stepped by a
//! warm-started continuation ([`numerics::continuation::ContinuationTracer`])
//! to trace the I-V curve. [`processing::metrics`] turns the curve into
//! Voc, Jsc, maximum power point and fill factor.

pub mod discretization;
pub mod models;
pub mod numerics;
pub mod physics;
pub mod processing;
pub mod simulator;
