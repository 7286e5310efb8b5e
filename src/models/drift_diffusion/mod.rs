//! Drift-diffusion model of a 1D semiconductor device.
//!
//! [`EquilibriumModel`] solves Poisson's equation alone for the dark
//! equilibrium potential; [`BiasModel`] adds both continuity equations so
//! the device can be driven by light and applied voltage.

pub mod bias;
pub mod equilibrium;
pub mod semiconductor;

pub use bias::BiasModel;
pub use equilibrium::EquilibriumModel;
