pub mod device;
pub mod drift_diffusion;
pub mod light;
pub mod material;
pub mod potentials;
pub mod reference;
pub mod scales;
