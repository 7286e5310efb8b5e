use super::semiconductor::{
    charge, contact_potential, electron_density, hole_density, neutral_potential,
};
use crate::discretization::grid::Grid;
use crate::models::device::Device;
use crate::physics::bc::{BoundaryCondition, Side};
use crate::physics::{Formulation, PhysicsModel};
use nalgebra::DVector;
use num_dual::DualNum;

/// Poisson's equation in the dark with flat quasi-Fermi levels.
///
/// The only unknown is the electrostatic potential; both contacts pin it to
/// their equilibrium value.
#[derive(Debug, Clone, Copy)]
pub struct EquilibriumModel<'a> {
    device: &'a Device,
    contacts: [f64; 2],
}

impl<'a> EquilibriumModel<'a> {
    pub fn new(device: &'a Device) -> Self {
        Self {
            device,
            contacts: [
                contact_potential(device, Side::Front),
                contact_potential(device, Side::Back),
            ],
        }
    }

    pub fn device(&self) -> &Device {
        self.device
    }
}

impl PhysicsModel for EquilibriumModel<'_> {
    fn formulation(&self) -> Formulation {
        Formulation::Equilibrium
    }

    fn grid(&self) -> &Grid {
        &self.device.grid
    }

    fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
        out[0] = displacement(self.device, edge, left[0].clone(), right[0].clone());
    }

    fn source<T: DualNum<f64>>(&self, node: usize, u: &[T], out: &mut [T]) {
        let phi = u[0].clone();
        let n = electron_density(self.device, node, phi.clone(), T::zero());
        let p = hole_density(self.device, node, phi, T::zero());
        out[0] = charge(self.device, node, n, p);
    }

    fn boundary_condition(&self, side: Side, _var: usize) -> BoundaryCondition {
        match side {
            Side::Front => BoundaryCondition::Dirichlet(self.contacts[0]),
            Side::Back => BoundaryCondition::Dirichlet(self.contacts[1]),
        }
    }

    fn contact_flux<T: DualNum<f64>>(&self, _side: Side, _var: usize, _u: &[T]) -> T {
        T::zero()
    }

    /// Local charge neutrality at every node.
    fn initial_condition(&self) -> DVector<f64> {
        DVector::from_fn(self.device.len(), |i, _| neutral_potential(self.device, i))
    }
}

/// Electric displacement `-eps dphi/dx` through `edge`, with the
/// permittivity averaged over the two nodes.
pub fn displacement<T: DualNum<f64>>(device: &Device, edge: usize, phi_l: T, phi_r: T) -> T {
    let eps = 0.5 * (device.eps[edge] + device.eps[edge + 1]);
    (phi_l - phi_r) * (eps / device.grid.dgrid()[edge])
}
