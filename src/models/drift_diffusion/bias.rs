use super::equilibrium::displacement;
use super::semiconductor::{
    charge, contact_potential, electron_current, electron_density, hole_current, hole_density,
    neutral_potential, recombination,
};
use crate::discretization::grid::Grid;
use crate::models::device::Device;
use crate::models::light::LightSource;
use crate::models::potentials::Potentials;
use crate::physics::bc::{BoundaryCondition, Side, surface_recombination};
use crate::physics::{BiasedPhysics, Formulation, PhysicsModel};
use nalgebra::DVector;
use num_dual::DualNum;

const POTENTIAL: usize = 0;
const ELECTRONS: usize = 1;
const HOLES: usize = 2;

/// Poisson's equation coupled to both carrier continuity equations.
///
/// Unknowns are `[phi, phi_n, phi_p]` per node. The potential is pinned at
/// both contacts, the applied voltage raising it at the back one. Carrier
/// densities leave through the contacts by surface recombination towards
/// their equilibrium values.
#[derive(Debug, Clone)]
pub struct BiasModel<'a> {
    device: &'a Device,
    generation: Vec<f64>,
    phi_eq: [f64; 2],
    n_eq: [f64; 2],
    p_eq: [f64; 2],
    bias: f64, // [V]
}

impl<'a> BiasModel<'a> {
    pub fn new(device: &'a Device, light: &LightSource) -> Self {
        Self::with_generation(device, light.generation(device))
    }

    /// Uses a precomputed normalized generation profile, one entry per node.
    pub fn with_generation(device: &'a Device, generation: Vec<f64>) -> Self {
        debug_assert_eq!(generation.len(), device.len());
        let last = device.len() - 1;
        let phi_eq = [
            contact_potential(device, Side::Front),
            contact_potential(device, Side::Back),
        ];
        Self {
            device,
            generation,
            phi_eq,
            n_eq: [
                electron_density(device, 0, phi_eq[0], 0.0),
                electron_density(device, last, phi_eq[1], 0.0),
            ],
            p_eq: [
                hole_density(device, 0, phi_eq[0], 0.0),
                hole_density(device, last, phi_eq[1], 0.0),
            ],
            bias: 0.0,
        }
    }

    pub fn dark(device: &'a Device) -> Self {
        Self::with_generation(device, vec![0.0; device.len()])
    }

    pub fn device(&self) -> &Device {
        self.device
    }

    pub fn generation(&self) -> &[f64] {
        &self.generation
    }

    pub fn potentials(&self, u: &DVector<f64>) -> Potentials {
        Potentials::from_interleaved(u)
    }

    /// Electron and hole current densities [A / cm^2] through every edge.
    pub fn edge_currents(&self, u: &DVector<f64>) -> (Vec<f64>, Vec<f64>) {
        let scale = self.device.scales.current;
        (0..self.device.grid.num_edges())
            .map(|e| {
                let (l, r) = (3 * e, 3 * (e + 1));
                let phi = [u[l], u[r]];
                let jn = electron_current(self.device, e, phi, [u[l + 1], u[r + 1]]);
                let jp = hole_current(self.device, e, phi, [u[l + 2], u[r + 2]]);
                (jn * scale, jp * scale)
            })
            .unzip()
    }

    fn side_index(side: Side) -> usize {
        match side {
            Side::Front => 0,
            Side::Back => 1,
        }
    }
}

impl PhysicsModel for BiasModel<'_> {
    fn formulation(&self) -> Formulation {
        Formulation::Bias
    }

    fn grid(&self) -> &Grid {
        &self.device.grid
    }

    fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
        let phi = [left[POTENTIAL].clone(), right[POTENTIAL].clone()];
        out[POTENTIAL] = displacement(self.device, edge, phi[0].clone(), phi[1].clone());
        out[ELECTRONS] = electron_current(
            self.device,
            edge,
            phi.clone(),
            [left[ELECTRONS].clone(), right[ELECTRONS].clone()],
        );
        out[HOLES] = hole_current(
            self.device,
            edge,
            phi,
            [left[HOLES].clone(), right[HOLES].clone()],
        );
    }

    fn source<T: DualNum<f64>>(&self, node: usize, u: &[T], out: &mut [T]) {
        let n = electron_density(self.device, node, u[POTENTIAL].clone(), u[ELECTRONS].clone());
        let p = hole_density(self.device, node, u[POTENTIAL].clone(), u[HOLES].clone());
        let net = recombination(self.device, node, n.clone(), p.clone()) - self.generation[node];

        out[POTENTIAL] = charge(self.device, node, n, p);
        out[ELECTRONS] = net.clone();
        out[HOLES] = -net;
    }

    fn boundary_condition(&self, side: Side, var: usize) -> BoundaryCondition {
        match (side, var) {
            (Side::Front, POTENTIAL) => BoundaryCondition::Dirichlet(self.phi_eq[0]),
            (Side::Back, POTENTIAL) => {
                BoundaryCondition::Dirichlet(self.phi_eq[1] + self.bias / self.device.scales.potential)
            }
            _ => BoundaryCondition::Flux,
        }
    }

    fn contact_flux<T: DualNum<f64>>(&self, side: Side, var: usize, u: &[T]) -> T {
        let node = side.node(self.device.len());
        let k = Self::side_index(side);
        let d = self.device;
        match (var, side) {
            (ELECTRONS, Side::Front) => {
                let n = electron_density(d, node, u[POTENTIAL].clone(), u[ELECTRONS].clone());
                surface_recombination(d.sn_left, n, self.n_eq[k])
            }
            (ELECTRONS, Side::Back) => {
                let n = electron_density(d, node, u[POTENTIAL].clone(), u[ELECTRONS].clone());
                -surface_recombination(d.sn_right, n, self.n_eq[k])
            }
            (HOLES, Side::Front) => {
                let p = hole_density(d, node, u[POTENTIAL].clone(), u[HOLES].clone());
                -surface_recombination(d.sp_left, p, self.p_eq[k])
            }
            (HOLES, Side::Back) => {
                let p = hole_density(d, node, u[POTENTIAL].clone(), u[HOLES].clone());
                surface_recombination(d.sp_right, p, self.p_eq[k])
            }
            _ => T::zero(),
        }
    }

    /// Charge-neutral potential with flat quasi-Fermi levels.
    fn initial_condition(&self) -> DVector<f64> {
        let phi = DVector::from_fn(self.device.len(), |i, _| neutral_potential(self.device, i));
        Potentials::equilibrium(phi).interleave()
    }
}

impl BiasedPhysics for BiasModel<'_> {
    fn set_bias(&mut self, voltage: f64) {
        self.bias = voltage;
    }

    fn bias(&self) -> f64 {
        self.bias
    }

    /// Electron plus hole current leaving through the front contact. Positive
    /// when the device delivers photocurrent.
    fn total_current(&self, u: &DVector<f64>) -> f64 {
        let front = &u.as_slice()[..3];
        let jn: f64 = self.contact_flux(Side::Front, ELECTRONS, front);
        let jp: f64 = self.contact_flux(Side::Front, HOLES, front);
        (jn + jp) * self.device.scales.current
    }
}
