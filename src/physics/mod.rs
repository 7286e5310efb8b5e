pub mod assembly;
pub mod bc;

use crate::discretization::grid::Grid;
use bc::{BoundaryCondition, Side};
use nalgebra::DVector;
use num_dual::DualNum;

/// Which unknowns a model solves for at every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formulation {
    /// Electrostatic potential only.
    Equilibrium,
    /// Potential and both quasi-Fermi levels, interleaved per node.
    Bias,
}

impl Formulation {
    pub fn unknowns_per_node(self) -> usize {
        match self {
            Formulation::Equilibrium => 1,
            Formulation::Bias => 3,
        }
    }
}

/// Defines the contract for a 1D model solved by box integration.
///
/// The residual of equation `r` at node `i` is
///
/// `flux_r(i) - flux_r(i - 1) - source_r(i) * box_width(i)`
///
/// where `flux(e)` is the flux through edge `e` (between nodes `e` and
/// `e + 1`) along +x. At the two contact nodes the missing edge flux comes
/// from [`PhysicsModel::contact_flux`], unless the equation is replaced by a
/// Dirichlet condition. Every kernel is generic over the number type so the
/// assembler can differentiate it with dual numbers.
pub trait PhysicsModel {
    fn formulation(&self) -> Formulation;

    fn grid(&self) -> &Grid;

    fn num_variables(&self) -> usize {
        self.formulation().unknowns_per_node()
    }

    fn num_nodes(&self) -> usize {
        self.grid().len()
    }

    fn num_unknowns(&self) -> usize {
        self.num_nodes() * self.num_variables()
    }

    fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]);

    fn source<T: DualNum<f64>>(&self, node: usize, u: &[T], out: &mut [T]);

    fn boundary_condition(&self, side: Side, var: usize) -> BoundaryCondition;

    /// Flux along +x through the contact at `side`. Only called for
    /// equations closed with [`BoundaryCondition::Flux`].
    fn contact_flux<T: DualNum<f64>>(&self, side: Side, var: usize, u: &[T]) -> T;

    /// Compute a physics-aware initial condition.
    /// Default: zeros (but models should override with something smarter)
    fn initial_condition(&self) -> DVector<f64> {
        DVector::zeros(self.num_unknowns())
    }
}

/// A model whose contacts can be driven by an applied voltage.
pub trait BiasedPhysics: PhysicsModel {
    /// Applied voltage [V].
    fn set_bias(&mut self, voltage: f64);

    fn bias(&self) -> f64;

    /// Terminal current density [A / cm^2] of a converged state.
    fn total_current(&self, u: &DVector<f64>) -> f64;
}
