use num_dual::DualNum;

/// End of the device a contact sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// x = 0, where light enters.
    Front,
    /// x = L.
    Back,
}

impl Side {
    pub fn node(self, num_nodes: usize) -> usize {
        match self {
            Side::Front => 0,
            Side::Back => num_nodes - 1,
        }
    }
}

/// How one equation is closed at a contact node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// The equation is replaced by `u = value`.
    Dirichlet(f64),
    /// The half-box balance is kept, with the contact flux supplied by the model.
    Flux,
}

/// Surface recombination flux `s (density - equilibrium)` of a Robin contact.
pub fn surface_recombination<T: DualNum<f64>>(velocity: f64, density: T, equilibrium: f64) -> T {
    (density - equilibrium) * velocity
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_dual::Dual64;

    #[test]
    fn contact_nodes() {
        assert_eq!(Side::Front.node(5), 0);
        assert_eq!(Side::Back.node(5), 4);
    }

    #[test]
    fn surface_recombination_is_linear_in_density() {
        let flux = surface_recombination(2.0, Dual64::new(3.0, 1.0), 1.0);
        assert_eq!(flux.re, 4.0);
        assert_eq!(flux.eps, 2.0);
    }
}
