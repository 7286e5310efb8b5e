use super::PhysicsModel;
use super::bc::{BoundaryCondition, Side};
use crate::numerics::banded::BandedMatrix;
use nalgebra::DVector;
use num_dual::Dual64;
use num_traits::Zero;

/// Residual `F(u)` of a box-integrated model.
pub fn residual<M: PhysicsModel>(model: &M, u: &DVector<f64>) -> DVector<f64> {
    let m = model.num_variables();
    let n = model.num_nodes();
    let grid = model.grid();
    let u = u.as_slice();
    let mut f = DVector::zeros(n * m);

    let mut flux = vec![0.0; m];
    for edge in 0..n - 1 {
        model.edge_flux(edge, node(u, edge, m), node(u, edge + 1, m), &mut flux);
        for (r, q) in flux.iter().enumerate() {
            f[edge * m + r] += q;
            f[(edge + 1) * m + r] -= q;
        }
    }

    let mut source = vec![0.0; m];
    for i in 0..n {
        model.source(i, node(u, i, m), &mut source);
        let width = grid.box_width(i);
        for (r, s) in source.iter().enumerate() {
            f[i * m + r] -= s * width;
        }
    }

    for side in [Side::Front, Side::Back] {
        let i = side.node(n);
        for r in 0..m {
            let row = i * m + r;
            match model.boundary_condition(side, r) {
                BoundaryCondition::Dirichlet(value) => f[row] = u[row] - value,
                BoundaryCondition::Flux => {
                    let q = model.contact_flux(side, r, node(u, i, m));
                    f[row] += contact_sign(side) * q;
                }
            }
        }
    }

    f
}

/// Residual and banded Jacobian.
///
/// Every kernel only sees one node or one edge, so each Jacobian block is
/// obtained by seeding the dual part of a single local unknown at a time:
/// `2m` evaluations per edge, `m` per node and per contact.
pub fn residual_and_jacobian<M: PhysicsModel>(
    model: &M,
    u: &DVector<f64>,
) -> (DVector<f64>, BandedMatrix) {
    let m = model.num_variables();
    let n = model.num_nodes();
    let grid = model.grid();
    let values = u.as_slice();
    let band = 2 * m - 1;
    let mut jac = BandedMatrix::zeros(n * m, band, band);

    let mut flux = vec![Dual64::zero(); m];
    for edge in 0..n - 1 {
        let base = edge * m;
        let window = &values[base..base + 2 * m];
        for j in 0..2 * m {
            let local = seed(window, j);
            model.edge_flux(edge, &local[..m], &local[m..], &mut flux);
            for (r, q) in flux.iter().enumerate() {
                jac.add(base + r, base + j, q.eps);
                jac.add(base + m + r, base + j, -q.eps);
            }
        }
    }

    let mut source = vec![Dual64::zero(); m];
    for i in 0..n {
        let base = i * m;
        let width = grid.box_width(i);
        for j in 0..m {
            let local = seed(node(values, i, m), j);
            model.source(i, &local, &mut source);
            for (r, s) in source.iter().enumerate() {
                jac.add(base + r, base + j, -s.eps * width);
            }
        }
    }

    for side in [Side::Front, Side::Back] {
        let i = side.node(n);
        let base = i * m;
        for r in 0..m {
            let row = base + r;
            match model.boundary_condition(side, r) {
                BoundaryCondition::Dirichlet(_) => {
                    jac.clear_row(row);
                    jac.add(row, row, 1.0);
                }
                BoundaryCondition::Flux => {
                    for j in 0..m {
                        let local = seed(node(values, i, m), j);
                        let q = model.contact_flux(side, r, &local);
                        jac.add(row, base + j, contact_sign(side) * q.eps);
                    }
                }
            }
        }
    }

    (residual(model, u), jac)
}

#[inline]
fn node<T>(u: &[T], i: usize, m: usize) -> &[T] {
    &u[i * m..(i + 1) * m]
}

/// The front contact flux enters the first box, the back one leaves the last.
#[inline]
fn contact_sign(side: Side) -> f64 {
    match side {
        Side::Front => -1.0,
        Side::Back => 1.0,
    }
}

fn seed(values: &[f64], j: usize) -> Vec<Dual64> {
    values
        .iter()
        .enumerate()
        .map(|(k, &v)| Dual64::new(v, if k == j { 1.0 } else { 0.0 }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discretization::grid::Grid;
    use crate::physics::Formulation;
    use approx::assert_relative_eq;
    use num_dual::DualNum;

    /// Two coupled nonlinear species with a Robin front contact and a
    /// Dirichlet back contact.
    struct Toy {
        grid: Grid,
    }

    impl PhysicsModel for Toy {
        fn formulation(&self) -> Formulation {
            Formulation::Bias
        }

        fn grid(&self) -> &Grid {
            &self.grid
        }

        fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
            let h = self.grid.dgrid()[edge];
            out[0] = (right[0].clone() - left[0].clone()) * (1.0 / h);
            out[1] = (right[1].clone().exp() - left[1].clone().exp()) * left[2].clone();
            out[2] = right[2].clone() * right[0].clone() - left[2].clone();
        }

        fn source<T: DualNum<f64>>(&self, node: usize, u: &[T], out: &mut [T]) {
            out[0] = u[1].clone() * u[2].clone() + node as f64;
            out[1] = u[0].clone().sin();
            out[2] = u[2].clone() * u[2].clone();
        }

        fn boundary_condition(&self, side: Side, var: usize) -> BoundaryCondition {
            match (side, var) {
                (Side::Back, 0) => BoundaryCondition::Dirichlet(0.5),
                _ => BoundaryCondition::Flux,
            }
        }

        fn contact_flux<T: DualNum<f64>>(&self, _side: Side, var: usize, u: &[T]) -> T {
            (u[var].clone() - 0.25) * 3.0 + u[0].clone() * u[1].clone()
        }
    }

    #[test]
    fn jacobian_matches_finite_differences() {
        let model = Toy {
            grid: Grid::new(vec![0.0, 0.3, 0.5, 1.1, 1.4]).unwrap(),
        };
        let u = DVector::from_fn(model.num_unknowns(), |k, _| 0.1 * (k as f64).cos());
        let (f, jac) = residual_and_jacobian(&model, &u);
        assert_relative_eq!(f, residual(&model, &u), epsilon = 1e-14);

        let h = 1e-6;
        for col in 0..u.len() {
            let mut up = u.clone();
            let mut down = u.clone();
            up[col] += h;
            down[col] -= h;
            let column = (residual(&model, &up) - residual(&model, &down)) / (2.0 * h);
            for row in 0..u.len() {
                assert_relative_eq!(jac.get(row, col), column[row], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn dirichlet_rows_are_identity() {
        let model = Toy {
            grid: Grid::uniform(1.0, 4).unwrap(),
        };
        let u = DVector::from_element(model.num_unknowns(), 0.2);
        let (f, jac) = residual_and_jacobian(&model, &u);
        let row = 3 * 3;
        assert_relative_eq!(f[row], 0.2 - 0.5);
        for col in 0..u.len() {
            let expected = if col == row { 1.0 } else { 0.0 };
            assert_eq!(jac.get(row, col), expected);
        }
    }
}
