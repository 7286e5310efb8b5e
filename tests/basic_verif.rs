use approx::assert_relative_eq;
use nalgebra::DVector;
use num_dual::DualNum;
use num_traits::Zero;

use pvdd_rs::discretization::grid::Grid;
use pvdd_rs::numerics::banded::LinearSolver;
use pvdd_rs::numerics::solver::NewtonSolver;
use pvdd_rs::physics::bc::{BoundaryCondition, Side};
use pvdd_rs::physics::{Formulation, PhysicsModel};

// -k u'' = source on [0, 1], u(0) = left, u(1) = right
struct Poisson1D {
    grid: Grid,
    k: f64,
    source: f64,
    left: f64,
    right: f64,
}

impl PhysicsModel for Poisson1D {
    fn formulation(&self) -> Formulation {
        Formulation::Equilibrium
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
        out[0] = (left[0].clone() - right[0].clone()) * (self.k / self.grid.dgrid()[edge]);
    }

    fn source<T: DualNum<f64>>(&self, _node: usize, _u: &[T], out: &mut [T]) {
        out[0] = T::zero() + self.source;
    }

    fn boundary_condition(&self, side: Side, _var: usize) -> BoundaryCondition {
        match side {
            Side::Front => BoundaryCondition::Dirichlet(self.left),
            Side::Back => BoundaryCondition::Dirichlet(self.right),
        }
    }

    fn contact_flux<T: DualNum<f64>>(&self, _side: Side, _var: usize, _u: &[T]) -> T {
        T::zero()
    }
}

// Three decoupled species sharing one grid:
//   -a'' = 0,      a(0) = 1, a(1) = 3   =>  a = 1 + 2x
//   -b'' = 2,      b(0) = b(1) = 0      =>  b = x (1 - x)
//   -c'' + c = x,  c(0) = 0, c(1) = 1   =>  c = x
struct ThreeSpecies {
    grid: Grid,
}

impl PhysicsModel for ThreeSpecies {
    fn formulation(&self) -> Formulation {
        Formulation::Bias
    }

    fn grid(&self) -> &Grid {
        &self.grid
    }

    fn edge_flux<T: DualNum<f64>>(&self, edge: usize, left: &[T], right: &[T], out: &mut [T]) {
        let h = self.grid.dgrid()[edge];
        for r in 0..3 {
            out[r] = (left[r].clone() - right[r].clone()) * (1.0 / h);
        }
    }

    fn source<T: DualNum<f64>>(&self, node: usize, u: &[T], out: &mut [T]) {
        let x = self.grid.positions()[node];
        out[0] = T::zero();
        out[1] = T::zero() + 2.0;
        out[2] = -u[2].clone() + x;
    }

    fn boundary_condition(&self, side: Side, var: usize) -> BoundaryCondition {
        let value = match (side, var) {
            (Side::Front, 0) => 1.0,
            (Side::Back, 0) => 3.0,
            (Side::Back, 2) => 1.0,
            _ => 0.0,
        };
        BoundaryCondition::Dirichlet(value)
    }

    fn contact_flux<T: DualNum<f64>>(&self, _side: Side, _var: usize, _u: &[T]) -> T {
        T::zero()
    }
}

fn stretched_grid(num_points: usize) -> Grid {
    let positions = (0..num_points)
        .map(|i| {
            let s = i as f64 / (num_points - 1) as f64;
            s * s * (3.0 - 2.0 * s)
        })
        .collect();
    Grid::new(positions).unwrap()
}

fn solvers() -> [NewtonSolver; 2] {
    [
        NewtonSolver::default(),
        NewtonSolver::default().with_linear_solver(LinearSolver::Dense),
    ]
}

#[test]
fn linear_diffusion() {
    let model = Poisson1D {
        grid: stretched_grid(51),
        k: 1.0,
        source: 0.0,
        left: 0.0,
        right: 100.0,
    };
    for solver in solvers() {
        let result = solver.solve(&model, DVector::zeros(51)).unwrap();
        assert_eq!(result.history.len(), result.iterations as usize);
        for (i, &x) in model.grid.positions().iter().enumerate() {
            assert_relative_eq!(result.solution[i], 100.0 * x, epsilon = 1e-9);
        }
    }
}

#[test]
fn poisson_with_constant_source() {
    // Box integration is nodally exact for a quadratic, even on a stretched grid.
    let model = Poisson1D {
        grid: stretched_grid(41),
        k: 0.5,
        source: 4.0,
        left: 0.0,
        right: 0.0,
    };
    for solver in solvers() {
        let result = solver.solve(&model, DVector::zeros(41)).unwrap();
        for (i, &x) in model.grid.positions().iter().enumerate() {
            let exact = 4.0 * x * (1.0 - x);
            assert_relative_eq!(result.solution[i], exact, epsilon = 1e-10);
        }
    }
}

#[test]
fn interleaved_species() {
    let n = 31;
    let model = ThreeSpecies {
        grid: Grid::uniform(1.0, n).unwrap(),
    };
    let mut solutions = Vec::new();
    for solver in solvers() {
        let result = solver.solve(&model, DVector::zeros(3 * n)).unwrap();
        for (i, &x) in model.grid.positions().iter().enumerate() {
            assert_relative_eq!(result.solution[3 * i], 1.0 + 2.0 * x, epsilon = 1e-10);
            assert_relative_eq!(result.solution[3 * i + 1], x * (1.0 - x), epsilon = 1e-10);
            assert_relative_eq!(result.solution[3 * i + 2], x, epsilon = 1e-10);
        }
        solutions.push(result.solution);
    }
    assert_relative_eq!(solutions[0], solutions[1], epsilon = 1e-12);
}
