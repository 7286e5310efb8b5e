//! Linear solves for the Newton correction.
//!
//! Nearest-neighbour coupling on a 1D grid gives a block-tridiagonal
//! Jacobian. It is assembled into band storage, then handed to faer's sparse
//! LU as triplets. A dense nalgebra LU is kept for verification.

use faer::prelude::*;
use faer::sparse::{SparseColMat, Triplet};
use log::debug;
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Pivots below this magnitude (after row equilibration) are treated as zero.
pub const PIVOT_TOLERANCE: f64 = 1e-30;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinearSolveError {
    /// `row` is where elimination broke down, or the last row when the
    /// factorization does not say.
    #[error("matrix is singular (zero pivot in row {row})")]
    Singular { row: usize },
    #[error("matrix or right-hand side contains non-finite values")]
    NonFinite,
    #[error("right-hand side has {actual} entries, matrix has {expected} rows")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Which factorization the Newton solver uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearSolver {
    #[default]
    SparseLu,
    Dense,
}

/// Square band matrix with `lower` sub- and `upper` super-diagonals.
#[derive(Debug, Clone, PartialEq)]
pub struct BandedMatrix {
    n: usize,
    lower: usize,
    upper: usize,
    width: usize,
    data: Vec<f64>,
}

impl BandedMatrix {
    pub fn zeros(n: usize, lower: usize, upper: usize) -> Self {
        let width = lower + upper + 1;
        Self {
            n,
            lower,
            upper,
            width,
            data: vec![0.0; n * width],
        }
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    pub fn bandwidths(&self) -> (usize, usize) {
        (self.lower, self.upper)
    }

    #[inline]
    fn in_band(&self, row: usize, col: usize) -> bool {
        col + self.lower >= row && col <= row + self.upper
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col + self.lower - row
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row < self.n && col < self.n && self.in_band(row, col) {
            self.data[self.index(row, col)]
        } else {
            0.0
        }
    }

    /// Adds `value` to entry `(row, col)`, which must lie inside the band.
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(self.in_band(row, col), "({row}, {col}) is outside the band");
        let k = self.index(row, col);
        self.data[k] += value;
    }

    pub fn clear_row(&mut self, row: usize) {
        let start = row * self.width;
        self.data[start..start + self.width].fill(0.0);
    }

    fn row_cols(&self, row: usize) -> std::ops::RangeInclusive<usize> {
        row.saturating_sub(self.lower)..=(row + self.upper).min(self.n - 1)
    }

    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        DVector::from_fn(self.n, |i, _| {
            self.row_cols(i).map(|j| self.get(i, j) * x[j]).sum()
        })
    }

    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.n, self.n);
        for i in 0..self.n {
            for j in self.row_cols(i) {
                dense[(i, j)] = self.get(i, j);
            }
        }
        dense
    }

    /// Nonzero entries of row `i`, each multiplied by `scale`.
    fn push_row_triplets(&self, i: usize, scale: f64, out: &mut Vec<Triplet<usize, usize, f64>>) {
        for j in self.row_cols(i) {
            let v = self.get(i, j);
            if v != 0.0 {
                out.push(Triplet::new(i, j, v * scale));
            }
        }
    }

    /// Solves `A x = rhs` with a sparse LU factorization.
    pub fn solve(&self, rhs: &DVector<f64>) -> Result<DVector<f64>, LinearSolveError> {
        let n = self.n;
        check_inputs(n, self.data.iter(), rhs)?;
        if n == 0 {
            return Ok(DVector::zeros(0));
        }

        // Row equilibration: the potential and continuity rows differ by
        // many orders of magnitude.
        let mut b = rhs.clone();
        let mut triplets = Vec::with_capacity(n * self.width);
        for i in 0..n {
            let scale = self.row_cols(i).fold(0.0_f64, |m, j| m.max(self.get(i, j).abs()));
            if scale == 0.0 {
                return Err(LinearSolveError::Singular { row: i });
            }
            self.push_row_triplets(i, 1.0 / scale, &mut triplets);
            b[i] /= scale;
        }

        let a_sp = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets).map_err(
            |e| {
                debug!("sparse matrix build failed: {e:?}");
                LinearSolveError::Singular { row: n - 1 }
            },
        )?;
        let lu = a_sp.sp_lu().map_err(|e| {
            debug!("sparse LU factorization failed: {e:?}");
            LinearSolveError::Singular { row: n - 1 }
        })?;

        let rhs = faer::Mat::<f64>::from_fn(n, 1, |i, _| b[i]);
        let x = lu.solve(rhs);

        // The inputs are finite, so a non-finite entry means a zero pivot.
        match (0..n).find(|&i| !x[(i, 0)].is_finite()) {
            Some(row) => Err(LinearSolveError::Singular { row }),
            None => Ok(DVector::from_fn(n, |i, _| x[(i, 0)])),
        }
    }
}

fn check_inputs<'a>(
    n: usize,
    mut entries: impl Iterator<Item = &'a f64>,
    rhs: &DVector<f64>,
) -> Result<(), LinearSolveError> {
    if rhs.len() != n {
        return Err(LinearSolveError::DimensionMismatch {
            expected: n,
            actual: rhs.len(),
        });
    }
    if !entries.all(|v| v.is_finite()) || !rhs.iter().all(|v| v.is_finite()) {
        return Err(LinearSolveError::NonFinite);
    }
    Ok(())
}

/// Dense LU fallback with the same row equilibration and failure modes.
pub fn solve_dense(
    mut matrix: DMatrix<f64>,
    rhs: &DVector<f64>,
) -> Result<DVector<f64>, LinearSolveError> {
    let n = matrix.nrows();
    check_inputs(n, matrix.iter(), rhs)?;

    let mut b = rhs.clone();
    for i in 0..n {
        let scale = matrix.row(i).amax();
        if scale == 0.0 {
            return Err(LinearSolveError::Singular { row: i });
        }
        matrix.row_mut(i).scale_mut(1.0 / scale);
        b[i] /= scale;
    }

    let lu = matrix.lu();
    let u = lu.u();
    if let Some(row) = (0..n).find(|&i| u[(i, i)].abs() <= PIVOT_TOLERANCE) {
        return Err(LinearSolveError::Singular { row });
    }
    let x = lu.solve(&b).ok_or(LinearSolveError::Singular { row: n - 1 })?;

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(LinearSolveError::NonFinite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn block_tridiagonal(n: usize, m: usize) -> BandedMatrix {
        let band = 2 * m - 1;
        let size = n * m;
        let mut a = BandedMatrix::zeros(size, band, band);
        for i in 0..size {
            let node = i / m;
            let first = node.saturating_sub(1) * m;
            let last = ((node + 1).min(n - 1) + 1) * m - 1;
            // Row scales spanning 16 decades, and the dominant entry of each
            // row pair swapped off the diagonal so that pivoting is needed.
            let scale = 10f64.powi((i % 5) as i32 * 4 - 8);
            for j in first..=last {
                let base = ((i * 7 + j * 3) % 11) as f64 / 5.0 - 1.0;
                a.add(i, j, 0.3 * base * scale);
            }
            let partner = if i % 2 == 0 { (i + 1).min(size - 1) } else { i - 1 };
            a.add(i, partner, 20.0 * scale);
        }
        a
    }

    #[test]
    fn sparse_lu_matches_dense() {
        let a = block_tridiagonal(40, 3);
        let x_true = DVector::from_fn(a.dim(), |i, _| (i as f64 * 0.37).sin() + 1.5);
        let b = a.mul_vec(&x_true);

        let dense = solve_dense(a.to_dense(), &b).unwrap();
        let sparse = a.solve(&b).unwrap();

        for i in 0..x_true.len() {
            assert_relative_eq!(sparse[i], x_true[i], max_relative = 1e-8);
            assert_relative_eq!(dense[i], x_true[i], max_relative = 1e-8);
        }
    }

    #[test]
    fn tridiagonal_laplacian() {
        let n = 50;
        let mut a = BandedMatrix::zeros(n, 1, 1);
        for i in 0..n {
            a.add(i, i, 2.0);
            if i > 0 {
                a.add(i, i - 1, -1.0);
            }
            if i + 1 < n {
                a.add(i, i + 1, -1.0);
            }
        }
        let x_true = DVector::from_fn(n, |i, _| i as f64);
        let b = a.mul_vec(&x_true);
        let x = a.solve(&b).unwrap();
        for i in 0..n {
            assert_relative_eq!(x[i], x_true[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn band_storage_has_no_fill_room() {
        let mut a = BandedMatrix::zeros(4, 1, 2);
        a.add(3, 2, 5.0);
        a.add(0, 2, -1.0);
        assert_eq!(a.get(3, 2), 5.0);
        assert_eq!(a.get(0, 2), -1.0);
        assert_eq!(a.get(0, 3), 0.0);
        assert_eq!(a.get(3, 0), 0.0);
        assert_eq!(a.to_dense().iter().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    fn singular_systems_are_reported() {
        let mut zero_row = BandedMatrix::zeros(3, 1, 1);
        zero_row.add(0, 0, 1.0);
        zero_row.add(2, 2, 1.0);
        let b = DVector::from_element(3, 1.0);
        assert_eq!(zero_row.solve(&b), Err(LinearSolveError::Singular { row: 1 }));
        assert_eq!(
            solve_dense(zero_row.to_dense(), &b),
            Err(LinearSolveError::Singular { row: 1 })
        );

        let mut rank_deficient = BandedMatrix::zeros(2, 1, 1);
        for (i, j) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            rank_deficient.add(i, j, 1.0);
        }
        let b = DVector::from_element(2, 1.0);
        assert!(matches!(
            rank_deficient.solve(&b),
            Err(LinearSolveError::Singular { .. })
        ));
        assert!(matches!(
            solve_dense(rank_deficient.to_dense(), &b),
            Err(LinearSolveError::Singular { .. })
        ));
    }

    #[test]
    fn empty_column_is_singular() {
        // Every row is nonzero but column 1 is empty.
        let mut a = BandedMatrix::zeros(3, 1, 1);
        a.add(0, 0, 1.0);
        a.add(1, 0, 2.0);
        a.add(1, 2, 1.0);
        a.add(2, 2, 3.0);
        let b = DVector::from_element(3, 1.0);
        assert!(matches!(a.solve(&b), Err(LinearSolveError::Singular { .. })));
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut a = BandedMatrix::zeros(2, 1, 1);
        a.add(0, 0, 1.0);
        a.add(1, 1, 1.0);
        let b = DVector::from_vec(vec![1.0, f64::NAN]);
        assert_eq!(a.solve(&b), Err(LinearSolveError::NonFinite));

        a.add(1, 0, f64::INFINITY);
        let b = DVector::from_element(2, 1.0);
        assert_eq!(a.solve(&b), Err(LinearSolveError::NonFinite));
    }

    #[test]
    fn dimension_mismatch_is_reported() {
        let a = BandedMatrix::zeros(3, 1, 1);
        let b = DVector::from_element(2, 1.0);
        assert_eq!(
            a.solve(&b),
            Err(LinearSolveError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
    }
}
