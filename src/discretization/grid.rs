use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum GridError {
    #[error("a grid needs at least two points, got {0}")]
    TooFewPoints(usize),
    #[error("grid positions must be strictly increasing (position {index})")]
    NotIncreasing { index: usize },
    #[error("grid position {index} is not finite")]
    NonFinite { index: usize },
}

/// Strictly increasing 1D node positions.
///
/// Nodes are the unknown locations of the box-integration scheme: node `i`
/// owns the control volume between the midpoints of its adjacent edges, so
/// interior boxes have width `(dgrid[i - 1] + dgrid[i]) / 2` and the two end
/// boxes are half boxes.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    positions: Vec<f64>,
    dgrid: Vec<f64>,
}

impl Grid {
    pub fn new(positions: Vec<f64>) -> Result<Self, GridError> {
        if positions.len() < 2 {
            return Err(GridError::TooFewPoints(positions.len()));
        }
        if let Some(index) = positions.iter().position(|x| !x.is_finite()) {
            return Err(GridError::NonFinite { index });
        }

        let dgrid: Vec<f64> = positions.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(edge) = dgrid.iter().position(|&h| h <= 0.0) {
            return Err(GridError::NotIncreasing { index: edge + 1 });
        }

        Ok(Self { positions, dgrid })
    }

    /// `num_points` equally spaced nodes on `[0, length]`.
    pub fn uniform(length: f64, num_points: usize) -> Result<Self, GridError> {
        Self::new(super::generator::linspace(0.0, length, num_points))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[f64] {
        &self.positions
    }

    /// Edge lengths, `dgrid[i] = x[i + 1] - x[i]`.
    pub fn dgrid(&self) -> &[f64] {
        &self.dgrid
    }

    pub fn num_edges(&self) -> usize {
        self.dgrid.len()
    }

    pub fn length(&self) -> f64 {
        self.positions[self.positions.len() - 1] - self.positions[0]
    }

    /// Width of the control volume owned by `node`.
    pub fn box_width(&self, node: usize) -> f64 {
        let last = self.positions.len() - 1;
        match node {
            0 => 0.5 * self.dgrid[0],
            n if n == last => 0.5 * self.dgrid[last - 1],
            n => 0.5 * (self.dgrid[n - 1] + self.dgrid[n]),
        }
    }

    pub fn min_spacing(&self) -> f64 {
        self.dgrid.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max_spacing(&self) -> f64 {
        self.dgrid.iter().copied().fold(0.0, f64::max)
    }

    /// Same grid with every position multiplied by `factor` (> 0).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            positions: self.positions.iter().map(|x| x * factor).collect(),
            dgrid: self.dgrid.iter().map(|h| h * factor).collect(),
        }
    }
}
