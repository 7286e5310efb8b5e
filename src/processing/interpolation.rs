use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum InterpolationError {
    #[error("interpolation needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error("{x} abscissae but {y} ordinates")]
    LengthMismatch { x: usize, y: usize },
    #[error("abscissae must be finite and strictly increasing (entry {index})")]
    NotIncreasing { index: usize },
}

/// Shape-preserving piecewise cubic Hermite interpolant (Fritsch-Carlson).
///
/// Interior slopes are the weighted harmonic mean of the adjacent secants,
/// or zero at local extrema, so monotone data gives a monotone curve. End
/// slopes use the one-sided three-point formula, limited so they neither
/// change sign nor exceed three times the end secant. Outside the knots the
/// end cubics are extended.
#[derive(Debug, Clone, PartialEq)]
pub struct Pchip {
    x: Vec<f64>,
    y: Vec<f64>,
    slopes: Vec<f64>,
}

impl Pchip {
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, InterpolationError> {
        if x.len() != y.len() {
            return Err(InterpolationError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        if x.len() < 2 {
            return Err(InterpolationError::TooFewPoints(x.len()));
        }
        if let Some(index) = x
            .iter()
            .enumerate()
            .position(|(i, v)| !v.is_finite() || (i > 0 && *v <= x[i - 1]))
        {
            return Err(InterpolationError::NotIncreasing { index });
        }

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            slopes: slopes(x, y),
        })
    }

    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    pub fn slopes(&self) -> &[f64] {
        &self.slopes
    }

    pub fn num_segments(&self) -> usize {
        self.x.len() - 1
    }

    /// Segment whose cubic is used at `v`.
    pub fn segment(&self, v: f64) -> usize {
        let last = self.num_segments() - 1;
        self.x.partition_point(|&xi| xi <= v).saturating_sub(1).min(last)
    }

    pub fn evaluate(&self, v: f64) -> f64 {
        let k = self.segment(v);
        let h = self.x[k + 1] - self.x[k];
        let t = (v - self.x[k]) / h;
        let s = 1.0 - t;

        let h00 = (1.0 + 2.0 * t) * s * s;
        let h10 = t * s * s;
        let h01 = t * t * (3.0 - 2.0 * t);
        let h11 = -t * t * s;

        h00 * self.y[k] + h10 * h * self.slopes[k] + h01 * self.y[k + 1] + h11 * h * self.slopes[k + 1]
    }

    /// Root of the interpolant inside `segment`, if its end values bracket one.
    pub fn root_in(&self, segment: usize) -> Option<f64> {
        let (mut a, mut b) = (self.x[segment], self.x[segment + 1]);
        let (mut fa, fb) = (self.y[segment], self.y[segment + 1]);
        if fa == 0.0 {
            return Some(a);
        }
        if fb == 0.0 {
            return Some(b);
        }
        if fa.signum() == fb.signum() {
            return None;
        }

        for _ in 0..200 {
            let mid = 0.5 * (a + b);
            if mid <= a || mid >= b {
                break;
            }
            let fm = self.evaluate(mid);
            if fm == 0.0 {
                return Some(mid);
            }
            if fm.signum() == fa.signum() {
                a = mid;
                fa = fm;
            } else {
                b = mid;
            }
        }
        Some(0.5 * (a + b))
    }
}

fn slopes(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let delta: Vec<f64> = y
        .windows(2)
        .zip(&h)
        .map(|(w, h)| (w[1] - w[0]) / h)
        .collect();

    if n == 2 {
        return vec![delta[0]; 2];
    }

    let mut d = vec![0.0; n];
    for k in 1..n - 1 {
        let (d0, d1) = (delta[k - 1], delta[k]);
        if d0 == 0.0 || d1 == 0.0 || d0.signum() != d1.signum() {
            continue;
        }
        let w1 = 2.0 * h[k] + h[k - 1];
        let w2 = h[k] + 2.0 * h[k - 1];
        d[k] = (w1 + w2) / (w1 / d0 + w2 / d1);
    }

    d[0] = end_slope(h[0], h[1], delta[0], delta[1]);
    d[n - 1] = end_slope(h[n - 2], h[n - 3], delta[n - 2], delta[n - 3]);
    d
}

/// One-sided three-point slope at an end knot, `h0`/`delta0` belonging to
/// the end segment.
fn end_slope(h0: f64, h1: f64, delta0: f64, delta1: f64) -> f64 {
    let d = ((2.0 * h0 + h1) * delta0 - h0 * delta1) / (h0 + h1);
    if d.signum() != delta0.signum() || delta0 == 0.0 {
        0.0
    } else if delta0.signum() != delta1.signum() && d.abs() > 3.0 * delta0.abs() {
        3.0 * delta0
    } else {
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolates_the_knots() {
        let x = [0.0, 0.3, 0.5, 1.2, 2.0];
        let y = [1.0, -2.0, 0.5, 0.4, 3.0];
        let p = Pchip::new(&x, &y).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert_relative_eq!(p.evaluate(*xi), *yi, epsilon = 1e-14);
        }
    }

    #[test]
    fn reproduces_lines_everywhere() {
        let x = [-1.0, 0.1, 0.15, 2.0, 2.5];
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        let p = Pchip::new(&x, &y).unwrap();
        for v in [-3.0, -0.5, 0.12, 1.0, 2.25, 4.0] {
            assert_relative_eq!(p.evaluate(v), 2.0 * v + 1.0, epsilon = 1e-12);
        }

        let two = Pchip::new(&[0.0, 1.0], &[1.0, 3.0]).unwrap();
        assert_eq!(two.slopes(), &[2.0, 2.0]);
        assert_relative_eq!(two.evaluate(1.5), 4.0);
    }

    #[test]
    fn monotone_data_does_not_overshoot() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 0.0, 1.0, 1.0, 1.0];
        let p = Pchip::new(&x, &y).unwrap();
        let mut previous = f64::NEG_INFINITY;
        for k in 0..=400 {
            let v = 4.0 * k as f64 / 400.0;
            let value = p.evaluate(v);
            assert!((-1e-15..=1.0 + 1e-15).contains(&value));
            assert!(value >= previous - 1e-15);
            previous = value;
        }
    }

    #[test]
    fn finds_bracketed_roots() {
        let x = [0.0, 0.5, 1.0, 1.5];
        let y: Vec<f64> = x.iter().map(|v: &f64| 1.1 - v * v).collect();
        let p = Pchip::new(&x, &y).unwrap();
        let root = p.root_in(2).unwrap();
        assert!((1.0..=1.5).contains(&root));
        assert!(p.evaluate(root).abs() < 1e-12);
        assert_relative_eq!(root, 1.1_f64.sqrt(), max_relative = 1e-2);
        assert_eq!(p.root_in(0), None);
        assert_eq!(p.root_in(1), None);
        assert_eq!(p.segment(-1.0), 0);
        assert_eq!(p.segment(0.7), 1);
        assert_eq!(p.segment(9.0), 2);
    }

    #[test]
    fn rejects_bad_knots() {
        assert_eq!(
            Pchip::new(&[0.0], &[1.0]),
            Err(InterpolationError::TooFewPoints(1))
        );
        assert_eq!(
            Pchip::new(&[0.0, 1.0], &[1.0]),
            Err(InterpolationError::LengthMismatch { x: 2, y: 1 })
        );
        assert_eq!(
            Pchip::new(&[0.0, 1.0, 1.0], &[1.0; 3]),
            Err(InterpolationError::NotIncreasing { index: 2 })
        );
    }
}
