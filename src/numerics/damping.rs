use nalgebra::DVector;

/// Steepness of the logistic gate between the linear and logarithmic regimes.
const GATE_STEEPNESS: f64 = 500.0;

/// Damping applied to every component of a raw Newton step.
///
/// Steps with `|m| < 1` pass through unchanged, larger ones are compressed
/// to `sign(m) ln(1 + |m|)`, using `tanh` as a smooth sign. A logistic gate
/// switches between the two regimes around `|m| = 1`. The map is odd.
pub fn damp(m: f64) -> f64 {
    let sign = m.tanh();
    let magnitude = sign * m;
    let compressed = magnitude.ln_1p() * sign;
    let gate = 1.0 - 1.0 / (1.0 + (-GATE_STEEPNESS * (m * m - 1.0)).exp());
    compressed + gate * (m - compressed)
}

pub fn damp_step(step: &DVector<f64>) -> DVector<f64> {
    step.map(damp)
}
