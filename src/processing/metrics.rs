//! Figures of merit of an illuminated I-V curve.

use super::interpolation::Pchip;
use crate::discretization::generator::linspace;
use crate::numerics::continuation::IvCurve;
use thiserror::Error;

/// Samples of `V J(V)` searched for the maximum power point.
pub const MPP_SAMPLES: usize = 500;

#[derive(Debug, Error, PartialEq)]
pub enum MetricsError {
    #[error("metrics need at least 2 I-V points, got {0}")]
    InsufficientData(usize),
}

/// Voltages in V, currents in A / cm^2, power in W / cm^2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub voc: f64,
    pub jsc: f64,
    pub mpp_voltage: f64,
    pub mpp_current: f64,
    pub max_power: f64,
    /// Percent.
    pub fill_factor: f64,
}

impl Metrics {
    /// Power conversion efficiency for an incident irradiance [W / cm^2].
    pub fn efficiency(&self, incident_power: f64) -> Option<f64> {
        (incident_power > 0.0).then(|| self.max_power / incident_power)
    }
}

/// Open-circuit voltage, short-circuit current, maximum power point and
/// fill factor of `curve`.
///
/// The curve is interpolated with a monotone cubic. Voc is the root on the
/// last measured segment; when that segment does not change sign the secant
/// root is used, in both cases clamped into the segment.
pub fn extract_metrics(curve: &IvCurve) -> Result<Metrics, MetricsError> {
    if curve.len() < 2 {
        return Err(MetricsError::InsufficientData(curve.len()));
    }
    let v = curve.voltages();
    let j = curve.currents();
    let interpolant =
        Pchip::new(v, j).map_err(|_| MetricsError::InsufficientData(curve.len()))?;

    let last = interpolant.num_segments() - 1;
    let voc = interpolant
        .root_in(last)
        .unwrap_or_else(|| secant_root(v[last], v[last + 1], j[last], j[last + 1]))
        .clamp(v[last], v[last + 1]);
    let jsc = interpolant.evaluate(0.0);

    if voc <= 0.0 || jsc <= 0.0 {
        return Ok(Metrics {
            voc,
            jsc,
            mpp_voltage: 0.0,
            mpp_current: jsc,
            max_power: 0.0,
            fill_factor: 0.0,
        });
    }

    let (mpp_voltage, mpp_current) = linspace(0.0, voc, MPP_SAMPLES)
        .into_iter()
        .map(|v| (v, interpolant.evaluate(v)))
        .fold((0.0, jsc), |best, (v, j)| {
            if v * j > best.0 * best.1 { (v, j) } else { best }
        });
    let max_power = mpp_voltage * mpp_current;

    Ok(Metrics {
        voc,
        jsc,
        mpp_voltage,
        mpp_current,
        max_power,
        fill_factor: max_power / (voc * jsc) * 100.0,
    })
}

fn secant_root(v0: f64, v1: f64, j0: f64, j1: f64) -> f64 {
    if j1 == j0 { v1 } else { v0 - j0 * (v1 - v0) / (j1 - j0) }
}
