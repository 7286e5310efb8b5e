use super::device::Device;
use super::scales::{HC_EV_NM, KB, Q};
use thiserror::Error;

/// Black body temperature of the sun [K].
const SUN_TEMPERATURE: f64 = 5778.0;
/// Integrated one-sun irradiance [W / cm^2].
pub const ONE_SUN: f64 = 0.1;

#[derive(Debug, Error, PartialEq)]
pub enum SpectrumError {
    #[error("{wavelengths} wavelengths but {powers} power samples")]
    LengthMismatch { wavelengths: usize, powers: usize },
    #[error("sample {index} has a non-positive wavelength or negative power")]
    InvalidSample { index: usize },
}

/// Incident light as a sampled spectrum.
///
/// Each sample carries the power [W / cm^2] in its wavelength bin, so the
/// total irradiance is the plain sum of `power`.
#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    wavelengths: Vec<f64>, // [nm]
    power: Vec<f64>,       // [W / cm^2]
}

impl LightSource {
    pub fn new(wavelengths: Vec<f64>, power: Vec<f64>) -> Result<Self, SpectrumError> {
        if wavelengths.len() != power.len() {
            return Err(SpectrumError::LengthMismatch {
                wavelengths: wavelengths.len(),
                powers: power.len(),
            });
        }
        let bad = wavelengths
            .iter()
            .zip(&power)
            .position(|(&w, &p)| !(w.is_finite() && w > 0.0 && p.is_finite() && p >= 0.0));
        if let Some(index) = bad {
            return Err(SpectrumError::InvalidSample { index });
        }
        Ok(Self { wavelengths, power })
    }

    /// No illumination.
    pub fn dark() -> Self {
        Self {
            wavelengths: Vec::new(),
            power: Vec::new(),
        }
    }

    /// A single line at `wavelength` [nm] carrying `power` [W / cm^2].
    pub fn monochromatic(wavelength: f64, power: f64) -> Result<Self, SpectrumError> {
        Self::new(vec![wavelength], vec![power])
    }

    /// One sun: a 5778 K black body on 280-4000 nm, scaled to 100 mW/cm^2.
    pub fn sun() -> Self {
        let step = 10.0;
        let wavelengths: Vec<f64> = (0..=372).map(|i| 280.0 + step * i as f64).collect();
        // Planck's law in wavelength form, up to a constant factor.
        let shape: Vec<f64> = wavelengths
            .iter()
            .map(|&w| {
                let x = HC_EV_NM / (w * SUN_TEMPERATURE * KB / Q);
                step / (w.powi(5) * x.exp_m1())
            })
            .collect();
        let total: f64 = shape.iter().sum();
        let power = shape.iter().map(|s| s * ONE_SUN / total).collect();
        Self { wavelengths, power }
    }

    pub fn wavelengths(&self) -> &[f64] {
        &self.wavelengths
    }

    pub fn power(&self) -> &[f64] {
        &self.power
    }

    /// Total irradiance [W / cm^2].
    pub fn incident_power(&self) -> f64 {
        self.power.iter().sum()
    }

    /// Normalized optical generation rate at every node of `device`.
    ///
    /// Light enters at x = 0 and is attenuated by Beer-Lambert absorption with
    /// `alpha = a sqrt(E_photon - Eg)` above the gap.
    pub fn generation(&self, device: &Device) -> Vec<f64> {
        let n = device.len();
        let dx: Vec<f64> = device
            .grid
            .dgrid()
            .iter()
            .map(|h| h * device.scales.length)
            .collect();
        let eg: Vec<f64> = (0..n).map(|i| device.band_gap_ev(i)).collect();

        let mut generation = vec![0.0; n];
        for (&wavelength, &power) in self.wavelengths.iter().zip(&self.power) {
            let energy = HC_EV_NM / wavelength; // [eV]
            let flux = power / (energy * Q); // [photons / cm^2 s]
            let alpha: Vec<f64> = (0..n)
                .map(|i| device.a[i] * (energy - eg[i]).max(0.0).sqrt())
                .collect();

            let mut depth = 0.0;
            for i in 0..n {
                if i > 0 {
                    depth += 0.5 * (alpha[i - 1] + alpha[i]) * dx[i - 1];
                }
                generation[i] += flux * alpha[i] * (-depth).exp();
            }
        }

        let g0 = device.scales.generation;
        generation.iter().map(|g| g / g0).collect()
    }
}
