use super::device::Device;
use nalgebra::DVector;

/// Electrostatic potential and quasi-Fermi levels, all normalized.
///
/// `n = Nc exp(chi + phi + phi_n)` and `p = Nv exp(-chi - Eg - phi - phi_p)`,
/// so at equilibrium `phi_n = phi_p = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Potentials {
    pub phi: DVector<f64>,
    pub phi_n: DVector<f64>,
    pub phi_p: DVector<f64>,
}

impl Potentials {
    pub fn equilibrium(phi: DVector<f64>) -> Self {
        let n = phi.len();
        Self {
            phi,
            phi_n: DVector::zeros(n),
            phi_p: DVector::zeros(n),
        }
    }

    pub fn len(&self) -> usize {
        self.phi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phi.is_empty()
    }

    /// Bias unknown vector, `[phi, phi_n, phi_p]` per node.
    pub fn interleave(&self) -> DVector<f64> {
        DVector::from_fn(3 * self.len(), |k, _| match k % 3 {
            0 => self.phi[k / 3],
            1 => self.phi_n[k / 3],
            _ => self.phi_p[k / 3],
        })
    }

    pub fn from_interleaved(u: &DVector<f64>) -> Self {
        let phi = u.iter().step_by(3).copied().collect::<Vec<_>>();
        let phi_n = u.iter().skip(1).step_by(3).copied().collect::<Vec<_>>();
        let phi_p = u.iter().skip(2).step_by(3).copied().collect::<Vec<_>>();
        Self {
            phi: DVector::from_vec(phi),
            phi_n: DVector::from_vec(phi_n),
            phi_p: DVector::from_vec(phi_p),
        }
    }

    /// Electron density [cm^-3].
    pub fn electron_density(&self, device: &Device) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                device.nc[i]
                    * (device.chi[i] + self.phi[i] + self.phi_n[i]).exp()
                    * device.scales.density
            })
            .collect()
    }

    /// Hole density [cm^-3].
    pub fn hole_density(&self, device: &Device) -> Vec<f64> {
        (0..self.len())
            .map(|i| {
                device.nv[i]
                    * (-device.chi[i] - device.eg[i] - self.phi[i] - self.phi_p[i]).exp()
                    * device.scales.density
            })
            .collect()
    }

    /// Potentials in volts.
    pub fn to_volts(&self, device: &Device) -> Self {
        let vt = device.scales.potential;
        Self {
            phi: &self.phi * vt,
            phi_n: &self.phi_n * vt,
            phi_p: &self.phi_p * vt,
        }
    }
}
