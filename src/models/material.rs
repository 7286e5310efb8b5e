/// Bulk parameters of a semiconductor, in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub eps: f64, // relative permittivity
    pub chi: f64, // electron affinity [eV]
    pub eg: f64,  // band gap [eV]
    pub nc: f64,  // conduction band effective density of states [cm^-3]
    pub nv: f64,  // valence band effective density of states [cm^-3]
    pub mn: f64,  // electron mobility [cm^2 / V s]
    pub mp: f64,  // hole mobility [cm^2 / V s]
    pub et: f64,  // trap level relative to the intrinsic level [eV]
    pub tn: f64,  // electron SRH lifetime [s]
    pub tp: f64,  // hole SRH lifetime [s]
    pub br: f64,  // radiative coefficient [cm^3 / s]
    pub cn: f64,  // electron Auger coefficient [cm^6 / s]
    pub cp: f64,  // hole Auger coefficient [cm^6 / s]
    pub a: f64,   // absorption prefactor, alpha = a sqrt(E - Eg) [cm^-1 eV^-1/2]
}

impl Default for Material {
    fn default() -> Self {
        Self {
            eps: 1.0,
            chi: 1.0,
            eg: 1.0,
            nc: 1e17,
            nv: 1e17,
            mn: 100.0,
            mp: 100.0,
            et: 0.0,
            tn: 1e-8,
            tp: 1e-8,
            br: 0.0,
            cn: 0.0,
            cp: 0.0,
            a: 0.0,
        }
    }
}

impl Material {
    /// Intrinsic density [cm^-3] at the thermal voltage `vt` [V].
    pub fn intrinsic_density(&self, vt: f64) -> f64 {
        (self.nc * self.nv).sqrt() * (-self.eg / (2.0 * vt)).exp()
    }
}
