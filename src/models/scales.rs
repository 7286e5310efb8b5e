//! Physical constants and the normalization used by the solver.
//!
//! Potentials and energies are measured in thermal voltages, densities in
//! units of [`DENSITY_SCALE`], lengths in the extrinsic Debye length built
//! from those two. Every other scale follows from these and the mobility
//! scale.

pub const Q: f64 = 1.602176634e-19; // [C]
pub const KB: f64 = 1.380649e-23; // [J/K]
pub const EPS0: f64 = 8.8541878128e-14; // [F/cm]
pub const HC_EV_NM: f64 = 1239.84193; // [eV nm]

pub const TEMPERATURE: f64 = 300.0; // [K]
pub const DENSITY_SCALE: f64 = 1e19; // [cm^-3]
pub const MOBILITY_SCALE: f64 = 1.0; // [cm^2 / V s]

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scales {
    pub temperature: f64, // [K]
    pub potential: f64,   // thermal voltage [V]
    pub density: f64,     // [cm^-3]
    pub length: f64,      // [cm]
    pub mobility: f64,    // [cm^2 / V s]
    pub time: f64,        // [s]
    pub current: f64,     // [A / cm^2]
    pub generation: f64,  // [cm^-3 s^-1]
    pub velocity: f64,    // [cm / s]
}

impl Scales {
    pub fn at_temperature(temperature: f64) -> Self {
        let potential = KB * temperature / Q;
        let density = DENSITY_SCALE;
        let mobility = MOBILITY_SCALE;
        let length = (EPS0 * potential / (Q * density)).sqrt();
        let time = length * length / (mobility * potential);
        let current = Q * mobility * potential * density / length;
        let generation = density / time;
        let velocity = length / time;

        Self {
            temperature,
            potential,
            density,
            length,
            mobility,
            time,
            current,
            generation,
            velocity,
        }
    }

    pub fn log(&self) {
        log::info!("--- Scaling Constants ---");
        log::info!("Potential Scale (V_T): {:.4} V", self.potential);
        log::info!("Density Scale:         {:.2e} cm^-3", self.density);
        log::info!("Length Scale (L_D):    {:.4e} cm", self.length);
        log::info!("Time Scale:            {:.4e} s", self.time);
        log::info!("Current Scale:         {:.4e} A/cm^2", self.current);
    }
}

impl Default for Scales {
    fn default() -> Self {
        Self::at_temperature(TEMPERATURE)
    }
}
