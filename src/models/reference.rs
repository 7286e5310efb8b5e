//! The benchmark cell used throughout the tests and by the command line
//! tool: a thin n+ emitter on a lightly doped p absorber under one sun.

use super::device::{Contacts, Device, DeviceError, Layer};
use super::light::LightSource;
use super::material::Material;

pub const THICKNESS: f64 = 3e-4; // [cm]
pub const EMITTER_THICKNESS: f64 = 5e-6; // [cm]
pub const EMITTER_DOPING: f64 = 1e17; // [cm^-3]
pub const ABSORBER_DOPING: f64 = -1e15; // [cm^-3]
pub const NUM_POINTS: usize = 500;

pub fn material() -> Material {
    Material {
        chi: 3.9,
        eg: 1.5,
        eps: 9.4,
        nc: 8e17,
        nv: 1.8e19,
        mn: 100.0,
        mp: 100.0,
        et: 0.0,
        tn: 1e-8,
        tp: 1e-8,
        a: 1e4,
        ..Material::default()
    }
}

pub fn layers() -> [Layer; 2] {
    let material = material();
    [
        Layer {
            thickness: EMITTER_THICKNESS,
            material,
            doping: EMITTER_DOPING,
        },
        Layer {
            thickness: THICKNESS - EMITTER_THICKNESS,
            material,
            doping: ABSORBER_DOPING,
        },
    ]
}

/// Ohmic contacts that only let electrons out at the front and holes at
/// the back.
pub fn contacts() -> Contacts {
    Contacts {
        phi_m0: -1.0,
        phi_ml: -1.0,
        sn_left: 1e7,
        sn_right: 0.0,
        sp_left: 0.0,
        sp_right: 1e7,
    }
}

pub fn device(num_points: usize) -> Result<Device, DeviceError> {
    Device::from_layers(num_points, &layers(), contacts())
}

pub fn light() -> LightSource {
    LightSource::sun()
}

/// Voltages [V] and currents [A / cm^2] of the benchmark cell at 500 grid
/// points, as produced by the established solver this crate is checked
/// against.
pub const IV_VOLTAGES: [f64; 20] = [
    0.0, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7, 0.75, 0.8,
    0.85, 0.9, 0.95,
];

pub const IV_CURRENTS: [f64; 20] = [
    0.01882799450659129,
    0.018753370994746384,
    0.018675073222852775,
    0.018592788678882418,
    0.01850616015841796,
    0.018414776404918568,
    0.018318159501526814,
    0.01821574845029824,
    0.018106874755825324,
    0.0179907188741479,
    0.017866203205496447,
    0.017731661626627034,
    0.017583825887487907,
    0.01741498506998538,
    0.017204823904941775,
    0.01689387681804267,
    0.01628556057166174,
    0.014630769395991339,
    0.008610345709349041,
    -0.018267911703588706,
];
