use super::material::Material;
use super::scales::Scales;
use crate::discretization::generator::{assign_layers, linspace};
use crate::discretization::grid::{Grid, GridError};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DeviceError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("a layered device needs at least one layer")]
    NoLayers,
    #[error("{field} has {actual} entries but the grid has {expected} nodes")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("{field} = {value} at node {node} is not physical")]
    InvalidParameter {
        field: &'static str,
        node: usize,
        value: f64,
    },
}

/// How the electrostatic potential is pinned at a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactKind {
    /// Charge neutral: the potential follows from the local doping.
    Ohmic,
    /// Metal with the given workfunction (normalized), potential = -workfunction.
    Schottky(f64),
}

/// Contact description in physical units.
///
/// A negative workfunction means there is no metal at that side and the
/// contact is ohmic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contacts {
    pub phi_m0: f64,   // front (x = 0) workfunction [eV]
    pub phi_ml: f64,   // back (x = L) workfunction [eV]
    pub sn_left: f64,  // [cm / s]
    pub sn_right: f64, // [cm / s]
    pub sp_left: f64,  // [cm / s]
    pub sp_right: f64, // [cm / s]
}

impl Default for Contacts {
    fn default() -> Self {
        Self {
            phi_m0: -1.0,
            phi_ml: -1.0,
            sn_left: 1e7,
            sn_right: 1e7,
            sp_left: 1e7,
            sp_right: 1e7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layer {
    pub thickness: f64, // [cm]
    pub material: Material,
    pub doping: f64, // net donor density, negative for acceptors [cm^-3]
}

/// A discretized device, normalized with `scales`.
///
/// Every per-node array has one entry per grid node. Energies are in
/// thermal voltages, densities in units of the density scale, and so on.
/// The absorption prefactor `a` is kept in physical units since optics is
/// evaluated in cm and eV.
#[derive(Debug, Clone)]
pub struct Device {
    pub scales: Scales,
    pub grid: Grid,
    pub eps: Vec<f64>,
    pub chi: Vec<f64>,
    pub eg: Vec<f64>,
    pub nc: Vec<f64>,
    pub nv: Vec<f64>,
    pub ndop: Vec<f64>,
    pub mn: Vec<f64>,
    pub mp: Vec<f64>,
    pub et: Vec<f64>,
    pub tn: Vec<f64>,
    pub tp: Vec<f64>,
    pub br: Vec<f64>,
    pub cn: Vec<f64>,
    pub cp: Vec<f64>,
    pub a: Vec<f64>,
    pub front: ContactKind,
    pub back: ContactKind,
    pub sn_left: f64,
    pub sn_right: f64,
    pub sp_left: f64,
    pub sp_right: f64,
}

impl Device {
    /// Stack of layers over a uniform grid of `num_points` nodes, front
    /// layer first.
    pub fn from_layers(
        num_points: usize,
        layers: &[Layer],
        contacts: Contacts,
    ) -> Result<Self, DeviceError> {
        if layers.is_empty() {
            return Err(DeviceError::NoLayers);
        }
        let thicknesses: Vec<f64> = layers.iter().map(|l| l.thickness).collect();
        let length: f64 = thicknesses.iter().sum();
        let positions = linspace(0.0, length, num_points);
        let owner = assign_layers(&positions, &thicknesses);

        let materials = owner.iter().map(|&l| layers[l].material).collect();
        let doping = owner.iter().map(|&l| layers[l].doping).collect();

        DeviceBuilder::new(positions)
            .material_profile(materials)
            .doping_profile(doping)
            .contacts(contacts)
            .build()
    }

    pub fn len(&self) -> usize {
        self.grid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }

    /// Node positions in cm.
    pub fn positions_cm(&self) -> Vec<f64> {
        self.grid
            .positions()
            .iter()
            .map(|x| x * self.scales.length)
            .collect()
    }

    pub fn band_gap_ev(&self, node: usize) -> f64 {
        self.eg[node] * self.scales.potential
    }

    /// Squared intrinsic density (normalized) at `node`.
    pub fn ni_squared(&self, node: usize) -> f64 {
        self.nc[node] * self.nv[node] * (-self.eg[node]).exp()
    }
}

/// Assembles a [`Device`] from per-node physical profiles.
///
/// Regions are selected with predicates on the position in cm, later calls
/// override earlier ones.
#[derive(Debug, Clone)]
pub struct DeviceBuilder {
    positions: Vec<f64>,
    materials: Vec<Material>,
    doping: Vec<f64>,
    contacts: Contacts,
    scales: Scales,
}

impl DeviceBuilder {
    /// Node positions in cm.
    pub fn new(positions: Vec<f64>) -> Self {
        let n = positions.len();
        Self {
            positions,
            materials: vec![Material::default(); n],
            doping: vec![0.0; n],
            contacts: Contacts::default(),
            scales: Scales::default(),
        }
    }

    pub fn uniform(length: f64, num_points: usize) -> Self {
        Self::new(linspace(0.0, length, num_points))
    }

    pub fn material<F: Fn(f64) -> bool>(mut self, material: Material, region: F) -> Self {
        for (x, m) in self.positions.iter().zip(self.materials.iter_mut()) {
            if region(*x) {
                *m = material;
            }
        }
        self
    }

    pub fn doping<F: Fn(f64) -> bool>(mut self, density: f64, region: F) -> Self {
        for (x, d) in self.positions.iter().zip(self.doping.iter_mut()) {
            if region(*x) {
                *d = density;
            }
        }
        self
    }

    pub fn material_profile(mut self, materials: Vec<Material>) -> Self {
        self.materials = materials;
        self
    }

    pub fn doping_profile(mut self, doping: Vec<f64>) -> Self {
        self.doping = doping;
        self
    }

    pub fn contacts(mut self, contacts: Contacts) -> Self {
        self.contacts = contacts;
        self
    }

    pub fn scales(mut self, scales: Scales) -> Self {
        self.scales = scales;
        self
    }

    pub fn build(self) -> Result<Device, DeviceError> {
        let n = self.positions.len();
        let s = self.scales;
        let grid = Grid::new(self.positions)?.scaled(1.0 / s.length);

        check_len("materials", n, self.materials.len())?;
        check_len("doping", n, self.doping.len())?;
        validate(&self.materials, &self.doping)?;

        let per_node = |f: fn(&Material) -> f64, scale: f64| -> Vec<f64> {
            self.materials.iter().map(|m| f(m) * scale).collect()
        };
        let vt = s.potential;
        let c = self.contacts;

        Ok(Device {
            eps: per_node(|m| m.eps, 1.0),
            chi: per_node(|m| m.chi, 1.0 / vt),
            eg: per_node(|m| m.eg, 1.0 / vt),
            nc: per_node(|m| m.nc, 1.0 / s.density),
            nv: per_node(|m| m.nv, 1.0 / s.density),
            ndop: self.doping.iter().map(|d| d / s.density).collect(),
            mn: per_node(|m| m.mn, 1.0 / s.mobility),
            mp: per_node(|m| m.mp, 1.0 / s.mobility),
            et: per_node(|m| m.et, 1.0 / vt),
            tn: per_node(|m| m.tn, 1.0 / s.time),
            tp: per_node(|m| m.tp, 1.0 / s.time),
            br: per_node(|m| m.br, s.density * s.time),
            cn: per_node(|m| m.cn, s.density * s.density * s.time),
            cp: per_node(|m| m.cp, s.density * s.density * s.time),
            a: per_node(|m| m.a, 1.0),
            front: contact_kind(c.phi_m0, vt),
            back: contact_kind(c.phi_ml, vt),
            sn_left: c.sn_left / s.velocity,
            sn_right: c.sn_right / s.velocity,
            sp_left: c.sp_left / s.velocity,
            sp_right: c.sp_right / s.velocity,
            scales: s,
            grid,
        })
    }
}

fn contact_kind(workfunction: f64, vt: f64) -> ContactKind {
    if workfunction >= 0.0 {
        ContactKind::Schottky(workfunction / vt)
    } else {
        ContactKind::Ohmic
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), DeviceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(DeviceError::LengthMismatch {
            field,
            expected,
            actual,
        })
    }
}

fn validate(materials: &[Material], doping: &[f64]) -> Result<(), DeviceError> {
    let positive: [(&'static str, fn(&Material) -> f64); 6] = [
        ("eps", |m| m.eps),
        ("nc", |m| m.nc),
        ("nv", |m| m.nv),
        ("tn", |m| m.tn),
        ("tp", |m| m.tp),
        ("eg", |m| m.eg),
    ];
    let non_negative: [(&'static str, fn(&Material) -> f64); 6] = [
        ("mn", |m| m.mn),
        ("mp", |m| m.mp),
        ("br", |m| m.br),
        ("cn", |m| m.cn),
        ("cp", |m| m.cp),
        ("a", |m| m.a),
    ];

    for (node, m) in materials.iter().enumerate() {
        for (field, get) in positive {
            let value = get(m);
            if !(value.is_finite() && value > 0.0) {
                return Err(DeviceError::InvalidParameter { field, node, value });
            }
        }
        for (field, get) in non_negative {
            let value = get(m);
            if !(value.is_finite() && value >= 0.0) {
                return Err(DeviceError::InvalidParameter { field, node, value });
            }
        }
        for (field, value) in [("chi", m.chi), ("et", m.et), ("doping", doping[node])] {
            if !value.is_finite() {
                return Err(DeviceError::InvalidParameter { field, node, value });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn layers_are_normalized() {
        let mat = Material {
            eg: 1.5,
            nc: 8e17,
            ..Material::default()
        };
        let layers = [
            Layer {
                thickness: 1e-5,
                material: mat,
                doping: 1e17,
            },
            Layer {
                thickness: 2e-5,
                material: mat,
                doping: -1e15,
            },
        ];
        let device = Device::from_layers(31, &layers, Contacts::default()).unwrap();
        let s = device.scales;

        assert_eq!(device.len(), 31);
        assert_relative_eq!(device.grid.length() * s.length, 3e-5, max_relative = 1e-12);
        assert_relative_eq!(device.eg[0] * s.potential, 1.5, max_relative = 1e-12);
        assert_relative_eq!(device.nc[0] * s.density, 8e17, max_relative = 1e-12);
        assert_relative_eq!(device.ndop[0] * s.density, 1e17, max_relative = 1e-12);
        assert_relative_eq!(device.ndop[30] * s.density, -1e15, max_relative = 1e-12);
        assert_eq!(device.front, ContactKind::Ohmic);
    }

    #[test]
    fn workfunction_selects_contact_kind() {
        let contacts = Contacts {
            phi_m0: 4.0,
            ..Contacts::default()
        };
        let device = DeviceBuilder::uniform(1e-4, 10)
            .contacts(contacts)
            .build()
            .unwrap();
        match device.front {
            ContactKind::Schottky(w) => {
                assert_relative_eq!(w * device.scales.potential, 4.0, max_relative = 1e-12)
            }
            ContactKind::Ohmic => panic!("expected a metal contact"),
        }
        assert_eq!(device.back, ContactKind::Ohmic);
    }

    #[test]
    fn rejects_bad_profiles() {
        let err = DeviceBuilder::uniform(1e-4, 10)
            .doping_profile(vec![0.0; 3])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            DeviceError::LengthMismatch {
                field: "doping",
                expected: 10,
                actual: 3
            }
        );

        let bad = Material {
            tn: 0.0,
            ..Material::default()
        };
        let err = DeviceBuilder::uniform(1e-4, 10)
            .material(bad, |x| x > 5e-5)
            .build()
            .unwrap_err();
        assert!(matches!(err, DeviceError::InvalidParameter { field: "tn", .. }));

        assert!(matches!(
            DeviceBuilder::new(vec![0.0]).build(),
            Err(DeviceError::Grid(GridError::TooFewPoints(1)))
        ));
        assert_eq!(
            Device::from_layers(10, &[], Contacts::default()).unwrap_err(),
            DeviceError::NoLayers
        );
    }
}
