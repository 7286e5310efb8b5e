//! Pointwise carrier physics on a normalized [`Device`].
//!
//! Every kernel is generic over the number type so the assembler can push
//! dual numbers through it. Potentials follow the convention of
//! [`crate::models::potentials::Potentials`].

use crate::models::device::{ContactKind, Device};
use crate::physics::bc::Side;
use num_dual::DualNum;

/// Below this magnitude the Bernoulli function is evaluated by its series.
const BERNOULLI_SERIES_CUTOFF: f64 = 1e-2;

/// Electron density `Nc exp(chi + phi + phi_n)` at `node`.
pub fn electron_density<T: DualNum<f64>>(device: &Device, node: usize, phi: T, phi_n: T) -> T {
    (phi + phi_n + device.chi[node]).exp() * device.nc[node]
}

/// Hole density `Nv exp(-chi - Eg - phi - phi_p)` at `node`.
pub fn hole_density<T: DualNum<f64>>(device: &Device, node: usize, phi: T, phi_p: T) -> T {
    (-(phi + phi_p) - device.chi[node] - device.eg[node]).exp() * device.nv[node]
}

/// Bernoulli function `B(x) = x / (exp(x) - 1)`, with `B(0) = 1`.
pub fn bernoulli<T: DualNum<f64>>(x: T) -> T {
    let re = x.re();
    if re.abs() < BERNOULLI_SERIES_CUTOFF {
        let x2 = x.clone() * x.clone();
        -(x * 0.5) + x2.clone() * (1.0 / 12.0) - x2.clone() * x2 * (1.0 / 720.0) + 1.0
    } else if re > 0.0 {
        let decay = (-x.clone()).exp();
        x * decay.clone() / (-decay + 1.0)
    } else {
        x.clone() / (x.exp() - 1.0)
    }
}

/// Scharfetter-Gummel electron current through `edge`.
///
/// `n` is exponential in `psi_n = chi + ln Nc + phi` plus the quasi-Fermi
/// level, so the current is exact for a potential linear along the edge.
pub fn electron_current<T: DualNum<f64>>(
    device: &Device,
    edge: usize,
    phi: [T; 2],
    phi_n: [T; 2],
) -> T {
    let (l, r) = (edge, edge + 1);
    let h = device.grid.dgrid()[edge];
    let mobility = 0.5 * (device.mn[l] + device.mn[r]);

    let psi_l = device.chi[l] + device.nc[l].ln();
    let psi_r = device.chi[r] + device.nc[r].ln();
    let delta = phi[1].clone() - phi[0].clone() + (psi_r - psi_l);

    let [phi_l, phi_r] = phi;
    let [phin_l, phin_r] = phi_n;
    let n_l = electron_density(device, l, phi_l, phin_l);
    let n_r = electron_density(device, r, phi_r, phin_r);

    (bernoulli(delta.clone()) * n_r - bernoulli(-delta) * n_l) * (mobility / h)
}

/// Scharfetter-Gummel hole current through `edge`, with
/// `psi_p = -chi - Eg + ln Nv - phi`.
pub fn hole_current<T: DualNum<f64>>(
    device: &Device,
    edge: usize,
    phi: [T; 2],
    phi_p: [T; 2],
) -> T {
    let (l, r) = (edge, edge + 1);
    let h = device.grid.dgrid()[edge];
    let mobility = 0.5 * (device.mp[l] + device.mp[r]);

    let psi_l = -device.chi[l] - device.eg[l] + device.nv[l].ln();
    let psi_r = -device.chi[r] - device.eg[r] + device.nv[r].ln();
    let delta = phi[0].clone() - phi[1].clone() + (psi_r - psi_l);

    let [phi_l, phi_r] = phi;
    let [phip_l, phip_r] = phi_p;
    let p_l = hole_density(device, l, phi_l, phip_l);
    let p_r = hole_density(device, r, phi_r, phip_r);

    -(bernoulli(delta.clone()) * p_r - bernoulli(-delta) * p_l) * (mobility / h)
}

/// Shockley-Read-Hall recombination through a single trap level.
pub fn srh_recombination<T: DualNum<f64>>(device: &Device, node: usize, n: T, p: T) -> T {
    let ni2 = device.ni_squared(node);
    let ni = ni2.sqrt();
    let n1 = ni * device.et[node].exp();
    let p1 = ni * (-device.et[node]).exp();
    let excess = n.clone() * p.clone() - ni2;
    excess / ((n + n1) * device.tp[node] + (p + p1) * device.tn[node])
}

pub fn radiative_recombination<T: DualNum<f64>>(device: &Device, node: usize, n: T, p: T) -> T {
    (n * p - device.ni_squared(node)) * device.br[node]
}

pub fn auger_recombination<T: DualNum<f64>>(device: &Device, node: usize, n: T, p: T) -> T {
    let excess = n.clone() * p.clone() - device.ni_squared(node);
    excess * (n * device.cn[node] + p * device.cp[node])
}

/// Net recombination rate at `node`.
pub fn recombination<T: DualNum<f64>>(device: &Device, node: usize, n: T, p: T) -> T {
    srh_recombination(device, node, n.clone(), p.clone())
        + radiative_recombination(device, node, n.clone(), p.clone())
        + auger_recombination(device, node, n, p)
}

/// Space charge `p - n + N_dop`.
pub fn charge<T: DualNum<f64>>(device: &Device, node: usize, n: T, p: T) -> T {
    p - n + device.ndop[node]
}

/// Potential of a charge-neutral region at equilibrium.
///
/// With `y = exp(chi + phi)` neutrality reads `Nc y - Nv exp(-Eg) / y = N`;
/// the positive root is taken in the form that does not cancel for the
/// sign of `N`.
pub fn neutral_potential(device: &Device, node: usize) -> f64 {
    let a = device.nc[node];
    let b = device.nv[node] * (-device.eg[node]).exp();
    let doping = device.ndop[node];
    let root = (doping * doping + 4.0 * a * b).sqrt();
    let y = if doping >= 0.0 {
        (doping + root) / (2.0 * a)
    } else {
        2.0 * b / (root - doping)
    };
    y.ln() - device.chi[node]
}

/// Equilibrium potential imposed by the contact at `side`.
pub fn contact_potential(device: &Device, side: Side) -> f64 {
    let (kind, node) = match side {
        Side::Front => (device.front, 0),
        Side::Back => (device.back, device.len() - 1),
    };
    match kind {
        ContactKind::Ohmic => neutral_potential(device, node),
        ContactKind::Schottky(workfunction) => -workfunction,
    }
}
