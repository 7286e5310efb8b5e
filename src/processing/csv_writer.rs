use crate::models::device::Device;
use crate::models::potentials::Potentials;
use crate::numerics::continuation::{BiasPoint, IvCurve};
use crate::numerics::solver::IterationRecord;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Write data to CSV file with headers
pub fn write_csv<P: AsRef<Path>>(path: P, headers: &[&str], data: &[Vec<f64>]) -> io::Result<()> {
    if !headers.is_empty() && !data.is_empty() && headers.len() != data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "Headers count ({}) doesn't match data columns ({})",
                headers.len(),
                data.len()
            ),
        ));
    }

    let mut file = File::create(path)?;

    writeln!(file, "{}", headers.join(","))?;

    let n_rows = data.iter().map(|col| col.len()).max().unwrap_or(0);

    for i in 0..n_rows {
        let row: Vec<String> = data
            .iter()
            .map(|col| col.get(i).map(|v| format!("{v:.15e}")).unwrap_or_default())
            .collect();
        writeln!(file, "{}", row.join(","))?;
    }

    Ok(())
}

/// Write x-y data pairs
pub fn write_xy<P: AsRef<Path>>(
    path: P,
    x_header: &str,
    y_header: &str,
    x_data: &[f64],
    y_data: &[f64],
) -> io::Result<()> {
    if x_data.len() != y_data.len() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "X and Y data lengths don't match ({} vs {})",
                x_data.len(),
                y_data.len()
            ),
        ));
    }
    write_csv(
        path,
        &[x_header, y_header],
        &[x_data.to_vec(), y_data.to_vec()],
    )
}

pub fn write_iv_curve<P: AsRef<Path>>(path: P, curve: &IvCurve) -> io::Result<()> {
    write_xy(path, "voltage_V", "current_A_cm2", curve.voltages(), curve.currents())
}

/// One row per Newton iteration.
pub fn write_history<P: AsRef<Path>>(path: P, history: &[IterationRecord]) -> io::Result<()> {
    let iteration = history.iter().map(|r| r.iteration as f64).collect();
    let residual = history.iter().map(|r| r.residual_norm).collect();
    let step = history.iter().map(|r| r.step_norm).collect();
    write_csv(
        path,
        &["iteration", "residual_norm", "step_norm"],
        &[iteration, residual, step],
    )
}

/// Newton iterations of every bias point, tagged with the applied voltage.
pub fn write_sweep_history<P: AsRef<Path>>(path: P, points: &[BiasPoint]) -> io::Result<()> {
    let records = || points.iter().flat_map(|p| p.history.iter().map(move |r| (p.voltage, r)));
    write_csv(
        path,
        &["voltage_V", "iteration", "residual_norm", "step_norm"],
        &[
            records().map(|(v, _)| v).collect(),
            records().map(|(_, r)| r.iteration as f64).collect(),
            records().map(|(_, r)| r.residual_norm).collect(),
            records().map(|(_, r)| r.step_norm).collect(),
        ],
    )
}

/// Position, potentials in volts and carrier densities at every node.
pub fn write_profiles<P: AsRef<Path>>(
    path: P,
    device: &Device,
    potentials: &Potentials,
) -> io::Result<()> {
    let volts = potentials.to_volts(device);
    write_csv(
        path,
        &["x_cm", "phi_V", "phi_n_V", "phi_p_V", "n_cm3", "p_cm3"],
        &[
            device.positions_cm(),
            volts.phi.as_slice().to_vec(),
            volts.phi_n.as_slice().to_vec(),
            volts.phi_p.as_slice().to_vec(),
            potentials.electron_density(device),
            potentials.hole_density(device),
        ],
    )
}
