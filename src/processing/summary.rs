use crate::models::device::Device;
use crate::models::scales::Scales;
use crate::numerics::continuation::SweepTermination;
use crate::processing::metrics::Metrics;
use crate::simulator::Simulation;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub struct SimulationSummary {
    // Grid info
    pub num_nodes: usize,
    pub thickness: f64,   // [cm]
    pub min_spacing: f64, // [cm]
    pub max_spacing: f64, // [cm]

    pub scales: Scales,

    // Physics info
    pub builtin_voltage: f64,
    pub incident_power: f64,

    // Solver info
    pub equilibrium_iterations: u32,
    pub equilibrium_residual: f64,
    pub bias_points: usize,
    pub bias_iterations: u32,
    pub termination: String,

    pub metrics: Option<Metrics>,
    pub efficiency: Option<f64>,
}

impl SimulationSummary {
    pub fn from_simulation(device: &Device, simulation: &Simulation, incident_power: f64) -> Self {
        let length = device.scales.length;
        let eq = &simulation.equilibrium;
        let sweep = &simulation.sweep;

        let termination = match &sweep.termination {
            SweepTermination::Completed => "completed".to_string(),
            SweepTermination::CurrentReversed { voltage } => {
                format!("stopped past open circuit at {voltage:.3} V")
            }
            SweepTermination::Diverged { voltage, error } => {
                format!("diverged at {voltage:.3} V: {error}")
            }
        };

        Self {
            num_nodes: device.len(),
            thickness: device.grid.length() * length,
            min_spacing: device.grid.min_spacing() * length,
            max_spacing: device.grid.max_spacing() * length,
            scales: device.scales,
            builtin_voltage: eq.built_in_voltage(device),
            incident_power,
            equilibrium_iterations: eq.iterations,
            equilibrium_residual: eq.history.last().map_or(f64::NAN, |r| r.residual_norm),
            bias_points: sweep.points.len(),
            bias_iterations: sweep.points.iter().map(|p| p.iterations).sum(),
            termination,
            metrics: simulation.metrics.as_ref().ok().copied(),
            efficiency: simulation.efficiency,
        }
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut file = File::create(path)?;
        self.write(&mut file)
    }

    pub fn write<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out, "PHOTOVOLTAIC DEVICE SIMULATION SUMMARY")?;
        writeln!(out, "{}", "=".repeat(60))?;
        writeln!(out)?;

        writeln!(out, "GRID")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Number of nodes:     {}", self.num_nodes)?;
        writeln!(out, "Thickness:           {:.6e} cm", self.thickness)?;
        writeln!(out, "Min spacing:         {:.6e} cm", self.min_spacing)?;
        writeln!(out, "Max spacing:         {:.6e} cm", self.max_spacing)?;
        writeln!(out)?;

        let s = &self.scales;
        writeln!(out, "NORMALIZATION SCALES")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Temperature:         {:.1} K", s.temperature)?;
        writeln!(out, "Voltage scale (V_T): {:.6e} V", s.potential)?;
        writeln!(out, "Length scale (L_D):  {:.6e} cm", s.length)?;
        writeln!(out, "Density scale:       {:.6e} cm⁻³", s.density)?;
        writeln!(out, "Time scale:          {:.6e} s", s.time)?;
        writeln!(out, "Current scale:       {:.6e} A/cm²", s.current)?;
        writeln!(out)?;

        writeln!(out, "SOLVER")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Equilibrium:")?;
        writeln!(out, "  Iterations:        {}", self.equilibrium_iterations)?;
        writeln!(out, "  Final residual:    {:.6e}", self.equilibrium_residual)?;
        writeln!(out, "Bias sweep:")?;
        writeln!(out, "  Converged points:  {}", self.bias_points)?;
        writeln!(out, "  Total iterations:  {}", self.bias_iterations)?;
        writeln!(out, "  Termination:       {}", self.termination)?;
        writeln!(out)?;

        writeln!(out, "PHYSICS RESULTS")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "Built-in voltage:    {:.4} V", self.builtin_voltage)?;
        writeln!(out, "Incident power:      {:.4e} W/cm²", self.incident_power)?;
        match &self.metrics {
            Some(m) => {
                writeln!(out, "Voc:                 {:.4} V", m.voc)?;
                writeln!(out, "Jsc:                 {:.4} mA/cm²", m.jsc * 1e3)?;
                writeln!(
                    out,
                    "MPP:                 {:.4} V, {:.4} mA/cm²",
                    m.mpp_voltage,
                    m.mpp_current * 1e3
                )?;
                writeln!(out, "Max power:           {:.4} mW/cm²", m.max_power * 1e3)?;
                writeln!(out, "Fill factor:         {:.2} %", m.fill_factor)?;
            }
            None => writeln!(out, "Metrics:             not enough bias points")?,
        }
        if let Some(efficiency) = self.efficiency {
            writeln!(out, "Efficiency:          {:.2} %", efficiency * 100.0)?;
        }
        writeln!(out)?;

        writeln!(out, "{}", "=".repeat(60))?;

        Ok(())
    }

    pub fn print_to_console(&self) {
        println!("\n{}", "=".repeat(60));
        println!("SIMULATION SUMMARY");
        println!("{}", "=".repeat(60));
        println!(
            "Grid:          {} nodes over {:.3e} cm",
            self.num_nodes, self.thickness
        );
        println!("Built-in V:    {:.4} V", self.builtin_voltage);
        println!(
            "Iterations:    equilibrium={}, sweep={} over {} points",
            self.equilibrium_iterations, self.bias_iterations, self.bias_points
        );
        println!("Sweep:         {}", self.termination);
        if let Some(m) = &self.metrics {
            println!(
                "Voc = {:.4} V, Jsc = {:.4} mA/cm², FF = {:.2} %",
                m.voc,
                m.jsc * 1e3,
                m.fill_factor
            );
        }
        if let Some(efficiency) = self.efficiency {
            println!("Efficiency:    {:.2} %", efficiency * 100.0);
        }
        println!("{}\n", "=".repeat(60));
    }
}
