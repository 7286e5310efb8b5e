use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, warn};
use pvdd_rs::models::reference;
use pvdd_rs::numerics::banded::LinearSolver;
use pvdd_rs::numerics::continuation::{DEFAULT_MAX_VOLTAGE, DEFAULT_VOLTAGE_STEP, bias_voltages};
use pvdd_rs::numerics::solver::NewtonSolver;
use pvdd_rs::processing::csv_writer;
use pvdd_rs::processing::summary::SimulationSummary;
use pvdd_rs::simulator::{SimulationConfig, simulate};
use std::fs;
use std::path::PathBuf;

/// Drift-diffusion simulation of the reference n+/p solar cell under one sun
#[derive(Parser)]
#[command(name = "pvdd", version)]
struct Cli {
    /// Number of grid points
    #[arg(short = 'n', long, default_value_t = reference::NUM_POINTS)]
    points: usize,

    /// Bias step [V]
    #[arg(long, default_value_t = DEFAULT_VOLTAGE_STEP)]
    v_step: f64,

    /// Last bias point [V]
    #[arg(long, default_value_t = DEFAULT_MAX_VOLTAGE)]
    v_max: f64,

    /// Newton step tolerance
    #[arg(long, default_value_t = 1e-6)]
    tolerance: f64,

    #[arg(long, default_value_t = 300)]
    max_iterations: u32,

    /// Factor the full Jacobian densely instead of with sparse LU
    #[arg(long)]
    dense: bool,

    /// End the sweep once the current changes sign
    #[arg(long)]
    stop_at_voc: bool,

    /// Output directory
    #[arg(short, long, default_value = "output/main")]
    output: PathBuf,

    /// -v for debug, -vv for trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;

    let device = reference::device(cli.points).context("Invalid device")?;
    let light = reference::light();
    device.scales.log();

    let linear_solver = if cli.dense {
        LinearSolver::Dense
    } else {
        LinearSolver::SparseLu
    };
    let config = SimulationConfig {
        solver: NewtonSolver::default()
            .with_tolerance(cli.tolerance)
            .with_max_iterations(cli.max_iterations)
            .with_linear_solver(linear_solver),
        voltages: bias_voltages(0.0, cli.v_max, cli.v_step),
        stop_on_current_reversal: cli.stop_at_voc,
    };

    let simulation = simulate(&device, &light, &config)?;
    let out = |name: &str| cli.output.join(name);

    csv_writer::write_profiles(out("equilibrium.csv"), &device, &simulation.equilibrium.potentials)
        .context("Failed to write equilibrium profiles")?;
    csv_writer::write_history(out("equilibrium_history.csv"), &simulation.equilibrium.history)
        .context("Failed to write equilibrium history")?;
    csv_writer::write_sweep_history(out("sweep_history.csv"), &simulation.sweep.points)
        .context("Failed to write sweep history")?;

    csv_writer::write_iv_curve(out("iv.csv"), &simulation.sweep.curve())
        .context("Failed to write I-V curve")?;
    println!("I-V curve saved to {}", out("iv.csv").display());

    if let Some(potentials) = simulation.final_potentials() {
        csv_writer::write_profiles(out("final.csv"), &device, &potentials)
            .context("Failed to write final profiles")?;
    }

    if let Some(voltage) = simulation.sweep.failed_voltage() {
        warn!("sweep stopped at {voltage:.3} V, metrics use the converged prefix");
    }
    if let Err(e) = &simulation.metrics {
        warn!("no figures of merit: {e}");
    }

    let summary = SimulationSummary::from_simulation(&device, &simulation, light.incident_power());
    summary
        .write_to_file(out("simulation_summary.txt"))
        .context("Failed to write summary")?;
    summary.print_to_console();

    println!("Summary saved to {}", out("simulation_summary.txt").display());
    Ok(())
}
