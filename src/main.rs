//! yee-grid: CLI tool for generating FDTD grids from a JSON job

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use yee_grid::{load_job, render_grid_report, GridJob, GridSpec1d};

#[derive(Parser, Debug)]
#[command(name = "yee-grid")]
#[command(about = "Generate non-uniform FDTD grid boundaries from structures, symmetry and PML settings")]
#[command(version)]
struct Args {
    /// Input JSON file (grid specification and simulation request)
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON file with the boundaries along x, y and z
    #[arg(short, long, required_unless_present = "stdout")]
    output: Option<PathBuf>,

    /// Free-space wavelength in µm, overriding the job and its sources
    #[arg(long)]
    wavelength: Option<f64>,

    /// Minimal steps per wavelength on automatic axes
    #[arg(long)]
    min_steps_per_wvl: Option<f64>,

    /// Largest ratio between consecutive steps on automatic axes
    #[arg(long)]
    max_scale: Option<f64>,

    /// Print the grid JSON to stdout instead of a file
    #[arg(long)]
    stdout: bool,

    /// Print a per-axis summary to stderr
    #[arg(long)]
    report: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn apply_overrides(job: &mut GridJob, args: &Args) {
    if args.wavelength.is_some() {
        job.spec.wavelength = args.wavelength;
    }
    for grid_1d in [&mut job.spec.grid_x, &mut job.spec.grid_y, &mut job.spec.grid_z] {
        if let GridSpec1d::Auto(auto) = grid_1d {
            if let Some(min_steps) = args.min_steps_per_wvl {
                auto.min_steps_per_wvl = min_steps;
            }
            if let Some(max_scale) = args.max_scale {
                auto.max_scale = max_scale;
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Read input
    let mut job = load_job(&args.input)
        .with_context(|| format!("Failed to read grid job: {:?}", args.input))?;
    apply_overrides(&mut job, &args);

    // Generate
    let output = job.run().context("Grid generation failed")?;
    let json = serde_json::to_string_pretty(&output.grid).context("Failed to serialize grid")?;

    if args.report {
        let report = render_grid_report(&output.grid, &output.diagnostics)
            .context("Failed to render report")?;
        eprintln!("{}", report);
    }

    // Output
    if args.stdout {
        println!("{}", json);
    } else if let Some(path) = &args.output {
        fs::write(path, &json)
            .with_context(|| format!("Failed to write output file: {:?}", path))?;
        let [nx, ny, nz] = output.grid.num_cells();
        eprintln!("Generated {}x{}x{} grid: {:?}", nx, ny, nz, path);
    }

    Ok(())
}
