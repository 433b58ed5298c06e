//! Writes a synthetic fleet document for the dashboard to load.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use fw_runtime::{init_tracing, load_config};
use fw_scenarios::generate_fleet;

#[derive(Parser, Debug)]
#[command(about = "Generate a mock factory fleet as JSON")]
struct Args {
    #[arg(long)]
    factories: Option<usize>,
    #[arg(long)]
    plants: Option<usize>,
    #[arg(long)]
    departments: Option<usize>,
    #[arg(long)]
    zones: Option<usize>,
    #[arg(long)]
    machines: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    /// Latest `updatedAt`, epoch milliseconds.
    #[arg(long)]
    base_time: Option<u64>,
    /// Output file; stdout when omitted.
    #[arg(long, short)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut cfg = load_config().seed;
    if let Some(v) = args.factories {
        cfg.factories = v;
    }
    if let Some(v) = args.plants {
        cfg.plants_per_factory = v;
    }
    if let Some(v) = args.departments {
        cfg.departments_per_plant = v;
    }
    if let Some(v) = args.zones {
        cfg.zones_per_department = v;
    }
    if let Some(v) = args.machines {
        cfg.machines_per_zone = v;
    }
    if let Some(v) = args.seed {
        cfg.seed = v;
    }
    if let Some(v) = args.base_time {
        cfg.base_time = v;
    }

    let fleet = generate_fleet(&cfg);
    let json = fleet.to_json_pretty()?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), machines = fleet.machine_count(), "fleet written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
