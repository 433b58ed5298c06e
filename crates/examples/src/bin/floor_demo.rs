use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use fw_core::Fleet;
use fw_runtime::{init_tracing, load_config, Dashboard};
use fw_scenarios::{generate_fleet, FleetStore, LiveFleet};
use fw_views::{summarize_department, summarize_plant};

#[derive(Parser, Debug)]
#[command(about = "Run the live factory floor simulation and alert banner")]
struct Args {
    /// Fleet JSON produced by `seed_fleet`; generated from config when omitted.
    #[arg(long)]
    fleet: Option<PathBuf>,
    /// How long to run, seconds.
    #[arg(long, default_value_t = 30)]
    seconds: u64,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    seed: Option<u64>,
    /// Log department summaries every this many simulator ticks.
    #[arg(long, default_value_t = 5)]
    report_every: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut cfg = load_config();
    if let Some(tick_ms) = args.tick_ms {
        cfg.simulator.tick_ms = tick_ms;
    }
    if args.seed.is_some() {
        cfg.simulator.seed = args.seed;
    }

    let fleet = match &args.fleet {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Fleet::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => generate_fleet(&cfg.seed),
    };
    info!(machines = fleet.machine_count(), factories = fleet.factories.len(), "fleet loaded");

    let live = LiveFleet::new(FleetStore::new(fleet, cfg.simulator.clone()));
    let mut dashboard = Dashboard::simulated(cfg, live.clone());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;

    let started = Instant::now();
    runtime.block_on(async {
        let (stop_tx, stop_rx) = watch::channel(false);
        let mut revisions = live.subscribe();
        let mut report_stop = stop_rx.clone();
        let report_every = args.report_every.max(1);

        let reporter = async {
            loop {
                tokio::select! {
                    _ = report_stop.changed() => break,
                    changed = revisions.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let epoch = revisions.borrow_and_update().epoch;
                        if epoch % report_every == 0 {
                            log_summaries(&live.snapshot(), epoch);
                        }
                    }
                }
            }
        };

        let stopper = async move {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(args.seconds)) => {}
                res = tokio::signal::ctrl_c() => {
                    if let Err(err) = res {
                        warn!(error = %err, "ctrl-c handler failed");
                    }
                }
            }
            let _ = stop_tx.send(true);
        };

        let (res, _, _) = tokio::join!(dashboard.run(stop_rx), reporter, stopper);
        res
    })?;

    let fleet = live.snapshot();
    for (factory, plant, dept) in fleet.departments() {
        let summary = summarize_department(dept);
        println!(
            "{:<12} {:<10} {:<12} {:>6.1}% {:<16} total={:<3} running={:<3} critical={:<3}",
            factory.name,
            plant.name,
            dept.name,
            summary.oee.oee_pct,
            summary.severity.as_str(),
            summary.counts.total,
            summary.counts.running,
            summary.counts.critical,
        );
    }
    for alert in dashboard.board().visible() {
        println!("ALERT {}", alert.message);
    }
    println!("{}", dashboard.metrics().snapshot().to_json_line("floor_demo", Some(started.elapsed())));
    Ok(())
}

fn log_summaries(fleet: &Fleet, epoch: u64) {
    for factory in &fleet.factories {
        for plant in &factory.plants {
            let rollup = summarize_plant(plant);
            info!(
                epoch,
                plant = %plant.name,
                oee_pct = %format!("{:.1}", rollup.oee.oee_pct),
                severity = %rollup.severity,
                critical = rollup.counts.critical,
                "plant summary"
            );
            for dept in &plant.departments {
                let summary = summarize_department(dept);
                info!(
                    epoch,
                    department = %dept.name,
                    oee_pct = %format!("{:.1}", summary.oee.oee_pct),
                    severity = %summary.severity,
                    down = summary.counts.down,
                    critical = summary.counts.critical,
                    "department summary"
                );
            }
        }
    }
}
