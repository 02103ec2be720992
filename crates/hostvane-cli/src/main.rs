//! hostvane — placement-layer debug CLI.
//!
//! Loads a pool snapshot (the ranked hosts plus the request descriptor,
//! as the predicate engine would hand them over), runs the scheduler, and
//! prints the decision as JSON. Useful for replaying production pools and
//! for inspecting forecast attribution offline.
//!
//! # Usage
//!
//! ```text
//! hostvane schedule --snapshot pool.json [--drivers drivers.toml] [--show-pending]
//! hostvane forecast --snapshot pool.json [--rejections log.json]
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Deserialize;

use hostvane_scheduler::{RejectionLog, Scheduler};
use hostvane_state::{DriverCapabilities, PendingUsageStore, ScheduleRequest, ScoredHost};

#[derive(Parser)]
#[command(name = "hostvane", about = "hostvane — placement decision debugger", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a committed scheduling decision for a pool snapshot.
    Schedule {
        /// Pool snapshot JSON: {"hosts": [...], "request": {...}}.
        #[arg(short, long)]
        snapshot: PathBuf,
        /// TOML table of backend driver capabilities.
        #[arg(long)]
        drivers: Option<PathBuf>,
        /// Also print the pending-usage table after the call.
        #[arg(long)]
        show_pending: bool,
    },
    /// Explain whether the request could be satisfied, without committing.
    Forecast {
        /// Pool snapshot JSON: {"hosts": [...], "request": {...}}.
        #[arg(short, long)]
        snapshot: PathBuf,
        /// Rejection log JSON from the predicate engine.
        #[arg(long)]
        rejections: Option<PathBuf>,
    },
}

/// On-disk pool snapshot format.
#[derive(Deserialize)]
struct Snapshot {
    hosts: Vec<ScoredHost>,
    request: ScheduleRequest,
}

/// On-disk driver capability config: `[drivers.<backend>]` tables.
#[derive(Deserialize, Default)]
struct DriverConfig {
    #[serde(default)]
    drivers: HashMap<String, DriverCapabilities>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hostvane=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Schedule {
            snapshot,
            drivers,
            show_pending,
        } => schedule(&snapshot, drivers.as_deref(), show_pending).await,
        Commands::Forecast {
            snapshot,
            rejections,
        } => forecast(&snapshot, rejections.as_deref()).await,
    }
}

async fn schedule(
    snapshot_path: &Path,
    drivers: Option<&Path>,
    show_pending: bool,
) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let scheduler = Scheduler::new(PendingUsageStore::new());

    if let Some(path) = drivers {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read driver config {}", path.display()))?;
        let config: DriverConfig =
            toml::from_str(&raw).with_context(|| format!("parse driver config {}", path.display()))?;
        for (backend, caps) in config.drivers {
            scheduler.register_driver(&backend, caps).await;
        }
    }

    let output = scheduler.schedule(snapshot.hosts, snapshot.request).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if show_pending {
        println!(
            "{}",
            serde_json::to_string_pretty(&scheduler.pending().snapshot())?
        );
    }
    Ok(())
}

async fn forecast(snapshot_path: &Path, rejections: Option<&Path>) -> anyhow::Result<()> {
    let snapshot = load_snapshot(snapshot_path)?;
    let log: RejectionLog = match rejections {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("read rejection log {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parse rejection log {}", path.display()))?
        }
        None => RejectionLog::new(),
    };

    let scheduler = Scheduler::new(PendingUsageStore::new());
    let report = scheduler
        .forecast(&snapshot.hosts, &snapshot.request, &log)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("read snapshot {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse snapshot {}", path.display()))
}
