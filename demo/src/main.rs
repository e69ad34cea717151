//! LifeSync SOS engine demo CLI
//!
//! Runs the end-to-end scenarios against simulated devices, or reads the
//! shared facility inbox from a data directory.
//!
//! Usage:
//!   cargo run -p lifesync -- run-all
//!   cargo run -p lifesync -- fallback-dispatch
//!   cargo run -p lifesync -- --data-dir ./data repeated-dispatch
//!   cargo run -p lifesync -- --data-dir ./data inbox --watch

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lifesync_config::EngineConfig;
use lifesync_contracts::error::LifeSyncResult;
use lifesync_core::traits::{AlertLog, KeyValueStore};
use lifesync_sim::scenarios::{fallback_dispatch, live_search, repeated_dispatch};
use lifesync_store::{spawn_inbox_poller, AlertInbox, FileStore, InboxView, MemoryStore};

// ── CLI definition ────────────────────────────────────────────────────────────

/// LifeSync: one-tap SOS with facility discovery and alert fan-out.
#[derive(Parser)]
#[command(
    name = "lifesync",
    about = "LifeSync SOS engine demo",
    long_about = "Runs LifeSync SOS scenarios against simulated location, place search\n\
                  and telephony, or reads the facility alert inbox."
)]
struct Cli {
    /// Persist records and the inbox as JSON files in this directory.
    /// Scenarios run in memory without it; `inbox` falls back to the
    /// configured `storage.data_dir`.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// TOML file overriding engine defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three scenarios in sequence.
    RunAll,
    /// Scenario 1: no contacts, discovery down, fallback dispatch.
    FallbackDispatch,
    /// Scenario 2: repeated dispatch with confirm and decline.
    RepeatedDispatch,
    /// Scenario 3: live ranking and the facility inbox.
    LiveSearch,
    /// Print the facility alert inbox.
    Inbox {
        /// Keep polling and print each change until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("lifesync error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> LifeSyncResult<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    if let Command::Inbox { watch } = cli.command {
        let dir = cli.data_dir.clone().unwrap_or_else(|| config.storage.data_dir.clone());
        let kv = open_file_store(&dir)?;
        let inbox = Arc::new(AlertInbox::new(kv, config.inbox.capacity));
        return if watch {
            watch_inbox(inbox, &config).await
        } else {
            print_inbox(&inbox.list()?);
            Ok(())
        };
    }

    let kv: Arc<dyn KeyValueStore> = match &cli.data_dir {
        Some(dir) => open_file_store(dir)?,
        None => Arc::new(MemoryStore::new()),
    };

    print_banner();
    match cli.command {
        Command::RunAll => {
            fallback_dispatch::run_scenario(&config, kv.clone()).await?;
            repeated_dispatch::run_scenario(&config, kv.clone()).await?;
            live_search::run_scenario(&config, kv).await?;
        }
        Command::FallbackDispatch => {
            fallback_dispatch::run_scenario(&config, kv).await?;
        }
        Command::RepeatedDispatch => {
            repeated_dispatch::run_scenario(&config, kv).await?;
        }
        Command::LiveSearch => {
            live_search::run_scenario(&config, kv).await?;
        }
        Command::Inbox { .. } => {}
    }
    println!("All selected scenarios completed successfully.");
    Ok(())
}

fn open_file_store(dir: &Path) -> LifeSyncResult<Arc<dyn KeyValueStore>> {
    info!(dir = %dir.display(), "using file store");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(dir)?);
    Ok(store)
}

// ── Inbox ─────────────────────────────────────────────────────────────────────

async fn watch_inbox(inbox: Arc<AlertInbox>, config: &EngineConfig) -> LifeSyncResult<()> {
    let cancel = CancellationToken::new();
    let (poller, mut view) = spawn_inbox_poller(inbox, config.inbox.poll_interval(), cancel.clone());
    println!(
        "Watching inbox every {:?} (Ctrl-C to stop)",
        config.inbox.poll_interval()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let current: InboxView = view.borrow_and_update().clone();
                print_inbox(&current.alerts);
            }
        }
    }

    cancel.cancel();
    let _ = poller.await;
    Ok(())
}

fn print_inbox(alerts: &[lifesync_contracts::notification::DispatchedAlert]) {
    if alerts.is_empty() {
        println!("Inbox is empty.");
        return;
    }
    println!("{} alert(s), newest first:", alerts.len());
    for a in alerts {
        println!(
            "  {}  {:<20} → {:<28} {}",
            a.dispatched_at.format("%Y-%m-%d %H:%M:%S"),
            a.patient_name,
            a.facility_name,
            a.map_link
        );
    }
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("LifeSync SOS Engine");
    println!("Simulated Device Demo");
    println!("===================");
    println!();
    println!("Per SOS session:");
    println!("  [1] One-shot location fix, then continuous tracking");
    println!("  [2] Nearby facilities ranked by distance (fallback set when search is down)");
    println!("  [3] Dispatch fans out to contacts and the chosen facility");
    println!("  [4] The facility alert lands in the shared inbox");
    println!();
}
