mod config;
mod terminal_output;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, error, info, warn};

use sidebot_channels::{ChannelAdapter, DiscordAdapter};
use sidebot_config::{config_dir, config_file_path, load_and_prepare, redact, validate, SideBotConfig};
use sidebot_core::{Component, EventBus};
use sidebot_guard::{SpamGuard, SweepScheduler};
use sidebot_logging::init_logger;

use config::{LogSettings, Settings};
use terminal_output::{note_error, note_info, note_success, note_warn};

/// How long the guard may keep draining queued events after shutdown.
const INGEST_GRACE: Duration = Duration::from_secs(2);

/// How long shutdown waits for mutes and deletes already under way.
const MITIGATION_GRACE: Duration = Duration::from_secs(30);

#[derive(Parser)]
#[command(name = "sidebot")]
#[command(about = "SideBot: mutes users who spam across Discord channels")]
#[command(version)]
struct Cli {
    /// Config file to load (defaults to <config dir>/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Discord and run the spam guard (default)
    Run,
    /// Print the resolved, redacted config and report problems
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A `.env` next to the bot may carry DISCORD_TOKEN / DTOKEN.
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path).await?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await,
        Commands::CheckConfig => check_config(&path, &config),
    }
}

fn check_config(path: &Path, config: &SideBotConfig) -> Result<()> {
    note_info(&format!("Config file: {}", path.display()));

    let snapshot = redact(&serde_json::to_value(config)?);
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    let report = validate(config);
    for warning in &report.warnings {
        note_warn(&warning.to_string());
    }
    for err in &report.errors {
        note_error(&err.to_string());
    }

    if !report.is_valid() {
        bail!("{} config error(s)", report.errors.len());
    }
    note_success("Config is valid");
    Ok(())
}

async fn run_bot(config: SideBotConfig) -> Result<()> {
    let log = LogSettings::from_config(&config);
    let _log_guard = init_logger(&log.level, log.dir.as_deref())?;

    let report = validate(&config);
    for warning in &report.warnings {
        warn!(path = %warning.path, "{}", warning.message);
    }
    if !report.is_valid() {
        for err in &report.errors {
            error!(path = %err.path, "{}", err.message);
        }
        bail!("Refusing to start with an invalid config");
    }

    let settings = Settings::from_config(&config)?;
    info!(
        channels_max = settings.guard.channels_max,
        mute_secs = settings.guard.mute_duration.as_secs(),
        sweep_secs = settings.guard.sweep_interval.as_secs(),
        ignore_bot_authors = settings.guard.ignore_bot_authors,
        "Starting SideBot"
    );

    let mut bus = EventBus::new();
    let adapter = Arc::new(
        DiscordAdapter::connect(&settings.token, bus.guard_tx.clone())
            .await
            .context("Failed to build Discord client")?,
    );

    let guard = Arc::new(SpamGuard::new(&settings.guard, Arc::new(adapter.moderation())));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweep = SweepScheduler::new(guard.tracker(), settings.guard.sweep_interval).spawn(shutdown_rx);

    let guard_rx = bus
        .take_guard_rx()
        .context("Spam guard receiver already taken")?;
    let guard_ref = Arc::clone(&guard);
    let mut guard_task = tokio::spawn(async move {
        if let Err(e) = Component::start(&*guard_ref, guard_rx).await {
            error!(error = %e, "Spam guard task failed");
        }
    });

    let adapter_ref = Arc::clone(&adapter);
    let mut gateway = tokio::spawn(async move { adapter_ref.start().await });

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, shutting down");
            Ok(())
        }
        joined = &mut gateway => match joined {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Discord task panicked: {e}")),
        },
    };

    adapter.shutdown().await;
    let _ = shutdown_tx.send(true);
    if let Err(e) = sweep.await {
        warn!(error = %e, "Sweep task did not stop cleanly");
    }

    // Stop ingesting, then let mutes and deletes already under way finish.
    drop(bus);
    if time::timeout(INGEST_GRACE, &mut guard_task).await.is_err() {
        debug!("Gateway still holds the event sender, stopping ingest");
        guard_task.abort();
        let _ = guard_task.await;
    }
    match time::timeout(MITIGATION_GRACE, guard.drain_mitigations()).await {
        Ok(finished) if !finished.is_empty() => {
            info!(finished = finished.len(), "In-flight mitigations completed")
        }
        Ok(_) => {}
        Err(_) => warn!(
            grace_secs = MITIGATION_GRACE.as_secs(),
            "Gave up waiting for in-flight mitigations"
        ),
    }

    info!("SideBot stopped");
    outcome
}
