//! Journal ingestion engine binary.
//!
//! Wires the file layer to the state layer and runs until interrupted:
//! replay existing journal files, tail live growth, fold every event
//! into the game state, and merge companion snapshots. External
//! consumers integrate through the two core contracts -- the state
//! manager's snapshot reads and bus subscriptions -- registered before
//! ingestion starts.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `starlog.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing, `RUST_LOG` wins)
//! 3. Build the event bus and register subscribers
//! 4. Attach the game state manager
//! 5. Build the ingestion source, snapshot reader, and change signal
//! 6. Run the ingestion loop until Ctrl-C
//! 7. Log the final report and state summary

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use starlog_core::config::EngineConfig;
use starlog_core::{EngineControl, EventBus, GameStateManager, run_ingestion};
use starlog_journal::{ChangeSignal, FsEventSignal, JournalSource, PollSignal, SnapshotReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The change signal selected by configuration.
enum EngineSignal {
    /// Fixed-interval polling.
    Poll(PollSignal),
    /// OS notifications with interval fallback.
    FsEvents(Box<FsEventSignal>),
}

impl ChangeSignal for EngineSignal {
    async fn wait(&mut self) {
        match self {
            Self::Poll(signal) => signal.wait().await,
            Self::FsEvents(signal) => signal.wait().await,
        }
    }
}

/// Application entry point for the journal engine.
///
/// # Errors
///
/// Returns an error if configuration loading fails or the runtime
/// cannot install its shutdown handler. Ingestion itself never fails
/// the process: source outages degrade, they do not crash.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .with_target(true)
        .init();

    info!("starlog-engine starting");
    info!(
        directory = %config.journal.directory.display(),
        poll_interval_ms = config.journal.poll_interval_ms,
        retry_interval_ms = config.journal.retry_interval_ms,
        fs_events = config.journal.fs_events,
        "Configuration loaded"
    );

    // 3. Build the event bus and register consumers.
    let mut bus = EventBus::new();
    bus.subscribe("FSDJump", |event| {
        info!(
            system = event.str_or_empty("StarSystem"),
            distance_ly = event.f64_or_zero("JumpDist"),
            "jump complete"
        );
        Ok(())
    });

    // 4. Attach the game state manager.
    let manager = Arc::new(GameStateManager::new());
    GameStateManager::attach(&manager, &mut bus);
    info!("Game state manager attached");

    // 5. Build source, snapshot reader, and change signal.
    let source = JournalSource::new(&config.journal.directory);
    let reader = SnapshotReader::new(&config.journal.directory);
    let poll_interval = Duration::from_millis(config.journal.poll_interval_ms);
    let mut signal = if config.journal.fs_events {
        EngineSignal::FsEvents(Box::new(FsEventSignal::new(
            &config.journal.directory,
            poll_interval,
        )))
    } else {
        EngineSignal::Poll(PollSignal::new(poll_interval))
    };

    // 6. Run the ingestion loop until Ctrl-C.
    let control = Arc::new(EngineControl::new());
    let runner_control = Arc::clone(&control);
    let retry_interval = Duration::from_millis(config.journal.retry_interval_ms);
    let runner = tokio::spawn(async move {
        run_ingestion(
            source,
            reader,
            bus,
            &runner_control,
            &mut signal,
            retry_interval,
        )
        .await
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    control.request_stop();
    let report = runner.await?;

    // 7. Final summary.
    let state = manager.state();
    info!(
        events_processed = manager.events_processed(),
        snapshot_updates = manager.snapshot_updates(),
        lines_delivered = report.lines_delivered,
        parse_failures = report.parse_failures,
        degraded_entries = report.degraded_entries,
        commander = state.commander.name,
        system = state.location.system,
        "starlog-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `starlog.yaml`.
///
/// Falls back to defaults when the file does not exist (the common
/// case for a first run); the environment override still applies.
fn load_config() -> anyhow::Result<EngineConfig> {
    let config_path = Path::new("starlog.yaml");
    if config_path.exists() {
        Ok(EngineConfig::from_file(config_path)?)
    } else {
        let mut config = EngineConfig::default();
        config.journal.apply_env_overrides();
        Ok(config)
    }
}
