pub mod backend;
pub mod clock;
pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod events;
pub mod idle;
pub mod ledger;
pub mod reconcile;
pub mod scheduler;
pub mod screenshot;
pub mod timer;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use backend::HttpBackend;
use clock::SystemClock;
use config::TrackerConfig;
use db::Database;
use draft::TcpConnectivityProbe;
use events::LogSink;
use idle::SystemIdleProbe;
use scheduler::TokioScheduler;
use screenshot::{Capturer, CommandCapturer, DisabledCapturer};
use timer::{commands, LifecycleEvent, ShellCommand, TrackerController, TrackerDeps};

pub use error::{TrackerError, TrackerResult};

const CONNECTIVITY_TIMEOUT: Duration = Duration::from_secs(2);

/// Entry point of the headless driver: reads commands from stdin until
/// `quit` or Ctrl-C.
pub fn run() -> Result<()> {
    // RUST_LOG still overrides the default level.
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("ShiftClock starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    runtime.block_on(serve())
}

async fn serve() -> Result<()> {
    let data_dir = config::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let config = TrackerConfig::load(&data_dir.join("config.json"))?.with_env_overrides();
    let database = Database::new(data_dir.join("shiftclock.sqlite3"))?;
    let backend = HttpBackend::new(&config.backend)?;
    let connectivity =
        TcpConnectivityProbe::from_base_url(&config.backend.base_url, CONNECTIVITY_TIMEOUT)?;

    let capturer: Arc<dyn Capturer> = match config.screenshots.capture_command.as_deref() {
        Some(command) if !command.is_empty() => Arc::new(CommandCapturer::new(command)?),
        _ => {
            info!("No capture command configured; screenshots are disabled");
            Arc::new(DisabledCapturer)
        }
    };

    let controller = TrackerController::new(
        config,
        TrackerDeps {
            backend: Arc::new(backend),
            storage: Arc::new(database),
            capturer,
            idle_probe: Arc::new(SystemIdleProbe::new()),
            connectivity: Arc::new(connectivity),
            scheduler: Arc::new(TokioScheduler),
            clock: Arc::new(SystemClock),
            events: Arc::new(LogSink),
        },
    );

    // Finish the job for a session that was open when the process last died.
    match controller.boot().await {
        Ok(Some(restored)) => info!(
            "Recovered draft for task {}",
            restored.task_id().unwrap_or_default()
        ),
        Ok(None) => {}
        Err(err) => error!("Draft recovery failed: {err}"),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => match commands::dispatch(&controller, command).await {
                        Ok(output) => println!("{output}"),
                        Err(err) => println!("error: {err}"),
                    },
                    Err(err) => println!("error: {err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received");
                break;
            }
        }
    }

    if let Err(err) = controller
        .handle_lifecycle_event(LifecycleEvent::BeforeUnload)
        .await
    {
        warn!("Final draft save failed: {err}");
    }
    controller.shutdown().await;
    info!("ShiftClock stopped");
    Ok(())
}
