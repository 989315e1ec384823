use payid_metrics_lib::{load_config_from_env, Metrics};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod snapshot;

use snapshot::{SnapshotFile, DEFAULT_SNAPSHOT_PATH};

/// Main entry point for the metrics agent
/// Generates PayID metrics from a count snapshot and pushes them until shut down
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    tracing::info!("Starting PayID metrics agent");

    let config = load_config_from_env()?;
    let snapshot_path =
        std::env::var("PAYID_METRICS_SNAPSHOT").unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.to_string());
    let snapshot = SnapshotFile::new(snapshot_path);
    tracing::info!("Reading counts from {}", snapshot.path().display());

    let metrics = Metrics::new(config, snapshot.clone(), snapshot)?;
    metrics.schedule_recurring_generation()?;
    metrics.schedule_recurring_push()?;

    wait_for_shutdown().await?;

    metrics.stop_metrics();
    tracing::debug!("Final metrics:\n{}", metrics.metrics_text()?);
    tracing::info!("PayID metrics agent stopped");
    Ok(())
}

/// Log filter used when `RUST_LOG` is unset
const DEFAULT_LOG_FILTER: &str = "payid_metrics=debug,payid_metrics_lib=debug";

/// Initialize logging for the agent and the metrics library
///
/// At `info` the log shows the loaded config, both schedules with their push
/// URLs, and shutdown. `warn` carries failed count refreshes and rejected
/// pushes; `debug` adds every refreshed count and accepted push.
///
/// `RUST_LOG` overrides the default of `debug` for both crates.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .with_ansi(true)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::debug!("Logging initialized");
}

/// Wait for SIGTERM or SIGINT (Ctrl+C on Windows)
async fn wait_for_shutdown() -> std::io::Result<()> {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping metrics"),
            _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C), stopping metrics"),
        }
    }

    #[cfg(windows)]
    {
        signal::ctrl_c().await?;
        tracing::info!("Received Ctrl+C, stopping metrics");
    }

    Ok(())
}
