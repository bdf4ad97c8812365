//! Application execution logic.
//!
//! This module loads a replay script, runs it through the filter and
//! prints every emitted update.

use std::io::Write;
use std::path::Path;

use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use flap_filter::config::ValidatedConfig;
use flap_filter::filter::UpdateFilter;
use flap_filter::replay::{Emitted, OutputFormat, ReplayError, load_script, replay};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Error type for runtime execution failures.
#[derive(Debug, Error)]
pub enum RunError {
    /// Loading or replaying the script failed.
    #[error("Replay failed: {0}")]
    Replay(#[from] ReplayError),

    /// Writing the report failed.
    #[error("Failed to write output: {0}")]
    Output(#[source] std::io::Error),
}

/// Executes a replay and prints the result to stdout.
///
/// A shutdown signal (Ctrl+C, SIGTERM) stops the replay early; whatever
/// was emitted up to then is still printed.
///
/// # Errors
///
/// Returns an error if the script cannot be loaded, the filter fails, or
/// stdout cannot be written.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config: ValidatedConfig, script: &Path) -> Result<(), RunError> {
    let shutdown = CancellationToken::new();

    let emitted = {
        let replay = replay_script(&config, script, shutdown.clone());
        tokio::pin!(replay);
        let signal = shutdown_signal();
        tokio::pin!(signal);

        tokio::select! {
            biased;

            result = &mut replay => result?,
            () = &mut signal => {
                tracing::info!("Shutdown signal received, stopping...");
                shutdown.cancel();
                replay.await?
            }
        }
    };

    write_report(&mut std::io::stdout().lock(), config.format, &emitted)?;
    tracing::info!(emitted = emitted.len(), "Replay complete");
    Ok(())
}

/// Loads `script` and replays it through a filter built from `config`.
async fn replay_script(
    config: &ValidatedConfig,
    script: &Path,
    shutdown: CancellationToken,
) -> Result<Vec<Emitted>, RunError> {
    let events = load_script(script)?;
    tracing::info!(
        events = events.len(),
        "Loaded replay script {}",
        script.display()
    );

    let filter = UpdateFilter::new().with_damping(config.damping);
    let emitted = replay(&filter, events, config.channel_capacity, shutdown).await?;
    Ok(emitted)
}

/// Writes one rendered line per emitted update.
fn write_report<W: Write>(
    out: &mut W,
    format: OutputFormat,
    emitted: &[Emitted],
) -> Result<(), RunError> {
    for record in emitted {
        writeln!(out, "{}", format.render(record)).map_err(RunError::Output)?;
    }
    out.flush().map_err(RunError::Output)
}

/// Returns a future that completes when a shutdown signal is received.
///
/// If a handler cannot be installed, that signal is simply never observed.
///
/// Excluded from coverage - requires OS signal handling.
#[cfg(not(tarpaulin_include))]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
