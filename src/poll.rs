//! Run polling
//!
//! Runs are created asynchronously by the backend. [`poll_run`] sleeps for
//! the configured interval, fetches the run, and repeats until the run is
//! terminal or the wait budget is spent.

use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::config::PollSettings;
use crate::models::{Run, RunStatus};

/// How a polling loop ended
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// Run reached `succeeded`
    Succeeded(Run),

    /// Run reached `failed`; carries the backend's error text
    Failed { error: String },

    /// A status check did not return 200 with a decodable run
    StatusUnavailable { reason: String },

    /// The wait budget ran out while the run was still in flight
    TimedOut { waited: Duration },
}

/// Progress callback invoked after every decoded status check, the final one included
#[derive(Debug, Clone, Copy)]
pub struct PollTick<'a> {
    pub status: &'a RunStatus,
    pub waited: Duration,
    /// Status is `succeeded` or `failed`; no further check follows
    pub terminal: bool,
    /// Non-terminal and `waited` is a multiple of the progress cadence
    pub progress_due: bool,
}

/// `300s` for whole seconds, `0.25s` otherwise
pub fn format_elapsed(elapsed: Duration) -> String {
    if elapsed.subsec_millis() == 0 {
        format!("{}s", elapsed.as_secs())
    } else {
        format!("{}s", elapsed.as_secs_f64())
    }
}

/// Poll `GET /runs/{run_id}` until the run finishes or `settings.max_wait` elapses
///
/// The elapsed time is counted in whole intervals rather than wall-clock,
/// so a slow backend stretches the real wait beyond `max_wait`.
pub async fn poll_run<F>(
    client: &ApiClient,
    run_id: &str,
    settings: &PollSettings,
    mut on_tick: F,
) -> PollOutcome
where
    F: FnMut(PollTick<'_>),
{
    let mut waited_ms: u64 = 0;

    while waited_ms < settings.max_wait_ms {
        tokio::time::sleep(settings.interval()).await;
        waited_ms += settings.interval_ms;

        let response = match client.get_run(run_id).await {
            Ok(response) if response.is_status(200) => response,
            Ok(response) => {
                warn!(run_id, status = response.status, "Run status check rejected");
                return PollOutcome::StatusUnavailable {
                    reason: format!("status {}", response.status),
                };
            }
            Err(e) => {
                return PollOutcome::StatusUnavailable {
                    reason: e.to_string(),
                };
            }
        };

        let run: Run = match response.json() {
            Ok(run) => run,
            Err(e) => {
                return PollOutcome::StatusUnavailable {
                    reason: e.to_string(),
                };
            }
        };

        debug!(run_id, status = %run.status, waited_ms, "Polled run");

        let terminal = run.status.is_terminal();
        on_tick(PollTick {
            status: &run.status,
            waited: Duration::from_millis(waited_ms),
            terminal,
            progress_due: !terminal
                && settings.progress_every_ms > 0
                && waited_ms % settings.progress_every_ms == 0,
        });

        match run.status {
            RunStatus::Succeeded => return PollOutcome::Succeeded(run),
            RunStatus::Failed => {
                return PollOutcome::Failed {
                    error: run.error.unwrap_or_else(|| "Unknown error".to_string()),
                };
            }
            RunStatus::Running | RunStatus::Unknown => {}
        }
    }

    PollOutcome::TimedOut {
        waited: Duration::from_millis(waited_ms),
    }
}
