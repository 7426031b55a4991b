use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::refresh::EmbeddingRefreshJob;

const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Handle for stopping a running refresh schedule
pub struct RefreshScheduleHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl RefreshScheduleHandle {
    /// Stops the schedule once any in-flight run has finished
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Refresh schedule task failed");
        }
        tracing::info!("Refresh schedule stopped");
    }
}

/// Runs `job.refresh(max_per_run, false)` now and then every `every`
///
/// A run that outlasts the interval delays the next one instead of
/// overlapping it.
pub fn spawn_refresh_schedule(
    job: Arc<EmbeddingRefreshJob>,
    every: Duration,
    max_per_run: usize,
) -> RefreshScheduleHandle {
    let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);
    let every = every.max(MIN_INTERVAL);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(interval_secs = every.as_secs(), max_per_run, "Refresh schedule started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match job.refresh(max_per_run, false).await {
                        Ok(report) => tracing::info!(
                            updated = report.updated(),
                            failed = report.failed(),
                            "Scheduled embedding refresh finished"
                        ),
                        Err(e) => tracing::error!(error = %e, "Scheduled embedding refresh failed"),
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    });

    RefreshScheduleHandle { shutdown_tx, task }
}
