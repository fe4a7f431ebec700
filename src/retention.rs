// Retention sweeping - deletes artifacts older than RETENTION_WINDOW
//
// When sweeps run is decided by [`SweepPolicy`].

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;

use crate::storage::ArtifactStore;

/// Age after which an artifact may be deleted
pub const RETENTION_WINDOW: Duration = Duration::from_secs(3600);

/// When sweeps run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepPolicy {
    /// After every successful download, synchronously
    AfterDownload,
    /// On a background timer; post-download sweeps are skipped
    Interval(Duration),
}

impl SweepPolicy {
    pub fn sweeps_after_download(&self) -> bool {
        matches!(self, Self::AfterDownload)
    }
}

/// Outcome of one pass over the storage directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
    pub kept: usize,
}

#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn ArtifactStore>,
    window: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            store,
            window: RETENTION_WINDOW,
        }
    }

    /// Delete every regular file whose age at `now` exceeds the window.
    ///
    /// Individual failures are logged and counted; the pass always completes.
    pub async fn sweep(&self, now: SystemTime) -> SweepReport {
        self.sweep_sparing(now, None).await
    }

    /// Like [`sweep`](Self::sweep), but never deletes `spared`.
    pub async fn sweep_sparing(&self, now: SystemTime, spared: Option<&str>) -> SweepReport {
        let mut report = SweepReport::default();

        let entries = match self.store.list().await {
            Ok(entries) => entries,
            Err(error) => {
                tracing::warn!(
                    dir = %self.store.root().display(),
                    "could not list storage directory: {}",
                    error
                );
                return report;
            }
        };

        for entry in entries.into_iter().filter(|e| e.is_file) {
            // Clock skew: a future timestamp counts as brand new
            let age = now.duration_since(entry.touched).unwrap_or_default();
            if age <= self.window || spared == Some(entry.name.as_str()) {
                report.kept += 1;
                continue;
            }

            match self.store.remove(&entry.name).await {
                Ok(()) => {
                    tracing::info!(
                        file = %entry.name,
                        age_secs = age.as_secs(),
                        "swept expired artifact"
                    );
                    report.removed += 1;
                }
                Err(error) => {
                    tracing::warn!(
                        file = %entry.name,
                        "could not remove expired artifact: {}",
                        error
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Sweep on a fixed period until the returned task is aborted.
    pub fn spawn_periodic(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = self.sweep(SystemTime::now()).await;
                tracing::debug!(?report, "periodic sweep finished");
            }
        })
    }
}
