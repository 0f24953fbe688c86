use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{JobStore, ScratchStorage};

pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Reclaims jobs nobody downloaded. Removing the record from the store is what
/// grants the right to delete its directory, so a job claimed by a download
/// is never cleaned up twice.
#[derive(Clone)]
pub struct ExpirySweeper {
    job_store: Arc<dyn JobStore>,
    scratch: Arc<dyn ScratchStorage>,
    ttl: Duration,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        scratch: Arc<dyn ScratchStorage>,
        ttl: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            job_store,
            scratch,
            ttl,
            interval,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Expiry sweeper started"
        );
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
        tracing::info!("Expiry sweeper stopped");
    }

    pub async fn sweep_once(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    /// Removes every job older than the TTL as of `now`. Returns how many were reclaimed.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut reclaimed = 0;
        for job in self.job_store.list().await {
            if !job.is_expired(now, self.ttl) {
                continue;
            }
            let Some(job) = self.job_store.delete(job.id).await else {
                continue;
            };
            reclaimed += 1;
            if let Some(dir) = job.output_dir()
                && let Err(e) = self.scratch.release(dir)
            {
                tracing::warn!(
                    job_id = %job.id,
                    error = %e,
                    dir = %dir.display(),
                    "Failed to remove expired job directory"
                );
            }
            tracing::info!(job_id = %job.id, status = %job.status(), "Expired job reclaimed");
        }
        if reclaimed > 0 {
            tracing::debug!(reclaimed = reclaimed, "Sweep finished");
        }
        reclaimed
    }
}
