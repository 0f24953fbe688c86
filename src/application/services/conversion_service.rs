use std::sync::Arc;

use super::{ConversionRunner, ExpirySweeper, JobHandle};
use crate::application::ports::{JobStore, JobStoreError};
use crate::domain::{AudioQuality, ConversionRequest, Job, JobId, SourceUrl, SourceUrlError};

/// Accepts conversion requests and answers status polls.
pub struct ConversionService {
    job_store: Arc<dyn JobStore>,
    runner: Arc<ConversionRunner>,
    sweeper: ExpirySweeper,
}

/// A freshly created job and the handle of the task now working on it.
#[derive(Debug)]
pub struct Submission {
    pub job: Job,
    pub handle: JobHandle,
}

impl ConversionService {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        runner: Arc<ConversionRunner>,
        sweeper: ExpirySweeper,
    ) -> Self {
        Self {
            job_store,
            runner,
            sweeper,
        }
    }

    /// Validates the request, creates a Pending job and starts its runner without
    /// waiting for it. Invalid sources are rejected before anything is stored.
    pub async fn submit(
        &self,
        url: &str,
        quality: Option<&str>,
    ) -> Result<Submission, ConversionError> {
        let source = SourceUrl::parse(url)?;
        let quality_selected = AudioQuality::from_selector(quality);
        if let Some(requested) = quality
            && requested.trim() != quality_selected.to_string()
        {
            tracing::debug!(
                requested = %requested,
                using = %quality_selected,
                "Unsupported quality selector, falling back"
            );
        }

        let reclaimed = self.sweeper.sweep_once().await;
        if reclaimed > 0 {
            tracing::debug!(reclaimed = reclaimed, "Eager sweep on submission");
        }

        let job = self
            .job_store
            .create(ConversionRequest::new(source, quality_selected))
            .await?;
        let handle = self.runner.spawn(job.id);

        tracing::info!(
            job_id = %job.id,
            source = %job.request.source,
            quality = %job.request.quality,
            "Conversion job enqueued"
        );
        Ok(Submission { job, handle })
    }

    pub async fn status(&self, id: JobId) -> Result<Job, ConversionError> {
        self.job_store.get(id).await.map_err(|e| match e {
            JobStoreError::NotFound(id) => ConversionError::NotFound(id),
            other => ConversionError::Store(other),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SourceUrlError),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
}
