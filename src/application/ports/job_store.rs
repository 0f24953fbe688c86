use async_trait::async_trait;

use crate::domain::{ConversionRequest, Job, JobId, JobTransitionError};

/// Mutation applied to a single job record while the store holds that record exclusively.
pub type JobUpdate = Box<dyn FnOnce(&mut Job) -> Result<(), JobTransitionError> + Send>;

pub fn job_update<F>(update: F) -> JobUpdate
where
    F: FnOnce(&mut Job) -> Result<(), JobTransitionError> + Send + 'static,
{
    Box::new(update)
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, request: ConversionRequest) -> Result<Job, JobStoreError>;

    async fn get(&self, id: JobId) -> Result<Job, JobStoreError>;

    /// Runs `update` against the record and returns the post-update snapshot.
    /// Updates to the same id never interleave; updates to different ids never wait on each other.
    async fn mutate(&self, id: JobId, update: JobUpdate) -> Result<Job, JobStoreError>;

    /// Removes the record. Only the first caller for a given id receives `Some`.
    async fn delete(&self, id: JobId) -> Option<Job>;

    async fn list(&self) -> Vec<Job>;
}

#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error(transparent)]
    Transition(#[from] JobTransitionError),
}
