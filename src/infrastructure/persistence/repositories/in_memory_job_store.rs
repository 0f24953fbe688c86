use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

use crate::application::ports::{JobStore, JobStoreError, JobUpdate};
use crate::domain::{ConversionRequest, Job, JobId};

/// Jobs live for the lifetime of the process. The map lock is held only long
/// enough to find a record; each record has its own lock for updates.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    async fn record(&self, id: JobId) -> Result<Arc<Mutex<Job>>, JobStoreError> {
        self.jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(JobStoreError::NotFound(id))
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    #[instrument(skip(self, request), fields(source = %request.source))]
    async fn create(&self, request: ConversionRequest) -> Result<Job, JobStoreError> {
        let job = Job::new(request);
        self.jobs
            .write()
            .await
            .insert(job.id, Arc::new(Mutex::new(job.clone())));
        Ok(job)
    }

    async fn get(&self, id: JobId) -> Result<Job, JobStoreError> {
        let record = self.record(id).await?;
        let job = record.lock().await.clone();
        Ok(job)
    }

    async fn mutate(&self, id: JobId, update: JobUpdate) -> Result<Job, JobStoreError> {
        let record = self.record(id).await?;
        let mut job = record.lock().await;
        let mut working = job.clone();
        update(&mut working)?;
        *job = working;
        Ok(job.clone())
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn delete(&self, id: JobId) -> Option<Job> {
        let record = self.jobs.write().await.remove(&id)?;
        let job = record.lock().await.clone();
        Some(job)
    }

    async fn list(&self) -> Vec<Job> {
        let records: Vec<Arc<Mutex<Job>>> = self.jobs.read().await.values().cloned().collect();
        let mut jobs = Vec::with_capacity(records.len());
        for record in records {
            jobs.push(record.lock().await.clone());
        }
        jobs
    }
}
