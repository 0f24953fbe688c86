use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{ConversionOutput, ConversionRequest, JobFailure, JobId, JobStatus};

/// Where a job sits in its lifecycle. Terminal payloads live inside the variant,
/// so a result or an error can only be read once the status says it exists.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState {
    Pending,
    Processing,
    Completed(ConversionOutput),
    Failed(JobFailure),
}

impl JobState {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Processing => JobStatus::Processing,
            JobState::Completed(_) => JobStatus::Completed,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub request: ConversionRequest,
    pub progress: String,
    pub created_at: DateTime<Utc>,
    state: JobState,
    output_dir: Option<PathBuf>,
}

impl Job {
    pub fn new(request: ConversionRequest) -> Self {
        Self {
            id: JobId::new(),
            request,
            progress: "Queued".to_string(),
            created_at: Utc::now(),
            state: JobState::Pending,
            output_dir: None,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.status()
    }

    pub fn state(&self) -> &JobState {
        &self.state
    }

    pub fn output(&self) -> Option<&ConversionOutput> {
        match &self.state {
            JobState::Completed(output) => Some(output),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&JobFailure> {
        match &self.state {
            JobState::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.created_at)
            .to_std()
            .map(|age| age > ttl)
            .unwrap_or(false)
    }

    pub fn start_processing(&mut self) -> Result<(), JobTransitionError> {
        if self.status() != JobStatus::Pending {
            return Err(JobTransitionError::new(self.status(), JobStatus::Processing));
        }
        self.state = JobState::Processing;
        Ok(())
    }

    /// Records the scratch directory owned by this job. Only the first allocation sticks.
    pub fn attach_output_dir(&mut self, output_dir: PathBuf) -> bool {
        if self.output_dir.is_some() {
            return false;
        }
        self.output_dir = Some(output_dir);
        true
    }

    pub fn complete(&mut self, output: ConversionOutput) -> Result<(), JobTransitionError> {
        if self.status() != JobStatus::Processing {
            return Err(JobTransitionError::new(self.status(), JobStatus::Completed));
        }
        self.state = JobState::Completed(output);
        self.progress = "Ready for download".to_string();
        Ok(())
    }

    pub fn fail(&mut self, failure: JobFailure) -> Result<(), JobTransitionError> {
        if self.status() != JobStatus::Processing {
            return Err(JobTransitionError::new(self.status(), JobStatus::Failed));
        }
        self.state = JobState::Failed(failure);
        self.progress = "Failed".to_string();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal job transition: {from} -> {to}")]
pub struct JobTransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

impl JobTransitionError {
    fn new(from: JobStatus, to: JobStatus) -> Self {
        Self { from, to }
    }
}
