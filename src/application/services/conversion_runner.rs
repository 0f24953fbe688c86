use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::{ConcurrencyGate, GateClosed, ResourceClass};
use crate::application::ports::{
    JobStore, JobStoreError, MediaTool, OutputLine, ProcessError, ProcessOutput, ProcessRunner,
    RunOptions, ScratchError, ScratchStorage, job_update,
};
use crate::domain::{
    ConversionOutput, ConversionRequest, JobFailure, JobId, JobStatus, TrackMetadata,
};

pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub conversion_timeout: Duration,
    pub stream_progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            conversion_timeout: DEFAULT_CONVERSION_TIMEOUT,
            stream_progress: true,
        }
    }
}

/// Drives one job from Pending to a terminal state. Nothing else writes a job's
/// status, result or error.
pub struct ConversionRunner {
    job_store: Arc<dyn JobStore>,
    gate: ConcurrencyGate,
    process_runner: Arc<dyn ProcessRunner>,
    media_tool: Arc<dyn MediaTool>,
    scratch: Arc<dyn ScratchStorage>,
    config: RunnerConfig,
}

impl ConversionRunner {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        gate: ConcurrencyGate,
        process_runner: Arc<dyn ProcessRunner>,
        media_tool: Arc<dyn MediaTool>,
        scratch: Arc<dyn ScratchStorage>,
        config: RunnerConfig,
    ) -> Self {
        Self {
            job_store,
            gate,
            process_runner,
            media_tool,
            scratch,
            config,
        }
    }

    /// Starts the job on its own task. A panic inside the run is recorded on the job.
    pub fn spawn(self: &Arc<Self>, job_id: JobId) -> JobHandle {
        let runner = Arc::clone(self);
        let span = tracing::info_span!("conversion_job", job_id = %job_id);
        let task = tokio::spawn(
            async move {
                match AssertUnwindSafe(runner.run(job_id)).catch_unwind().await {
                    Ok(status) => status,
                    Err(_) => {
                        tracing::error!("Conversion runner panicked");
                        runner
                            .record_failure(job_id, JobFailure::Internal("runner panicked".into()))
                            .await
                    }
                }
            }
            .instrument(span),
        );
        JobHandle { job_id, task }
    }

    /// Runs the job to completion and returns the status it ended in.
    pub async fn run(&self, job_id: JobId) -> JobStatus {
        match self.execute(job_id).await {
            Ok(status) => status,
            Err(RunnerError::Store(JobStoreError::NotFound(_))) => {
                tracing::warn!("Job was reclaimed before the runner finished");
                JobStatus::Failed
            }
            Err(e) => {
                tracing::error!(error = %e, "Conversion job failed unexpectedly");
                self.record_failure(job_id, JobFailure::Internal(e.to_string()))
                    .await
            }
        }
    }

    async fn execute(&self, job_id: JobId) -> Result<JobStatus, RunnerError> {
        let job = self
            .job_store
            .mutate(
                job_id,
                job_update(|job| {
                    job.start_processing()?;
                    job.progress = "Waiting for conversion slot".to_string();
                    Ok(())
                }),
            )
            .await?;
        let request = job.request.clone();
        tracing::debug!(status = %job.status(), "Job status transition");

        let output_dir = self.scratch.allocate(job_id).await?;
        let outcome = match self.convert(job_id, &request, &output_dir).await {
            Err(e) if !is_job_gone(&e) => {
                tracing::error!(error = %e, "Conversion job failed unexpectedly");
                self.fail(job_id, JobFailure::Internal(e.to_string())).await
            }
            other => other,
        };

        // Once the record is gone nobody else will find this directory.
        if let Err(e) = &outcome
            && is_job_gone(e)
        {
            self.release_orphan(&output_dir);
        }
        outcome
    }

    async fn convert(
        &self,
        job_id: JobId,
        request: &ConversionRequest,
        output_dir: &Path,
    ) -> Result<JobStatus, RunnerError> {
        let dir_for_job = output_dir.to_path_buf();
        self.job_store
            .mutate(
                job_id,
                job_update(move |job| {
                    job.attach_output_dir(dir_for_job);
                    Ok(())
                }),
            )
            .await?;

        let permit = self.gate.acquire(ResourceClass::Conversion).await?;
        self.set_progress(job_id, "Converting".to_string()).await?;
        tracing::info!(
            source = %request.source,
            quality = %request.quality,
            "Conversion started"
        );

        let outcome = self.invoke_tool(job_id, request, output_dir).await;
        drop(permit);

        let output = match outcome {
            Ok(output) => output,
            Err(ProcessError::TimedOut(after)) => {
                tracing::warn!(timeout_secs = after.as_secs(), "Conversion timed out");
                return self.fail(job_id, JobFailure::TimedOut { after }).await;
            }
            Err(e) => return Err(e.into()),
        };

        if !output.success() {
            tracing::error!(
                exit_code = ?output.exit_code,
                stderr = %output.stderr,
                "Conversion tool failed"
            );
            return self
                .fail(
                    job_id,
                    JobFailure::tool_failure(output.exit_code, &output.stderr),
                )
                .await;
        }

        let (metadata, metadata_placeholder) =
            match self.media_tool.parse_track_metadata(&output.stdout) {
                Some(metadata) => (metadata, false),
                None => {
                    tracing::warn!("Tool printed no usable metadata line; using placeholders");
                    (TrackMetadata::placeholder(), true)
                }
            };

        let Some(file_path) = self.find_output(output_dir).await? else {
            tracing::error!(dir = %output_dir.display(), "Conversion produced no output file");
            return self.fail(job_id, JobFailure::NoOutputProduced).await;
        };
        let file_size = self.scratch.file_size(&file_path).await?;

        tracing::info!(
            title = %metadata.title,
            file_size = file_size,
            "Conversion completed"
        );
        let completed = ConversionOutput {
            file_path,
            file_size,
            metadata,
            metadata_placeholder,
        };
        let job = self
            .job_store
            .mutate(job_id, job_update(move |job| job.complete(completed)))
            .await?;
        Ok(job.status())
    }

    async fn invoke_tool(
        &self,
        job_id: JobId,
        request: &ConversionRequest,
        output_dir: &Path,
    ) -> Result<ProcessOutput, ProcessError> {
        let output_path = self.media_tool.output_path(output_dir);
        let command = self.media_tool.conversion_command(request, &output_path);
        let options = RunOptions::with_timeout(self.config.conversion_timeout);

        if !self.config.stream_progress {
            return self.process_runner.run(&command, options).await;
        }

        let (sink, lines) = mpsc::unbounded_channel();
        let forwarder = tokio::spawn(
            forward_progress(
                job_id,
                lines,
                Arc::clone(&self.job_store),
                Arc::clone(&self.media_tool),
            )
            .in_current_span(),
        );
        let result = self
            .process_runner
            .run(&command, options.streaming_to(sink))
            .await;
        if let Err(e) = forwarder.await {
            tracing::warn!(error = %e, "Progress forwarder ended abnormally");
        }
        result
    }

    async fn find_output(&self, output_dir: &Path) -> Result<Option<PathBuf>, ScratchError> {
        let expected = self.media_tool.output_path(output_dir);
        self.scratch
            .locate_output(output_dir, &expected, self.media_tool.output_extension())
            .await
    }

    async fn set_progress(&self, job_id: JobId, progress: String) -> Result<(), JobStoreError> {
        update_progress(self.job_store.as_ref(), job_id, progress).await
    }

    async fn fail(&self, job_id: JobId, failure: JobFailure) -> Result<JobStatus, RunnerError> {
        tracing::debug!(reason = failure.kind(), "Job status transition to failed");
        let job = self
            .job_store
            .mutate(job_id, job_update(move |job| job.fail(failure)))
            .await?;
        Ok(job.status())
    }

    fn release_orphan(&self, output_dir: &Path) {
        match self.scratch.release(output_dir) {
            Ok(true) => tracing::info!(
                dir = %output_dir.display(),
                "Removed directory of a job reclaimed while running"
            ),
            Ok(false) => {}
            Err(e) => tracing::warn!(
                error = %e,
                dir = %output_dir.display(),
                "Failed to remove directory of a reclaimed job"
            ),
        }
    }

    async fn record_failure(&self, job_id: JobId, failure: JobFailure) -> JobStatus {
        tracing::debug!(reason = failure.kind(), "Job status transition to failed");
        match self
            .job_store
            .mutate(job_id, job_update(move |job| job.fail(failure)))
            .await
        {
            Ok(job) => job.status(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not record job failure");
                JobStatus::Failed
            }
        }
    }
}

fn is_job_gone(error: &RunnerError) -> bool {
    matches!(error, RunnerError::Store(JobStoreError::NotFound(_)))
}

async fn forward_progress(
    job_id: JobId,
    mut lines: mpsc::UnboundedReceiver<OutputLine>,
    job_store: Arc<dyn JobStore>,
    media_tool: Arc<dyn MediaTool>,
) {
    while let Some(output) = lines.recv().await {
        tracing::debug!(stream = ?output.stream, "tool: {}", output.line);
        if let Some(progress) = media_tool.progress_from_line(&output.line)
            && let Err(e) = update_progress(job_store.as_ref(), job_id, progress).await
        {
            tracing::debug!(error = %e, "Dropping progress update");
        }
    }
}

async fn update_progress(
    job_store: &dyn JobStore,
    job_id: JobId,
    progress: String,
) -> Result<(), JobStoreError> {
    job_store
        .mutate(
            job_id,
            job_update(move |job| {
                if job.status() == JobStatus::Processing {
                    job.progress = progress;
                }
                Ok(())
            }),
        )
        .await
        .map(|_| ())
}

/// Handle to a running job. Dropping it detaches the task; the outcome is still
/// recorded on the job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    task: JoinHandle<JobStatus>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> JobStatus {
        match self.task.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(job_id = %self.job_id, error = %e, "Conversion task aborted");
                JobStatus::Failed
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("job store: {0}")]
    Store(#[from] JobStoreError),
    #[error("scratch storage: {0}")]
    Scratch(#[from] ScratchError),
    #[error("process: {0}")]
    Process(#[from] ProcessError),
    #[error(transparent)]
    Gate(#[from] GateClosed),
}
