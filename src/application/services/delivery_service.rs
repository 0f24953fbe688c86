use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

use crate::application::ports::{JobStore, JobStoreError, ScratchStorage};
use crate::domain::{JobId, JobState, JobStatus, TrackMetadata};

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Hands a finished job's file to exactly one caller and reclaims its storage
/// once the transfer ends, whether it completed or the client went away.
pub struct DeliveryService {
    job_store: Arc<dyn JobStore>,
    scratch: Arc<dyn ScratchStorage>,
    chunk_size: usize,
}

pub struct Delivery {
    pub job_id: JobId,
    pub metadata: TrackMetadata,
    pub file_size: u64,
    pub body: DeliveryStream,
}

impl DeliveryService {
    pub fn new(
        job_store: Arc<dyn JobStore>,
        scratch: Arc<dyn ScratchStorage>,
        chunk_size: usize,
    ) -> Self {
        Self {
            job_store,
            scratch,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Takes the job out of the store and opens its output for streaming.
    /// A second claim on the same id reports `NotFound`.
    pub async fn claim(&self, job_id: JobId) -> Result<Delivery, DeliveryError> {
        let job = self.job_store.get(job_id).await.map_err(|e| match e {
            JobStoreError::NotFound(id) => DeliveryError::NotFound(id),
            other => DeliveryError::Store(other),
        })?;
        let output = match job.state() {
            JobState::Completed(output) => output.clone(),
            other => {
                return Err(DeliveryError::NotReady {
                    job_id,
                    status: other.status(),
                });
            }
        };

        // Status never leaves Completed, so the only way to lose this race is to a
        // concurrent download or the sweeper, both of which remove the record.
        let Some(job) = self.job_store.delete(job_id).await else {
            return Err(DeliveryError::NotFound(job_id));
        };
        let guard = ScratchGuard::new(
            Arc::clone(&self.scratch),
            job.output_dir().map(Path::to_path_buf),
            job_id,
        );

        let file = File::open(&output.file_path).await?;
        tracing::info!(
            job_id = %job_id,
            file_size = output.file_size,
            "Delivery started"
        );

        Ok(Delivery {
            job_id,
            metadata: output.metadata,
            file_size: output.file_size,
            body: DeliveryStream {
                inner: ReaderStream::with_capacity(file, self.chunk_size),
                guard: Some(guard),
            },
        })
    }
}

/// Chunked file stream that removes the job directory when it ends or is dropped.
pub struct DeliveryStream {
    inner: ReaderStream<File>,
    guard: Option<ScratchGuard>,
}

impl Stream for DeliveryStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let polled = Pin::new(&mut self.inner).poll_next(cx);
        if let Poll::Ready(None) = polled {
            self.guard.take();
        }
        polled
    }
}

struct ScratchGuard {
    scratch: Arc<dyn ScratchStorage>,
    dir: Option<PathBuf>,
    job_id: JobId,
}

impl ScratchGuard {
    fn new(scratch: Arc<dyn ScratchStorage>, dir: Option<PathBuf>, job_id: JobId) -> Self {
        Self {
            scratch,
            dir,
            job_id,
        }
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        match self.scratch.release(&dir) {
            Ok(_) => tracing::info!(job_id = %self.job_id, "Delivered job reclaimed"),
            Err(e) => tracing::warn!(
                job_id = %self.job_id,
                error = %e,
                dir = %dir.display(),
                "Failed to remove delivered job directory"
            ),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("job {job_id} is not ready for download (status: {status})")]
    NotReady { job_id: JobId, status: JobStatus },
    #[error("job store: {0}")]
    Store(JobStoreError),
    #[error("failed to open output: {0}")]
    Io(#[from] io::Error),
}
