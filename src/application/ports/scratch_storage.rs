use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::JobId;

#[async_trait]
pub trait ScratchStorage: Send + Sync {
    /// Creates a directory owned exclusively by `job_id`.
    async fn allocate(&self, job_id: JobId) -> Result<PathBuf, ScratchError>;

    /// Returns `expected` if it exists, otherwise the first file in `dir` with `extension`.
    async fn locate_output(
        &self,
        dir: &Path,
        expected: &Path,
        extension: &str,
    ) -> Result<Option<PathBuf>, ScratchError>;

    async fn file_size(&self, path: &Path) -> Result<u64, ScratchError>;

    /// Removes `dir` and its contents. A missing directory is not an error.
    /// Synchronous so it can run from a drop guard.
    fn release(&self, dir: &Path) -> Result<bool, ScratchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ScratchError {
    #[error("path outside scratch root: {0}")]
    OutsideRoot(PathBuf),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
