use std::io;
use std::path::{Component, Path, PathBuf};

use crate::application::ports::{ScratchError, ScratchStorage};
use crate::domain::JobId;

/// One directory per job under a dedicated root on the local filesystem.
pub struct LocalScratchStorage {
    root: PathBuf,
}

impl LocalScratchStorage {
    pub fn new(root: PathBuf) -> Result<Self, ScratchError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl ScratchStorage for LocalScratchStorage {
    async fn allocate(&self, job_id: JobId) -> Result<PathBuf, ScratchError> {
        let dir = self.root.join(job_id.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        tracing::debug!(job_id = %job_id, dir = %dir.display(), "Scratch directory allocated");
        Ok(dir)
    }

    async fn locate_output(
        &self,
        dir: &Path,
        expected: &Path,
        extension: &str,
    ) -> Result<Option<PathBuf>, ScratchError> {
        if is_file(expected).await? {
            return Ok(Some(expected.to_path_buf()));
        }

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut candidates = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let matches = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if matches && entry.file_type().await?.is_file() {
                candidates.push(path);
            }
        }
        candidates.sort();
        Ok(candidates.into_iter().next())
    }

    async fn file_size(&self, path: &Path) -> Result<u64, ScratchError> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    fn release(&self, dir: &Path) -> Result<bool, ScratchError> {
        let escapes = dir.components().any(|c| matches!(c, Component::ParentDir));
        if escapes || !dir.starts_with(&self.root) || dir == self.root {
            return Err(ScratchError::OutsideRoot(dir.to_path_buf()));
        }
        match std::fs::remove_dir_all(dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

async fn is_file(path: &Path) -> Result<bool, ScratchError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(meta.is_file()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}
