use std::sync::Arc;
use std::time::Duration;

use super::{ConcurrencyGate, GateClosed, ResourceClass};
use crate::application::ports::{MediaTool, ProcessError, ProcessRunner, RunOptions};
use crate::domain::{MediaInfo, SourceUrl, SourceUrlError, tail_chars};

pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_METADATA_DIAGNOSTIC_CHARS: usize = 200;

/// Synchronous information lookups, admitted through the metadata gate class.
pub struct MetadataService {
    gate: ConcurrencyGate,
    process_runner: Arc<dyn ProcessRunner>,
    media_tool: Arc<dyn MediaTool>,
    timeout: Duration,
}

impl MetadataService {
    pub fn new(
        gate: ConcurrencyGate,
        process_runner: Arc<dyn ProcessRunner>,
        media_tool: Arc<dyn MediaTool>,
        timeout: Duration,
    ) -> Self {
        Self {
            gate,
            process_runner,
            media_tool,
            timeout,
        }
    }

    pub async fn lookup(&self, url: &str) -> Result<MediaInfo, MetadataError> {
        let source = SourceUrl::parse(url)?;
        let _permit = self.gate.acquire(ResourceClass::Metadata).await?;

        let command = self.media_tool.metadata_command(&source);
        let output = match self
            .process_runner
            .run(&command, RunOptions::with_timeout(self.timeout))
            .await
        {
            Ok(output) => output,
            Err(ProcessError::TimedOut(after)) => {
                tracing::warn!(source = %source, "Metadata lookup timed out");
                return Err(MetadataError::TimedOut(after));
            }
            Err(e) => return Err(MetadataError::Process(e)),
        };

        if !output.success() {
            tracing::error!(source = %source, stderr = %output.stderr, "Metadata fetch failed");
            return Err(MetadataError::ToolFailure(tail_chars(
                output.stderr.trim(),
                MAX_METADATA_DIAGNOSTIC_CHARS,
            )));
        }

        self.media_tool
            .parse_media_info(&output.stdout)
            .ok_or(MetadataError::Unparseable)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SourceUrlError),
    #[error("could not fetch video: {0}")]
    ToolFailure(String),
    #[error("metadata lookup timed out after {0:?}")]
    TimedOut(Duration),
    #[error("failed to parse video metadata")]
    Unparseable,
    #[error("process: {0}")]
    Process(ProcessError),
    #[error(transparent)]
    Gate(#[from] GateClosed),
}
