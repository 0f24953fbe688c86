use std::path::{Path, PathBuf};

use serde::Serialize;

use super::CommandSpec;
use crate::domain::{ConversionRequest, MediaInfo, SourceUrl, TrackMetadata};

/// Optional pieces of the external tool's environment, reported by health checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ToolComponents {
    pub tool_available: bool,
    pub cookies_file_exists: bool,
    pub cookies_file_size: u64,
    pub deno_available: bool,
    pub deno_path: Option<String>,
}

/// Knows how to talk to the external media tool: which arguments to pass and
/// how to read what it prints. Does not run anything itself.
pub trait MediaTool: Send + Sync {
    fn conversion_command(&self, request: &ConversionRequest, output_path: &Path) -> CommandSpec;

    fn metadata_command(&self, source: &SourceUrl) -> CommandSpec;

    /// File name the conversion is asked to write inside the job's directory.
    fn output_file_name(&self) -> &str;

    /// Extension (without the dot) used when searching for output the tool renamed.
    fn output_extension(&self) -> &str;

    fn parse_track_metadata(&self, stdout: &str) -> Option<TrackMetadata>;

    fn parse_media_info(&self, stdout: &str) -> Option<MediaInfo>;

    /// Pulls a human readable progress string out of one output line.
    fn progress_from_line(&self, line: &str) -> Option<String>;

    fn components(&self) -> ToolComponents;

    fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(self.output_file_name())
    }
}
