use std::path::PathBuf;

use super::TrackMetadata;

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub file_path: PathBuf,
    pub file_size: u64,
    pub metadata: TrackMetadata,
    /// Set when the tool's trailing JSON line was missing or unreadable.
    pub metadata_placeholder: bool,
}
