use serde::Serialize;

pub const UNKNOWN_FIELD: &str = "Unknown";

/// Descriptive metadata attached to a finished conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub duration_secs: u64,
}

impl TrackMetadata {
    pub fn placeholder() -> Self {
        Self {
            title: UNKNOWN_FIELD.to_string(),
            artist: UNKNOWN_FIELD.to_string(),
            duration_secs: 0,
        }
    }
}

/// Everything a metadata lookup reports about a source without downloading it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<u64>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
}
