use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static ACCEPTED_SHAPES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(https?://)?(www\.)?youtube\.com/watch\?v=[\w-]+",
        r"^(https?://)?(www\.)?youtu\.be/[\w-]+",
        r"^(https?://)?(www\.)?youtube\.com/shorts/[\w-]+",
        r"^(https?://)?music\.youtube\.com/watch\?v=[\w-]+",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// A source reference that matched one of the accepted video-hosting URL shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl(String);

impl SourceUrl {
    pub fn parse(raw: &str) -> Result<Self, SourceUrlError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SourceUrlError::Empty);
        }
        if ACCEPTED_SHAPES.iter().any(|re| re.is_match(trimmed)) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(SourceUrlError::UnsupportedShape(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceUrlError {
    #[error("source URL is empty")]
    Empty,
    #[error("unsupported source URL: {0}")]
    UnsupportedShape(String),
}
