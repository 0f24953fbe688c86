use super::{AudioQuality, SourceUrl};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source: SourceUrl,
    pub quality: AudioQuality,
}

impl ConversionRequest {
    pub fn new(source: SourceUrl, quality: AudioQuality) -> Self {
        Self { source, quality }
    }
}
