use std::fmt;

/// Target MP3 bitrate. Anything outside the supported set falls back to 192 kbps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioQuality {
    Kbps128,
    #[default]
    Kbps192,
    Kbps256,
    Kbps320,
}

impl AudioQuality {
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector.map(str::trim) {
            Some("128") => AudioQuality::Kbps128,
            Some("192") => AudioQuality::Kbps192,
            Some("256") => AudioQuality::Kbps256,
            Some("320") => AudioQuality::Kbps320,
            _ => AudioQuality::default(),
        }
    }

    pub fn kbps(&self) -> u32 {
        match self {
            AudioQuality::Kbps128 => 128,
            AudioQuality::Kbps192 => 192,
            AudioQuality::Kbps256 => 256,
            AudioQuality::Kbps320 => 320,
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kbps())
    }
}
