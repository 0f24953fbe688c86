use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::application::ports::{CommandSpec, MediaTool, ToolComponents};
use crate::domain::{ConversionRequest, MediaInfo, SourceUrl, TrackMetadata, UNKNOWN_FIELD};

const OUTPUT_FILE_NAME: &str = "audio.mp3";
const OUTPUT_EXTENSION: &str = "mp3";
const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub binary: PathBuf,
    pub cookies_file: Option<PathBuf>,
    /// Passed as `--remote-components`, e.g. `ejs:github`.
    pub remote_components: Option<String>,
    pub retries: u32,
    /// Backoff expression for `--retry-sleep`, e.g. `exp=1:10`.
    pub retry_sleep: String,
    pub socket_timeout_secs: u64,
    /// Ask for one progress line per update instead of carriage-return redraws.
    pub newline_progress: bool,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            cookies_file: None,
            remote_components: None,
            retries: 3,
            retry_sleep: "exp=1:10".to_string(),
            socket_timeout_secs: 30,
            newline_progress: true,
        }
    }
}

pub struct YtDlpTool {
    config: YtDlpConfig,
}

impl YtDlpTool {
    pub fn new(config: YtDlpConfig) -> Self {
        Self { config }
    }

    fn base_command(&self) -> CommandSpec {
        let mut command = CommandSpec::new(&self.config.binary);
        if let Some(components) = &self.config.remote_components {
            command = command.arg("--remote-components").arg(components);
        }
        if let Some(cookies) = &self.config.cookies_file {
            command = command
                .arg("--cookies")
                .arg(cookies.display().to_string());
        }
        command
            .arg("--no-playlist")
            .arg("--socket-timeout")
            .arg(self.config.socket_timeout_secs.to_string())
    }
}

impl MediaTool for YtDlpTool {
    fn conversion_command(&self, request: &ConversionRequest, output_path: &Path) -> CommandSpec {
        let retries = self.config.retries.to_string();
        let mut command = self
            .base_command()
            .args(["--retries", retries.as_str()])
            .args(["--fragment-retries", retries.as_str()])
            .args(["--retry-sleep", self.config.retry_sleep.as_str()])
            .arg("-x")
            .args(["--audio-format", OUTPUT_EXTENSION])
            .arg("--audio-quality")
            .arg(format!("{}K", request.quality.kbps()))
            .arg("-o")
            .arg(output_path.display().to_string())
            .arg("--print-json");
        if self.config.newline_progress {
            command = command.arg("--newline");
        }
        command.arg(request.source.as_str())
    }

    fn metadata_command(&self, source: &SourceUrl) -> CommandSpec {
        self.base_command()
            .arg("--skip-download")
            .arg("--print-json")
            .arg(source.as_str())
    }

    fn output_file_name(&self) -> &str {
        OUTPUT_FILE_NAME
    }

    fn output_extension(&self) -> &str {
        OUTPUT_EXTENSION
    }

    fn parse_track_metadata(&self, stdout: &str) -> Option<TrackMetadata> {
        let info = parse_info_line(stdout)?;
        Some(TrackMetadata {
            title: info
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            artist: info.artist().unwrap_or_else(|| UNKNOWN_FIELD.to_string()),
            duration_secs: info.duration_secs().unwrap_or(0),
        })
    }

    fn parse_media_info(&self, stdout: &str) -> Option<MediaInfo> {
        let info = parse_info_line(stdout)?;
        Some(MediaInfo {
            artist: info.artist(),
            duration: info.duration_secs(),
            description: info
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .map(|d| d.chars().take(MAX_DESCRIPTION_CHARS).collect()),
            title: info.title,
            thumbnail: info.thumbnail,
            view_count: info.view_count,
            upload_date: info.upload_date,
        })
    }

    fn progress_from_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.starts_with("[download]") && line.contains('%') {
            Some(line.to_string())
        } else if line.starts_with("[ExtractAudio]") {
            Some("Extracting audio".to_string())
        } else {
            None
        }
    }

    fn components(&self) -> ToolComponents {
        let cookies_size = self
            .config
            .cookies_file
            .as_ref()
            .and_then(|path| std::fs::metadata(path).ok())
            .map(|meta| meta.len());
        let deno_path = which::which("deno").ok();

        ToolComponents {
            tool_available: which::which(&self.config.binary).is_ok(),
            cookies_file_exists: cookies_size.is_some(),
            cookies_file_size: cookies_size.unwrap_or(0),
            deno_available: deno_path.is_some(),
            deno_path: deno_path.map(|p| p.display().to_string()),
        }
    }
}

/// The subset of the tool's `--print-json` document we read.
#[derive(Debug, Default, Deserialize)]
struct ToolInfo {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    view_count: Option<u64>,
    #[serde(default)]
    upload_date: Option<String>,
}

impl ToolInfo {
    fn artist(&self) -> Option<String> {
        self.uploader
            .iter()
            .chain(self.channel.iter())
            .find(|name| !name.is_empty())
            .cloned()
    }

    fn duration_secs(&self) -> Option<u64> {
        self.duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| d.round() as u64)
    }
}

/// The JSON document is the last non-empty line of stdout.
fn parse_info_line(stdout: &str) -> Option<ToolInfo> {
    let line = stdout.lines().rev().find(|l| !l.trim().is_empty())?;
    match serde_json::from_str::<ToolInfo>(line.trim()) {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::debug!(error = %e, "Trailing output line is not a metadata document");
            None
        }
    }
}
