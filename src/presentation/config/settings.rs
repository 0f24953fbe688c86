use std::path::PathBuf;
use std::time::Duration;

use ::config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;
use crate::infrastructure::media_tool::YtDlpConfig;
use crate::infrastructure::observability::TracingConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub jobs: JobSettings,
    pub tool: ToolSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    pub ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub scratch_root: PathBuf,
    pub conversion_timeout_secs: u64,
    pub metadata_timeout_secs: u64,
    pub conversion_slots: usize,
    pub metadata_slots: usize,
    pub chunk_size: usize,
}

impl JobSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn conversion_timeout(&self) -> Duration {
        Duration::from_secs(self.conversion_timeout_secs)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            sweep_interval_secs: 300,
            scratch_root: std::env::temp_dir().join("tonearm-jobs"),
            conversion_timeout_secs: 300,
            metadata_timeout_secs: 60,
            conversion_slots: 1,
            metadata_slots: 2,
            chunk_size: 8192,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub binary: PathBuf,
    pub cookies_file: Option<PathBuf>,
    pub remote_components: Option<String>,
    pub retries: u32,
    pub retry_sleep: String,
    pub socket_timeout_secs: u64,
    pub stream_progress: bool,
}

impl ToolSettings {
    pub fn to_tool_config(&self) -> YtDlpConfig {
        YtDlpConfig {
            binary: self.binary.clone(),
            cookies_file: self.cookies_file.clone(),
            remote_components: self.remote_components.clone(),
            retries: self.retries,
            retry_sleep: self.retry_sleep.clone(),
            socket_timeout_secs: self.socket_timeout_secs,
            newline_progress: self.stream_progress,
        }
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        let tool = YtDlpConfig::default();
        Self {
            binary: tool.binary,
            cookies_file: tool.cookies_file,
            remote_components: tool.remote_components,
            retries: tool.retries,
            retry_sleep: tool.retry_sleep,
            socket_timeout_secs: tool.socket_timeout_secs,
            stream_progress: tool.newline_progress,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Settings {
    /// Defaults, then `appsettings.<env>` if present, then `APP__SECTION__KEY` variables.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        let environment = Environment::from_env().map_err(SettingsError::Invalid)?;
        Self::load_for(environment)
    }

    pub fn load_for(environment: Environment) -> Result<Self, SettingsError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(&environment.settings_file()).required(false))
            .add_source(
                ::config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let jobs = &self.jobs;
        if jobs.conversion_slots == 0 || jobs.metadata_slots == 0 {
            return Err(SettingsError::Invalid(
                "gate slot counts must be at least 1".to_string(),
            ));
        }
        if jobs.chunk_size == 0 {
            return Err(SettingsError::Invalid("chunk_size must be positive".into()));
        }
        if jobs.conversion_timeout_secs == 0 || jobs.metadata_timeout_secs == 0 {
            return Err(SettingsError::Invalid("timeouts must be positive".into()));
        }
        if jobs.sweep_interval_secs == 0 {
            return Err(SettingsError::Invalid(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tracing_config(&self, environment: Environment) -> TracingConfig {
        TracingConfig {
            environment: environment.to_string(),
            json_format: self.logging.json,
            default_level: self.logging.level.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid settings: {0}")]
    Invalid(String),
}
