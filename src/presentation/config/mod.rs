mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    JobSettings, LoggingSettings, ServerSettings, Settings, SettingsError, ToolSettings,
};
