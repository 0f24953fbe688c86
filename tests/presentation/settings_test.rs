use std::time::Duration;

use tonearm::presentation::{Environment, JobSettings, Settings, SettingsError};

#[test]
fn given_no_overrides_when_using_defaults_then_documented_values_apply() {
    let settings = Settings::default();

    assert_eq!(settings.server.port, 8080);
    assert_eq!(settings.jobs.ttl(), Duration::from_secs(3600));
    assert_eq!(settings.jobs.sweep_interval(), Duration::from_secs(300));
    assert_eq!(settings.jobs.conversion_timeout(), Duration::from_secs(300));
    assert_eq!(settings.jobs.metadata_timeout(), Duration::from_secs(60));
    assert_eq!(settings.jobs.conversion_slots, 1);
    assert_eq!(settings.jobs.metadata_slots, 2);
    assert_eq!(settings.jobs.chunk_size, 8192);
    assert!(settings.validate().is_ok());
}

#[test]
fn given_zero_conversion_slots_when_validating_then_rejected() {
    let settings = Settings {
        jobs: JobSettings {
            conversion_slots: 0,
            ..JobSettings::default()
        },
        ..Settings::default()
    };

    assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));
}

#[test]
fn given_tool_settings_when_converting_then_tool_config_matches() {
    let settings = Settings::default();

    let config = settings.tool.to_tool_config();

    assert_eq!(config.retries, 3);
    assert_eq!(config.retry_sleep, "exp=1:10");
    assert!(config.newline_progress);
}

#[test]
fn given_environment_names_when_parsing_then_aliases_are_accepted() {
    assert_eq!(
        Environment::try_from("production".to_string()),
        Ok(Environment::Prod)
    );
    assert_eq!(
        Environment::try_from("Development".to_string()),
        Ok(Environment::Local)
    );
    assert!(Environment::try_from("staging".to_string()).is_err());
    assert_eq!(Environment::Test.settings_file(), "appsettings.test");
}

#[test]
fn given_settings_when_building_tracing_config_then_logging_section_is_used() {
    let mut settings = Settings::default();
    settings.logging.json = true;
    settings.logging.level = "warn".to_string();

    let tracing = settings.tracing_config(Environment::Prod);

    assert!(tracing.json_format);
    assert_eq!(tracing.default_level, "warn");
    assert_eq!(tracing.environment, "prod");
}
