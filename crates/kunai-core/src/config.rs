use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigBuilder, FileFormat, builder::DefaultState};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub scheduler: SchedulerConfig,
    pub parser: ParserConfig,
    pub timezone: TimezoneConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Reminder polling.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub poll_interval_secs: u64,
    pub lead_time_minutes: i64,
    /// How far past its start an occurrence may be and still get a reminder.
    pub catch_up_secs: i64,
    /// Chat webhook receiving reminder notices. Reminders are only logged when unset.
    pub webhook_url: Option<String>,
}

impl SchedulerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    #[must_use]
    pub fn lead_time(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::try_minutes(self.lead_time_minutes.max(0)).unwrap_or(chrono::TimeDelta::MAX)
    }

    #[must_use]
    pub fn catch_up(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::try_seconds(self.catch_up_secs.max(0)).unwrap_or(chrono::TimeDelta::MAX)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParserConfig {
    /// `next_hour` or a fixed `HH:MM` used when a request names no time.
    pub default_time: String,
    pub placeholder_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimezoneConfig {
    pub default: String,
    /// JSON file backing user timezone preferences. In-memory only when unset.
    pub store_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub clear_confirmation_ttl_secs: i64,
    pub draft_ttl_secs: i64,
}

impl RegistryConfig {
    #[must_use]
    pub fn clear_confirmation_ttl(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.clear_confirmation_ttl_secs.max(1))
    }

    #[must_use]
    pub fn draft_ttl(&self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.draft_ttl_secs.max(1))
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8699)?
        .set_default("logging.level", "debug")?
        .set_default("scheduler.enabled", true)?
        .set_default("scheduler.poll_interval_secs", 45)?
        .set_default("scheduler.lead_time_minutes", 15)?
        .set_default("scheduler.catch_up_secs", 60)?
        .set_default("parser.default_time", "next_hour")?
        .set_default("parser.placeholder_title", crate::constants::PLACEHOLDER_TITLE)?
        .set_default("timezone.default", "UTC")?
        .set_default("registry.clear_confirmation_ttl_secs", 120)?
        .set_default("registry.draft_ttl_secs", 900)?)
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables (`KUNAI__SECTION__KEY`) take precedence over `config.toml`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(with_defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env file
            .add_source(
                config::Environment::with_prefix("KUNAI")
                    .prefix_separator("__")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Built-in defaults with no external sources.
    ///
    /// ## Errors
    /// Returns an error if the defaults fail to deserialize.
    pub fn defaults() -> Result<Self> {
        Ok(with_defaults()?.build()?.try_deserialize::<Settings>()?)
    }

    /// ## Summary
    /// Defaults overlaid with an inline TOML document.
    ///
    /// ## Errors
    /// Returns an error if the TOML is invalid or does not deserialize.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(with_defaults()?
            .add_source(config::File::from_str(contents, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    Settings::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_deserialize() {
        let settings = Settings::defaults().expect("defaults are valid");
        assert_eq!(settings.server.bind_addr(), "0.0.0.0:8699");
        assert!(settings.scheduler.enabled);
        assert_eq!(settings.scheduler.poll_interval(), Duration::from_secs(45));
        assert_eq!(settings.scheduler.lead_time(), chrono::TimeDelta::minutes(15));
        assert_eq!(settings.parser.default_time, "next_hour");
        assert_eq!(settings.parser.placeholder_title, "Meeting");
        assert_eq!(settings.timezone.default, "UTC");
        assert!(settings.timezone.store_path.is_none());
        assert!(settings.scheduler.webhook_url.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let settings = Settings::from_toml(
            r#"
            [scheduler]
            enabled = false
            lead_time_minutes = 5

            [timezone]
            default = "Europe/Berlin"
            store_path = "timezones.json"
            "#,
        )
        .expect("valid toml");

        assert!(!settings.scheduler.enabled);
        assert_eq!(settings.scheduler.lead_time(), chrono::TimeDelta::minutes(5));
        assert_eq!(settings.scheduler.poll_interval_secs, 45);
        assert_eq!(settings.timezone.default, "Europe/Berlin");
        assert_eq!(settings.timezone.store_path.as_deref(), Some("timezones.json"));
    }

    #[test]
    fn negative_durations_clamp() {
        let settings = Settings::from_toml(
            r"
            [scheduler]
            lead_time_minutes = -3
            poll_interval_secs = 0
            ",
        )
        .expect("valid toml");

        assert_eq!(settings.scheduler.lead_time(), chrono::TimeDelta::zero());
        assert_eq!(settings.scheduler.poll_interval(), Duration::from_secs(1));
    }
}
