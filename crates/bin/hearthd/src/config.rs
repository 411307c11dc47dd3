//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hearth.toml` in the working directory unless another path is
//! given on the command line. Every field has a sensible default so the file
//! is optional. Environment variables take precedence over file values.

use std::path::Path;
use std::time::Duration;

use hearth_adapter_mqtt::MqttConfig;
use hearth_app::dispatcher::DispatchOptions;
use hearth_app::services::report_service::ReportOptions;
use hearth_domain::device::{Device, DeviceCategory};
use hearth_domain::id::{RoomId, UserId};
use hearth_domain::sensor::{Sensor, SensorKind};
use hearth_domain::time::parse_timezone;
use hearth_domain::usage::OpenIntervalPolicy;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub scheduler: SchedulerConfig,
    pub reports: ReportsConfig,
    pub mqtt: MqttSection,
    /// Devices registered at startup, keyed by feed.
    pub devices: Vec<DeviceEntry>,
    /// Sensors registered at startup, keyed by feed.
    pub sensors: Vec<SensorEntry>,
    /// Push targets of users receiving threshold alerts.
    pub notify: Vec<NotifyEntry>,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Schedule tick and outbound actuation limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub tick_seconds: u64,
    pub max_concurrent_dispatch: usize,
    pub dispatch_timeout_ms: u64,
}

/// Report bucketing.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// IANA timezone calendar days are computed in.
    pub timezone: String,
    /// How far before a report window to look for the state it starts in.
    pub lookback_days: u32,
    /// Leave out intervals still running at the end of the window.
    pub exclude_open_intervals: bool,
}

/// The `[mqtt]` section: the client settings plus an on/off switch.
///
/// When disabled, the daemon runs against simulated devices.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MqttSection {
    pub enabled: bool,
    #[serde(flatten)]
    pub client: MqttConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub feed_key: String,
    #[serde(default)]
    pub category: DeviceCategory,
    pub room: RoomId,
    pub owner: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorEntry {
    pub name: String,
    pub feed_key: String,
    #[serde(default)]
    pub kind: SensorKind,
    pub room: RoomId,
    pub owner: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyEntry {
    pub user: UserId,
    pub target: String,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("HEARTH_DATABASE_URL") {
            self.database.url = val;
        }
        if let Some(val) = lookup("HEARTH_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("HEARTH_TIMEZONE") {
            self.reports.timezone = val;
        }
        if let Some(tick) = lookup("HEARTH_TICK_SECONDS").and_then(|v| v.parse().ok()) {
            self.scheduler.tick_seconds = tick;
        }
        if let Some(enabled) = lookup("HEARTH_MQTT_ENABLED").and_then(|v| v.parse().ok()) {
            self.mqtt.enabled = enabled;
        }
        if let Some(val) = lookup("HEARTH_MQTT_HOST") {
            self.mqtt.client.host = val;
        }
        if let Some(port) = lookup("HEARTH_MQTT_PORT").and_then(|v| v.parse().ok()) {
            self.mqtt.client.port = port;
        }
        if let Some(val) = lookup("HEARTH_MQTT_USERNAME") {
            self.mqtt.client.username = Some(val);
        }
        if let Some(val) = lookup("HEARTH_MQTT_PASSWORD") {
            self.mqtt.client.password = Some(val);
        }
        if let Some(val) = lookup("HEARTH_FEED_PREFIX") {
            self.mqtt.client.feed_prefix = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_seconds == 0 {
            return Err(ConfigError::Validation(
                "scheduler.tick_seconds must be non-zero".to_string(),
            ));
        }
        if self.scheduler.max_concurrent_dispatch == 0 {
            return Err(ConfigError::Validation(
                "scheduler.max_concurrent_dispatch must be non-zero".to_string(),
            ));
        }
        if self.scheduler.dispatch_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "scheduler.dispatch_timeout_ms must be non-zero".to_string(),
            ));
        }
        parse_timezone(&self.reports.timezone)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        if self.mqtt.enabled && self.mqtt.client.client_id.is_empty() {
            return Err(ConfigError::Validation(
                "mqtt.client_id must not be empty".to_string(),
            ));
        }

        let mut feeds = std::collections::HashSet::new();
        for feed_key in self
            .devices
            .iter()
            .map(|d| &d.feed_key)
            .chain(self.sensors.iter().map(|s| &s.feed_key))
        {
            if !feeds.insert(feed_key) {
                return Err(ConfigError::Validation(format!(
                    "feed {feed_key:?} is registered twice"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_seconds)
    }

    #[must_use]
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions {
            max_concurrent: self.scheduler.max_concurrent_dispatch,
            timeout: Duration::from_millis(self.scheduler.dispatch_timeout_ms),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the report timezone is unknown.
    pub fn report_options(&self) -> Result<ReportOptions, ConfigError> {
        let timezone = parse_timezone(&self.reports.timezone)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        let open_intervals = if self.reports.exclude_open_intervals {
            OpenIntervalPolicy::Exclude
        } else {
            OpenIntervalPolicy::CloseAtBoundary
        };
        Ok(ReportOptions {
            timezone,
            open_intervals,
            lookback: chrono::Duration::days(i64::from(self.reports.lookback_days)),
        })
    }
}

impl DeviceEntry {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty name.
    pub fn to_device(&self) -> Result<Device, ConfigError> {
        Device::builder()
            .name(&self.name)
            .feed_key(&self.feed_key)
            .category(self.category)
            .room_id(self.room)
            .owner(self.owner)
            .build()
            .map_err(|err| ConfigError::Validation(format!("device {:?}: {err}", self.feed_key)))
    }
}

impl SensorEntry {
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for an empty name.
    pub fn to_sensor(&self) -> Result<Sensor, ConfigError> {
        Sensor::builder()
            .name(&self.name)
            .feed_key(&self.feed_key)
            .kind(self.kind)
            .room_id(self.room)
            .owner(self.owner)
            .build()
            .map_err(|err| ConfigError::Validation(format!("sensor {:?}: {err}", self.feed_key)))
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:hearth.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hearthd=info,hearth=info".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        let dispatch = DispatchOptions::default();
        Self {
            tick_seconds: 30,
            max_concurrent_dispatch: dispatch.max_concurrent,
            dispatch_timeout_ms: u64::try_from(dispatch.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            lookback_days: 7,
            exclude_open_intervals: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
