//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homee-bridge.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use homee_bridge_adapter_homee::HomeeConfig;
use homee_bridge_domain::config_entry::{ConfigEntry, EntryOptions};
use homee_bridge_domain::error::BridgeError;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hub the config entry is created for.
    pub hub: HubConfig,
    /// Recorded hub state to replay.
    pub snapshot: SnapshotConfig,
    /// Connection tuning.
    pub connection: HomeeConfig,
    /// Entry options driving classification.
    pub options: EntryOptions,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Service calls issued once the entities exist.
    pub actions: Vec<ActionConfig>,
}

/// Hub address and credentials.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Hub id, as learned through zeroconf discovery.
    pub homee_id: Option<String>,
}

/// Snapshot replay configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path of a JSON file holding an `{"all": …}` message.
    pub path: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// A platform service call against one entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionConfig {
    /// Unique id of the target entity, e.g. `3-cover`.
    pub entity: String,
    pub service: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Config {
    /// Load configuration from `homee-bridge.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homee-bridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMEE_HOST") {
            self.hub.host = val;
        }
        if let Ok(val) = std::env::var("HOMEE_USERNAME") {
            self.hub.username = val;
        }
        if let Ok(val) = std::env::var("HOMEE_PASSWORD") {
            self.hub.password = val;
        }
        if let Ok(val) = std::env::var("HOMEE_SNAPSHOT") {
            self.snapshot.path = val;
        }
        if let Ok(val) = std::env::var("HOMEE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.hub.host.trim().is_empty() {
            return Err(ConfigError::Validation("hub host must not be empty".to_string()));
        }
        if self.snapshot.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "snapshot path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the config entry the integration is set up with.
    ///
    /// # Errors
    ///
    /// Returns the entry validation error.
    pub fn entry(&self) -> Result<ConfigEntry, BridgeError> {
        let mut builder = ConfigEntry::builder()
            .host(&self.hub.host)
            .credentials(&self.hub.username, &self.hub.password)
            .options(self.options.clone());
        if let Some(homee_id) = &self.hub.homee_id {
            builder = builder.homee_id(homee_id);
        }
        builder.build()
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: "homee.local".to_string(),
            username: String::new(),
            password: String::new(),
            homee_id: None,
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: "homee-snapshot.json".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homee_inspect=info,homee_bridge=info".to_string(),
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

#[cfg(test)]
mod tests {
    use homee_bridge_domain::config_entry::LightGrouping;
    use homee_bridge_domain::id::GroupId;

    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.hub.host, "homee.local");
        assert_eq!(config.snapshot.path, "homee-snapshot.json");
        assert_eq!(config.connection.connect_timeout_secs, 30);
        assert!(config.actions.is_empty());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.hub.host, "homee.local");
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [hub]
            host = '192.168.1.20'
            username = 'admin'
            password = 'secret'
            homee_id = 'aabbccddeeff'

            [snapshot]
            path = 'fixtures/all.json'

            [connection]
            connect_timeout_secs = 5

            [options]
            window_groups = [3]
            add_homee_data = true
            light_grouping = 'instance'

            [logging]
            filter = 'debug'

            [[actions]]
            entity = '3-cover'
            service = 'set_cover_position'
            data = { position = 40 }
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.hub.host, "192.168.1.20");
        assert_eq!(config.hub.homee_id.as_deref(), Some("aabbccddeeff"));
        assert_eq!(config.snapshot.path, "fixtures/all.json");
        assert_eq!(config.connection.connect_timeout_secs, 5);
        assert_eq!(config.options.window_groups, vec![GroupId(3)]);
        assert!(config.options.add_homee_data);
        assert_eq!(config.options.light_grouping, LightGrouping::Instance);
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.actions.len(), 1);
        assert_eq!(config.actions[0].data["position"], 40);
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.hub.host, "homee.local");
    }

    #[test]
    fn should_reject_empty_host() {
        let mut config = Config::default();
        config.hub.host = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_reject_empty_snapshot_path() {
        let mut config = Config::default();
        config.snapshot.path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_build_entry_from_hub_section() {
        let mut config = Config::default();
        config.hub.homee_id = Some("aabbccddeeff".to_string());
        let entry = config.entry().unwrap();
        assert_eq!(entry.data.host, "homee.local");
        assert_eq!(entry.unique_id(), "aabbccddeeff");
        assert_eq!(entry.title, "homee cube at homee.local");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
