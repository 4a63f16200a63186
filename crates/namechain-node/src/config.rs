//! Node configuration types
//!
//! Loaded from an optional TOML file, then overridden by environment
//! variables such as `NAMECHAIN__PROTOCOL__EPOCHS__EPOCH_BLOCK_LENGTH=720`.

use anyhow::Context;
use namechain_core::ProtocolSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "NAMECHAIN";

/// Complete node configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Protocol tunables every replica must agree on
    #[serde(default)]
    pub protocol: ProtocolSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Load configuration from `path` (if it exists) and the environment
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read node configuration")?;

        let node_config: NodeConfig = settings
            .try_deserialize()
            .context("invalid node configuration")?;
        node_config.validate()?;

        tracing::debug!(
            epoch_block_length = node_config.protocol.epochs.epoch_block_length,
            max_observers = node_config.protocol.observers.max_observers_per_epoch,
            "Loaded node configuration"
        );
        Ok(node_config)
    }

    /// Reject configurations the ledger cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        self.protocol
            .validate()
            .context("invalid protocol settings")?;
        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("invalid log level: {}", self.logging.level))?;
        Ok(())
    }

    /// Render as TOML, e.g. to write out a default configuration file
    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("failed to serialize node configuration")
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format
    #[serde(default)]
    pub format: LogFormat,

    /// Color output (text format only)
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            color: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_validate() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.protocol.epochs.epoch_block_length, 720);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
[protocol.epochs]
epoch_block_length = 100

[protocol.observers]
max_observers_per_epoch = 4
"#,
        );

        let config = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.protocol.epochs.epoch_block_length, 100);
        assert_eq!(config.protocol.observers.max_observers_per_epoch, 4);
        assert_eq!(config.protocol.observers.num_sampled_blocks, 3);
        assert_eq!(config.protocol.demand.moving_avg_period_count, 7);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.protocol, ProtocolSettings::default());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let file = write_config(
            r#"
[protocol.epochs]
epoch_block_length = 0
"#,
        );
        assert!(NodeConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let mut config = NodeConfig::default();
        config.protocol.demand.period_block_count = 360;
        config.logging.format = LogFormat::Json;

        let file = write_config(&config.to_toml_string().unwrap());
        let loaded = NodeConfig::load(Some(file.path())).unwrap();
        assert_eq!(loaded.protocol.demand.period_block_count, 360);
        assert_eq!(loaded.protocol, config.protocol);
    }
}
