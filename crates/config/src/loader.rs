//! Configuration loading from multiple sources

use crate::{ConfigError, Result, RunConfig};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Default prefix for environment overrides
pub const ENV_PREFIX: &str = "BRIDGE_PROBE";

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<RunConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), format = extension, "loading run configuration");

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<RunConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<RunConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<RunConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables
    ///
    /// Uses default prefix "BRIDGE_PROBE"
    pub fn from_env() -> Result<RunConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Sections are separated by a double underscore so that keys may keep
    /// their own underscores: PREFIX_SECTION__KEY, for example
    /// BRIDGE_PROBE_TRANSFER__AMOUNT=1000000.
    pub fn from_env_with_prefix(prefix: &str) -> Result<RunConfig> {
        let config = Config::builder()
            .add_source(env_source(prefix))
            .build()?;

        config.try_deserialize().map_err(ConfigError::from)
    }

    /// Load configuration from file with environment variable overrides
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<RunConfig> {
        Self::builder()
            .add_file(path, true)
            .add_env(env_prefix)
            .build()
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// Later sources override earlier ones key by key.
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

fn env_source(prefix: &str) -> Environment {
    Environment::with_prefix(prefix)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("accounts.senders")
        .with_list_parse_key("accounts.receivers")
        .try_parsing(true)
}

/// Builder for layered configuration loading
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml, // Default to TOML
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(env_source(prefix));
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_default(key, value)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<RunConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML: &str = r#"
        [network]
        log_level = "debug"

        [chains]
        prime = { decimals = 6 }
        vector = { decimals = 6 }
        nexus = { decimals = 18 }

        [routes]
        prime = ["vector", "nexus"]

        [accounts]
        senders = ["alice"]
        receivers = ["bob", "carol"]

        [transfer]
        amount = "1_000_000"
        repeat = 3

        [polling]
        max_attempts = 20
        interval_ms = 500
    "#;

    #[test]
    fn test_load_from_toml() {
        let config = ConfigLoader::from_toml(TOML).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert_eq!(config.chains.len(), 3);
        assert_eq!(config.chains["nexus"].decimals, 18);
        assert_eq!(config.routes["prime"].len(), 2);
        assert_eq!(config.transfer.repeat, 3);
        assert_eq!(config.polling.max_attempts, 20);
        assert_eq!(config.no_activity.max_attempts, 12);
        assert!(config.perturbation.is_none());
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
network:
  log_level: warn
  json_logs: true

chains:
  prime:
    decimals: 6
  nexus:
    decimals: 18

routes:
  nexus: [prime]

accounts:
  senders: [alice]
  receivers: [bob]

transfer:
  amount: "1000000000000000000"

no_activity:
  enabled: true

perturbation:
  stop_after_ms: 60000
  stop_validators: [0, 1]
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert!(config.network.json_logs);
        assert!(config.no_activity.enabled);
        assert_eq!(config.transfer.repeat, 1);
        assert_eq!(
            config.perturbation.unwrap().stop_validators,
            vec![0, 1]
        );
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "chains": { "prime": { "decimals": 6 }, "vector": { "decimals": 6 } },
  "routes": { "vector": ["prime"] },
  "accounts": { "senders": ["alice"], "receivers": ["bob"] },
  "transfer": { "amount": "42", "metadata": "probe" },
  "simulation": { "validators": 5, "quorum": 4, "settlement_delay_ms": 10 }
}
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.network.log_level, "info");
        assert_eq!(config.transfer.metadata.as_deref(), Some("probe"));
        assert_eq!(config.simulation.validators, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(TOML.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.network.log_level, "debug");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new()
            .suffix(".ini")
            .tempfile()
            .unwrap();

        assert!(matches!(
            ConfigLoader::from_file(file.path()),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_missing_transfer_section() {
        let toml = r#"
            [accounts]
            senders = ["alice"]
            receivers = ["bob"]
        "#;

        assert!(matches!(
            ConfigLoader::from_toml(toml),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_builder_defaults_and_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(TOML.as_bytes()).unwrap();

        let config = ConfigLoader::builder()
            .set_default("simulation.settlement_delay_ms", "25")
            .unwrap()
            .add_file(file.path(), true)
            .build()
            .unwrap();

        assert_eq!(config.simulation.settlement_delay_ms, 25);
        assert_eq!(config.transfer.amount, "1_000_000");
    }
}
