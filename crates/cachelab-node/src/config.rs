//! Node configuration.
//!
//! Sources are layered in order: built-in defaults, an optional YAML file,
//! then `CACHELAB__*` environment variables. Command-line flags are applied
//! on top by the binary.

use crate::observability::LogFormat;
use cachelab_core::{ServiceConfig, DEFAULT_INITIAL_CONTENT};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Prefix for environment overrides, e.g. `CACHELAB__MAX_AGE_SECONDS=60`.
pub const ENV_PREFIX: &str = "CACHELAB";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] cachelab_core::Error),
    #[error("unknown log level: {0}")]
    LogLevel(String),
}

/// Configuration for the Cachelab node.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP listen address.
    pub api_addr: SocketAddr,
    /// Log level.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
    /// TTL advertised by the max-age endpoints.
    pub max_age_seconds: u64,
    /// Resolution of Last-Modified dates, in seconds.
    pub last_modified_granularity_secs: u64,
    /// Content of the resource at startup.
    pub initial_content: String,
    /// Fewest filler sentences per payload.
    pub payload_min_repeats: usize,
    /// Most filler sentences per payload, at most `MAX_FILLER_REPEATS`.
    pub payload_max_repeats: usize,
    /// Allow cross-origin requests from any origin.
    pub cors_allow_any: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            api_addr: SocketAddr::from(([127, 0, 0, 1], 3100)),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            max_age_seconds: 30,
            last_modified_granularity_secs: 60,
            initial_content: DEFAULT_INITIAL_CONTENT.to_string(),
            payload_min_repeats: 1,
            payload_max_repeats: 3,
            cors_allow_any: true,
        }
    }
}

impl NodeConfig {
    /// Loads configuration from defaults, `path` and the process environment.
    ///
    /// A missing file is an error only when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self, ConfigError> {
        Self::load_with_env(path, required, None)
    }

    /// Like [`NodeConfig::load`], reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: &Path,
        required: bool,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(required),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values the loaders cannot check by type alone.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::LogLevel(self.log_level.clone()));
        }
        self.service_config().validate()?;
        Ok(())
    }

    /// Derives the caching service configuration.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            initial_content: self.initial_content.clone(),
            last_modified_granularity: Duration::from_secs(self.last_modified_granularity_secs),
            filler_min_repeats: self.payload_min_repeats,
            filler_max_repeats: self.payload_max_repeats,
        }
    }

    /// Renders the effective configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults_without_file() {
        let config =
            NodeConfig::load_with_env(Path::new("does-not-exist.yaml"), false, no_env()).unwrap();
        assert_eq!(config, NodeConfig::default());
        assert_eq!(config.max_age_seconds, 30);
        assert_eq!(config.initial_content, "Initial content");
    }

    #[test]
    fn test_required_file_missing() {
        let result = NodeConfig::load_with_env(Path::new("does-not-exist.yaml"), true, no_env());
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "api_addr: 0.0.0.0:8080\nmax_age_seconds: 120\nlog_format: json\ninitial_content: hello"
        )
        .unwrap();

        let config = NodeConfig::load_with_env(file.path(), true, no_env()).unwrap();
        assert_eq!(config.api_addr.port(), 8080);
        assert_eq!(config.max_age_seconds, 120);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.initial_content, "hello");
        assert_eq!(config.last_modified_granularity_secs, 60);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "max_age_seconds: 120").unwrap();

        let env = HashMap::from([
            ("CACHELAB__MAX_AGE_SECONDS".to_string(), "5".to_string()),
            ("CACHELAB__CORS_ALLOW_ANY".to_string(), "false".to_string()),
        ]);
        let config = NodeConfig::load_with_env(file.path(), true, Some(env)).unwrap();
        assert_eq!(config.max_age_seconds, 5);
        assert!(!config.cors_allow_any);
    }

    #[test]
    fn test_invalid_granularity_rejected() {
        let env = HashMap::from([(
            "CACHELAB__LAST_MODIFIED_GRANULARITY_SECS".to_string(),
            "0".to_string(),
        )]);
        let result = NodeConfig::load_with_env(Path::new("does-not-exist.yaml"), false, Some(env));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let config = NodeConfig {
            payload_max_repeats: cachelab_core::MAX_FILLER_REPEATS + 1,
            ..NodeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid(cachelab_core::Error::InvalidInput { .. }))
        ));

        let env = HashMap::from([(
            "CACHELAB__PAYLOAD_MAX_REPEATS".to_string(),
            usize::MAX.to_string(),
        )]);
        let result = NodeConfig::load_with_env(Path::new("does-not-exist.yaml"), false, Some(env));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = NodeConfig {
            log_level: "loud".into(),
            ..NodeConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::LogLevel(_))));
    }

    #[test]
    fn test_yaml_dump_roundtrips() {
        let yaml = NodeConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("max_age_seconds: 30"));
        let parsed: NodeConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, NodeConfig::default());
    }
}
