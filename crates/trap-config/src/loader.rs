// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for the OPC UA listener.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw text
//! 3. Deserialize into [`ListenerConfig`] (legacy tag lists collapse here)
//! 4. Validate
//!
//! # Environment Placeholders
//!
//! ```text
//! endpoint = "${OPCUA_ENDPOINT:opc.tcp://localhost:4840}"
//! ```

use std::env;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use trap_opcua_listener::ListenerConfig;

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use trap_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("listener.toml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Whether to resolve environment placeholders.
    resolve_env_vars: bool,

    /// Whether an unset variable without default is an error.
    strict_env: bool,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            resolve_env_vars: true,
            strict_env: false,
        }
    }

    /// Enables or disables environment placeholder resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Fails on unset variables without a default instead of keeping the
    /// placeholder.
    pub fn with_strict_env(mut self, strict: bool) -> Self {
        self.strict_env = strict;
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension:
    /// - `.yaml` or `.yml` - YAML format
    /// - `.toml` - TOML format
    /// - `.json` - JSON format
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<ListenerConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let format = ConfigFormat::from_path(path)?;
        let content = self.read_file(path)?;

        let config = self.parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        config.validate()?;

        info!("Configuration loaded successfully");
        debug!(
            endpoint = %config.endpoint,
            nodes = config.nodes.len(),
            groups = config.groups.len(),
            event_groups = config.event_groups.len(),
            "Listener configuration"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(
        &self,
        content: &str,
        format: ConfigFormat,
    ) -> ConfigResult<ListenerConfig> {
        let config = self.parse_str(content, format)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads file content.
    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    /// Resolves placeholders and deserializes.
    fn parse_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<ListenerConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)?
        } else {
            content.to_string()
        };

        match format {
            ConfigFormat::Yaml => yaml_parse(&content),
            ConfigFormat::Toml => {
                toml::from_str(&content).map_err(|e| ConfigError::serialization(e.to_string()))
            }
            ConfigFormat::Json => serde_json::from_str(&content)
                .map_err(|e| ConfigError::serialization(e.to_string())),
        }
    }

    /// Resolves environment variable placeholders in content.
    ///
    /// Supports the format: `${VAR_NAME}` or `${VAR_NAME:default}`. The
    /// default runs to the closing brace and may itself contain colons.
    fn resolve_env_placeholders(&self, content: &str) -> ConfigResult<String> {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                // No closing brace, keep as-is
                result.push_str(&rest[start..]);
                return Ok(result);
            };

            let inner = &after[..end];
            let (name, default) = match inner.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (inner, None),
            };

            match (env::var(name), default) {
                (Ok(value), _) => result.push_str(&value),
                (Err(_), Some(default)) => result.push_str(default),
                (Err(_), None) if self.strict_env => {
                    return Err(ConfigError::env_var_not_found(name));
                }
                (Err(_), None) => {
                    warn!("Environment variable '{}' not found", name);
                    result.push_str(&rest[start..start + 2 + end + 1]);
                }
            }

            rest = &after[end + 1..];
        }

        result.push_str(rest);
        Ok(result)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

/// YAML parsing through the config crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
///
/// # Examples
///
/// ```no_run
/// use trap_config::loader::load_config;
///
/// let config = load_config("listener.toml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ListenerConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<ListenerConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use trap_opcua_listener::{ConnectFailBehavior, TimestampSource};

    const TOML: &str = r#"
endpoint = "opc.tcp://localhost:4840"
name = "plant"
subscription_interval = "250ms"
connect_fail_behavior = "retry"
timestamp = "server"

[[nodes]]
name = "temp"
namespace = "3"
identifier_type = "s"
identifier = "Temperature"
tags = [["unit", "C"]]

[[groups]]
name = "line1"
namespace = "2"
identifier_type = "i"
default_tags = { site = "north" }

[[groups.nodes]]
name = "speed"
identifier = "1001"
"#;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml() {
        let file = write_temp(".toml", TOML);
        let config = ConfigLoader::new().load(file.path()).unwrap();

        assert_eq!(config.name, "plant");
        assert_eq!(config.subscription_interval, Duration::from_millis(250));
        assert_eq!(config.connect_fail_behavior, ConnectFailBehavior::Retry);
        assert_eq!(config.timestamp, TimestampSource::Server);
        assert_eq!(config.nodes[0].tags.get("unit").map(String::as_str), Some("C"));
        assert_eq!(config.groups[0].nodes.len(), 1);
        assert_eq!(config.groups[0].tags.get("site").map(String::as_str), Some("north"));
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
endpoint: opc.tcp://localhost:4840
nodes:
  - name: temp
    namespace: "3"
    identifier_type: s
    identifier: Temperature
"#;
        let file = write_temp(".yaml", yaml);
        let config = ConfigLoader::new().load(file.path()).unwrap();

        assert_eq!(config.endpoint, "opc.tcp://localhost:4840");
        assert_eq!(config.name, "opcua_listener");
        assert_eq!(config.channel_capacity, 100);
        assert_eq!(config.nodes[0].identifier, "Temperature");
    }

    #[test]
    fn test_load_json() {
        let json = r#"{
            "endpoint": "opc.tcp://localhost:4840",
            "event_groups": [{
                "event_type": "i=2041",
                "node_ids": ["i=2253"],
                "fields": ["Severity", "Message"],
                "sampling_interval": "1s"
            }]
        }"#;
        let file = write_temp(".json", json);
        let config = ConfigLoader::new().load(file.path()).unwrap();
        assert_eq!(config.event_groups[0].fields.len(), 2);
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("listener.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("listener.TOML")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("listener.ini")).is_err());
        assert!(ConfigFormat::from_path(Path::new("listener")).is_err());
    }

    #[test]
    fn test_env_placeholder_with_default() {
        let loader = ConfigLoader::new();
        let result = loader
            .resolve_env_placeholders("endpoint = \"${TRAP_TEST_UNSET_ENDPOINT:opc.tcp://h:4840}\"")
            .unwrap();
        assert_eq!(result, "endpoint = \"opc.tcp://h:4840\"");
    }

    #[test]
    fn test_env_placeholder_missing() {
        let content = "a = \"${TRAP_TEST_UNSET_VAR}\" b";
        let lenient = ConfigLoader::new().resolve_env_placeholders(content).unwrap();
        assert_eq!(lenient, content);

        let strict = ConfigLoader::new()
            .with_strict_env(true)
            .resolve_env_placeholders(content);
        assert!(matches!(strict, Err(ConfigError::EnvVarNotFound { .. })));
    }

    #[test]
    fn test_unterminated_placeholder_kept() {
        let result = ConfigLoader::new()
            .resolve_env_placeholders("x ${OPEN")
            .unwrap();
        assert_eq!(result, "x ${OPEN");
    }

    #[test]
    fn test_validation_error() {
        let err = load_config_str("endpoint = \"opc.tcp://h:4840\"", ConfigFormat::Toml)
            .unwrap_err();
        match err {
            ConfigError::Validation { message, .. } => {
                assert!(message.contains("no groups or root nodes or event groups"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_bad_legacy_tags_is_parse_error() {
        let toml = r#"
endpoint = "opc.tcp://h:4840"

[[nodes]]
name = "temp"
namespace = "3"
identifier_type = "s"
identifier = "Temperature"
tags = [["unit"]]
"#;
        let file = write_temp(".toml", toml);
        let err = ConfigLoader::new().load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("needs 2 values"));
    }

    #[test]
    fn test_file_not_found() {
        let err = load_config("/nonexistent/listener.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
