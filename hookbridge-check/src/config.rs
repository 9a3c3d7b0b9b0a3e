//! Configuration file loading and management
//!
//! This module handles loading and parsing the checker configuration from
//! `$XDG_CONFIG_HOME/hookbridge/config.toml`. If the configuration file doesn't
//! exist, a default configuration is created with documented comments.

use anyhow::{Context, Result};
use hookbridge_runtime::SecurityPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main checker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Hook security policy
    #[serde(default)]
    pub policy: SecurityPolicy,
    /// Method metadata location
    #[serde(default)]
    pub metadata: MetadataConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Method metadata configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataConfig {
    /// Directory of `*.toml` metadata tables
    /// If None, uses XDG_DATA_HOME/hookbridge/metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    /// Default: "info"
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the specified path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default XDG config location
    ///
    /// If the configuration file doesn't exist, creates a default configuration
    /// file with documented comments.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_file(&config_path)?;
        }

        Self::load(&config_path)
    }

    /// Get the default configuration file path
    ///
    /// Returns `$XDG_CONFIG_HOME/hookbridge/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "hookbridge")
            .context("Failed to determine project directories")?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Create a default configuration file with documented comments
    pub fn create_default_file(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, Self::default_config_content())
            .with_context(|| format!("Failed to write default config file: {}", path.display()))?;

        tracing::info!("Created default configuration file at: {}", path.display());
        Ok(())
    }

    /// Generate the default configuration file content with comments
    pub fn default_config_content() -> String {
        r#"# hookbridge Configuration
# This file configures hook admission for hookbridge-check.

[policy]
# Namespace prefixes that may never be hooked. An entry covers the
# namespace itself and every namespace nested under it, so "System"
# covers "System.IO" but not "SystemExtras".
# Default: ["ETGMod", "System", "TexMod"]
denied_namespaces = ["ETGMod", "System", "TexMod"]

# Individual methods that may never be hooked, as "Namespace.Type::Method".
# Default: []
denied_methods = []

[metadata]
# Directory of *.toml method metadata tables
# If not specified, defaults to $XDG_DATA_HOME/hookbridge/metadata
# dir = "/path/to/metadata"

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG takes precedence when set.
# Default: "info"
level = "info"
"#
        .to_string()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            anyhow::bail!(
                "Invalid logging.level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        if self
            .policy
            .denied_namespaces()
            .iter()
            .any(|ns| ns.trim().is_empty())
        {
            anyhow::bail!("policy.denied_namespaces must not contain empty entries");
        }

        if self
            .policy
            .denied_methods()
            .iter()
            .any(|m| m.trim().is_empty())
        {
            anyhow::bail!("policy.denied_methods must not contain empty entries");
        }

        Ok(())
    }

    /// Get the metadata directory
    ///
    /// Returns the configured directory or the default XDG data directory path
    pub fn metadata_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.metadata.dir {
            return Ok(dir.clone());
        }

        hookbridge_runtime::metadata_dir().context("Failed to determine project directories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hookbridge_runtime::DEFAULT_DENIED_NAMESPACES;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(config.metadata.dir.is_none());
        assert_eq!(
            config.policy.denied_namespaces(),
            DEFAULT_DENIED_NAMESPACES
        );
        assert!(config.policy.denied_methods().is_empty());
    }

    #[test]
    fn test_default_content_matches_default() {
        let config: Config = toml::from_str(&Config::default_config_content()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[policy]
denied_namespaces = ["Game.Internal"]
denied_methods = ["Game.Player::Serialize"]

[metadata]
dir = "/opt/game/metadata"

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(config_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.policy.denied_namespaces(), ["Game.Internal"]);
        assert_eq!(config.policy.denied_methods(), ["Game.Player::Serialize"]);
        assert_eq!(
            config.metadata_dir().unwrap(),
            PathBuf::from("/opt/game/metadata")
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_policy_keeps_default_namespaces() {
        let config: Config = toml::from_str(
            r#"
[policy]
denied_methods = ["Game.Player::Save"]
"#,
        )
        .unwrap();

        assert_eq!(
            config.policy.denied_namespaces(),
            DEFAULT_DENIED_NAMESPACES
        );
        assert_eq!(config.policy.denied_methods(), ["Game.Player::Save"]);
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load(temp_dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_create_default_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        Config::create_default_file(&path).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_deny_entries() {
        let mut config = Config::default();
        config.policy.deny_namespace("  ");
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.policy.deny_method("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_metadata_dir_default() {
        let config = Config::default();
        let dir = config.metadata_dir().unwrap();
        assert!(dir.to_string_lossy().contains("hookbridge"));
        assert!(dir.ends_with("metadata"));
    }
}
