//! Command-line configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via DFAWALK_CONFIG)
//! 3. Environment variables
//!
//! Command-line flags are applied on top by `main`.

use dfawalk_core::{presets, AutomatonDefinition, CoreError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which automaton to run.
    pub definition: DefinitionConfig,
    /// Output rendering.
    pub output: OutputConfig,
    /// Interactive session settings.
    pub repl: ReplConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DFAWALK_CONFIG") {
            config = Self::from_file(&path)?;
        }

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.definition.apply_env_overrides();
        self.output.apply_env_overrides();
        self.repl.apply_env_overrides();
    }

    /// Checks settings that can be verified without touching the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let preset = self.definition.preset.as_str();
        if self.definition.path.is_none() && !presets::names().contains(&preset) {
            return Err(ConfigError::Validation(format!(
                "unknown preset '{}' (available: {})",
                self.definition.preset,
                presets::names().join(", ")
            )));
        }
        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Selects the automaton definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionConfig {
    /// Bundled preset used when no path is set.
    pub preset: String,
    /// Definition file (JSON or YAML); takes precedence over `preset`.
    pub path: Option<PathBuf>,
}

impl Default for DefinitionConfig {
    fn default() -> Self {
        Self {
            preset: presets::MEN_WOMEN.to_string(),
            path: None,
        }
    }
}

impl DefinitionConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(preset) = std::env::var("DFAWALK_PRESET") {
            if !preset.is_empty() {
                self.preset = preset;
            }
        }

        if let Ok(path) = std::env::var("DFAWALK_DEFINITION") {
            if !path.is_empty() {
                self.path = Some(PathBuf::from(path));
            }
        }
    }

    /// Loads the configured definition.
    pub fn load(&self) -> Result<AutomatonDefinition, CoreError> {
        match &self.path {
            Some(path) => AutomatonDefinition::from_path(path),
            None => presets::by_name(&self.preset),
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Human-readable log lines.
    #[default]
    Text,
    /// One JSON document per command.
    Json,
}

/// Output rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Colorize text output.
    pub color: bool,
    /// Print a line for every processed symbol, not only state changes.
    pub show_index_changes: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            color: true,
            show_index_changes: true,
        }
    }
}

impl OutputConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(format) = std::env::var("DFAWALK_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.format = OutputFormat::Json,
                "text" => self.format = OutputFormat::Text,
                other => tracing::warn!("ignoring unknown DFAWALK_FORMAT '{}'", other),
            }
        }

        if let Ok(color) = std::env::var("DFAWALK_COLOR") {
            self.color = color == "1" || color.to_lowercase() == "true";
        }

        if let Ok(show) = std::env::var("DFAWALK_SHOW_INDEX_CHANGES") {
            self.show_index_changes = show == "1" || show.to_lowercase() == "true";
        }
    }
}

/// REPL configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// History file; `None` disables persistent history.
    pub history_file: Option<PathBuf>,
    pub prompt: String,
}

impl Default for ReplConfig {
    fn default() -> Self {
        let history_file = std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".dfawalk_history"))
            .unwrap_or_else(|_| PathBuf::from(".dfawalk_history"));
        Self {
            history_file: Some(history_file),
            prompt: "dfawalk>".to_string(),
        }
    }
}

impl ReplConfig {
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("DFAWALK_HISTORY") {
            self.history_file = if path.is_empty() {
                None
            } else {
                Some(PathBuf::from(path))
            };
        }
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {1}", path = .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{path}': {1}", path = .0.display())]
    Parse(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.definition.preset, "men-women");
        assert!(config.definition.path.is_none());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert!(config.output.show_index_changes);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_preset_fails_validation() {
        let mut config = Config::default();
        config.definition.preset = "nfa".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));

        // A definition path makes the preset irrelevant
        config.definition.path = Some(PathBuf::from("custom.yaml"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_roundtrip() {
        let mut config = Config::default();
        config.output.format = OutputFormat::Json;
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.output.format, OutputFormat::Json);
        assert_eq!(parsed.repl.prompt, config.repl.prompt);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dfawalk.yaml");
        std::fs::write(&path, "output:\n  color: false\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert!(!config.output.color);
        assert!(config.output.show_index_changes);
        assert_eq!(config.definition.preset, "men-women");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("saved.yaml");
        let mut config = Config::default();
        config.definition.preset = "single-state".to_string();
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.definition.preset, "single-state");
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/dfawalk.yaml");
        assert!(matches!(result, Err(ConfigError::Io(..))));
    }

    #[test]
    fn test_definition_config_loads_preset() {
        let def = DefinitionConfig::default().load().unwrap();
        assert_eq!(def.name(), "men-women");
    }
}
