//! Configuration module for rustible-tags
//!
//! Handles loading and merging configuration from multiple sources:
//! - Default values
//! - System configuration (/etc/rustible/rustible-tags.cfg)
//! - User configuration (~/.rustible-tags.cfg)
//! - Project configuration (./rustible-tags.cfg)
//! - Environment variables
//! - Command-line arguments

use crate::error::Error;
use crate::logging::{LogFormat, LogLevel, LoggingBuilder};
use crate::tags::{split_tag_string, TagFilter};
use crate::vars::MAX_VERBOSITY;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag selection defaults
    pub tags: TagsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Tag selection defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Tags to run when `--tags` is not given
    pub run: Vec<String>,

    /// Tags to skip when `--skip-tags` is not given
    pub skip: Vec<String>,

    /// Decide tasks on their own tags plus those of enclosing plays and blocks
    pub inherit: bool,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            run: Vec::new(),
            skip: Vec::new(),
            inherit: true,
        }
    }
}

/// Output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Result verbosity (0..=4)
    pub verbosity: u8,

    /// Show before/after diffs
    pub diff: bool,

    /// Colored output
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            diff: false,
            color: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,

    /// Log format
    pub format: LogFormat,

    /// Log file; stderr when unset
    pub file: Option<PathBuf>,
}

/// One configuration file as written: keys absent from the file stay `None`
/// and leave the value of lower-precedence layers untouched
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    tags: TagsLayer,
    output: OutputLayer,
    logging: LoggingLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct TagsLayer {
    run: Option<Vec<String>>,
    skip: Option<Vec<String>>,
    inherit: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct OutputLayer {
    verbosity: Option<u8>,
    diff: Option<bool>,
    color: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct LoggingLayer {
    level: Option<LogLevel>,
    format: Option<LogFormat>,
    file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from all sources
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Config::default();

        for path in Self::get_config_paths(config_path) {
            if path.exists() {
                debug!(path = %path.display(), "loading configuration");
                config = config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Get the list of configuration file paths to check, lowest precedence first
    fn get_config_paths(explicit_path: Option<&PathBuf>) -> Vec<PathBuf> {
        // Explicit path replaces every other location
        if let Some(path) = explicit_path {
            return vec![path.clone()];
        }

        let mut paths = vec![PathBuf::from("/etc/rustible/rustible-tags.cfg")];

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rustible-tags.cfg"));
        }

        paths.push(PathBuf::from("rustible-tags.cfg"));

        if let Ok(env_config) = std::env::var("RUSTIBLE_TAGS_CONFIG") {
            paths.push(PathBuf::from(env_config));
        }

        paths
    }

    /// Merge configuration from a file
    fn merge_from_file(&self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let layer: ConfigLayer = match extension {
            "yml" | "yaml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            "toml" => toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
            _ => {
                // Try TOML first (for .cfg files), then YAML
                toml::from_str(&content)
                    .or_else(|_| serde_yaml::from_str(&content))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
        };

        Ok(self.merge(layer))
    }

    /// Merge a file layer into this config; every key the layer sets wins
    fn merge(&self, layer: ConfigLayer) -> Config {
        let mut merged = self.clone();

        if let Some(run) = layer.tags.run {
            merged.tags.run = run;
        }
        if let Some(skip) = layer.tags.skip {
            merged.tags.skip = skip;
        }
        if let Some(inherit) = layer.tags.inherit {
            merged.tags.inherit = inherit;
        }

        if let Some(verbosity) = layer.output.verbosity {
            merged.output.verbosity = verbosity;
        }
        if let Some(diff) = layer.output.diff {
            merged.output.diff = diff;
        }
        if let Some(color) = layer.output.color {
            merged.output.color = color;
        }

        if let Some(level) = layer.logging.level {
            merged.logging.level = level;
        }
        if let Some(format) = layer.logging.format {
            merged.logging.format = format;
        }
        if let Some(file) = layer.logging.file {
            merged.logging.file = Some(file);
        }

        merged
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // RUSTIBLE_TAGS_RUN
        if let Ok(tags) = std::env::var("RUSTIBLE_TAGS_RUN") {
            self.tags.run = split_tag_string(&tags).map(String::from).collect();
        }

        // RUSTIBLE_TAGS_SKIP
        if let Ok(tags) = std::env::var("RUSTIBLE_TAGS_SKIP") {
            self.tags.skip = split_tag_string(&tags).map(String::from).collect();
        }

        // RUSTIBLE_VERBOSITY
        if let Ok(verbosity) = std::env::var("RUSTIBLE_VERBOSITY") {
            if let Ok(n) = verbosity.parse() {
                self.output.verbosity = n;
            }
        }

        // RUSTIBLE_LOG_LEVEL
        if let Ok(level) = std::env::var("RUSTIBLE_LOG_LEVEL") {
            if let Ok(level) = level.parse() {
                self.logging.level = level;
            }
        }

        // NO_COLOR
        if std::env::var("NO_COLOR").is_ok() {
            self.output.color = false;
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.output.verbosity > MAX_VERBOSITY {
            return Err(Error::InvalidConfig {
                key: "output.verbosity".to_string(),
                message: format!(
                    "{} is out of range, expected 0..={}",
                    self.output.verbosity, MAX_VERBOSITY
                ),
            }
            .into());
        }
        Ok(())
    }

    /// Tag filter from the configured defaults
    pub fn tag_filter(&self) -> TagFilter {
        TagFilter::from_cli_values(&self.tags.run, &self.tags.skip)
    }

    /// Logging builder from the logging section
    pub fn logging_builder(&self) -> LoggingBuilder {
        let builder = LoggingBuilder::new()
            .with_level(self.logging.level)
            .with_format(self.logging.format)
            .with_ansi(self.output.color);
        match &self.logging.file {
            Some(path) => builder.with_file_output(path),
            None => builder,
        }
    }

    /// Load from a specific file only
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::default().merge_from_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }
}
