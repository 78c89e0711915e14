//! Application configuration.
//!
//! This module manages application configuration with sensible defaults,
//! loading from a YAML file and merging it over the built-in values.

use crate::error::{Result, RemoldError};
use crate::media_type::{
    DOCKER_V2_SCHEMA1, DOCKER_V2_SCHEMA1_SIGNED, DOCKER_V2_SCHEMA2, OCI_IMAGE_MANIFEST,
};
use config::{Config as ConfigRs, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;


const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Root configuration structure.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub conversion: Conversion,
}

impl Config {
    /// Parses a `Config` from a YAML string.
    ///
    /// This function is primarily used for testing.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let builder = ConfigRs::builder()
            // Add default values
            .add_source(ConfigRs::try_from(&Config::default())?)
            // Merge with YAML string
            .add_source(File::from_str(s, FileFormat::Yaml));

        Self::from_builder(builder, None)
    }

    /// Loads a `Config` from an optional file path.
    ///
    /// Without a path the defaults are returned. A path that does not exist is
    /// an error; callers probing default locations check existence first.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigRs::builder()
            // Add default values
            .add_source(ConfigRs::try_from(&Config::default())?);

        if let Some(p) = path {
            builder = builder.add_source(File::from(p).format(FileFormat::Yaml).required(true));
        }

        Self::from_builder(builder, path)
    }

    /// Creates a `Config` from a `config::ConfigBuilder` and validates it.
    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        path: Option<&Path>,
    ) -> Result<Self> {
        let path = path.map(|p| p.display().to_string());
        let config: Config = builder
            .build()
            .and_then(|cfg| cfg.try_deserialize())
            .map_err(|e| {
                RemoldError::config_with_source(
                    "Failed to deserialize configuration".to_string(),
                    path.clone(),
                    e,
                )
            })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: Option<String>) -> Result<()> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(RemoldError::config(
                format!("Unknown log level {:?}", self.logging.level),
                path,
            ));
        }
        if let Some(target) = &self.conversion.default_target {
            let known = [
                OCI_IMAGE_MANIFEST,
                DOCKER_V2_SCHEMA2,
                DOCKER_V2_SCHEMA1,
                DOCKER_V2_SCHEMA1_SIGNED,
            ];
            if !known.contains(&target.as_str()) {
                return Err(RemoldError::config(
                    format!("Unsupported default conversion target {:?}", target),
                    path,
                ));
            }
        }
        Ok(())
    }
}

/// Output formatting settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Output {
    #[serde(default)]
    pub format: OutputFormat,

    #[serde(default)]
    pub color: ColorChoice,
}

/// Enum for output formats.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,

    Json,

    Yaml,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Enum for color output choices.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,

    Always,

    Never,
}

impl From<&str> for ColorChoice {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => ColorChoice::Always,
            "never" => ColorChoice::Never,
            _ => ColorChoice::Auto,
        }
    }
}

/// Logging settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Logging {
    /// Default filter directive, overridden by `REMOLD_LOG` and `-v`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Conversion settings.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Conversion {
    /// Manifest media type to convert to when none is given.
    #[serde(default)]
    pub default_target: Option<String>,
}
