//! Application context that holds resolved configuration
//!
//! The context is built following the precedence order:
//! 1. Default values
//! 2. Config file values
//! 3. Environment variables
//! 4. CLI flags
//!
//! Once built, the context is passed as read-only throughout the application.

use libremold::Config;
use libremold::config::ColorChoice;
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// How chatty the CLI is, from the number of `-v` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerbosityLevel {
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl VerbosityLevel {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Normal,
            1 => VerbosityLevel::Verbose,
            2 => VerbosityLevel::Debug,
            _ => VerbosityLevel::Trace,
        }
    }

    /// The log filter a `-v` count forces, if any.
    fn log_filter(self) -> Option<&'static str> {
        match self {
            VerbosityLevel::Normal => None,
            VerbosityLevel::Verbose => Some("info"),
            VerbosityLevel::Debug => Some("debug"),
            VerbosityLevel::Trace => Some("trace"),
        }
    }
}

/// Application context with resolved configuration and runtime state
#[derive(Debug)]
pub struct AppContext {
    /// Resolved configuration
    pub config: Config,
    pub verbosity: VerbosityLevel,
}

/// Returns the config file to load: the `--config` flag, then `$REMOLD_CONFIG`,
/// then `<config_dir>/remold/config.yaml` when it exists.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env::var_os("REMOLD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("remold").join("config.yaml"))
        .filter(|path| path.exists())
}

/// Picks the log filter: `-v` flags, then `REMOLD_LOG`, then the config file.
pub fn resolve_log_filter(
    verbosity: VerbosityLevel,
    env_filter: Option<String>,
    config_level: &str,
) -> String {
    verbosity
        .log_filter()
        .map(str::to_string)
        .or(env_filter)
        .unwrap_or_else(|| config_level.to_string())
}

impl AppContext {
    /// Build context with precedence: defaults > config file > env vars > CLI flags
    pub fn build(
        cli_color: Option<ColorChoice>,
        verbosity: VerbosityLevel,
        config_path: Option<&Path>,
    ) -> libremold::Result<Self> {
        // 1 + 2. Defaults merged with the config file, if any
        let path = resolve_config_path(config_path);
        let mut config = Config::load(path.as_deref())?;

        // 3. Environment variable overrides
        if let Ok(color) = env::var("REMOLD_COLOR") {
            config.output.color = ColorChoice::from(color.as_str());
        }

        // 4. CLI flag overrides
        if let Some(color) = cli_color {
            config.output.color = color;
        }

        Ok(Self { config, verbosity })
    }

    /// Whether output should be colored.
    pub fn use_color(&self) -> bool {
        match self.config.output.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::io::stderr().is_terminal() && env::var_os("NO_COLOR").is_none()
            }
        }
    }

    /// Installs the global `tracing` subscriber, writing to stderr.
    pub fn init_logging(&self) {
        let filter = resolve_log_filter(
            self.verbosity,
            env::var("REMOLD_LOG").ok(),
            &self.config.logging.level,
        );
        let env_filter = EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_ansi(self.use_color())
            .try_init();
    }
}
