//! Terminal output helpers.
//!
//! Status messages go to stderr so that stdout carries only command output
//! (converted manifests in particular can be piped straight into a file).

use crate::context::{AppContext, VerbosityLevel};
use owo_colors::OwoColorize;
use serde::Serialize;

pub use libremold::config::OutputFormat;


/// Print a success message
pub fn success(ctx: &AppContext, message: &str) {
    eprintln!("{} {}", mark(ctx, "✓"), message);
}

/// Print an error message
pub fn error(ctx: &AppContext, message: &str) {
    eprintln!("{} {}", mark(ctx, "✗"), message);
}

/// Print a message when running at `level` or chattier
pub fn print(ctx: &AppContext, level: VerbosityLevel, message: &str) {
    if ctx.verbosity >= level {
        eprintln!("{}", message);
    }
}

fn mark(ctx: &AppContext, symbol: &str) -> String {
    if !ctx.use_color() {
        return symbol.to_string();
    }
    match symbol {
        "✓" => symbol.green().bold().to_string(),
        _ => symbol.red().bold().to_string(),
    }
}

/// Trait for types that can be formatted for CLI output
pub trait Formattable: Serialize {
    /// Format the type for pretty (human-readable) output
    fn format_pretty(&self) -> String;
}

/// Format a single item for output
pub fn format_output<T: Formattable>(item: &T, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Pretty => Ok(item.format_pretty()),
        OutputFormat::Json => serde_json::to_string_pretty(item)
            .map_err(|e| format!("Failed to serialize to JSON: {}", e)),
        OutputFormat::Yaml => {
            serde_yaml::to_string(item).map_err(|e| format!("Failed to serialize to YAML: {}", e))
        }
    }
}
