//! Output formatting for loaded trees and errors.

use crate::error::{InitError, InitResult};
use clap::ValueEnum;
use serde_json::{Value, json};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            _ => None,
        }
    }
}

/// Render a value in the requested format.
pub fn render(value: &Value, format: OutputFormat) -> InitResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).map_err(InitError::io),
        OutputFormat::Yaml => serde_yaml::to_string(value).map_err(InitError::io),
    }
}

/// Render an error as `{"error": {code, message, ...}}`.
pub fn render_error(err: &InitError, format: OutputFormat) -> String {
    let value = json!({ "error": err });
    render(&value, format).unwrap_or_else(|_| format!("{}: {}", err.code, err.message))
}
