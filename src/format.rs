//! Output formatting for resolved configs.

use anyhow::Result;
use clap::ValueEnum;
use serde_json::Value;

/// Output format for printed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl OutputFormat {
    /// Render a value. Bare strings are printed without quoting.
    pub fn render(self, value: &Value) -> Result<String> {
        if let Value::String(s) = value {
            return Ok(s.clone());
        }
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml => serde_yaml::to_string(value)?.trim_end().to_string(),
        })
    }
}
