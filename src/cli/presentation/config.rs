//! Config presentation: resolved configuration and validation results.

use crate::config::{ValidationError, WarrentConfig};
use crate::error::CourseError;

pub fn format_config(config: &WarrentConfig, format: &str) -> Result<String, CourseError> {
    match format {
        "json" => serde_json::to_string_pretty(config)
            .map_err(|e| CourseError::Config(format!("Failed to render config: {}", e))),
        "toml" => toml::to_string_pretty(config)
            .map_err(|e| CourseError::Config(format!("Failed to render config: {}", e))),
        other => Err(CourseError::Config(format!(
            "Invalid format: {} (must be 'toml' or 'json')",
            other
        ))),
    }
}

pub fn format_validation_result(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => "Configuration is valid".to_string(),
        Err(errors) => {
            let mut s = format!("Configuration has {} error(s):", errors.len());
            for e in errors {
                s.push_str(&format!("\n  - {}", e));
            }
            s
        }
    }
}
