//! Merge rules: defaults first, then files, then environment.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("course.stage_count", 10)?
        .set_default("course.default_language", "en")?
        .set_default("course.passing_score", 70)?
        .set_default("provider.provider_type", "gemini")?
        .set_default("provider.model", "gemini-2.5-flash")
}
