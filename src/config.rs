//! Configuration System
//!
//! Layered configuration for the course engine: built-in defaults, the global
//! user file, the workspace file, an optional explicit file, and finally
//! `WARRENT__SECTION__KEY` environment variables. Validated after loading.

use crate::error::CourseError;
use crate::logging::LoggingConfig;
use crate::types::Language;
use config::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use crate::provider::{ProviderConfig, ProviderType, Temperatures};

mod merge {
    pub(super) mod merge_policy;
}
mod sources {
    pub(super) mod global_file;
    pub(super) mod workspace_file;
}

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarrentConfig {
    #[serde(default)]
    pub course: CourseConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Course-shape settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    /// Number of stages requested from the curriculum generator
    #[serde(default = "default_stage_count")]
    pub stage_count: usize,

    #[serde(default)]
    pub default_language: Language,

    /// Score shown as passing; any graded submission completes its stage
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,
}

fn default_stage_count() -> usize {
    10
}

fn default_passing_score() -> u8 {
    70
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self {
            stage_count: default_stage_count(),
            default_language: Language::default(),
            passing_score: default_passing_score(),
        }
    }
}

const MAX_STAGE_COUNT: usize = 50;

impl CourseConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.stage_count == 0 || self.stage_count > MAX_STAGE_COUNT {
            return Err(format!(
                "stage_count must be between 1 and {}, got {}",
                MAX_STAGE_COUNT, self.stage_count
            ));
        }
        if self.passing_score > 100 {
            return Err(format!(
                "passing_score must be at most 100, got {}",
                self.passing_score
            ));
        }
        Ok(())
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Course(String),
    Provider(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Course(msg) => write!(f, "Course: {}", msg),
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl WarrentConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.course.validate() {
            errors.push(ValidationError::Course(e));
        }
        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and fold all problems into one error.
    pub fn ensure_valid(&self) -> Result<(), CourseError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            CourseError::Config(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })
    }
}

/// Loads [`WarrentConfig`] from every configured source.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load for a workspace: defaults, global file, workspace files, environment.
    pub fn load(workspace_root: &Path) -> Result<WarrentConfig, CourseError> {
        Self::load_with(workspace_root, None)
    }

    /// As [`ConfigLoader::load`], with an explicit file layered above the workspace files.
    pub fn load_with(
        workspace_root: &Path,
        explicit: Option<&Path>,
    ) -> Result<WarrentConfig, CourseError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let mut builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        if let Some(path) = explicit {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config = builder
            .add_source(env_source())
            .build()?
            .try_deserialize::<WarrentConfig>()?;
        Ok(config)
    }

    /// Load a single file on top of the defaults, ignoring other sources.
    pub fn load_from_file(path: &Path) -> Result<WarrentConfig, CourseError> {
        let config = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true))
            .build()?
            .try_deserialize::<WarrentConfig>()?;
        Ok(config)
    }

    /// Workspace config file path for `workspace_root`.
    pub fn workspace_config_path(workspace_root: &Path) -> PathBuf {
        workspace_root.join(WORKSPACE_CONFIG_FILE)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("WARRENT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
