//! CLI route: single route table and run context. Dispatches to the course
//! runner and presentation.

use crate::cli::interactive::CourseRunner;
use crate::cli::parse::{Commands, ConfigCommands};
use crate::cli::presentation::{format_config, format_validation_result};
use crate::config::{ConfigLoader, WarrentConfig};
use crate::error::CourseError;
use crate::generation::LlmCourseServices;
use crate::progression::ProgressionController;
use crate::services::CourseServices;
use crate::types::Language;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runtime context for CLI execution: workspace and resolved configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: WarrentConfig,
    language: Language,
}

impl RunContext {
    /// Create run context from workspace root, optional config path and an
    /// optional language override. Uses ConfigLoader only.
    pub fn new(
        workspace_root: PathBuf,
        config_path: Option<PathBuf>,
        language: Option<Language>,
    ) -> Result<Self, CourseError> {
        let config = ConfigLoader::load_with(&workspace_root, config_path.as_deref())?;
        let language = language.unwrap_or(config.course.default_language);
        Ok(Self {
            workspace_root,
            config,
            language,
        })
    }

    pub fn config(&self) -> &WarrentConfig {
        &self.config
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Execute a command, returning text for stdout.
    pub fn execute(&self, command: &Commands) -> Result<String, CourseError> {
        match command {
            Commands::Start { idea } => self.handle_start(idea),
            Commands::Config { command } => self.handle_config(command),
        }
    }

    fn handle_start(&self, idea: &str) -> Result<String, CourseError> {
        self.config.ensure_valid()?;
        let services = LlmCourseServices::from_config(
            &self.config.provider,
            self.config.course.stage_count,
        )
        .map_err(|e| CourseError::Config(e.to_string()))?;
        info!(
            provider = ?self.config.provider.provider_type,
            model = %self.config.provider.model,
            "Course services ready"
        );

        let controller = ProgressionController::with_language(
            CourseServices::from_shared(Arc::new(services)),
            self.language,
        );
        let runner = CourseRunner::new(
            controller,
            self.workspace_root.clone(),
            self.config.course.passing_score,
        )?;
        runner.run(idea)
    }

    fn handle_config(&self, command: &ConfigCommands) -> Result<String, CourseError> {
        match command {
            ConfigCommands::Show { format } => format_config(&self.config, format),
            ConfigCommands::Validate => {
                let result = self.config.validate();
                let text = format_validation_result(&result);
                match result {
                    Ok(()) => Ok(text),
                    Err(_) => Err(CourseError::Config(text)),
                }
            }
        }
    }
}
