//! Interactive course runner: a menu loop over one [`ProgressionController`].
//!
//! Controller failures are shown and the loop continues so the user can retry;
//! only terminal input failures end the session.

use crate::cli::output::map_error;
use crate::cli::presentation::{
    export_plan, format_course_header, format_grade, format_outline, format_stage_content,
    phase_label,
};
use crate::error::CourseError;
use crate::progression::{
    Advance, CourseSnapshot, FinalizeOutcome, ProgressionController, Selection, StagePhase,
    SubmitOutcome,
};
use crate::types::{Language, StageId};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Editor, Input, Select};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    ReadStage,
    Submit,
    RetryContent,
    SelectStage,
    RetryCurriculum,
    SwitchLanguage,
    GeneratePlan,
    ShowPlan,
    ExportPlan,
    Quit,
}

impl Action {
    fn label(self) -> &'static str {
        match self {
            Action::ReadStage => "Read the current stage",
            Action::Submit => "Submit the assignment",
            Action::RetryContent => "Retry loading stage content",
            Action::SelectStage => "Go to another stage",
            Action::RetryCurriculum => "Retry generating the curriculum",
            Action::SwitchLanguage => "Switch language (restarts the course)",
            Action::GeneratePlan => "Generate the business plan",
            Action::ShowPlan => "Show the business plan",
            Action::ExportPlan => "Export the business plan",
            Action::Quit => "Quit",
        }
    }
}

/// Menu entries that make sense for the current course state.
pub(crate) fn available_actions(snapshot: &CourseSnapshot) -> Vec<Action> {
    let mut actions = Vec::new();
    if snapshot.curriculum_error.is_some() && snapshot.stages.is_empty() {
        actions.push(Action::RetryCurriculum);
    }
    if let Some(view) = snapshot.active() {
        actions.push(Action::ReadStage);
        match view.phase {
            StagePhase::ContentReady => actions.push(Action::Submit),
            StagePhase::NoContent => actions.push(Action::RetryContent),
            _ => {}
        }
    }
    if snapshot.stages.len() > 1 {
        actions.push(Action::SelectStage);
    }
    if snapshot.is_fully_completed() {
        if snapshot.final_artifact.is_some() {
            actions.push(Action::ShowPlan);
            actions.push(Action::ExportPlan);
        } else {
            actions.push(Action::GeneratePlan);
        }
    }
    actions.push(Action::SwitchLanguage);
    actions.push(Action::Quit);
    actions
}

fn input_error(e: impl std::fmt::Display) -> CourseError {
    CourseError::Config(format!("Failed to get user input: {}", e))
}

pub struct CourseRunner {
    controller: ProgressionController,
    runtime: tokio::runtime::Runtime,
    workspace_root: PathBuf,
    passing_score: u8,
    theme: ColorfulTheme,
}

impl CourseRunner {
    pub fn new(
        controller: ProgressionController,
        workspace_root: PathBuf,
        passing_score: u8,
    ) -> Result<Self, CourseError> {
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| CourseError::Config(format!("Failed to create runtime: {}", e)))?;
        Ok(Self {
            controller,
            runtime,
            workspace_root,
            passing_score,
            theme: ColorfulTheme::default(),
        })
    }

    /// Run a course for `idea` until the user quits. Returns a closing summary.
    pub fn run(&self, idea: &str) -> Result<String, CourseError> {
        println!("Generating a curriculum for \"{}\"...", idea);
        let language = self.controller.language();
        if let Err(e) = self
            .runtime
            .block_on(self.controller.start_course(idea, language))
        {
            // Empty ideas cannot be retried; service failures show up in the menu.
            if !e.is_retryable() {
                return Err(e);
            }
        }

        loop {
            let snapshot = self.controller.snapshot();
            self.print_status(&snapshot);

            let actions = available_actions(&snapshot);
            let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
            let choice = Select::with_theme(&self.theme)
                .with_prompt("What next?")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(input_error)?;

            let action = actions[choice];
            debug!(?action, "Menu action selected");
            match action {
                Action::ReadStage => self.read_stage(),
                Action::Submit => self.submit(&snapshot)?,
                Action::RetryContent => self.retry_content(&snapshot),
                Action::SelectStage => self.select_stage(&snapshot)?,
                Action::RetryCurriculum => self.retry_curriculum(),
                Action::SwitchLanguage => self.switch_language(&snapshot)?,
                Action::GeneratePlan => self.generate_plan(),
                Action::ShowPlan => {
                    if let Some(plan) = &snapshot.final_artifact {
                        println!("\n{}", plan);
                    }
                }
                Action::ExportPlan => self.export(&snapshot),
                Action::Quit => break,
            }
        }

        let snapshot = self.controller.snapshot();
        Ok(format!(
            "Completed {}/{} stages.",
            snapshot.completed_count(),
            snapshot.stages.len()
        ))
    }

    fn print_status(&self, snapshot: &CourseSnapshot) {
        println!(
            "\n{}\n\n{}",
            format_course_header(snapshot),
            format_outline(snapshot)
        );
        if let Some(err) = &snapshot.curriculum_error {
            eprintln!("{}", map_error(err).red());
        }
        if let Some(err) = snapshot.active().and_then(|view| view.error.as_ref()) {
            eprintln!("{}", map_error(err).red());
        }
        if let Some(err) = &snapshot.finalization_error {
            eprintln!("{}", map_error(err).red());
        }
        if snapshot.awaiting_final_artifact() {
            println!("{}", "All stages complete. Your business plan is ready to generate.".green());
        }
    }

    fn report(&self, error: &CourseError) {
        eprintln!("{}", map_error(error).red());
    }

    fn read_stage(&self) {
        if let Some(stage) = self.controller.active_stage() {
            println!("\n{}", format_stage_content(&stage));
        }
    }

    fn read_submission(&self) -> Result<Option<String>, CourseError> {
        match Editor::new().extension(".md").edit("") {
            Ok(text) => Ok(text),
            Err(e) => {
                debug!(error = %e, "Editor unavailable; falling back to inline input");
                let text: String = Input::with_theme(&self.theme)
                    .with_prompt("Your submission")
                    .allow_empty(true)
                    .interact_text()
                    .map_err(input_error)?;
                Ok(Some(text))
            }
        }
    }

    fn submit(&self, snapshot: &CourseSnapshot) -> Result<(), CourseError> {
        let Some(id) = snapshot.active_stage else {
            return Ok(());
        };
        let Some(submission) = self.read_submission()? else {
            println!("Submission cancelled.");
            return Ok(());
        };

        println!("Grading your submission...");
        match self
            .runtime
            .block_on(self.controller.submit_assignment(id, &submission))
        {
            Ok(SubmitOutcome::Graded { grade, advance }) => {
                println!("\n{}", format_grade(&grade, Some(self.passing_score)));
                match advance {
                    Advance::To(next) => println!("Stage {} unlocked.", next),
                    Advance::CourseComplete => println!("{}", "Course complete!".green().bold()),
                }
            }
            Ok(SubmitOutcome::Superseded) => {}
            Err(e) => self.report(&e),
        }
        Ok(())
    }

    fn retry_content(&self, snapshot: &CourseSnapshot) {
        let Some(id) = snapshot.active_stage else {
            return;
        };
        println!("Loading stage {}...", id);
        if let Err(e) = self.runtime.block_on(self.controller.fetch_content(id)) {
            self.report(&e);
        }
    }

    fn select_stage(&self, snapshot: &CourseSnapshot) -> Result<(), CourseError> {
        let items: Vec<String> = snapshot
            .stages
            .iter()
            .map(|view| {
                format!(
                    "{}. {} ({})",
                    view.stage.id(),
                    view.stage.title(),
                    phase_label(view.phase)
                )
            })
            .collect();
        let default = snapshot
            .active_stage
            .and_then(StageId::index)
            .unwrap_or(0);
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Stage")
            .items(&items)
            .default(default)
            .interact()
            .map_err(input_error)?;

        let id = snapshot.stages[choice].stage.id();
        match self.runtime.block_on(self.controller.select_stage(id)) {
            Ok(Selection::Ignored) => println!("Stage {} is locked.", id),
            Ok(Selection::Selected(_)) => self.read_stage(),
            Err(e) => self.report(&e),
        }
        Ok(())
    }

    fn retry_curriculum(&self) {
        println!("Generating the curriculum again...");
        if let Err(e) = self.runtime.block_on(self.controller.bootstrap_curriculum()) {
            self.report(&e);
        }
    }

    fn switch_language(&self, snapshot: &CourseSnapshot) -> Result<(), CourseError> {
        let languages = [Language::English, Language::Chinese];
        let items = ["English", "中文 (Chinese)"];
        let default = languages
            .iter()
            .position(|l| *l == snapshot.language)
            .unwrap_or(0);
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Language")
            .items(&items)
            .default(default)
            .interact()
            .map_err(input_error)?;

        if languages[choice] != snapshot.language {
            println!("Restarting the course in {}...", items[choice]);
        }
        if let Err(e) = self
            .runtime
            .block_on(self.controller.set_language(languages[choice]))
        {
            self.report(&e);
        }
        Ok(())
    }

    fn generate_plan(&self) {
        println!("Writing your business plan...");
        match self.runtime.block_on(self.controller.generate_final_artifact()) {
            Ok(FinalizeOutcome::Generated(plan)) | Ok(FinalizeOutcome::AlreadyGenerated(plan)) => {
                println!("\n{}", plan)
            }
            Ok(FinalizeOutcome::Superseded) => {}
            Err(e) => self.report(&e),
        }
    }

    fn export(&self, snapshot: &CourseSnapshot) {
        let (Some(idea), Some(plan)) = (&snapshot.idea, &snapshot.final_artifact) else {
            return;
        };
        match export_plan(&self.workspace_root, idea, plan) {
            Ok(path) => println!("Business plan saved to {}", path.display()),
            Err(e) => self.report(&e),
        }
    }
}
