//! Course presentation: outline table, stage content, grades and the exported plan.

use crate::error::CourseError;
use crate::progression::{CourseSnapshot, StagePhase};
use crate::stage::Stage;
use crate::types::{Grade, StructuredContent};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn phase_label(phase: StagePhase) -> String {
    match phase {
        StagePhase::Locked => format!("{}", "locked".dimmed()),
        StagePhase::NoContent => "not loaded".to_string(),
        StagePhase::ContentLoading => format!("{}", "loading".yellow()),
        StagePhase::ContentReady => format!("{}", "ready".cyan()),
        StagePhase::Grading => format!("{}", "grading".yellow()),
        StagePhase::Completed => format!("{}", "completed".green()),
    }
}

/// Idea, language and overall progress line.
pub fn format_course_header(snapshot: &CourseSnapshot) -> String {
    let idea = snapshot.idea.as_deref().unwrap_or("-");
    format!(
        "{}\n  Idea: {}\n  Language: {}\n  Progress: {}/{} stages",
        format_section_heading("WarrenT Course"),
        idea,
        snapshot.language,
        snapshot.completed_count(),
        snapshot.stages.len()
    )
}

/// Course outline as a table: one row per stage with status and score.
pub fn format_outline(snapshot: &CourseSnapshot) -> String {
    if snapshot.stages.is_empty() {
        if snapshot.curriculum_loading {
            return "Generating curriculum...".to_string();
        }
        return "No curriculum yet.".to_string();
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["", "#", "Stage", "Status", "Score"]);
    for view in &snapshot.stages {
        let id = view.stage.id();
        let marker = if snapshot.active_stage == Some(id) {
            ">"
        } else {
            ""
        };
        let status = match &view.error {
            Some(_) => format!("{}", "error".red()),
            None => phase_label(view.phase),
        };
        let score = view
            .stage
            .score()
            .map(|s| format!("{:.0}", s))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            marker.to_string(),
            id.to_string(),
            view.stage.title().to_string(),
            status,
            score,
        ]);
    }
    table.to_string()
}

fn push_structured(out: &mut String, heading: &str, content: &StructuredContent) {
    out.push_str(&format!("\n{}\n", format_section_heading(heading)));
    if !content.title.is_empty() {
        out.push_str(&format!("{}\n", content.title.bold()));
    }
    for section in &content.sections {
        out.push_str(&format!("\n  {}\n", section.subtitle.bold()));
        for line in section.text.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }
}

/// Full learning material for a stage, or its description when content is not loaded.
pub fn format_stage_content(stage: &Stage) -> String {
    let mut out = format!(
        "{}\n{}\n",
        format_section_heading(&format!("Stage {}: {}", stage.id(), stage.title())),
        stage.description()
    );
    let Some(content) = stage.content() else {
        out.push_str("\nContent has not been loaded yet.\n");
        return out;
    };
    push_structured(&mut out, "Theory", &content.theory);
    push_structured(&mut out, "Case Study", &content.case_study);
    push_structured(&mut out, "Practical Exercise", &content.practical_exercise);
    out.push_str(&format!(
        "\n{}\n{}\n",
        format_section_heading("Assignment"),
        content.assignment
    ));
    if let Some(submission) = stage.submission() {
        out.push_str(&format!(
            "\n{}\n{}\n",
            format_section_heading("Your Submission"),
            submission
        ));
    }
    if let Some(grade) = stage.grade() {
        out.push_str(&format!("\n{}\n", format_grade(&grade, None)));
    }
    out
}

/// Score and feedback; with a passing threshold the score is colored by it.
pub fn format_grade(grade: &Grade, passing_score: Option<u8>) -> String {
    let score = format!("{:.0}/100", grade.score);
    let score = match passing_score {
        Some(threshold) if grade.passed(threshold) => format!("{}", score.green()),
        Some(_) => format!("{}", score.red()),
        None => score,
    };
    format!(
        "{} {}\n{}",
        "Score:".bold(),
        score,
        grade.feedback
    )
}

/// File name for an exported plan: the idea lower-cased, every run of
/// characters other than alphanumerics collapsed to one `-`, plus
/// `-business-plan.md`. The result is always a single path component.
pub fn plan_file_name(idea: &str) -> String {
    let lowered = idea.to_lowercase();
    let slug = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "business-plan.md".to_string()
    } else {
        format!("{}-business-plan.md", slug)
    }
}

/// Write the plan verbatim into `dir`, returning the file path.
pub fn export_plan(dir: &Path, idea: &str, plan: &str) -> Result<PathBuf, CourseError> {
    let path = dir.join(plan_file_name(idea));
    std::fs::write(&path, plan).map_err(|e| {
        CourseError::Config(format!("Failed to write plan to {}: {}", path.display(), e))
    })?;
    Ok(path)
}
