//! Prompt construction for the course services.

use crate::types::{CompletedStage, Language};

pub const SYSTEM_PROMPT: &str = "You are the mentor of the WarrenT Startup School. WarrenT is a \
startup methodology that blends Y Combinator principles with the Lean Startup method and takes a \
founder from idea to product-market fit (0 to 1) and then to scale (1 to 10).";

pub fn curriculum(idea: &str, stage_count: usize, language: Language) -> String {
    format!(
        r#"Design the WarrenT online course as exactly {stage_count} sequential stages.
Early stages cover 0 to 1: ideation, customer discovery, building an MVP, reaching product-market fit.
Later stages cover 1 to 10: growth, scaling, fundraising, company culture.
Tailor every stage title and description to a founder working on this idea: "{idea}".

Return only a JSON array of {stage_count} objects, in course order:
[{{"title": "compelling stage title", "description": "one sentence describing the stage"}}]

{instruction}"#,
        instruction = language.response_instruction(),
    )
}

pub fn stage_content(stage_title: &str, idea: &str, language: Language) -> String {
    format!(
        r#"Write the learning material for the WarrenT stage "{stage_title}".
The reader is a founder building: "{idea}".

Produce four parts:
- theory, caseStudy, practicalExercise: each an object with a "title" and a list of "sections",
  every section having a "subtitle" and its "text" (use newlines between paragraphs).
- assignment: one graded task, in Markdown, that applies "{stage_title}" directly to "{idea}"
  and names a concrete deliverable (for example "Write a 300-word value proposition").

Return only a JSON object of this shape:
{{"theory": {{"title": "", "sections": [{{"subtitle": "", "text": ""}}]}},
 "caseStudy": {{"title": "", "sections": [{{"subtitle": "", "text": ""}}]}},
 "practicalExercise": {{"title": "", "sections": [{{"subtitle": "", "text": ""}}]}},
 "assignment": ""}}

{instruction}"#,
        instruction = language.response_instruction(),
    )
}

pub fn grading(
    stage_title: &str,
    assignment: &str,
    submission: &str,
    idea: &str,
    language: Language,
) -> String {
    format!(
        r#"Grade a student's assignment.
Startup idea: "{idea}"
Stage: "{stage_title}"
Assignment: "{assignment}"
Submission: "{submission}"

Judge how well the submission answers the assignment and how well it applies the principles of
"{stage_title}". Score it from 0 to 100, where 70 is a pass; be fair but critical.
Feedback is concise Markdown: what was done well first, then specific improvements.

Return only a JSON object: {{"score": 0, "feedback": ""}}

{instruction}"#,
        instruction = language.response_instruction(),
    )
}

pub const PLAN_SECTIONS: [&str; 9] = [
    "1. Executive Summary",
    "2. The Problem",
    "3. The Solution",
    "4. Target Market",
    "5. Go-to-Market Strategy",
    "6. Competitive Landscape",
    "7. The Team",
    "8. Financial Projections",
    "9. Future Roadmap",
];

/// `Stage N: title` followed by the submission, one block per completed stage.
pub fn submissions_summary(stages: &[CompletedStage]) -> String {
    stages
        .iter()
        .map(|s| {
            format!(
                "Stage {}: {}\nStudent's Submission:\n{}\n---",
                s.id, s.title, s.submission
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn business_plan(idea: &str, stages: &[CompletedStage], language: Language) -> String {
    let headers = PLAN_SECTIONS
        .iter()
        .map(|section| format!("## {}", section))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Write a business plan for the startup idea "{idea}".
The founder finished all {count} stages of the WarrenT course. Their submissions:

{summary}

Use the submissions as the main source. Write professional Markdown, encouraging but realistic,
with exactly these headers:
{headers}

The Team section is a placeholder for the founder to complete. Financial Projections describes
the business model and next steps for a financial model without inventing numbers. Future Roadmap
lays out 6, 12 and 18 month milestones.

{instruction}"#,
        count = stages.len(),
        summary = submissions_summary(stages),
        instruction = language.response_instruction(),
    )
}
