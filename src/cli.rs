//! CLI domain: parse, route, output, presentation and the interactive runner.
//! Course orchestration stays in the progression controller.

mod interactive;
mod output;
mod parse;
mod presentation;
mod route;

pub use interactive::CourseRunner;
pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands};
pub use presentation::{
    export_plan, format_config, format_course_header, format_grade, format_outline,
    format_stage_content, format_validation_result, phase_label, plan_file_name,
};
pub use route::RunContext;
