//! CLI presentation: text and json formatters per command family.

mod config;
mod course;

pub use config::{format_config, format_validation_result};
pub use course::{
    export_plan, format_course_header, format_grade, format_outline, format_stage_content,
    phase_label, plan_file_name,
};
