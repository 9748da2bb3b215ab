//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CourseError;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &CourseError) -> String {
    if e.is_retryable() {
        format!("{}\nThe request can be retried.", e)
    } else {
        e.to_string()
    }
}
