//! Stable read-only view of a course for the presentation layer.

use crate::error::CourseError;
use crate::progression::phase::StagePhase;
use crate::stage::Stage;
use crate::types::{Language, StageId};

#[derive(Debug, Clone)]
pub struct StageView {
    pub stage: Stage,
    pub phase: StagePhase,
    /// Last content or grading failure for this stage, cleared on the next attempt.
    pub error: Option<CourseError>,
}

/// Whole-course view taken under one lock, so no half-applied transition is visible.
#[derive(Debug, Clone)]
pub struct CourseSnapshot {
    pub generation: u64,
    pub idea: Option<String>,
    pub language: Language,
    pub stages: Vec<StageView>,
    pub active_stage: Option<StageId>,
    pub final_artifact: Option<String>,
    pub curriculum_loading: bool,
    pub curriculum_error: Option<CourseError>,
    pub finalizing: bool,
    pub finalization_error: Option<CourseError>,
}

impl CourseSnapshot {
    pub fn is_started(&self) -> bool {
        self.idea.is_some()
    }

    pub fn stage(&self, id: StageId) -> Option<&StageView> {
        self.stages.iter().find(|view| view.stage.id() == id)
    }

    pub fn active(&self) -> Option<&StageView> {
        self.active_stage.and_then(|id| self.stage(id))
    }

    pub fn completed_count(&self) -> usize {
        self.stages
            .iter()
            .filter(|view| view.phase == StagePhase::Completed)
            .count()
    }

    pub fn is_fully_completed(&self) -> bool {
        !self.stages.is_empty() && self.completed_count() == self.stages.len()
    }

    /// Every stage is done and the business plan has not been produced yet.
    pub fn awaiting_final_artifact(&self) -> bool {
        self.is_fully_completed() && self.final_artifact.is_none()
    }
}
