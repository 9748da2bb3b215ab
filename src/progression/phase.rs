//! Derived per-stage state machine and the auto-advance rule.

use crate::stage::{Stage, StageStore};
use crate::types::StageId;
use serde::{Deserialize, Serialize};

/// Where a stage sits in its lifecycle. Derived from the stored stage plus
/// the controller's in-flight flags; never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePhase {
    Locked,
    NoContent,
    ContentLoading,
    ContentReady,
    Grading,
    Completed,
}

impl StagePhase {
    pub fn derive(stage: &Stage, fetching: bool, grading: bool) -> Self {
        if stage.is_completed() {
            StagePhase::Completed
        } else if stage.is_locked() {
            StagePhase::Locked
        } else if grading {
            StagePhase::Grading
        } else if stage.has_content() {
            StagePhase::ContentReady
        } else if fetching {
            StagePhase::ContentLoading
        } else {
            StagePhase::NoContent
        }
    }

    pub fn allowed_transitions(self) -> &'static [StagePhase] {
        use StagePhase::*;
        match self {
            Locked => &[NoContent],
            NoContent => &[ContentLoading],
            // success, or failure back to no content
            ContentLoading => &[ContentReady, NoContent],
            ContentReady => &[Grading],
            // success, or failure leaves the content ready for resubmission
            Grading => &[Completed, ContentReady],
            Completed => &[],
        }
    }

    pub fn can_transition_to(self, to: StagePhase) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// Why a grading attempt cannot start from this phase.
    pub(crate) fn grading_blocker(self) -> Option<&'static str> {
        match self {
            StagePhase::ContentReady => None,
            StagePhase::Locked => Some("stage is locked"),
            StagePhase::NoContent | StagePhase::ContentLoading => Some("stage has no content yet"),
            StagePhase::Grading => Some("a grading attempt is already in flight"),
            StagePhase::Completed => Some("stage is already completed"),
        }
    }
}

/// Selection change that follows a stage completing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advance {
    /// Select the direct successor.
    To(StageId),
    /// The last stage completed; nothing is selected until finalization.
    CourseComplete,
}

/// On completion of `completed`, advance to `completed + 1` if that stage
/// exists. The successor is looked up directly, never searched for.
pub fn advance_after_completion(store: &StageStore, completed: StageId) -> Advance {
    let next = completed.next();
    if store.contains(next) {
        Advance::To(next)
    } else {
        Advance::CourseComplete
    }
}
