//! Stage Model
//!
//! One unit of the curriculum and the ordered store that owns every stage of a
//! course instance. All mutation goes through [`StageStore`], which keeps the
//! unlock and completion invariants.

pub mod store;

pub use store::StageStore;

use crate::types::{Grade, StageContent, StageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    Locked,
    Unlocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionState {
    NotCompleted,
    Completed,
}

/// Graded submission recorded when a stage completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub submission: String,
    pub score: f64,
    pub feedback: String,
    pub completed_at: DateTime<Utc>,
}

/// A curriculum stage.
///
/// Title and description are fixed at bootstrap. The completion record exists
/// exactly when the stage is completed, so submission, score and feedback can
/// never be observed apart from the `Completed` state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    id: StageId,
    title: String,
    description: String,
    lock_state: LockState,
    content: Option<StageContent>,
    result: Option<StageResult>,
}

impl Stage {
    pub(crate) fn new(id: StageId, title: String, description: String, lock_state: LockState) -> Self {
        Self {
            id,
            title,
            description,
            lock_state,
            content: None,
            result: None,
        }
    }

    pub fn id(&self) -> StageId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn lock_state(&self) -> LockState {
        self.lock_state
    }

    pub fn is_locked(&self) -> bool {
        self.lock_state == LockState::Locked
    }

    pub fn completion_state(&self) -> CompletionState {
        if self.result.is_some() {
            CompletionState::Completed
        } else {
            CompletionState::NotCompleted
        }
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }

    pub fn content(&self) -> Option<&StageContent> {
        self.content.as_ref()
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    pub fn result(&self) -> Option<&StageResult> {
        self.result.as_ref()
    }

    pub fn submission(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.submission.as_str())
    }

    pub fn score(&self) -> Option<f64> {
        self.result.as_ref().map(|r| r.score)
    }

    pub fn feedback(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.feedback.as_str())
    }

    pub fn grade(&self) -> Option<Grade> {
        self.result.as_ref().map(|r| Grade {
            score: r.score,
            feedback: r.feedback.clone(),
        })
    }
}
