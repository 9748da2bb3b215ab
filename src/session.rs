//! Session Context
//!
//! Holds the course idea, language, active stage and final artifact of one
//! course instance. Mutated only by the progression controller.

use crate::types::{Language, StageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    idea: String,
    language: Language,
    active_stage: Option<StageId>,
    final_artifact: Option<String>,
}

impl SessionContext {
    pub fn new(idea: impl Into<String>, language: Language) -> Self {
        Self {
            idea: idea.into(),
            language,
            active_stage: None,
            final_artifact: None,
        }
    }

    pub fn idea(&self) -> &str {
        &self.idea
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// `None` before the curriculum is ready and after the last stage completes.
    pub fn active_stage(&self) -> Option<StageId> {
        self.active_stage
    }

    pub fn final_artifact(&self) -> Option<&str> {
        self.final_artifact.as_deref()
    }

    pub(crate) fn set_active_stage(&mut self, stage: Option<StageId>) {
        self.active_stage = stage;
    }

    pub(crate) fn set_final_artifact(&mut self, artifact: String) {
        self.final_artifact = Some(artifact);
    }
}
