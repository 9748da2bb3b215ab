//! Ordered stage store with write-once content and gated unlocking.

use crate::error::StoreError;
use crate::stage::{LockState, Stage, StageResult};
use crate::types::{CompletedStage, Grade, StageContent, StageId, StageStub};
use chrono::Utc;
use tracing::debug;

/// Ordered collection of the stages of one course instance.
///
/// A stage's `content` doubles as its cache entry: it is written at most once
/// and never cleared while the store lives.
#[derive(Debug, Clone, Default)]
pub struct StageStore {
    stages: Vec<Stage>,
}

impl StageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build stages `1..=N` from the outline, replacing any prior contents.
    /// Stage 1 starts unlocked, the rest locked.
    pub fn initialize(&mut self, stubs: Vec<StageStub>) {
        self.stages = stubs
            .into_iter()
            .enumerate()
            .map(|(index, stub)| {
                let lock_state = if index == 0 {
                    LockState::Unlocked
                } else {
                    LockState::Locked
                };
                Stage::new(
                    StageId::new(index as u32 + 1),
                    stub.title,
                    stub.description,
                    lock_state,
                )
            })
            .collect();
        debug!(stage_count = self.stages.len(), "Stage store initialized");
    }

    pub fn clear(&mut self) {
        self.stages.clear();
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn get(&self, id: StageId) -> Result<&Stage, StoreError> {
        id.index()
            .and_then(|index| self.stages.get(index))
            .ok_or(StoreError::NotFound(id))
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.get(id).is_ok()
    }

    fn get_mut(&mut self, id: StageId) -> Result<&mut Stage, StoreError> {
        id.index()
            .and_then(|index| self.stages.get_mut(index))
            .ok_or(StoreError::NotFound(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter()
    }

    /// Store generated content for a stage. Fails if content is already present.
    pub fn set_content(&mut self, id: StageId, content: StageContent) -> Result<(), StoreError> {
        let stage = self.get_mut(id)?;
        if stage.content.is_some() {
            return Err(StoreError::AlreadySet(id));
        }
        stage.content = Some(content);
        Ok(())
    }

    /// Mark a stage completed with its graded submission and unlock the direct
    /// successor, if one exists. Returns the id of the unlocked successor.
    pub fn complete(
        &mut self,
        id: StageId,
        submission: String,
        grade: Grade,
    ) -> Result<Option<StageId>, StoreError> {
        let stage = self.get_mut(id)?;
        if stage.lock_state == LockState::Locked {
            return Err(StoreError::InvalidState {
                stage: id,
                reason: "stage is locked".to_string(),
            });
        }
        if stage.result.is_some() {
            return Err(StoreError::InvalidState {
                stage: id,
                reason: "stage is already completed".to_string(),
            });
        }

        stage.result = Some(StageResult {
            submission,
            score: grade.score,
            feedback: grade.feedback,
            completed_at: Utc::now(),
        });

        let next = id.next();
        match self.get_mut(next) {
            Ok(successor) => {
                successor.lock_state = LockState::Unlocked;
                debug!(stage = %id, unlocked = %next, "Stage completed");
                Ok(Some(next))
            }
            Err(_) => {
                debug!(stage = %id, "Final stage completed");
                Ok(None)
            }
        }
    }

    /// True iff the store holds at least one stage and every stage is completed.
    pub fn is_fully_completed(&self) -> bool {
        !self.stages.is_empty() && self.stages.iter().all(Stage::is_completed)
    }

    pub fn completed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.is_completed()).count()
    }

    /// Submissions of every completed stage in ascending id order.
    pub fn completed_stages(&self) -> Vec<CompletedStage> {
        self.stages
            .iter()
            .filter_map(|stage| {
                stage.submission().map(|submission| CompletedStage {
                    id: stage.id(),
                    title: stage.title().to_string(),
                    submission: submission.to_string(),
                })
            })
            .collect()
    }
}
