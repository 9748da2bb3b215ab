//! Course Progression
//!
//! The progression controller owns one course instance: it bootstraps the
//! curriculum, gates stage selection, fetches and caches stage content,
//! coordinates grading, advances selection on completion and runs the final
//! business-plan synthesis.
//!
//! All local state lives behind one mutex and is only touched between
//! service calls, never across an `.await`. Every bootstrap bumps a
//! generation counter; a service response that resolves after its generation
//! was replaced (course restart, language change, curriculum retry) is dropped
//! without being applied.

pub mod phase;
pub mod snapshot;

pub use phase::{advance_after_completion, Advance, StagePhase};
pub use snapshot::{CourseSnapshot, StageView};

use crate::error::{CourseError, ServiceError};
use crate::services::CourseServices;
use crate::session::SessionContext;
use crate::stage::{Stage, StageStore};
use crate::types::{Grade, Language, StageId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Ready { stage_count: usize },
    /// A newer bootstrap replaced this one before it resolved.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched,
    /// Content was already present; no service call was made.
    Cached,
    /// Another fetch for this stage is still running.
    InFlight,
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Stage is locked or does not exist; nothing changed.
    Ignored,
    Selected(FetchOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Graded { grade: Grade, advance: Advance },
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Generated(String),
    /// The plan was produced earlier for this course; returned without regenerating.
    AlreadyGenerated(String),
    Superseded,
}

#[derive(Debug, Clone, Default)]
struct StageActivity {
    fetching: bool,
    grading: bool,
    last_error: Option<CourseError>,
}

#[derive(Debug, Default)]
struct CourseState {
    generation: u64,
    default_language: Language,
    session: Option<SessionContext>,
    store: StageStore,
    activity: HashMap<StageId, StageActivity>,
    curriculum_loading: bool,
    curriculum_error: Option<CourseError>,
    finalizing: bool,
    finalization_error: Option<CourseError>,
}

impl CourseState {
    fn session(&self) -> Result<&SessionContext, CourseError> {
        self.session.as_ref().ok_or(CourseError::NoActiveCourse)
    }

    fn session_mut(&mut self) -> Result<&mut SessionContext, CourseError> {
        self.session.as_mut().ok_or(CourseError::NoActiveCourse)
    }

    fn activity(&mut self, id: StageId) -> &mut StageActivity {
        self.activity.entry(id).or_default()
    }

    fn phase(&self, stage: &Stage) -> StagePhase {
        let activity = self.activity.get(&stage.id());
        StagePhase::derive(
            stage,
            activity.map_or(false, |a| a.fetching),
            activity.map_or(false, |a| a.grading),
        )
    }

    /// Drop every stage and all per-course progress, invalidating in-flight work.
    fn discard_progress(&mut self) -> u64 {
        self.generation += 1;
        self.store.clear();
        self.activity.clear();
        self.curriculum_loading = false;
        self.curriculum_error = None;
        self.finalizing = false;
        self.finalization_error = None;
        self.generation
    }
}

#[derive(Debug, Clone, Copy)]
enum Busy {
    Curriculum,
    Fetch(StageId),
    Grade(StageId),
    Finalize,
}

/// Clears an in-flight flag when the owning operation ends, including when its
/// future is dropped mid-call. Flags of a replaced generation are left alone.
struct BusyGuard {
    state: Arc<Mutex<CourseState>>,
    generation: u64,
    busy: Busy,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.generation != self.generation {
            return;
        }
        match self.busy {
            Busy::Curriculum => state.curriculum_loading = false,
            Busy::Fetch(id) => state.activity(id).fetching = false,
            Busy::Grade(id) => state.activity(id).grading = false,
            Busy::Finalize => state.finalizing = false,
        }
    }
}

/// Stateful workflow for one course. Cheap to clone; clones share the course.
#[derive(Clone)]
pub struct ProgressionController {
    services: CourseServices,
    state: Arc<Mutex<CourseState>>,
}

impl ProgressionController {
    pub fn new(services: CourseServices) -> Self {
        Self::with_language(services, Language::default())
    }

    /// Controller whose first course uses `language` unless told otherwise.
    pub fn with_language(services: CourseServices, language: Language) -> Self {
        let state = CourseState {
            default_language: language,
            ..CourseState::default()
        };
        Self {
            services,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn guard(&self, generation: u64, busy: Busy) -> BusyGuard {
        BusyGuard {
            state: self.state.clone(),
            generation,
            busy,
        }
    }

    /// Start a new course, discarding any existing one, and bootstrap its curriculum.
    pub async fn start_course(
        &self,
        idea: &str,
        language: Language,
    ) -> Result<BootstrapOutcome, CourseError> {
        let idea = idea.trim();
        if idea.is_empty() {
            return Err(CourseError::InvalidState(
                "course idea cannot be empty".to_string(),
            ));
        }
        {
            let mut state = self.state.lock();
            state.discard_progress();
            state.default_language = language;
            state.session = Some(SessionContext::new(idea, language));
        }
        info!(language = %language, "Starting course");
        self.bootstrap_curriculum().await
    }

    /// Generate the curriculum for the current session from scratch. Also the
    /// retry path after a curriculum failure.
    pub async fn bootstrap_curriculum(&self) -> Result<BootstrapOutcome, CourseError> {
        let (generation, idea, language, _guard) = {
            let mut state = self.state.lock();
            let (idea, language) = {
                let session = state.session()?;
                (session.idea().to_string(), session.language())
            };
            let generation = state.discard_progress();
            state.session = Some(SessionContext::new(idea.clone(), language));
            state.curriculum_loading = true;
            (
                generation,
                idea,
                language,
                self.guard(generation, Busy::Curriculum),
            )
        };

        info!(generation, "Requesting curriculum");
        let result = self
            .services
            .content
            .generate_curriculum(&idea, language)
            .await;

        let stage_count = {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(generation, current = state.generation, "Discarding stale curriculum");
                return Ok(BootstrapOutcome::Superseded);
            }
            let stubs = match result {
                Ok(stubs) if stubs.is_empty() => Err(ServiceError::InvalidResponse(
                    "Curriculum contains no stages".to_string(),
                )),
                other => other,
            };
            match stubs {
                Ok(stubs) => {
                    state.store.initialize(stubs);
                    state.session_mut()?.set_active_stage(Some(StageId::FIRST));
                    state.store.len()
                }
                Err(e) => {
                    warn!(error = %e, "Curriculum generation failed");
                    let err = CourseError::Curriculum(e);
                    state.curriculum_error = Some(err.clone());
                    return Err(err);
                }
            }
        };
        drop(_guard);
        info!(generation, stage_count, "Curriculum ready");

        // Stage 1 content is fetched eagerly; a failure stays on the stage.
        if let Err(e) = self.fetch_in_generation(StageId::FIRST, Some(generation)).await {
            warn!(error = %e, "Initial stage content fetch failed");
        }
        Ok(BootstrapOutcome::Ready { stage_count })
    }

    /// Change the course language. With an active course this discards all
    /// progress and bootstraps a fresh curriculum in the new language.
    pub async fn set_language(
        &self,
        language: Language,
    ) -> Result<Option<BootstrapOutcome>, CourseError> {
        let idea = {
            let mut state = self.state.lock();
            match state.session.as_ref() {
                None => {
                    state.default_language = language;
                    return Ok(None);
                }
                Some(session) if session.language() == language => return Ok(None),
                Some(session) => session.idea().to_string(),
            }
        };
        info!(language = %language, "Language changed; restarting course");
        self.start_course(&idea, language).await.map(Some)
    }

    /// Make `id` the active stage and fetch its content if it has none.
    /// Locked or unknown stages are ignored.
    pub async fn select_stage(&self, id: StageId) -> Result<Selection, CourseError> {
        self.select_in_generation(id, None).await
    }

    async fn select_in_generation(
        &self,
        id: StageId,
        expected: Option<u64>,
    ) -> Result<Selection, CourseError> {
        let (generation, needs_fetch) = {
            let mut state = self.state.lock();
            state.session()?;
            if expected.is_some_and(|g| g != state.generation) {
                return Ok(Selection::Selected(FetchOutcome::Superseded));
            }
            let needs_fetch = match state.store.get(id) {
                Ok(stage) if !stage.is_locked() => !stage.has_content(),
                _ => {
                    debug!(stage = %id, "Ignoring selection of unavailable stage");
                    return Ok(Selection::Ignored);
                }
            };
            state.session_mut()?.set_active_stage(Some(id));
            (state.generation, needs_fetch)
        };

        debug!(stage = %id, needs_fetch, "Stage selected");
        if !needs_fetch {
            return Ok(Selection::Selected(FetchOutcome::Cached));
        }
        let outcome = self.fetch_in_generation(id, Some(generation)).await?;
        Ok(Selection::Selected(outcome))
    }

    /// Fetch learning content for an unlocked stage. At most one service call is
    /// made per stage: cached content and in-flight fetches short-circuit.
    pub async fn fetch_content(&self, id: StageId) -> Result<FetchOutcome, CourseError> {
        self.fetch_in_generation(id, None).await
    }

    async fn fetch_in_generation(
        &self,
        id: StageId,
        expected: Option<u64>,
    ) -> Result<FetchOutcome, CourseError> {
        let (generation, title, idea, language, _guard) = {
            let mut state = self.state.lock();
            let (idea, language) = {
                let session = state.session()?;
                (session.idea().to_string(), session.language())
            };
            if expected.is_some_and(|g| g != state.generation) {
                return Ok(FetchOutcome::Superseded);
            }
            let stage = state.store.get(id)?;
            if stage.is_locked() {
                return Err(CourseError::InvalidState(format!("stage {} is locked", id)));
            }
            if stage.has_content() {
                debug!(stage = %id, "Stage content served from cache");
                return Ok(FetchOutcome::Cached);
            }
            let title = stage.title().to_string();
            let generation = state.generation;
            let activity = state.activity(id);
            if activity.fetching {
                return Ok(FetchOutcome::InFlight);
            }
            activity.fetching = true;
            activity.last_error = None;
            (
                generation,
                title,
                idea,
                language,
                self.guard(generation, Busy::Fetch(id)),
            )
        };

        info!(stage = %id, title = %title, "Fetching stage content");
        let result = self
            .services
            .content
            .generate_stage_content(&title, &idea, language)
            .await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(stage = %id, generation, "Discarding stale stage content");
            return Ok(FetchOutcome::Superseded);
        }
        match result {
            Ok(content) => {
                state.store.set_content(id, content)?;
                info!(stage = %id, "Stage content ready");
                Ok(FetchOutcome::Fetched)
            }
            Err(e) => {
                warn!(stage = %id, error = %e, "Stage content fetch failed");
                let err = CourseError::Content {
                    stage: id,
                    source: e,
                };
                state.activity(id).last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Grade a submission for a stage with ready content. On success the stage
    /// completes, its successor unlocks, and selection advances.
    pub async fn submit_assignment(
        &self,
        id: StageId,
        submission: &str,
    ) -> Result<SubmitOutcome, CourseError> {
        if submission.trim().is_empty() {
            return Err(CourseError::EmptySubmission);
        }

        let (generation, title, assignment, idea, language, guard) = {
            let mut state = self.state.lock();
            let (idea, language) = {
                let session = state.session()?;
                (session.idea().to_string(), session.language())
            };
            let stage = state.store.get(id)?;
            if let Some(reason) = state.phase(stage).grading_blocker() {
                return Err(CourseError::InvalidState(format!(
                    "cannot grade stage {}: {}",
                    id, reason
                )));
            }
            let title = stage.title().to_string();
            let assignment = stage
                .content()
                .map(|c| c.assignment.clone())
                .unwrap_or_default();
            let generation = state.generation;
            let activity = state.activity(id);
            activity.grading = true;
            activity.last_error = None;
            (
                generation,
                title,
                assignment,
                idea,
                language,
                self.guard(generation, Busy::Grade(id)),
            )
        };

        info!(stage = %id, "Grading submission");
        let result = self
            .services
            .grader
            .grade_submission(&title, &assignment, submission, &idea, language)
            .await;

        let (grade, advance) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                debug!(stage = %id, generation, "Discarding stale grade");
                return Ok(SubmitOutcome::Superseded);
            }
            let grade = match result {
                Ok(grade) => grade,
                Err(e) => {
                    warn!(stage = %id, error = %e, "Grading failed");
                    let err = CourseError::Grading {
                        stage: id,
                        source: e,
                    };
                    state.activity(id).last_error = Some(err.clone());
                    return Err(err);
                }
            };
            let unlocked = state
                .store
                .complete(id, submission.to_string(), grade.clone())?;
            let advance = advance_after_completion(&state.store, id);
            if advance == Advance::CourseComplete {
                state.session_mut()?.set_active_stage(None);
            }
            info!(
                stage = %id,
                score = grade.score,
                unlocked = ?unlocked,
                "Stage completed"
            );
            (grade, advance)
        };
        drop(guard);

        match advance {
            Advance::To(next) => {
                if let Err(e) = self.select_in_generation(next, Some(generation)).await {
                    warn!(stage = %next, error = %e, "Auto-advance content fetch failed");
                }
            }
            Advance::CourseComplete => info!("All stages completed; business plan available"),
        }
        Ok(SubmitOutcome::Graded { grade, advance })
    }

    /// Synthesize the business plan. Only available once every stage is
    /// completed; a plan already produced for this course is returned as is.
    pub async fn generate_final_artifact(&self) -> Result<FinalizeOutcome, CourseError> {
        let (generation, idea, language, completed, _guard) = {
            let mut state = self.state.lock();
            // an empty store, with or without a course, is never fully completed
            if !state.store.is_fully_completed() {
                return Err(CourseError::Unavailable);
            }
            let (idea, language, existing) = {
                let session = state.session()?;
                (
                    session.idea().to_string(),
                    session.language(),
                    session.final_artifact().map(str::to_string),
                )
            };
            if let Some(plan) = existing {
                return Ok(FinalizeOutcome::AlreadyGenerated(plan));
            }
            if state.finalizing {
                return Err(CourseError::InvalidState(
                    "business plan generation already in progress".to_string(),
                ));
            }
            state.finalizing = true;
            state.finalization_error = None;
            let generation = state.generation;
            (
                generation,
                idea,
                language,
                state.store.completed_stages(),
                self.guard(generation, Busy::Finalize),
            )
        };

        info!(stages = completed.len(), "Generating business plan");
        let result = self
            .services
            .planner
            .generate_plan(&idea, &completed, language)
            .await;

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, "Discarding stale business plan");
            return Ok(FinalizeOutcome::Superseded);
        }
        match result {
            Ok(plan) => {
                state.session_mut()?.set_final_artifact(plan.clone());
                info!("Business plan ready");
                Ok(FinalizeOutcome::Generated(plan))
            }
            Err(e) => {
                warn!(error = %e, "Business plan generation failed");
                let err = CourseError::Finalization(e);
                state.finalization_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Forget the current course entirely.
    pub fn restart(&self) {
        let mut state = self.state.lock();
        state.discard_progress();
        state.session = None;
        info!("Course discarded");
    }

    pub fn snapshot(&self) -> CourseSnapshot {
        let state = self.state.lock();
        let stages = state
            .store
            .iter()
            .map(|stage| StageView {
                stage: stage.clone(),
                phase: state.phase(stage),
                error: state
                    .activity
                    .get(&stage.id())
                    .and_then(|a| a.last_error.clone()),
            })
            .collect();
        let session = state.session.as_ref();

        CourseSnapshot {
            generation: state.generation,
            idea: session.map(|s| s.idea().to_string()),
            language: session.map_or(state.default_language, |s| s.language()),
            stages,
            active_stage: session.and_then(|s| s.active_stage()),
            final_artifact: session.and_then(|s| s.final_artifact().map(str::to_string)),
            curriculum_loading: state.curriculum_loading,
            curriculum_error: state.curriculum_error.clone(),
            finalizing: state.finalizing,
            finalization_error: state.finalization_error.clone(),
        }
    }

    /// The currently presented stage, if any.
    pub fn active_stage(&self) -> Option<Stage> {
        let state = self.state.lock();
        let id = state.session.as_ref()?.active_stage()?;
        state.store.get(id).ok().cloned()
    }

    pub fn stage(&self, id: StageId) -> Option<Stage> {
        self.state.lock().store.get(id).ok().cloned()
    }

    pub fn is_fully_completed(&self) -> bool {
        self.state.lock().store.is_fully_completed()
    }

    pub fn language(&self) -> Language {
        let state = self.state.lock();
        state
            .session
            .as_ref()
            .map_or(state.default_language, |s| s.language())
    }
}
