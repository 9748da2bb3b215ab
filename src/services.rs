//! External Service Seams
//!
//! The progression controller talks to three asynchronous collaborators:
//! curriculum/content generation, grading, and plan synthesis. Each is a trait
//! so the controller can run against model-backed implementations
//! ([`crate::generation::LlmCourseServices`]) or in-memory doubles.

use crate::error::ServiceError;
use crate::types::{CompletedStage, Grade, Language, StageContent, StageStub};
use async_trait::async_trait;
use std::sync::Arc;

/// Generates the curriculum outline and per-stage learning material.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Ordered outline for a course about `idea`.
    async fn generate_curriculum(
        &self,
        idea: &str,
        language: Language,
    ) -> Result<Vec<StageStub>, ServiceError>;

    async fn generate_stage_content(
        &self,
        stage_title: &str,
        idea: &str,
        language: Language,
    ) -> Result<StageContent, ServiceError>;
}

/// Scores an assignment submission.
#[async_trait]
pub trait Grader: Send + Sync {
    async fn grade_submission(
        &self,
        stage_title: &str,
        assignment: &str,
        submission: &str,
        idea: &str,
        language: Language,
    ) -> Result<Grade, ServiceError>;
}

/// Produces the final business plan from every completed submission.
#[async_trait]
pub trait PlanSynthesizer: Send + Sync {
    async fn generate_plan(
        &self,
        idea: &str,
        completed_stages: &[CompletedStage],
        language: Language,
    ) -> Result<String, ServiceError>;
}

/// The three services a controller depends on.
#[derive(Clone)]
pub struct CourseServices {
    pub content: Arc<dyn ContentGenerator>,
    pub grader: Arc<dyn Grader>,
    pub planner: Arc<dyn PlanSynthesizer>,
}

impl CourseServices {
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        grader: Arc<dyn Grader>,
        planner: Arc<dyn PlanSynthesizer>,
    ) -> Self {
        Self {
            content,
            grader,
            planner,
        }
    }

    /// Use one implementation for all three services.
    pub fn from_shared<S>(services: Arc<S>) -> Self
    where
        S: ContentGenerator + Grader + PlanSynthesizer + 'static,
    {
        Self {
            content: services.clone(),
            grader: services.clone(),
            planner: services,
        }
    }
}
