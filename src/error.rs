//! Error types for the WarrenT course engine.

use crate::types::StageId;
use thiserror::Error;

/// Failures reported by an external generation, grading or synthesis service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Provider request failed: {0}")]
    RequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    AuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Provider model not found: {0}")]
    ModelNotFound(String),

    #[error("Invalid response from provider: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Whether a manual retry of the same request has a chance of succeeding.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Provider(_)
            | ServiceError::RequestFailed(_)
            | ServiceError::RateLimit(_)
            | ServiceError::InvalidResponse(_) => true,
            ServiceError::NotConfigured(_)
            | ServiceError::AuthFailed(_)
            | ServiceError::ModelNotFound(_) => false,
        }
    }
}

/// Stage store errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Stage not found: {0}")]
    NotFound(StageId),

    #[error("Content already set for stage {0}")]
    AlreadySet(StageId),

    #[error("Stage {stage} cannot be completed: {reason}")]
    InvalidState { stage: StageId, reason: String },
}

/// Errors surfaced by the progression controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CourseError {
    #[error("Failed to generate the curriculum: {0}")]
    Curriculum(ServiceError),

    #[error("Failed to load content for stage {stage}: {source}")]
    Content { stage: StageId, source: ServiceError },

    #[error("Failed to grade the assignment for stage {stage}: {source}")]
    Grading { stage: StageId, source: ServiceError },

    #[error("Failed to generate the business plan: {0}")]
    Finalization(ServiceError),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Final artifact unavailable until every stage is completed")]
    Unavailable,

    #[error("Submission is empty")]
    EmptySubmission,

    #[error("No course has been started")]
    NoActiveCourse,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CourseError {
    /// Service failures are retryable by re-entering the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CourseError::Curriculum(_)
                | CourseError::Content { .. }
                | CourseError::Grading { .. }
                | CourseError::Finalization(_)
        )
    }
}

impl From<config::ConfigError> for CourseError {
    fn from(err: config::ConfigError) -> Self {
        CourseError::Config(err.to_string())
    }
}
