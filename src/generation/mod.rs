//! Model-Backed Course Services
//!
//! Implements curriculum generation, stage content, grading and plan synthesis
//! on top of a single [`ModelProviderClient`]. Structured answers are requested
//! in JSON mode and validated before they reach the controller.

pub mod prompts;

use crate::error::ServiceError;
use crate::provider::{
    ChatMessage, CompletionOptions, ModelProviderClient, ProviderConfig, ProviderFactory,
    Temperatures,
};
use crate::services::{ContentGenerator, Grader, PlanSynthesizer};
use crate::types::{CompletedStage, Grade, Language, StageContent, StageStub};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Course services backed by a generative model.
pub struct LlmCourseServices {
    client: Arc<dyn ModelProviderClient>,
    stage_count: usize,
    temperatures: Temperatures,
}

impl LlmCourseServices {
    pub fn new(
        client: Arc<dyn ModelProviderClient>,
        stage_count: usize,
        temperatures: Temperatures,
    ) -> Self {
        Self {
            client,
            stage_count,
            temperatures,
        }
    }

    /// Build the provider client described by `config`.
    pub fn from_config(config: &ProviderConfig, stage_count: usize) -> Result<Self, ServiceError> {
        let provider = config.to_model_provider()?;
        let client = ProviderFactory::create_client(&provider, config.timeout())?;
        Ok(Self::new(
            Arc::from(client),
            stage_count,
            config.temperatures.clone(),
        ))
    }

    async fn ask(&self, prompt: String, options: CompletionOptions) -> Result<String, ServiceError> {
        let messages = vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let response = self.client.complete(messages, options).await?;
        debug!(
            provider = self.client.provider_name(),
            model = %response.model,
            total_tokens = response.usage.total_tokens,
            "Model completion received"
        );
        Ok(response.content)
    }

    async fn ask_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        temperature: f32,
    ) -> Result<T, ServiceError> {
        let raw = self.ask(prompt, CompletionOptions::json(temperature)).await?;
        parse_json(&raw)
    }
}

/// Parse a JSON answer, tolerating a surrounding Markdown code fence.
pub(crate) fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ServiceError> {
    let body = strip_code_fence(raw.trim());
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Model returned malformed JSON");
        ServiceError::InvalidResponse(format!("Malformed JSON from model: {}", e))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn validate_curriculum(stubs: Vec<StageStub>) -> Result<Vec<StageStub>, ServiceError> {
    if stubs.is_empty() {
        return Err(ServiceError::InvalidResponse(
            "Curriculum contains no stages".to_string(),
        ));
    }
    if let Some(position) = stubs.iter().position(|s| s.title.trim().is_empty()) {
        return Err(ServiceError::InvalidResponse(format!(
            "Curriculum stage {} has no title",
            position + 1
        )));
    }
    Ok(stubs)
}

#[derive(Deserialize)]
struct RawGrade {
    score: f64,
    feedback: String,
}

fn validate_grade(raw: RawGrade) -> Result<Grade, ServiceError> {
    if !raw.score.is_finite() {
        return Err(ServiceError::InvalidResponse(format!(
            "Score is not a number: {}",
            raw.score
        )));
    }
    Ok(Grade {
        score: raw.score.clamp(0.0, 100.0),
        feedback: raw.feedback,
    })
}

#[async_trait]
impl ContentGenerator for LlmCourseServices {
    async fn generate_curriculum(
        &self,
        idea: &str,
        language: Language,
    ) -> Result<Vec<StageStub>, ServiceError> {
        let prompt = prompts::curriculum(idea, self.stage_count, language);
        let stubs: Vec<StageStub> = self.ask_json(prompt, self.temperatures.curriculum).await?;
        if stubs.len() != self.stage_count {
            warn!(
                requested = self.stage_count,
                received = stubs.len(),
                "Curriculum length differs from the configured course length"
            );
        }
        validate_curriculum(stubs)
    }

    async fn generate_stage_content(
        &self,
        stage_title: &str,
        idea: &str,
        language: Language,
    ) -> Result<StageContent, ServiceError> {
        let prompt = prompts::stage_content(stage_title, idea, language);
        let content: StageContent = self.ask_json(prompt, self.temperatures.content).await?;
        if content.assignment.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(format!(
                "Stage \"{}\" content has no assignment",
                stage_title
            )));
        }
        Ok(content)
    }
}

#[async_trait]
impl Grader for LlmCourseServices {
    async fn grade_submission(
        &self,
        stage_title: &str,
        assignment: &str,
        submission: &str,
        idea: &str,
        language: Language,
    ) -> Result<Grade, ServiceError> {
        let prompt = prompts::grading(stage_title, assignment, submission, idea, language);
        let raw: RawGrade = self.ask_json(prompt, self.temperatures.grading).await?;
        validate_grade(raw)
    }
}

#[async_trait]
impl PlanSynthesizer for LlmCourseServices {
    async fn generate_plan(
        &self,
        idea: &str,
        completed_stages: &[CompletedStage],
        language: Language,
    ) -> Result<String, ServiceError> {
        let prompt = prompts::business_plan(idea, completed_stages, language);
        let plan = self
            .ask(prompt, CompletionOptions::text(self.temperatures.plan))
            .await?;
        if plan.trim().is_empty() {
            return Err(ServiceError::InvalidResponse(
                "Business plan is empty".to_string(),
            ));
        }
        Ok(plan)
    }
}
