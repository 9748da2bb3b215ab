//! Provider profile: the `[provider]` configuration section.

use crate::error::ServiceError;
use crate::provider::ModelProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
    Ollama,
}

impl ProviderType {
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderType::Gemini => "gemini-2.5-flash",
            ProviderType::OpenAI => "gpt-4o-mini",
            ProviderType::Ollama => "llama3.1",
        }
    }

    pub fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Ollama => None,
        }
    }
}

/// Sampling temperature per kind of request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperatures {
    #[serde(default = "default_curriculum_temperature")]
    pub curriculum: f32,
    #[serde(default = "default_content_temperature")]
    pub content: f32,
    #[serde(default = "default_grading_temperature")]
    pub grading: f32,
    #[serde(default = "default_plan_temperature")]
    pub plan: f32,
}

fn default_curriculum_temperature() -> f32 {
    0.7
}

fn default_content_temperature() -> f32 {
    0.5
}

fn default_grading_temperature() -> f32 {
    0.5
}

fn default_plan_temperature() -> f32 {
    0.6
}

impl Default for Temperatures {
    fn default() -> Self {
        Self {
            curriculum: default_curriculum_temperature(),
            content: default_content_temperature(),
            grading: default_grading_temperature(),
            plan: default_plan_temperature(),
        }
    }
}

impl Temperatures {
    fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("curriculum", self.curriculum),
            ("content", self.content),
            ("grading", self.grading),
            ("plan", self.plan),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(format!(
                    "Temperature '{}' must be between 0.0 and 2.0, got {}",
                    name, value
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_type")]
    pub provider_type: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// Inline API key; prefer `api_key_env`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,

    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperatures: Temperatures,
}

fn default_provider_type() -> ProviderType {
    ProviderType::Gemini
}

fn default_model() -> String {
    ProviderType::Gemini.default_model().to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_type: default_provider_type(),
            model: default_model(),
            api_key: None,
            api_key_env: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            temperatures: Temperatures::default(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("Model name cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("Timeout must be at least one second".to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(format!(
                    "Endpoint must start with http:// or https://, got '{}'",
                    endpoint
                ));
            }
        }
        self.temperatures.validate()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Inline key first, then the configured or provider-default env var.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Some(key.clone());
        }
        let env_name = self
            .api_key_env
            .as_deref()
            .or_else(|| self.provider_type.default_api_key_env())?;
        std::env::var(env_name).ok().filter(|k| !k.is_empty())
    }

    pub fn to_model_provider(&self) -> Result<ModelProvider, ServiceError> {
        match self.provider_type {
            ProviderType::Gemini => {
                let api_key = self.resolve_api_key().ok_or_else(|| {
                    ServiceError::NotConfigured(format!(
                        "Gemini requires an API key (set {})",
                        self.api_key_env.as_deref().unwrap_or("GEMINI_API_KEY")
                    ))
                })?;
                Ok(ModelProvider::Gemini {
                    model: self.model.clone(),
                    api_key,
                    base_url: self.endpoint.clone(),
                })
            }
            ProviderType::OpenAI => Ok(ModelProvider::OpenAI {
                model: self.model.clone(),
                api_key: self.resolve_api_key(),
                base_url: self.endpoint.clone(),
            }),
            ProviderType::Ollama => Ok(ModelProvider::Ollama {
                model: self.model.clone(),
                base_url: self.endpoint.clone(),
            }),
        }
    }
}
