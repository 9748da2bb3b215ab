//! Shared domain value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 1-based stage identifier, contiguous within a course instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageId(u32);

impl StageId {
    pub const FIRST: StageId = StageId(1);

    pub fn new(id: u32) -> Self {
        StageId(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Direct successor id; may not exist in the store.
    pub fn next(self) -> Self {
        StageId(self.0 + 1)
    }

    /// Zero-based position of this id in a store, `None` for id 0.
    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display and response language for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    /// Instruction appended to every model prompt.
    pub fn response_instruction(self) -> &'static str {
        match self {
            Language::English => "Respond in English.",
            Language::Chinese => "Respond in Chinese (Simplified).",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "chinese" => Ok(Language::Chinese),
            other => Err(format!("Unsupported language: {} (must be 'en' or 'zh')", other)),
        }
    }
}

/// Curriculum outline entry returned by the content generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStub {
    pub title: String,
    pub description: String,
}

impl StageStub {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub subtitle: String,
    pub text: String,
}

/// A titled block of learning material split into sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredContent {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<ContentSection>,
}

/// Generated learning material for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageContent {
    pub theory: StructuredContent,
    pub case_study: StructuredContent,
    pub practical_exercise: StructuredContent,
    /// Graded assignment prompt, Markdown.
    pub assignment: String,
}

/// Result of grading one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    /// 0..=100
    pub score: f64,
    pub feedback: String,
}

impl Grade {
    pub fn passed(&self, passing_score: u8) -> bool {
        self.score >= f64::from(passing_score)
    }
}

/// Per-stage input to the plan synthesizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedStage {
    pub id: StageId,
    pub title: String,
    pub submission: String,
}
