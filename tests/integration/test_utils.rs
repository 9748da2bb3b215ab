//! Shared test utilities for integration tests
//!
//! Scripted in-memory course services with call counters, failure injection
//! and one-shot gates, plus isolated XDG directories for config tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::Notify;
use warrent::error::ServiceError;
use warrent::progression::ProgressionController;
use warrent::services::{ContentGenerator, CourseServices, Grader, PlanSynthesizer};
use warrent::types::{
    CompletedStage, ContentSection, Grade, Language, StageContent, StageStub, StructuredContent,
};

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with HOME, XDG_CONFIG_HOME and XDG_DATA_HOME pointed into `test_dir`,
/// restoring the previous values afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(&str, Option<String>)> = ["HOME", "XDG_CONFIG_HOME", "XDG_DATA_HOME"]
        .into_iter()
        .map(|key| (key, std::env::var(key).ok()))
        .collect();

    let test_home = test_dir.path().join("home");
    let test_data_home = test_dir.path().join("data");
    std::fs::create_dir_all(&test_home).unwrap();
    std::fs::create_dir_all(&test_data_home).unwrap();

    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());
    std::env::set_var("XDG_DATA_HOME", &test_data_home);

    let result = f();

    for (key, value) in saved {
        match value {
            Some(value) => std::env::set_var(key, value),
            None => std::env::remove_var(key),
        }
    }
    result
}

/// Holds a single service call open until released.
#[derive(Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated call has started.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let the gated call return.
    pub fn open(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
struct Script {
    curriculum_failures: VecDeque<ServiceError>,
    content_failures: VecDeque<(String, ServiceError)>,
    grade_failures: VecDeque<ServiceError>,
    plan_failures: VecDeque<ServiceError>,
    curriculum_gate: Option<Arc<Gate>>,
    content_gate: Option<Arc<Gate>>,
    grade_gate: Option<Arc<Gate>>,
    plan_gate: Option<Arc<Gate>>,
    scores: VecDeque<f64>,
    curriculum_languages: Vec<Language>,
    content_requests: Vec<String>,
    plan_inputs: Vec<Vec<CompletedStage>>,
}

/// Deterministic stand-in for the three course services.
pub struct ScriptedServices {
    titles: Mutex<Vec<String>>,
    script: Mutex<Script>,
    pub curriculum_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
    pub grade_calls: AtomicUsize,
    pub plan_calls: AtomicUsize,
}

impl ScriptedServices {
    pub fn new(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            titles: Mutex::new(titles.iter().map(|t| t.to_string()).collect()),
            script: Mutex::new(Script::default()),
            curriculum_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
            grade_calls: AtomicUsize::new(0),
            plan_calls: AtomicUsize::new(0),
        })
    }

    /// Course of `n` stages titled "Stage 1".."Stage n".
    pub fn with_stages(n: usize) -> Arc<Self> {
        let titles: Vec<String> = (1..=n).map(|i| format!("Stage {}", i)).collect();
        let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
        Self::new(&refs)
    }

    pub fn set_titles(&self, titles: &[&str]) {
        *self.titles.lock().unwrap() = titles.iter().map(|t| t.to_string()).collect();
    }

    pub fn fail_next_curriculum(&self, err: ServiceError) {
        self.script.lock().unwrap().curriculum_failures.push_back(err);
    }

    /// Fail the next content request for the stage titled `title`.
    pub fn fail_next_content(&self, title: &str, err: ServiceError) {
        self.script
            .lock()
            .unwrap()
            .content_failures
            .push_back((title.to_string(), err));
    }

    pub fn fail_next_grade(&self, err: ServiceError) {
        self.script.lock().unwrap().grade_failures.push_back(err);
    }

    pub fn fail_next_plan(&self, err: ServiceError) {
        self.script.lock().unwrap().plan_failures.push_back(err);
    }

    pub fn push_score(&self, score: f64) {
        self.script.lock().unwrap().scores.push_back(score);
    }

    pub fn gate_next_curriculum(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script.lock().unwrap().curriculum_gate = Some(gate.clone());
        gate
    }

    pub fn gate_next_content(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script.lock().unwrap().content_gate = Some(gate.clone());
        gate
    }

    pub fn gate_next_grade(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script.lock().unwrap().grade_gate = Some(gate.clone());
        gate
    }

    pub fn gate_next_plan(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.script.lock().unwrap().plan_gate = Some(gate.clone());
        gate
    }

    pub fn curriculum_languages(&self) -> Vec<Language> {
        self.script.lock().unwrap().curriculum_languages.clone()
    }

    pub fn content_requests(&self) -> Vec<String> {
        self.script.lock().unwrap().content_requests.clone()
    }

    pub fn plan_inputs(&self) -> Vec<Vec<CompletedStage>> {
        self.script.lock().unwrap().plan_inputs.clone()
    }

    pub fn controller(self: &Arc<Self>) -> ProgressionController {
        ProgressionController::new(CourseServices::from_shared(self.clone()))
    }
}

pub fn sample_content(title: &str) -> StageContent {
    let section = |heading: &str| StructuredContent {
        title: format!("{}: {}", heading, title),
        sections: vec![ContentSection {
            subtitle: "Overview".to_string(),
            text: format!("{} material for {}", heading, title),
        }],
    };
    StageContent {
        theory: section("Theory"),
        case_study: section("Case Study"),
        practical_exercise: section("Exercise"),
        assignment: format!("Write up your {} plan", title),
    }
}

#[async_trait]
impl ContentGenerator for ScriptedServices {
    async fn generate_curriculum(
        &self,
        _idea: &str,
        language: Language,
    ) -> Result<Vec<StageStub>, ServiceError> {
        self.curriculum_calls.fetch_add(1, Ordering::SeqCst);
        // titles are captured at request time, so a gated call answers with the old outline
        let titles = self.titles.lock().unwrap().clone();
        let (gate, failure) = {
            let mut script = self.script.lock().unwrap();
            script.curriculum_languages.push(language);
            (
                script.curriculum_gate.take(),
                script.curriculum_failures.pop_front(),
            )
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(titles
            .into_iter()
            .map(|title| {
                let description = format!("About {}", title);
                StageStub::new(title, description)
            })
            .collect())
    }

    async fn generate_stage_content(
        &self,
        stage_title: &str,
        _idea: &str,
        _language: Language,
    ) -> Result<StageContent, ServiceError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let (gate, failure) = {
            let mut script = self.script.lock().unwrap();
            script.content_requests.push(stage_title.to_string());
            let failure = script
                .content_failures
                .iter()
                .position(|(title, _)| title == stage_title)
                .and_then(|i| script.content_failures.remove(i))
                .map(|(_, err)| err);
            (script.content_gate.take(), failure)
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(sample_content(stage_title))
    }
}

#[async_trait]
impl Grader for ScriptedServices {
    async fn grade_submission(
        &self,
        stage_title: &str,
        _assignment: &str,
        _submission: &str,
        _idea: &str,
        _language: Language,
    ) -> Result<Grade, ServiceError> {
        self.grade_calls.fetch_add(1, Ordering::SeqCst);
        let (gate, failure, score) = {
            let mut script = self.script.lock().unwrap();
            (
                script.grade_gate.take(),
                script.grade_failures.pop_front(),
                script.scores.pop_front().unwrap_or(85.0),
            )
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(Grade {
            score,
            feedback: format!("Solid work on {}", stage_title),
        })
    }
}

#[async_trait]
impl PlanSynthesizer for ScriptedServices {
    async fn generate_plan(
        &self,
        idea: &str,
        completed_stages: &[CompletedStage],
        _language: Language,
    ) -> Result<String, ServiceError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        let (gate, failure) = {
            let mut script = self.script.lock().unwrap();
            script.plan_inputs.push(completed_stages.to_vec());
            (script.plan_gate.take(), script.plan_failures.pop_front())
        };
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if let Some(err) = failure {
            return Err(err);
        }
        Ok(format!(
            "## 1. Executive Summary\n{} built over {} stages",
            idea,
            completed_stages.len()
        ))
    }
}

pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
