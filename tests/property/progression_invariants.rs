//! Property-based tests for unlock, completion and fetch-once guarantees

use async_trait::async_trait;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use warrent::error::{CourseError, ServiceError};
use warrent::progression::ProgressionController;
use warrent::services::{ContentGenerator, CourseServices, Grader, PlanSynthesizer};
use warrent::stage::StageStore;
use warrent::types::{
    CompletedStage, Grade, Language, StageContent, StageId, StageStub, StructuredContent,
};

fn stubs(n: usize) -> Vec<StageStub> {
    (1..=n)
        .map(|i| StageStub::new(format!("Stage {}", i), "desc"))
        .collect()
}

fn grade() -> Grade {
    Grade {
        score: 75.0,
        feedback: "ok".to_string(),
    }
}

/// Always-succeeding services that count content requests.
struct CountingServices {
    stage_count: usize,
    content_calls: AtomicUsize,
}

#[async_trait]
impl ContentGenerator for CountingServices {
    async fn generate_curriculum(
        &self,
        _idea: &str,
        _language: Language,
    ) -> Result<Vec<StageStub>, ServiceError> {
        Ok(stubs(self.stage_count))
    }

    async fn generate_stage_content(
        &self,
        stage_title: &str,
        _idea: &str,
        _language: Language,
    ) -> Result<StageContent, ServiceError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        let block = StructuredContent {
            title: stage_title.to_string(),
            sections: Vec::new(),
        };
        Ok(StageContent {
            theory: block.clone(),
            case_study: block.clone(),
            practical_exercise: block,
            assignment: format!("Assignment for {}", stage_title),
        })
    }
}

#[async_trait]
impl Grader for CountingServices {
    async fn grade_submission(
        &self,
        _stage_title: &str,
        _assignment: &str,
        _submission: &str,
        _idea: &str,
        _language: Language,
    ) -> Result<Grade, ServiceError> {
        Ok(grade())
    }
}

#[async_trait]
impl PlanSynthesizer for CountingServices {
    async fn generate_plan(
        &self,
        _idea: &str,
        _completed_stages: &[CompletedStage],
        _language: Language,
    ) -> Result<String, ServiceError> {
        Ok("plan".to_string())
    }
}

fn controller(stage_count: usize) -> (Arc<CountingServices>, ProgressionController) {
    let services = Arc::new(CountingServices {
        stage_count,
        content_calls: AtomicUsize::new(0),
    });
    let controller = ProgressionController::new(CourseServices::from_shared(services.clone()));
    (services, controller)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Stage k+1 is unlocked exactly when stage k is completed, and completion
/// never reverts, for any sequence of completion attempts.
#[test]
fn test_unlock_iff_previous_completed_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..8).prop_flat_map(|n| (Just(n), prop::collection::vec(1u32..=9, 0..24))),
            |(n, attempts)| {
                let mut store = StageStore::new();
                store.initialize(stubs(n));
                let mut completed: HashSet<u32> = HashSet::new();

                for attempt in attempts {
                    let _ = store.complete(StageId::new(attempt), "work".to_string(), grade());

                    for stage in store.iter() {
                        let k = stage.id().get();
                        if completed.contains(&k) {
                            prop_assert!(stage.is_completed(), "stage {} reverted", k);
                        }
                        if k > 1 {
                            let previous = store.get(StageId::new(k - 1)).unwrap();
                            prop_assert_eq!(!stage.is_locked(), previous.is_completed());
                        } else {
                            prop_assert!(!stage.is_locked());
                        }
                    }
                    completed.extend(
                        store
                            .iter()
                            .filter(|s| s.is_completed())
                            .map(|s| s.id().get()),
                    );
                }

                prop_assert_eq!(store.completed_count(), completed.len());
                prop_assert_eq!(store.is_fully_completed(), completed.len() == n);
                Ok(())
            },
        )
        .unwrap();
}

/// The business plan stays unavailable for every partial completion.
#[test]
fn test_final_artifact_unavailable_until_complete_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..6).prop_flat_map(|n| (Just(n), 0..n)),
            |(n, completed)| {
                let rt = runtime();
                let (_, controller) = controller(n);
                rt.block_on(async {
                    controller.start_course("Idea", Language::English).await.unwrap();
                    for k in 1..=completed {
                        controller
                            .submit_assignment(StageId::new(k as u32), "answer")
                            .await
                            .unwrap();
                    }
                    prop_assert_eq!(
                        controller.generate_final_artifact().await,
                        Err(CourseError::Unavailable)
                    );
                    Ok(())
                })
            },
        )
        .unwrap();
}

/// Repeated fetches and selections never request a stage's content twice.
#[test]
fn test_fetch_once_per_stage_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(1usize..6).prop_flat_map(|n| {
                (
                    Just(n),
                    prop::collection::vec((any::<bool>(), 1u32..=6), 0..20),
                )
            }),
            |(n, ops)| {
                let rt = runtime();
                let (services, controller) = controller(n);
                rt.block_on(async {
                    controller.start_course("Idea", Language::English).await.unwrap();
                    // Complete everything so every stage is reachable
                    for k in 1..=n {
                        controller
                            .submit_assignment(StageId::new(k as u32), "answer")
                            .await
                            .unwrap();
                    }
                    for (select, stage) in ops {
                        let id = StageId::new(stage);
                        if select {
                            let _ = controller.select_stage(id).await;
                        } else {
                            let _ = controller.fetch_content(id).await;
                        }
                    }
                    prop_assert_eq!(services.content_calls.load(Ordering::SeqCst), n);
                    Ok(())
                })
            },
        )
        .unwrap();
}
