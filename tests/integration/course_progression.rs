//! Integration tests for course progression: bootstrap, gating, grading,
//! auto-advance and business plan synthesis.

use crate::integration::test_utils::{calls, ScriptedServices};
use warrent::error::{CourseError, ServiceError};
use warrent::progression::{
    Advance, BootstrapOutcome, FetchOutcome, FinalizeOutcome, Selection, StagePhase,
    SubmitOutcome,
};
use warrent::stage::{CompletionState, LockState};
use warrent::types::{Language, StageId};

fn id(n: u32) -> StageId {
    StageId::new(n)
}

#[tokio::test]
async fn test_bootstrap_unlocks_first_stage_and_fetches_it() {
    let services = ScriptedServices::new(&["Ideation", "MVP", "Growth"]);
    let controller = services.controller();

    let outcome = controller
        .start_course("Meal kits for students", Language::English)
        .await
        .unwrap();
    assert_eq!(outcome, BootstrapOutcome::Ready { stage_count: 3 });

    let snapshot = controller.snapshot();
    let titles: Vec<&str> = snapshot.stages.iter().map(|v| v.stage.title()).collect();
    assert_eq!(titles, vec!["Ideation", "MVP", "Growth"]);
    assert_eq!(snapshot.stages[0].stage.lock_state(), LockState::Unlocked);
    assert_eq!(snapshot.stages[1].stage.lock_state(), LockState::Locked);
    assert_eq!(snapshot.stages[2].stage.lock_state(), LockState::Locked);
    assert_eq!(snapshot.active_stage, Some(id(1)));

    // Stage 1 content is requested without an explicit fetch
    assert_eq!(services.content_requests(), vec!["Ideation".to_string()]);
    assert_eq!(snapshot.stages[0].phase, StagePhase::ContentReady);
    assert!(!snapshot.curriculum_loading);
}

#[tokio::test]
async fn test_passing_submission_completes_and_advances() {
    let services = ScriptedServices::new(&["Ideation", "MVP", "Growth"]);
    let controller = services.controller();
    controller
        .start_course("Meal kits", Language::English)
        .await
        .unwrap();

    services.push_score(85.0);
    let outcome = controller
        .submit_assignment(id(1), "Students lack time to cook")
        .await
        .unwrap();
    match outcome {
        SubmitOutcome::Graded { grade, advance } => {
            assert_eq!(grade.score, 85.0);
            assert_eq!(advance, Advance::To(id(2)));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let first = controller.stage(id(1)).unwrap();
    assert_eq!(first.completion_state(), CompletionState::Completed);
    assert_eq!(first.submission(), Some("Students lack time to cook"));
    assert_eq!(first.score(), Some(85.0));
    assert_eq!(first.feedback(), Some("Solid work on Ideation"));
    assert!(first.result().is_some());

    let second = controller.stage(id(2)).unwrap();
    assert_eq!(second.lock_state(), LockState::Unlocked);
    assert!(second.has_content(), "auto-advance fetches the next stage");
    assert_eq!(controller.active_stage().map(|s| s.id()), Some(id(2)));
    assert_eq!(controller.stage(id(3)).unwrap().lock_state(), LockState::Locked);
}

#[tokio::test]
async fn test_low_score_still_completes_stage() {
    let services = ScriptedServices::with_stages(2);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();

    services.push_score(12.0);
    controller.submit_assignment(id(1), "thin answer").await.unwrap();
    assert!(controller.stage(id(1)).unwrap().is_completed());
    assert!(!controller.stage(id(2)).unwrap().is_locked());
}

#[tokio::test]
async fn test_full_course_enables_business_plan() {
    let services = ScriptedServices::new(&["Ideation", "MVP", "Growth"]);
    let controller = services.controller();
    controller.start_course("Pet insurance", Language::English).await.unwrap();

    for n in 1..=3 {
        assert!(matches!(
            controller.generate_final_artifact().await,
            Err(CourseError::Unavailable)
        ));
        controller
            .submit_assignment(id(n), &format!("answer {}", n))
            .await
            .unwrap();
    }

    assert!(controller.is_fully_completed());
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.active_stage, None);
    assert!(snapshot.awaiting_final_artifact());

    let plan = match controller.generate_final_artifact().await.unwrap() {
        FinalizeOutcome::Generated(plan) => plan,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(!plan.trim().is_empty());
    assert!(plan.contains("Pet insurance"));

    let inputs = services.plan_inputs();
    assert_eq!(inputs.len(), 1);
    let submissions: Vec<&str> = inputs[0].iter().map(|s| s.submission.as_str()).collect();
    assert_eq!(submissions, vec!["answer 1", "answer 2", "answer 3"]);

    // A second request returns the stored plan without another call
    assert_eq!(
        controller.generate_final_artifact().await.unwrap(),
        FinalizeOutcome::AlreadyGenerated(plan.clone())
    );
    assert_eq!(calls(&services.plan_calls), 1);
    assert_eq!(controller.snapshot().final_artifact, Some(plan));
}

#[tokio::test]
async fn test_failed_advance_fetch_is_retried_on_reselect() {
    let services = ScriptedServices::new(&["Ideation", "MVP", "Growth"]);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();

    services.fail_next_content("MVP", ServiceError::RequestFailed("timeout".to_string()));
    let outcome = controller.submit_assignment(id(1), "done").await.unwrap();
    assert!(matches!(outcome, SubmitOutcome::Graded { .. }));

    let snapshot = controller.snapshot();
    let second = snapshot.stage(id(2)).unwrap();
    assert_eq!(second.stage.lock_state(), LockState::Unlocked);
    assert!(!second.stage.has_content());
    assert_eq!(second.phase, StagePhase::NoContent);
    assert!(matches!(
        second.error,
        Some(CourseError::Content { stage, .. }) if stage == id(2)
    ));

    let selection = controller.select_stage(id(2)).await.unwrap();
    assert_eq!(selection, Selection::Selected(FetchOutcome::Fetched));
    let snapshot = controller.snapshot();
    let second = snapshot.stage(id(2)).unwrap();
    assert!(second.stage.has_content());
    assert!(second.error.is_none());
    assert_eq!(
        services.content_requests(),
        vec!["Ideation".to_string(), "MVP".to_string(), "MVP".to_string()]
    );
}

#[tokio::test]
async fn test_language_change_restarts_course() {
    let services = ScriptedServices::with_stages(3);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();
    controller.submit_assignment(id(1), "done").await.unwrap();
    let generation = controller.snapshot().generation;

    let outcome = controller.set_language(Language::Chinese).await.unwrap();
    assert_eq!(outcome, Some(BootstrapOutcome::Ready { stage_count: 3 }));

    let snapshot = controller.snapshot();
    assert!(snapshot.generation > generation);
    assert_eq!(snapshot.language, Language::Chinese);
    assert_eq!(snapshot.completed_count(), 0);
    assert_eq!(snapshot.active_stage, Some(id(1)));
    assert!(!snapshot.stages[0].stage.is_locked());
    assert!(snapshot.stages[1].stage.is_locked());
    assert_eq!(
        services.curriculum_languages(),
        vec![Language::English, Language::Chinese]
    );

    // Same language again is a no-op
    assert_eq!(controller.set_language(Language::Chinese).await.unwrap(), None);
    assert_eq!(calls(&services.curriculum_calls), 2);
}

#[tokio::test]
async fn test_language_before_start_sets_default() {
    let services = ScriptedServices::with_stages(1);
    let controller = services.controller();
    assert_eq!(controller.set_language(Language::Chinese).await.unwrap(), None);
    assert_eq!(controller.language(), Language::Chinese);
    assert_eq!(calls(&services.curriculum_calls), 0);
}

#[tokio::test]
async fn test_fetch_is_issued_once_per_stage() {
    let services = ScriptedServices::with_stages(2);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();
    assert_eq!(calls(&services.content_calls), 1);

    assert_eq!(controller.fetch_content(id(1)).await.unwrap(), FetchOutcome::Cached);
    assert_eq!(
        controller.select_stage(id(1)).await.unwrap(),
        Selection::Selected(FetchOutcome::Cached)
    );
    assert_eq!(calls(&services.content_calls), 1);
}

#[tokio::test]
async fn test_locked_stage_is_not_selectable_or_fetchable() {
    let services = ScriptedServices::with_stages(3);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();

    assert_eq!(controller.select_stage(id(3)).await.unwrap(), Selection::Ignored);
    assert_eq!(controller.select_stage(id(9)).await.unwrap(), Selection::Ignored);
    assert_eq!(controller.active_stage().map(|s| s.id()), Some(id(1)));

    assert!(matches!(
        controller.fetch_content(id(3)).await,
        Err(CourseError::InvalidState(_))
    ));
    assert!(matches!(
        controller.submit_assignment(id(2), "skip ahead").await,
        Err(CourseError::InvalidState(_))
    ));
    assert_eq!(calls(&services.content_calls), 1);
    assert_eq!(calls(&services.grade_calls), 0);
}

#[tokio::test]
async fn test_completed_stage_can_be_revisited_but_not_regraded() {
    let services = ScriptedServices::with_stages(2);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();
    controller.submit_assignment(id(1), "first").await.unwrap();

    assert_eq!(
        controller.select_stage(id(1)).await.unwrap(),
        Selection::Selected(FetchOutcome::Cached)
    );
    assert!(matches!(
        controller.submit_assignment(id(1), "second").await,
        Err(CourseError::InvalidState(_))
    ));
    assert_eq!(controller.stage(id(1)).unwrap().submission(), Some("first"));
}

#[tokio::test]
async fn test_empty_submission_is_rejected_without_grading() {
    let services = ScriptedServices::with_stages(1);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();

    assert_eq!(
        controller.submit_assignment(id(1), "  \n\t").await,
        Err(CourseError::EmptySubmission)
    );
    assert_eq!(calls(&services.grade_calls), 0);
    assert_eq!(controller.snapshot().stages[0].phase, StagePhase::ContentReady);
}

#[tokio::test]
async fn test_grading_failure_allows_resubmission() {
    let services = ScriptedServices::with_stages(2);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();

    services.fail_next_grade(ServiceError::RateLimit("slow down".to_string()));
    let err = controller.submit_assignment(id(1), "answer").await.unwrap_err();
    assert!(matches!(err, CourseError::Grading { stage, .. } if stage == id(1)));
    assert!(err.is_retryable());

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.stages[0].phase, StagePhase::ContentReady);
    assert!(snapshot.stages[1].stage.is_locked());

    controller.submit_assignment(id(1), "answer").await.unwrap();
    assert!(controller.stage(id(1)).unwrap().is_completed());
}

#[tokio::test]
async fn test_curriculum_failure_then_retry() {
    let services = ScriptedServices::with_stages(2);
    services.fail_next_curriculum(ServiceError::RequestFailed("503".to_string()));
    let controller = services.controller();

    let err = controller
        .start_course("Idea", Language::English)
        .await
        .unwrap_err();
    assert!(matches!(err, CourseError::Curriculum(_)));
    let snapshot = controller.snapshot();
    assert!(snapshot.is_started());
    assert!(snapshot.stages.is_empty());
    assert!(snapshot.curriculum_error.is_some());
    assert_eq!(calls(&services.content_calls), 0);

    let outcome = controller.bootstrap_curriculum().await.unwrap();
    assert_eq!(outcome, BootstrapOutcome::Ready { stage_count: 2 });
    let snapshot = controller.snapshot();
    assert!(snapshot.curriculum_error.is_none());
    assert_eq!(snapshot.stages.len(), 2);
}

#[tokio::test]
async fn test_empty_curriculum_is_an_error() {
    let services = ScriptedServices::new(&[]);
    let controller = services.controller();
    let err = controller
        .start_course("Idea", Language::English)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CourseError::Curriculum(ServiceError::InvalidResponse(_))
    ));
    assert!(controller.snapshot().stages.is_empty());
    assert!(!controller.is_fully_completed());
}

#[tokio::test]
async fn test_operations_without_course() {
    let services = ScriptedServices::with_stages(1);
    let controller = services.controller();

    assert_eq!(
        controller.bootstrap_curriculum().await,
        Err(CourseError::NoActiveCourse)
    );
    assert_eq!(
        controller.generate_final_artifact().await,
        Err(CourseError::Unavailable)
    );
    assert!(matches!(
        controller.start_course("   ", Language::English).await,
        Err(CourseError::InvalidState(_))
    ));
    assert!(!controller.snapshot().is_started());
}

#[tokio::test]
async fn test_finalization_failure_can_be_retried() {
    let services = ScriptedServices::with_stages(1);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();
    controller.submit_assignment(id(1), "done").await.unwrap();

    services.fail_next_plan(ServiceError::Provider("overloaded".to_string()));
    let err = controller.generate_final_artifact().await.unwrap_err();
    assert!(matches!(err, CourseError::Finalization(_)));
    let snapshot = controller.snapshot();
    assert!(snapshot.finalization_error.is_some());
    assert!(!snapshot.finalizing);
    assert!(snapshot.final_artifact.is_none());

    assert!(matches!(
        controller.generate_final_artifact().await.unwrap(),
        FinalizeOutcome::Generated(_)
    ));
    assert!(controller.snapshot().finalization_error.is_none());
}

#[tokio::test]
async fn test_restart_discards_course() {
    let services = ScriptedServices::with_stages(2);
    let controller = services.controller();
    controller.start_course("Idea", Language::English).await.unwrap();
    controller.restart();

    let snapshot = controller.snapshot();
    assert!(!snapshot.is_started());
    assert!(snapshot.stages.is_empty());
    assert_eq!(controller.active_stage(), None);
}
