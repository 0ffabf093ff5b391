use super::*;

use crate::preview::{ImagePreviewAllocator, PreviewStats};

fn image(name: &str) -> ImagePayload {
    ImagePayload::new(
        name,
        Some("image/jpeg".to_string()),
        format!("bytes-of-{name}").into_bytes(),
    )
}

fn workflow() -> (ClassificationWorkflow, Arc<ImagePreviewAllocator>) {
    let allocator = Arc::new(ImagePreviewAllocator::new());
    (ClassificationWorkflow::new(allocator.clone()), allocator)
}

fn recyclable() -> Prediction {
    Prediction::new("recyclable", 0.92).expect("valid prediction")
}

fn server_error() -> ClassifyError {
    ClassifyError::Server {
        status: 500,
        detail: None,
    }
}

fn assert_idle(workflow: &ClassificationWorkflow, allocator: &ImagePreviewAllocator) {
    assert_eq!(workflow.phase(), WorkflowPhase::Idle);
    assert_eq!(workflow.submission_status(), SubmissionStatus::Idle);
    assert!(workflow.selected_file().is_none());
    assert!(workflow.preview().is_none());
    assert!(workflow.result().is_none());
    assert!(workflow.error_message().is_none());
    assert_eq!(allocator.stats().live, 0);
}

#[test]
fn starts_idle_with_nothing_selected() {
    let (workflow, allocator) = workflow();
    assert_idle(&workflow, &allocator);
    assert!(!workflow.can_submit());
    assert!(!workflow.can_reset());
}

#[test]
fn select_moves_to_ready_with_a_preview() {
    let (mut workflow, allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");

    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert_eq!(workflow.submission_status(), SubmissionStatus::Idle);
    assert_eq!(workflow.selected_file().map(|f| f.filename.as_str()), Some("a.jpg"));
    assert_eq!(
        workflow.preview().map(|p| p.filename.as_str()),
        Some("a.jpg")
    );
    assert!(workflow.can_submit());
    assert!(workflow.can_reset());
    assert_eq!(allocator.stats().live, 1);
}

#[test]
fn preview_allocations_track_selects_and_reset() {
    let (mut workflow, allocator) = workflow();
    for name in ["a.jpg", "b.jpg", "c.jpg", "d.jpg"] {
        workflow.select(image(name)).expect("select");
    }
    assert_eq!(
        allocator.stats(),
        PreviewStats {
            allocated: 4,
            released: 3,
            live: 1
        }
    );

    workflow.reset();
    assert_eq!(
        allocator.stats(),
        PreviewStats {
            allocated: 4,
            released: 4,
            live: 0
        }
    );

    workflow.reset();
    assert_eq!(allocator.stats().released, 4);
}

#[test]
fn submit_without_selection_is_a_no_op() {
    let (mut workflow, allocator) = workflow();
    assert!(workflow.submit().is_none());
    assert_idle(&workflow, &allocator);
}

#[test]
fn submit_while_submitting_is_a_no_op() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");
    let ticket = workflow.submit().expect("first submit");
    assert_eq!(ticket.seq, RequestSeq(1));
    assert_eq!(ticket.image.filename, "a.jpg");
    assert_eq!(workflow.submission_status(), SubmissionStatus::Submitting);

    assert!(workflow.submit().is_none());
    assert!(matches!(
        workflow.state(),
        WorkflowState::Submitting { seq, .. } if *seq == RequestSeq(1)
    ));
    assert!(!workflow.can_submit());
}

#[test]
fn success_response_stores_result() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("bottle.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");

    let outcome = workflow.apply_response(ticket.seq, Ok(recyclable()));

    assert_eq!(outcome, ResponseOutcome::Applied(WorkflowPhase::Succeeded));
    assert_eq!(workflow.submission_status(), SubmissionStatus::Succeeded);
    assert_eq!(workflow.result(), Some(&recyclable()));
    assert!(workflow.error_message().is_none());
    assert_eq!(
        workflow.selected_file().map(|f| f.filename.as_str()),
        Some("bottle.jpg")
    );
}

#[test]
fn server_failure_stores_fixed_message_only() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("bottle.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");

    let outcome = workflow.apply_response(ticket.seq, Err(server_error()));

    assert_eq!(outcome, ResponseOutcome::Applied(WorkflowPhase::Failed));
    assert_eq!(workflow.error_message(), Some(USER_FACING_FAILURE_MESSAGE));
    assert_eq!(workflow.failure_kind(), Some(FailureKind::Server));
    assert!(workflow.result().is_none());
}

#[test]
fn malformed_response_fails() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("bottle.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");

    workflow.apply_response(
        ticket.seq,
        Err(ClassifyError::MalformedResponse("missing field `prediction`".into())),
    );

    assert_eq!(workflow.phase(), WorkflowPhase::Failed);
    assert_eq!(workflow.failure_kind(), Some(FailureKind::MalformedResponse));
    assert_eq!(workflow.error_message(), Some(USER_FACING_FAILURE_MESSAGE));
}

#[test]
fn finished_attempts_require_reselection_before_submitting_again() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");
    workflow.apply_response(ticket.seq, Err(server_error()));

    assert!(workflow.submit().is_none());
    assert_eq!(workflow.phase(), WorkflowPhase::Failed);

    workflow.select(image("a.jpg")).expect("reselect");
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert!(workflow.error_message().is_none());
    let retry = workflow.submit().expect("submit after reselect");
    assert_eq!(retry.seq, RequestSeq(2));
    workflow.apply_response(retry.seq, Ok(recyclable()));

    assert!(workflow.submit().is_none());
    assert_eq!(workflow.phase(), WorkflowPhase::Succeeded);
}

#[test]
fn reselect_clears_previous_result() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");
    workflow.apply_response(ticket.seq, Ok(recyclable()));

    workflow.select(image("b.jpg")).expect("select");
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert!(workflow.result().is_none());
    assert!(workflow.error_message().is_none());
}

#[test]
fn reset_from_every_phase_returns_to_idle() {
    for target in [
        WorkflowPhase::Idle,
        WorkflowPhase::Ready,
        WorkflowPhase::Submitting,
        WorkflowPhase::Succeeded,
        WorkflowPhase::Failed,
    ] {
        let (mut workflow, allocator) = workflow();
        if target != WorkflowPhase::Idle {
            workflow.select(image("a.jpg")).expect("select");
        }
        if matches!(
            target,
            WorkflowPhase::Submitting | WorkflowPhase::Succeeded | WorkflowPhase::Failed
        ) {
            let ticket = workflow.submit().expect("submit");
            match target {
                WorkflowPhase::Succeeded => {
                    workflow.apply_response(ticket.seq, Ok(recyclable()));
                }
                WorkflowPhase::Failed => {
                    workflow.apply_response(ticket.seq, Err(server_error()));
                }
                _ => {}
            }
        }
        assert_eq!(workflow.phase(), target);

        workflow.reset();
        assert_idle(&workflow, &allocator);
    }
}

#[test]
fn response_for_superseded_selection_is_discarded() {
    let (mut workflow, allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select a");
    let ticket_a = workflow.submit().expect("submit a");

    workflow.select(image("b.jpg")).expect("select b");
    let outcome = workflow.apply_response(ticket_a.seq, Ok(recyclable()));

    assert_eq!(outcome, ResponseOutcome::DiscardedStale);
    assert_eq!(workflow.phase(), WorkflowPhase::Ready);
    assert_eq!(
        workflow.selected_file().map(|f| f.filename.as_str()),
        Some("b.jpg")
    );
    assert!(workflow.result().is_none());
    assert!(workflow.error_message().is_none());
    assert_eq!(allocator.stats().live, 1);
}

#[test]
fn older_response_does_not_complete_newer_submission() {
    let (mut workflow, _allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select a");
    let ticket_a = workflow.submit().expect("submit a");
    workflow.select(image("b.jpg")).expect("select b");
    let ticket_b = workflow.submit().expect("submit b");

    assert_eq!(
        workflow.apply_response(ticket_a.seq, Err(server_error())),
        ResponseOutcome::DiscardedStale
    );
    assert_eq!(workflow.phase(), WorkflowPhase::Submitting);

    assert_eq!(
        workflow.apply_response(ticket_b.seq, Ok(recyclable())),
        ResponseOutcome::Applied(WorkflowPhase::Succeeded)
    );
}

#[test]
fn response_after_reset_is_discarded() {
    let (mut workflow, allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");
    let ticket = workflow.submit().expect("submit");
    workflow.reset();

    assert_eq!(
        workflow.apply_response(ticket.seq, Ok(recyclable())),
        ResponseOutcome::DiscardedStale
    );
    assert_idle(&workflow, &allocator);
}

#[test]
fn empty_selection_is_rejected_without_touching_state() {
    let (mut workflow, allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");

    let err = workflow
        .select(ImagePayload::new("empty.jpg", None, Vec::new()))
        .expect_err("must reject");
    assert_eq!(err.filename, "empty.jpg");
    assert_eq!(
        workflow.selected_file().map(|f| f.filename.as_str()),
        Some("a.jpg")
    );
    assert_eq!(allocator.stats().allocated, 1);
}

#[test]
fn dropping_workflow_releases_active_preview() {
    let (mut workflow, allocator) = workflow();
    workflow.select(image("a.jpg")).expect("select");
    workflow.submit().expect("submit");
    drop(workflow);
    assert_eq!(
        allocator.stats(),
        PreviewStats {
            allocated: 1,
            released: 1,
            live: 0
        }
    );
}
