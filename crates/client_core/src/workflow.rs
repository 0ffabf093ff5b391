//! The classification state machine.
//!
//! Every piece of per-attempt data lives inside the [`WorkflowState`] variant it is
//! valid for, so a result and an error can never coexist and a preview can never
//! outlive its selection. Requests are tagged with a [`RequestSeq`]; a response is
//! applied only while the workflow is still waiting on that exact sequence number.

use std::sync::Arc;

use shared::{
    domain::{ImagePayload, Prediction, RequestSeq},
    error::{FailureKind, USER_FACING_FAILURE_MESSAGE},
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    error::ClassifyError,
    preview::{PreviewAllocator, PreviewGuard, PreviewHandle},
};

#[derive(Debug)]
pub struct Selection {
    image: Arc<ImagePayload>,
    preview: PreviewGuard,
}

impl Selection {
    pub fn image(&self) -> &ImagePayload {
        &self.image
    }

    pub fn preview(&self) -> &PreviewHandle {
        self.preview.handle()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
}

impl Failure {
    pub fn message(&self) -> &'static str {
        USER_FACING_FAILURE_MESSAGE
    }
}

#[derive(Debug)]
pub enum WorkflowState {
    Idle,
    Ready {
        selection: Selection,
    },
    Submitting {
        selection: Selection,
        seq: RequestSeq,
    },
    Succeeded {
        selection: Selection,
        result: Prediction,
    },
    Failed {
        selection: Selection,
        failure: Failure,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Idle => WorkflowPhase::Idle,
            WorkflowState::Ready { .. } => WorkflowPhase::Ready,
            WorkflowState::Submitting { .. } => WorkflowPhase::Submitting,
            WorkflowState::Succeeded { .. } => WorkflowPhase::Succeeded,
            WorkflowState::Failed { .. } => WorkflowPhase::Failed,
        }
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            WorkflowState::Idle => None,
            WorkflowState::Ready { selection }
            | WorkflowState::Submitting { selection, .. }
            | WorkflowState::Succeeded { selection, .. }
            | WorkflowState::Failed { selection, .. } => Some(selection),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Idle,
    Ready,
    Submitting,
    Succeeded,
    Failed,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowPhase::Idle => "idle",
            WorkflowPhase::Ready => "ready",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::Succeeded => "succeeded",
            WorkflowPhase::Failed => "failed",
        }
    }
}

/// Request-level status; `Ready` has nothing in flight and reports `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    pub seq: RequestSeq,
    pub image: Arc<ImagePayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseOutcome {
    Applied(WorkflowPhase),
    DiscardedStale,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("selected file '{filename}' is empty")]
pub struct RejectedSelection {
    pub filename: String,
}

pub struct ClassificationWorkflow {
    state: WorkflowState,
    allocator: Arc<dyn PreviewAllocator>,
    last_seq: RequestSeq,
}

impl ClassificationWorkflow {
    pub fn new(allocator: Arc<dyn PreviewAllocator>) -> Self {
        Self {
            state: WorkflowState::Idle,
            allocator,
            last_seq: RequestSeq(0),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        match self.phase() {
            WorkflowPhase::Idle | WorkflowPhase::Ready => SubmissionStatus::Idle,
            WorkflowPhase::Submitting => SubmissionStatus::Submitting,
            WorkflowPhase::Succeeded => SubmissionStatus::Succeeded,
            WorkflowPhase::Failed => SubmissionStatus::Failed,
        }
    }

    pub fn selected_file(&self) -> Option<&ImagePayload> {
        self.state.selection().map(Selection::image)
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.state.selection().map(Selection::preview)
    }

    pub fn result(&self) -> Option<&Prediction> {
        match &self.state {
            WorkflowState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        self.failure().map(|failure| failure.message())
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|failure| failure.kind)
    }

    fn failure(&self) -> Option<&Failure> {
        match &self.state {
            WorkflowState::Failed { failure, .. } => Some(failure),
            _ => None,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.phase() == WorkflowPhase::Ready
    }

    pub fn can_reset(&self) -> bool {
        self.state.selection().is_some()
    }

    /// Replaces any current selection, including one with a request in flight.
    pub fn select(&mut self, image: ImagePayload) -> Result<(), RejectedSelection> {
        if image.is_empty() {
            warn!(filename = %image.filename, "ignoring empty image selection");
            return Err(RejectedSelection {
                filename: image.filename,
            });
        }

        let previous = self.phase();
        if let WorkflowState::Submitting { seq, .. } = &self.state {
            info!(%seq, "reselected while a request is in flight; its response will be discarded");
        }

        // Drop the old selection first so its preview is released before the next one exists.
        self.state = WorkflowState::Idle;
        let preview = PreviewGuard::allocate(self.allocator.clone(), &image);
        info!(
            filename = %image.filename,
            content_type = %image.content_type,
            size_bytes = image.size_bytes(),
            from = previous.as_str(),
            "image selected"
        );
        self.state = WorkflowState::Ready {
            selection: Selection {
                image: Arc::new(image),
                preview,
            },
        };
        Ok(())
    }

    /// Moves `Ready` to `Submitting`. Any other phase is left untouched and yields `None`.
    pub fn submit(&mut self) -> Option<SubmissionTicket> {
        match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Ready { selection } => {
                let seq = self.last_seq.next();
                self.last_seq = seq;
                let ticket = SubmissionTicket {
                    seq,
                    image: selection.image.clone(),
                };
                info!(%seq, filename = %selection.image.filename, "submitting image for classification");
                self.state = WorkflowState::Submitting { selection, seq };
                Some(ticket)
            }
            other => {
                debug!(phase = other.phase().as_str(), "submit ignored");
                self.state = other;
                None
            }
        }
    }

    pub fn apply_response(
        &mut self,
        seq: RequestSeq,
        outcome: Result<Prediction, ClassifyError>,
    ) -> ResponseOutcome {
        match std::mem::replace(&mut self.state, WorkflowState::Idle) {
            WorkflowState::Submitting {
                selection,
                seq: current,
            } if current == seq => {
                self.state = match outcome {
                    Ok(result) => {
                        info!(
                            %seq,
                            prediction = %result.prediction,
                            confidence = result.confidence,
                            "classification succeeded"
                        );
                        WorkflowState::Succeeded { selection, result }
                    }
                    Err(err) => {
                        warn!(%seq, kind = err.kind().as_str(), error = %err, "classification failed");
                        WorkflowState::Failed {
                            selection,
                            failure: Failure { kind: err.kind() },
                        }
                    }
                };
                ResponseOutcome::Applied(self.phase())
            }
            other => {
                match &outcome {
                    Ok(_) => debug!(%seq, phase = other.phase().as_str(), "discarding stale response"),
                    Err(err) => {
                        debug!(%seq, phase = other.phase().as_str(), error = %err, "discarding stale failure")
                    }
                }
                self.state = other;
                ResponseOutcome::DiscardedStale
            }
        }
    }

    pub fn reset(&mut self) {
        if matches!(self.state, WorkflowState::Idle) {
            return;
        }
        info!(from = self.phase().as_str(), "workflow reset");
        self.state = WorkflowState::Idle;
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
