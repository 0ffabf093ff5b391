//! Async driver around [`ClassificationWorkflow`].
//!
//! Requests run on spawned tasks; their completions come back over a channel and are
//! applied by whoever calls [`ClassificationSession::next_completion`], so every state
//! change happens on the caller's task. In-flight requests are never cancelled.
//!
//! A session must be created inside a tokio runtime (or given one explicitly with
//! [`ClassificationSession::new_with_runtime`]); requests are spawned on that runtime.

use std::sync::Arc;

use shared::domain::{ImagePayload, Prediction, RequestSeq};
use tokio::{runtime::Handle, sync::mpsc};
use tracing::{debug, warn};

use crate::{
    error::ClassifyError,
    preview::PreviewAllocator,
    transport::Classifier,
    workflow::{ClassificationWorkflow, RejectedSelection, ResponseOutcome, WorkflowPhase},
};

struct Completion {
    seq: RequestSeq,
    outcome: Result<Prediction, ClassifyError>,
}

pub struct ClassificationSession {
    workflow: ClassificationWorkflow,
    classifier: Arc<dyn Classifier>,
    runtime: Handle,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    outstanding: usize,
}

impl ClassificationSession {
    /// Panics when called outside a tokio runtime.
    pub fn new(classifier: Arc<dyn Classifier>, allocator: Arc<dyn PreviewAllocator>) -> Self {
        Self::new_with_runtime(classifier, allocator, Handle::current())
    }

    pub fn new_with_runtime(
        classifier: Arc<dyn Classifier>,
        allocator: Arc<dyn PreviewAllocator>,
        runtime: Handle,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            workflow: ClassificationWorkflow::new(allocator),
            classifier,
            runtime,
            completions_tx,
            completions_rx,
            outstanding: 0,
        }
    }

    pub fn workflow(&self) -> &ClassificationWorkflow {
        &self.workflow
    }

    pub fn select(&mut self, image: ImagePayload) -> Result<(), RejectedSelection> {
        self.workflow.select(image)
    }

    pub fn reset(&mut self) {
        self.workflow.reset();
    }

    /// Issues one request if the workflow is `Ready`; otherwise does nothing.
    pub fn submit(&mut self) -> Option<RequestSeq> {
        let ticket = self.workflow.submit()?;
        let seq = ticket.seq;
        let classifier = self.classifier.clone();
        let completions_tx = self.completions_tx.clone();
        let image = ticket.image;
        let request = self
            .runtime
            .spawn(async move { classifier.classify(&image).await });
        self.runtime.spawn(async move {
            // Every request must report back, even when the classifier task dies.
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(%seq, error = %err, "classification task ended without a response");
                    Err(ClassifyError::TaskAborted(err.to_string()))
                }
            };
            if completions_tx.send(Completion { seq, outcome }).is_err() {
                debug!(%seq, "session dropped before response arrived");
            }
        });
        self.outstanding += 1;
        Some(seq)
    }

    pub fn has_outstanding(&self) -> bool {
        self.outstanding > 0
    }

    /// Waits for the next request to resolve and applies it. `None` when nothing is in flight.
    pub async fn next_completion(&mut self) -> Option<ResponseOutcome> {
        if self.outstanding == 0 {
            return None;
        }
        let completion = self.completions_rx.recv().await?;
        self.outstanding -= 1;
        Some(
            self.workflow
                .apply_response(completion.seq, completion.outcome),
        )
    }

    /// Select, submit, then wait until this submission's response has been applied.
    pub async fn classify(
        &mut self,
        image: ImagePayload,
    ) -> Result<WorkflowPhase, RejectedSelection> {
        self.select(image)?;
        if self.submit().is_none() {
            return Ok(self.workflow.phase());
        }
        while let Some(outcome) = self.next_completion().await {
            if let ResponseOutcome::Applied(phase) = outcome {
                return Ok(phase);
            }
        }
        Ok(self.workflow.phase())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
