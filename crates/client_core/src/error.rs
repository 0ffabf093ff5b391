use shared::error::{FailureKind, PredictionError};
use thiserror::Error;

/// Why a classification request ended in `Failed`. Kept for diagnostics only.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classification request failed to complete: {0}")]
    Network(#[source] reqwest::Error),
    #[error("classification service returned HTTP {status}{}", detail_suffix(.detail))]
    Server { status: u16, detail: Option<String> },
    #[error("classification response did not match the expected schema: {0}")]
    MalformedResponse(String),
    #[error("classification task ended without a response: {0}")]
    TaskAborted(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

impl ClassifyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClassifyError::Network(_) | ClassifyError::TaskAborted(_) => FailureKind::Network,
            ClassifyError::Server { .. } => FailureKind::Server,
            ClassifyError::MalformedResponse(_) => FailureKind::MalformedResponse,
        }
    }
}

impl From<PredictionError> for ClassifyError {
    fn from(value: PredictionError) -> Self {
        ClassifyError::MalformedResponse(value.to_string())
    }
}

impl From<serde_json::Error> for ClassifyError {
    fn from(value: serde_json::Error) -> Self {
        ClassifyError::MalformedResponse(value.to_string())
    }
}
