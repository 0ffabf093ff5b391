use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown to the user for every failed classification; the cause only goes to logs.
pub const USER_FACING_FAILURE_MESSAGE: &str =
    "An error occurred while processing the image. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Network,
    Server,
    MalformedResponse,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Network => "network",
            FailureKind::Server => "server",
            FailureKind::MalformedResponse => "malformed_response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("prediction label is empty")]
    EmptyLabel,
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
}
