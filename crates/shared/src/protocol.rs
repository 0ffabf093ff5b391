use serde::{Deserialize, Serialize};

use crate::{domain::Prediction, error::PredictionError};

pub const DEFAULT_CLASSIFY_ENDPOINT: &str = "http://localhost:5000/predict";
pub const IMAGE_FIELD_NAME: &str = "file";

/// Success body of the classification endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub prediction: String,
    pub confidence: f64,
}

impl PredictResponse {
    pub fn into_prediction(self) -> Result<Prediction, PredictionError> {
        Prediction::new(self.prediction, self.confidence)
    }
}

/// Body the service returns alongside a 400, e.g. when the `file` part is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    pub error: String,
}
