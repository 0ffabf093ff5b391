use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            pub fn next(self) -> Self {
                Self(self.0 + 1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(RequestSeq);
id_newtype!(PreviewId);

pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw image bytes as picked by the user, sent to the classifier untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImagePayload {
    pub fn new(
        filename: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string()),
            bytes: bytes.into(),
        }
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn new(prediction: impl Into<String>, confidence: f64) -> Result<Self, PredictionError> {
        let prediction = prediction.into();
        if prediction.trim().is_empty() {
            return Err(PredictionError::EmptyLabel);
        }
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(PredictionError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            prediction,
            confidence,
        })
    }

    pub fn confidence_percent(&self) -> f64 {
        self.confidence * 100.0
    }
}
