use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    domain::{ImagePayload, Prediction, FALLBACK_CONTENT_TYPE},
    protocol::{PredictResponse, ServiceErrorBody, IMAGE_FIELD_NAME},
};
use tracing::{debug, warn};
use url::Url;

use crate::{config::ClientSettings, error::ClassifyError};

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &ImagePayload) -> Result<Prediction, ClassifyError>;
}

/// Posts the image as multipart form data to the configured endpoint. Never retries.
pub struct HttpClassifier {
    http: Client,
    endpoint: Url,
}

impl HttpClassifier {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        let endpoint = settings.endpoint_url()?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn image_part(image: &ImagePayload) -> Result<Part, ClassifyError> {
    let part = || Part::bytes(image.bytes.clone()).file_name(image.filename.clone());
    part()
        .mime_str(&image.content_type)
        .or_else(|err| {
            warn!(
                content_type = %image.content_type,
                fallback = FALLBACK_CONTENT_TYPE,
                error = %err,
                "unusable content type; sending image with fallback type"
            );
            part().mime_str(FALLBACK_CONTENT_TYPE)
        })
        .map_err(ClassifyError::Network)
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &ImagePayload) -> Result<Prediction, ClassifyError> {
        let form = Form::new().part(IMAGE_FIELD_NAME, image_part(image)?);
        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(ClassifyError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .bytes()
                .await
                .ok()
                .and_then(|body| serde_json::from_slice::<ServiceErrorBody>(&body).ok())
                .map(|body| body.error);
            return Err(ClassifyError::Server {
                status: status.as_u16(),
                detail,
            });
        }

        let body = response.bytes().await.map_err(ClassifyError::Network)?;
        debug!(status = status.as_u16(), body_len = body.len(), "classification response received");
        let parsed: PredictResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into_prediction()?)
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
