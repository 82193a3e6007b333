use crate::capture::CapturedFrame;
use crate::config::Configuration;
use crate::error::InferenceError;
use crate::inference::wire::{HealthResponse, PredictResponse};
use crate::inference::InferenceResult;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    async fn classify(&self, frame: &CapturedFrame) -> Result<InferenceResult, InferenceError>;
}

/// reqwest-backed client for the classification endpoint: multipart POST of
/// the frame bytes, JSON decode of whichever response shape comes back.
pub struct HttpInferenceClient {
    client: Client,
    predict_url: String,
    health_url: String,
}

impl HttpInferenceClient {
    pub fn new(config: &Configuration) -> Self {
        Self {
            client: Client::new(),
            predict_url: config.predict_url.clone(),
            health_url: config.health_url.clone(),
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, InferenceError> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(InferenceError::HttpStatus(response.status().as_u16()));
        }
        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn classify(&self, frame: &CapturedFrame) -> Result<InferenceResult, InferenceError> {
        let part = Part::bytes(frame.bytes.to_vec())
            .file_name("frame.png")
            .mime_str("image/png")
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(InferenceError::HttpStatus(response.status().as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;
        let payload: PredictResponse = serde_json::from_str(&body)
            .map_err(|e| InferenceError::Malformed(format!("{e}: {body}")))?;
        Ok(payload.into())
    }
}
