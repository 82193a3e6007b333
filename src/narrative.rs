use crate::config::NarrativeConfig;
use crate::error::NarrativeError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

/// Presentation-layer collaborator: turns an accepted label and confidence
/// into a descriptive care report. Consumed only after a result is
/// accepted; never part of the capture pipeline.
#[async_trait]
pub trait NarrativeClient: Send + Sync {
    async fn explain(&self, label: &str, confidence: f32) -> Result<String, NarrativeError>;
}

/// OpenAI-style chat-completions client (OpenRouter and compatible
/// gateways).
pub struct ChatNarrativeClient {
    client: Client,
    config: NarrativeConfig,
}

impl ChatNarrativeClient {
    pub fn new(config: NarrativeConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl NarrativeClient for ChatNarrativeClient {
    async fn explain(&self, label: &str, confidence: f32) -> Result<String, NarrativeError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(NarrativeError::MissingApiKey)?;
        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": build_prompt(label, confidence) }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrativeError::Transport(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NarrativeError::Transport(format!(
                "status {}",
                response.status().as_u16()
            )));
        }
        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| NarrativeError::Malformed("no choices in completion".to_string()))
    }
}

fn build_prompt(label: &str, confidence: f32) -> String {
    format!(
        "You are an expert in plant pathology and gardening. In this plant \
         image, we've detected \"{condition}\" with {percent:.1}% confidence.\n\
         Please create a complete analysis report in markdown format with \
         sections: Description, Severity, Recommended Treatments, Prevention. \
         If this is a healthy plant, adjust your response accordingly. Keep \
         all information practical and focused on plant care.",
        condition = humanize_label(label),
        percent = confidence * 100.0
    )
}

/// Dataset labels come as `Crop___Condition_name`; render them readably.
pub fn humanize_label(label: &str) -> String {
    label
        .replace("___", " - ")
        .replace("__", " ")
        .replace('_', " ")
}
