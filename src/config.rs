use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Configuration {
    pub predict_url: String,
    pub health_url: String,
    pub live_interval_ms: u64,
    pub event_buffer_size: usize,
    pub samples_dir: String,
    pub narrative: Option<NarrativeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrativeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            predict_url: "http://localhost:8000/predict/".to_string(),
            health_url: "http://localhost:8000/health".to_string(),
            live_interval_ms: 1000,
            event_buffer_size: 32,
            samples_dir: "samples".to_string(),
            narrative: None,
        }
    }
}
