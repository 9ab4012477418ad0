//! Gemini `generateContent` backend

use super::{classify_failure, extract_inline_image, ImageBackend};
use crate::config::ApiConfig;
use crate::error::BackendError;
use crate::image::ImageRef;
use crate::prompt::GenerationRequest;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use tracing::{debug, info};
use ureq::Agent;

/// Inline images are base64; allow far more than ureq's default body limit
const MAX_RESPONSE_BYTES: u64 = 64 * 1024 * 1024;

/// Calls `<base_url>/models/<model>:generateContent` with an API key
#[derive(Clone)]
pub struct GeminiBackend {
    agent: Agent,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
    pub fn new(api: &ApiConfig, api_key: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(api.timeout()))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            endpoint: format!(
                "{}/models/{}:generateContent",
                api.base_url.trim_end_matches('/'),
                api.model
            ),
            model: api.model.clone(),
            api_key: api_key.into(),
        }
    }

    /// Build a backend if an API key is available in the environment
    pub fn from_config(api: &ApiConfig) -> Option<Self> {
        let key = api.resolve_key()?;
        info!("Using image model {}", api.model);
        Some(Self::new(api, key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for one image call
    pub fn payload(request: &GenerationRequest) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }]
            }],
            "generationConfig": {
                "responseModalities": ["IMAGE"],
                "imageConfig": { "aspectRatio": request.aspect_ratio }
            }
        })
    }

    /// Blocking HTTP round trip; returns the status and raw body
    fn post(&self, body: String) -> Result<(u16, String), BackendError> {
        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("x-goog-api-key", self.api_key.as_str())
            .header("Content-Type", "application/json")
            .send(body)
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .with_config()
            .limit(MAX_RESPONSE_BYTES)
            .read_to_string()
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        Ok((status, text))
    }
}

impl fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl ImageBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ImageRef, BackendError> {
        let body = serde_json::to_string(&Self::payload(request))
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;

        debug!("POST {} ({} byte prompt)", self.endpoint, request.prompt.len());
        let backend = self.clone();
        let (status, text) = tokio::task::spawn_blocking(move || backend.post(body))
            .await
            .map_err(|e| BackendError::Transport(format!("request task failed: {}", e)))??;

        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &text));
        }

        let payload: Value = serde_json::from_str(&text)
            .map_err(|e| BackendError::MalformedResponse(format!("invalid JSON: {}", e)))?;
        extract_inline_image(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let api = ApiConfig {
            base_url: "https://example.test/v1beta/".to_string(),
            ..ApiConfig::default()
        };
        let backend = GeminiBackend::new(&api, "k");
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn payload_requests_image_modality() {
        let request = GenerationRequest {
            prompt: "a ship".to_string(),
            aspect_ratio: "16:9".to_string(),
        };
        let payload = GeminiBackend::payload(&request);
        assert_eq!(payload["contents"][0]["parts"][0]["text"], "a ship");
        assert_eq!(payload["generationConfig"]["responseModalities"][0], "IMAGE");
        assert_eq!(payload["generationConfig"]["imageConfig"]["aspectRatio"], "16:9");
    }

    #[test]
    fn debug_hides_key() {
        let backend = GeminiBackend::new(&ApiConfig::default(), "secret-key");
        let shown = format!("{:?}", backend);
        assert!(!shown.contains("secret-key"));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let backend = GeminiBackend::new(&api, "k");
        let request = GenerationRequest {
            prompt: "x".to_string(),
            aspect_ratio: "16:9".to_string(),
        };
        let err = backend.generate(&request).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }
}
