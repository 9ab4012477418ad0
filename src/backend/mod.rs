//! Image generation backends
//!
//! The service only sees the [`ImageBackend`] trait. The Gemini backend is
//! the production implementation; tests substitute scripted ones.

mod gemini;

pub use gemini::GeminiBackend;

use crate::error::BackendError;
use crate::image::ImageRef;
use crate::prompt::GenerationRequest;
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

/// Longest error body kept in messages
const MAX_ERROR_TEXT: usize = 512;

/// A text-to-image API
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Run one generation call and return the first image it produced
    async fn generate(&self, request: &GenerationRequest) -> Result<ImageRef, BackendError>;
}

/// Find the first inline image part across all candidates.
///
/// A payload without candidates, or whose candidates carry no inline data,
/// is [`BackendError::NoImage`]. A payload that is not a JSON object is
/// malformed.
pub fn extract_inline_image(payload: &Value) -> Result<ImageRef, BackendError> {
    let root = payload
        .as_object()
        .ok_or_else(|| BackendError::MalformedResponse("expected a JSON object".to_string()))?;

    let candidates = match root.get("candidates") {
        None | Some(Value::Null) => return Err(BackendError::NoImage),
        Some(Value::Array(candidates)) => candidates,
        Some(_) => {
            return Err(BackendError::MalformedResponse(
                "`candidates` is not an array".to_string(),
            ))
        }
    };

    let parts = candidates
        .iter()
        .filter_map(|candidate| candidate.get("content")?.get("parts")?.as_array())
        .flatten();

    for part in parts {
        let Some(inline) = part.get("inlineData").or_else(|| part.get("inline_data")) else {
            continue;
        };
        let data = inline.get("data").and_then(Value::as_str).unwrap_or_default();
        if data.is_empty() {
            continue;
        }
        let mime_type = inline
            .get("mimeType")
            .or_else(|| inline.get("mime_type"))
            .and_then(Value::as_str)
            .unwrap_or("image/png");

        return Ok(ImageRef::Inline {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        });
    }

    Err(BackendError::NoImage)
}

/// Turn a non-success HTTP response into a backend error.
///
/// Status 429 and bodies mentioning quota exhaustion or billing are quota
/// errors. Any other 401 or 403 means the key was rejected. Everything else
/// is a plain HTTP failure.
pub fn classify_failure(status: u16, body: &str) -> BackendError {
    let message = error_message(body);
    let lower = body.to_ascii_lowercase();
    let quota = status == 429
        || body.contains("RESOURCE_EXHAUSTED")
        || lower.contains("quota")
        || lower.contains("billing");

    if quota {
        BackendError::Quota { status, message }
    } else if status == 401 || status == 403 {
        warn!("API key rejected (HTTP {}): {}", status, message);
        BackendError::MissingCredentials
    } else {
        BackendError::Http { status, message }
    }
}

/// `error.message` from a Google-style error body, else the truncated body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")?
                .get("message")?
                .as_str()
                .map(str::to_string)
        })
        .unwrap_or_else(|| truncate(body.trim(), MAX_ERROR_TEXT))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
