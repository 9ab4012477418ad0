//! Image references handed back to callers

use crate::error::{ShipgenError, ShipgenResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;
use std::fmt;

/// Displayable image: inline bytes from the API or a placeholder URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ImageRef {
    Inline {
        mime_type: String,
        /// Base64 payload as returned by the API
        data: String,
    },
    Url(String),
}

impl ImageRef {
    /// `data:` URI or plain URL
    pub fn to_uri(&self) -> String {
        match self {
            Self::Inline { mime_type, data } => format!("data:{};base64,{}", mime_type, data),
            Self::Url(url) => url.clone(),
        }
    }

    /// Decode inline bytes; URLs have none
    pub fn decode(&self) -> ShipgenResult<Option<Vec<u8>>> {
        match self {
            Self::Inline { data, .. } => BASE64
                .decode(data.as_bytes())
                .map(Some)
                .map_err(|e| ShipgenError::Decode(e.to_string())),
            Self::Url(_) => Ok(None),
        }
    }

    /// File extension matching the payload
    pub fn extension(&self) -> &'static str {
        let mime = match self {
            Self::Inline { mime_type, .. } => mime_type.as_str(),
            Self::Url(url) => {
                if url.contains(".jpg") || url.contains(".jpeg") {
                    "image/jpeg"
                } else {
                    "image/png"
                }
            }
        };
        match mime {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "png",
        }
    }

    /// Short form for terminals: data URIs are abbreviated
    pub fn summary(&self) -> String {
        match self {
            Self::Inline { mime_type, data } => {
                format!("data:{};base64,… ({} bytes encoded)", mime_type, data.len())
            }
            Self::Url(url) => url.clone(),
        }
    }
}

/// Why a placeholder was served instead of a generated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    MissingCredentials,
    QuotaSuspended,
    QuotaExceeded,
    RequestFailed,
    NoImage,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingCredentials => "API key missing or rejected",
            Self::QuotaSuspended => "image API suspended after a quota error",
            Self::QuotaExceeded => "quota or billing limit reached",
            Self::RequestFailed => "image request failed",
            Self::NoImage => "API returned no image",
        };
        write!(f, "{}", text)
    }
}

/// Where an image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "reason", rename_all = "lowercase")]
pub enum ImageOrigin {
    Generated,
    Fallback(FallbackReason),
}

impl fmt::Display for ImageOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generated => write!(f, "generated"),
            Self::Fallback(reason) => write!(f, "placeholder: {}", reason),
        }
    }
}

/// Result of resolving a ship configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipImage {
    pub image: ImageRef,
    pub origin: ImageOrigin,
}

impl ShipImage {
    pub fn generated(image: ImageRef) -> Self {
        Self {
            image,
            origin: ImageOrigin::Generated,
        }
    }

    pub fn fallback(url: impl Into<String>, reason: FallbackReason) -> Self {
        Self {
            image: ImageRef::Url(url.into()),
            origin: ImageOrigin::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, ImageOrigin::Fallback(_))
    }
}
