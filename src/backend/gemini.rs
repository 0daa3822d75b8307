//! Hosted captioning backend: Google Gemini `generateContent`.
//!
//! One POST per caption. The normalized prompt becomes the first part of a
//! single `contents` entry; the image, when present, rides along as inline
//! base64 (`inline_data`). No request timeout is set here beyond the HTTP
//! client's defaults; the hosted service enforces its own.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backend::message::CaptionRequest;
use crate::backend::{Caption, CaptionBackend};
use crate::config::CaptionConfig;
use crate::error::{CaptionError, RagmarkError};
use crate::pipeline::encode::encode_image;

/// Public REST base. Overridable via [`GeminiBackend::with_api_base`] so
/// tests can point at a local server.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when the configuration names none.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "GOOGLE_GENAI_API_KEY";

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: Blob },
}

#[derive(Debug, Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Debug, Deserialize)]
struct ResponseCandidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

/// `text` is optional so non-text parts in a response do not abort parsing.
#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

// ── Backend ──────────────────────────────────────────────────────────────

pub struct GeminiBackend {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, RagmarkError> {
        let client = Client::builder()
            .build()
            .map_err(|e| RagmarkError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Replace the API base URL. A trailing slash is stripped.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Resolve key and model from the configuration, falling back to
    /// [`API_KEY_ENV`] for the key and [`DEFAULT_MODEL`] for the model.
    pub fn from_config(config: &CaptionConfig) -> Result<Self, RagmarkError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                RagmarkError::InvalidConfig(format!(
                    "gemini backend needs an API key: set {API_KEY_ENV} or CaptionConfig::api_key"
                ))
            })?;
        let model = config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl CaptionBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn dispatch(&self, request: CaptionRequest) -> Result<Caption, CaptionError> {
        let CaptionRequest { prompt, image } = request;

        let mut parts = vec![RequestPart::Text { text: prompt }];
        if let Some(img) = &image {
            let payload = encode_image(img)
                .map_err(|e| CaptionError::classify(format!("image encoding failed: {e}")))?;
            parts.push(RequestPart::InlineData {
                inline_data: Blob {
                    mime_type: payload.media_type.to_string(),
                    data: payload.base64,
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![RequestContent { parts }],
        };

        debug!(model = %self.model, has_image = image.is_some(), "calling gemini generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                CaptionError::classify(format!("request to captioning backend failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(CaptionError::classify(format!("HTTP {status}: {detail}")));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            CaptionError::classify(format!("invalid response from captioning backend: {e}"))
        })?;
        let text: String = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(CaptionError::classify(
                "captioning backend returned no text",
            ));
        }
        Ok(Caption { text })
    }
}
