//! Chat-style message contract shared by every captioning backend.
//!
//! Callers (typically a document converter that hit an image it cannot
//! describe) speak the generic chat-completions shape: a list of messages,
//! each with a role and either plain text or mixed text/image parts. The
//! serde derives here match that wire format exactly, so a message list can
//! be deserialized straight from a converter's JSON.
//!
//! [`normalize_messages`] reduces that open-ended shape to what the
//! backends actually support: at most one user text segment and at most one
//! inline image, the first non-empty one of each wins. This is a deliberate
//! design limitation, not a general multimodal capability.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CaptionError;
use crate::prompts::DEFAULT_CAPTION_PROMPT;

/// Author role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Message content: plain text, or an ordered sequence of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// One segment of a mixed-content message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }
}

/// An image reference inside a message part. Inline images use a
/// `data:<media type>;base64,<payload>` URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A chat-style message passed to a captioning backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    /// Plain-text user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// Plain-text system message. Ignored by normalization, accepted for
    /// wire compatibility with chat-completions callers.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(text.into()),
        }
    }

    /// User message with explicit content parts.
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }

    /// User message carrying one text part and one image reference.
    pub fn user_with_image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self::user_parts(vec![
            ContentPart::text(text),
            ContentPart::image_url(image_url),
        ])
    }
}

/// A normalized captioning request: the effective prompt plus at most one
/// decoded image.
///
/// Produced by [`normalize_messages`]; consumed by the backend dispatch
/// methods. The prompt is never empty (the default is substituted before a
/// backend sees the request).
#[derive(Debug)]
pub struct CaptionRequest {
    pub prompt: String,
    pub image: Option<DynamicImage>,
}

/// Reduce a message list to a [`CaptionRequest`].
///
/// Scans user messages in order, taking the first non-empty text segment
/// and the first inline image. Empty segments never claim the prompt slot,
/// so a later message can still supply it; without any non-empty text the
/// default prompt substitutes. Non-user messages and image references that
/// are not `data:` URLs are skipped. A malformed inline image (bad data
/// URL, bad base64, undecodable bytes) is a backend-style failure and
/// classifies through the usual taxonomy.
pub(crate) fn normalize_messages(messages: &[ChatMessage]) -> Result<CaptionRequest, CaptionError> {
    let mut text: Option<&str> = None;
    let mut image: Option<DynamicImage> = None;

    for msg in messages {
        if msg.role != Role::User {
            continue;
        }
        match &msg.content {
            MessageContent::Text(t) => {
                if text.is_none() && !t.is_empty() {
                    text = Some(t);
                }
            }
            MessageContent::Parts(parts) => {
                for part in parts {
                    match part {
                        ContentPart::Text { text: t } => {
                            if text.is_none() && !t.is_empty() {
                                text = Some(t);
                            }
                        }
                        ContentPart::ImageUrl { image_url } => {
                            if image.is_none() {
                                image = decode_inline_image(&image_url.url)?;
                            }
                        }
                    }
                }
            }
        }
    }

    let prompt = match text {
        Some(t) => t.to_string(),
        None => DEFAULT_CAPTION_PROMPT.to_string(),
    };
    Ok(CaptionRequest { prompt, image })
}

/// Decode an inline `data:` URL into a pixel buffer.
///
/// Non-`data:` references return `Ok(None)` (skipped, a later part may
/// still provide an inline image).
fn decode_inline_image(url: &str) -> Result<Option<DynamicImage>, CaptionError> {
    if !url.starts_with("data:") {
        debug!("ignoring non-inline image reference");
        return Ok(None);
    }
    let Some((_, b64)) = url.split_once(',') else {
        return Err(CaptionError::classify(
            "malformed data URL in image reference: no comma separator",
        ));
    };
    let bytes = STANDARD
        .decode(b64)
        .map_err(|e| CaptionError::classify(format!("invalid base64 image data: {e}")))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| CaptionError::classify(format!("could not decode inline image: {e}")))?;
    Ok(Some(img))
}
