//! Prompt text for the captioning backends.
//!
//! Centralising the prompt here keeps a single source of truth and lets unit
//! tests inspect it without touching a real backend. The constant is used
//! only when the incoming message list carries no user text segment.

/// Default prompt substituted when a caption request has no user text.
///
/// An image-only message still needs an instruction; this is the fixed
/// wording every backend receives in that case.
pub const DEFAULT_CAPTION_PROMPT: &str = "Describe this image in detail.";
