//! The seam where a document conversion engine plugs in.

use std::path::Path;

use async_trait::async_trait;

use crate::error::RagmarkError;

/// Turns one source document into Markdown.
///
/// The crate does not ship a parser for office formats; callers bring the
/// engine they already run and implement this one method. [`crate::convert`]
/// wraps it with input validation, timing, and page-marker injection.
///
/// Implementations should map their own failures to
/// [`RagmarkError::ConversionFailed`] so callers get the uniform
/// user-facing message; richer variants (for example
/// [`RagmarkError::Caption`]) pass through untouched.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    /// Produce Markdown for the document at `path`.
    async fn to_markdown(&self, path: &Path) -> Result<String, RagmarkError>;
}
