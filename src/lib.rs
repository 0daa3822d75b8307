//! # ragmark
//!
//! Document-to-Markdown conversion core for retrieval pipelines: page-aware
//! Markdown from PDFs plus pluggable image captioning.
//!
//! ## Why this crate?
//!
//! Retrieval systems chunk Markdown, and a chunk is only citable when it
//! knows which page it came from. Conversion engines emit one undivided
//! stream of text, so this crate splices `<!-- Page N -->` markers back in
//! at proportional positions, probing the PDF itself when the caller does
//! not know the page count. The second half is captioning: figures pulled
//! out of documents get described by a vision model behind one trait, with
//! a hosted (Gemini) and a self-hosted (Ollama) implementation.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Validate  existence + size limit
//!  ├─ 2. Probe     structural page count via lopdf (PDF only)
//!  ├─ 3. Engine    caller's DocumentConverter produces Markdown
//!  ├─ 4. Markers   splice <!-- Page N --> at proportional offsets
//!  └─ 5. Output    Markdown + stats
//!
//! image ── encode (PNG base64) ── CaptionBackend ── Caption
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ragmark::{convert, ConversionConfig, DocumentConverter, RagmarkError};
//! use async_trait::async_trait;
//! use std::path::Path;
//!
//! struct MyEngine;
//!
//! #[async_trait]
//! impl DocumentConverter for MyEngine {
//!     async fn to_markdown(&self, path: &Path) -> Result<String, RagmarkError> {
//!         // call out to whatever parser you run
//!         Ok(format!("# {}\n", path.display()))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let output = convert("document.pdf", &MyEngine, &config).await?;
//!     println!("{}", output.markdown);
//!     eprintln!("{} markers over {} pages",
//!         output.stats.markers_injected,
//!         output.stats.page_count.unwrap_or(0));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `ragmark` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! ragmark = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{
    Caption, CaptionBackend, CaptionRequest, ChatMessage, ContentPart, GeminiBackend,
    ImageUrl, MessageContent, OllamaBackend, Role,
};
pub use config::{BackendKind, CaptionConfig, ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, convert_sync, convert_to_file, inspect};
pub use converter::DocumentConverter;
pub use error::{CaptionError, RagmarkError};
pub use output::{ConversionOutput, ConversionStats, PdfInfo};
pub use pipeline::markers::{
    count_page_markers, inject_page_markers, page_markers, strip_page_markers, PageMarker,
};
pub use prompts::DEFAULT_CAPTION_PROMPT;
