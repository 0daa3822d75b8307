//! Pipeline stages for document-to-Markdown post-processing.
//!
//! Each submodule implements exactly one transformation step, independently
//! testable and free of shared state.
//!
//! ## Data Flow
//!
//! ```text
//! converter output ──▶ probe ──▶ markers
//! (raw Markdown)      (lopdf)   (splice)
//!
//! caption request ──▶ encode
//! (decoded image)     (base64 PNG)
//! ```
//!
//! 1. [`probe`]   : structural page count and Info metadata; never fails,
//!    degrades to `None`
//! 2. [`markers`] : proportional page-boundary marker injection plus the
//!    strip/count helpers
//! 3. [`encode`]  : PNG-encode and base64-wrap a decoded image for the
//!    multimodal request body

pub mod encode;
pub mod markers;
pub mod probe;
