//! Image encoding: `DynamicImage` → base64 PNG ready for backend dispatch.
//!
//! Both captioning backends accept inline images as base64 in the JSON
//! request body (a `data:` URL for the chat-completions wire, an
//! `inline_data` blob for the hosted API). Incoming images arrive in
//! whatever format the document embedded; re-encoding as PNG gives every
//! backend one lossless, universally accepted format.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use tracing::debug;

/// A backend-ready image payload: base64 bytes plus media type.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub base64: String,
    pub media_type: &'static str,
}

impl ImagePayload {
    /// Render as a `data:` URL for chat-completions style requests.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64)
    }
}

/// Encode a decoded image as base64 PNG.
///
/// PNG is lossless; re-compressing a diagram or text-heavy figure with a
/// lossy codec would degrade exactly the detail the caption model needs.
pub fn encode_image(img: &DynamicImage) -> Result<ImagePayload, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("encoded image payload, {} bytes base64", b64.len());

    Ok(ImagePayload {
        base64: b64,
        media_type: "image/png",
    })
}
