//! Image encoding: `DrawingImage` → base64 `ImageData`.
//!
//! The uploaded bytes are sent unchanged; there is no rotation, deskew, or
//! re-encoding. The media type is the sniffed one, so JPEG uploads are not
//! mislabelled as PNG.

use crate::pipeline::input::DrawingImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Wrap a drawing as a base64 image attachment for the vision API.
///
/// `detail: "high"` keeps small note text legible to tiling models; title
/// blocks and general notes are usually the finest print on the sheet.
pub fn encode_drawing(drawing: &DrawingImage) -> ImageData {
    let b64 = STANDARD.encode(&drawing.bytes);
    debug!(
        "Encoded '{}' ({}) → {} bytes base64",
        drawing.name,
        drawing.mime_type(),
        b64.len()
    );

    ImageData::new(b64, drawing.mime_type()).with_detail("high")
}
