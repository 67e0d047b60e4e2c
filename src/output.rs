//! Result types returned by the pipeline.

use crate::annotation::Annotation;
use serde::{Deserialize, Serialize};

/// Suggested file name for the exported PDF.
pub const OUTPUT_FILENAME: &str = "translated_drawing_verified.pdf";

/// MIME type of the exported document.
pub const PDF_MIME: &str = "application/pdf";

/// Statistics for one extraction call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Parsed annotations for one drawing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    /// Name of the analysed drawing.
    pub drawing: String,
    pub annotations: Vec<Annotation>,
    pub stats: AnalysisStats,
}

/// An exported single-page PDF.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub pdf: Vec<u8>,
    /// `false` when the configured font could not be loaded and the
    /// built-in Latin font was used instead. Japanese glyphs are then
    /// missing from the output.
    pub font_available: bool,
    /// Page width in points (= image width in pixels).
    pub width_px: u32,
    /// Page height in points (= image height in pixels).
    pub height_px: u32,
    /// Number of translations drawn.
    pub regions: usize,
}
