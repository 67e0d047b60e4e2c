//! PDF export: draw the drawing and the approved translations via pdfium.
//!
//! ## Page geometry
//!
//! One page, sized to the image's pixel dimensions in points, with the
//! bitmap drawn at full resolution from the origin. Each decision is drawn
//! in order: the text at its mapped anchor, then a stroke-only outline, both
//! in the accent colour. Overlapping regions simply overlap.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps a C++ library that is not safe to drive from async
//! contexts. [`render_document`] moves the work onto tokio's blocking pool;
//! [`render_blocking`] is exposed for synchronous callers.
//!
//! ## Fonts
//!
//! The configured TrueType font is embedded as a CID font so Japanese glyphs
//! survive. If it cannot be read or loaded the page falls back to the
//! built-in Helvetica and [`RenderedDocument::font_available`] is `false`.

use crate::annotation::ApprovedSet;
use crate::config::{AccentColor, AnnotateConfig};
use crate::error::DrawingError;
use crate::output::RenderedDocument;
use crate::pipeline::coords::map_bbox;
use crate::pipeline::input::DrawingImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Drawing parameters taken from [`AnnotateConfig`].
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub font_path: PathBuf,
    pub font_size: f32,
    pub accent: AccentColor,
    pub stroke_width: f32,
}

impl From<&AnnotateConfig> for RenderStyle {
    fn from(config: &AnnotateConfig) -> Self {
        Self {
            font_path: config.font_path.clone(),
            font_size: config.font_size,
            accent: config.accent,
            stroke_width: config.stroke_width,
        }
    }
}

/// Bind to a pdfium shared library.
///
/// `pdfium-auto` resolves `PDFIUM_LIB_PATH` or its cache, downloading the
/// platform build on first use. When that fails (offline, unsupported
/// platform) the working directory and the system library path are tried.
///
/// Downloads use a blocking HTTP client: call from a blocking context.
pub fn bind_pdfium() -> Result<Pdfium, DrawingError> {
    let auto_err = match pdfium_auto::bind_pdfium_silent() {
        Ok(pdfium) => return Ok(pdfium),
        Err(e) => e,
    };
    debug!("pdfium-auto unavailable ({auto_err}); trying local library");

    Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .map(Pdfium::new)
        .map_err(|e| DrawingError::PdfiumBindingFailed(format!("{auto_err}; local: {e:?}")))
}

/// Render the approved translations over the drawing.
pub async fn render_document(
    drawing: &DrawingImage,
    approved: &ApprovedSet,
    config: &AnnotateConfig,
) -> Result<RenderedDocument, DrawingError> {
    let name = drawing.name.clone();
    let bytes = drawing.bytes.clone();
    let approved = approved.clone();
    let style = RenderStyle::from(config);

    tokio::task::spawn_blocking(move || render_blocking(&name, &bytes, &approved, &style))
        .await
        .map_err(|e| DrawingError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of [`render_document`].
pub fn render_blocking(
    name: &str,
    image_bytes: &[u8],
    approved: &ApprovedSet,
    style: &RenderStyle,
) -> Result<RenderedDocument, DrawingError> {
    let image = image::load_from_memory(image_bytes).map_err(|e| DrawingError::ImageDecodeFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;
    let (width_px, height_px) = (image.width(), image.height());
    let page_width = PdfPoints::new(width_px as f32);
    let page_height = PdfPoints::new(height_px as f32);

    let pdfium = bind_pdfium()?;
    let mut document = pdfium.create_new_pdf().map_err(pdfium_err)?;
    let (font, font_available) = load_font(&mut document, &style.font_path);
    let color = PdfColor::new(style.accent.r, style.accent.g, style.accent.b, 255);

    {
        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::Custom(page_width, page_height))
            .map_err(pdfium_err)?;

        page.objects_mut()
            .create_image_object(
                PdfPoints::ZERO,
                PdfPoints::ZERO,
                &image,
                Some(page_width),
                Some(page_height),
            )
            .map_err(pdfium_err)?;

        for decision in approved {
            let rect = map_bbox(&decision.bbox, width_px, height_px);

            let mut text = page
                .objects_mut()
                .create_text_object(
                    PdfPoints::new(rect.x),
                    PdfPoints::new(rect.y),
                    &decision.approved_text,
                    font,
                    PdfPoints::new(style.font_size),
                )
                .map_err(pdfium_err)?;
            text.set_fill_color(color).map_err(pdfium_err)?;

            let (left, bottom, right, top) = rect.outline();
            page.objects_mut()
                .create_path_object_rect(
                    PdfRect::new(
                        PdfPoints::new(bottom),
                        PdfPoints::new(left),
                        PdfPoints::new(top),
                        PdfPoints::new(right),
                    ),
                    Some(color),
                    Some(PdfPoints::new(style.stroke_width)),
                    None,
                )
                .map_err(pdfium_err)?;

            debug!(
                "'{}' → ({:.1}, {:.1}) {:.1}x{:.1}",
                decision.original, rect.x, rect.y, rect.width, rect.height
            );
        }

        // Colour changes after insertion are only written out on regeneration.
        page.regenerate_content().map_err(pdfium_err)?;
    }

    let pdf = document.save_to_bytes().map_err(pdfium_err)?;
    info!(
        "Rendered '{}': {}x{} pt, {} regions, {} bytes",
        name,
        width_px,
        height_px,
        approved.len(),
        pdf.len()
    );

    Ok(RenderedDocument {
        pdf,
        font_available,
        width_px,
        height_px,
        regions: approved.len(),
    })
}

/// Load the configured font, falling back to Helvetica.
fn load_font(document: &mut PdfDocument, path: &Path) -> (PdfFontToken, bool) {
    match std::fs::read(path) {
        Ok(data) => match document.fonts_mut().load_true_type_from_bytes(&data, true) {
            Ok(token) => {
                debug!("Embedded font {}", path.display());
                return (token, true);
            }
            Err(e) => warn!(
                "Font {} could not be loaded ({:?}); falling back to Helvetica, Japanese text will not render",
                path.display(),
                e
            ),
        },
        Err(e) => warn!(
            "Font {} not readable ({}); falling back to Helvetica, Japanese text will not render",
            path.display(),
            e
        ),
    }
    (document.fonts_mut().helvetica(), false)
}

fn pdfium_err(e: PdfiumError) -> DrawingError {
    DrawingError::RenderFailure(format!("{e:?}"))
}
