//! Top-level entry points.
//!
//! [`analyze`] and [`render_to_file`] are the two halves of the reviewed
//! flow, with a human choosing translations in between (see
//! [`crate::review::ReviewSession`]). [`annotate_unattended`] runs both
//! back to back with every region on its first candidate, for batch jobs
//! and smoke tests.

use crate::annotation::ApprovedSet;
use crate::config::AnnotateConfig;
use crate::error::DrawingError;
use crate::output::{AnalysisOutput, AnalysisStats, RenderedDocument};
use crate::pipeline::extract::{Extraction, ExtractionClient};
use crate::pipeline::input::{resolve_drawing, DrawingImage};
use crate::pipeline::parse::parse_response;
use crate::pipeline::render::render_document;
use crate::review::ReviewSession;
use std::path::Path;
use tracing::{info, warn};

/// Resolve a drawing, send it to the model and parse the reply.
///
/// Returns the drawing alongside the annotations so the caller can review
/// them and render without resolving the input again.
pub async fn analyze(
    input: impl AsRef<str>,
    config: &AnnotateConfig,
) -> Result<(DrawingImage, AnalysisOutput), DrawingError> {
    let drawing = resolve_drawing(input.as_ref(), config.download_timeout_secs).await?;
    let client = ExtractionClient::from_config(config)?;
    let output = analyze_drawing(&drawing, &client, config).await?;
    Ok((drawing, output))
}

/// Analyse an already-loaded drawing with a given client.
pub async fn analyze_drawing(
    drawing: &DrawingImage,
    client: &ExtractionClient,
    config: &AnnotateConfig,
) -> Result<AnalysisOutput, DrawingError> {
    info!("Analysing '{}'", drawing.name);
    if let Some(ref cb) = config.progress_callback {
        cb.on_analysis_start(&drawing.name);
    }

    let result = client
        .extract(drawing)
        .await
        .and_then(|extraction| into_output(drawing, extraction));
    report_analysis(&result, config);
    result
}

fn into_output(drawing: &DrawingImage, extraction: Extraction) -> Result<AnalysisOutput, DrawingError> {
    let annotations = parse_response(&extraction.raw_text)?;
    Ok(AnalysisOutput {
        drawing: drawing.name.clone(),
        annotations,
        stats: AnalysisStats {
            input_tokens: extraction.input_tokens,
            output_tokens: extraction.output_tokens,
            duration_ms: extraction.duration_ms,
        },
    })
}

fn report_analysis(result: &Result<AnalysisOutput, DrawingError>, config: &AnnotateConfig) {
    match result {
        Ok(output) => {
            info!(
                "'{}': {} regions in {}ms ({} in / {} out tokens)",
                output.drawing,
                output.annotations.len(),
                output.stats.duration_ms,
                output.stats.input_tokens,
                output.stats.output_tokens
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_analysis_complete(output.annotations.len());
            }
        }
        Err(e) => {
            warn!("Analysis failed: {}", e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_analysis_error(&e.to_string());
            }
        }
    }
}

/// Render the approved set and write the PDF to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn render_to_file(
    drawing: &DrawingImage,
    approved: &ApprovedSet,
    output_path: impl AsRef<Path>,
    config: &AnnotateConfig,
) -> Result<RenderedDocument, DrawingError> {
    let rendered = render_document(drawing, approved, config).await?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_render_complete(rendered.pdf.len(), rendered.font_available);
    }

    let path = output_path.as_ref();
    let write_err = |e| DrawingError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &rendered.pdf)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote {} ({} bytes)", path.display(), rendered.pdf.len());
    Ok(rendered)
}

/// Analyse and render without a reviewer, keeping every default choice.
///
/// Fails with [`DrawingError::IncompleteReview`] if any region came back
/// without candidates.
pub async fn annotate_unattended(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &AnnotateConfig,
) -> Result<(ApprovedSet, RenderedDocument), DrawingError> {
    let (drawing, output) = analyze(input, config).await?;
    let approved = ReviewSession::new(output.annotations).approve_all()?;
    let rendered = render_to_file(&drawing, &approved, output_path, config).await?;
    Ok((approved, rendered))
}
