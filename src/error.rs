//! Error types for the edgequake-drawing library.
//!
//! Every failure is local to one pipeline stage and reported synchronously to
//! the action that triggered it. None of them poison the session: after any
//! `Err(DrawingError)` the caller can fix the input and try again.
//!
//! Font fallback during rendering is not an error. It is
//! reported through [`crate::output::RenderedDocument::font_available`] so a
//! front end can warn about degraded glyphs without aborting the export.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-drawing library.
#[derive(Debug, Error)]
pub enum DrawingError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Drawing not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are not a PNG or JPEG image.
    #[error("'{name}' is not a PNG or JPEG image (first bytes: {magic:?})")]
    UnsupportedImage { name: String, magic: Vec<u8> },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The remote model call failed (network, auth, quota). Not retried.
    #[error("Extraction failed: {message}")]
    ExtractionFailure { message: String },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// No structured payload could be located or decoded in the model
    /// response. The raw response is never embedded in the message.
    #[error("The model response could not be read as annotations: {reason}\nRun the analysis again.")]
    MalformedResponse { reason: String },

    // ── Review errors ─────────────────────────────────────────────────────
    /// A region index outside the annotation list. `index` is 0-based;
    /// the message shows the 1-based region number.
    #[error("Region {} does not exist (drawing has {total} regions)", .index + 1)]
    RegionOutOfRange { index: usize, total: usize },

    /// `select` named a text that is not one of the region's candidates.
    #[error("'{text}' is not a candidate for region {}", .region + 1)]
    UnknownCandidate { region: usize, text: String },

    /// Approval attempted while some regions have neither a selection nor
    /// an override. `regions` holds 1-based region numbers.
    #[error("Review incomplete: regions {regions:?} need a translation before approval")]
    IncompleteReview { regions: Vec<usize> },

    // ── Session errors ────────────────────────────────────────────────────
    /// An action needed an image but none has been loaded.
    #[error("No drawing loaded")]
    NoImageLoaded,

    /// Review requested before any analysis produced annotations.
    #[error("Drawing '{name}' has not been analysed yet")]
    NotAnalysed { name: String },

    /// Rendering requested before the review was approved.
    #[error("Annotations for '{name}' have not been approved yet")]
    NotApproved { name: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// The source image could not be decoded. Fatal for rendering.
    #[error("Failed to decode drawing '{name}': {detail}")]
    ImageDecodeFailed { name: String, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
The automatic download failed. Check network access, or set\n\
PDFIUM_LIB_PATH=/path/to/libpdfium.\n"
    )]
    PdfiumBindingFailed(String),

    /// pdfium returned an error while building the output document.
    #[error("PDF rendering failed: {0}")]
    RenderFailure(String),

    // ── Access errors ─────────────────────────────────────────────────────
    /// The shared secret was missing or did not match.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
