//! # edgequake-drawing
//!
//! Translate the text on engineering drawings into Japanese with a Vision
//! Language Model, let a human approve every translation, and export the
//! result as a PDF overlay.
//!
//! ## Why a human in the loop?
//!
//! Shop-floor vocabulary is not dictionary vocabulary: "Drill 1/4" is
//! ドリル on a spec sheet and キリ at the machine. The model proposes up to
//! three candidates per text region with a category and a short rationale;
//! the reviewer picks one or types their own. Nothing is drawn until every
//! region has an approved text.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PNG/JPEG drawing
//!  │
//!  ├─ 1. Input    resolve local file or download from URL
//!  ├─ 2. Extract  one VLM call: regions + candidates + 0–1000 boxes
//!  ├─ 3. Parse    locate the JSON payload, default missing fields
//!  ├─ 4. Review   select / override per region, then approve_all
//!  └─ 5. Render   one-page PDF: image + approved text + outlines (pdfium)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_drawing::{analyze, render_to_file, AnnotateConfig, ReviewSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from ANTHROPIC_API_KEY / EDGEQUAKE_LLM_PROVIDER / …
//!     let config = AnnotateConfig::default();
//!     let (drawing, output) = analyze("bracket.png", &config).await?;
//!
//!     let mut review = ReviewSession::new(output.annotations);
//!     review.override_text(0, "キリ 6.35 通し")?;
//!
//!     let approved = review.approve_all()?;
//!     render_to_file(&drawing, &approved, "bracket.pdf", &config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `drawing2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-drawing = { version = "0.1", default-features = false }
//! ```
//!
//! ## Runtime requirements
//!
//! Rendering needs pdfium, fetched and cached by `pdfium-auto` on first use
//! (or taken from `PDFIUM_LIB_PATH`), and a TrueType font with Japanese
//! glyphs (`ipaexg.ttf` by default). Without the font the PDF is still
//! produced, in Helvetica, and Japanese text is missing.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod annotation;
pub mod auth;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod review;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::{analyze, analyze_drawing, annotate_unattended, render_to_file};
pub use annotation::{Annotation, ApprovedSet, BBox, Candidate, ReviewDecision};
pub use auth::AccessGate;
pub use config::{AccentColor, AnnotateConfig, AnnotateConfigBuilder};
pub use error::DrawingError;
pub use output::{AnalysisOutput, AnalysisStats, RenderedDocument, OUTPUT_FILENAME, PDF_MIME};
pub use pipeline::coords::{map_bbox, PageRect};
pub use pipeline::extract::{Extraction, ExtractionClient};
pub use pipeline::input::{resolve_drawing, DrawingImage};
pub use pipeline::parse::parse_response;
pub use progress::{AnnotationProgressCallback, NoopProgressCallback, ProgressCallback};
pub use review::{ReviewOption, ReviewSession};
pub use session::DrawingSession;
