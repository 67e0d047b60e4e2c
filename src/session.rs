//! Per-drawing session state.
//!
//! A [`DrawingSession`] owns everything tied to the drawing currently loaded:
//! the image, the review built from the last successful analysis, and the
//! approved set. Loading a different image resets the lot; a failed analysis
//! leaves it untouched.
//!
//! ```text
//! load_image ──▶ analyze / ingest_response ──▶ review_mut … ──▶ approve_all ──▶ render
//!      ▲                                          │
//!      └──── different image resets ──────────────┘ edits drop the approved set
//! ```

use crate::annotate::analyze_drawing;
use crate::annotation::{Annotation, ApprovedSet};
use crate::config::AnnotateConfig;
use crate::error::DrawingError;
use crate::output::{AnalysisStats, RenderedDocument};
use crate::pipeline::extract::ExtractionClient;
use crate::pipeline::input::DrawingImage;
use crate::pipeline::parse::parse_response;
use crate::pipeline::render::render_document;
use crate::review::ReviewSession;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct DrawingSession {
    image: Option<DrawingImage>,
    review: Option<ReviewSession>,
    approved: Option<ApprovedSet>,
    stats: Option<AnalysisStats>,
}

impl DrawingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a drawing. Returns `true` when the session was reset.
    ///
    /// The same image (name and bytes) keeps the current review.
    pub fn load_image(&mut self, image: DrawingImage) -> bool {
        if self.image.as_ref() == Some(&image) {
            debug!("'{}' already loaded; keeping review state", image.name);
            return false;
        }
        info!("Loaded '{}'; session reset", image.name);
        *self = Self {
            image: Some(image),
            ..Self::default()
        };
        true
    }

    pub fn image(&self) -> Option<&DrawingImage> {
        self.image.as_ref()
    }

    /// Statistics for the last successful model call, if any.
    pub fn stats(&self) -> Option<&AnalysisStats> {
        self.stats.as_ref()
    }

    /// Send the loaded drawing to the model and start a fresh review.
    ///
    /// Returns the number of regions found.
    /// Progress events go to `config.progress_callback`.
    pub async fn analyze(
        &mut self,
        client: &ExtractionClient,
        config: &AnnotateConfig,
    ) -> Result<usize, DrawingError> {
        let image = self.image.as_ref().ok_or(DrawingError::NoImageLoaded)?;
        let output = analyze_drawing(image, client, config).await?;

        self.stats = Some(output.stats);
        Ok(self.start_review(output.annotations))
    }

    /// Parse a raw model reply obtained elsewhere and start a fresh review.
    pub fn ingest_response(&mut self, raw: &str) -> Result<usize, DrawingError> {
        if self.image.is_none() {
            return Err(DrawingError::NoImageLoaded);
        }
        let annotations = parse_response(raw)?;
        self.stats = None;
        Ok(self.start_review(annotations))
    }

    fn start_review(&mut self, annotations: Vec<Annotation>) -> usize {
        let regions = annotations.len();
        self.review = Some(ReviewSession::new(annotations));
        self.approved = None;
        regions
    }

    pub fn review(&self) -> Result<&ReviewSession, DrawingError> {
        self.review.as_ref().ok_or_else(|| self.not_analysed())
    }

    /// Mutable access to the review. Drops any approved set.
    pub fn review_mut(&mut self) -> Result<&mut ReviewSession, DrawingError> {
        let err = self.not_analysed();
        match self.review.as_mut() {
            Some(review) => {
                self.approved = None;
                Ok(review)
            }
            None => Err(err),
        }
    }

    /// Freeze the review and keep the result for rendering.
    pub fn approve_all(&mut self) -> Result<&ApprovedSet, DrawingError> {
        let approved = self.review()?.approve_all()?;
        Ok(self.approved.insert(approved))
    }

    pub fn approved(&self) -> Option<&ApprovedSet> {
        self.approved.as_ref()
    }

    /// Export the approved translations over the loaded drawing.
    pub async fn render(&self, config: &AnnotateConfig) -> Result<RenderedDocument, DrawingError> {
        let image = self.image.as_ref().ok_or(DrawingError::NoImageLoaded)?;
        let approved = self.approved.as_ref().ok_or_else(|| DrawingError::NotApproved {
            name: image.name.clone(),
        })?;
        render_document(image, approved, config).await
    }

    fn not_analysed(&self) -> DrawingError {
        match &self.image {
            Some(image) => DrawingError::NotAnalysed {
                name: image.name.clone(),
            },
            None => DrawingError::NoImageLoaded,
        }
    }
}
