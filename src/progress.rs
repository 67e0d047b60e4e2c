//! Progress-callback trait for pipeline events.
//!
//! Inject an [`Arc<dyn AnnotationProgressCallback>`] via
//! [`crate::config::AnnotateConfigBuilder::progress_callback`] to hear about
//! the slow parts of the pipeline: the model call and the PDF export. The
//! CLI uses it to drive a spinner; a web front end could forward the same
//! events over a socket.
//!
//! # Example
//!
//! ```rust
//! use edgequake_drawing::{AnnotateConfig, AnnotationProgressCallback};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl AnnotationProgressCallback for Log {
//!     fn on_analysis_complete(&self, regions: usize) {
//!         eprintln!("{regions} regions found");
//!     }
//! }
//!
//! let config = AnnotateConfig::builder()
//!     .progress_callback(Arc::new(Log) as Arc<dyn AnnotationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipeline around its long-running steps.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnnotationProgressCallback: Send + Sync {
    /// Called just before the drawing is sent to the model.
    fn on_analysis_start(&self, drawing_name: &str) {
        let _ = drawing_name;
    }

    /// Called when the response parsed into `regions` annotations.
    fn on_analysis_complete(&self, regions: usize) {
        let _ = regions;
    }

    /// Called when extraction or parsing failed.
    fn on_analysis_error(&self, error: &str) {
        let _ = error;
    }

    /// Called after the PDF has been produced.
    ///
    /// `font_available` is `false` when the renderer fell back to the
    /// built-in Latin font.
    fn on_render_complete(&self, pdf_bytes: usize, font_available: bool) {
        let _ = (pdf_bytes, font_available);
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopProgressCallback;

impl AnnotationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnnotateConfig`].
pub type ProgressCallback = Arc<dyn AnnotationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        regions: AtomicUsize,
        errors: AtomicUsize,
        fell_back: AtomicBool,
    }

    impl AnnotationProgressCallback for TrackingCallback {
        fn on_analysis_start(&self, _drawing_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_analysis_complete(&self, regions: usize) {
            self.regions.store(regions, Ordering::SeqCst);
        }

        fn on_analysis_error(&self, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_render_complete(&self, _pdf_bytes: usize, font_available: bool) {
            self.fell_back.store(!font_available, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_analysis_start("part.png");
        cb.on_analysis_complete(3);
        cb.on_analysis_error("boom");
        cb.on_render_complete(1024, true);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();
        tracker.on_analysis_start("part.png");
        tracker.on_analysis_error("timeout");
        tracker.on_analysis_start("part.png");
        tracker.on_analysis_complete(4);
        tracker.on_render_complete(2048, false);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.regions.load(Ordering::SeqCst), 4);
        assert!(tracker.fell_back.load(Ordering::SeqCst));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn AnnotationProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_analysis_complete(0);
    }
}
