//! Configuration types for drawing annotation.
//!
//! All behaviour is controlled through [`AnnotateConfig`], built via its
//! [`AnnotateConfigBuilder`]. The extraction temperature is not a knob: it
//! is pinned to zero so repeated analyses of the same drawing agree as far
//! as the model allows.

use crate::error::DrawingError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default provider when only `ANTHROPIC_API_KEY` is available.
pub const DEFAULT_PROVIDER: &str = "anthropic";

/// Default vision model.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default embedded font (IPAex Gothic covers kana and kanji).
pub const DEFAULT_FONT_PATH: &str = "ipaexg.ttf";

/// Configuration for analysing and rendering a drawing.
///
/// # Example
/// ```rust
/// use edgequake_drawing::AnnotateConfig;
///
/// let config = AnnotateConfig::builder()
///     .model("claude-sonnet-4-20250514")
///     .font_size(14.0)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnnotateConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "anthropic", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Maximum tokens the model may generate. Default: 4096.
    ///
    /// A dense drawing yields dozens of regions with three candidates each;
    /// truncating mid-object makes the whole response undecodable.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::system_prompt`].
    pub system_prompt: Option<String>,

    /// TrueType font used for translated text. Default: `ipaexg.ttf`.
    ///
    /// When it cannot be loaded the renderer falls back to Helvetica, which
    /// has no Japanese glyphs.
    pub font_path: PathBuf,

    /// Font size in points. Default: 12.
    pub font_size: f32,

    /// Colour for translated text and box outlines. Default: red.
    pub accent: AccentColor,

    /// Outline stroke width in points. Default: 1.
    pub stroke_width: f32,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional pipeline event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            max_tokens: 4096,
            system_prompt: None,
            font_path: PathBuf::from(DEFAULT_FONT_PATH),
            font_size: 12.0,
            accent: AccentColor::default(),
            stroke_width: 1.0,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnnotateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotateConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("font_path", &self.font_path)
            .field("font_size", &self.font_size)
            .field("accent", &self.accent)
            .field("stroke_width", &self.stroke_width)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn AnnotationProgressCallback>"),
            )
            .finish()
    }
}

impl AnnotateConfig {
    /// Create a new builder for `AnnotateConfig`.
    pub fn builder() -> AnnotateConfigBuilder {
        AnnotateConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnnotateConfig`].
#[derive(Debug)]
pub struct AnnotateConfigBuilder {
    config: AnnotateConfig,
}

impl AnnotateConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.font_path = path.into();
        self
    }

    pub fn font_size(mut self, pt: f32) -> Self {
        self.config.font_size = pt;
        self
    }

    pub fn accent(mut self, color: AccentColor) -> Self {
        self.config.accent = color;
        self
    }

    pub fn stroke_width(mut self, pt: f32) -> Self {
        self.config.stroke_width = pt;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnnotateConfig, DrawingError> {
        let c = &self.config;
        if !(c.font_size > 0.0) {
            return Err(DrawingError::InvalidConfig(format!(
                "Font size must be > 0, got {}",
                c.font_size
            )));
        }
        if c.max_tokens == 0 {
            return Err(DrawingError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if !(c.stroke_width >= 0.0) {
            return Err(DrawingError::InvalidConfig(format!(
                "Stroke width must be ≥ 0, got {}",
                c.stroke_width
            )));
        }
        Ok(self.config)
    }
}

/// Opaque RGB colour used for overlay text and outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl AccentColor {
    pub const RED: AccentColor = AccentColor { r: 255, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        Self::RED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = AnnotateConfig::default();
        assert_eq!(c.max_tokens, 4096);
        assert_eq!(c.font_size, 12.0);
        assert_eq!(c.font_path, PathBuf::from("ipaexg.ttf"));
        assert_eq!(c.accent, AccentColor::RED);
        assert!(c.provider.is_none());
    }

    #[test]
    fn builder_rejects_zero_font_size() {
        let err = AnnotateConfig::builder().font_size(0.0).build().unwrap_err();
        assert!(matches!(err, DrawingError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_nan_font_size() {
        assert!(AnnotateConfig::builder().font_size(f32::NAN).build().is_err());
    }

    #[test]
    fn builder_rejects_zero_max_tokens() {
        assert!(AnnotateConfig::builder().max_tokens(0).build().is_err());
    }

    #[test]
    fn builder_sets_fields() {
        let c = AnnotateConfig::builder()
            .model("gpt-4.1")
            .provider_name("openai")
            .font_path("/fonts/NotoSansJP.ttf")
            .accent(AccentColor::new(0, 0, 255))
            .stroke_width(0.5)
            .build()
            .unwrap();
        assert_eq!(c.model.as_deref(), Some("gpt-4.1"));
        assert_eq!(c.provider_name.as_deref(), Some("openai"));
        assert_eq!(c.accent, AccentColor::new(0, 0, 255));
        assert_eq!(c.stroke_width, 0.5);
    }

    #[test]
    fn debug_hides_prompt_body() {
        let c = AnnotateConfig::builder()
            .system_prompt("secret prompt text")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret prompt text"));
    }
}
