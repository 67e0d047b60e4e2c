//! Extraction client: send the drawing to the vision model, get raw text back.
//!
//! This stage only talks to the provider. It does not look inside the
//! response; a reply without a usable payload is the parser's concern.
//! Nothing here retries: a remote failure is surfaced verbatim as
//! [`DrawingError::ExtractionFailure`] and the user re-triggers analysis.

use crate::config::{AnnotateConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::DrawingError;
use crate::pipeline::encode::encode_drawing;
use crate::pipeline::input::DrawingImage;
use crate::prompts::{system_prompt, USER_INSTRUCTION};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Sampling temperature for every extraction call.
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Raw model reply plus call statistics.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub raw_text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub duration_ms: u64,
}

/// Thin wrapper around a vision-capable provider.
#[derive(Clone)]
pub struct ExtractionClient {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    max_tokens: usize,
}

impl std::fmt::Debug for ExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionClient")
            .field("provider", &"<dyn LLMProvider>")
            .field("system_prompt_len", &self.system_prompt.len())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ExtractionClient {
    /// Wrap an already-resolved provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &AnnotateConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| system_prompt().to_string()),
            max_tokens: config.max_tokens,
        }
    }

    /// Resolve a provider from config/environment and wrap it.
    pub fn from_config(config: &AnnotateConfig) -> Result<Self, DrawingError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }

    /// Send one drawing and return the model's raw reply.
    ///
    /// ## Message Layout
    ///
    /// 1. **System message**: framing, glossary, few-shot examples, rules
    /// 2. **User message**: the drawing as an image attachment plus
    ///    [`USER_INSTRUCTION`]
    pub async fn extract(&self, drawing: &DrawingImage) -> Result<Extraction, DrawingError> {
        let start = Instant::now();
        let messages = build_messages(&self.system_prompt, drawing);
        let options = build_options(self.max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("Extraction for '{}' failed: {}", drawing.name, e);
                DrawingError::ExtractionFailure {
                    message: e.to_string(),
                }
            })?;

        let duration = start.elapsed();
        debug!(
            "'{}': {} input tokens, {} output tokens, {:?}",
            drawing.name, response.prompt_tokens, response.completion_tokens, duration
        );

        Ok(Extraction {
            raw_text: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
            duration_ms: duration.as_millis() as u64,
        })
    }
}

/// Assemble the two-message request for one drawing.
fn build_messages(system_prompt: &str, drawing: &DrawingImage) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_prompt),
        ChatMessage::user_with_images(USER_INSTRUCTION, vec![encode_drawing(drawing)]),
    ]
}

/// Build `CompletionOptions`. Temperature is always pinned.
fn build_options(max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(EXTRACTION_TEMPERATURE),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DrawingError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DrawingError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **Anthropic key** (`ANTHROPIC_API_KEY`) with [`DEFAULT_MODEL`].
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &AnnotateConfig) -> Result<Arc<dyn LLMProvider>, DrawingError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        info!("Using provider '{}' with model '{}'", name, model);
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            info!("Using provider '{}' with model '{}' from environment", prov, env_model);
            return create_vision_provider(&prov, &env_model);
        }
    }

    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            info!("Using provider '{}' with model '{}'", DEFAULT_PROVIDER, model);
            return create_vision_provider(DEFAULT_PROVIDER, model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DrawingError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set ANTHROPIC_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn drawing() -> DrawingImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg).unwrap();
        DrawingImage::from_bytes("sheet.jpg", buf).unwrap()
    }

    #[test]
    fn build_options_pins_temperature() {
        let config = AnnotateConfig::builder().max_tokens(2048).build().unwrap();
        let opts = build_options(config.max_tokens);
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn build_messages_sends_system_then_user() {
        let msgs = build_messages("SYSTEM", &drawing());
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "SYSTEM");
        assert_eq!(msgs[1].content, USER_INSTRUCTION);
    }
}
