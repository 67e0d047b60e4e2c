//! Pipeline stages for drawing translation.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the model-facing stages can be skipped entirely when a saved
//! reply is re-parsed.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ extract ──▶ parse ──▶ (review) ──▶ coords ──▶ render
//! (URL/path) (base64)   (VLM)      (JSON)    (human)     (bbox→pt)  (pdfium)
//! ```
//!
//! 1. [`input`]   — read a local file or download a URL, accept PNG/JPEG only
//! 2. [`encode`]  — base64-wrap the drawing for the multimodal request
//! 3. [`extract`] — one VLM call per drawing; the only stage with network I/O
//! 4. [`parse`]   — pull the JSON payload out of the reply, default missing
//!    fields
//! 5. [`coords`]  — map 0–1000 boxes onto the page, flipping the y axis
//! 6. [`render`]  — draw the image and approved text into a one-page PDF;
//!    runs in `spawn_blocking` because pdfium is not async-safe

pub mod coords;
pub mod encode;
pub mod extract;
pub mod input;
pub mod parse;
pub mod render;
