//! CLI binary for edgequake-drawing.
//!
//! A thin shim over the library crate: checks the access password, runs the
//! extraction (or loads a saved reply), walks the reviewer through every
//! region on stdin/stderr, then writes the approved overlay PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_drawing::{
    resolve_drawing, render_to_file, AccessGate, AnnotateConfig, AnnotationProgressCallback,
    DrawingError, DrawingSession, ExtractionClient, ProgressCallback, ReviewSession,
    OUTPUT_FILENAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while the model reads the drawing.
///
/// A fresh bar is created per analysis; a finished indicatif bar is not
/// reused.
struct CliProgressCallback {
    spinner: Mutex<Option<ProgressBar>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn finish(&self) {
        if let Some(bar) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            bar.finish_and_clear();
        }
    }
}

impl AnnotationProgressCallback for CliProgressCallback {
    fn on_analysis_start(&self, drawing_name: &str) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Analysing");
        bar.set_message(drawing_name.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(bar);
        }
    }

    fn on_analysis_complete(&self, regions: usize) {
        self.finish();
        eprintln!(
            "{} {} text regions found",
            green("✓"),
            bold(&regions.to_string())
        );
    }

    fn on_analysis_error(&self, error: &str) {
        self.finish();
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(['…']).collect()
        } else {
            error.to_string()
        };
        eprintln!("{} {}", red("✗"), red(&msg));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse, review interactively, write translated_drawing_verified.pdf
  drawing2pdf bracket.png

  # Keep the first candidate everywhere
  drawing2pdf --accept-defaults bracket.png -o bracket_ja.pdf

  # Save the analysis, then re-render later without another model call
  drawing2pdf bracket.png --save-annotations bracket.json
  drawing2pdf bracket.png --response bracket.json -o bracket_ja.pdf

  # Print the approved translations as JSON
  drawing2pdf --accept-defaults --json bracket.png > approved.json

REVIEW KEYS:
  Enter        keep the current choice (marked *)
  1..N         select candidate N
  e <text>     use your own translation
  s            keep current choices for all remaining regions

ENVIRONMENT VARIABLES:
  ANTHROPIC_API_KEY         Anthropic API key (default provider)
  EDGEQUAKE_LLM_PROVIDER    Override provider (anthropic, openai, gemini, ollama)
  EDGEQUAKE_MODEL           Override model ID
  DRAWING2PDF_APP_PASSWORD  Shared access password; unset means no check
  DRAWING2PDF_PASSWORD      Password to present (else prompted without echo)
  PDFIUM_LIB_PATH           Use this libpdfium instead of the cached download
  PDFIUM_AUTO_CACHE_DIR     Where the downloaded pdfium library is cached
"#;

/// Translate engineering drawings into Japanese with human review.
#[derive(Parser, Debug)]
#[command(
    name = "drawing2pdf",
    version,
    about = "Translate engineering drawings into Japanese with human review",
    long_about = "Send a PNG or JPEG engineering drawing to a Vision LLM, review the \
proposed Japanese translations region by region, and export the approved result as a \
PDF overlay on the original drawing.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PNG/JPEG path or HTTP/HTTPS URL.
    input: String,

    /// Output PDF path.
    #[arg(short, long, env = "DRAWING2PDF_OUTPUT", default_value = OUTPUT_FILENAME)]
    output: PathBuf,

    /// LLM model ID (default: claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: anthropic, openai, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// TrueType font with Japanese glyphs.
    #[arg(long, env = "DRAWING2PDF_FONT", default_value = "ipaexg.ttf")]
    font: PathBuf,

    /// Translation text size in points.
    #[arg(long, env = "DRAWING2PDF_FONT_SIZE", default_value_t = 12.0)]
    font_size: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "DRAWING2PDF_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "DRAWING2PDF_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Skip the interactive review and keep the first candidate everywhere.
    #[arg(long)]
    accept_defaults: bool,

    /// Parse a saved model reply instead of calling the model.
    #[arg(long, value_name = "FILE")]
    response: Option<PathBuf>,

    /// Write the parsed annotations as JSON (re-usable with --response).
    #[arg(long, value_name = "FILE")]
    save_annotations: Option<PathBuf>,

    /// Print the approved translations as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Access password. When required and not given it is read from the
    /// terminal without echo.
    #[arg(long, env = "DRAWING2PDF_PASSWORD")]
    password: Option<String>,

    /// Disable the spinner.
    #[arg(long, env = "DRAWING2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DRAWING2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and review prompts.
    #[arg(short, long, env = "DRAWING2PDF_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DRAWING2PDF_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters while it runs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Access gate ──────────────────────────────────────────────────────
    let gate = AccessGate::from_env();
    if gate.is_enabled() {
        let password = match cli.password.clone() {
            Some(p) => p,
            None => rpassword::prompt_password("Password: ")
                .context("Failed to read password from the terminal")?,
        };
        gate.verify(Some(password.as_str()))
            .context("Access check failed")?;
    }

    // ── Ensure PDFium engine is available ────────────────────────────────
    // First run downloads the library (~30 MB) into the pdfium-auto cache;
    // later runs only check the path.
    if !pdfium_auto::is_pdfium_cached() {
        if !cli.quiet && !cli.json {
            let dl_bar = ProgressBar::new(0);
            dl_bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {prefix:.bold}  \
                     [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏  ")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
            );
            dl_bar.set_prefix("PDF engine");
            dl_bar.set_message("Connecting…");
            dl_bar.enable_steady_tick(Duration::from_millis(80));

            let bar = dl_bar.clone();
            tokio::task::block_in_place(|| {
                pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
                    if let Some(t) = total {
                        if bar.length().unwrap_or(0) != t {
                            bar.set_length(t);
                        }
                    }
                    bar.set_position(downloaded);
                }))
            })
            .context("Failed to download PDFium engine")?;

            dl_bar.finish_with_message("ready ✓");
        } else {
            tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
                .context("Failed to download PDFium engine")?;
        }
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn AnnotationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Load + analyse ───────────────────────────────────────────────────
    let drawing = resolve_drawing(&cli.input, cli.download_timeout)
        .await
        .context("Failed to load drawing")?;
    let mut session = DrawingSession::new();
    session.load_image(drawing.clone());

    let regions = match cli.response {
        Some(ref path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read saved response from {:?}", path))?;
            session
                .ingest_response(&raw)
                .context("Saved response could not be parsed")?
        }
        None => {
            let client = ExtractionClient::from_config(&config)
                .context("Failed to set up the vision model")?;
            session
                .analyze(&client, &config)
                .await
                .context("Analysis failed")?
        }
    };

    if !cli.quiet && !show_progress {
        eprintln!("{} text regions found", regions);
    }
    if let Some(stats) = session.stats().filter(|_| !cli.quiet) {
        eprintln!(
            "   {} tokens in  /  {} tokens out  —  {}ms",
            dim(&stats.input_tokens.to_string()),
            dim(&stats.output_tokens.to_string()),
            stats.duration_ms,
        );
    }

    if let Some(ref path) = cli.save_annotations {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "annotations": session.review()?.annotations()
        }))
        .context("Failed to serialise annotations")?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write annotations to {:?}", path))?;
        if !cli.quiet {
            eprintln!("{} annotations saved to {}", green("✓"), path.display());
        }
    }

    // ── Review ───────────────────────────────────────────────────────────
    let mut pending: Vec<usize> = (0..regions).collect();
    let approved = loop {
        let mut flow = ReviewFlow::Finished;
        if !cli.accept_defaults && !pending.is_empty() {
            let review = session.review_mut()?;
            flow = tokio::task::block_in_place(|| {
                let stdin = io::stdin();
                let mut input = stdin.lock();
                run_review(review, &pending, &mut input, &mut io::stderr())
            })?;
        }

        match session.approve_all() {
            Ok(approved) => break approved.clone(),
            Err(DrawingError::IncompleteReview { regions })
                if !cli.accept_defaults && flow == ReviewFlow::Finished =>
            {
                eprintln!(
                    "{} regions {:?} still need a translation",
                    yellow("⚠"),
                    regions
                );
                pending = regions.into_iter().map(|r| r - 1).collect();
            }
            Err(e) => return Err(e).context("Review incomplete"),
        }
    };

    // ── Render ───────────────────────────────────────────────────────────
    let rendered = render_to_file(&drawing, &approved, &cli.output, &config)
        .await
        .context("Failed to export PDF")?;

    if !rendered.font_available {
        eprintln!(
            "{} font {} not found; Japanese text is missing from the PDF (use --font)",
            yellow("⚠"),
            config.font_path.display()
        );
    }
    if !cli.quiet {
        eprintln!(
            "{}  {} regions  {}x{} pt  →  {}",
            green("✔"),
            rendered.regions,
            rendered.width_px,
            rendered.height_px,
            bold(&cli.output.display().to_string()),
        );
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&approved).context("Failed to serialise output")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `AnnotateConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<AnnotateConfig> {
    let mut builder = AnnotateConfig::builder()
        .font_path(cli.font.clone())
        .font_size(cli.font_size)
        .max_tokens(cli.max_tokens)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

// ── Interactive review ───────────────────────────────────────────────────────

/// One reviewer keystroke, parsed.
#[derive(Debug, Clone, PartialEq)]
enum Choice {
    Keep,
    Select(usize),
    Override(String),
    SkipRest,
}

/// How a review pass ended.
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReviewFlow {
    Finished,
    /// Input ran out; unresolved regions cannot be fixed in this run.
    InputClosed,
}

/// Parse a reply for a region with `options` candidates.
fn parse_choice(line: &str, options: usize) -> std::result::Result<Choice, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Choice::Keep);
    }
    if line.eq_ignore_ascii_case("s") {
        return Ok(Choice::SkipRest);
    }
    if line == "e" {
        return Err("type the translation after 'e ', e.g. e キリ 6.35".into());
    }
    if let Some(text) = line.strip_prefix("e ") {
        return Ok(Choice::Override(text.trim().to_string()));
    }
    match line.parse::<usize>() {
        Ok(n) if (1..=options).contains(&n) => Ok(Choice::Select(n - 1)),
        Ok(n) if options == 0 => Err(format!(
            "no candidates to pick from (got {n}); use e <text>"
        )),
        Ok(n) => Err(format!("pick a number from 1 to {options} (got {n})")),
        Err(_) => Err(format!("unrecognised input '{line}'")),
    }
}

/// Walk the reviewer through `pending` regions (0-based).
fn run_review<R: BufRead, W: Write>(
    review: &mut ReviewSession,
    pending: &[usize],
    input: &mut R,
    out: &mut W,
) -> Result<ReviewFlow> {
    let total = review.len();

    for &index in pending {
        let annotation = review.annotation(index)?;
        writeln!(
            out,
            "\n{} {}",
            cyan(&format!("[{}/{}]", index + 1, total)),
            bold(&annotation.original)
        )?;

        let options = review.options(index)?;
        loop {
            let current = review.current_text(index)?.map(str::to_string);
            for (i, option) in options.iter().enumerate() {
                let marker = if current.as_deref() == Some(option.candidate_text.as_str()) {
                    "*"
                } else {
                    " "
                };
                writeln!(out, "  {marker} {}) {}", i + 1, option.display_label)?;
            }
            match current {
                Some(ref text) if !options.iter().any(|o| &o.candidate_text == text) => {
                    writeln!(out, "  * {}", dim(&format!("edited: {text}")))?
                }
                None => writeln!(out, "    {}", yellow("no translation yet; use e <text>"))?,
                _ => {}
            }
            write!(out, "{} ", dim("choice [Enter/1-N/e text/s]:"))?;
            out.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                return Ok(ReviewFlow::InputClosed);
            }

            match parse_choice(&line, options.len()) {
                Ok(Choice::Keep) => break,
                Ok(Choice::SkipRest) => return Ok(ReviewFlow::Finished),
                Ok(Choice::Select(i)) => {
                    review.select(index, &options[i].candidate_text)?;
                    break;
                }
                Ok(Choice::Override(text)) => {
                    review.override_text(index, &text)?;
                    break;
                }
                Err(msg) => writeln!(out, "  {}", red(&msg))?,
            }
        }
    }

    Ok(ReviewFlow::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edgequake_drawing::{Annotation, BBox, Candidate};
    use std::io::Cursor;

    fn session() -> ReviewSession {
        ReviewSession::new(vec![
            Annotation::new(
                "Drill 1/4",
                vec![
                    Candidate::new("ドリル 1/4", "Standard", "Standard"),
                    Candidate::new("キリ 1/4", "Shop Term", "Shop floor"),
                ],
                BBox::new(100.0, 200.0, 150.0, 400.0),
            ),
            Annotation::new("R5", vec![], BBox::new(300.0, 300.0, 320.0, 340.0)),
        ])
    }

    #[test]
    fn parse_choice_variants() {
        assert_eq!(parse_choice("\n", 2), Ok(Choice::Keep));
        assert_eq!(parse_choice("2", 2), Ok(Choice::Select(1)));
        assert_eq!(parse_choice(" S ", 2), Ok(Choice::SkipRest));
        assert_eq!(
            parse_choice("e キリ 6.35 通し", 2),
            Ok(Choice::Override("キリ 6.35 通し".into()))
        );
        assert!(parse_choice("3", 2).is_err());
        assert!(parse_choice("0", 2).is_err());
        assert!(parse_choice("1", 0).is_err());
        assert!(parse_choice("e", 2).is_err());
        assert!(parse_choice("yes", 2).is_err());
    }

    #[test]
    fn review_applies_choices() {
        let mut review = session();
        let mut input = Cursor::new("2\ne R5 加工\n");
        let flow = run_review(&mut review, &[0, 1], &mut input, &mut Vec::new()).unwrap();
        assert_eq!(flow, ReviewFlow::Finished);

        let approved = review.approve_all().unwrap();
        assert_eq!(approved.decisions()[0].approved_text, "キリ 1/4");
        assert_eq!(approved.decisions()[1].approved_text, "R5 加工");
    }

    #[test]
    fn invalid_input_reprompts() {
        let mut review = session();
        let mut input = Cursor::new("9\n\n");
        let mut out = Vec::new();
        run_review(&mut review, &[0], &mut input, &mut out).unwrap();
        assert_eq!(review.current_text(0).unwrap(), Some("ドリル 1/4"));
        assert!(String::from_utf8_lossy(&out).contains("pick a number from 1 to 2"));
    }

    #[test]
    fn skip_rest_leaves_defaults() {
        let mut review = session();
        let mut input = Cursor::new("s\n");
        let flow = run_review(&mut review, &[0, 1], &mut input, &mut Vec::new()).unwrap();
        assert_eq!(flow, ReviewFlow::Finished);
        assert!(matches!(
            review.approve_all(),
            Err(DrawingError::IncompleteReview { .. })
        ));
    }

    #[test]
    fn closed_input_is_reported() {
        let mut review = session();
        let mut input = Cursor::new("");
        let flow = run_review(&mut review, &[1], &mut input, &mut Vec::new()).unwrap();
        assert_eq!(flow, ReviewFlow::InputClosed);
    }

    #[test]
    fn password_prompt_does_not_echo() {
        let mut input = Cursor::new("s3cret\n");
        let mut out = Vec::new();
        let password =
            rpassword::prompt_password_from_bufread(&mut input, &mut out, "Password: ").unwrap();
        assert_eq!(password, "s3cret");
        let shown = String::from_utf8_lossy(&out);
        assert!(shown.contains("Password: "));
        assert!(!shown.contains("s3cret"));
    }

    #[test]
    fn password_flag_skips_prompt() {
        let cli = Cli::try_parse_from(["drawing2pdf", "--password", "s3cret", "a.png"]).unwrap();
        assert_eq!(cli.password.as_deref(), Some("s3cret"));
    }
}
