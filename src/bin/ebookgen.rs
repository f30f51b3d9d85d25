//! CLI binary for edgequake-ebook.
//!
//! A thin shim over the library crate that maps CLI flags to a
//! `GenerationRequest` + `GenerationConfig`, writes the PDF and prints a
//! summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_ebook::{
    generate_to_file, CoverStyle, EbookError, GenerationConfig, GenerationProgressCallback,
    GenerationRequest, LayoutOptions, ProgressCallback, Stage, Tone,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner with one log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    stage_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self {
            bar,
            stage_started: Mutex::new(None),
        })
    }

    fn stage_elapsed(&self) -> f64 {
        self.stage_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_generation_start(&self, total_stages: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Generating eBook in {total_stages} stages…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut t) = self.stage_started.lock() {
            *t = Some(Instant::now());
        }
        self.bar.set_prefix("Generating");
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        self.bar.println(format!(
            "  {} {:<12} {:<14} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>7} bytes")),
            dim(&format!("{:.1}s", self.stage_elapsed())),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<12} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            dim(&format!("{:.1}s", self.stage_elapsed())),
        ));
        self.bar.finish_and_clear();
    }

    fn on_pacing(&self, next: Stage, pause: Duration) {
        self.bar.set_prefix("Waiting");
        self.bar
            .set_message(format!("{:.1}s before the {next}", pause.as_secs_f64()));
    }

    fn on_layout_complete(&self, page_count: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} laid out {} pages",
            green("✔"),
            bold(&page_count.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Five-chapter eBook in English, written to the current directory
  ebookgen "The history of the internet"

  # Three chapters in Portuguese with a secondary theme
  ebookgen "Oceans" --chapters 3 --language pt --secondary-topic "pirates"

  # Children's book with a longer pause between provider calls
  ebookgen "A brave little turtle" --children --pacing-ms 5000 -o books/

  # Keep the generated text next to the PDF and print a JSON summary
  ebookgen "Volcanoes" --save-markdown --json

TONES:
  default (professional and educational), professional, casual, academic,
  playful, or any custom text.

COVER STYLES:
  story-theme (default), minimalist, simple, or any custom text.

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY     Google Gemini API key (also GOOGLE_API_KEY, API_KEY)
  EBOOKGEN_*         Fallback for every flag, e.g. EBOOKGEN_LANGUAGE=pt
  RUST_LOG           Override the log filter
"#;

/// Generate an illustrated PDF eBook about a topic.
#[derive(Parser, Debug)]
#[command(
    name = "ebookgen",
    version,
    about = "Generate an illustrated PDF eBook about any topic",
    long_about = "Generate an illustrated, paginated PDF eBook: the text (with web citations), \
a front cover and a back cover are produced by Google Gemini one after another, then laid \
out on A4 pages with a clickable source list.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Main topic of the eBook.
    topic: String,

    /// Additional theme woven through the book.
    #[arg(long, env = "EBOOKGEN_SECONDARY_TOPIC")]
    secondary_topic: Option<String>,

    /// Language code: pt, en, es, fr, de (others are passed verbatim).
    #[arg(short, long, env = "EBOOKGEN_LANGUAGE", default_value = "en")]
    language: String,

    /// Number of chapters (1–20).
    #[arg(long, env = "EBOOKGEN_CHAPTERS", default_value_t = 5,
          value_parser = clap::value_parser!(u8).range(1..=20))]
    chapters: u8,

    /// Writing tone (ignored for children's books).
    #[arg(long, env = "EBOOKGEN_TONE", default_value = "default")]
    tone: String,

    /// Cover art style.
    #[arg(long, env = "EBOOKGEN_COVER_STYLE", default_value = "story-theme")]
    cover_style: String,

    /// Write a children's book (ages 5–8, no web search, no sources).
    #[arg(long, env = "EBOOKGEN_CHILDREN")]
    children: bool,

    /// Directory the PDF is written to.
    #[arg(short, long, env = "EBOOKGEN_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Pause between provider calls in milliseconds.
    #[arg(long, env = "EBOOKGEN_PACING_MS", default_value_t = 2000)]
    pacing_ms: u64,

    /// Text model id.
    #[arg(long, env = "EBOOKGEN_TEXT_MODEL")]
    text_model: Option<String>,

    /// Image model id.
    #[arg(long, env = "EBOOKGEN_IMAGE_MODEL")]
    image_model: Option<String>,

    /// Gemini API key (falls back to GEMINI_API_KEY / GOOGLE_API_KEY / API_KEY).
    #[arg(long, env = "EBOOKGEN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Heading of the sources page (default depends on --language).
    #[arg(long, env = "EBOOKGEN_SOURCES_HEADING")]
    sources_heading: Option<String>,

    /// Footer page label, followed by the page number (default depends on --language).
    #[arg(long, env = "EBOOKGEN_PAGE_LABEL")]
    page_label: Option<String>,

    /// Footer attribution line (default depends on --language).
    #[arg(long, env = "EBOOKGEN_ATTRIBUTION")]
    attribution: Option<String>,

    /// Per-call HTTP timeout in seconds.
    #[arg(long, env = "EBOOKGEN_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Also write the generated text as `<name>.md` next to the PDF.
    #[arg(long, env = "EBOOKGEN_SAVE_MARKDOWN")]
    save_markdown: bool,

    /// Print a JSON summary on stdout.
    #[arg(long, env = "EBOOKGEN_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "EBOOKGEN_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EBOOKGEN_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EBOOKGEN_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level library logs when it is active.
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

    // ── Build request + config ───────────────────────────────────────────
    let mut request = GenerationRequest::new(cli.topic.clone())
        .language(cli.language.clone())
        .chapters(cli.chapters)
        .tone(Tone::from(cli.tone.clone()))
        .cover_style(CoverStyle::from(cli.cover_style.clone()))
        .children_mode(cli.children);
    if let Some(ref theme) = cli.secondary_topic {
        request = request.secondary_topic(theme.clone());
    }

    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb = spinner
        .clone()
        .map(|cb| cb as Arc<dyn GenerationProgressCallback>);
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let result = generate_to_file(&request, &cli.output_dir, &config).await;
    clear_on_error(spinner.as_deref(), &result);
    let (path, output) = match result {
        Ok(done) => done,
        Err(e @ EbookError::RateLimited { .. }) => {
            // A single, friendly line; the user's only option is to wait.
            eprintln!("{} {}", red("✘"), e);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("eBook generation failed"),
    };

    let markdown_path = if cli.save_markdown {
        let md_path = path.with_extension("md");
        tokio::fs::write(&md_path, &output.document.body)
            .await
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        Some(md_path)
    } else {
        None
    };

    // ── Summary ──────────────────────────────────────────────────────────
    if cli.json {
        let summary = serde_json::json!({
            "title": output.title,
            "pdf": path,
            "markdown": markdown_path,
            "sources": output.document.sources,
            "stats": output.stats,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
        );
    } else if !cli.quiet {
        let stats = &output.stats;
        eprintln!(
            "{}  {}  {} pages  {}ms  →  {}",
            green("✔"),
            bold(&output.title),
            stats.page_count,
            stats.total_duration_ms,
            bold(&path.display().to_string()),
        );
        eprintln!(
            "   {} chapters (requested {})  /  {} sources",
            dim(&stats.chapter_headings.to_string()),
            stats.requested_chapters,
            dim(&stats.source_count.to_string()),
        );
        if let Some(md) = markdown_path {
            eprintln!("   text saved to {}", md.display());
        }
    }

    Ok(())
}

/// Map CLI args to `GenerationConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .pacing(Duration::from_millis(cli.pacing_ms))
        .api_timeout_secs(cli.api_timeout)
        .layout(layout_options(cli));

    if let Some(ref model) = cli.text_model {
        builder = builder.text_model(model.clone());
    }
    if let Some(ref model) = cli.image_model {
        builder = builder.image_model(model.clone());
    }
    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Layout and write failures happen after the last stage callback, so the
/// spinner would otherwise still be drawn under the error message.
fn clear_on_error<T, E>(spinner: Option<&CliProgressCallback>, result: &Result<T, E>) {
    if let (Some(cb), Err(_)) = (spinner, result) {
        cb.bar.finish_and_clear();
    }
}

/// Labels in the book's language, with any flag overriding its default.
fn layout_options(cli: &Cli) -> LayoutOptions {
    let mut options = LayoutOptions::for_language(&cli.language);
    if let Some(ref heading) = cli.sources_heading {
        options.sources_heading = heading.clone();
    }
    if let Some(ref label) = cli.page_label {
        options.page_label = label.clone();
    }
    if let Some(ref line) = cli.attribution {
        options.attribution = line.clone();
    }
    options
}
