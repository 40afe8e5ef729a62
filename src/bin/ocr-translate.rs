//! CLI binary for edgequake-translate.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `TranslatorConfig`, drives a `TranslationSession` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_translate::{
    languages, ConnectionState, TranslationSession, TranslatorConfig, UploadedFile,
};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # OCR an image (images always go through the model)
  ocr-translate extract scan.png

  # Heuristic text from a PDF, or OCR of its first page
  ocr-translate extract invoice.pdf
  ocr-translate extract --ocr invoice.pdf

  # Translate a file to English and save the result
  ocr-translate translate letter.docx --to en --save-dir ./out

  # Translate inline text or stdin
  ocr-translate translate --text "Bonjour tout le monde" --from fr --to de
  cat notes.txt | ocr-translate translate --to ro

  # Check the server, or follow its state
  ocr-translate status
  ocr-translate status --watch --interval 10

LANGUAGES:
  tr Türkçe (default target)   en English   fr Français   de Deutsch   ro Română
  auto lets the model detect the source language.

SUPPORTED FILES:
  Images (png, jpg, jpeg, gif, bmp, webp)  OCR, resized to ≤1024 px
  PDF                                      literal-string scrape, or --ocr for page 1
  Plain text (.txt)                        read as UTF-8
  Word / Excel (.doc, .docx, .xls, .xlsx)  printable-character heuristic

ENVIRONMENT VARIABLES:
  OLLAMA_HOST                 Inference server base URL (default http://localhost:11434)
  OCR_TRANSLATE_MODEL         Model ID (default llama3.2-vision)
  OCR_TRANSLATE_TIMEOUT       Per-request timeout in seconds (default: none)
  PDFIUM_LIB_PATH             Path to an existing libpdfium for PDF OCR
  RUST_LOG                    Overrides the log filter
"#;

/// Extract text from documents and images and translate it with a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-translate",
    version,
    about = "Extract text from documents and images and translate it with a local LLM",
    long_about = "Extract text from images (via OCR), PDFs, plain text and office files, then \
translate it with a vision-capable model on an Ollama-compatible server.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Inference server base URL.
    #[arg(long, global = true, env = "OLLAMA_HOST")]
    base_url: Option<String>,

    /// Model ID (must be vision-capable for OCR).
    #[arg(long, global = true, env = "OCR_TRANSLATE_MODEL")]
    model: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "OCR_TRANSLATE_TIMEOUT")]
    timeout: Option<u64>,

    /// Path to the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Send images to the model as uploaded, without resizing or re-encoding.
    #[arg(long, global = true, env = "OCR_TRANSLATE_NO_NORMALIZE")]
    no_normalize: bool,

    /// Output JSON instead of plain text.
    #[arg(long, global = true, env = "OCR_TRANSLATE_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "OCR_TRANSLATE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except results and errors.
    #[arg(short, long, global = true, env = "OCR_TRANSLATE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the text extracted from a file.
    Extract {
        /// File to read.
        file: PathBuf,

        /// OCR PDFs (first page) instead of scraping their text.
        #[arg(long)]
        ocr: bool,
    },

    /// Translate a file, inline text, or stdin.
    Translate {
        /// File to read. Reads stdin when neither FILE nor --text is given.
        #[arg(conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Text to translate.
        #[arg(long)]
        text: Option<String>,

        /// Source language code, or `auto`.
        #[arg(long, default_value = languages::AUTO)]
        from: String,

        /// Target language code.
        #[arg(long, default_value = "tr")]
        to: String,

        /// OCR PDFs (first page) instead of scraping their text.
        #[arg(long)]
        ocr: bool,

        /// Also save the translation as translation_{from}_to_{to}_{time}.txt here.
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },

    /// Check whether the inference server is reachable.
    Status {
        /// Keep running and print every state change.
        #[arg(long)]
        watch: bool,

        /// Seconds between probes when watching.
        #[arg(long, default_value_t = 30)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_spinner = !cli.quiet && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_spinner {
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

    let config = build_config(&cli)?;
    let session = TranslationSession::start(config).context("Failed to start session")?;

    let result = match &cli.command {
        Command::Extract { file, ocr } => run_extract(&cli, &session, file, *ocr).await,
        Command::Translate {
            file,
            text,
            from,
            to,
            ocr,
            save_dir,
        } => {
            session
                .set_languages(from.as_str(), to.as_str())
                .context("Invalid language selection")?;
            run_translate(
                &cli,
                &session,
                file.as_deref(),
                text.as_deref(),
                *ocr,
                save_dir.as_deref(),
            )
            .await
        }
        Command::Status { watch, .. } => run_status(&cli, &session, *watch).await,
    };

    session.shutdown().await;
    result
}

/// Map CLI args to `TranslatorConfig`.
fn build_config(cli: &Cli) -> Result<TranslatorConfig> {
    let mut builder = TranslatorConfig::builder().normalize_images(!cli.no_normalize);

    if let Some(ref url) = cli.base_url {
        builder = builder.base_url(with_scheme(url));
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.as_str());
    }
    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref path) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }
    if let Command::Status { interval, .. } = cli.command {
        builder = builder.health_interval_secs(interval);
    }

    builder.build().context("Invalid configuration")
}

/// `OLLAMA_HOST` is often given as `host:port`.
fn with_scheme(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    }
}

fn spinner(enabled: bool, msg: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("Working");
    bar.set_message(msg.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

/// Make sure libpdfium is on disk before the first PDF render.
///
/// Without `--pdfium-lib` the engine is downloaded (~30 MB) on the very first
/// PDF OCR and cached; later runs only check the cache.
fn ensure_pdf_engine(cli: &Cli) -> Result<()> {
    if cli.pdfium_lib.is_some() || pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if cli.quiet || cli.json {
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar.set_prefix("PDF engine");
    bar.enable_steady_tick(Duration::from_millis(80));

    let progress = bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                progress.set_length(t);
            }
            progress.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;
    bar.finish_and_clear();
    Ok(())
}

/// Route a file to OCR or heuristic extraction and return its text.
async fn extract_from(
    cli: &Cli,
    session: &TranslationSession,
    path: &Path,
    force_ocr: bool,
) -> Result<String> {
    let file = UploadedFile::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let use_ocr = file.declared().is_image() || (force_ocr && file.declared().is_pdf());
    if use_ocr && file.declared().is_pdf() {
        ensure_pdf_engine(cli)?;
    }

    let bar = spinner(
        !cli.quiet && !cli.json,
        &format!(
            "{} {}",
            if use_ocr { "OCR" } else { "Reading" },
            file.filename()
        ),
    );
    let result = if use_ocr {
        session.ocr_file(&file).await
    } else {
        session.load_document(&file).await
    };
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    result.with_context(|| format!("Extraction failed for {}", path.display()))
}

async fn run_extract(
    cli: &Cli,
    session: &TranslationSession,
    path: &Path,
    ocr: bool,
) -> Result<()> {
    let text = extract_from(cli, session, path, ocr).await?;

    if cli.json {
        let out = serde_json::json!({
            "file": path.display().to_string(),
            "text": text,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else {
        write_stdout(&text)?;
        if !cli.quiet {
            eprintln!(
                "{} {} chars from {}",
                green("✔"),
                text.chars().count(),
                bold(&path.display().to_string())
            );
        }
    }
    Ok(())
}

async fn run_translate(
    cli: &Cli,
    session: &TranslationSession,
    file: Option<&Path>,
    text: Option<&str>,
    ocr: bool,
    save_dir: Option<&Path>,
) -> Result<()> {
    let source = match (file, text) {
        (Some(path), _) => extract_from(cli, session, path, ocr).await?,
        (None, Some(text)) => text.to_string(),
        (None, None) => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };
    session.set_source_text(source);

    let state = session.snapshot();
    let bar = spinner(
        !cli.quiet && !cli.json,
        &format!(
            "Translating {} → {}",
            languages::source_name(&state.source_lang),
            languages::target_name(&state.target_lang)
        ),
    );
    let result = session.translate().await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let translated = result.context("Translation failed")?;

    let saved = match save_dir {
        Some(dir) => Some(
            session
                .save_translation(dir)
                .context("Failed to save translation")?,
        ),
        None => None,
    };

    if cli.json {
        let state = session.snapshot();
        let out = serde_json::json!({
            "source_lang": state.source_lang,
            "target_lang": state.target_lang,
            "source_text": state.source_text,
            "translated_text": translated,
            "saved_to": saved.as_ref().map(|p| p.display().to_string()),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).context("Failed to serialise output")?
        );
    } else {
        write_stdout(&translated)?;
        if !cli.quiet {
            if let Some(path) = saved {
                eprintln!("{} saved  →  {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }
    Ok(())
}

async fn run_status(cli: &Cli, session: &TranslationSession, watch: bool) -> Result<()> {
    let base_url = session.config().base_url.clone();

    if !watch {
        // The monitor probes once at startup; report that result.
        let state = session.settled_connection_state().await;
        print_state(cli, &base_url, state)?;
        if state != ConnectionState::Connected {
            anyhow::bail!("Inference server at {base_url} is not reachable");
        }
        return Ok(());
    }

    let mut updates = session
        .connection_updates()
        .context("Health monitor is not running")?;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            next = updates.next() => match next {
                Some(ConnectionState::Unknown) => continue,
                Some(state) => print_state(cli, &base_url, state)?,
                None => break,
            },
        }
    }
    Ok(())
}

fn print_state(cli: &Cli, base_url: &str, state: ConnectionState) -> Result<()> {
    if cli.json {
        let out = serde_json::json!({
            "base_url": base_url,
            "state": state,
            "checked_at": chrono::Utc::now().to_rfc3339(),
        });
        println!(
            "{}",
            serde_json::to_string(&out).context("Failed to serialise output")?
        );
    } else {
        let mark = match state {
            ConnectionState::Connected => green("●"),
            ConnectionState::Disconnected => red("●"),
            ConnectionState::Unknown => dim("●"),
        };
        println!("{mark} {}  {}", bold(&state.to_string()), dim(base_url));
    }
    Ok(())
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}
