//! CLI binary for ragmark.
//!
//! A thin shim over the library crate: each subcommand maps directly to
//! one library entry point and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ragmark::pipeline::encode::encode_image;
use ragmark::{
    count_page_markers, inject_page_markers, inspect, strip_page_markers, BackendKind,
    CaptionBackend, CaptionConfig, ChatMessage, DEFAULT_CAPTION_PROMPT,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Page count, title, author (no backend needed)
  ragmark inspect report.pdf
  ragmark inspect report.pdf --json

  # Inject page markers into Markdown your engine produced
  ragmark annotate report.pdf --markdown report.md -o report.paged.md

  # Explicit page count, skip probing
  ragmark annotate report.pdf --markdown report.md --pages 12

  # Remove markers again
  ragmark strip report.paged.md -o report.clean.md

  # Caption a figure with a local Ollama server
  ragmark caption figure.png

  # Caption through hosted Gemini
  GOOGLE_GENAI_API_KEY=... ragmark caption figure.png --backend gemini

ENVIRONMENT VARIABLES:
  GOOGLE_GENAI_API_KEY  API key for the hosted Gemini backend
  OLLAMA_BASE_URL       Self-hosted base URL (default http://localhost:11434/v1)
  OLLAMA_MODEL          Self-hosted model (default llava)
  RUST_LOG              Tracing filter; overrides -v/-q
"#;

/// Page-aware Markdown tooling for retrieval pipelines.
#[derive(Parser, Debug)]
#[command(
    name = "ragmark",
    version,
    about = "Page markers and image captions for document-to-Markdown pipelines",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "RAGMARK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "RAGMARK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print structural PDF facts (page count, title, author).
    Inspect {
        /// PDF file to inspect.
        pdf: PathBuf,

        /// Output JSON instead of the key/value listing.
        #[arg(long)]
        json: bool,
    },

    /// Splice `<!-- Page N -->` markers into converted Markdown.
    Annotate {
        /// Source PDF the Markdown was converted from.
        pdf: PathBuf,

        /// Markdown file produced by your conversion engine.
        #[arg(short, long)]
        markdown: PathBuf,

        /// Page count override; skips probing the PDF.
        #[arg(long)]
        pages: Option<usize>,

        /// Write to this file instead of stdout.
        #[arg(short, long, env = "RAGMARK_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Remove page markers from Markdown.
    Strip {
        /// Markdown file to clean.
        markdown: PathBuf,

        /// Write to this file instead of stdout.
        #[arg(short, long, env = "RAGMARK_OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Caption an image through a vision backend.
    Caption {
        /// Image file (PNG, JPEG).
        image: PathBuf,

        /// Backend variant: gemini or ollama.
        #[arg(long, default_value = "ollama")]
        backend: BackendKind,

        /// Model ID. Defaults per backend (gemini-2.5-flash / llava).
        #[arg(long)]
        model: Option<String>,

        /// Base URL for the self-hosted backend.
        #[arg(long)]
        base_url: Option<String>,

        /// Prompt sent with the image.
        #[arg(long)]
        prompt: Option<String>,

        /// Request timeout in seconds (self-hosted backend only).
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Inspect { pdf, json } => {
            let info = inspect(&pdf).await.context("Failed to inspect PDF")?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&info).context("Failed to serialize info")?
                );
            } else {
                println!("File:    {}", info.path.display());
                match info.page_count {
                    Some(n) => println!("Pages:   {}", n),
                    None => println!("Pages:   unknown (not parseable as PDF)"),
                }
                if let Some(ref t) = info.title {
                    println!("Title:   {}", t);
                }
                if let Some(ref a) = info.author {
                    println!("Author:  {}", a);
                }
            }
        }

        Command::Annotate {
            pdf,
            markdown,
            pages,
            output,
        } => {
            let content = tokio::fs::read_to_string(&markdown)
                .await
                .with_context(|| format!("Failed to read {}", markdown.display()))?;
            let annotated = inject_page_markers(&content, &pdf, pages);
            let injected = count_page_markers(&annotated) - count_page_markers(&content);
            write_output(&annotated, output.as_deref()).await?;
            if !cli.quiet {
                eprintln!(
                    "{} injected {} markers {}",
                    green("✔"),
                    bold(&injected.to_string()),
                    dim(&format!("({} chars)", annotated.chars().count())),
                );
            }
        }

        Command::Strip { markdown, output } => {
            let content = tokio::fs::read_to_string(&markdown)
                .await
                .with_context(|| format!("Failed to read {}", markdown.display()))?;
            let removed = count_page_markers(&content);
            let stripped = strip_page_markers(&content);
            write_output(&stripped, output.as_deref()).await?;
            if !cli.quiet {
                eprintln!("{} removed {} markers", green("✔"), bold(&removed.to_string()));
            }
        }

        Command::Caption {
            image,
            backend,
            model,
            base_url,
            prompt,
            timeout,
        } => {
            let img = image::open(&image)
                .with_context(|| format!("Failed to read image {}", image.display()))?;
            let payload = encode_image(&img).context("Failed to encode image")?;

            let config = CaptionConfig {
                backend,
                model,
                base_url,
                api_key: None,
                timeout: timeout.map(Duration::from_secs),
            };
            let backend = ragmark::backend::from_config(&config)?;
            let prompt = prompt.unwrap_or_else(|| DEFAULT_CAPTION_PROMPT.to_string());

            let caption = backend
                .caption(&[ChatMessage::user_with_image(prompt, payload.to_data_url())])
                .await
                .context("Captioning failed")?;
            println!("{}", caption.text);
        }
    }

    Ok(())
}

/// Write to the file when given, stdout otherwise (with a trailing newline).
async fn write_output(content: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(content.as_bytes())
                .context("Failed to write to stdout")?;
            if !content.ends_with('\n') {
                handle.write_all(b"\n").ok();
            }
        }
    }
    Ok(())
}
