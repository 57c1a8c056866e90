//! # Folio CLI
//!
//! Usage:
//!   folio notes.md -o notes.pdf
//!   cat notes.md | folio -o notes.pdf --toc
//!   folio notes.md -o notes.pdf --config options.json --report

use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use folio::model::RenderOptions;

/// Lay Markdown out into a paginated PDF.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Cli {
    /// Markdown file to render. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Where to write the PDF.
    #[arg(short, long, default_value = "output.pdf")]
    output: PathBuf,

    /// JSON file with render options (page size, margins, fonts, TOC).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Put a table of contents at the top when the document has no [TOC].
    #[arg(long)]
    toc: bool,

    /// Print the layout report (pages, headings, links) as JSON.
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let markdown = match &cli.input {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let mut options = match &cli.config {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            RenderOptions::from_json(&json)?
        }
        None => RenderOptions::default(),
    };
    if cli.toc {
        options.include_toc = true;
    }

    let output = folio::render_markdown(&markdown, &options).await?;
    tokio::fs::write(&cli.output, &output.pdf)
        .await
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    eprintln!(
        "✓ Written {} bytes ({} pages) to {}",
        output.pdf.len(),
        output.report.page_count,
        cli.output.display()
    );

    if cli.report {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    }

    Ok(())
}
