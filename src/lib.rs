//! # Folio
//!
//! A page-native Markdown-to-PDF layout engine.
//!
//! Markdown goes in, PDF bytes come out. Headings, paragraphs with mixed
//! inline styles, lists, quotes, code blocks and images are laid out
//! directly INTO pages in a single ordered pass: every line is checked
//! against the bottom margin before it is drawn, so nothing is sliced
//! after the fact.
//!
//! A `[TOC]` paragraph anywhere in the document becomes a table of
//! contents whose rows jump to the headings, and `[text](#Heading)` links
//! work the same way.
//!
//! ## Architecture
//!
//! ```text
//! Markdown text
//!       ↓
//!   [markdown] : pulldown-cmark events → Block tokens
//!       ↓
//!   [layout]   : single pass over blocks, drawing onto a Canvas
//!       ↓          (TOC rows and #links resolved after the pass)
//!   [canvas]   : records draw commands per page
//!       ↓
//!   [pdf]      : serialize to PDF bytes
//! ```

pub mod canvas;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod markdown;
pub mod model;
pub mod pdf;
pub mod style;
pub mod text;

use std::time::Duration;

use canvas::PdfCanvas;
use error::FolioError;
use image_loader::{HttpImageSource, ImageSource};
use layout::{LayoutEngine, RenderReport};
use model::{Block, RenderOptions};
use pdf::OutlineItem;

/// A finished render: the PDF and what the layout pass recorded.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub pdf: Vec<u8>,
    pub report: RenderReport,
}

/// Render Markdown to PDF bytes, fetching images over HTTP(S) or from
/// data URIs and local paths.
///
/// This is the primary entry point.
pub async fn render_markdown(
    markdown: &str,
    options: &RenderOptions,
) -> Result<RenderOutput, FolioError> {
    let source = HttpImageSource::new(Duration::from_secs(options.image_timeout_secs))?;
    render_markdown_with(markdown, options, &source).await
}

/// Render Markdown to PDF bytes with a custom image source.
pub async fn render_markdown_with(
    markdown: &str,
    options: &RenderOptions,
    images: &dyn ImageSource,
) -> Result<RenderOutput, FolioError> {
    let blocks = markdown::tokenize(markdown);

    let mut canvas = PdfCanvas::new(options.page.size);
    let report = LayoutEngine::new(&mut canvas, options, images)
        .layout(&blocks)
        .await?;

    let mut metadata = options.metadata.clone();
    if metadata.title.is_none() {
        metadata.title = first_title(&blocks);
    }
    let outline: Vec<OutlineItem> = report
        .destinations
        .iter()
        .map(|d| OutlineItem {
            title: d.heading_text.clone(),
            level: d.heading_level,
            page: d.page,
            y: d.y,
        })
        .collect();
    let pdf = canvas.finish_with_outline(&metadata, &outline);

    log::info!(
        "rendered {} pages, {} headings, {} links ({} unresolved), {} bytes",
        report.page_count,
        report.destinations.len(),
        report.links.len(),
        report.unresolved_links.len(),
        pdf.len()
    );
    Ok(RenderOutput { pdf, report })
}

/// Text of the first level-1 heading.
fn first_title(blocks: &[Block]) -> Option<String> {
    blocks.iter().find_map(|block| match block {
        Block::Heading { depth: 1, text, .. } => Some(text.clone()),
        _ => None,
    })
}
