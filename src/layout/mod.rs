//! # Layout Engine
//!
//! Walks the block list once, in document order, and draws each block onto
//! a [`Canvas`]. This is the heart of Folio.
//!
//! ## Cursor
//!
//! A [`Cursor`] is the (page, y) position where the next line starts. It is
//! a plain `Copy` value: every handler takes one and returns the updated
//! one. Only [`page_break::check_add_page`] moves it to a new page.
//!
//! `y` is the top of the next line. Text baselines sit a fixed fraction of
//! the line height below it, so a line occupies `[y, y + line_height]`.
//!
//! ## Side tables
//!
//! While drawing, the engine records:
//! - a TOC entry and a destination for every heading, at the position the
//!   heading was drawn,
//! - a link annotation for every link fragment drawn.
//!
//! Internal links are resolved against the destinations once the pass is
//! over, so a `[TOC]` near the top of the document can point at headings
//! that have not been drawn yet.

pub mod inline;
pub mod page_break;
pub mod toc;

use serde::Serialize;

use crate::canvas::{Canvas, Rect};
use crate::error::FolioError;
use crate::image_loader::{load_image, ImageSource};
use crate::model::{Block, InlineRun, ListItem, RenderOptions};
use crate::style::{Color, FontFamily, FontSpec};
use crate::text::{expand_tabs, truncate_to_width, wrap_text};

use page_break::check_add_page;

/// Left indent for list items and blockquote text.
const INDENT: f64 = 5.0;
/// Space after paragraphs, lists, quotes and code blocks.
const BLOCK_PADDING: f64 = 2.0;
/// Space after a heading.
const HEADING_PADDING: f64 = 7.0;
/// Inner padding of the code background (split above and below).
const CODE_PADDING: f64 = 2.0;
/// Vertical padding around an image.
const IMAGE_PADDING: f64 = 4.0;
/// Screen resolution used to turn image pixels into millimetres.
const IMAGE_DPI: f64 = 96.0;
/// Baseline position as a fraction of the line height.
const BASELINE_RATIO: f64 = 0.75;

/// Where the next line starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

/// One table-of-contents row, recorded when its heading is drawn.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TocEntry {
    pub heading_text: String,
    pub level: u8,
    pub page: usize,
    pub y: f64,
}

/// The jump target of a heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub page: usize,
    pub y: f64,
    pub heading_text: String,
    pub heading_level: u8,
}

/// What a link annotation points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AnnotationTarget {
    External {
        url: String,
    },
    /// Internal link waiting for its heading.
    #[serde(rename_all = "camelCase")]
    Pending {
        heading_ref: String,
    },
    #[serde(rename_all = "camelCase")]
    Internal {
        heading_ref: String,
        page: usize,
        y: f64,
    },
}

impl AnnotationTarget {
    /// `#fragment` hrefs are internal, anything else is a URL.
    pub fn from_href(href: &str) -> Self {
        match href.strip_prefix('#') {
            Some(fragment) => AnnotationTarget::Pending {
                heading_ref: fragment.to_string(),
            },
            None => AnnotationTarget::External {
                url: href.to_string(),
            },
        }
    }
}

/// A clickable region on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkAnnotation {
    pub page: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub target: AnnotationTarget,
}

impl LinkAnnotation {
    pub fn rect(&self) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// An internal link whose heading does not exist. It is not clickable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedLink {
    pub heading_ref: String,
    pub page: usize,
}

/// Everything the layout pass learned about the document.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderReport {
    pub page_count: usize,
    pub toc: Vec<TocEntry>,
    pub destinations: Vec<Destination>,
    /// Links registered on the canvas (external and resolved internal).
    pub links: Vec<LinkAnnotation>,
    pub unresolved_links: Vec<UnresolvedLink>,
}

/// What a block handler hands back.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub cursor: Cursor,
    pub links: Vec<LinkAnnotation>,
}

impl BlockOutcome {
    fn at(cursor: Cursor) -> Self {
        Self {
            cursor,
            links: Vec::new(),
        }
    }
}

/// Lays out one document. Create one per render.
pub struct LayoutEngine<'a, C: Canvas> {
    canvas: &'a mut C,
    options: &'a RenderOptions,
    images: &'a dyn ImageSource,
    toc: Vec<TocEntry>,
    destinations: Vec<Destination>,
    links: Vec<LinkAnnotation>,
}

impl<'a, C: Canvas> LayoutEngine<'a, C> {
    pub fn new(
        canvas: &'a mut C,
        options: &'a RenderOptions,
        images: &'a dyn ImageSource,
    ) -> Self {
        Self {
            canvas,
            options,
            images,
            toc: Vec::new(),
            destinations: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Draw every block, then resolve and register links.
    pub async fn layout(mut self, blocks: &[Block]) -> Result<RenderReport, FolioError> {
        let headings = toc::collect_headings(blocks);
        let has_placeholder = blocks.iter().any(Block::is_toc_placeholder);

        let mut cursor = Cursor {
            page: self.canvas.current_page(),
            y: self.options.page.margin.top,
        };

        if self.options.include_toc && !has_placeholder {
            cursor = self.render_toc(&headings, cursor);
        }

        let mut toc_rendered = false;
        for block in blocks {
            if block.is_toc_placeholder() {
                if toc_rendered {
                    log::debug!("ignoring repeated [TOC] placeholder");
                } else {
                    cursor = self.render_toc(&headings, cursor);
                    toc_rendered = true;
                }
                continue;
            }

            let outcome = self.layout_block(block, cursor).await?;
            cursor = self.clamp(outcome.cursor);
            self.links.extend(outcome.links);
        }

        let (links, unresolved_links) = self.resolve_links();
        self.register_links(&links)?;

        let report = RenderReport {
            page_count: self.canvas.page_count(),
            toc: self.toc,
            destinations: self.destinations,
            links,
            unresolved_links,
        };
        log::debug!(
            "layout finished: {} pages, {} links, {} unresolved",
            report.page_count,
            report.links.len(),
            report.unresolved_links.len()
        );
        Ok(report)
    }

    /// Dispatch one block to its handler.
    pub async fn layout_block(
        &mut self,
        block: &Block,
        cursor: Cursor,
    ) -> Result<BlockOutcome, FolioError> {
        match block {
            Block::Heading { depth, text, runs } => {
                self.layout_heading(*depth, text, runs, cursor).await
            }
            Block::Paragraph { text, runs } => self.layout_paragraph(text, runs, cursor).await,
            Block::List {
                ordered,
                start,
                items,
            } => Ok(self.layout_list(*ordered, *start, items, cursor)),
            Block::Blockquote { text } => self.layout_blockquote(text, cursor),
            Block::Code { text, .. } => Ok(self.layout_code(text, cursor)),
            Block::HorizontalRule => Ok(self.layout_rule(cursor)),
            Block::Space => Ok(BlockOutcome::at(Cursor {
                page: cursor.page,
                y: cursor.y + self.options.line_height / 2.0,
            })),
        }
    }

    // ── Block handlers ──────────────────────────────────────────────

    async fn layout_heading(
        &mut self,
        depth: u8,
        text: &str,
        runs: &[InlineRun],
        cursor: Cursor,
    ) -> Result<BlockOutcome, FolioError> {
        let font_size = heading_font_size(depth);
        let line_height = font_size / 2.0;
        let cursor = self.check_page(cursor, line_height);

        self.toc.push(TocEntry {
            heading_text: text.to_string(),
            level: depth,
            page: cursor.page,
            y: cursor.y,
        });
        self.destinations.push(Destination {
            page: cursor.page,
            y: cursor.y,
            heading_text: text.to_string(),
            heading_level: depth,
        });
        log::debug!(
            "heading h{} '{}' on page {} at y={:.1}",
            depth,
            text,
            cursor.page + 1,
            cursor.y
        );

        let base = self.body_font().with_size(font_size).bold();
        let runs = if runs.is_empty() {
            vec![InlineRun::text(text)]
        } else {
            runs.to_vec()
        };
        let (end, links) = self
            .render_inline(&runs, self.left(), self.max_width(), base, line_height, cursor)
            .await?;

        self.canvas.set_font(self.body_font());
        Ok(BlockOutcome {
            cursor: Cursor {
                page: end.page,
                y: end.y + HEADING_PADDING,
            },
            links,
        })
    }

    async fn layout_paragraph(
        &mut self,
        text: &str,
        runs: &[InlineRun],
        cursor: Cursor,
    ) -> Result<BlockOutcome, FolioError> {
        let (end, links) = if runs.is_empty() {
            self.layout_plain_paragraph(text, cursor)
        } else {
            self.render_inline(
                runs,
                self.left(),
                self.max_width(),
                self.body_font(),
                self.options.line_height,
                cursor,
            )
            .await?
        };
        Ok(BlockOutcome {
            cursor: Cursor {
                page: end.page,
                y: end.y + BLOCK_PADDING,
            },
            links,
        })
    }

    fn layout_list(
        &mut self,
        ordered: bool,
        start: u64,
        items: &[ListItem],
        cursor: Cursor,
    ) -> BlockOutcome {
        let line_height = self.options.line_height;
        let x = self.left() + INDENT;
        let mut cursor = cursor;

        self.canvas.set_font(self.body_font());
        self.canvas.set_text_color(Color::BLACK);
        for (i, item) in items.iter().enumerate() {
            let prefix = if ordered {
                format!("{}. ", start + i as u64)
            } else {
                "* ".to_string()
            };
            let text = format!("{}{}", prefix, item.text());
            for line in wrap_text(&*self.canvas, &text, self.max_width() - INDENT) {
                cursor = self.check_page(cursor, line_height);
                self.canvas.draw_text(&line, x, baseline(cursor.y, line_height));
                cursor.y += line_height;
            }
        }

        BlockOutcome::at(Cursor {
            page: cursor.page,
            y: cursor.y + BLOCK_PADDING,
        })
    }

    fn layout_blockquote(
        &mut self,
        text: &str,
        cursor: Cursor,
    ) -> Result<BlockOutcome, FolioError> {
        let line_height = self.options.line_height;
        let left = self.left();
        let mut cursor = cursor;

        self.canvas.set_font(self.body_font().italic());
        self.canvas.set_text_color(Color::BLACK);
        self.canvas.set_draw_color(Color::RULE);

        let lines = wrap_text(&*self.canvas, text, self.max_width() - INDENT);
        // Start of the rule segment on the current page.
        let mut rule_start: Option<Cursor> = None;
        for line in &lines {
            let check = check_add_page(&mut *self.canvas, cursor, line_height, &self.options.page);
            if check.did_add_page {
                if let Some(start) = rule_start.take() {
                    self.draw_rule_segment(start, cursor.y, left)?;
                }
            }
            cursor = check.cursor;
            rule_start.get_or_insert(cursor);
            self.canvas.draw_text(line, left + INDENT, baseline(cursor.y, line_height));
            cursor.y += line_height;
        }
        if let Some(start) = rule_start {
            self.draw_rule_segment(start, cursor.y, left)?;
        }

        self.canvas.set_font(self.body_font());
        self.canvas.set_draw_color(Color::BLACK);
        Ok(BlockOutcome::at(Cursor {
            page: cursor.page,
            y: cursor.y + BLOCK_PADDING,
        }))
    }

    /// Vertical quote rule from `start` down to `end_y` on `start.page`,
    /// drawn without changing the current page.
    fn draw_rule_segment(
        &mut self,
        start: Cursor,
        end_y: f64,
        x: f64,
    ) -> Result<(), FolioError> {
        let previous = self.canvas.current_page();
        if previous == start.page {
            self.canvas.draw_line(x, start.y, x, end_y);
            return Ok(());
        }
        self.canvas.set_page(start.page)?;
        self.canvas.draw_line(x, start.y, x, end_y);
        self.canvas.set_page(previous)
    }

    fn layout_code(&mut self, text: &str, cursor: Cursor) -> BlockOutcome {
        let line_height = self.options.code_line_height;
        let left = self.left();
        let width = self.max_width();
        let bottom = self.options.page.bottom_limit();

        self.canvas.set_font(FontSpec::new(FontFamily::Courier, self.options.code_font_size));
        self.canvas.set_text_color(Color::BLACK);

        let mut lines: Vec<String> = text
            .lines()
            .map(|line| truncate_to_width(&*self.canvas, &expand_tabs(line), width - 4.0))
            .collect();
        if lines.is_empty() {
            lines.push(String::new());
        }

        let mut cursor = cursor;
        let mut remaining = &lines[..];
        while !remaining.is_empty() {
            cursor = self.check_page(cursor, line_height + CODE_PADDING);
            let capacity =
                ((bottom - cursor.y - CODE_PADDING) / line_height).floor().max(1.0) as usize;
            let (chunk, rest) = remaining.split_at(capacity.min(remaining.len()));

            let height = chunk.len() as f64 * line_height + CODE_PADDING;
            self.canvas.fill_rect(
                Rect {
                    x: left,
                    y: cursor.y,
                    width,
                    height,
                },
                Color::CODE_BACKGROUND,
            );
            let mut y = cursor.y + CODE_PADDING / 2.0;
            for line in chunk {
                if !line.is_empty() {
                    self.canvas.draw_text(line, left + 2.0, baseline(y, line_height));
                }
                y += line_height;
            }

            cursor.y += height;
            remaining = rest;
        }

        self.canvas.set_font(self.body_font());
        BlockOutcome::at(Cursor {
            page: cursor.page,
            y: cursor.y + BLOCK_PADDING,
        })
    }

    fn layout_rule(&mut self, cursor: Cursor) -> BlockOutcome {
        let line_height = self.options.line_height;
        let cursor = self.check_page(cursor, line_height);
        let y = cursor.y + line_height / 2.0;
        self.canvas.set_draw_color(Color::RULE);
        self.canvas.draw_line(self.left(), y, self.left() + self.max_width(), y);
        self.canvas.set_draw_color(Color::BLACK);
        BlockOutcome::at(Cursor {
            page: cursor.page,
            y: cursor.y + line_height,
        })
    }

    // ── Images ──────────────────────────────────────────────────────

    /// Fetch, scale and draw an image at the left margin. A failed image
    /// becomes a one-line placeholder.
    pub async fn render_image(
        &mut self,
        alt: &str,
        src: &str,
        cursor: Cursor,
    ) -> Result<Cursor, FolioError> {
        match load_image(self.images, src).await {
            Ok(image) => {
                let mut width = image.width_px as f64 * 25.4 / IMAGE_DPI;
                let mut height = image.height_px as f64 * 25.4 / IMAGE_DPI;
                let page = &self.options.page;
                let max_height = page.bottom_limit() - page.margin.top - IMAGE_PADDING;
                let scale = (self.max_width() / width).min(max_height / height).min(1.0);
                if scale.is_finite() && scale > 0.0 {
                    width *= scale;
                    height *= scale;
                }

                let cursor = self.check_page(cursor, height + IMAGE_PADDING);
                let rect = Rect {
                    x: self.left(),
                    y: cursor.y + IMAGE_PADDING / 2.0,
                    width,
                    height,
                };
                self.canvas.draw_image(image, rect);
                log::debug!(
                    "image '{}' at {:.1}x{:.1}mm on page {}",
                    src,
                    width,
                    height,
                    cursor.page + 1
                );
                Ok(Cursor {
                    page: cursor.page,
                    y: cursor.y + height + IMAGE_PADDING,
                })
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("image '{}' failed, drawing placeholder: {}", src, e);
                let label = if alt.trim().is_empty() { src } else { alt };
                let line_height = self.options.line_height;
                let cursor = self.check_page(cursor, line_height);
                self.canvas.set_font(self.body_font());
                self.canvas.set_text_color(Color::BLACK);
                self.canvas.draw_text(
                    &format!("[Image load failed: {}]", label),
                    self.left(),
                    baseline(cursor.y, line_height),
                );
                Ok(Cursor {
                    page: cursor.page,
                    y: cursor.y + line_height + IMAGE_PADDING,
                })
            }
            Err(e) => Err(e),
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    /// Start a new page unless `needed` millimetres still fit below `cursor`.
    fn check_page(&mut self, cursor: Cursor, needed: f64) -> Cursor {
        check_add_page(&mut *self.canvas, cursor, needed, &self.options.page).cursor
    }

    fn left(&self) -> f64 {
        self.options.page.margin.left
    }

    fn max_width(&self) -> f64 {
        self.options.page.content_width()
    }

    fn body_font(&self) -> FontSpec {
        FontSpec::new(self.options.font_family, self.options.font_size)
    }

    /// Keep trailing padding from pushing the cursor past the bottom margin.
    fn clamp(&self, cursor: Cursor) -> Cursor {
        Cursor {
            page: cursor.page,
            y: cursor.y.min(self.options.page.bottom_limit()),
        }
    }
}

/// `max(12, 34 - depth * 6)` points.
pub fn heading_font_size(depth: u8) -> f64 {
    (34.0 - depth as f64 * 6.0).max(12.0)
}

/// Baseline for a line whose top is at `y`.
fn baseline(y: f64, line_height: f64) -> f64 {
    y + line_height * BASELINE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawCommand, PdfCanvas};
    use crate::image_loader::ImageSource;
    use crate::model::PageSize;
    use async_trait::async_trait;

    struct NoImages;

    #[async_trait]
    impl ImageSource for NoImages {
        async fn fetch(&self, src: &str) -> Result<Vec<u8>, FolioError> {
            Err(FolioError::Image(format!("no image at {}", src)))
        }
    }

    fn para(text: &str) -> Block {
        Block::Paragraph {
            text: text.to_string(),
            runs: vec![InlineRun::text(text)],
        }
    }

    async fn run(blocks: &[Block]) -> (PdfCanvas, RenderReport) {
        let options = RenderOptions::default();
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let report = LayoutEngine::new(&mut canvas, &options, &NoImages)
            .layout(blocks)
            .await
            .unwrap();
        (canvas, report)
    }

    #[test]
    fn heading_sizes() {
        assert_eq!(heading_font_size(1), 28.0);
        assert_eq!(heading_font_size(2), 22.0);
        assert_eq!(heading_font_size(3), 16.0);
        assert_eq!(heading_font_size(4), 12.0);
        assert_eq!(heading_font_size(6), 12.0);
    }

    #[test]
    fn href_classification() {
        assert_eq!(
            AnnotationTarget::from_href("#Intro"),
            AnnotationTarget::Pending {
                heading_ref: "Intro".into()
            }
        );
        assert_eq!(
            AnnotationTarget::from_href("https://x.test"),
            AnnotationTarget::External {
                url: "https://x.test".into()
            }
        );
    }

    #[tokio::test]
    async fn heading_records_destination_before_drawing() {
        let blocks = vec![Block::Heading {
            depth: 1,
            text: "Title".into(),
            runs: vec![InlineRun::text("Title")],
        }];
        let (canvas, report) = run(&blocks).await;
        assert_eq!(report.destinations.len(), 1);
        assert_eq!(report.destinations[0].page, 0);
        assert_eq!(report.destinations[0].y, 20.0);
        assert_eq!(report.toc[0].heading_text, "Title");
        let (text, _, y, font) = canvas.pages()[0].texts().next().unwrap();
        assert_eq!(text, "Title");
        assert!(y > 20.0);
        assert!(font.is_bold());
        assert_eq!(font.size, 28.0);
    }

    #[tokio::test]
    async fn long_document_paginates_without_trailing_blank_page() {
        // 60 one-line paragraphs of 5mm + 2mm = 420mm of content on 257mm pages.
        let blocks: Vec<Block> = (0..60).map(|i| para(&format!("Line {}", i))).collect();
        let (canvas, report) = run(&blocks).await;
        assert_eq!(report.page_count, 2);
        for page in canvas.pages() {
            assert!(page.texts().count() > 0, "no page may be empty");
            for (_, _, y, _) in page.texts() {
                assert!(y <= 277.0);
            }
        }
    }

    #[tokio::test]
    async fn list_prefixes_and_start_number() {
        let blocks = vec![Block::List {
            ordered: true,
            start: 3,
            items: vec![
                ListItem {
                    runs: vec![InlineRun::text("three")],
                },
                ListItem {
                    runs: vec![InlineRun::text("four")],
                },
            ],
        }];
        let (canvas, _) = run(&blocks).await;
        let texts: Vec<&str> = canvas.pages()[0].texts().map(|t| t.0).collect();
        assert_eq!(texts, vec!["3. three", "4. four"]);
        let (_, x, _, _) = canvas.pages()[0].texts().next().unwrap();
        assert_eq!(x, 25.0);
    }

    #[tokio::test]
    async fn blockquote_is_italic_with_rule() {
        let blocks = vec![Block::Blockquote {
            text: "quoted".into(),
        }];
        let (canvas, _) = run(&blocks).await;
        let page = &canvas.pages()[0];
        let (_, x, _, font) = page.texts().next().unwrap();
        assert!(font.is_italic());
        assert_eq!(x, 25.0);
        assert!(page
            .elements
            .iter()
            .any(|e| matches!(e, DrawCommand::Line { x1, x2, .. } if *x1 == 20.0 && *x2 == 20.0)));
    }

    #[tokio::test]
    async fn blockquote_rule_drawn_on_every_page_it_spans() {
        let quote: Vec<String> = (0..80).map(|i| format!("quoted {}", i)).collect();
        let blocks = vec![Block::Blockquote {
            text: quote.join("\n"),
        }];
        let options = RenderOptions::default();
        let mut canvas = PdfCanvas::new(PageSize::A4);
        LayoutEngine::new(&mut canvas, &options, &NoImages)
            .layout(&blocks)
            .await
            .unwrap();
        assert_eq!(canvas.page_count(), 2);
        assert_eq!(canvas.current_page(), 1);
        for page in canvas.pages() {
            let rules = page
                .elements
                .iter()
                .filter(|e| matches!(e, DrawCommand::Line { x1, .. } if *x1 == 20.0))
                .count();
            assert_eq!(rules, 1);
        }
    }

    #[tokio::test]
    async fn body_font_family_option_reaches_text() {
        let options = RenderOptions {
            font_family: FontFamily::Times,
            ..RenderOptions::default()
        };
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let blocks = vec![
            Block::Heading {
                depth: 2,
                text: "Serif".into(),
                runs: vec![InlineRun::text("Serif")],
            },
            para("body"),
            Block::Code {
                text: "mono".into(),
                language: None,
            },
        ];
        LayoutEngine::new(&mut canvas, &options, &NoImages)
            .layout(&blocks)
            .await
            .unwrap();
        let families: Vec<FontFamily> = canvas.pages()[0].texts().map(|t| t.3.family).collect();
        assert_eq!(families, vec![FontFamily::Times, FontFamily::Times, FontFamily::Courier]);
    }

    #[tokio::test]
    async fn code_block_background_drawn_first() {
        let blocks = vec![Block::Code {
            text: "fn main() {\n\tprintln!();\n}".into(),
            language: Some("rust".into()),
        }];
        let (canvas, _) = run(&blocks).await;
        let page = &canvas.pages()[0];
        match &page.elements[0] {
            DrawCommand::Rect { rect, color } => {
                assert_eq!(*color, Color::CODE_BACKGROUND);
                assert!((rect.height - (3.0 * 4.5 + 2.0)).abs() < 1e-9);
            }
            other => panic!("expected background rect, got {:?}", other),
        }
        let texts: Vec<&str> = page.texts().map(|t| t.0).collect();
        assert_eq!(texts, vec!["fn main() {", "    println!();", "}"]);
        assert!(page.texts().all(|t| t.3.family == FontFamily::Courier));
    }

    #[tokio::test]
    async fn code_block_split_across_pages_gets_one_rect_per_page() {
        let code: Vec<String> = (0..80).map(|i| format!("line {}", i)).collect();
        let blocks = vec![Block::Code {
            text: code.join("\n"),
            language: None,
        }];
        let (canvas, report) = run(&blocks).await;
        assert_eq!(report.page_count, 2);
        for page in canvas.pages() {
            let rects = page
                .elements
                .iter()
                .filter(|e| matches!(e, DrawCommand::Rect { .. }))
                .count();
            assert_eq!(rects, 1);
        }
        let total: usize = canvas.pages().iter().map(|p| p.texts().count()).sum();
        assert_eq!(total, 80);
    }

    #[tokio::test]
    async fn failed_image_draws_placeholder_and_advances() {
        let options = RenderOptions::default();
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let mut engine = LayoutEngine::new(&mut canvas, &options, &NoImages);
        let start = Cursor { page: 0, y: 20.0 };
        let end = engine.render_image("", "https://x.test/a.png", start).await.unwrap();
        assert!(end.y > start.y);
        let (text, _, _, _) = canvas.pages()[0].texts().next().unwrap();
        assert_eq!(text, "[Image load failed: https://x.test/a.png]");
    }

    #[tokio::test]
    async fn cursor_clamped_to_bottom_margin() {
        let mut blocks: Vec<Block> = (0..36).map(|i| para(&format!("p{}", i))).collect();
        blocks.push(Block::HorizontalRule);
        let options = RenderOptions::default();
        let mut canvas = PdfCanvas::new(PageSize::A4);
        let mut engine = LayoutEngine::new(&mut canvas, &options, &NoImages);
        let mut cursor = Cursor { page: 0, y: 20.0 };
        for block in &blocks {
            let outcome = engine.layout_block(block, cursor).await.unwrap();
            cursor = engine.clamp(outcome.cursor);
            assert!(cursor.y <= 277.0);
        }
    }
}
