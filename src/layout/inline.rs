//! # Inline Content
//!
//! Draws a block's inline runs as wrapped lines of mixed-style text.
//!
//! Runs are first normalized into segments: whitespace-only runs are
//! dropped at style boundaries and neighbouring runs of the same style are
//! merged, keeping any whitespace run that sat between them. Where two
//! different styles touch without whitespace between them, a small gap is
//! inserted after the first one (wider when bold is involved, since bold
//! glyphs crowd their neighbours).
//!
//! Line filling is greedy, word by word, measuring each word in its own
//! style. Images break the flow: the pending line is drawn, the image is
//! placed, and text resumes on a fresh line.

use std::sync::LazyLock;

use regex::Regex;

use crate::canvas::Canvas;
use crate::error::FolioError;
use crate::model::InlineRun;
use crate::style::{Color, FontFamily, FontSpec};
use crate::text::{expand_tabs, split_word, split_words, wrap_text};

use super::{baseline, AnnotationTarget, Cursor, LayoutEngine, LinkAnnotation};

/// Gap at a style boundary, as a fraction of a space.
const STYLE_GAP: f64 = 0.5;
/// Gap at a boundary where either side is bold.
const STRONG_GAP: f64 = 0.6;

/// `[text](url)` in raw Markdown.
static MARKDOWN_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").expect("BUG: invalid MARKDOWN_LINK_RE regex literal")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunStyle {
    Normal,
    Strong,
    Emphasis,
    Strikethrough,
    Link,
    Code,
}

impl RunStyle {
    fn font(self, base: FontSpec) -> FontSpec {
        match self {
            RunStyle::Strong => base.bold(),
            RunStyle::Emphasis => base.italic(),
            RunStyle::Code => FontSpec {
                family: FontFamily::Courier,
                ..base
            },
            RunStyle::Normal | RunStyle::Strikethrough | RunStyle::Link => base,
        }
    }

    fn color(self) -> Color {
        match self {
            RunStyle::Link => Color::LINK,
            _ => Color::BLACK,
        }
    }
}

/// A normalized stretch of inline content.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text {
        style: RunStyle,
        text: String,
        href: Option<String>,
        /// Extra space after this segment, in millimetres.
        gap_after: f64,
    },
    Image {
        alt: String,
        src: String,
    },
}

/// Drop whitespace-only runs and merge neighbours of identical style.
/// A dropped run still separates two runs that end up merged.
/// Gaps are filled in later, once the font is known.
pub(crate) fn normalize_runs(runs: &[InlineRun]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut dropped_space: Option<&str> = None;

    for run in runs {
        let (style, text, href) = match run {
            InlineRun::Image { alt, src } => {
                dropped_space = None;
                segments.push(Segment::Image {
                    alt: alt.clone(),
                    src: src.clone(),
                });
                continue;
            }
            InlineRun::Text { value } => (RunStyle::Normal, value, None),
            InlineRun::Strong { value } => (RunStyle::Strong, value, None),
            InlineRun::Emphasis { value } => (RunStyle::Emphasis, value, None),
            InlineRun::Strikethrough { value } => (RunStyle::Strikethrough, value, None),
            InlineRun::CodeSpan { value } => (RunStyle::Code, value, None),
            InlineRun::Link { value, href } => (RunStyle::Link, value, Some(href.clone())),
        };

        // Hard breaks are whitespace too, but they carry a line flush.
        if text.trim().is_empty() && !text.contains('\n') {
            dropped_space.get_or_insert(text.as_str());
            continue;
        }
        let text = expand_tabs(text);
        let separator = dropped_space.take();

        if let Some(Segment::Text {
            style: prev_style,
            text: prev_text,
            href: prev_href,
            ..
        }) = segments.last_mut()
        {
            if *prev_style == style && *prev_href == href {
                if let Some(space) = separator {
                    prev_text.push_str(&expand_tabs(space));
                }
                prev_text.push_str(&text);
                continue;
            }
        }

        segments.push(Segment::Text {
            style,
            text,
            href,
            gap_after: 0.0,
        });
    }

    segments
}

/// Set `gap_after` at every boundary between two different text styles
/// that has no whitespace of its own. `space_width` is in millimetres.
pub(crate) fn apply_boundary_gaps(segments: &mut [Segment], space_width: f64) {
    for i in 0..segments.len().saturating_sub(1) {
        let gap = match (&segments[i], &segments[i + 1]) {
            (
                Segment::Text {
                    style: a,
                    text: left,
                    ..
                },
                Segment::Text {
                    style: b, text: right, ..
                },
            ) => {
                let touching = !left.ends_with(char::is_whitespace)
                    && !right.starts_with(char::is_whitespace);
                if !touching {
                    0.0
                } else if *a == RunStyle::Strong || *b == RunStyle::Strong {
                    space_width * STRONG_GAP
                } else {
                    space_width * STYLE_GAP
                }
            }
            _ => 0.0,
        };
        if let Segment::Text { gap_after, .. } = &mut segments[i] {
            *gap_after = gap;
        }
    }
}

/// A piece of one segment placed on the pending line.
#[derive(Debug, Clone)]
struct Fragment {
    text: String,
    style: RunStyle,
    href: Option<String>,
    font: FontSpec,
    /// Offset from the line start.
    x: f64,
    width: f64,
    segment: usize,
}

/// The line being filled.
#[derive(Debug, Default)]
struct PendingLine {
    fragments: Vec<Fragment>,
    width: f64,
}

impl PendingLine {
    fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    fn push(
        &mut self,
        word: &str,
        width: f64,
        segment: usize,
        style: RunStyle,
        href: &Option<String>,
        font: FontSpec,
    ) {
        match self.fragments.last_mut() {
            Some(last) if last.segment == segment => {
                last.text.push_str(word);
                last.width += width;
            }
            _ => self.fragments.push(Fragment {
                text: word.to_string(),
                style,
                href: href.clone(),
                font,
                x: self.width,
                width,
                segment,
            }),
        }
        self.width += width;
    }
}

impl<'a, C: Canvas> LayoutEngine<'a, C> {
    /// Draw `runs` as wrapped lines starting at `cursor`, `x` from the page
    /// edge and at most `max_width` wide. Returns the cursor below the last
    /// line and the link annotations for every drawn link fragment.
    pub async fn render_inline(
        &mut self,
        runs: &[InlineRun],
        x: f64,
        max_width: f64,
        base: FontSpec,
        line_height: f64,
        cursor: Cursor,
    ) -> Result<(Cursor, Vec<LinkAnnotation>), FolioError> {
        let mut segments = normalize_runs(runs);
        self.canvas.set_font(base);
        let space_width = self.canvas.text_width(" ");
        apply_boundary_gaps(&mut segments, space_width);

        let mut cursor = cursor;
        let mut links = Vec::new();
        let mut line = PendingLine::default();

        for (index, segment) in segments.iter().enumerate() {
            let (style, text, href, gap_after) = match segment {
                Segment::Image { alt, src } => {
                    cursor = self.flush_line(&mut line, x, line_height, cursor, &mut links);
                    cursor = self.render_image(alt, src, cursor).await?;
                    continue;
                }
                Segment::Text {
                    style,
                    text,
                    href,
                    gap_after,
                } => (*style, text, href, *gap_after),
            };
            let font = style.font(base);

            for (part_index, part) in text.split('\n').enumerate() {
                if part_index > 0 {
                    cursor = self.flush_line(&mut line, x, line_height, cursor, &mut links);
                }
                let words = split_words(part);
                let last_word = words.len().saturating_sub(1);
                for (word_index, word) in words.iter().enumerate() {
                    let is_space = word.trim().is_empty();
                    if is_space && line.is_empty() {
                        continue;
                    }
                    self.canvas.set_font(font);
                    let width = self.canvas.text_width(word);
                    // A word wider than the whole line is split between characters.
                    let pieces: Vec<(String, f64)> = if !is_space && width > max_width {
                        split_word(&*self.canvas, word, max_width)
                            .into_iter()
                            .map(|piece| {
                                let piece_width = self.canvas.text_width(&piece);
                                (piece, piece_width)
                            })
                            .collect()
                    } else {
                        vec![(word.to_string(), width)]
                    };
                    let last_piece = pieces.len().saturating_sub(1);
                    for (piece_index, (piece, width)) in pieces.iter().enumerate() {
                        let trailing = if word_index == last_word && piece_index == last_piece {
                            gap_after
                        } else {
                            0.0
                        };
                        if !line.is_empty() && line.width + width + trailing > max_width {
                            cursor = self.flush_line(&mut line, x, line_height, cursor, &mut links);
                            if is_space {
                                continue;
                            }
                        }
                        line.push(piece, *width, index, style, href, font);
                    }
                }
            }

            if gap_after > 0.0 && !line.is_empty() {
                line.width += gap_after;
            }
        }

        cursor = self.flush_line(&mut line, x, line_height, cursor, &mut links);
        self.canvas.set_text_color(Color::BLACK);
        self.canvas.set_draw_color(Color::BLACK);
        Ok((cursor, links))
    }

    /// Draw the pending line, if any, and move below it.
    fn flush_line(
        &mut self,
        line: &mut PendingLine,
        x: f64,
        line_height: f64,
        cursor: Cursor,
        links: &mut Vec<LinkAnnotation>,
    ) -> Cursor {
        let mut pending = std::mem::take(line);
        // Trailing spaces are not drawn.
        while let Some(last) = pending.fragments.last_mut() {
            let trimmed = last.text.trim_end().len();
            if trimmed == last.text.len() {
                break;
            }
            last.text.truncate(trimmed);
            self.canvas.set_font(last.font);
            last.width = self.canvas.text_width(&last.text);
            if last.text.is_empty() {
                pending.fragments.pop();
            } else {
                break;
            }
        }
        if pending.is_empty() {
            return cursor;
        }

        let cursor = self.check_page(cursor, line_height);
        let base_y = baseline(cursor.y, line_height);

        for fragment in &pending.fragments {
            let fx = x + fragment.x;
            self.canvas.set_font(fragment.font);
            self.canvas.set_text_color(fragment.style.color());
            self.canvas.draw_text(&fragment.text, fx, base_y);

            let size_mm = fragment.font.size / crate::canvas::PT_PER_MM;
            match fragment.style {
                RunStyle::Link => {
                    self.canvas.set_draw_color(Color::LINK);
                    self.canvas.draw_line(fx, base_y + 0.5, fx + fragment.width, base_y + 0.5);
                }
                RunStyle::Strikethrough => {
                    let y = base_y - size_mm * 0.3;
                    self.canvas.set_draw_color(Color::BLACK);
                    self.canvas.draw_line(fx, y, fx + fragment.width, y);
                }
                _ => {}
            }

            if let Some(href) = &fragment.href {
                links.push(LinkAnnotation {
                    page: cursor.page,
                    x: fx,
                    y: cursor.y,
                    width: fragment.width,
                    height: line_height,
                    target: AnnotationTarget::from_href(href),
                });
            }
        }

        Cursor {
            page: cursor.page,
            y: cursor.y + line_height,
        }
    }

    /// Plain word-wrap for a paragraph that only has raw text. Markdown
    /// link syntax in the text is located by pattern to place link regions.
    pub(super) fn layout_plain_paragraph(
        &mut self,
        text: &str,
        cursor: Cursor,
    ) -> (Cursor, Vec<LinkAnnotation>) {
        let line_height = self.options.line_height;
        let x = self.left();
        let mut cursor = cursor;
        let mut links = Vec::new();

        self.canvas.set_font(self.body_font());
        self.canvas.set_text_color(Color::BLACK);

        for line in wrap_text(&*self.canvas, text, self.max_width()) {
            cursor = self.check_page(cursor, line_height);
            self.canvas.draw_text(&line, x, baseline(cursor.y, line_height));

            for caps in MARKDOWN_LINK_RE.captures_iter(&line) {
                let (Some(whole), Some(href)) = (caps.get(0), caps.get(2)) else {
                    continue;
                };
                links.push(LinkAnnotation {
                    page: cursor.page,
                    x: x + self.canvas.text_width(&line[..whole.start()]),
                    y: cursor.y,
                    width: self.canvas.text_width(whole.as_str()),
                    height: line_height,
                    target: AnnotationTarget::from_href(href.as_str()),
                });
            }
            cursor.y += line_height;
        }

        (cursor, links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{PdfCanvas, PT_PER_MM};
    use crate::font::FontContext;
    use crate::image_loader::ImageSource;
    use crate::layout::RenderReport;
    use crate::markdown::tokenize;
    use crate::model::{Block, PageSize, RenderOptions};
    use async_trait::async_trait;

    struct NoImages;

    #[async_trait]
    impl ImageSource for NoImages {
        async fn fetch(&self, src: &str) -> Result<Vec<u8>, FolioError> {
            Err(FolioError::Image(format!("no image at {}", src)))
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

    fn drawn(canvas: &PdfCanvas) -> Vec<String> {
        canvas
            .pages()
            .iter()
            .flat_map(|p| p.texts().map(|t| t.0.to_string()))
            .collect()
    }

    fn text(style: RunStyle, s: &str) -> Segment {
        Segment::Text {
            style,
            text: s.to_string(),
            href: None,
            gap_after: 0.0,
        }
    }

    #[test]
    fn whitespace_run_kept_inside_same_style_merge() {
        let runs = vec![
            InlineRun::text("a"),
            InlineRun::text(" "),
            InlineRun::text("b"),
            InlineRun::strong("c"),
        ];
        let segments = normalize_runs(&runs);
        assert_eq!(segments, vec![text(RunStyle::Normal, "a b"), text(RunStyle::Strong, "c")]);
    }

    #[test]
    fn whitespace_run_dropped_at_style_boundary() {
        let runs = vec![
            InlineRun::strong("a"),
            InlineRun::text("  "),
            InlineRun::emphasis("b"),
        ];
        let segments = normalize_runs(&runs);
        assert_eq!(segments, vec![text(RunStyle::Strong, "a"), text(RunStyle::Emphasis, "b")]);
    }

    #[test]
    fn tabs_expanded_in_inline_text() {
        let segments = normalize_runs(&[InlineRun::text("a\tb")]);
        assert_eq!(segments, vec![text(RunStyle::Normal, "a    b")]);
    }

    #[test]
    fn hard_break_survives_normalization() {
        let runs = vec![InlineRun::text("one"), InlineRun::text("\n"), InlineRun::text("two")];
        let segments = normalize_runs(&runs);
        assert_eq!(segments, vec![text(RunStyle::Normal, "one\ntwo")]);
    }

    #[test]
    fn links_merge_only_with_same_href() {
        let runs = vec![
            InlineRun::link("a", "#x"),
            InlineRun::link("b", "#x"),
            InlineRun::link("c", "#y"),
        ];
        let segments = normalize_runs(&runs);
        assert_eq!(segments.len(), 2);
        assert!(matches!(&segments[0], Segment::Text { text, .. } if text == "ab"));
    }

    #[test]
    fn images_stay_separate() {
        let runs = vec![
            InlineRun::text("x"),
            InlineRun::Image {
                alt: "pic".into(),
                src: "p.png".into(),
            },
            InlineRun::text("y"),
        ];
        let segments = normalize_runs(&runs);
        assert_eq!(segments.len(), 3);
        assert!(matches!(segments[1], Segment::Image { .. }));
    }

    #[test]
    fn boundary_gaps() {
        let mut segments = vec![
            text(RunStyle::Normal, "a"),
            text(RunStyle::Strong, "b"),
            text(RunStyle::Emphasis, "c"),
            text(RunStyle::Normal, "d "),
            text(RunStyle::Strong, "e"),
        ];
        apply_boundary_gaps(&mut segments, 10.0);
        let gaps: Vec<f64> = segments
            .iter()
            .map(|s| match s {
                Segment::Text { gap_after, .. } => *gap_after,
                _ => 0.0,
            })
            .collect();
        assert_eq!(gaps, vec![6.0, 6.0, 5.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn soft_wrapped_source_keeps_word_spaces() {
        let (canvas, _) = run(&tokenize("hello\nworld")).await;
        assert_eq!(drawn(&canvas), vec!["hello world"]);

        let (canvas, _) = run(&tokenize("*alpha*\n*beta* and\nmore words")).await;
        assert_eq!(drawn(&canvas), vec!["alpha beta", " and more words"]);
    }

    #[tokio::test]
    async fn hard_break_draws_two_lines() {
        let (canvas, _) = run(&tokenize("one  \ntwo")).await;
        let texts: Vec<(String, f64)> = canvas.pages()[0]
            .texts()
            .map(|(text, _, y, _)| (text.to_string(), y))
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].0, "one");
        assert_eq!(texts[1].0, "two");
        assert!((texts[1].1 - texts[0].1 - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn overlong_word_is_split_within_the_margins() {
        let long = format!("short {}", "x".repeat(200));
        let blocks = vec![Block::Paragraph {
            text: long.clone(),
            runs: vec![InlineRun::text(long)],
        }];
        let (canvas, _) = run(&blocks).await;
        let ctx = FontContext::new();
        let texts: Vec<_> = canvas.pages()[0].texts().collect();
        assert!(texts.len() >= 3);
        for (text, x, _, font) in &texts {
            let right = x + ctx.measure_string(text, font) / PT_PER_MM;
            assert!(right <= 190.0 + 1e-6, "'{}' ends at {:.1}mm", text, right);
        }
        let joined: String = texts.iter().map(|t| t.0).collect();
        assert_eq!(joined, format!("short{}", "x".repeat(200)));
    }

    #[tokio::test]
    async fn raw_text_paragraph_places_link_regions() {
        let blocks = vec![Block::Paragraph {
            text: "see [t](https://x.test) now".into(),
            runs: vec![],
        }];
        let (canvas, report) = run(&blocks).await;
        assert_eq!(drawn(&canvas), vec!["see [t](https://x.test) now"]);

        let ctx = FontContext::new();
        let font = FontSpec::new(FontFamily::Helvetica, 10.0);
        let mm = |s: &str| ctx.measure_string(s, &font) / PT_PER_MM;
        assert_eq!(report.links.len(), 1);
        let link = &report.links[0];
        assert_eq!(link.page, 0);
        assert!((link.x - (20.0 + mm("see "))).abs() < 1e-9);
        assert!((link.width - mm("[t](https://x.test)")).abs() < 1e-9);
        assert_eq!(link.y, 20.0);
        assert_eq!(link.height, 5.0);
        assert_eq!(
            link.target,
            AnnotationTarget::External {
                url: "https://x.test".into()
            }
        );
        assert_eq!(canvas.pages()[0].links.len(), 1);
    }

    #[test]
    fn link_pattern_matches_markdown_links() {
        let caps = MARKDOWN_LINK_RE.captures("see [docs](https://x.test) now").unwrap();
        assert_eq!(&caps[1], "docs");
        assert_eq!(&caps[2], "https://x.test");
        assert!(MARKDOWN_LINK_RE.captures("[broken](has space)").is_none());
    }
}
