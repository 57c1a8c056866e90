//! # Table of Contents and Link Resolution
//!
//! The TOC is drawn from a static list of the document's headings, so it
//! can sit anywhere in the flow. Its rows are ordinary internal links: they
//! get their targets in [`LayoutEngine::resolve_links`] together with every
//! `[text](#Heading)` link in the body, once all headings have been drawn.

use crate::canvas::{Canvas, LinkTarget};
use crate::error::FolioError;
use crate::model::Block;
use crate::style::Color;
use crate::text::expand_tabs;

use super::{baseline, AnnotationTarget, Cursor, LayoutEngine, LinkAnnotation, UnresolvedLink};

/// Indent per heading level below 1.
const LEVEL_INDENT: f64 = 5.0;

/// A heading as listed in the TOC.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingRef {
    pub text: String,
    pub level: u8,
}

/// Every heading in document order.
pub fn collect_headings(blocks: &[Block]) -> Vec<HeadingRef> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading { depth, text, .. } => Some(HeadingRef {
                text: text.clone(),
                level: *depth,
            }),
            _ => None,
        })
        .collect()
}

impl<'a, C: Canvas> LayoutEngine<'a, C> {
    /// Draw the TOC title, one underlined row per heading and a separator.
    pub(super) fn render_toc(&mut self, headings: &[HeadingRef], cursor: Cursor) -> Cursor {
        let line_height = self.options.line_height;
        let title_height = line_height * 1.6;
        let left = self.left();
        let right = left + self.max_width();

        let mut cursor = self.check_page(cursor, title_height);
        self.canvas.set_font(self.body_font().bold().with_size(self.options.font_size + 4.0));
        self.canvas.set_text_color(Color::BLACK);
        self.canvas
            .draw_text(&self.options.toc_title, left, baseline(cursor.y, title_height));
        cursor.y += title_height + 2.0;

        self.canvas.set_font(self.body_font());
        for heading in headings {
            cursor = self.check_page(cursor, line_height);
            let x = left + (heading.level.saturating_sub(1)) as f64 * LEVEL_INDENT;
            let y = baseline(cursor.y, line_height);
            let label = expand_tabs(&heading.text);
            let width = self.canvas.text_width(&label);

            self.canvas.set_text_color(Color::LINK);
            self.canvas.draw_text(&label, x, y);
            self.canvas.set_draw_color(Color::LINK);
            self.canvas.draw_line(x, y + 0.5, x + width, y + 0.5);

            self.links.push(LinkAnnotation {
                page: cursor.page,
                x,
                y: cursor.y,
                width,
                height: line_height,
                target: AnnotationTarget::Pending {
                    heading_ref: heading.text.clone(),
                },
            });
            cursor.y += line_height;
        }

        cursor = self.check_page(cursor, line_height);
        let y = cursor.y + line_height / 2.0;
        self.canvas.set_draw_color(Color::RULE);
        self.canvas.draw_line(left, y, right, y);
        self.canvas.set_draw_color(Color::BLACK);
        self.canvas.set_text_color(Color::BLACK);
        cursor.y += line_height;

        log::debug!(
            "rendered TOC with {} entries, ends on page {}",
            headings.len(),
            cursor.page + 1
        );
        self.clamp(cursor)
    }

    /// Match every pending internal link to the first destination with the
    /// same heading text. Returns the clickable links and the misses.
    pub(super) fn resolve_links(&mut self) -> (Vec<LinkAnnotation>, Vec<UnresolvedLink>) {
        let mut resolved = Vec::with_capacity(self.links.len());
        let mut unresolved = Vec::new();

        for mut link in std::mem::take(&mut self.links) {
            if let AnnotationTarget::Pending { heading_ref } = &link.target {
                let heading_ref = heading_ref.clone();
                match self.destinations.iter().find(|d| d.heading_text == heading_ref) {
                    Some(dest) => {
                        link.target = AnnotationTarget::Internal {
                            heading_ref,
                            page: dest.page,
                            y: dest.y,
                        };
                    }
                    None => {
                        log::warn!(
                            "link to '#{}' on page {} has no matching heading; left unlinked",
                            heading_ref,
                            link.page + 1
                        );
                        unresolved.push(UnresolvedLink {
                            heading_ref,
                            page: link.page,
                        });
                        continue;
                    }
                }
            }
            resolved.push(link);
        }

        (resolved, unresolved)
    }

    /// Add every resolved link to its page, then return to the page that
    /// was current before.
    pub(super) fn register_links(&mut self, links: &[LinkAnnotation]) -> Result<(), FolioError> {
        let previous = self.canvas.current_page();
        for link in links {
            let target = match &link.target {
                AnnotationTarget::External { url } => LinkTarget::Uri { url: url.clone() },
                AnnotationTarget::Internal { page, y, .. } => LinkTarget::Page {
                    page: *page,
                    y: *y,
                },
                AnnotationTarget::Pending { .. } => continue,
            };
            self.canvas.set_page(link.page)?;
            self.canvas.add_link(link.rect(), target);
        }
        self.canvas.set_page(previous)
    }
}
