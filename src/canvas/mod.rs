//! # Drawing Surface
//!
//! The [`Canvas`] trait is everything the layout engine needs from a
//! rendering backend: pages, fonts, text measurement, text, lines,
//! rectangles, images and clickable link regions. Coordinates are in
//! millimetres from the top-left corner of the page; text is drawn with its
//! baseline at `y`.
//!
//! [`PdfCanvas`] records draw commands per page and hands them to the
//! [`PdfWriter`](crate::pdf::PdfWriter) when the document is finished.

use serde::Serialize;

use crate::error::FolioError;
use crate::font::FontContext;
use crate::image_loader::LoadedImage;
use crate::model::{Metadata, PageSize};
use crate::pdf::{OutlineItem, PdfWriter};
use crate::style::{Color, FontSpec};

/// Points per millimetre.
pub const PT_PER_MM: f64 = 72.0 / 25.4;

/// An axis-aligned rectangle in page coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where a clickable region leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LinkTarget {
    Uri { url: String },
    Page { page: usize, y: f64 },
}

/// The drawing primitive the layout engine renders onto.
pub trait Canvas {
    /// (width, height) of the current page in millimetres.
    fn page_size(&self) -> (f64, f64);
    fn page_count(&self) -> usize;
    /// Zero-based index of the page draw calls go to.
    fn current_page(&self) -> usize;
    fn set_page(&mut self, index: usize) -> Result<(), FolioError>;
    /// Append a page and make it current. Returns its index.
    fn add_page(&mut self) -> usize;

    fn set_font(&mut self, font: FontSpec);
    fn font(&self) -> FontSpec;
    fn set_text_color(&mut self, color: Color);
    fn set_draw_color(&mut self, color: Color);

    /// Width of `text` in the current font, in millimetres.
    fn text_width(&self, text: &str) -> f64;

    fn draw_text(&mut self, text: &str, x: f64, y: f64);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64);
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn draw_image(&mut self, image: LoadedImage, rect: Rect);
    /// Register a clickable region on the current page.
    fn add_link(&mut self, rect: Rect, target: LinkTarget);
}

/// What to draw on a page.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    Text {
        text: String,
        x: f64,
        y: f64,
        font: FontSpec,
        color: Color,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
    Rect {
        rect: Rect,
        color: Color,
    },
    Image {
        image: LoadedImage,
        rect: Rect,
    },
}

/// A registered clickable region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRegion {
    pub rect: Rect,
    pub target: LinkTarget,
}

/// A finished page ready for PDF serialization.
#[derive(Debug, Clone)]
pub struct LayoutPage {
    pub width: f64,
    pub height: f64,
    pub elements: Vec<DrawCommand>,
    pub links: Vec<LinkRegion>,
}

impl LayoutPage {
    fn new(size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        Self {
            width,
            height,
            elements: Vec::new(),
            links: Vec::new(),
        }
    }

    /// All text drawn on this page, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = (&str, f64, f64, &FontSpec)> {
        self.elements.iter().filter_map(|e| match e {
            DrawCommand::Text { text, x, y, font, .. } => Some((text.as_str(), *x, *y, font)),
            _ => None,
        })
    }
}

/// A canvas that records draw commands and serializes them to PDF.
pub struct PdfCanvas {
    size: PageSize,
    pages: Vec<LayoutPage>,
    current: usize,
    font: FontSpec,
    text_color: Color,
    draw_color: Color,
    line_width: f64,
    font_context: FontContext,
}

impl PdfCanvas {
    /// A canvas with one empty page.
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            pages: vec![LayoutPage::new(size)],
            current: 0,
            font: FontSpec::default(),
            text_color: Color::BLACK,
            draw_color: Color::BLACK,
            line_width: 0.2,
            font_context: FontContext::new(),
        }
    }

    pub fn pages(&self) -> &[LayoutPage] {
        &self.pages
    }

    /// Serialize every page to PDF bytes.
    pub fn finish(&self, metadata: &Metadata) -> Vec<u8> {
        PdfWriter::new().write(&self.pages, metadata, &self.font_context)
    }

    /// Serialize every page plus a bookmark outline.
    pub fn finish_with_outline(&self, metadata: &Metadata, outline: &[OutlineItem]) -> Vec<u8> {
        PdfWriter::new().write_with_outline(&self.pages, metadata, outline, &self.font_context)
    }

    fn page_mut(&mut self) -> &mut LayoutPage {
        &mut self.pages[self.current]
    }
}

impl Canvas for PdfCanvas {
    fn page_size(&self) -> (f64, f64) {
        let page = &self.pages[self.current];
        (page.width, page.height)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn current_page(&self) -> usize {
        self.current
    }

    fn set_page(&mut self, index: usize) -> Result<(), FolioError> {
        if index >= self.pages.len() {
            return Err(FolioError::Render(format!(
                "page {} out of range ({} pages)",
                index,
                self.pages.len()
            )));
        }
        self.current = index;
        Ok(())
    }

    fn add_page(&mut self) -> usize {
        self.pages.push(LayoutPage::new(self.size));
        self.current = self.pages.len() - 1;
        self.current
    }

    fn set_font(&mut self, font: FontSpec) {
        self.font = font;
    }

    fn font(&self) -> FontSpec {
        self.font
    }

    fn set_text_color(&mut self, color: Color) {
        self.text_color = color;
    }

    fn set_draw_color(&mut self, color: Color) {
        self.draw_color = color;
    }

    fn text_width(&self, text: &str) -> f64 {
        self.font_context.measure_string(text, &self.font) / PT_PER_MM
    }

    fn draw_text(&mut self, text: &str, x: f64, y: f64) {
        let command = DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            font: self.font,
            color: self.text_color,
        };
        self.page_mut().elements.push(command);
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let command = DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            color: self.draw_color,
            width: self.line_width,
        };
        self.page_mut().elements.push(command);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.page_mut().elements.push(DrawCommand::Rect { rect, color });
    }

    fn draw_image(&mut self, image: LoadedImage, rect: Rect) {
        self.page_mut()
            .elements
            .push(DrawCommand::Image { image, rect });
    }

    fn add_link(&mut self, rect: Rect, target: LinkTarget) {
        self.page_mut().links.push(LinkRegion { rect, target });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::FontFamily;

    #[test]
    fn starts_with_one_page() {
        let canvas = PdfCanvas::new(PageSize::A4);
        assert_eq!(canvas.page_count(), 1);
        assert_eq!(canvas.current_page(), 0);
        assert_eq!(canvas.page_size(), (210.0, 297.0));
    }

    #[test]
    fn add_page_becomes_current_and_set_page_checks_range() {
        let mut canvas = PdfCanvas::new(PageSize::A5);
        assert_eq!(canvas.add_page(), 1);
        assert_eq!(canvas.current_page(), 1);
        canvas.set_page(0).unwrap();
        assert_eq!(canvas.current_page(), 0);
        assert!(canvas.set_page(2).is_err());
    }

    #[test]
    fn text_width_is_in_millimetres() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.set_font(FontSpec::new(FontFamily::Courier, 10.0));
        // 10 Courier glyphs at 10pt = 60pt
        let w = canvas.text_width("0123456789");
        assert!((w - 60.0 / PT_PER_MM).abs() < 1e-9);
    }

    #[test]
    fn draw_calls_go_to_the_current_page() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.add_page();
        canvas.draw_text("second", 20.0, 30.0);
        canvas.set_page(0).unwrap();
        canvas.add_link(
            Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 5.0,
            },
            LinkTarget::Uri {
                url: "https://example.com".into(),
            },
        );
        assert_eq!(canvas.pages()[1].texts().count(), 1);
        assert_eq!(canvas.pages()[0].links.len(), 1);
        assert!(canvas.pages()[1].links.is_empty());
    }
}
