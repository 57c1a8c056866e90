//! # Document Model
//!
//! The input representation for the layout engine: a flat sequence of
//! block tokens, each owning its inline runs, plus the render options that
//! control page geometry and typography.
//!
//! Blocks are produced once by the tokenizer and consumed once, in document
//! order. They are plain data; the layout engine matches on them
//! exhaustively, so a new block kind is a compile error until every handler
//! knows about it.

use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::style::FontFamily;

/// The literal paragraph body that requests a table of contents.
pub const TOC_PLACEHOLDER: &str = "[TOC]";

/// One structural unit of a Markdown document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    Heading {
        /// 1..=6
        depth: u8,
        /// The heading's literal text; internal links match against it.
        text: String,
        runs: Vec<InlineRun>,
    },
    Paragraph {
        /// Raw text. Only drawn directly when `runs` is empty.
        text: String,
        runs: Vec<InlineRun>,
    },
    List {
        ordered: bool,
        /// First item number for ordered lists.
        #[serde(default = "default_start")]
        start: u64,
        items: Vec<ListItem>,
    },
    Blockquote {
        text: String,
    },
    Code {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    HorizontalRule,
    Space,
}

fn default_start() -> u64 {
    1
}

impl Block {
    /// Is this the `[TOC]` sentinel paragraph?
    pub fn is_toc_placeholder(&self) -> bool {
        match self {
            Block::Paragraph { text, runs } => {
                if runs.is_empty() {
                    text.trim() == TOC_PLACEHOLDER
                } else {
                    flatten_runs(runs).trim() == TOC_PLACEHOLDER
                }
            }
            _ => false,
        }
    }
}

/// A single list entry. Nested lists are flattened into the item's runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    pub runs: Vec<InlineRun>,
}

impl ListItem {
    pub fn text(&self) -> String {
        flatten_runs(&self.runs)
    }
}

/// A styled text, link or image fragment inside a block.
///
/// Order within a block is significant and is preserved through merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InlineRun {
    Text { value: String },
    Strong { value: String },
    Emphasis { value: String },
    Strikethrough { value: String },
    Link { value: String, href: String },
    Image { alt: String, src: String },
    CodeSpan { value: String },
}

impl InlineRun {
    pub fn text(value: impl Into<String>) -> Self {
        InlineRun::Text {
            value: value.into(),
        }
    }

    pub fn strong(value: impl Into<String>) -> Self {
        InlineRun::Strong {
            value: value.into(),
        }
    }

    pub fn emphasis(value: impl Into<String>) -> Self {
        InlineRun::Emphasis {
            value: value.into(),
        }
    }

    pub fn link(value: impl Into<String>, href: impl Into<String>) -> Self {
        InlineRun::Link {
            value: value.into(),
            href: href.into(),
        }
    }

    /// The visible text of this run. Images contribute their alt text.
    pub fn value(&self) -> &str {
        match self {
            InlineRun::Text { value }
            | InlineRun::Strong { value }
            | InlineRun::Emphasis { value }
            | InlineRun::Strikethrough { value }
            | InlineRun::Link { value, .. }
            | InlineRun::CodeSpan { value } => value,
            InlineRun::Image { alt, .. } => alt,
        }
    }
}

/// Concatenate the visible text of a run sequence.
pub fn flatten_runs(runs: &[InlineRun]) -> String {
    runs.iter().map(InlineRun::value).collect()
}

/// Options controlling page geometry, typography and TOC behaviour.
///
/// Lengths are millimetres, font sizes are points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub page: PageConfig,
    /// Family for body text, headings, lists and quotes. Code stays Courier.
    pub font_family: FontFamily,
    /// Body text size.
    pub font_size: f64,
    /// Body line advance.
    pub line_height: f64,
    pub code_font_size: f64,
    pub code_line_height: f64,
    /// Render a TOC at the start of the document when no `[TOC]` is present.
    pub include_toc: bool,
    pub toc_title: String,
    /// Timeout for fetching remote images.
    pub image_timeout_secs: u64,
    pub metadata: Metadata,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            font_family: FontFamily::Helvetica,
            font_size: 10.0,
            line_height: 5.0,
            code_font_size: 9.0,
            code_line_height: 4.5,
            include_toc: false,
            toc_title: "Table of Contents".to_string(),
            image_timeout_secs: 10,
            metadata: Metadata::default(),
        }
    }
}

impl RenderOptions {
    /// Parse options from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

/// Configuration for a page: size and margins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// Page size. Defaults to A4.
    #[serde(default = "PageSize::default")]
    pub size: PageSize,

    /// Page margins in millimetres.
    #[serde(default = "default_margin")]
    pub margin: Edges,
}

fn default_margin() -> Edges {
    Edges::uniform(20.0)
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: default_margin(),
        }
    }
}

impl PageConfig {
    /// Width available to content between the side margins.
    pub fn content_width(&self) -> f64 {
        self.size.dimensions().0 - self.margin.horizontal()
    }

    /// The lowest Y at which content may still sit.
    pub fn bottom_limit(&self) -> f64 {
        self.size.dimensions().1 - self.margin.bottom
    }
}

/// Standard page sizes.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in millimetres.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (210.0, 297.0),
            PageSize::A3 => (297.0, 420.0),
            PageSize::A5 => (148.0, 210.0),
            PageSize::Letter => (215.9, 279.4),
            PageSize::Legal => (215.9, 355.6),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) used for margins.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }
}
