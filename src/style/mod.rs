//! # Visual Styles
//!
//! Colors and font variants shared by the layout engine, the canvas and the
//! PDF serializer.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

/// The font families available without embedding (PDF standard 14 subset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Times => "Times",
            FontFamily::Courier => "Courier",
        }
    }
}

/// A complete font selection: family, weight, style and size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: FontFamily,
    pub weight: u32,
    pub style: FontStyle,
    pub size: f64,
}

impl FontSpec {
    pub fn new(family: FontFamily, size: f64) -> Self {
        Self {
            family,
            weight: 400,
            style: FontStyle::Normal,
            size,
        }
    }

    pub fn bold(mut self) -> Self {
        self.weight = 700;
        self
    }

    pub fn italic(mut self) -> Self {
        self.style = FontStyle::Italic;
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }

    pub fn is_italic(&self) -> bool {
        matches!(self.style, FontStyle::Italic)
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        FontSpec::new(FontFamily::Helvetica, 10.0)
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64, // 0.0 - 1.0
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    /// Link text.
    pub const LINK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.8,
        a: 1.0,
    };
    /// Code block background.
    pub const CODE_BACKGROUND: Color = Color {
        r: 0.94,
        g: 0.94,
        b: 0.94,
        a: 1.0,
    };
    /// Blockquote rule and TOC separator.
    pub const RULE: Color = Color {
        r: 0.6,
        g: 0.6,
        b: 0.6,
        a: 1.0,
    };
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}
