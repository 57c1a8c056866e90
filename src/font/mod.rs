//! # Font Management
//!
//! Font resolution and text measurement for the standard PDF fonts
//! (Helvetica, Times, Courier). These never need embedding, so the
//! serializer only writes a Type1 reference per variant used.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

use crate::style::{FontFamily, FontSpec};

/// A font registry that maps font family + weight + style to a standard font.
pub struct FontRegistry {
    fonts: HashMap<FontKey, StandardFont>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
    pub italic: bool,
}

impl FontKey {
    /// The registry key for a font selection, with weight snapped to 400/700.
    pub fn from_spec(spec: &FontSpec) -> Self {
        Self {
            family: spec.family.name().to_string(),
            weight: if spec.is_bold() { 700 } else { 400 },
            italic: spec.is_italic(),
        }
    }
}

/// The standard PDF fonts the engine draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();

        let standard_mappings = vec![
            (("Helvetica", 400, false), StandardFont::Helvetica),
            (("Helvetica", 700, false), StandardFont::HelveticaBold),
            (("Helvetica", 400, true), StandardFont::HelveticaOblique),
            (("Helvetica", 700, true), StandardFont::HelveticaBoldOblique),
            (("Times", 400, false), StandardFont::TimesRoman),
            (("Times", 700, false), StandardFont::TimesBold),
            (("Times", 400, true), StandardFont::TimesItalic),
            (("Times", 700, true), StandardFont::TimesBoldItalic),
            (("Courier", 400, false), StandardFont::Courier),
            (("Courier", 700, false), StandardFont::CourierBold),
            (("Courier", 400, true), StandardFont::CourierOblique),
            (("Courier", 700, true), StandardFont::CourierBoldOblique),
        ];

        for ((family, weight, italic), font) in standard_mappings {
            fonts.insert(
                FontKey {
                    family: family.to_string(),
                    weight,
                    italic,
                },
                font,
            );
        }

        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica if not found.
    pub fn resolve(&self, key: &FontKey) -> StandardFont {
        if let Some(font) = self.fonts.get(key) {
            return *font;
        }

        let snapped = FontKey {
            family: "Helvetica".to_string(),
            weight: if key.weight >= 600 { 700 } else { 400 },
            italic: key.italic,
        };
        self.fonts
            .get(&snapped)
            .copied()
            .unwrap_or(StandardFont::Helvetica)
    }
}

/// Shared font context used by the canvas and the PDF serializer.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Resolve a font selection to a standard font.
    pub fn resolve(&self, spec: &FontSpec) -> StandardFont {
        self.resolve_key(&FontKey::from_spec(spec))
    }

    pub fn resolve_key(&self, key: &FontKey) -> StandardFont {
        self.registry.resolve(key)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, spec: &FontSpec) -> f64 {
        self.resolve(spec).metrics().measure_string(text, spec.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_font(size: f64) -> FontSpec {
        FontSpec::new(FontFamily::Helvetica, size)
    }

    #[test]
    fn times_variants_resolve_and_measure_narrower() {
        let ctx = FontContext::new();
        let times = FontSpec::new(FontFamily::Times, 12.0);
        assert_eq!(ctx.resolve(&times).pdf_name(), "Times-Roman");
        assert_eq!(ctx.resolve(&times.bold().italic()).pdf_name(), "Times-BoldItalic");
        // Times is a narrower face than Helvetica.
        let helvetica = ctx.measure_string("Hello", &body_font(12.0));
        assert!(ctx.measure_string("Hello", &times) < helvetica);
    }

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.measure_string(" ", &body_font(12.0));
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("A", &body_font(12.0));
        let bold = ctx.measure_string("A", &body_font(12.0).bold());
        assert!(bold > regular, "Bold A should be wider than regular A");
    }

    #[test]
    fn test_font_context_measure_string() {
        let ctx = FontContext::new();
        let w = ctx.measure_string("Hello", &body_font(12.0));
        assert!(w > 0.0);
    }

    #[test]
    fn test_italic_resolves_to_oblique() {
        let ctx = FontContext::new();
        let font = ctx.resolve(&body_font(10.0).italic());
        assert_eq!(font.pdf_name(), "Helvetica-Oblique");
        let code = ctx.resolve(&FontSpec::new(FontFamily::Courier, 9.0).bold());
        assert_eq!(code.pdf_name(), "Courier-Bold");
    }

    #[test]
    fn test_registry_fallback() {
        let registry = FontRegistry::new();
        let key = FontKey {
            family: "Unknown".to_string(),
            weight: 800,
            italic: false,
        };
        assert_eq!(registry.resolve(&key), StandardFont::HelveticaBold);
    }
}
