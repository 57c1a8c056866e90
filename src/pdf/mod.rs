//! # PDF Serializer
//!
//! Takes the recorded pages from [`PdfCanvas`](crate::canvas::PdfCanvas) and
//! writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The subset needed here is small:
//! standard Type1 fonts, Flate-compressed content streams, image XObjects,
//! link annotations and an outline (bookmark) tree.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Layout coordinates are millimetres from the top-left corner. Everything
//! is converted to points with a bottom-left origin on the way out.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{DrawCommand, LayoutPage, LinkTarget, Rect, PT_PER_MM};
use crate::font::{FontContext, FontKey};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::model::Metadata;
use crate::style::FontSpec;

/// Space kept above an internal link's target when a viewer jumps to it.
const DEST_TOP_PADDING_PT: f64 = 24.0;

/// One bookmark in the document outline.
#[derive(Debug, Clone)]
pub struct OutlineItem {
    pub title: String,
    /// 1-based nesting level (heading depth).
    pub level: u8,
    pub page: usize,
    pub y: f64,
}

pub struct PdfWriter;

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Font keys in resource order: `/F0`, `/F1`, ...
    font_objects: Vec<(FontKey, usize)>,
    /// XObject obj IDs for images, indexed as /Im0, /Im1, ...
    image_objects: Vec<usize>,
    /// Maps (page_index, element_index) to image index in image_objects.
    image_index_map: HashMap<(usize, usize), usize>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    /// Reserve an object ID whose data is written later.
    fn reserve(&mut self) -> usize {
        self.objects.push(PdfObject { data: Vec::new() });
        self.objects.len() - 1
    }

    fn push(&mut self, data: Vec<u8>) -> usize {
        self.objects.push(PdfObject { data });
        self.objects.len() - 1
    }

    fn push_stream(&mut self, dict_extra: &str, raw: &[u8]) -> usize {
        let compressed = compress_to_vec_zlib(raw, 6);
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {} /Filter /FlateDecode{} >>\nstream\n",
            compressed.len(),
            dict_extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write recorded pages to a PDF byte vector.
    pub fn write(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        font_context: &FontContext,
    ) -> Vec<u8> {
        self.write_with_outline(pages, metadata, &[], font_context)
    }

    /// Write recorded pages plus a bookmark outline.
    pub fn write_with_outline(
        &self,
        pages: &[LayoutPage],
        metadata: &Metadata,
        outline: &[OutlineItem],
        font_context: &FontContext,
    ) -> Vec<u8> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
            image_index_map: HashMap::new(),
        };

        // 0 = placeholder (PDF objects are 1-indexed), 1 = Catalog, 2 = Pages
        builder.reserve();
        builder.reserve();
        builder.reserve();

        self.register_fonts(&mut builder, pages, font_context);
        self.register_images(&mut builder, pages);

        // Page IDs are needed up front: link destinations and outline
        // entries may point at any page.
        let page_obj_ids: Vec<usize> = pages.iter().map(|_| builder.reserve()).collect();

        for (page_idx, page) in pages.iter().enumerate() {
            let content = self.build_content_stream(page, page_idx, &builder);
            let content_obj_id = builder.push_stream("", content.as_bytes());

            let annot_ids: Vec<usize> = page
                .links
                .iter()
                .filter_map(|link| {
                    let annot = self.build_link_annotation(
                        page,
                        &link.rect,
                        &link.target,
                        pages,
                        &page_obj_ids,
                    )?;
                    Some(builder.push(annot.into_bytes()))
                })
                .collect();

            let font_resources = self.build_font_resource_dict(&builder.font_objects);
            let xobject_resources = self.build_xobject_resource_dict(page_idx, &builder);
            let mut resources = format!("/Font << {} >>", font_resources);
            if !xobject_resources.is_empty() {
                let _ = write!(resources, " /XObject << {} >>", xobject_resources);
            }
            let annots = if annot_ids.is_empty() {
                String::new()
            } else {
                let refs: Vec<String> = annot_ids.iter().map(|id| format!("{} 0 R", id)).collect();
                format!(" /Annots [{}]", refs.join(" "))
            };

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >>{} >>",
                to_pt(page.width),
                to_pt(page.height),
                content_obj_id,
                resources,
                annots
            );
            builder.objects[page_obj_ids[page_idx]].data = page_dict.into_bytes();
        }

        let outlines_id = self.write_outline(&mut builder, outline, pages, &page_obj_ids);

        let mut catalog = String::from("<< /Type /Catalog /Pages 2 0 R");
        if let Some(id) = outlines_id {
            let _ = write!(catalog, " /Outlines {} 0 R /PageMode /UseOutlines", id);
        }
        catalog.push_str(" >>");
        builder.objects[1].data = catalog.into_bytes();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let has_info =
            metadata.title.is_some() || metadata.author.is_some() || metadata.subject.is_some();
        let info_obj_id = if has_info {
            let mut info = String::from("<< ");
            if let Some(ref title) = metadata.title {
                let _ = write!(info, "/Title ({}) ", Self::encode_text(title));
            }
            if let Some(ref author) = metadata.author {
                let _ = write!(info, "/Author ({}) ", Self::encode_text(author));
            }
            if let Some(ref subject) = metadata.subject {
                let _ = write!(info, "/Subject ({}) ", Self::encode_text(subject));
            }
            info.push_str("/Producer (Folio) /Creator (Folio) >>");
            Some(builder.push(info.into_bytes()))
        } else {
            None
        };

        self.serialize(&builder, info_obj_id)
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(
        &self,
        page: &LayoutPage,
        page_idx: usize,
        builder: &PdfBuilder,
    ) -> String {
        let mut stream = String::new();
        let page_height = page.height;

        for (elem_idx, element) in page.elements.iter().enumerate() {
            match element {
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    font,
                    color,
                } => {
                    let font_idx = self.font_index(font, &builder.font_objects);
                    let _ = write!(
                        stream,
                        "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                        color.r,
                        color.g,
                        color.b,
                        font_idx,
                        font.size,
                        to_pt(*x),
                        to_pt(page_height - *y),
                        Self::encode_text(text)
                    );
                }
                DrawCommand::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    color,
                    width,
                } => {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        color.r,
                        color.g,
                        color.b,
                        to_pt(*width),
                        to_pt(*x1),
                        to_pt(page_height - *y1),
                        to_pt(*x2),
                        to_pt(page_height - *y2)
                    );
                }
                DrawCommand::Rect { rect, color } => {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        color.r,
                        color.g,
                        color.b,
                        to_pt(rect.x),
                        to_pt(page_height - rect.y - rect.height),
                        to_pt(rect.width),
                        to_pt(rect.height)
                    );
                }
                DrawCommand::Image { rect, .. } => {
                    if let Some(&img_idx) = builder.image_index_map.get(&(page_idx, elem_idx)) {
                        let _ = write!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            to_pt(rect.width),
                            to_pt(rect.height),
                            to_pt(rect.x),
                            to_pt(page_height - rect.y - rect.height),
                            img_idx
                        );
                    }
                }
            }
        }

        stream
    }

    /// `/Link` annotation dictionary, or `None` for a dangling page target.
    fn build_link_annotation(
        &self,
        page: &LayoutPage,
        rect: &Rect,
        target: &LinkTarget,
        pages: &[LayoutPage],
        page_obj_ids: &[usize],
    ) -> Option<String> {
        let x1 = to_pt(rect.x);
        let y1 = to_pt(page.height - rect.y - rect.height);
        let x2 = to_pt(rect.x + rect.width);
        let y2 = to_pt(page.height - rect.y);
        let action = match target {
            LinkTarget::Uri { url } => {
                format!("/A << /S /URI /URI ({}) >>", Self::encode_text(url))
            }
            LinkTarget::Page { page: dest, y } => {
                let dest_page = pages.get(*dest)?;
                format!(
                    "/Dest [{} 0 R /XYZ 0 {:.2} null]",
                    page_obj_ids[*dest],
                    Self::dest_top(dest_page, *y)
                )
            }
        };
        Some(format!(
            "<< /Type /Annot /Subtype /Link /Rect [{:.2} {:.2} {:.2} {:.2}] /Border [0 0 0] {} >>",
            x1, y1, x2, y2, action
        ))
    }

    /// Top edge, in PDF coordinates, a viewer should scroll to for `y`.
    fn dest_top(page: &LayoutPage, y: f64) -> f64 {
        let page_height = to_pt(page.height);
        (page_height - to_pt(y) + DEST_TOP_PADDING_PT).min(page_height)
    }

    /// Write the outline tree. Returns the /Outlines root object ID.
    fn write_outline(
        &self,
        builder: &mut PdfBuilder,
        outline: &[OutlineItem],
        pages: &[LayoutPage],
        page_obj_ids: &[usize],
    ) -> Option<usize> {
        let items: Vec<&OutlineItem> = outline.iter().filter(|i| i.page < pages.len()).collect();
        if items.is_empty() {
            return None;
        }

        let root_id = builder.reserve();
        let ids: Vec<usize> = items.iter().map(|_| builder.reserve()).collect();

        // Parent of each item: nearest preceding item with a lower level.
        let mut parents: Vec<Option<usize>> = Vec::with_capacity(items.len());
        let mut stack: Vec<usize> = Vec::new();
        for (i, item) in items.iter().enumerate() {
            while let Some(&top) = stack.last() {
                if items[top].level >= item.level {
                    stack.pop();
                } else {
                    break;
                }
            }
            parents.push(stack.last().copied());
            stack.push(i);
        }

        let children_of = |parent: Option<usize>| -> Vec<usize> {
            (0..items.len()).filter(|&i| parents[i] == parent).collect()
        };
        let descendants = |i: usize| -> usize {
            let mut count = 0;
            let mut j = i + 1;
            while j < items.len() && items[j].level > items[i].level {
                count += 1;
                j += 1;
            }
            count
        };

        for (i, item) in items.iter().enumerate() {
            let siblings = children_of(parents[i]);
            let pos = siblings.iter().position(|&s| s == i).unwrap_or(0);
            let parent_id = parents[i].map(|p| ids[p]).unwrap_or(root_id);

            let mut dict = format!(
                "<< /Title ({}) /Parent {} 0 R /Dest [{} 0 R /XYZ 0 {:.2} null]",
                Self::encode_text(&item.title),
                parent_id,
                page_obj_ids[item.page],
                Self::dest_top(&pages[item.page], item.y)
            );
            if pos > 0 {
                let _ = write!(dict, " /Prev {} 0 R", ids[siblings[pos - 1]]);
            }
            if let Some(&next) = siblings.get(pos + 1) {
                let _ = write!(dict, " /Next {} 0 R", ids[next]);
            }
            let kids = children_of(Some(i));
            if let (Some(first), Some(last)) = (kids.first(), kids.last()) {
                let _ = write!(
                    dict,
                    " /First {} 0 R /Last {} 0 R /Count {}",
                    ids[*first],
                    ids[*last],
                    descendants(i)
                );
            }
            dict.push_str(" >>");
            builder.objects[ids[i]].data = dict.into_bytes();
        }

        let roots = children_of(None);
        let (first, last) = (roots[0], roots[roots.len() - 1]);
        builder.objects[root_id].data = format!(
            "<< /Type /Outlines /First {} 0 R /Last {} 0 R /Count {} >>",
            ids[first],
            ids[last],
            items.len()
        )
        .into_bytes();

        Some(root_id)
    }

    /// Register fonts used across all pages. Each unique (family, weight,
    /// italic) combination gets its own Type1 font object.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        pages: &[LayoutPage],
        font_context: &FontContext,
    ) {
        let mut keys: BTreeSet<FontKey> = BTreeSet::new();
        for page in pages {
            for element in &page.elements {
                if let DrawCommand::Text { font, .. } = element {
                    keys.insert(FontKey::from_spec(font));
                }
            }
        }

        // Always have at least Helvetica
        if keys.is_empty() {
            keys.insert(FontKey::from_spec(&FontSpec::default()));
        }

        for key in keys {
            let std_font = font_context.resolve_key(&key);
            let font_dict = format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                std_font.pdf_name()
            );
            let obj_id = builder.push(font_dict.into_bytes());
            builder.font_objects.push((key, obj_id));
        }
    }

    /// Walk all pages, create XObject PDF objects for each image,
    /// and populate the image_index_map for content stream reference.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for (page_idx, page) in pages.iter().enumerate() {
            for (elem_idx, element) in page.elements.iter().enumerate() {
                if let DrawCommand::Image { image, .. } = element {
                    let img_idx = builder.image_objects.len();
                    let xobj_id = Self::write_image_xobject(builder, image);
                    builder.image_objects.push(xobj_id);
                    builder.image_index_map.insert((page_idx, elem_idx), img_idx);
                }
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space_str = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode \
                     /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                builder.push(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let extra = format!(
                        " /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8",
                        image.width_px, image.height_px
                    );
                    builder.push_stream(&extra, alpha_data)
                });

                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let extra = format!(
                    " /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&extra, rgb)
            }
        }
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(&self, page_idx: usize, builder: &PdfBuilder) -> String {
        let mut entries: Vec<(usize, usize)> = builder
            .image_index_map
            .iter()
            .filter(|((p, _), _)| *p == page_idx)
            .map(|(_, &img_idx)| (img_idx, builder.image_objects[img_idx]))
            .collect();
        entries.sort_unstable();
        entries
            .iter()
            .map(|(img_idx, obj_id)| format!("/Im{} {} 0 R", img_idx, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_font_resource_dict(&self, font_objects: &[(FontKey, usize)]) -> String {
        font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Look up the font index (/F0, /F1, etc.) for a font selection.
    fn font_index(&self, font: &FontSpec, font_objects: &[(FontKey, usize)]) -> usize {
        let key = FontKey::from_spec(font);
        font_objects
            .iter()
            .position(|(k, _)| *k == key)
            .unwrap_or(0)
    }

    /// Encode a string as the body of a WinAnsi PDF literal string,
    /// escaping delimiters and octal-escaping non-ASCII bytes.
    fn encode_text(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for ch in s.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82), // Single low-9 quotation mark
            0x0192 => Some(0x83), // Latin small letter f with hook
            0x201E => Some(0x84), // Double low-9 quotation mark
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86), // Dagger
            0x2021 => Some(0x87), // Double dagger
            0x02C6 => Some(0x88), // Modifier letter circumflex accent
            0x2030 => Some(0x89), // Per mille sign
            0x0160 => Some(0x8A), // Latin capital letter S with caron
            0x2039 => Some(0x8B), // Single left-pointing angle quotation
            0x0152 => Some(0x8C), // Latin capital ligature OE
            0x017D => Some(0x8E), // Latin capital letter Z with caron
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98), // Small tilde
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A), // Latin small letter s with caron
            0x203A => Some(0x9B), // Single right-pointing angle quotation
            0x0153 => Some(0x9C), // Latin small ligature oe
            0x017E => Some(0x9E), // Latin small letter z with caron
            0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, LinkTarget, PdfCanvas};
    use crate::model::PageSize;
    use crate::style::FontFamily;

    fn text_of(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_encode_text_escapes() {
        assert_eq!(PdfWriter::encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::encode_text("back\\slash"), "back\\\\slash");
        assert_eq!(PdfWriter::encode_text("caf\u{e9}"), "caf\\351");
        assert_eq!(PdfWriter::encode_text("\u{2022}"), "\\225");
        assert_eq!(PdfWriter::encode_text("\u{4e2d}"), "?");
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let canvas = PdfCanvas::new(PageSize::A4);
        let bytes = canvas.finish(&Metadata::default());
        assert!(bytes.starts_with(b"%PDF-1.7"));
        let text = text_of(&bytes);
        assert!(text.contains("%%EOF"));
        assert!(text.contains("xref"));
        assert!(text.contains("/Count 1"));
        assert!(!text.contains("/Annots"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let canvas = PdfCanvas::new(PageSize::A4);
        let metadata = Metadata {
            title: Some("Test Document".to_string()),
            author: Some("Folio".to_string()),
            subject: None,
        };
        let text = text_of(&canvas.finish(&metadata));
        assert!(text.contains("/Title (Test Document)"));
        assert!(text.contains("/Author (Folio)"));
    }

    #[test]
    fn test_subject_alone_writes_info_dict() {
        let canvas = PdfCanvas::new(PageSize::A4);
        let metadata = Metadata {
            title: None,
            author: None,
            subject: Some("Release notes".to_string()),
        };
        let text = text_of(&canvas.finish(&metadata));
        assert!(text.contains("/Subject (Release notes)"));
        assert!(text.contains("/Info"));
        assert!(!text.contains("/Title"));
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.set_font(FontSpec::new(FontFamily::Helvetica, 10.0));
        canvas.draw_text("A", 20.0, 20.0);
        canvas.set_font(FontSpec::new(FontFamily::Helvetica, 10.0).bold());
        canvas.draw_text("B", 20.0, 30.0);
        let text = text_of(&canvas.finish(&Metadata::default()));
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
        assert!(text.contains("/Type1"));
    }

    #[test]
    fn test_link_annotations() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.add_page();
        canvas.set_page(0).unwrap();
        let rect = Rect {
            x: 20.0,
            y: 20.0,
            width: 30.0,
            height: 4.0,
        };
        canvas.add_link(
            rect,
            LinkTarget::Uri {
                url: "https://example.com".into(),
            },
        );
        canvas.add_link(rect, LinkTarget::Page { page: 1, y: 40.0 });
        let text = text_of(&canvas.finish(&Metadata::default()));
        assert!(text.contains("/URI (https://example.com)"));
        assert!(text.contains("/Dest ["));
        assert!(text.contains("/XYZ"));
        assert!(text.contains("/Annots"));
    }

    #[test]
    fn test_dangling_page_link_is_skipped() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.add_link(
            Rect {
                x: 0.0,
                y: 0.0,
                width: 1.0,
                height: 1.0,
            },
            LinkTarget::Page { page: 7, y: 0.0 },
        );
        let text = text_of(&canvas.finish(&Metadata::default()));
        assert!(!text.contains("/Annots"));
    }

    #[test]
    fn test_outline_nesting() {
        let mut canvas = PdfCanvas::new(PageSize::A4);
        canvas.add_page();
        let outline = vec![
            OutlineItem {
                title: "One".into(),
                level: 1,
                page: 0,
                y: 20.0,
            },
            OutlineItem {
                title: "One.A".into(),
                level: 2,
                page: 0,
                y: 60.0,
            },
            OutlineItem {
                title: "Two".into(),
                level: 1,
                page: 1,
                y: 20.0,
            },
        ];
        let bytes = PdfWriter::new().write_with_outline(
            canvas.pages(),
            &Metadata::default(),
            &outline,
            &FontContext::new(),
        );
        let text = text_of(&bytes);
        assert!(text.contains("/Type /Outlines"));
        assert!(text.contains("/PageMode /UseOutlines"));
        assert!(text.contains("/Title (One.A)"));
        // "One" has exactly one child.
        assert!(text.contains("/Count 1 >>"));
        assert!(text.contains("/Next"));
        assert!(text.contains("/Prev"));
    }

    #[test]
    fn test_dest_top_is_clamped_to_page() {
        let canvas = PdfCanvas::new(PageSize::A4);
        let page = &canvas.pages()[0];
        assert_eq!(PdfWriter::dest_top(page, 0.0), to_pt(297.0));
        assert!(PdfWriter::dest_top(page, 100.0) < to_pt(297.0));
    }
}
