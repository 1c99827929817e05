//! # PDF Serializer
//!
//! Turns the ordered stream of rendered fragments into a PDF 1.7 file.
//!
//! This is a from-scratch writer. We write the raw bytes ourselves because
//! the subset a grid document needs (four standard fonts, filled and stroked
//! paths, images) is small, and owning the byte layout is what makes the
//! output deterministic: no timestamps, no random IDs, and objects numbered
//! in the order fragments arrive.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, pages
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Document coordinates are millimetres from the top-left corner; PDF user
//! space is points from the bottom-left. The conversion happens here and
//! nowhere else.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::config::{Dimensions, Metadata};
use crate::error::GridError;
use crate::font;
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};
use crate::model::Color;
use crate::render::{DrawOp, Fragment};

/// Millimetres to PDF points.
pub const MM_TO_PT: f64 = 72.0 / 25.4;

/// Consumes pages in order. Only the assembling thread talks to an encoder.
pub trait Encoder {
    fn begin_page(&mut self, dimensions: Dimensions) -> Result<(), GridError>;

    fn draw_fragment(&mut self, fragment: &Fragment) -> Result<(), GridError>;

    fn end_page(&mut self) -> Result<(), GridError>;

    /// Produce the output bytes. Consumes the encoder.
    fn finalize(self) -> Result<Vec<u8>, GridError>
    where
        Self: Sized;
}

struct PdfObject {
    data: Vec<u8>,
}

/// The page currently being written.
struct OpenPage {
    dimensions: Dimensions,
    stream: String,
    /// `(resource index, object id)` of every image drawn on this page.
    images: Vec<(usize, usize)>,
}

/// Incremental PDF writer.
///
/// Object IDs are reserved up front for the catalog (1), the page tree (2)
/// and the four Helvetica faces (3..=6); everything else is appended as it
/// is produced.
pub struct PdfEncoder {
    objects: Vec<PdfObject>,
    page_obj_ids: Vec<usize>,
    image_count: usize,
    current: Option<OpenPage>,
    metadata: Metadata,
}

const FIRST_FONT_OBJ: usize = 3;

impl PdfEncoder {
    pub fn new(metadata: Metadata) -> Self {
        // 0 = placeholder (PDF objects are 1-indexed)
        let mut objects: Vec<PdfObject> = (0..FIRST_FONT_OBJ).map(|_| PdfObject { data: vec![] }).collect();
        for style in font::ALL_STYLES {
            objects.push(PdfObject {
                data: format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font::base_font(style)
                )
                .into_bytes(),
            });
        }
        Self {
            objects,
            page_obj_ids: Vec::new(),
            image_count: 0,
            current: None,
            metadata,
        }
    }

    fn open_page(&mut self) -> Result<&mut OpenPage, GridError> {
        self.current
            .as_mut()
            .ok_or_else(|| GridError::Encode("draw outside of a page".to_string()))
    }

    fn write_op(&mut self, op: &DrawOp) -> Result<(), GridError> {
        // No objects are written without an open page.
        self.open_page()?;
        if let DrawOp::Image { rect, image } = op {
            let obj_id = self.write_image_xobject(image);
            let img_idx = self.image_count;
            self.image_count += 1;
            let page = self.open_page()?;
            page.images.push((img_idx, obj_id));
            let page_height = page.dimensions.height;
            let _ = write!(
                page.stream,
                "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                rect.width * MM_TO_PT,
                rect.height * MM_TO_PT,
                rect.x * MM_TO_PT,
                (page_height - rect.y - rect.height) * MM_TO_PT,
                img_idx
            );
            return Ok(());
        }

        let page = self.open_page()?;
        let page_height = page.dimensions.height;
        let stream = &mut page.stream;
        match op {
            DrawOp::Text {
                x,
                y,
                size,
                style,
                color,
                content,
            } => {
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                    color.r,
                    color.g,
                    color.b,
                    font::resource_name(*style),
                    size,
                    x * MM_TO_PT,
                    (page_height - y) * MM_TO_PT,
                    encode_text(content)
                );
            }
            DrawOp::Rect {
                rect,
                fill,
                stroke,
                line_width,
            } => {
                let x = rect.x * MM_TO_PT;
                let y = (page_height - rect.y - rect.height) * MM_TO_PT;
                let w = rect.width * MM_TO_PT;
                let h = rect.height * MM_TO_PT;
                if let Some(bg) = fill {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        bg.r, bg.g, bg.b, x, y, w, h
                    );
                }
                if let Some(bc) = stroke {
                    let _ = write!(
                        stream,
                        "q\n{} {:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        stroke_color(bc),
                        line_width * MM_TO_PT,
                        x,
                        y,
                        w,
                        h
                    );
                }
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                width,
            } => {
                let _ = write!(
                    stream,
                    "q\n{} {:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                    stroke_color(color),
                    width * MM_TO_PT,
                    x1 * MM_TO_PT,
                    (page_height - y1) * MM_TO_PT,
                    x2 * MM_TO_PT,
                    (page_height - y2) * MM_TO_PT
                );
            }
            DrawOp::Image { .. } => {}
        }
        Ok(())
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(&mut self, image: &LoadedImage) -> usize {
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
                     /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    color_space_str,
                    data.len()
                );
                obj_data.extend_from_slice(data);
                obj_data.extend_from_slice(b"\nendstream");
                self.push_object(obj_data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // SMask first, so the image can reference it
                let smask_id = alpha.as_ref().map(|alpha_data| {
                    let compressed_alpha = compress_to_vec_zlib(alpha_data, 6);
                    let mut smask_data: Vec<u8> = Vec::new();
                    let _ = write!(
                        smask_data,
                        "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                        image.width_px,
                        image.height_px,
                        compressed_alpha.len()
                    );
                    smask_data.extend_from_slice(&compressed_alpha);
                    smask_data.extend_from_slice(b"\nendstream");
                    self.push_object(smask_data)
                });

                let compressed_rgb = compress_to_vec_zlib(rgb, 6);
                let smask_ref = smask_id
                    .map(|id| format!(" /SMask {} 0 R", id))
                    .unwrap_or_default();
                let mut obj_data: Vec<u8> = Vec::new();
                let _ = write!(
                    obj_data,
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {}{} >>\nstream\n",
                    image.width_px,
                    image.height_px,
                    compressed_rgb.len(),
                    smask_ref
                );
                obj_data.extend_from_slice(&compressed_rgb);
                obj_data.extend_from_slice(b"\nendstream");
                self.push_object(obj_data)
            }
        }
    }

    fn push_object(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn font_resource_dict() -> String {
        font::ALL_STYLES
            .iter()
            .enumerate()
            .map(|(i, style)| format!("/{} {} 0 R", font::resource_name(*style), FIRST_FONT_OBJ + i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn info_dict(&self) -> Option<String> {
        if self.metadata.is_empty() {
            return None;
        }
        let mut info = String::from("<< ");
        let fields = [
            ("Title", &self.metadata.title),
            ("Author", &self.metadata.author),
            ("Subject", &self.metadata.subject),
            ("Creator", &self.metadata.creator),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", key, encode_text(value));
            }
        }
        info.push_str("/Producer (rowgrid) >>");
        Some(info)
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; self.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in self.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", self.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", self.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}

impl Encoder for PdfEncoder {
    fn begin_page(&mut self, dimensions: Dimensions) -> Result<(), GridError> {
        if self.current.is_some() {
            return Err(GridError::Encode("previous page was not ended".to_string()));
        }
        self.current = Some(OpenPage {
            dimensions,
            stream: String::new(),
            images: Vec::new(),
        });
        Ok(())
    }

    fn draw_fragment(&mut self, fragment: &Fragment) -> Result<(), GridError> {
        for op in &fragment.ops {
            self.write_op(op)?;
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), GridError> {
        let page = self
            .current
            .take()
            .ok_or_else(|| GridError::Encode("end_page without begin_page".to_string()))?;

        let compressed = compress_to_vec_zlib(page.stream.as_bytes(), 6);
        let mut content_data: Vec<u8> = Vec::new();
        let _ = write!(
            content_data,
            "<< /Length {} /Filter /FlateDecode >>\nstream\n",
            compressed.len()
        );
        content_data.extend_from_slice(&compressed);
        content_data.extend_from_slice(b"\nendstream");
        let content_obj_id = self.push_object(content_data);

        let font_resources = Self::font_resource_dict();
        let resources = if page.images.is_empty() {
            format!("/Font << {} >>", font_resources)
        } else {
            let xobjects = page
                .images
                .iter()
                .map(|(idx, obj_id)| format!("/Im{} {} 0 R", idx, obj_id))
                .collect::<Vec<_>>()
                .join(" ");
            format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
        };
        let page_dict = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Contents {} 0 R /Resources << {} >> >>",
            page.dimensions.width * MM_TO_PT,
            page.dimensions.height * MM_TO_PT,
            content_obj_id,
            resources
        );
        let page_obj_id = self.push_object(page_dict.into_bytes());
        self.page_obj_ids.push(page_obj_id);
        Ok(())
    }

    fn finalize(mut self) -> Result<Vec<u8>, GridError> {
        if self.current.is_some() {
            return Err(GridError::Encode("last page was not ended".to_string()));
        }

        self.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = self
            .page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            self.page_obj_ids.len()
        )
        .into_bytes();

        let info_obj_id = self.info_dict().map(|info| self.push_object(info.into_bytes()));

        Ok(self.serialize(info_obj_id))
    }
}

fn stroke_color(c: &Color) -> String {
    format!("{:.3} {:.3} {:.3} RG", c.r, c.g, c.b)
}

/// Encode text as the body of a PDF literal string in WinAnsiEncoding.
fn encode_text(s: &str) -> String {
    let mut text_str = String::with_capacity(s.len());
    for ch in s.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => text_str.push_str("\\\\"),
            b'(' => text_str.push_str("\\("),
            b')' => text_str.push_str("\\)"),
            0x20..=0x7E => text_str.push(b as char),
            // Octal escape outside the printable range
            _ => {
                let _ = write!(text_str, "\\{:03o}", b);
            }
        }
    }
    text_str
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// Codepoints in 0x20..=0x7E and 0xA0..=0xFF map directly; 0x80..=0x9F hold
/// the Windows-1252 punctuation.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82),
        0x0192 => Some(0x83),
        0x201E => Some(0x84),
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86),
        0x2021 => Some(0x87),
        0x02C6 => Some(0x88),
        0x2030 => Some(0x89),
        0x0160 => Some(0x8A),
        0x2039 => Some(0x8B),
        0x0152 => Some(0x8C),
        0x017D => Some(0x8E),
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98),
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A),
        0x203A => Some(0x9B),
        0x0153 => Some(0x9C),
        0x017E => Some(0x9E),
        0x0178 => Some(0x9F),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FontStyle;
    use crate::render::Rect;

    fn a4() -> Dimensions {
        Dimensions::new(210.0, 297.0)
    }

    fn one_page(fragment: Fragment, metadata: Metadata) -> Vec<u8> {
        let mut encoder = PdfEncoder::new(metadata);
        encoder.begin_page(a4()).unwrap();
        encoder.draw_fragment(&fragment).unwrap();
        encoder.end_page().unwrap();
        encoder.finalize().unwrap()
    }

    fn contains(bytes: &[u8], needle: &str) -> bool {
        bytes.windows(needle.len()).any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_encode_text_escapes() {
        assert_eq!(encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(encode_text("back\\slash"), "back\\\\slash");
        assert_eq!(encode_text("caf\u{e9}"), "caf\\351");
        assert_eq!(encode_text("\u{4e2d}"), "?");
    }

    #[test]
    fn test_blank_page_produces_valid_pdf() {
        let bytes = one_page(Fragment::new(), Metadata::default());
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(contains(&bytes, "%%EOF"));
        assert!(contains(&bytes, "xref"));
        assert!(contains(&bytes, "/Count 1"));
        assert!(contains(&bytes, "/MediaBox [0 0 595.28 841.89]"));
        assert!(!contains(&bytes, "/Info"));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Invoice".to_string()),
            author: Some("Accounts".to_string()),
            ..Default::default()
        };
        let bytes = one_page(Fragment::new(), metadata);
        assert!(contains(&bytes, "/Title (Invoice)"));
        assert!(contains(&bytes, "/Author (Accounts)"));
        assert!(contains(&bytes, "/Info"));
    }

    #[test]
    fn test_standard_fonts_registered() {
        let bytes = one_page(Fragment::new(), Metadata::default());
        assert!(contains(&bytes, "/BaseFont /Helvetica "));
        assert!(contains(&bytes, "/BaseFont /Helvetica-Bold "));
        assert!(contains(&bytes, "/F4 6 0 R"));
    }

    #[test]
    fn test_image_resource_on_its_page() {
        let image = LoadedImage {
            pixel_data: ImagePixelData::Decoded {
                rgb: vec![255, 0, 0],
                alpha: Some(vec![128]),
            },
            width_px: 1,
            height_px: 1,
        };
        let fragment = Fragment {
            ops: vec![DrawOp::Image {
                rect: Rect::new(10.0, 10.0, 20.0, 20.0),
                image,
            }],
        };
        let bytes = one_page(fragment, Metadata::default());
        assert!(contains(&bytes, "/XObject << /Im0 "));
        assert!(contains(&bytes, "/SMask"));
    }

    #[test]
    fn test_same_input_same_bytes() {
        let fragment = Fragment {
            ops: vec![DrawOp::Text {
                x: 10.0,
                y: 20.0,
                size: 10.0,
                style: FontStyle::Bold,
                color: Color::BLACK,
                content: "repeatable".to_string(),
            }],
        };
        let a = one_page(fragment.clone(), Metadata::default());
        let b = one_page(fragment, Metadata::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_draw_outside_page_is_an_error() {
        let mut encoder = PdfEncoder::new(Metadata::default());
        let fragment = Fragment {
            ops: vec![DrawOp::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 1.0,
                y2: 1.0,
                color: Color::BLACK,
                width: 0.2,
            }],
        };
        assert!(matches!(
            encoder.draw_fragment(&fragment),
            Err(GridError::Encode(_))
        ));
        assert!(matches!(encoder.end_page(), Err(GridError::Encode(_))));
    }

    #[test]
    fn test_image_outside_page_writes_no_object() {
        let mut encoder = PdfEncoder::new(Metadata::default());
        let objects_before = encoder.objects.len();
        let fragment = Fragment {
            ops: vec![DrawOp::Image {
                rect: Rect::new(10.0, 10.0, 20.0, 20.0),
                image: LoadedImage {
                    pixel_data: ImagePixelData::Decoded {
                        rgb: vec![0, 0, 255],
                        alpha: None,
                    },
                    width_px: 1,
                    height_px: 1,
                },
            }],
        };
        assert!(matches!(
            encoder.draw_fragment(&fragment),
            Err(GridError::Encode(_))
        ));
        assert_eq!(encoder.objects.len(), objects_before);
        assert_eq!(encoder.image_count, 0);
    }
}
