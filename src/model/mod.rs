//! # Document Model
//!
//! The input representation for the engine: pages hold rows, rows hold
//! columns sized in grid units, columns hold content blocks
//! ([`Component`]). Everything here is plain owned data; positions are
//! computed later by the layout and render stages.
//!
//! Rows are built with small consuming builders:
//!
//! ```
//! use rowgrid::model::{Col, Component, Row};
//!
//! let row = Row::new(20.0)
//!     .add(Col::new(4).add(Component::text("Name")))
//!     .add(Col::new(8).add(Component::text("Widget Industries")));
//! assert_eq!(row.cols.len(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::config::Dimensions;
use crate::layout::grid::GRID_SIZE;

/// One page of rows.
///
/// `index` and `dimensions` are assigned by the engine when the page enters
/// a document; a freshly built page has neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub rows: Vec<Row>,
    #[serde(skip)]
    pub(crate) index: usize,
    #[serde(skip)]
    pub(crate) dimensions: Option<Dimensions>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, row: Row) -> Self {
        self.rows.push(row);
        self
    }

    pub fn add_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    /// 1-based position in the document, or 0 before the page is added.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.dimensions
    }

    /// Sum of the row heights on this page.
    pub fn height(&self) -> f64 {
        self.rows.iter().map(|r| r.height).sum()
    }
}

/// A horizontal band of fixed height, divided into columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Height in millimetres.
    pub height: f64,
    #[serde(default)]
    pub cols: Vec<Col>,
}

impl Row {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            cols: Vec::new(),
        }
    }

    pub fn add(mut self, col: Col) -> Self {
        self.cols.push(col);
        self
    }

    pub fn add_cols(mut self, cols: impl IntoIterator<Item = Col>) -> Self {
        self.cols.extend(cols);
        self
    }

    /// A full-width row holding a single text block.
    pub fn text(height: f64, content: &str) -> Self {
        Row::new(height).add(Col::full().add(Component::text(content)))
    }
}

/// A column spanning `span` of the twelve grid units of its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Col {
    pub span: u8,
    #[serde(default)]
    pub components: Vec<Component>,
}

impl Col {
    pub fn new(span: u8) -> Self {
        Self {
            span,
            components: Vec::new(),
        }
    }

    /// A column covering the whole row.
    pub fn full() -> Self {
        Col::new(GRID_SIZE)
    }

    pub fn add(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }
}

/// A content block. Each variant carries its own property payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Component {
    Text {
        content: String,
        #[serde(default)]
        props: TextProps,
    },
    /// Base64 data, a `data:image/...` URI, or a file path (JPEG or PNG).
    Image {
        src: String,
        #[serde(default)]
        props: RectProps,
    },
    /// Code 128 barcode.
    Barcode {
        code: String,
        #[serde(default)]
        props: RectProps,
    },
    QrCode {
        code: String,
        #[serde(default)]
        props: RectProps,
    },
    /// A signature line with a caption underneath.
    Signature {
        label: String,
        #[serde(default)]
        props: SignatureProps,
    },
    /// A horizontal rule.
    Line {
        #[serde(default)]
        props: LineProps,
    },
    /// Nested rows laid out inside the column's rectangle.
    Rows { rows: Vec<Row> },
}

impl Component {
    pub fn text(content: &str) -> Self {
        Component::Text {
            content: content.to_string(),
            props: TextProps::default(),
        }
    }

    pub fn text_with(content: &str, props: TextProps) -> Self {
        Component::Text {
            content: content.to_string(),
            props,
        }
    }

    pub fn image(src: &str) -> Self {
        Component::Image {
            src: src.to_string(),
            props: RectProps::default(),
        }
    }

    pub fn barcode(code: &str) -> Self {
        Component::Barcode {
            code: code.to_string(),
            props: RectProps::default(),
        }
    }

    pub fn qr_code(code: &str) -> Self {
        Component::QrCode {
            code: code.to_string(),
            props: RectProps::default(),
        }
    }

    pub fn signature(label: &str) -> Self {
        Component::Signature {
            label: label.to_string(),
            props: SignatureProps::default(),
        }
    }

    pub fn line() -> Self {
        Component::Line {
            props: LineProps::default(),
        }
    }

    pub fn rows(rows: Vec<Row>) -> Self {
        Component::Rows { rows }
    }

    /// Short lowercase name used in structure snapshots and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Component::Text { .. } => "text",
            Component::Image { .. } => "image",
            Component::Barcode { .. } => "barcode",
            Component::QrCode { .. } => "qrcode",
            Component::Signature { .. } => "signature",
            Component::Line { .. } => "line",
            Component::Rows { .. } => "rows",
        }
    }
}

/// RGB colour, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const GREY: Color = Color {
        r: 0.6,
        g: 0.6,
        b: 0.6,
    };
    pub const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
    pub const BLUE: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 1.0,
    };

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }

    /// Every component is a finite value in `0.0..=1.0`.
    pub fn is_valid(&self) -> bool {
        [self.r, self.g, self.b]
            .iter()
            .all(|c| (0.0..=1.0).contains(c))
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

/// Text block properties. Offsets are millimetres inside the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextProps {
    /// Font size in points.
    pub size: f64,
    pub style: FontStyle,
    pub align: Align,
    pub color: Color,
    pub top: f64,
    pub left: f64,
    pub right: f64,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            size: 10.0,
            style: FontStyle::Normal,
            align: Align::Left,
            color: Color::BLACK,
            top: 0.0,
            left: 0.0,
            right: 0.0,
        }
    }
}

/// Placement of rectangular content (images, codes) inside the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectProps {
    /// Share of the cell used by the content, 1..=100.
    pub percent: f64,
    /// Centre in the cell; otherwise `left`/`top` offsets apply.
    pub center: bool,
    pub left: f64,
    pub top: f64,
}

impl Default for RectProps {
    fn default() -> Self {
        Self {
            percent: 100.0,
            center: true,
            left: 0.0,
            top: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureProps {
    pub font_size: f64,
    pub font_style: FontStyle,
    pub font_color: Color,
    pub line_color: Color,
    /// Line thickness in millimetres.
    pub line_thickness: f64,
}

impl Default for SignatureProps {
    fn default() -> Self {
        Self {
            font_size: 8.0,
            font_style: FontStyle::Bold,
            font_color: Color::BLACK,
            line_color: Color::BLACK,
            line_thickness: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineProps {
    pub color: Color,
    /// Thickness in millimetres.
    pub thickness: f64,
    /// Vertical position inside the cell, 0 (top) to 100 (bottom).
    pub offset_percent: f64,
    /// Length relative to the cell width, 1..=100, centred.
    pub size_percent: f64,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            thickness: 0.2,
            offset_percent: 50.0,
            size_percent: 90.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_validity() {
        assert!(Color::rgb(255, 128, 0).is_valid());
        assert!(!Color { r: f64::NAN, g: 0.0, b: 0.0 }.is_valid());
        assert!(!Color { r: 0.0, g: -0.1, b: 0.0 }.is_valid());
        assert!(!Color { r: 0.0, g: 0.0, b: 1.5 }.is_valid());
    }

    #[test]
    fn test_row_builder() {
        let row = Row::new(10.0).add(Col::new(6)).add(Col::new(6));
        assert_eq!(row.height, 10.0);
        assert_eq!(row.cols.len(), 2);
    }

    #[test]
    fn test_text_row_is_full_width() {
        let row = Row::text(30.0, "page1 row1");
        assert_eq!(row.cols.len(), 1);
        assert_eq!(row.cols[0].span, 12);
        assert_eq!(row.cols[0].components, vec![Component::text("page1 row1")]);
    }

    #[test]
    fn test_page_height_sums_rows() {
        let page = Page::new()
            .add(Row::new(20.0))
            .add_rows(vec![Row::new(5.0), Row::new(7.5)]);
        assert!((page.height() - 32.5).abs() < 1e-9);
        assert_eq!(page.index(), 0);
        assert!(page.dimensions().is_none());
    }

    #[test]
    fn test_component_json_is_tagged() {
        let json = r#"{ "type": "Text", "content": "hello" }"#;
        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component, Component::text("hello"));

        let json = r#"{ "type": "Line" }"#;
        let component: Component = serde_json::from_str(json).unwrap();
        assert_eq!(component.kind_name(), "line");
    }

    #[test]
    fn test_color_from_bytes() {
        let c = Color::rgb(255, 0, 51);
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 0.2).abs() < 1e-9);
    }
}
