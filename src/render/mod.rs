//! # Block Rendering
//!
//! Turns content blocks into encoder-agnostic [`Fragment`]s: flat lists of
//! drawing operations in absolute page coordinates (millimetres, origin at
//! the top-left corner). Fragments are plain data, so render workers can
//! build them in parallel and hand them to the single thread that feeds the
//! encoder.
//!
//! [`BlockRenderer`] is the seam for custom content. [`DefaultRenderer`]
//! draws every built-in [`Component`] variant.

pub mod barcode;
pub mod pipeline;

use crate::error::BlockError;
use crate::font;
use crate::image_loader::{self, LoadedImage};
use crate::model::{Align, Color, Component, FontStyle, LineProps, RectProps, SignatureProps, TextProps};

/// Points to millimetres.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// An absolute rectangle on the page, in millimetres from the top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// One drawing operation.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// A single line of text; `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        /// Font size in points.
        size: f64,
        style: FontStyle,
        color: Color,
        content: String,
    },
    Rect {
        rect: Rect,
        fill: Option<Color>,
        stroke: Option<Color>,
        line_width: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        color: Color,
        width: f64,
    },
    Image {
        rect: Rect,
        image: LoadedImage,
    },
}

/// The rendered output of one block (or one row, once merged).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub ops: Vec<DrawOp>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn append(&mut self, other: Fragment) {
        self.ops.extend(other.ops);
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Renders one content block into its resolved rectangle.
///
/// Called from render workers, possibly for several blocks at once.
/// [`Component::Rows`] never reaches a renderer: nested rows are laid out
/// by the pipeline and their own blocks are rendered individually.
pub trait BlockRenderer: Send + Sync {
    fn render_block(&self, block: &Component, rect: Rect) -> Result<Fragment, BlockError>;
}

/// Built-in renderer for every [`Component`] variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRenderer;

impl BlockRenderer for DefaultRenderer {
    fn render_block(&self, block: &Component, rect: Rect) -> Result<Fragment, BlockError> {
        match block {
            Component::Text { content, props } => render_text(content, props, rect),
            Component::Image { src, props } => {
                let image = image_loader::load_image(src)?;
                let target = fit_rect(rect, image.aspect(), props)?;
                Ok(Fragment {
                    ops: vec![DrawOp::Image {
                        rect: target,
                        image,
                    }],
                })
            }
            Component::Barcode { code, props } => render_barcode(code, props, rect),
            Component::QrCode { code, props } => render_qr_code(code, props, rect),
            Component::Signature { label, props } => render_signature(label, props, rect),
            Component::Line { props } => render_line(props, rect),
            // Laid out by the pipeline.
            Component::Rows { .. } => Ok(Fragment::new()),
        }
    }
}

fn render_text(content: &str, props: &TextProps, rect: Rect) -> Result<Fragment, BlockError> {
    if !props.size.is_finite() || props.size <= 0.0 {
        return Err(BlockError::InvalidProps(format!(
            "text size must be positive, got {}",
            props.size
        )));
    }
    check_finite("text top", props.top)?;
    check_finite("text left", props.left)?;
    check_finite("text right", props.right)?;
    check_color("text color", &props.color)?;

    let size_mm = props.size * PT_TO_MM;
    let left = rect.x + props.left;
    let right = rect.x + rect.width - props.right;
    let mut fragment = Fragment::new();

    for (i, line) in content.lines().enumerate() {
        let width = font::measure(line, props.style, props.size) * PT_TO_MM;
        let x = match props.align {
            Align::Left => left,
            Align::Center => left + ((right - left) - width) / 2.0,
            Align::Right => right - width,
        };
        let y = rect.y + props.top + size_mm * font::ASCENT + i as f64 * size_mm * LINE_SPACING;
        fragment.push(DrawOp::Text {
            x,
            y,
            size: props.size,
            style: props.style,
            color: props.color,
            content: line.to_string(),
        });
    }
    Ok(fragment)
}

const LINE_SPACING: f64 = 1.2;

fn check_finite(what: &str, value: f64) -> Result<(), BlockError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(BlockError::InvalidProps(format!("{} must be finite, got {}", what, value)))
    }
}

fn check_thickness(what: &str, value: f64) -> Result<(), BlockError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(BlockError::InvalidProps(format!("{} must be non-negative, got {}", what, value)))
    }
}

fn check_color(what: &str, color: &Color) -> Result<(), BlockError> {
    if color.is_valid() {
        Ok(())
    } else {
        Err(BlockError::InvalidProps(format!(
            "{} components must be in 0..=1, got ({}, {}, {})",
            what, color.r, color.g, color.b
        )))
    }
}

/// Place content of the given aspect ratio (width / height) in a cell.
pub fn fit_rect(cell: Rect, aspect: f64, props: &RectProps) -> Result<Rect, BlockError> {
    if !(props.percent > 0.0 && props.percent <= 100.0) {
        return Err(BlockError::InvalidProps(format!(
            "percent must be in (0, 100], got {}",
            props.percent
        )));
    }
    if !aspect.is_finite() || aspect <= 0.0 {
        return Err(BlockError::InvalidProps(format!("invalid aspect ratio {}", aspect)));
    }
    check_finite("left offset", props.left)?;
    check_finite("top offset", props.top)?;

    let scale = props.percent / 100.0;
    let max_w = cell.width * scale;
    let max_h = cell.height * scale;
    let (width, height) = if max_w / aspect <= max_h {
        (max_w, max_w / aspect)
    } else {
        (max_h * aspect, max_h)
    };

    let (x, y) = if props.center {
        (
            cell.x + (cell.width - width) / 2.0,
            cell.y + (cell.height - height) / 2.0,
        )
    } else {
        (cell.x + props.left, cell.y + props.top)
    };
    Ok(Rect::new(x, y, width, height))
}

/// Width-to-height ratio of a rendered barcode.
const BARCODE_ASPECT: f64 = 5.0;

fn render_barcode(code: &str, props: &RectProps, rect: Rect) -> Result<Fragment, BlockError> {
    let modules = barcode::encode(code)?;
    let target = fit_rect(rect, BARCODE_ASPECT, props)?;
    let module_w = target.width / modules.len() as f64;

    let mut fragment = Fragment::new();
    for (start, len) in dark_runs(&modules) {
        fragment.push(DrawOp::Rect {
            rect: Rect::new(
                target.x + start as f64 * module_w,
                target.y,
                len as f64 * module_w,
                target.height,
            ),
            fill: Some(Color::BLACK),
            stroke: None,
            line_width: 0.0,
        });
    }
    Ok(fragment)
}

fn render_qr_code(code: &str, props: &RectProps, rect: Rect) -> Result<Fragment, BlockError> {
    let qr = qrcode::QrCode::new(code.as_bytes()).map_err(|e| BlockError::QrCode(e.to_string()))?;
    let n = qr.width();
    let colors = qr.to_colors();
    let target = fit_rect(rect, 1.0, props)?;
    let module = target.width / n as f64;

    let mut fragment = Fragment::new();
    for (row_idx, row) in colors.chunks(n).enumerate() {
        let dark: Vec<bool> = row.iter().map(|c| *c == qrcode::Color::Dark).collect();
        for (start, len) in dark_runs(&dark) {
            fragment.push(DrawOp::Rect {
                rect: Rect::new(
                    target.x + start as f64 * module,
                    target.y + row_idx as f64 * module,
                    len as f64 * module,
                    module,
                ),
                fill: Some(Color::BLACK),
                stroke: None,
                line_width: 0.0,
            });
        }
    }
    Ok(fragment)
}

/// `(start, length)` of each run of `true`.
fn dark_runs(modules: &[bool]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut start = None;
    for (i, &dark) in modules.iter().enumerate() {
        match (dark, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                runs.push((s, i - s));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        runs.push((s, modules.len() - s));
    }
    runs
}

fn render_signature(label: &str, props: &SignatureProps, rect: Rect) -> Result<Fragment, BlockError> {
    if !props.font_size.is_finite() || props.font_size <= 0.0 {
        return Err(BlockError::InvalidProps(format!(
            "signature font size must be positive, got {}",
            props.font_size
        )));
    }
    check_thickness("signature line thickness", props.line_thickness)?;
    check_color("signature font color", &props.font_color)?;
    check_color("signature line color", &props.line_color)?;
    let size_mm = props.font_size * PT_TO_MM;
    let line_y = rect.y + rect.height - size_mm * 1.5;
    let inset = rect.width * 0.1;

    let mut fragment = Fragment::new();
    fragment.push(DrawOp::Line {
        x1: rect.x + inset,
        y1: line_y,
        x2: rect.x + rect.width - inset,
        y2: line_y,
        color: props.line_color,
        width: props.line_thickness,
    });

    let label_width = font::measure(label, props.font_style, props.font_size) * PT_TO_MM;
    fragment.push(DrawOp::Text {
        x: rect.x + (rect.width - label_width) / 2.0,
        y: line_y + size_mm * LINE_SPACING,
        size: props.font_size,
        style: props.font_style,
        color: props.font_color,
        content: label.to_string(),
    });
    Ok(fragment)
}

fn render_line(props: &LineProps, rect: Rect) -> Result<Fragment, BlockError> {
    if !(0.0..=100.0).contains(&props.offset_percent) || !(props.size_percent > 0.0 && props.size_percent <= 100.0) {
        return Err(BlockError::InvalidProps(format!(
            "line offset {} / size {} out of range",
            props.offset_percent, props.size_percent
        )));
    }
    check_thickness("line thickness", props.thickness)?;
    check_color("line color", &props.color)?;
    let length = rect.width * props.size_percent / 100.0;
    let x1 = rect.x + (rect.width - length) / 2.0;
    let y = rect.y + rect.height * props.offset_percent / 100.0;
    Ok(Fragment {
        ops: vec![DrawOp::Line {
            x1,
            y1: y,
            x2: x1 + length,
            y2: y,
            color: props.color,
            width: props.thickness,
        }],
    })
}
