//! # Configuration
//!
//! Immutable settings for one engine instance, assembled by
//! [`ConfigBuilder`]. Every `with_*` call validates its own input, so a
//! bad option fails where it is written rather than at `build()`.
//!
//! ```
//! use rowgrid::config::{ConfigBuilder, PageSize, Place};
//!
//! let config = ConfigBuilder::new()
//!     .with_page_size(PageSize::Letter)?
//!     .with_worker_pool_size(4)
//!     .with_page_number("{current} / {total}", Place::South)?
//!     .build();
//! assert_eq!(config.worker_pool_size, 4);
//! # Ok::<(), rowgrid::GridError>(())
//! ```

pub mod page_size;

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::layout::grid::SpanOverflow;

pub use page_size::{Dimensions, PageSize};

/// Page margins in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Margins {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl Default for Margins {
    fn default() -> Self {
        Margins::uniform(DEFAULT_MARGIN)
    }
}

const DEFAULT_MARGIN: f64 = 10.0;

/// Where the page number is drawn: the top or bottom margin band,
/// left-aligned, centred or right-aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Place {
    North,
    NorthEast,
    NorthWest,
    #[default]
    South,
    SouthEast,
    SouthWest,
}

impl Place {
    pub fn is_top(&self) -> bool {
        matches!(self, Place::North | Place::NorthEast | Place::NorthWest)
    }
}

/// Page numbering template. `{current}` and `{total}` are replaced per page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNumber {
    pub pattern: String,
    pub place: Place,
    #[serde(default = "default_page_number_size")]
    pub size: f64,
}

fn default_page_number_size() -> f64 {
    10.0
}

impl PageNumber {
    /// Expand the template for one page.
    pub fn render(&self, current: usize, total: usize) -> String {
        self.pattern
            .replace("{current}", &current.to_string())
            .replace("{total}", &total.to_string())
    }
}

/// Document metadata embedded in the PDF Info dictionary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.creator.is_none()
    }
}

/// Settings consumed by the paginator, the render pipeline and the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub page_size: PageSize,
    pub dimensions: Dimensions,
    pub margins: Margins,
    /// Number of render workers. 0 and 1 both render on the calling thread.
    pub worker_pool_size: usize,
    /// Draw row and column outlines over the content.
    pub debug: bool,
    pub page_number: Option<PageNumber>,
    pub span_overflow: SpanOverflow,
    pub metadata: Metadata,
}

impl Config {
    /// Content height available to rows on one page.
    pub fn usable_height(&self) -> f64 {
        self.dimensions.height - self.margins.vertical()
    }

    /// Content width shared by the twelve grid units.
    pub fn usable_width(&self) -> f64 {
        self.dimensions.width - self.margins.horizontal()
    }

    pub fn is_sequential(&self) -> bool {
        self.worker_pool_size <= 1
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Accumulates options and produces an immutable [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    page_size: PageSize,
    margins: Margins,
    worker_pool_size: usize,
    debug: bool,
    page_number: Option<PageNumber>,
    span_overflow: SpanOverflow,
    metadata: Metadata,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            page_size: PageSize::default(),
            margins: Margins::default(),
            worker_pool_size: 0,
            debug: false,
            page_number: None,
            span_overflow: SpanOverflow::default(),
            metadata: Metadata::default(),
        }
    }

    pub fn with_page_size(mut self, size: PageSize) -> Result<Self, GridError> {
        let dims = size.dimensions();
        if !(dims.width.is_finite() && dims.height.is_finite())
            || dims.width <= 0.0
            || dims.height <= 0.0
        {
            return Err(GridError::InvalidConfig(format!(
                "page dimensions must be positive, got {}x{}",
                dims.width, dims.height
            )));
        }
        check_usable_area(dims, &self.margins)?;
        self.page_size = size;
        Ok(self)
    }

    /// Select a page size by its table name (`"A4"`, `"letter"`, ...).
    pub fn with_page_size_name(self, name: &str) -> Result<Self, GridError> {
        let size = page_size::lookup(name)?;
        self.with_page_size(size)
    }

    pub fn with_margins(mut self, margins: Margins) -> Result<Self, GridError> {
        let values = [margins.top, margins.right, margins.bottom, margins.left];
        if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(GridError::InvalidConfig(format!(
                "margins must be non-negative, got {:?}",
                margins
            )));
        }
        check_usable_area(self.page_size.dimensions(), &margins)?;
        self.margins = margins;
        Ok(self)
    }

    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_page_number(mut self, pattern: &str, place: Place) -> Result<Self, GridError> {
        if !pattern.contains("{current}") && !pattern.contains("{total}") {
            return Err(GridError::InvalidConfig(format!(
                "page number pattern {:?} has no {{current}} or {{total}} placeholder",
                pattern
            )));
        }
        self.page_number = Some(PageNumber {
            pattern: pattern.to_string(),
            place,
            size: default_page_number_size(),
        });
        Ok(self)
    }

    pub fn with_span_overflow(mut self, policy: SpanOverflow) -> Self {
        self.span_overflow = policy;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn build(self) -> Config {
        Config {
            page_size: self.page_size,
            dimensions: self.page_size.dimensions(),
            margins: self.margins,
            worker_pool_size: self.worker_pool_size,
            debug: self.debug,
            page_number: self.page_number,
            span_overflow: self.span_overflow,
            metadata: self.metadata,
        }
    }
}

fn check_usable_area(dims: Dimensions, margins: &Margins) -> Result<(), GridError> {
    if dims.width - margins.horizontal() <= 0.0 || dims.height - margins.vertical() <= 0.0 {
        return Err(GridError::InvalidConfig(format!(
            "margins {:?} leave no usable area on a {}x{} page",
            margins, dims.width, dims.height
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigBuilder::new().build();
        assert_eq!(config.page_size, PageSize::A4);
        assert_eq!(config.dimensions, Dimensions::new(210.0, 297.0));
        assert_eq!(config.margins, Margins::uniform(10.0));
        assert_eq!(config.worker_pool_size, 0);
        assert!(!config.debug);
        assert!(config.page_number.is_none());
        assert_eq!(config.span_overflow, SpanOverflow::ClipLast);
        assert!((config.usable_height() - 277.0).abs() < 1e-9);
        assert!((config.usable_width() - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_margin_rejected() {
        let result = ConfigBuilder::new().with_margins(Margins::new(10.0, -1.0, 10.0, 10.0));
        assert!(matches!(result, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn test_margins_consuming_page_rejected() {
        let result = ConfigBuilder::new().with_margins(Margins::uniform(150.0));
        assert!(matches!(result, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn test_custom_page_size_validated() {
        let bad = ConfigBuilder::new().with_page_size(PageSize::Custom {
            width: 0.0,
            height: 100.0,
        });
        assert!(matches!(bad, Err(GridError::InvalidConfig(_))));

        let good = ConfigBuilder::new()
            .with_page_size(PageSize::Custom {
                width: 100.0,
                height: 80.0,
            })
            .unwrap()
            .build();
        assert_eq!(good.dimensions, Dimensions::new(100.0, 80.0));
    }

    #[test]
    fn test_page_size_by_name() {
        let config = ConfigBuilder::new()
            .with_page_size_name("A1")
            .unwrap()
            .build();
        assert_eq!(config.dimensions, Dimensions::new(594.0, 841.0));

        let err = ConfigBuilder::new().with_page_size_name("Quarto").unwrap_err();
        assert!(matches!(err, GridError::UnknownPageSize(_)));
    }

    #[test]
    fn test_page_number_pattern() {
        let config = ConfigBuilder::new()
            .with_page_number("{current} / {total}", Place::South)
            .unwrap()
            .build();
        let pn = config.page_number.unwrap();
        assert_eq!(pn.render(2, 3), "2 / 3");

        let err = ConfigBuilder::new().with_page_number("Page", Place::North);
        assert!(matches!(err, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn test_pool_size_zero_and_one_are_sequential() {
        assert!(ConfigBuilder::new().with_worker_pool_size(0).build().is_sequential());
        assert!(ConfigBuilder::new().with_worker_pool_size(1).build().is_sequential());
        assert!(!ConfigBuilder::new().with_worker_pool_size(7).build().is_sequential());
    }
}
