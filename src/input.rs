//! JSON document input for the CLI and [`crate::render_json`].
//!
//! ```json
//! {
//!   "config": { "page_size": "A4", "worker_pool_size": 4,
//!               "page_number": { "pattern": "{current} / {total}", "place": "South" } },
//!   "pages": [ { "rows": [ { "height": 20, "cols": [ { "span": 12, "components": [] } ] } ] } ],
//!   "rows":  [ { "height": 10, "cols": [] } ]
//! }
//! ```
//!
//! Pre-built `pages` are added first, then `rows` flow after them with the
//! usual page breaks.

use serde::Deserialize;

use crate::config::{ConfigBuilder, Margins, Metadata, PageSize, Place};
use crate::error::GridError;
use crate::layout::grid::SpanOverflow;
use crate::model::{Page, Row};
use crate::{DocumentEngine, Grid};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DocumentInput {
    pub config: ConfigInput,
    pub pages: Vec<Page>,
    pub rows: Vec<Row>,
}

/// Configuration as written in JSON. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigInput {
    /// A table name such as `"A4"` or `"letter"`.
    pub page_size: Option<String>,
    /// Custom `{ "width": .., "height": .. }` in millimetres; wins over `page_size`.
    pub custom_size: Option<CustomSize>,
    pub margins: Option<Margins>,
    pub worker_pool_size: Option<usize>,
    pub debug: bool,
    pub page_number: Option<PageNumberInput>,
    pub span_overflow: Option<SpanOverflow>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CustomSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageNumberInput {
    pub pattern: String,
    #[serde(default)]
    pub place: Place,
}

impl ConfigInput {
    /// Run every option through [`ConfigBuilder`] so JSON input gets the
    /// same validation as code.
    pub fn to_builder(&self) -> Result<ConfigBuilder, GridError> {
        let mut builder = ConfigBuilder::new();
        if let Some(custom) = self.custom_size {
            builder = builder.with_page_size(PageSize::Custom {
                width: custom.width,
                height: custom.height,
            })?;
        } else if let Some(name) = &self.page_size {
            builder = builder.with_page_size_name(name)?;
        }
        if let Some(margins) = self.margins {
            builder = builder.with_margins(margins)?;
        }
        if let Some(size) = self.worker_pool_size {
            builder = builder.with_worker_pool_size(size);
        }
        if let Some(page_number) = &self.page_number {
            builder = builder.with_page_number(&page_number.pattern, page_number.place)?;
        }
        if let Some(policy) = self.span_overflow {
            builder = builder.with_span_overflow(policy);
        }
        Ok(builder
            .with_debug(self.debug)
            .with_metadata(self.metadata.clone()))
    }
}

impl DocumentInput {
    /// Build an engine holding this document, ready to generate.
    pub fn into_engine(self, worker_pool_size: Option<usize>) -> Result<Grid, GridError> {
        let mut builder = self.config.to_builder()?;
        if let Some(size) = worker_pool_size {
            builder = builder.with_worker_pool_size(size);
        }
        let mut grid = Grid::new(builder.build());
        if !self.pages.is_empty() {
            grid.add_pages(self.pages)?;
        }
        if !self.rows.is_empty() {
            grid.add_rows(self.rows)?;
        }
        Ok(grid)
    }
}
