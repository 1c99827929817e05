//! # rowgrid
//!
//! A grid-native PDF builder.
//!
//! Documents are stacks of fixed-height rows. Each row is split into twelve
//! equal grid units, and each column claims some of them. Callers append
//! rows one by one (or in batches, or as whole pre-built pages); the engine
//! places each row on the current page and opens a new page the moment a
//! row would cross the bottom margin.
//!
//! Rendering is the only expensive step, so it is the only concurrent one.
//! Rows are independent once their position is known, which lets a worker
//! pool render them in any order while a single thread reassembles them in
//! document order. The bytes come out identical whether one thread did the
//! work or sixteen.
//!
//! ## Architecture
//!
//! ```text
//! Config + rows / pages
//!       ↓
//!   [layout]   Paginator: validation, page breaks, append-only tree
//!       ↓
//!   [render]   Plan units, render blocks on the worker pool
//!       ↓
//!   [pdf]      Ordered assembly into PDF bytes
//!       ↓
//! GeneratedDocument { bytes, report }
//! ```
//!
//! ```
//! use rowgrid::{DocumentEngine, Grid};
//! use rowgrid::config::ConfigBuilder;
//! use rowgrid::model::Row;
//!
//! let config = ConfigBuilder::new().with_worker_pool_size(4).build();
//! let mut grid = Grid::new(config);
//! for i in 0..30 {
//!     grid.add_rows(vec![Row::text(10.0, &format!("row {}", i))])?;
//! }
//! assert_eq!(grid.current_height(), 30.0);
//!
//! let document = grid.generate()?;
//! assert_eq!(document.report().pages, 2);
//! assert!(document.bytes().starts_with(b"%PDF"));
//! # Ok::<(), rowgrid::GridError>(())
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod input;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod pdf;
pub mod render;
pub mod report;
pub mod structure;

use std::path::Path;
use std::sync::Arc;

use log::debug;

pub use config::{Config, ConfigBuilder, Dimensions};
pub use error::{BlockError, GridError};
pub use metrics::MetricsDecorator;
pub use report::Report;
pub use structure::Node;

use layout::Paginator;
use model::{Col, Page, Row};
use pdf::PdfEncoder;
use render::pipeline::Pipeline;
use render::{BlockRenderer, DefaultRenderer};
use report::OperationTiming;

/// Everything a document engine can do. [`Grid`] is the real engine;
/// [`MetricsDecorator`] wraps any implementation.
pub trait DocumentEngine {
    /// Append one row, breaking to a new page if it does not fit.
    fn add_row(&mut self, height: f64, cols: Vec<Col>) -> Result<(), GridError>;

    /// Append rows in order. Nothing is added if any row is invalid.
    fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), GridError>;

    /// Append whole pages as they are, without break checks.
    fn add_pages(&mut self, pages: Vec<Page>) -> Result<(), GridError>;

    /// Render the document. One-shot: afterwards every mutation fails
    /// with [`GridError::DocumentFinalized`].
    fn generate(&mut self) -> Result<GeneratedDocument, GridError>;

    fn structure(&self) -> Node;

    /// Height used on the last page.
    fn current_height(&self) -> f64;

    fn dimensions(&self) -> Dimensions;
}

impl<E: DocumentEngine + ?Sized> DocumentEngine for Box<E> {
    fn add_row(&mut self, height: f64, cols: Vec<Col>) -> Result<(), GridError> {
        (**self).add_row(height, cols)
    }

    fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), GridError> {
        (**self).add_rows(rows)
    }

    fn add_pages(&mut self, pages: Vec<Page>) -> Result<(), GridError> {
        (**self).add_pages(pages)
    }

    fn generate(&mut self) -> Result<GeneratedDocument, GridError> {
        (**self).generate()
    }

    fn structure(&self) -> Node {
        (**self).structure()
    }

    fn current_height(&self) -> f64 {
        (**self).current_height()
    }

    fn dimensions(&self) -> Dimensions {
        (**self).dimensions()
    }
}

/// The grid layout engine.
pub struct Grid {
    config: Config,
    paginator: Paginator,
    renderer: Arc<dyn BlockRenderer>,
}

impl Grid {
    pub fn new(config: Config) -> Self {
        Self {
            paginator: Paginator::new(&config),
            config,
            renderer: Arc::new(DefaultRenderer),
        }
    }

    /// Replace the block renderer used by `generate`.
    pub fn with_renderer(mut self, renderer: Arc<dyn BlockRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn pages(&self) -> &[Page] {
        self.paginator.pages()
    }
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(Config::default())
    }
}

impl DocumentEngine for Grid {
    fn add_row(&mut self, height: f64, cols: Vec<Col>) -> Result<(), GridError> {
        self.paginator.add_row(height, cols)
    }

    fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), GridError> {
        self.paginator.add_rows(rows)
    }

    fn add_pages(&mut self, pages: Vec<Page>) -> Result<(), GridError> {
        self.paginator.add_pages(pages)
    }

    fn generate(&mut self) -> Result<GeneratedDocument, GridError> {
        let pages = self.paginator.finalize()?;
        debug!("document finalized with {} pages", pages.len());
        let encoder = PdfEncoder::new(self.config.metadata.clone());
        let (bytes, report) = Pipeline::new(&self.config, self.renderer.as_ref()).run(pages, encoder)?;
        Ok(GeneratedDocument { bytes, report })
    }

    fn structure(&self) -> Node {
        structure::document_node(&self.config, self.paginator.pages())
    }

    fn current_height(&self) -> f64 {
        self.paginator.current_height()
    }

    fn dimensions(&self) -> Dimensions {
        self.paginator.dimensions()
    }
}

/// The output of a successful `generate`.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    bytes: Vec<u8>,
    report: Report,
}

impl GeneratedDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GridError> {
        let path = path.as_ref();
        std::fs::write(path, &self.bytes).map_err(|source| GridError::IOFailure {
            path: path.to_path_buf(),
            source,
        })
    }

    pub(crate) fn with_operations(mut self, operations: Vec<OperationTiming>) -> Self {
        self.report = self.report.with_operations(operations);
        self
    }
}

/// Build and render a document described as JSON.
///
/// `worker_pool_size` overrides the value in the input when given.
pub fn render_json(json: &str, worker_pool_size: Option<usize>) -> Result<GeneratedDocument, GridError> {
    let input: input::DocumentInput = serde_json::from_str(json)?;
    let mut engine = input.into_engine(worker_pool_size)?;
    engine.generate()
}
