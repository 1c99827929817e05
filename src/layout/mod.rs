//! # Pagination
//!
//! The build-phase half of the engine. [`Paginator`] owns the document tree
//! while rows and pages are appended, one call at a time, and decides page
//! breaks as it goes:
//!
//! 1. The first row lazily opens page 1.
//! 2. Before each row, ask: does `current height + row height` still fit in
//!    the usable height (page height minus top and bottom margins)?
//! 3. If it fits, append it. If not, open a new page and append it there.
//!
//! Pre-built pages skip the check entirely and are taken as they are.
//!
//! The tree is append-only. Once [`Paginator::finalize`] has run, every
//! further mutation fails with [`GridError::DocumentFinalized`].

pub mod grid;
pub mod page_break;

use log::debug;

use crate::config::{Config, Dimensions};
use crate::error::GridError;
use crate::model::{Col, Component, Page, Row};
use grid::{SpanOverflow, GRID_SIZE};
use page_break::{decide_break, BreakDecision};

/// Lifecycle of the document held by a [`Paginator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Empty,
    Building,
    Finalized,
}

/// Incremental document builder with automatic page breaks.
#[derive(Debug, Clone)]
pub struct Paginator {
    dimensions: Dimensions,
    usable_height: f64,
    span_overflow: SpanOverflow,
    pages: Vec<Page>,
    state: DocumentState,
}

impl Paginator {
    pub fn new(config: &Config) -> Self {
        Self {
            dimensions: config.dimensions,
            usable_height: config.usable_height(),
            span_overflow: config.span_overflow,
            pages: Vec::new(),
            state: DocumentState::Empty,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Append one row built from `height` and `cols`.
    pub fn add_row(&mut self, height: f64, cols: Vec<Col>) -> Result<(), GridError> {
        self.ensure_open()?;
        let row = Row { height, cols };
        validate_row(&row, self.span_overflow)?;
        self.place_row(row);
        Ok(())
    }

    /// Append pre-built rows in order, each with its own break check.
    ///
    /// All rows are validated before any is placed, so a bad row leaves
    /// the document untouched.
    pub fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), GridError> {
        self.ensure_open()?;
        for row in &rows {
            validate_row(row, self.span_overflow)?;
        }
        for row in rows {
            self.place_row(row);
        }
        Ok(())
    }

    /// Append pre-built pages without any break check.
    ///
    /// A page whose rows overflow the usable height is kept as it is.
    pub fn add_pages(&mut self, pages: Vec<Page>) -> Result<(), GridError> {
        self.ensure_open()?;
        for page in &pages {
            for row in &page.rows {
                validate_row(row, self.span_overflow)?;
            }
        }
        for page in pages {
            let height = page.height();
            if height > self.usable_height {
                debug!(
                    "accepting pre-built page with {:.2}mm of rows (usable {:.2}mm)",
                    height, self.usable_height
                );
            }
            self.push_page(page);
        }
        Ok(())
    }

    /// Sum of the row heights on the last page; 0 for an empty document.
    pub fn current_height(&self) -> f64 {
        self.pages.last().map(Page::height).unwrap_or(0.0)
    }

    /// Freeze the document. Fails if it was already frozen.
    pub fn finalize(&mut self) -> Result<&[Page], GridError> {
        self.ensure_open()?;
        self.state = DocumentState::Finalized;
        Ok(&self.pages)
    }

    fn ensure_open(&self) -> Result<(), GridError> {
        if self.state == DocumentState::Finalized {
            return Err(GridError::DocumentFinalized);
        }
        Ok(())
    }

    fn place_row(&mut self, row: Row) {
        if self.pages.is_empty() {
            self.push_page(Page::new());
        }

        let current = self.current_height();
        let page_is_empty = self.pages.last().map(|p| p.rows.is_empty()).unwrap_or(true);
        if decide_break(current, row.height, self.usable_height, page_is_empty)
            == BreakDecision::MoveToNextPage
        {
            debug!(
                "page {} full at {:.2}mm, row of {:.2}mm opens page {}",
                self.pages.len(),
                current,
                row.height,
                self.pages.len() + 1
            );
            self.push_page(Page::new());
        }

        if let Some(page) = self.pages.last_mut() {
            page.rows.push(row);
        }
    }

    fn push_page(&mut self, mut page: Page) {
        page.index = self.pages.len() + 1;
        page.dimensions = Some(self.dimensions);
        self.pages.push(page);
        self.state = DocumentState::Building;
    }
}

/// Check a row (and any nested rows) before it enters the document.
pub fn validate_row(row: &Row, policy: SpanOverflow) -> Result<(), GridError> {
    if !row.height.is_finite() || row.height <= 0.0 {
        return Err(GridError::invalid_row(format!(
            "row height must be positive, got {}",
            row.height
        )));
    }

    for (i, col) in row.cols.iter().enumerate() {
        if col.span == 0 {
            return Err(GridError::invalid_row(format!(
                "column {} has a span of 0",
                i + 1
            )));
        }
        for component in &col.components {
            if let Component::Rows { rows } = component {
                for nested in rows {
                    validate_row(nested, policy)?;
                }
            }
        }
    }

    if policy == SpanOverflow::Reject {
        let spans: Vec<u8> = row.cols.iter().map(|c| c.span).collect();
        let total = grid::span_total(&spans);
        if total > GRID_SIZE as u32 {
            return Err(GridError::invalid_row(format!(
                "column spans add up to {}, more than {}",
                total, GRID_SIZE
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;

    fn paginator() -> Paginator {
        Paginator::new(&ConfigBuilder::new().build())
    }

    #[test]
    fn test_first_row_opens_page() {
        let mut p = paginator();
        assert_eq!(p.state(), DocumentState::Empty);
        p.add_row(10.0, vec![Col::new(12)]).unwrap();
        assert_eq!(p.state(), DocumentState::Building);
        assert_eq!(p.pages().len(), 1);
        assert_eq!(p.pages()[0].index(), 1);
        assert_eq!(p.pages()[0].dimensions(), Some(Dimensions::new(210.0, 297.0)));
    }

    #[test]
    fn test_break_moves_row_to_new_page() {
        let mut p = paginator();
        for _ in 0..28 {
            p.add_row(10.0, vec![Col::new(12)]).unwrap();
        }
        assert_eq!(p.pages().len(), 2);
        assert_eq!(p.pages()[0].rows.len(), 27);
        assert_eq!(p.pages()[1].rows.len(), 1);
        assert_eq!(p.pages()[1].index(), 2);
        assert!((p.current_height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_height_rejected() {
        let mut p = paginator();
        assert!(matches!(
            p.add_row(0.0, vec![Col::new(12)]),
            Err(GridError::InvalidRow { .. })
        ));
        assert!(matches!(
            p.add_row(-5.0, vec![Col::new(12)]),
            Err(GridError::InvalidRow { .. })
        ));
        assert!(matches!(
            p.add_row(f64::NAN, vec![Col::new(12)]),
            Err(GridError::InvalidRow { .. })
        ));
        assert_eq!(p.state(), DocumentState::Empty);
    }

    #[test]
    fn test_zero_span_rejected() {
        let mut p = paginator();
        let err = p.add_row(10.0, vec![Col::new(6), Col::new(0)]).unwrap_err();
        assert!(err.to_string().contains("column 2"));
    }

    #[test]
    fn test_nested_rows_validated() {
        let mut p = paginator();
        let bad = Col::full().add(Component::rows(vec![Row::new(0.0)]));
        assert!(p.add_row(10.0, vec![bad]).is_err());
    }

    #[test]
    fn test_add_rows_is_all_or_nothing() {
        let mut p = paginator();
        let rows = vec![Row::new(10.0).add(Col::new(12)), Row::new(-1.0)];
        assert!(p.add_rows(rows).is_err());
        assert!(p.pages().is_empty());
    }

    #[test]
    fn test_overflowing_spans_under_policies() {
        let mut clip = paginator();
        clip.add_row(10.0, vec![Col::new(8), Col::new(8)]).unwrap();
        assert_eq!(clip.pages()[0].rows[0].cols[1].span, 8);

        let config = ConfigBuilder::new()
            .with_span_overflow(SpanOverflow::Reject)
            .build();
        let mut reject = Paginator::new(&config);
        assert!(matches!(
            reject.add_row(10.0, vec![Col::new(8), Col::new(8)]),
            Err(GridError::InvalidRow { .. })
        ));
    }

    #[test]
    fn test_add_pages_skips_break_check() {
        let mut p = paginator();
        let rows: Vec<Row> = (0..15).map(|_| Row::new(20.0).add(Col::new(12))).collect();
        p.add_pages(vec![Page::new().add_rows(rows)]).unwrap();
        assert_eq!(p.pages().len(), 1);
        assert_eq!(p.pages()[0].rows.len(), 15);
        assert!((p.current_height() - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_row_after_full_prebuilt_page_breaks() {
        let mut p = paginator();
        let rows: Vec<Row> = (0..15).map(|_| Row::new(20.0).add(Col::new(12))).collect();
        p.add_pages(vec![Page::new().add_rows(rows)]).unwrap();
        p.add_row(10.0, vec![Col::new(12)]).unwrap();
        assert_eq!(p.pages().len(), 2);
        assert!((p.current_height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_finalize_is_one_shot() {
        let mut p = paginator();
        p.add_row(10.0, vec![Col::new(12)]).unwrap();
        p.finalize().unwrap();
        assert_eq!(p.state(), DocumentState::Finalized);
        assert!(matches!(
            p.add_row(10.0, vec![Col::new(12)]),
            Err(GridError::DocumentFinalized)
        ));
        assert!(matches!(p.add_rows(vec![]), Err(GridError::DocumentFinalized)));
        assert!(matches!(p.add_pages(vec![]), Err(GridError::DocumentFinalized)));
        assert!(matches!(p.finalize(), Err(GridError::DocumentFinalized)));
    }
}
