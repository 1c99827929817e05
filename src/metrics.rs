//! Timing wrapper around any [`DocumentEngine`].
//!
//! ```
//! use rowgrid::{DocumentEngine, Grid, MetricsDecorator};
//! use rowgrid::model::Row;
//!
//! let mut engine = MetricsDecorator::new(Grid::default());
//! engine.add_rows(vec![Row::text(10.0, "hello")])?;
//! let document = engine.generate()?;
//! assert!(document.report().operations.iter().any(|op| op.name == "add_rows"));
//! # Ok::<(), rowgrid::GridError>(())
//! ```

use std::cell::RefCell;
use std::time::{Duration, Instant};

use crate::config::Dimensions;
use crate::error::GridError;
use crate::model::{Col, Page, Row};
use crate::report::OperationTiming;
use crate::structure::Node;
use crate::{DocumentEngine, GeneratedDocument};

/// Forwards every call to the wrapped engine and records how long each
/// operation took. Return values pass through untouched, except that a
/// successful `generate` carries the recorded timings in its report.
pub struct MetricsDecorator<E: DocumentEngine> {
    inner: E,
    operations: RefCell<Vec<OperationTiming>>,
}

impl<E: DocumentEngine> MetricsDecorator<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            operations: RefCell::new(Vec::new()),
        }
    }

    /// Timings recorded so far, in order of first use.
    pub fn operations(&self) -> Vec<OperationTiming> {
        self.operations.borrow().clone()
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }

    fn record(&self, name: &str, elapsed: Duration) {
        let mut operations = self.operations.borrow_mut();
        match operations.iter_mut().find(|op| op.name == name) {
            Some(op) => {
                op.calls += 1;
                op.total += elapsed;
            }
            None => operations.push(OperationTiming {
                name: name.to_string(),
                calls: 1,
                total: elapsed,
            }),
        }
    }
}

/// Time `$call` and record it under `$name`.
macro_rules! timed {
    ($self:ident, $name:literal, $call:expr) => {{
        let started = Instant::now();
        let result = $call;
        $self.record($name, started.elapsed());
        result
    }};
}

impl<E: DocumentEngine> DocumentEngine for MetricsDecorator<E> {
    fn add_row(&mut self, height: f64, cols: Vec<Col>) -> Result<(), GridError> {
        timed!(self, "add_row", self.inner.add_row(height, cols))
    }

    fn add_rows(&mut self, rows: Vec<Row>) -> Result<(), GridError> {
        timed!(self, "add_rows", self.inner.add_rows(rows))
    }

    fn add_pages(&mut self, pages: Vec<Page>) -> Result<(), GridError> {
        timed!(self, "add_pages", self.inner.add_pages(pages))
    }

    fn generate(&mut self) -> Result<GeneratedDocument, GridError> {
        let document = timed!(self, "generate", self.inner.generate())?;
        Ok(document.with_operations(self.operations()))
    }

    fn structure(&self) -> Node {
        timed!(self, "structure", self.inner.structure())
    }

    fn current_height(&self) -> f64 {
        timed!(self, "current_height", self.inner.current_height())
    }

    fn dimensions(&self) -> Dimensions {
        timed!(self, "dimensions", self.inner.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Grid;

    #[test]
    fn test_counts_calls_per_operation() {
        let mut engine = MetricsDecorator::new(Grid::default());
        engine.add_row(10.0, vec![Col::full()]).unwrap();
        engine.add_row(10.0, vec![Col::full()]).unwrap();
        assert_eq!(engine.current_height(), 20.0);

        let ops = engine.operations();
        assert_eq!(ops[0].name, "add_row");
        assert_eq!(ops[0].calls, 2);
        assert_eq!(ops[1].name, "current_height");
        assert_eq!(ops[1].calls, 1);
    }

    #[test]
    fn test_errors_pass_through_and_are_timed() {
        let mut engine = MetricsDecorator::new(Grid::default());
        let err = engine.add_row(-1.0, vec![Col::full()]).unwrap_err();
        assert!(matches!(err, GridError::InvalidRow { .. }));
        assert_eq!(engine.operations()[0].calls, 1);
    }

    #[test]
    fn test_same_answers_as_the_bare_engine() {
        let mut bare = Grid::default();
        let mut wrapped = MetricsDecorator::new(Grid::default());
        for _ in 0..30 {
            bare.add_rows(vec![Row::text(10.0, "x")]).unwrap();
            wrapped.add_rows(vec![Row::text(10.0, "x")]).unwrap();
        }
        assert_eq!(bare.current_height(), wrapped.current_height());
        assert_eq!(bare.dimensions(), wrapped.dimensions());
        assert_eq!(bare.structure(), wrapped.structure());
        assert_eq!(bare.generate().unwrap().bytes(), wrapped.generate().unwrap().bytes());
    }

    #[test]
    fn test_report_carries_operations() {
        let mut engine = MetricsDecorator::new(Grid::default());
        engine.add_rows(vec![Row::text(10.0, "x")]).unwrap();
        let document = engine.generate().unwrap();
        let names: Vec<&str> = document
            .report()
            .operations
            .iter()
            .map(|op| op.name.as_str())
            .collect();
        assert_eq!(names, vec!["add_rows", "generate"]);
    }
}
