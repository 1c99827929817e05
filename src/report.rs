//! Timing summary returned alongside every generated document.
//!
//! The pipeline fills in page, row and per-unit figures; the metrics
//! decorator adds the per-operation timings it recorded on the way.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::GridError;

/// How long one row took and which worker rendered it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitTiming {
    pub page: usize,
    pub row: usize,
    pub duration: Duration,
    pub worker: usize,
}

/// Aggregated timing of one engine operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationTiming {
    pub name: String,
    pub calls: u64,
    pub total: Duration,
}

impl OperationTiming {
    pub fn average(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            mean(self.total, self.calls)
        }
    }
}

/// `total / count` in whole nanoseconds, without narrowing `count`.
fn mean(total: Duration, count: u64) -> Duration {
    let nanos = total.as_nanos() / count as u128;
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub pages: usize,
    pub rows: usize,
    pub workers: usize,
    pub render_duration: Duration,
    pub total_duration: Duration,
    pub unit_timings: Vec<UnitTiming>,
    /// Rows rendered by each worker, indexed by worker id.
    pub worker_units: Vec<usize>,
    pub operations: Vec<OperationTiming>,
}

impl Report {
    pub fn new(
        pages: usize,
        workers: usize,
        unit_timings: Vec<UnitTiming>,
        render_duration: Duration,
        total_duration: Duration,
    ) -> Self {
        let mut worker_units = vec![0; workers.max(1)];
        for timing in &unit_timings {
            if let Some(count) = worker_units.get_mut(timing.worker) {
                *count += 1;
            }
        }
        Self {
            pages,
            rows: unit_timings.len(),
            workers,
            render_duration,
            total_duration,
            unit_timings,
            worker_units,
            operations: Vec::new(),
        }
    }

    /// Mean time spent rendering one row.
    pub fn average_row_duration(&self) -> Duration {
        if self.unit_timings.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.unit_timings.iter().map(|t| t.duration).sum();
        mean(sum, self.unit_timings.len() as u64)
    }

    pub fn with_operations(mut self, operations: Vec<OperationTiming>) -> Self {
        self.operations = operations;
        self
    }

    /// Write the plain-text summary to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GridError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_string()).map_err(|source| GridError::IOFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pages: {}", self.pages)?;
        writeln!(f, "rows: {}", self.rows)?;
        writeln!(f, "workers: {}", self.workers)?;
        writeln!(
            f,
            "render: {:?} (avg {:?} per row)",
            self.render_duration,
            self.average_row_duration()
        )?;
        writeln!(f, "total: {:?}", self.total_duration)?;
        for (worker, count) in self.worker_units.iter().enumerate() {
            writeln!(f, "worker {}: {} rows", worker, count)?;
        }
        for op in &self.operations {
            writeln!(
                f,
                "{} -> calls: {}, total: {:?}, avg: {:?}",
                op.name,
                op.calls,
                op.total,
                op.average()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(worker: usize, micros: u64) -> UnitTiming {
        UnitTiming {
            page: 1,
            row: 1,
            duration: Duration::from_micros(micros),
            worker,
        }
    }

    #[test]
    fn test_counts_units_per_worker() {
        let report = Report::new(
            1,
            2,
            vec![timing(0, 10), timing(1, 20), timing(1, 30)],
            Duration::from_micros(60),
            Duration::from_micros(90),
        );
        assert_eq!(report.rows, 3);
        assert_eq!(report.worker_units, vec![1, 2]);
        assert_eq!(report.average_row_duration(), Duration::from_micros(20));
    }

    #[test]
    fn test_empty_report_average_is_zero() {
        let report = Report::new(1, 1, vec![], Duration::ZERO, Duration::ZERO);
        assert_eq!(report.average_row_duration(), Duration::ZERO);
    }

    #[test]
    fn test_operation_average_survives_huge_call_counts() {
        let op = OperationTiming {
            name: "current_height".to_string(),
            calls: 1 << 32,
            total: Duration::from_secs(1 << 12),
        };
        assert_eq!(op.average(), Duration::from_nanos(953));

        let op = OperationTiming {
            name: "add_row".to_string(),
            calls: 3,
            total: Duration::from_micros(30),
        };
        assert_eq!(op.average(), Duration::from_micros(10));
    }

    #[test]
    fn test_display_lists_operations() {
        let report = Report::new(2, 1, vec![timing(0, 5)], Duration::ZERO, Duration::ZERO)
            .with_operations(vec![OperationTiming {
                name: "add_row".to_string(),
                calls: 4,
                total: Duration::from_micros(8),
            }]);
        let text = report.to_string();
        assert!(text.contains("pages: 2"));
        assert!(text.contains("rows: 1"));
        assert!(text.contains("add_row -> calls: 4"));
        assert!(text.contains("avg: 2µs"));
    }
}
