//! # Twelve-Unit Grid
//!
//! Turns a row's column spans into absolute horizontal boxes. Usable width
//! (page width minus left and right margins) is split into [`GRID_SIZE`]
//! equal units; each column takes `span` units, placed left to right from
//! the left margin.
//!
//! [`resolve`] never shrinks anything. Rows whose spans add up to more than
//! twelve are handled beforehand by [`apply_span_policy`].

use serde::{Deserialize, Serialize};

/// Number of units in one row.
pub const GRID_SIZE: u8 = 12;

/// What to do with a row whose spans add up to more than [`GRID_SIZE`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanOverflow {
    /// Clip the column that crosses the edge to the remaining units.
    /// Columns after it get zero width.
    #[default]
    ClipLast,
    /// Refuse the row when it is added.
    Reject,
}

/// Resolved horizontal placement of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnBox {
    pub x: f64,
    pub width: f64,
}

/// Resolve spans to absolute boxes, in declaration order.
///
/// Each width is `usable_width * span / 12`; offsets accumulate from
/// `left_margin`. The arithmetic is the same for every call, so identical
/// input always yields bit-identical output.
pub fn resolve(spans: &[u8], page_width: f64, left_margin: f64, right_margin: f64) -> Vec<ColumnBox> {
    let usable_width = page_width - left_margin - right_margin;
    let unit = usable_width / GRID_SIZE as f64;

    let mut boxes = Vec::with_capacity(spans.len());
    let mut consumed_units: u32 = 0;
    for &span in spans {
        // Offsets are computed from the unit count, not by summing widths,
        // so no rounding error accumulates across columns.
        let x = left_margin + unit * consumed_units as f64;
        let width = unit * span as f64;
        boxes.push(ColumnBox { x, width });
        consumed_units += span as u32;
    }
    boxes
}

/// Effective spans for a row under the given overflow policy.
///
/// Under [`SpanOverflow::Reject`] rows are validated when added, so this
/// returns the spans unchanged; under [`SpanOverflow::ClipLast`] the first
/// column crossing twelve is cut to what remains, and every later column
/// gets zero.
pub fn apply_span_policy(spans: &[u8], policy: SpanOverflow) -> Vec<u8> {
    match policy {
        SpanOverflow::Reject => spans.to_vec(),
        SpanOverflow::ClipLast => {
            let mut remaining = GRID_SIZE;
            spans
                .iter()
                .map(|&span| {
                    let used = span.min(remaining);
                    remaining -= used;
                    used
                })
                .collect()
        }
    }
}

/// Sum of spans, widened so overflow can be detected.
pub fn span_total(spans: &[u8]) -> u32 {
    spans.iter().map(|&s| s as u32).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_row_covers_usable_width() {
        let boxes = resolve(&[12], 210.0, 10.0, 10.0);
        assert_eq!(boxes.len(), 1);
        assert!((boxes[0].x - 10.0).abs() < 1e-9);
        assert!((boxes[0].width - 190.0).abs() < 1e-9);
    }

    #[test]
    fn test_spans_summing_to_twelve_are_contiguous() {
        let spans = [3, 2, 4, 1, 2];
        let boxes = resolve(&spans, 210.0, 10.0, 15.0);
        let usable = 210.0 - 10.0 - 15.0;

        let total: f64 = boxes.iter().map(|b| b.width).sum();
        assert!((total - usable).abs() < 1e-9);

        for pair in boxes.windows(2) {
            assert!(pair[1].x > pair[0].x);
            assert!((pair[0].x + pair[0].width - pair[1].x).abs() < 1e-9);
        }
        let last = boxes.last().unwrap();
        assert!((last.x + last.width - (210.0 - 15.0)).abs() < 1e-9);
    }

    #[test]
    fn test_partial_row_leaves_space_on_the_right() {
        let boxes = resolve(&[4, 4], 130.0, 5.0, 5.0);
        assert!((boxes[0].width - 40.0).abs() < 1e-9);
        assert!((boxes[1].x - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_resolve_is_bit_identical() {
        let a = resolve(&[5, 7], 215.9, 12.7, 12.7);
        let b = resolve(&[5, 7], 215.9, 12.7, 12.7);
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.x.to_bits(), y.x.to_bits());
            assert_eq!(x.width.to_bits(), y.width.to_bits());
        }
    }

    #[test]
    fn test_resolve_does_not_shrink() {
        let boxes = resolve(&[8, 8], 130.0, 5.0, 5.0);
        assert!((boxes[1].x - 85.0).abs() < 1e-9);
        assert!((boxes[1].width - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_clip_last() {
        assert_eq!(apply_span_policy(&[8, 8], SpanOverflow::ClipLast), vec![8, 4]);
        assert_eq!(
            apply_span_policy(&[6, 6, 3], SpanOverflow::ClipLast),
            vec![6, 6, 0]
        );
        assert_eq!(
            apply_span_policy(&[4, 10, 2], SpanOverflow::ClipLast),
            vec![4, 8, 0]
        );
        assert_eq!(apply_span_policy(&[3, 3], SpanOverflow::ClipLast), vec![3, 3]);
    }

    #[test]
    fn test_reject_policy_leaves_spans() {
        assert_eq!(apply_span_policy(&[8, 8], SpanOverflow::Reject), vec![8, 8]);
    }

    #[test]
    fn test_span_total_does_not_wrap() {
        assert_eq!(span_total(&[200, 200]), 400);
    }
}
