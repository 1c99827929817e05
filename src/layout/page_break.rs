//! # Page Break Decisions
//!
//! Rows are unbreakable: a row either fits in what is left of the page or
//! moves, whole, to a fresh page.

/// What to do with the next row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakDecision {
    /// Append the row to the current page.
    Place,
    /// Start a new page and append the row there.
    MoveToNextPage,
}

/// Decide where a row of `row_height` goes, given the height already used
/// on the current page and the usable height of a page.
///
/// A row taller than a whole page is placed on the current page when that
/// page is still empty; moving it would only leave a blank page behind.
pub fn decide_break(current_height: f64, row_height: f64, usable_height: f64, page_is_empty: bool) -> BreakDecision {
    if current_height + row_height <= usable_height {
        return BreakDecision::Place;
    }

    if page_is_empty {
        return BreakDecision::Place;
    }

    BreakDecision::MoveToNextPage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits() {
        assert_eq!(decide_break(0.0, 10.0, 277.0, true), BreakDecision::Place);
        assert_eq!(decide_break(260.0, 10.0, 277.0, false), BreakDecision::Place);
    }

    #[test]
    fn test_exact_fit_stays() {
        assert_eq!(decide_break(267.0, 10.0, 277.0, false), BreakDecision::Place);
    }

    #[test]
    fn test_overflow_moves() {
        assert_eq!(
            decide_break(270.0, 10.0, 277.0, false),
            BreakDecision::MoveToNextPage
        );
    }

    #[test]
    fn test_oversized_row_on_empty_page_is_placed() {
        assert_eq!(decide_break(0.0, 500.0, 277.0, true), BreakDecision::Place);
        assert_eq!(
            decide_break(10.0, 500.0, 277.0, false),
            BreakDecision::MoveToNextPage
        );
    }
}
