//! Screen layout and vote-list column splitting
//!
//! The screen is a header row (summary, prevote gauge, precommit gauge) over
//! up to three vote columns. Large validator sets are split so no column
//! grows past a readable height.

use crate::cosmos::VoteState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Up to this many votes fit in a single column
const SINGLE_COLUMN_MAX: usize = 50;
/// Up to this many votes are shown in two columns of `SINGLE_COLUMN_MAX`
const DOUBLE_COLUMN_MAX: usize = 100;
pub const MAX_COLUMNS: usize = 3;

/// Votes grouped into display columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteColumns {
    pub buckets: Vec<Vec<VoteState>>,
    pub column_count: usize,
    pub rows_per_column: usize,
}

impl VoteColumns {
    pub fn total(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }
}

/// Fewer than 50 votes use one column, fewer than 100 use two columns of
/// up to 50, anything larger three columns of `ceil(n/3)` with the last
/// column taking what remains.
pub fn split_for_display(votes: Vec<VoteState>) -> VoteColumns {
    let n = votes.len();
    let per_column = if n < SINGLE_COLUMN_MAX {
        n.max(1)
    } else if n < DOUBLE_COLUMN_MAX {
        SINGLE_COLUMN_MAX
    } else {
        n.div_ceil(MAX_COLUMNS)
    };

    let mut buckets: Vec<Vec<VoteState>> = Vec::with_capacity(MAX_COLUMNS);
    let mut rest = votes.into_iter().peekable();
    while rest.peek().is_some() {
        buckets.push(rest.by_ref().take(per_column).collect());
    }
    if buckets.is_empty() {
        buckets.push(Vec::new());
    }

    VoteColumns {
        column_count: buckets.len(),
        rows_per_column: buckets[0].len(),
        buckets,
    }
}

/// Header and body areas
pub fn dashboard_layout(area: Rect) -> (Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(10), Constraint::Percentage(90)])
        .split(area);
    (rows[0], rows[1])
}

/// Summary, prevote gauge and precommit gauge side by side
pub fn header_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area)
        .to_vec()
}

/// Vote columns; the last one is wider since it holds the tail of the set
pub fn columns_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(9, 30),
            Constraint::Ratio(9, 30),
            Constraint::Ratio(12, 30),
        ])
        .split(area)
        .to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn votes(n: usize) -> Vec<VoteState> {
        (0..n)
            .map(|i| VoteState {
                description: format!("{}", i + 1),
                voted: true,
                voted_zero_block: false,
                committed: false,
            })
            .collect()
    }

    fn sizes(columns: &VoteColumns) -> Vec<usize> {
        columns.buckets.iter().map(Vec::len).collect()
    }

    #[test]
    fn test_split_sizes() {
        assert_eq!(sizes(&split_for_display(votes(30))), vec![30]);
        assert_eq!(sizes(&split_for_display(votes(49))), vec![49]);
        assert_eq!(sizes(&split_for_display(votes(50))), vec![50]);
        assert_eq!(sizes(&split_for_display(votes(75))), vec![50, 25]);
        assert_eq!(sizes(&split_for_display(votes(99))), vec![50, 49]);
        assert_eq!(sizes(&split_for_display(votes(100))), vec![34, 34, 32]);
        assert_eq!(sizes(&split_for_display(votes(150))), vec![50, 50, 50]);
        assert_eq!(sizes(&split_for_display(votes(151))), vec![51, 51, 49]);
    }

    #[test]
    fn test_split_preserves_order_and_count() {
        for n in [0, 1, 30, 75, 150, 151, 300] {
            let columns = split_for_display(votes(n));
            assert_eq!(columns.total(), n);
            assert_eq!(columns.column_count, columns.buckets.len());
            assert!(columns.column_count <= MAX_COLUMNS);

            let flat: Vec<_> = columns.buckets.into_iter().flatten().collect();
            assert_eq!(flat, votes(n));
        }
    }

    #[test]
    fn test_split_rows_per_column() {
        let columns = split_for_display(votes(151));
        assert_eq!(columns.column_count, 3);
        assert_eq!(columns.rows_per_column, 51);

        let empty = split_for_display(Vec::new());
        assert_eq!(empty.column_count, 1);
        assert_eq!(empty.rows_per_column, 0);
    }

    #[test]
    fn test_layout_fills_area() {
        let area = Rect::new(0, 0, 120, 40);
        let (header, body) = dashboard_layout(area);
        assert_eq!(header.height + body.height, 40);
        assert_eq!(header_layout(header).len(), 3);
        let columns = columns_layout(body);
        assert_eq!(columns.iter().map(|r| r.width).sum::<u16>(), 120);
    }
}
