use crate::components::ScoreMode;
use crate::grid::Grid;

/// Shortest run that counts as a match.
pub const MIN_RUN: usize = 3;

/// Result of one detection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchReport {
    /// Cells newly marked in this pass, in the order they were marked.
    pub matched: Vec<(usize, usize)>,
    /// Points to add to the score.
    pub score_delta: usize,
    /// Matched cells per column; the number of bunnies each column must refill.
    pub to_drop: Vec<usize>,
}

impl MatchReport {
    pub fn is_empty(&self) -> bool {
        self.matched.is_empty()
    }
}

/// Length of the same-color run starting at (row, col) and stepping by
/// (d_row, d_col). Always at least 1.
fn run_length(grid: &Grid, row: usize, col: usize, d_row: usize, d_col: usize) -> usize {
    let color = grid.color(row, col);
    let mut len = 1;
    loop {
        let r = row + d_row * len;
        let c = col + d_col * len;
        if !grid.in_bounds(r, c) || grid.color(r, c) != color {
            return len;
        }
        len += 1;
    }
}

/// Scan the whole grid for runs of `MIN_RUN` or more equal colors along
/// columns (downward) and rows (rightward), set `matched` on their cells and
/// report what was found.
///
/// Each run is measured from its first cell, so every maximal run is marked
/// whole even when some of its cells were already claimed by a crossing run.
pub fn detect_matches(grid: &mut Grid, mode: ScoreMode) -> MatchReport {
    let mut report = MatchReport {
        to_drop: vec![0; grid.cols],
        ..MatchReport::default()
    };

    for row in 0..grid.rows {
        for col in 0..grid.cols {
            let color = grid.color(row, col);

            let starts_column_run = row == 0 || grid.color(row - 1, col) != color;
            if starts_column_run {
                let vertical = run_length(grid, row, col, 1, 0);
                if vertical >= MIN_RUN {
                    for r in row..row + vertical {
                        mark(grid, r, col, mode, &mut report);
                    }
                }
            }

            let starts_row_run = col == 0 || grid.color(row, col - 1) != color;
            if starts_row_run {
                let horizontal = run_length(grid, row, col, 0, 1);
                if horizontal >= MIN_RUN {
                    for c in col..col + horizontal {
                        mark(grid, row, c, mode, &mut report);
                    }
                }
            }
        }
    }

    for (_, col, cell) in grid.iter() {
        if cell.matched {
            report.to_drop[col] += 1;
        }
    }

    if !report.is_empty() {
        log::debug!(
            "matched {} cells, +{} score, drops {:?}",
            report.matched.len(),
            report.score_delta,
            report.to_drop
        );
    }
    report
}

fn mark(grid: &mut Grid, row: usize, col: usize, mode: ScoreMode, report: &mut MatchReport) {
    let cell = grid.get_mut(row, col);
    let fresh = !cell.matched;
    cell.matched = true;
    if fresh {
        report.matched.push((row, col));
    }
    match mode {
        ScoreMode::PerRunMembership => report.score_delta += 1,
        ScoreMode::PerCell if fresh => report.score_delta += 1,
        ScoreMode::PerCell => {}
    }
}
