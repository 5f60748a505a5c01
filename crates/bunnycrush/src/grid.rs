use crate::components::BunnyColor;
use crate::error::GameError;

/// One board position: its bunny color plus the transient animation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub color: BunnyColor,
    /// Removed; waiting for a refill.
    pub popped: bool,
    /// Part of a run of three or more.
    pub matched: bool,
    /// The cell the player clicked.
    pub pressed: bool,
    /// Falling toward a vacancy below it.
    pub will_slide: bool,
}

impl Cell {
    pub fn new(color: BunnyColor) -> Self {
        Cell {
            color,
            popped: false,
            matched: false,
            pressed: false,
            will_slide: false,
        }
    }

    pub fn clear_flags(&mut self) {
        self.popped = false;
        self.matched = false;
        self.pressed = false;
        self.will_slide = false;
    }
}

/// The board. Row-major: `cells[row * cols + col]`, row 0 is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid filled with one color. `rows * cols` must not overflow;
    /// `GameConfig::validate` checks that before a session builds one.
    pub fn filled(rows: usize, cols: usize, color: BunnyColor) -> Self {
        Grid {
            rows,
            cols,
            cells: vec![Cell::new(color); rows * cols],
        }
    }

    /// Build from rows of colors, top row first. Every row must have the
    /// same length.
    pub fn from_colors(rows: &[&[BunnyColor]]) -> Result<Self, GameError> {
        let cols = rows.first().map_or(0, |r| r.len());
        if rows.is_empty() || cols == 0 || rows.iter().any(|r| r.len() != cols) {
            return Err(GameError::InvalidDimensions {
                rows: rows.len(),
                cols,
            });
        }
        let cells = rows
            .iter()
            .flat_map(|r| r.iter().copied().map(Cell::new))
            .collect();
        Ok(Grid {
            rows: rows.len(),
            cols,
            cells,
        })
    }

    #[inline]
    fn idx(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn check_bounds(&self, row: usize, col: usize) -> Result<(), GameError> {
        if self.in_bounds(row, col) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Panics when out of bounds; callers validate coordinates first.
    pub fn get(&self, row: usize, col: usize) -> &Cell {
        &self.cells[self.idx(row, col)]
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut Cell {
        let i = self.idx(row, col);
        &mut self.cells[i]
    }

    pub fn color(&self, row: usize, col: usize) -> BunnyColor {
        self.get(row, col).color
    }

    pub fn set_color(&mut self, row: usize, col: usize, color: BunnyColor) {
        self.get_mut(row, col).color = color;
    }

    /// Copy a color from one row to another within the same column.
    pub fn copy_color_within_column(&mut self, col: usize, from_row: usize, to_row: usize) {
        let color = self.color(from_row, col);
        self.set_color(to_row, col, color);
    }

    /// Iterate `(row, col, &cell)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &Cell)> {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }

    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Colors of one column, top to bottom.
    pub fn column_colors(&self, col: usize) -> Vec<BunnyColor> {
        (0..self.rows).map(|row| self.color(row, col)).collect()
    }

    /// Reset the flags the idle phase owns. `pressed` is left alone.
    pub fn clear_transient_flags(&mut self) {
        for cell in &mut self.cells {
            cell.popped = false;
            cell.will_slide = false;
            cell.matched = false;
        }
    }

    pub fn count_where(&self, pred: impl Fn(&Cell) -> bool) -> usize {
        self.cells.iter().filter(|c| pred(c)).count()
    }
}
