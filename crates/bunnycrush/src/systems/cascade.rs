use std::collections::VecDeque;

use crate::components::BunnyColor;
use crate::error::GameError;
use crate::grid::Grid;

/// xorshift64 generator behind every new bunny color. A session seeded the
/// same way replays the same boards.
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // xorshift never leaves a zero state
        Rng {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate a random number in [0, upper_bound).
    pub fn next_int(&mut self, upper_bound: u32) -> u32 {
        (self.next_u64() % upper_bound as u64) as u32
    }
}

/// Source of replacement bunnies.
///
/// Colors for slide refills are queued per column when the refill starts, so
/// the renderer can draw the incoming bunnies, and taken exactly once per
/// vacancy when it lands. In-place refills draw straight from `next_color`.
#[derive(Debug, Clone)]
pub struct Spawner {
    rng: Rng,
    pending: Vec<VecDeque<BunnyColor>>,
}

impl Spawner {
    pub fn new(cols: usize, seed: u64) -> Self {
        Spawner {
            rng: Rng::new(seed),
            pending: vec![VecDeque::new(); cols],
        }
    }

    /// A uniformly random palette color.
    pub fn next_color(&mut self) -> BunnyColor {
        BunnyColor::from_index(self.rng.next_int(BunnyColor::ALL.len() as u32))
    }

    /// Give every cell a fresh random color and clear its flags.
    pub fn fill_grid(&mut self, grid: &mut Grid) {
        for cell in grid.cells_mut() {
            cell.clear_flags();
            cell.color = self.next_color();
        }
    }

    /// Queue `count` new bunnies for `col`.
    pub fn queue(&mut self, col: usize, count: usize) {
        for _ in 0..count {
            let color = self.next_color();
            self.pending[col].push_back(color);
        }
    }

    /// Bunnies waiting to enter `col`, first to land first.
    pub fn pending(&self, col: usize) -> &VecDeque<BunnyColor> {
        &self.pending[col]
    }

    pub fn take(&mut self, col: usize) -> Result<BunnyColor, GameError> {
        self.pending[col]
            .pop_front()
            .ok_or(GameError::SpawnQueueEmpty { col })
    }

    /// Fails if any queued bunny was never placed.
    pub fn ensure_drained(&self) -> Result<(), GameError> {
        match self.pending.iter().position(|q| !q.is_empty()) {
            Some(col) => Err(GameError::UnconsumedSpawn {
                col,
                count: self.pending[col].len(),
            }),
            None => Ok(()),
        }
    }

    /// Drop all queued bunnies (restart).
    pub fn clear(&mut self) {
        for q in &mut self.pending {
            q.clear();
        }
    }
}

/// Flag every cell strictly above (row, col) to fall into the gap.
pub fn mark_sliders_above(grid: &mut Grid, row: usize, col: usize) {
    for r in 0..row {
        grid.get_mut(r, col).will_slide = true;
    }
}

/// Close the gap at (row, col): every color above moves down one row and
/// `new_color` enters at the top. Cells below the gap are untouched.
pub fn slide_column_down(grid: &mut Grid, row: usize, col: usize, new_color: BunnyColor) {
    for r in (0..row).rev() {
        grid.copy_color_within_column(col, r, r + 1);
    }
    grid.set_color(0, col, new_color);
    for r in 0..=row {
        let cell = grid.get_mut(r, col);
        cell.will_slide = false;
        cell.popped = false;
    }
}

/// A popped cell takes a new color where it stands.
pub fn refill_in_place(grid: &mut Grid, row: usize, col: usize, color: BunnyColor) {
    grid.set_color(row, col, color);
}

/// Number of popped cells below (row, col): how many rows it falls.
pub fn drop_distance(grid: &Grid, row: usize, col: usize) -> usize {
    (row + 1..grid.rows)
        .filter(|&r| grid.get(r, col).popped)
        .count()
}

/// Gravity-compact one column: surviving colors settle at the bottom in
/// their original order, then the column's queued bunnies fill the top slots,
/// first queued in the lowest slot. Returns the number of vacancies filled.
pub fn collapse_column(grid: &mut Grid, col: usize, spawner: &mut Spawner) -> Result<usize, GameError> {
    let survivors: Vec<BunnyColor> = (0..grid.rows)
        .rev()
        .filter(|&r| !grid.get(r, col).popped)
        .map(|r| grid.color(r, col))
        .collect();

    let vacancies = grid.rows - survivors.len();
    for (i, color) in survivors.into_iter().enumerate() {
        grid.set_color(grid.rows - 1 - i, col, color);
    }
    for row in (0..vacancies).rev() {
        let color = spawner.take(col)?;
        grid.set_color(row, col, color);
    }
    for row in 0..grid.rows {
        let cell = grid.get_mut(row, col);
        cell.popped = false;
        cell.will_slide = false;
        cell.matched = false;
    }
    Ok(vacancies)
}
