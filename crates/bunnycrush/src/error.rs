use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("invalid {rows}x{cols} grid: both sides must be non-zero and the cell count must fit in usize")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A vacancy needed a replacement color but none was queued for its column.
    #[error("no queued bunny for column {col}")]
    SpawnQueueEmpty { col: usize },

    /// Colors were queued for a refill that finished without using them.
    #[error("{count} queued bunnies left unused in column {col}")]
    UnconsumedSpawn { col: usize, count: usize },
}
