use glam::Vec3;

use crate::error::GameError;

/// The five bunny colors. Replacement cells are drawn uniformly from these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BunnyColor {
    Cyan = 0,
    Orange = 1,
    Blue = 2,
    Red = 3,
    Purple = 4,
}

impl BunnyColor {
    pub const ALL: [BunnyColor; 5] = [
        Self::Cyan,
        Self::Orange,
        Self::Blue,
        Self::Red,
        Self::Purple,
    ];

    pub fn from_index(index: u32) -> Self {
        Self::ALL[index as usize % Self::ALL.len()]
    }

    /// Diffuse color handed to the shader.
    pub fn rgb(self) -> Vec3 {
        match self {
            Self::Cyan => Vec3::new(0.0, 0.8, 0.8),
            Self::Orange => Vec3::new(1.0, 0.5, 0.0),
            Self::Blue => Vec3::new(0.0, 0.0, 0.8),
            Self::Red => Vec3::new(1.0, 0.0, 0.0),
            Self::Purple => Vec3::new(0.4, 0.0, 0.8),
        }
    }

    /// One-letter tag for text dumps of the board.
    pub fn letter(self) -> char {
        match self {
            Self::Cyan => 'C',
            Self::Orange => 'O',
            Self::Blue => 'B',
            Self::Red => 'R',
            Self::Purple => 'P',
        }
    }
}

/// How matched cells add to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ScoreMode {
    /// +1 per cell of every qualifying run; a cell in both a row run and a
    /// column run counts twice.
    #[default]
    PerRunMembership = 0,
    /// +1 per cell the first time it is marked in a detection pass.
    PerCell = 1,
}

/// What happens to cells popped by a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CascadeMode {
    /// Popped cells get a fresh color where they stand.
    #[default]
    InPlace = 0,
    /// Cells above the holes slide down, new bunnies fall in from the top and
    /// the board is checked again for chain matches.
    Gravity = 1,
}

impl ScoreMode {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::PerCell,
            _ => Self::PerRunMembership,
        }
    }
}

impl CascadeMode {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Gravity,
            _ => Self::InPlace,
        }
    }
}

/// Default grid dimensions when the host does not supply any.
pub const DEFAULT_ROWS: usize = 8;
pub const DEFAULT_COLS: usize = 8;

/// Pop growth: scale starts at 1.0, grows 0.01 per frame, completes above 1.5.
pub const POP_SCALE_START: f32 = 1.0;
pub const POP_SCALE_STEP: f32 = 0.01;
pub const POP_SCALE_MAX: f32 = 1.5;

/// Slide offset grows 0.05 world units per frame until one row height.
pub const SLIDE_STEP: f32 = 0.05;

/// Spin about the vertical axis, degrees per frame.
pub const SPIN_STEP_DEG: f32 = 0.5;

/// World layout: the board spans x in [-10, 10] and 19 units down from y = 10.
pub const WORLD_LEFT: f32 = -10.0;
pub const WORLD_TOP: f32 = 10.0;
pub const WORLD_WIDTH: f32 = 20.0;
pub const WORLD_HEIGHT: f32 = 19.0;
pub const WORLD_DEPTH: f32 = -10.0;
/// Model scale is this over the cell count, so bigger boards get smaller bunnies.
pub const MODEL_SCALE_NUMERATOR: f32 = 30.0;

/// Default viewport and the strip below the grid reserved for overlay text.
pub const DEFAULT_VIEWPORT_WIDTH: u32 = 640;
pub const DEFAULT_VIEWPORT_HEIGHT: u32 = 600;
pub const TEXT_BAND_PX: u32 = 60;

/// Session configuration supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub rows: usize,
    pub cols: usize,
    pub seed: u64,
    pub score_mode: ScoreMode,
    pub cascade_mode: CascadeMode,
}

impl GameConfig {
    pub fn new(rows: usize, cols: usize, seed: u64) -> Self {
        Self {
            rows,
            cols,
            seed,
            ..Self::default()
        }
    }

    pub fn with_score_mode(mut self, mode: ScoreMode) -> Self {
        self.score_mode = mode;
        self
    }

    pub fn with_cascade_mode(mut self, mode: CascadeMode) -> Self {
        self.cascade_mode = mode;
        self
    }

    /// Both dimensions must be non-zero and the cell count must fit a `usize`.
    pub fn validate(&self) -> Result<(), GameError> {
        let cells = self.rows.checked_mul(self.cols);
        if self.rows == 0 || self.cols == 0 || cells.is_none() {
            return Err(GameError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            seed: 1,
            score_mode: ScoreMode::default(),
            cascade_mode: CascadeMode::default(),
        }
    }
}
