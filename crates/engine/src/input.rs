/// Key code for `R`, matching the GLFW/ASCII value.
pub const KEY_R: u32 = 82;
/// Key code for `Escape`, matching GLFW.
pub const KEY_ESCAPE: u32 = 256;

/// Input event types the engine understands.
/// Nothing here knows about the game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A click began at viewport pixel coordinates (origin top-left).
    PointerDown { x: f32, y: f32 },
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// The viewport was resized to (width, height) pixels.
    Resize { width: u32, height: u32 },
}

/// Events pushed by the host and drained by the game once per frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps viewport pixels to (row, col) cells of a grid that fills the viewport
/// width and the viewport height minus a text band at the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPicker {
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Pixels reserved below the grid (overlay text).
    pub text_band: u32,
    pub rows: usize,
    pub cols: usize,
}

impl GridPicker {
    pub fn new(viewport_width: u32, viewport_height: u32, text_band: u32, rows: usize, cols: usize) -> Self {
        let mut picker = Self {
            viewport_width: 1,
            viewport_height: 1,
            text_band,
            rows,
            cols,
        };
        picker.resize(viewport_width, viewport_height);
        picker
    }

    /// Track a viewport resize. Zero sizes are clamped to 1 pixel.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.viewport_width = width.max(1);
        self.viewport_height = height.max(1);
    }

    /// Pixel extent of one cell as (width, height).
    pub fn cell_extent(&self) -> (f32, f32) {
        let grid_h = self.viewport_height.saturating_sub(self.text_band).max(1);
        (
            self.viewport_width as f32 / self.cols.max(1) as f32,
            grid_h as f32 / self.rows.max(1) as f32,
        )
    }

    /// Cell under the pixel, or `None` when the pixel is outside the grid.
    pub fn pick(&self, x: f32, y: f32) -> Option<(usize, usize)> {
        if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
            return None;
        }
        let (cell_w, cell_h) = self.cell_extent();
        let col = (x / cell_w) as usize;
        let row = (y / cell_h) as usize;
        if row < self.rows && col < self.cols {
            Some((row, col))
        } else {
            log::debug!("pick ({x}, {y}) outside {}x{} grid", self.rows, self.cols);
            None
        }
    }

    /// Pixel at the center of a cell. Inverse of `pick` for in-range cells.
    pub fn cell_center(&self, row: usize, col: usize) -> (f32, f32) {
        let (cell_w, cell_h) = self.cell_extent();
        ((col as f32 + 0.5) * cell_w, (row as f32 + 0.5) * cell_h)
    }
}
