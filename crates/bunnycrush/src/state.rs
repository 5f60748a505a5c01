use bunnycrush_engine::{InstanceBatch, ModelInstance, ModelTransform};
use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::components::{
    BunnyColor, CascadeMode, GameConfig, MODEL_SCALE_NUMERATOR, WORLD_DEPTH, WORLD_HEIGHT,
    WORLD_LEFT, WORLD_TOP, WORLD_WIDTH,
};
use crate::error::GameError;
use crate::grid::Grid;
use crate::systems::animation::{PopAnim, SlideAnim, Spin};
use crate::systems::cascade::{self, Spawner};
use crate::systems::matcher::detect_matches;

/// Phase numbers as the host sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GamePhase {
    Idle = 0,
    Selected = 1,
    SingleColumnSlide = 2,
    MatchCheck = 3,
    MatchPop = 4,
    MultiColumnRefill = 5,
}

/// The phase together with the animation state only that phase may touch.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Waiting for a click.
    Idle,
    /// The clicked cell is growing before it pops.
    Selected { row: usize, col: usize, pop: PopAnim },
    /// The cells above the popped one fall a row; a new bunny enters on top.
    SingleColumnSlide { row: usize, col: usize, slide: SlideAnim },
    /// One frame: look for runs on the whole board.
    MatchCheck,
    /// Matched cells grow and pop. `drops` is the refill count per column.
    MatchPop { pop: PopAnim, drops: Vec<usize> },
    /// Gravity refill of every column with holes (gravity cascade mode only).
    MultiColumnRefill { slide: SlideAnim },
}

impl Phase {
    pub fn kind(&self) -> GamePhase {
        match self {
            Phase::Idle => GamePhase::Idle,
            Phase::Selected { .. } => GamePhase::Selected,
            Phase::SingleColumnSlide { .. } => GamePhase::SingleColumnSlide,
            Phase::MatchCheck => GamePhase::MatchCheck,
            Phase::MatchPop { .. } => GamePhase::MatchPop,
            Phase::MultiColumnRefill { .. } => GamePhase::MultiColumnRefill,
        }
    }
}

/// Notable things that happened during a tick, for the host to react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameEvent {
    Selected = 0,
    Popped = 1,
    Landed = 2,
    Matched = 3,
    Cleared = 4,
    Refilled = 5,
    Restarted = 6,
}

/// What the renderer needs for one visible board cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    pub color: BunnyColor,
    pub pop_scale: Option<f32>,
    /// Downward offset in world units.
    pub slide_offset: Option<f32>,
}

/// A replacement bunny falling in from above the board.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingView {
    pub col: usize,
    /// Row it starts from; negative rows are above the board.
    pub origin_row: i32,
    pub color: BunnyColor,
    pub slide_offset: f32,
}

/// Per-instance data written each tick for the host renderer.
/// 8 floats = 32 bytes stride.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct RenderInstance {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Spin about +Y in degrees.
    pub rotation: f32,
    pub scale: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl RenderInstance {
    pub fn transform(&self) -> ModelTransform {
        ModelTransform::new(Vec3::new(self.x, self.y, self.z), self.rotation, self.scale)
    }

    pub fn model_instance(&self) -> ModelInstance {
        ModelInstance::new(&self.transform(), Vec3::new(self.r, self.g, self.b))
    }
}

/// One game: the board, the phase machine driving it, and the counters.
pub struct GameSession {
    pub config: GameConfig,
    pub grid: Grid,
    phase: Phase,
    /// Accepted clicks since the last restart.
    pub move_counter: u32,
    pub score: u32,
    spawner: Spawner,
    spin: Spin,

    // Rebuilt every tick; read by the host renderer.
    pub render_buffer: Vec<RenderInstance>,

    // Events emitted since the last tick began
    pub events: Vec<GameEvent>,
}

impl GameSession {
    /// Start a session on a freshly randomized board.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;
        let mut spawner = Spawner::new(config.cols, config.seed);
        let mut grid = Grid::filled(config.rows, config.cols, BunnyColor::Cyan);
        spawner.fill_grid(&mut grid);
        log::info!(
            "session started: {}x{} grid, seed {}, {:?} scoring, {:?} cascade",
            config.rows,
            config.cols,
            config.seed,
            config.score_mode,
            config.cascade_mode
        );
        Ok(Self::assemble(config, grid, spawner))
    }

    /// Start a session on a given board. The config's dimensions are taken
    /// from the grid.
    pub fn with_grid(config: GameConfig, grid: Grid) -> Result<Self, GameError> {
        let config = GameConfig {
            rows: grid.rows,
            cols: grid.cols,
            ..config
        };
        config.validate()?;
        let spawner = Spawner::new(config.cols, config.seed);
        Ok(Self::assemble(config, grid, spawner))
    }

    fn assemble(config: GameConfig, grid: Grid, spawner: Spawner) -> Self {
        let mut session = GameSession {
            config,
            grid,
            phase: Phase::Idle,
            move_counter: 0,
            score: 0,
            spawner,
            spin: Spin::default(),
            render_buffer: Vec::with_capacity(config.rows * config.cols + config.rows),
            events: Vec::with_capacity(8),
        };
        session.rebuild_render_buffer();
        session
    }

    pub fn phase(&self) -> GamePhase {
        self.phase.kind()
    }

    pub fn phase_state(&self) -> &Phase {
        &self.phase
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    pub fn spin_angle(&self) -> f32 {
        self.spin.angle
    }

    /// Height of one row in world units; a slide covers exactly this.
    pub fn row_height(&self) -> f32 {
        WORLD_HEIGHT / self.grid.rows as f32
    }

    pub fn col_width(&self) -> f32 {
        WORLD_WIDTH / self.grid.cols as f32
    }

    pub fn overlay_text(&self) -> String {
        format!("Moves: {} Score: {}", self.move_counter, self.score)
    }

    /// Select a cell. Only accepted while idle; returns whether the click
    /// started a move. Out-of-range cells are an error in any phase.
    pub fn click(&mut self, row: usize, col: usize) -> Result<bool, GameError> {
        self.grid.check_bounds(row, col)?;
        if !matches!(self.phase, Phase::Idle) {
            log::debug!("click ({row}, {col}) ignored during {:?}", self.phase());
            return Ok(false);
        }

        // A tick that handed back to Idle may not have been followed by an
        // Idle tick yet.
        self.grid.clear_transient_flags();
        self.grid.get_mut(row, col).pressed = true;
        self.phase = Phase::Selected {
            row,
            col,
            pop: PopAnim::new(),
        };
        self.move_counter += 1;
        self.events.push(GameEvent::Selected);
        log::debug!("selected ({row}, {col}), move {}", self.move_counter);
        self.rebuild_render_buffer();
        Ok(true)
    }

    /// Fresh board, zeroed counters, back to idle. Allowed in any phase.
    pub fn restart(&mut self) {
        self.spawner.clear();
        self.spawner.fill_grid(&mut self.grid);
        self.move_counter = 0;
        self.score = 0;
        self.phase = Phase::Idle;
        self.events.push(GameEvent::Restarted);
        log::info!("session restarted");
        self.rebuild_render_buffer();
    }

    /// Advance the phase machine by one frame.
    ///
    /// On a desync error the session is left idle with its flags and spawn
    /// queues cleared and the render buffer rebuilt. The board keeps whatever
    /// colors it had; hosts that want a clean board call `restart`.
    pub fn tick(&mut self) -> Result<(), GameError> {
        self.events.clear();
        self.spin.tick();

        let current = std::mem::replace(&mut self.phase, Phase::Idle);
        let before = current.kind();
        self.phase = match self.step(current) {
            Ok(phase) => phase,
            Err(err) => {
                log::error!("{err} during {before:?}, dropping to idle");
                self.phase = self.enter_idle();
                self.spawner.clear();
                self.rebuild_render_buffer();
                return Err(err);
            }
        };
        if self.phase.kind() != before {
            log::debug!("phase {:?} -> {:?}", before, self.phase.kind());
        }

        self.rebuild_render_buffer();
        Ok(())
    }

    fn step(&mut self, phase: Phase) -> Result<Phase, GameError> {
        match phase {
            Phase::Idle => Ok(self.enter_idle()),
            Phase::Selected { row, col, mut pop } => {
                self.grid.get_mut(row, col).pressed = true;
                if pop.tick().is_some() {
                    return Ok(Phase::Selected { row, col, pop });
                }

                let cell = self.grid.get_mut(row, col);
                cell.pressed = false;
                cell.popped = true;
                cascade::mark_sliders_above(&mut self.grid, row, col);
                self.spawner.queue(col, 1);
                self.events.push(GameEvent::Popped);
                Ok(Phase::SingleColumnSlide {
                    row,
                    col,
                    slide: SlideAnim::new(self.row_height()),
                })
            }
            Phase::SingleColumnSlide { row, col, mut slide } => {
                if slide.tick().is_some() {
                    return Ok(Phase::SingleColumnSlide { row, col, slide });
                }

                let color = self.spawner.take(col)?;
                cascade::slide_column_down(&mut self.grid, row, col, color);
                self.spawner.ensure_drained()?;
                self.events.push(GameEvent::Landed);
                Ok(Phase::MatchCheck)
            }
            Phase::MatchCheck => {
                let report = detect_matches(&mut self.grid, self.config.score_mode);
                self.score += report.score_delta as u32;
                if !report.is_empty() {
                    self.events.push(GameEvent::Matched);
                }
                Ok(Phase::MatchPop {
                    pop: PopAnim::new(),
                    drops: report.to_drop,
                })
            }
            Phase::MatchPop { mut pop, drops } => {
                if self.grid.count_where(|c| c.matched && !c.popped) == 0 {
                    return Ok(self.finish_match_pop(drops));
                }
                if pop.tick().is_some() {
                    return Ok(Phase::MatchPop { pop, drops });
                }

                self.pop_matched();
                Ok(Phase::MatchPop {
                    pop: PopAnim::new(),
                    drops,
                })
            }
            Phase::MultiColumnRefill { mut slide } => {
                if self.config.cascade_mode == CascadeMode::InPlace {
                    return Ok(self.enter_idle());
                }
                if slide.tick().is_some() {
                    return Ok(Phase::MultiColumnRefill { slide });
                }

                let mut filled = 0;
                for col in 0..self.grid.cols {
                    filled += cascade::collapse_column(&mut self.grid, col, &mut self.spawner)?;
                }
                self.spawner.ensure_drained()?;
                log::debug!("gravity refill placed {filled} bunnies");
                self.events.push(GameEvent::Refilled);
                Ok(Phase::MatchCheck)
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Idle owns no popped, matched or sliding cells.
    fn enter_idle(&mut self) -> Phase {
        self.grid.clear_transient_flags();
        Phase::Idle
    }

    /// Every matched cell that has not popped yet pops now.
    fn pop_matched(&mut self) {
        let targets: Vec<(usize, usize)> = self
            .grid
            .iter()
            .filter(|(_, _, c)| c.matched && !c.popped)
            .map(|(r, c, _)| (r, c))
            .collect();

        for &(row, col) in &targets {
            let cell = self.grid.get_mut(row, col);
            cell.matched = false;
            cell.popped = true;
            if self.config.cascade_mode == CascadeMode::InPlace {
                let color = self.spawner.next_color();
                cascade::refill_in_place(&mut self.grid, row, col, color);
            }
            cascade::mark_sliders_above(&mut self.grid, row, col);
        }
        self.events.push(GameEvent::Cleared);
    }

    /// No matched cell is left to pop: refill the holes or go idle.
    fn finish_match_pop(&mut self, drops: Vec<usize>) -> Phase {
        let has_holes = self.grid.count_where(|c| c.popped) > 0;
        if self.config.cascade_mode != CascadeMode::Gravity || !has_holes {
            return self.enter_idle();
        }

        for (col, &count) in drops.iter().enumerate() {
            self.spawner.queue(col, count);
        }
        for row in 0..self.grid.rows {
            for col in 0..self.grid.cols {
                let falls = !self.grid.get(row, col).popped
                    && cascade::drop_distance(&self.grid, row, col) > 0;
                self.grid.get_mut(row, col).will_slide = falls;
            }
        }
        Phase::MultiColumnRefill {
            slide: SlideAnim::new(self.row_height()),
        }
    }

    /// Visible board cells with the animation state the current phase applies
    /// to them. Popped cells waiting for a refill are not drawn.
    pub fn cell_views(&self) -> Vec<CellView> {
        let popped_visible = matches!(self.phase, Phase::MatchPop { .. })
            && self.config.cascade_mode == CascadeMode::InPlace;

        self.grid
            .iter()
            .filter(|(_, _, cell)| !cell.popped || popped_visible)
            .map(|(row, col, cell)| {
                let mut view = CellView {
                    row,
                    col,
                    color: cell.color,
                    pop_scale: None,
                    slide_offset: None,
                };
                match &self.phase {
                    Phase::Selected { row: r, col: c, pop } if (*r, *c) == (row, col) => {
                        view.pop_scale = Some(pop.scale);
                    }
                    Phase::SingleColumnSlide { col: c, slide, .. } if *c == col && cell.will_slide => {
                        view.slide_offset = Some(slide.offset);
                    }
                    Phase::MatchPop { pop, .. } if cell.matched && !cell.popped => {
                        view.pop_scale = Some(pop.scale);
                    }
                    Phase::MultiColumnRefill { slide } if cell.will_slide => {
                        let rows = cascade::drop_distance(&self.grid, row, col) as f32;
                        view.slide_offset = Some(slide.offset * rows);
                    }
                    _ => {}
                }
                view
            })
            .collect()
    }

    /// Replacement bunnies currently falling in from above the board.
    pub fn incoming_views(&self) -> Vec<IncomingView> {
        let mut views = Vec::new();
        match &self.phase {
            Phase::SingleColumnSlide { col, slide, .. } => {
                if let Some(&color) = self.spawner.pending(*col).front() {
                    views.push(IncomingView {
                        col: *col,
                        origin_row: -1,
                        color,
                        slide_offset: slide.offset,
                    });
                }
            }
            Phase::MultiColumnRefill { slide } => {
                for col in 0..self.grid.cols {
                    let queue = self.spawner.pending(col);
                    let rows = queue.len() as f32;
                    for (k, &color) in queue.iter().enumerate() {
                        views.push(IncomingView {
                            col,
                            origin_row: -1 - k as i32,
                            color,
                            slide_offset: slide.offset * rows,
                        });
                    }
                }
            }
            _ => {}
        }
        views
    }

    fn world_position(&self, row: f32, col: usize, slide: f32) -> (f32, f32) {
        let cw = self.col_width();
        let rh = self.row_height();
        (
            WORLD_LEFT + col as f32 * cw + cw * 0.5,
            WORLD_TOP - (row * rh + rh * 0.5) - slide,
        )
    }

    /// Rebuild the flat render buffer from the current board and phase.
    fn rebuild_render_buffer(&mut self) {
        let base_scale = MODEL_SCALE_NUMERATOR / (self.grid.rows * self.grid.cols) as f32;
        let rotation = self.spin.angle;
        let mut buffer = std::mem::take(&mut self.render_buffer);
        buffer.clear();

        for view in self.cell_views() {
            let (x, y) = self.world_position(view.row as f32, view.col, view.slide_offset.unwrap_or(0.0));
            let rgb = view.color.rgb();
            buffer.push(RenderInstance {
                x,
                y,
                z: WORLD_DEPTH,
                rotation,
                scale: base_scale * view.pop_scale.unwrap_or(1.0),
                r: rgb.x,
                g: rgb.y,
                b: rgb.z,
            });
        }

        for view in self.incoming_views() {
            let (x, y) = self.world_position(view.origin_row as f32, view.col, view.slide_offset);
            let rgb = view.color.rgb();
            buffer.push(RenderInstance {
                x,
                y,
                z: WORLD_DEPTH,
                rotation,
                scale: base_scale,
                r: rgb.x,
                g: rgb.y,
                b: rgb.z,
            });
        }

        self.render_buffer = buffer;
    }

    /// Model matrices for every render instance, ready for upload.
    pub fn build_model_batch(&self, batch: &mut InstanceBatch) {
        batch.clear();
        for inst in &self.render_buffer {
            batch.push(inst.model_instance());
        }
    }

    /// Pointer to the render buffer data for SharedArrayBuffer access.
    pub fn render_buffer_ptr(&self) -> *const RenderInstance {
        self.render_buffer.as_ptr()
    }

    pub fn render_buffer_len(&self) -> usize {
        self.render_buffer.len()
    }

    pub fn events_ptr(&self) -> *const GameEvent {
        self.events.as_ptr()
    }

    pub fn events_len(&self) -> usize {
        self.events.len()
    }

    /// Text dump of the board, one letter per bunny, top row first.
    pub fn board_text(&self) -> String {
        let mut out = String::with_capacity(self.grid.rows * (self.grid.cols + 1));
        for row in 0..self.grid.rows {
            for col in 0..self.grid.cols {
                out.push(self.grid.color(row, col).letter());
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ScoreMode;
    use BunnyColor::*;

    /// 5x3 board with no runs anywhere.
    fn quiet_grid() -> Grid {
        Grid::from_colors(&[
            &[Red, Blue, Cyan],
            &[Orange, Purple, Red],
            &[Blue, Cyan, Orange],
            &[Purple, Red, Blue],
            &[Cyan, Orange, Purple],
        ])
        .unwrap()
    }

    fn session_with(grid: Grid, cascade: CascadeMode) -> GameSession {
        let config = GameConfig::default().with_cascade_mode(cascade);
        GameSession::with_grid(config, grid).unwrap()
    }

    /// Tick until `phase` is reached. Panics after `max` frames.
    fn run_until(session: &mut GameSession, phase: GamePhase, max: usize) -> usize {
        for frame in 0..max {
            if session.phase() == phase {
                return frame;
            }
            session.tick().unwrap();
        }
        panic!("never reached {:?}, stuck in {:?}", phase, session.phase());
    }

    #[test]
    fn session_initializes() {
        let session = GameSession::new(GameConfig::new(6, 7, 42)).unwrap();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.move_counter, 0);
        assert_eq!(session.score, 0);
        assert_eq!(session.grid.rows, 6);
        assert_eq!(session.grid.cols, 7);
        assert_eq!(session.render_buffer_len(), 42);
        assert_eq!(session.overlay_text(), "Moves: 0 Score: 0");
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(matches!(
            GameSession::new(GameConfig::new(0, 4, 1)),
            Err(GameError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn click_in_idle_starts_pop_from_one() {
        let mut session = GameSession::new(GameConfig::new(6, 6, 3)).unwrap();
        assert_eq!(session.click(2, 3), Ok(true));
        assert_eq!(session.phase(), GamePhase::Selected);
        assert_eq!(session.move_counter, 1);
        assert!(session.grid.get(2, 3).pressed);
        match session.phase_state() {
            Phase::Selected { row, col, pop } => {
                assert_eq!((*row, *col), (2, 3));
                assert_eq!(pop.scale, 1.0);
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut last_scale = 1.0;
        let mut frames = 0;
        while session.phase() == GamePhase::Selected {
            if let Phase::Selected { pop, .. } = session.phase_state() {
                last_scale = pop.scale;
            }
            session.tick().unwrap();
            frames += 1;
            assert!(frames < 100);
        }
        assert!(last_scale >= 1.49, "left Selected at scale {}", last_scale);
        assert_eq!(session.phase(), GamePhase::SingleColumnSlide);
        assert!(session.grid.get(2, 3).popped);
        assert!(!session.grid.get(2, 3).pressed);
        for row in 0..2 {
            assert!(session.grid.get(row, 3).will_slide);
        }
        assert_eq!(session.spawner().pending(3).len(), 1);
    }

    #[test]
    fn clicks_outside_idle_are_ignored() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.click(3, 1).unwrap();

        let mut seen = Vec::new();
        for _ in 0..400 {
            let phase = session.phase();
            if phase == GamePhase::Idle {
                break;
            }
            if !seen.contains(&phase) {
                seen.push(phase);
            }
            assert_eq!(session.click(0, 0), Ok(false));
            session.tick().unwrap();
        }
        assert_eq!(session.move_counter, 1);
        for phase in [
            GamePhase::Selected,
            GamePhase::SingleColumnSlide,
            GamePhase::MatchCheck,
            GamePhase::MatchPop,
        ] {
            assert!(seen.contains(&phase), "{:?} not visited", phase);
        }
    }

    #[test]
    fn out_of_bounds_click_is_rejected() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        assert_eq!(
            session.click(5, 0),
            Err(GameError::OutOfBounds { row: 5, col: 0, rows: 5, cols: 3 })
        );
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.move_counter, 0);
    }

    #[test]
    fn pop_and_slide_shifts_column_down_one() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        let before = session.grid.clone();
        session.click(3, 1).unwrap();

        run_until(&mut session, GamePhase::SingleColumnSlide, 100);
        let incoming = session.spawner().pending(1)[0];
        let views = session.incoming_views();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].color, incoming);

        run_until(&mut session, GamePhase::MatchCheck, 200);
        assert_eq!(
            session.grid.column_colors(1),
            vec![incoming, Blue, Purple, Cyan, Orange]
        );
        for col in [0, 2] {
            assert_eq!(session.grid.column_colors(col), before.column_colors(col));
        }
        assert!(session.spawner().ensure_drained().is_ok());
        assert_eq!(session.grid.count_where(|c| c.popped || c.will_slide), 0);
    }

    #[test]
    fn pop_on_top_row_gets_fresh_bunny() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.click(0, 2).unwrap();
        run_until(&mut session, GamePhase::SingleColumnSlide, 100);
        let incoming = session.spawner().pending(2)[0];
        run_until(&mut session, GamePhase::MatchCheck, 200);

        let mut expected = quiet_grid().column_colors(2);
        expected[0] = incoming;
        assert_eq!(session.grid.column_colors(2), expected);
    }

    #[test]
    fn slide_hides_popped_cell_and_draws_incoming() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.click(3, 1).unwrap();
        run_until(&mut session, GamePhase::SingleColumnSlide, 100);
        session.tick().unwrap();

        let views = session.cell_views();
        assert_eq!(views.len(), 14);
        let sliding: Vec<&CellView> = views.iter().filter(|v| v.slide_offset.is_some()).collect();
        assert_eq!(sliding.len(), 3);
        assert!(sliding.iter().all(|v| v.col == 1 && v.row < 3));
        assert_eq!(session.render_buffer_len(), 15);
    }

    #[test]
    fn in_place_match_refills_and_returns_to_idle() {
        let grid = Grid::from_colors(&[
            &[Red, Red, Red, Blue],
            &[Orange, Purple, Cyan, Red],
            &[Blue, Cyan, Orange, Purple],
        ])
        .unwrap();
        let mut session = session_with(grid, CascadeMode::InPlace);
        session.phase = Phase::MatchCheck;

        session.tick().unwrap();
        assert_eq!(session.phase(), GamePhase::MatchPop);
        assert_eq!(session.score, 3);
        assert!(session.events.contains(&GameEvent::Matched));
        assert_eq!(session.grid.count_where(|c| c.matched), 3);

        let views = session.cell_views();
        assert_eq!(views.iter().filter(|v| v.pop_scale.is_some()).count(), 3);

        let frames = run_until(&mut session, GamePhase::Idle, 200);
        assert!(frames >= 50, "pop finished after {} frames", frames);
        assert_eq!(session.move_counter, 0);
        assert_eq!(session.score, 3);
        // Rows below the match never move in place mode.
        assert_eq!(session.grid.color(1, 3), Red);
        assert_eq!(session.grid.color(2, 0), Blue);
    }

    #[test]
    fn click_on_the_frame_idle_returns_starts_clean() {
        let grid = Grid::from_colors(&[
            &[Red, Red, Red, Blue],
            &[Orange, Purple, Cyan, Red],
            &[Blue, Cyan, Orange, Purple],
        ])
        .unwrap();
        let mut session = session_with(grid, CascadeMode::InPlace);
        session.phase = Phase::MatchCheck;
        run_until(&mut session, GamePhase::Idle, 200);
        assert_eq!(session.score, 3);

        assert_eq!(session.click(2, 3), Ok(true));
        assert_eq!(session.grid.count_where(|c| c.popped || c.will_slide || c.matched), 0);
        assert_eq!(session.cell_views().len(), 12);

        // A refill that happens to line up three reds must still be popped.
        for col in 0..3 {
            session.grid.set_color(0, col, Red);
        }
        run_until(&mut session, GamePhase::MatchCheck, 400);
        session.tick().unwrap();
        assert!(session.score >= 6, "score {}", session.score);
        run_until(&mut session, GamePhase::Idle, 400);
        assert_eq!(session.grid.count_where(|c| c.matched), 0);
    }

    #[test]
    fn desync_error_leaves_a_clean_idle_board() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.grid.get_mut(3, 1).popped = true;
        session.grid.get_mut(0, 1).will_slide = true;
        session.spawner.queue(2, 1);
        session.phase = Phase::SingleColumnSlide {
            row: 3,
            col: 1,
            slide: SlideAnim::new(0.0),
        };

        assert_eq!(session.tick(), Err(GameError::SpawnQueueEmpty { col: 1 }));
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.grid.count_where(|c| c.popped || c.will_slide), 0);
        assert!(session.spawner().ensure_drained().is_ok());
        assert_eq!(session.render_buffer_len(), 15);
        assert_eq!(session.click(1, 1), Ok(true));
    }

    #[test]
    fn gravity_cascade_drops_survivors_and_refills_from_top() {
        let grid = Grid::from_colors(&[
            &[Blue, Cyan, Orange],
            &[Purple, Orange, Cyan],
            &[Red, Red, Red],
            &[Cyan, Blue, Purple],
        ])
        .unwrap();
        let mut session = session_with(grid, CascadeMode::Gravity);
        session.phase = Phase::MatchCheck;

        run_until(&mut session, GamePhase::MultiColumnRefill, 200);
        let queued: Vec<BunnyColor> = (0..3).map(|c| session.spawner().pending(c)[0]).collect();
        assert!((0..3).all(|c| session.spawner().pending(c).len() == 1));
        assert!(session.grid.get(0, 0).will_slide && session.grid.get(1, 2).will_slide);
        assert!(!session.grid.get(3, 1).will_slide);

        session.tick().unwrap();
        assert_eq!(session.incoming_views().len(), 3);
        let sliding = session.cell_views().iter().filter(|v| v.slide_offset.is_some()).count();
        assert_eq!(sliding, 6);

        run_until(&mut session, GamePhase::MatchCheck, 200);
        assert!(session.events.contains(&GameEvent::Refilled));
        assert_eq!(session.grid.column_colors(0), vec![queued[0], Blue, Purple, Cyan]);
        assert_eq!(session.grid.column_colors(1), vec![queued[1], Cyan, Orange, Blue]);
        assert_eq!(session.grid.column_colors(2), vec![queued[2], Orange, Cyan, Purple]);
        assert!(session.spawner().ensure_drained().is_ok());
        assert_eq!(session.grid.count_where(|c| c.popped || c.will_slide || c.matched), 0);
    }

    #[test]
    fn gravity_cascade_settles_to_idle() {
        let mut session = GameSession::new(
            GameConfig::new(6, 6, 11)
                .with_cascade_mode(CascadeMode::Gravity)
                .with_score_mode(ScoreMode::PerCell),
        )
        .unwrap();
        session.grid = Grid::filled(6, 6, Orange);
        session.phase = Phase::MatchCheck;
        session.tick().unwrap();
        assert_eq!(session.score, 36);
        run_until(&mut session, GamePhase::Idle, 20_000);
        assert!(session.spawner().ensure_drained().is_ok());
    }

    #[test]
    fn refill_phase_is_inert_without_gravity() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.phase = Phase::MultiColumnRefill {
            slide: SlideAnim::new(1.0),
        };
        session.tick().unwrap();
        assert_eq!(session.phase(), GamePhase::Idle);
        assert_eq!(session.grid, quiet_grid());
    }

    #[test]
    fn restart_from_every_phase() {
        for target in [
            GamePhase::Idle,
            GamePhase::Selected,
            GamePhase::SingleColumnSlide,
            GamePhase::MatchCheck,
            GamePhase::MatchPop,
        ] {
            let mut session = GameSession::new(GameConfig::new(6, 6, 5)).unwrap();
            session.score = 17;
            if target != GamePhase::Idle {
                session.click(4, 4).unwrap();
                run_until(&mut session, target, 400);
            }
            let before = session.grid.clone();

            session.restart();
            assert_eq!(session.phase(), GamePhase::Idle);
            assert_eq!(session.move_counter, 0);
            assert_eq!(session.score, 0);
            assert_ne!(session.grid, before);
            assert_eq!(session.grid.count_where(|c| c.popped || c.pressed || c.matched || c.will_slide), 0);
            assert!(session.spawner().ensure_drained().is_ok());
            assert!(session.events.contains(&GameEvent::Restarted));
        }
    }

    #[test]
    fn restart_during_gravity_refill_drops_queue() {
        let grid = Grid::from_colors(&[&[Blue], &[Red], &[Red], &[Red]]).unwrap();
        let mut session = session_with(grid, CascadeMode::Gravity);
        session.phase = Phase::MatchCheck;
        run_until(&mut session, GamePhase::MultiColumnRefill, 200);
        assert_eq!(session.spawner().pending(0).len(), 3);

        session.restart();
        assert!(session.spawner().ensure_drained().is_ok());
        assert_eq!(session.phase(), GamePhase::Idle);
    }

    #[test]
    fn same_seed_same_game() {
        let script = [(1, 1), (4, 0), (0, 5), (3, 3)];
        let play = || {
            let mut session = GameSession::new(GameConfig::new(6, 6, 99)).unwrap();
            for &(row, col) in &script {
                session.click(row, col).unwrap();
                run_until(&mut session, GamePhase::Idle, 2_000);
            }
            (session.grid.clone(), session.move_counter, session.score)
        };
        let a = play();
        let b = play();
        assert_eq!(a, b);
        assert_eq!(a.1, 4);
    }

    #[test]
    fn render_buffer_places_bunnies_on_the_board() {
        let session = session_with(quiet_grid(), CascadeMode::InPlace);
        let base = MODEL_SCALE_NUMERATOR / 15.0;
        let first = session.render_buffer[0];
        assert!((first.x - (-10.0 + 20.0 / 6.0)).abs() < 1e-4);
        assert!((first.y - (10.0 - 19.0 / 10.0)).abs() < 1e-4);
        assert_eq!(first.z, WORLD_DEPTH);
        assert!((first.scale - base).abs() < 1e-6);
        assert_eq!((first.r, first.g, first.b), (1.0, 0.0, 0.0));

        let mut batch = InstanceBatch::with_capacity(15);
        session.build_model_batch(&mut batch);
        assert_eq!(batch.len(), 15);
        assert_eq!(batch.instances[0].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn overlay_tracks_counters() {
        let mut session = session_with(quiet_grid(), CascadeMode::InPlace);
        session.click(2, 2).unwrap();
        session.score = 9;
        assert_eq!(session.overlay_text(), "Moves: 1 Score: 9");
        assert_eq!(session.board_text().lines().next(), Some("RBC"));
    }
}
