use std::cell::RefCell;
use wasm_bindgen::prelude::*;

use bunnycrush_engine::InputEvent;

use crate::components::{CascadeMode, GameConfig, ScoreMode};
use crate::frontend::Frontend;

thread_local! {
    static GAME: RefCell<Option<Frontend>> = RefCell::new(None);
}

/// Run `f` against the live game. Returns None (and logs) before `init_game`.
fn with_game<R>(f: impl FnOnce(&mut Frontend) -> R) -> Option<R> {
    GAME.with(|cell| {
        let mut borrow = cell.borrow_mut();
        match borrow.as_mut() {
            Some(game) => Some(f(game)),
            None => {
                log::error!("bunnycrush-sim: game not initialized, call init_game() first");
                None
            }
        }
    })
}

fn install(config: GameConfig) -> bool {
    match Frontend::new(config) {
        Ok(game) => {
            GAME.with(|cell| {
                *cell.borrow_mut() = Some(game);
            });
            true
        }
        Err(err) => {
            log::error!("bunnycrush-sim: {err}");
            false
        }
    }
}

/// Start a game on a `width` x `height` board (columns x rows).
/// Returns false when the dimensions are rejected.
#[wasm_bindgen]
pub fn init_game(width: u32, height: u32, seed: f64) -> bool {
    install(GameConfig::new(height as usize, width as usize, seed as u64))
}

/// score_mode: 0 = per run membership, 1 = per cell.
/// cascade_mode: 0 = in place, 1 = gravity.
#[wasm_bindgen]
pub fn init_game_with_modes(width: u32, height: u32, seed: f64, score_mode: u8, cascade_mode: u8) -> bool {
    let config = GameConfig::new(height as usize, width as usize, seed as u64)
        .with_score_mode(ScoreMode::from_u8(score_mode))
        .with_cascade_mode(CascadeMode::from_u8(cascade_mode));
    install(config)
}

#[wasm_bindgen]
pub fn tick_game() {
    with_game(|g| {
        if let Err(err) = g.frame() {
            log::error!("bunnycrush-sim: {err}");
        }
    });
}

/// Queue a click at viewport pixel (x, y), origin top-left.
#[wasm_bindgen]
pub fn click_pixel(x: f32, y: f32) {
    with_game(|g| g.push(InputEvent::PointerDown { x, y }));
}

/// Click a cell directly. Returns whether the click started a move.
#[wasm_bindgen]
pub fn click_cell(row: u32, col: u32) -> bool {
    with_game(|g| match g.session.click(row as usize, col as usize) {
        Ok(accepted) => accepted,
        Err(err) => {
            log::error!("bunnycrush-sim: {err}");
            false
        }
    })
    .unwrap_or(false)
}

#[wasm_bindgen]
pub fn press_key(key_code: u32) {
    with_game(|g| g.push(InputEvent::KeyDown { key_code }));
}

#[wasm_bindgen]
pub fn resize_viewport(width: u32, height: u32) {
    with_game(|g| g.push(InputEvent::Resize { width, height }));
}

#[wasm_bindgen]
pub fn restart_game() {
    with_game(|g| g.session.restart());
}

/// True once Escape has been pressed.
#[wasm_bindgen]
pub fn quit_requested() -> bool {
    with_game(|g| g.quit_requested()).unwrap_or(false)
}

/// Current phase, 0 = Idle .. 5 = MultiColumnRefill.
#[wasm_bindgen]
pub fn get_game_phase() -> u8 {
    with_game(|g| g.session.phase() as u8).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_moves() -> u32 {
    with_game(|g| g.session.move_counter).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_score() -> u32 {
    with_game(|g| g.session.score).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_overlay_text() -> String {
    with_game(|g| g.session.overlay_text()).unwrap_or_default()
}

#[wasm_bindgen]
pub fn get_board_width() -> u32 {
    with_game(|g| g.session.grid.cols as u32).unwrap_or(0)
}

#[wasm_bindgen]
pub fn get_board_height() -> u32 {
    with_game(|g| g.session.grid.rows as u32).unwrap_or(0)
}

/// Pointer to the render instances (8 f32 each: x, y, z, rotation, scale, r, g, b).
#[wasm_bindgen]
pub fn get_render_buffer_ptr() -> *const f32 {
    with_game(|g| g.session.render_buffer_ptr() as *const f32).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_render_buffer_len() -> u32 {
    with_game(|g| g.session.render_buffer_len() as u32).unwrap_or(0)
}

/// Pointer to the model instances (36 f32 each: model, normal, color).
#[wasm_bindgen]
pub fn get_model_buffer_ptr() -> *const f32 {
    with_game(|g| g.models_ptr() as *const f32).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_model_buffer_len() -> u32 {
    with_game(|g| g.models_len() as u32).unwrap_or(0)
}

/// Pointer to this frame's events (u8 per event).
#[wasm_bindgen]
pub fn get_events_ptr() -> *const u8 {
    with_game(|g| g.session.events_ptr() as *const u8).unwrap_or(std::ptr::null())
}

#[wasm_bindgen]
pub fn get_events_len() -> u32 {
    with_game(|g| g.session.events_len() as u32).unwrap_or(0)
}

/// Column-major 4x4 orthographic projection.
#[wasm_bindgen]
pub fn get_camera_projection() -> Vec<f32> {
    with_game(|g| g.camera.projection_matrix().to_cols_array().to_vec()).unwrap_or_default()
}
