pub mod components;
pub mod error;
pub mod frontend;
pub mod grid;
pub mod state;
pub mod systems;

#[cfg(target_arch = "wasm32")]
pub mod bridge;

pub use components::GameConfig;
pub use error::GameError;
pub use frontend::Frontend;
pub use state::{GamePhase, GameSession};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("bunnycrush-sim initialized");
}
