use bunnycrush_engine::input::{KEY_ESCAPE, KEY_R};
use bunnycrush_engine::{Camera, CameraUniform, GridPicker, InputEvent, InputQueue, InstanceBatch, ModelInstance};

use crate::components::{GameConfig, DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, TEXT_BAND_PX};
use crate::error::GameError;
use crate::state::GameSession;

/// Host-side driver: routes raw input into a session, advances it one frame
/// at a time and keeps the model batch the renderer uploads.
pub struct Frontend {
    pub session: GameSession,
    pub picker: GridPicker,
    pub input: InputQueue,
    pub camera: Camera,
    pub models: InstanceBatch,
    quit_requested: bool,
}

impl Frontend {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_viewport(config, DEFAULT_VIEWPORT_WIDTH, DEFAULT_VIEWPORT_HEIGHT)
    }

    pub fn with_viewport(config: GameConfig, width: u32, height: u32) -> Result<Self, GameError> {
        let session = GameSession::new(config)?;
        Ok(Self::from_session(session, width, height))
    }

    pub fn from_session(session: GameSession, width: u32, height: u32) -> Self {
        let picker = GridPicker::new(width, height, TEXT_BAND_PX, session.grid.rows, session.grid.cols);
        let mut models = InstanceBatch::with_capacity(session.render_buffer_len());
        session.build_model_batch(&mut models);
        Frontend {
            session,
            picker,
            input: InputQueue::new(),
            camera: Camera::default(),
            models,
            quit_requested: false,
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    /// Escape was pressed; the host should close.
    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// One frame: advance the session, then apply the input gathered since the
    /// last frame so its events survive until the host reads them.
    pub fn frame(&mut self) -> Result<(), GameError> {
        self.session.tick()?;
        for event in self.input.drain() {
            self.handle(event)?;
        }
        self.session.build_model_batch(&mut self.models);
        Ok(())
    }

    fn handle(&mut self, event: InputEvent) -> Result<(), GameError> {
        match event {
            InputEvent::PointerDown { x, y } => {
                if let Some((row, col)) = self.picker.pick(x, y) {
                    self.session.click(row, col)?;
                }
            }
            InputEvent::KeyDown { key_code: KEY_R } => self.session.restart(),
            InputEvent::KeyDown { key_code: KEY_ESCAPE } => {
                log::info!("quit requested");
                self.quit_requested = true;
            }
            InputEvent::KeyDown { key_code } => log::debug!("key {key_code} not bound"),
            InputEvent::Resize { width, height } => self.picker.resize(width, height),
        }
        Ok(())
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        self.camera.uniform()
    }

    pub fn models_ptr(&self) -> *const ModelInstance {
        self.models.instances.as_ptr()
    }

    pub fn models_len(&self) -> usize {
        self.models.len()
    }
}
