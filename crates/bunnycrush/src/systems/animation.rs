use crate::components::{POP_SCALE_MAX, POP_SCALE_START, POP_SCALE_STEP, SLIDE_STEP, SPIN_STEP_DEG};

/// Grow-then-vanish animation for a cell being removed.
/// Scale starts at 1.0 and grows a fixed step per frame; the pop is done once
/// it passes 1.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopAnim {
    pub scale: f32,
}

impl PopAnim {
    pub fn new() -> Self {
        PopAnim {
            scale: POP_SCALE_START,
        }
    }

    /// Advance one frame. Returns the new scale, or None when the pop is done.
    pub fn tick(&mut self) -> Option<f32> {
        self.scale += POP_SCALE_STEP;
        if self.scale > POP_SCALE_MAX {
            return None;
        }
        Some(self.scale)
    }
}

impl Default for PopAnim {
    fn default() -> Self {
        Self::new()
    }
}

/// Downward slide toward a vacancy, in world units.
/// Offset starts at 0 and grows a fixed step per frame until it covers
/// `distance` (one row height).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideAnim {
    pub offset: f32,
    pub distance: f32,
}

impl SlideAnim {
    pub fn new(distance: f32) -> Self {
        SlideAnim {
            offset: 0.0,
            distance,
        }
    }

    /// Advance one frame. Returns the new offset, or None once it has landed.
    pub fn tick(&mut self) -> Option<f32> {
        self.offset += SLIDE_STEP;
        if self.offset >= self.distance {
            self.offset = self.distance;
            return None;
        }
        Some(self.offset)
    }
}

/// Continuous spin every bunny shares, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spin {
    pub angle: f32,
}

impl Spin {
    pub fn tick(&mut self) {
        self.angle = (self.angle + SPIN_STEP_DEG) % 360.0;
    }
}
