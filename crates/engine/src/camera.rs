use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Orthographic camera over a fixed world box.
/// Produces a GL-convention projection matrix (clip z in [-1, 1]).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Half of the visible width in world units.
    pub half_width: f32,
    /// Half of the visible height in world units.
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
    /// Camera center position in world space.
    pub center: [f32; 2],
}

/// GPU-side uniform data for the camera.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub projection: [[f32; 4]; 4],
}

impl Camera {
    pub fn new(half_width: f32, half_height: f32, near: f32, far: f32) -> Self {
        Self {
            half_width,
            half_height,
            near,
            far,
            center: [0.0, 0.0],
        }
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let left = self.center[0] - self.half_width;
        let right = self.center[0] + self.half_width;
        let bottom = self.center[1] - self.half_height;
        let top = self.center[1] + self.half_height;
        Mat4::orthographic_rh_gl(left, right, bottom, top, self.near, self.far)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            projection: self.projection_matrix().to_cols_array_2d(),
        }
    }
}

impl Default for Camera {
    /// The fixed (-10, 10, -10, 10, -20, 20) box the board is laid out in.
    fn default() -> Self {
        Self::new(10.0, 10.0, -20.0, 20.0)
    }
}
