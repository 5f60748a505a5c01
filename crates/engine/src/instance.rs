use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Placement of one model instance: uniform scale, spin about +Y, translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub translation: Vec3,
    /// Spin about the vertical axis, in degrees.
    pub rotation_deg: f32,
    pub scale: f32,
}

impl ModelTransform {
    pub fn new(translation: Vec3, rotation_deg: f32, scale: f32) -> Self {
        Self {
            translation,
            rotation_deg,
            scale,
        }
    }

    /// `T * R * S`.
    pub fn matrix(&self) -> Mat4 {
        let t = Mat4::from_translation(self.translation);
        let r = Mat4::from_rotation_y(self.rotation_deg.to_radians());
        let s = Mat4::from_scale(Vec3::splat(self.scale));
        t * r * s
    }
}

/// Per-instance data sent to the GPU: model matrix, its inverse transpose for
/// normals, and the diffuse color.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ModelInstance {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub color: [f32; 4],
}

impl ModelInstance {
    pub fn new(transform: &ModelTransform, color: Vec3) -> Self {
        let model = transform.matrix();
        let normal = model.inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            normal: normal.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }
}

/// Instances drawn with the same model in one call.
#[derive(Debug, Default)]
pub struct InstanceBatch {
    pub instances: Vec<ModelInstance>,
}

impl InstanceBatch {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            instances: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, instance: ModelInstance) {
        self.instances.push(instance);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Raw bytes for a vertex-buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}
