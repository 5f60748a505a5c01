//! Game-agnostic collaborator layer for instanced model rendering.
//!
//! Knows nothing about bunnies or matching: it maps pointer pixels to grid
//! cells, queues input events, and turns per-instance placement data into the
//! matrices a renderer uploads.

pub mod camera;
pub mod input;
pub mod instance;

pub use camera::{Camera, CameraUniform};
pub use input::{GridPicker, InputEvent, InputQueue};
pub use instance::{InstanceBatch, ModelInstance, ModelTransform};
