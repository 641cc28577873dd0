//! GPU buffer management

pub mod camera_buffer;
pub mod scene_buffers;

pub use camera_buffer::{CameraBuffer, CameraUniform};
pub use scene_buffers::{FogVolumeUniform, LightUniform, SceneBuffers};
