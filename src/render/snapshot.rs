//! Per-frame flattening of scene entities into GPU-ready arrays

use bytemuck::Zeroable;

use crate::render::buffer::scene_buffers::required_capacity;
use crate::render::buffer::{CameraUniform, FogVolumeUniform, LightUniform};
use crate::scene::SceneContext;

/// Builds the light and fog volume staging arrays fresh each frame.
///
/// Arrays are sized `max(slot count, 1)`. Every registered slot gets a
/// stable index; slots whose entity has been destroyed are written as
/// zeroes rather than compacted away, so indices stay valid for the whole
/// frame. The staging vectors are reused between frames.
pub struct SnapshotBuilder {
    lights: Vec<LightUniform>,
    volumes: Vec<FogVolumeUniform>,
    light_count: u32,
    volume_count: u32,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            volumes: Vec::new(),
            light_count: 0,
            volume_count: 0,
        }
    }

    /// Flatten the live entity set into the staging arrays and resolve
    /// the camera. Returns None when no camera resolves, in which case
    /// the frame must not dispatch; the entity arrays are still valid.
    pub fn build(&mut self, scene: &SceneContext) -> Option<CameraUniform> {
        self.light_count = scene.lights.len() as u32;
        self.lights.clear();
        for slot in scene.lights.slots() {
            self.lights.push(match slot {
                Some(light) => LightUniform::from(light),
                None => LightUniform::zeroed(),
            });
        }
        self.lights.resize(required_capacity(self.lights.len()), LightUniform::zeroed());

        self.volume_count = scene.volumes.len() as u32;
        self.volumes.clear();
        for slot in scene.volumes.slots() {
            self.volumes.push(match slot {
                Some(volume) => FogVolumeUniform::from(volume),
                None => FogVolumeUniform::zeroed(),
            });
        }
        self.volumes.resize(required_capacity(self.volumes.len()), FogVolumeUniform::zeroed());

        match scene.resolve_camera() {
            Some(camera) => Some(CameraUniform::from_camera(camera)),
            None => {
                log::warn!("no camera available for fog rendering");
                None
            }
        }
    }

    /// Staging array, `max(light_count, 1)` entries
    pub fn lights(&self) -> &[LightUniform] {
        &self.lights
    }

    /// Staging array, `max(volume_count, 1)` entries
    pub fn volumes(&self) -> &[FogVolumeUniform] {
        &self.volumes
    }

    /// Registered light slots, stale ones included
    pub fn light_count(&self) -> u32 {
        self.light_count
    }

    /// Registered volume slots, stale ones included
    pub fn volume_count(&self) -> u32 {
        self.volume_count
    }
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}
