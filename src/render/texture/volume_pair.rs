//! Double-buffered 3D fog volume textures

use wgpu::{Device, Extent3d, Texture, TextureView};

use crate::core::types::UVec3;

/// Format of the fog volume: rgb = in-scattered light, a = density
pub const VOLUME_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

struct VolumeSlot {
    texture: Texture,
    view: TextureView,
}

/// Two same-shaped 3D textures alternating between the `previous` role
/// (read for temporal reprojection) and the `current` role (written this
/// frame). Swapping roles is an index flip, never a copy.
///
/// The pair carries the tag of whichever subsystem created it, so an owner
/// can tell its own textures from substituted ones before destroying.
pub struct VolumeTexturePair {
    slots: [VolumeSlot; 2],
    front: usize,
    resolution: UVec3,
    tag: &'static str,
}

impl VolumeTexturePair {
    /// Allocate both textures at the given froxel resolution
    pub fn new(device: &Device, resolution: UVec3, tag: &'static str) -> Self {
        let slots = [
            Self::create_slot(device, resolution, tag),
            Self::create_slot(device, resolution, tag),
        ];
        Self {
            slots,
            front: 0,
            resolution,
            tag,
        }
    }

    fn create_slot(device: &Device, resolution: UVec3, tag: &'static str) -> VolumeSlot {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(tag),
            size: Extent3d {
                width: resolution.x,
                height: resolution.y,
                depth_or_array_layers: resolution.z,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: VOLUME_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        VolumeSlot { texture, view }
    }

    /// View of the texture being written this frame
    pub fn current_view(&self) -> &TextureView {
        &self.slots[self.front].view
    }

    /// View of last frame's completed texture
    pub fn previous_view(&self) -> &TextureView {
        &self.slots[1 - self.front].view
    }

    /// Make `current` next frame's `previous`
    pub fn swap(&mut self) {
        self.front = 1 - self.front;
    }

    pub fn resolution(&self) -> UVec3 {
        self.resolution
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// Free both textures' memory immediately
    pub fn destroy(self) {
        for slot in self.slots {
            slot.texture.destroy();
        }
    }
}
