//! GPU storage buffers for the per-frame light and fog volume arrays

use bytemuck::{Pod, Zeroable};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::fog::light::FogLight;
use crate::fog::volume::FogVolume;

/// Per-light entry for the GPU (64 bytes, matches WGSL layout)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct LightUniform {
    /// World-space position (unused for directional lights)
    pub position: [f32; 3],
    /// Influence radius in world units
    pub range: f32,
    pub color: [f32; 3],
    pub intensity: f32,
    /// Direction the light points, normalized
    pub direction: [f32; 3],
    /// LightKind::code()
    pub kind: u32,
    /// Full cone angle in radians (spot lights only)
    pub spot_angle: f32,
    pub _pad: [f32; 3],
}

impl From<&FogLight> for LightUniform {
    fn from(light: &FogLight) -> Self {
        Self {
            position: light.position.to_array(),
            range: light.range,
            color: light.color.to_array(),
            intensity: light.intensity,
            direction: light.direction.normalize_or_zero().to_array(),
            kind: light.kind.code(),
            spot_angle: light.spot_angle,
            _pad: [0.0; 3],
        }
    }
}

/// Per-volume entry for the GPU (48 bytes, matches WGSL layout)
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FogVolumeUniform {
    pub position: [f32; 3],
    /// FogKind::code()
    pub kind: u32,
    /// Half-extents of the bounding box (Local volumes only)
    pub size: [f32; 3],
    pub density: f32,
    pub color: [f32; 3],
    pub scatter: f32,
}

impl From<&FogVolume> for FogVolumeUniform {
    fn from(volume: &FogVolume) -> Self {
        Self {
            position: volume.position.to_array(),
            kind: volume.kind.code(),
            size: volume.size.to_array(),
            density: volume.density,
            color: volume.color.to_array(),
            scatter: volume.scatter,
        }
    }
}

/// Entry capacity backing a live entity count. Never zero, so the storage
/// binding stays valid when the scene has no entities of a class.
pub fn required_capacity(count: usize) -> usize {
    count.max(1)
}

/// GPU buffers for the light and fog volume arrays.
///
/// The bind group layout is created once and survives reallocation; buffers
/// are recreated whenever the live entity count changes and the bind group
/// is rebuilt to point at them.
pub struct SceneBuffers {
    light_buffer: Option<wgpu::Buffer>,
    volume_buffer: Option<wgpu::Buffer>,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
    light_capacity: usize,
    volume_capacity: usize,
}

impl SceneBuffers {
    /// Create the layout only; buffers are allocated by `ensure`
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fog_scene_bind_group_layout"),
            entries: &[
                // binding 0: lights
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // binding 1: fog volumes
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        Self {
            light_buffer: None,
            volume_buffer: None,
            bind_group_layout,
            bind_group: None,
            light_capacity: 0,
            volume_capacity: 0,
        }
    }

    /// Make the buffers match the current live entity counts.
    ///
    /// A buffer is dropped and recreated whenever its required capacity
    /// differs from what is allocated, never resized in place. Returns true
    /// if anything was reallocated.
    pub fn ensure(
        &mut self,
        device: &wgpu::Device,
        light_count: usize,
        volume_count: usize,
    ) -> Result<bool> {
        let light_needed = required_capacity(light_count);
        let volume_needed = required_capacity(volume_count);

        let mut changed = false;

        if self.light_buffer.is_none() || self.light_capacity != light_needed {
            let size = (light_needed * std::mem::size_of::<LightUniform>()) as u64;
            Self::check_limits(device, size)?;
            self.light_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("fog_lights"),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.light_capacity = light_needed;
            changed = true;
        }

        if self.volume_buffer.is_none() || self.volume_capacity != volume_needed {
            let size = (volume_needed * std::mem::size_of::<FogVolumeUniform>()) as u64;
            Self::check_limits(device, size)?;
            self.volume_buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("fog_volumes"),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.volume_capacity = volume_needed;
            changed = true;
        }

        if changed {
            self.rebuild_bind_group(device);
        }
        Ok(changed)
    }

    fn check_limits(device: &wgpu::Device, size: u64) -> Result<()> {
        let limits = device.limits();
        if size > limits.max_storage_buffer_binding_size as u64 || size > limits.max_buffer_size {
            return Err(Error::Gpu(format!(
                "scene buffer of {} bytes exceeds device limits",
                size
            )));
        }
        Ok(())
    }

    /// Upload the full staging arrays. Slice lengths must match the
    /// allocated capacities; the caller zero-pads past the live count.
    pub fn upload(
        &self,
        queue: &wgpu::Queue,
        lights: &[LightUniform],
        volumes: &[FogVolumeUniform],
    ) {
        debug_assert_eq!(lights.len(), self.light_capacity);
        debug_assert_eq!(volumes.len(), self.volume_capacity);
        if let Some(buffer) = &self.light_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(lights));
        }
        if let Some(buffer) = &self.volume_buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(volumes));
        }
    }

    /// Release the buffers. Safe to call when nothing is allocated.
    pub fn dispose(&mut self) {
        self.light_buffer = None;
        self.volume_buffer = None;
        self.bind_group = None;
        self.light_capacity = 0;
        self.volume_capacity = 0;
    }

    fn rebuild_bind_group(&mut self, device: &wgpu::Device) {
        let (Some(lights), Some(volumes)) = (&self.light_buffer, &self.volume_buffer) else {
            self.bind_group = None;
            return;
        };
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_scene_bind_group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: lights.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: volumes.as_entire_binding(),
                },
            ],
        }));
    }

    /// Get bind group layout for pipeline creation
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Get bind group, present once `ensure` has run
    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    pub fn light_capacity(&self) -> usize {
        self.light_capacity
    }

    pub fn volume_capacity(&self) -> usize {
        self.volume_capacity
    }

    /// Number of live GPU buffers, for leak accounting
    pub fn allocation_count(&self) -> usize {
        self.light_buffer.is_some() as usize + self.volume_buffer.is_some() as usize
    }
}
