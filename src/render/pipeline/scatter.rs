//! Froxel fog integration compute pipeline

use bytemuck::{Pod, Zeroable};
use glam::UVec3;

use crate::render::buffer::CameraBuffer;
use crate::render::texture::{DITHER_SIZE, VOLUME_FORMAT};

/// Fog integration parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ScatterParams {
    pub resolution: [u32; 3],
    pub time: f32,
    pub jitter_distance: f32,
    pub jitter_scale: f32,
    pub temporal_strength: f32,
    pub shadows_enabled: u32,
    pub light_count: u32,
    pub volume_count: u32,
    pub dither_size: u32,
    pub view_distance: f32,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            resolution: [160, 90, 128],
            time: 0.0,
            jitter_distance: 2.0,
            jitter_scale: 3.1,
            temporal_strength: 0.75,
            shadows_enabled: 0,
            light_count: 0,
            volume_count: 0,
            dither_size: DITHER_SIZE,
            view_distance: 70.0,
        }
    }
}

/// Froxel fog integration compute pipeline
///
/// Walks every froxel of the fog volume, accumulates density and in-scattered
/// light from the scene's fog volumes and lights, and blends the result with
/// last frame's volume for temporal stability.
pub struct ScatterPipeline {
    pipeline: wgpu::ComputePipeline,
    params_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    camera_params_bind_group_layout: wgpu::BindGroupLayout,
    camera_params_bind_group: wgpu::BindGroup,
    input_bind_group_layout: wgpu::BindGroupLayout,
    output_bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl ScatterPipeline {
    /// Create a new fog integration pipeline
    ///
    /// # Arguments
    /// * `device` - WGPU device
    /// * `camera_buffer` - Camera uniform buffer
    /// * `scene_layout` - Layout of the light/volume storage buffers
    pub fn new(
        device: &wgpu::Device,
        camera_buffer: &CameraBuffer,
        scene_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fog_scatter_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/fog_scatter.wgsl").into(),
            ),
        });

        // Create params buffer
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fog_scatter_params"),
            size: std::mem::size_of::<ScatterParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Bind group 0: Camera + fog params
        let camera_params_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_scatter_camera_params_layout"),
                entries: &[
                    // Camera buffer
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    // Fog params
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                ],
            });

        let camera_params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_scatter_camera_params_bind_group"),
            layout: &camera_params_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.buffer().as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        // Bind group 1: Input textures (previous volume + dither + shadow)
        let input_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_scatter_input_layout"),
                entries: &[
                    // Previous frame's fog volume
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D3,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Linear sampler shared by all sampled inputs
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                    // Dither noise texture
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    // Screen-space shadow mask
                    wgpu::BindGroupLayoutEntry {
                        binding: 3,
                        visibility: wgpu::ShaderStages::COMPUTE,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                ],
            });

        // Bind group 3: Output fog volume
        let output_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_scatter_output_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: VOLUME_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D3,
                    },
                    count: None,
                }],
            });

        // Create pipeline layout
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fog_scatter_pipeline_layout"),
            bind_group_layouts: &[
                &camera_params_bind_group_layout,
                &input_bind_group_layout,
                scene_layout,
                &output_bind_group_layout,
            ],
            immediate_size: 0,
        });

        // Create compute pipeline
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fog_scatter_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("fog_scatter_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        Self {
            pipeline,
            params_buffer,
            camera_params_bind_group_layout,
            camera_params_bind_group,
            input_bind_group_layout,
            output_bind_group_layout,
            sampler,
        }
    }

    /// Create input bind group for the previous volume, dither and shadow textures
    pub fn create_input_bind_group(
        &self,
        device: &wgpu::Device,
        previous_view: &wgpu::TextureView,
        dither_view: &wgpu::TextureView,
        shadow_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_scatter_input_bind_group"),
            layout: &self.input_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(previous_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(dither_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(shadow_view),
                },
            ],
        })
    }

    /// Create output bind group for the fog volume being written this frame
    pub fn create_output_bind_group(
        &self,
        device: &wgpu::Device,
        volume_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_scatter_output_bind_group"),
            layout: &self.output_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(volume_view),
            }],
        })
    }

    /// Update fog integration parameters
    pub fn update_params(&self, queue: &wgpu::Queue, params: &ScatterParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Dispatch the fog integration compute shader over the whole volume
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        input_bind_group: &wgpu::BindGroup,
        scene_bind_group: &wgpu::BindGroup,
        output_bind_group: &wgpu::BindGroup,
        resolution: UVec3,
        timestamp_writes: Option<wgpu::ComputePassTimestampWrites<'_>>,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fog_scatter_pass"),
            timestamp_writes,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_params_bind_group, &[]);
        pass.set_bind_group(1, input_bind_group, &[]);
        pass.set_bind_group(2, scene_bind_group, &[]);
        pass.set_bind_group(3, output_bind_group, &[]);

        let workgroups_x = (resolution.x + 3) / 4;
        let workgroups_y = (resolution.y + 3) / 4;
        let workgroups_z = (resolution.z + 3) / 4;
        pass.dispatch_workgroups(workgroups_x, workgroups_y, workgroups_z);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_size() {
        assert_eq!(
            std::mem::size_of::<ScatterParams>(),
            48,
            "ScatterParams must match the WGSL uniform layout"
        );
    }

    #[test]
    fn test_params_default_matches_settings() {
        let params = ScatterParams::default();
        assert_eq!(params.resolution, [160, 90, 128]);
        assert_eq!(params.dither_size, DITHER_SIZE);
        assert!(params.temporal_strength >= 0.0 && params.temporal_strength <= 1.0);
    }
}
