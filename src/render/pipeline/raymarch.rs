//! In-place fog volume ray march compute pipeline

use bytemuck::{Pod, Zeroable};

use crate::render::texture::VOLUME_FORMAT;

/// Ray march parameters
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct RaymarchParams {
    pub resolution: [u32; 3],
    pub _pad: u32,
}

impl Default for RaymarchParams {
    fn default() -> Self {
        Self {
            resolution: [160, 90, 128],
            _pad: 0,
        }
    }
}

/// Fog volume ray march compute pipeline
///
/// Marches front to back along each (x, y) column of the integrated fog
/// volume, replacing every slice in place with the radiance and opacity
/// accumulated up to that depth. Requires read-write storage access to
/// the volume's texture format.
pub struct RaymarchPipeline {
    pipeline: wgpu::ComputePipeline,
    params_buffer: wgpu::Buffer,
    #[allow(dead_code)]
    params_bind_group_layout: wgpu::BindGroupLayout,
    params_bind_group: wgpu::BindGroup,
    volume_bind_group_layout: wgpu::BindGroupLayout,
}

impl RaymarchPipeline {
    /// Create a new ray march pipeline
    pub fn new(device: &wgpu::Device) -> Self {
        // Load shader
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fog_raymarch_shader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../../shaders/fog_raymarch.wgsl").into(),
            ),
        });

        // Create params buffer
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fog_raymarch_params"),
            size: std::mem::size_of::<RaymarchParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // Bind group 0: Ray march params
        let params_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_raymarch_params_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_raymarch_params_bind_group"),
            layout: &params_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: params_buffer.as_entire_binding(),
            }],
        });

        // Bind group 1: Fog volume marched in place
        let volume_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("fog_raymarch_volume_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::ReadWrite,
                        format: VOLUME_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D3,
                    },
                    count: None,
                }],
            });

        // Create pipeline layout
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("fog_raymarch_pipeline_layout"),
            bind_group_layouts: &[&params_bind_group_layout, &volume_bind_group_layout],
            immediate_size: 0,
        });

        // Create compute pipeline
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("fog_raymarch_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            params_buffer,
            params_bind_group_layout,
            params_bind_group,
            volume_bind_group_layout,
        }
    }

    /// Create the bind group for the volume marched in place
    pub fn create_volume_bind_group(
        &self,
        device: &wgpu::Device,
        volume_view: &wgpu::TextureView,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fog_raymarch_volume_bind_group"),
            layout: &self.volume_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(volume_view),
            }],
        })
    }

    /// Update ray march parameters
    pub fn update_params(&self, queue: &wgpu::Queue, params: &RaymarchParams) {
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(params));
    }

    /// Dispatch the ray march compute shader, one thread per (x, y) column
    pub fn dispatch(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        volume_bind_group: &wgpu::BindGroup,
        width: u32,
        height: u32,
        timestamp_writes: Option<wgpu::ComputePassTimestampWrites<'_>>,
    ) {
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("fog_raymarch_pass"),
            timestamp_writes,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.params_bind_group, &[]);
        pass.set_bind_group(1, volume_bind_group, &[]);

        let workgroups_x = (width + 7) / 8;
        let workgroups_y = (height + 7) / 8;
        pass.dispatch_workgroups(workgroups_x, workgroups_y, 1);
    }
}
