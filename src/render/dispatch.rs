//! Per-frame orchestration of the volumetric fog pass

use crate::core::error::Error;
use crate::core::types::Result;
use crate::fog::FogSettings;
use crate::render::buffer::CameraBuffer;
use crate::render::context::GpuContext;
use crate::render::graph::TaskGraph;
use crate::render::lifecycle::{FogResources, LifecycleState};
use crate::render::pipeline::{
    CompositeParams, CompositePipeline, RaymarchParams, RaymarchPipeline, ScatterParams,
    ScatterPipeline,
};
use crate::render::shadow::{resolve_shadow, ShadowSource};
use crate::render::snapshot::SnapshotBuilder;
use crate::scene::SceneContext;

/// Outcome of a [`FogRenderer::frame`] call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStatus {
    /// The fog pass ran and was composited into the target
    Rendered,
    /// Fog is stopped; nothing was recorded
    Inactive,
    /// A required input was missing this frame; nothing was recorded
    Skipped,
}

/// Volumetric fog renderer
///
/// Owns every GPU resource of the fog pass and drives the per-frame
/// sequence: snapshot the scene, upload, integrate, march, composite.
/// A frame that cannot run (no camera, allocation failure) is skipped
/// without touching the target; the next frame retries from scratch.
pub struct FogRenderer {
    settings: FogSettings,
    resources: FogResources,
    snapshot: SnapshotBuilder,
    camera: CameraBuffer,
    scatter: ScatterPipeline,
    raymarch: RaymarchPipeline,
    composite: CompositePipeline,
    time: f32,
}

impl FogRenderer {
    /// Create a fog renderer targeting the given color format
    ///
    /// Fails if the settings are invalid or the adapter cannot march the
    /// fog volume in place.
    pub fn new(
        gpu: &GpuContext,
        settings: FogSettings,
        target_format: wgpu::TextureFormat,
    ) -> Result<Self> {
        settings.validate()?;
        if !gpu.supports_inplace_raymarch() {
            return Err(Error::Gpu(
                "adapter does not support read-write storage access for rgba16float volumes"
                    .to_string(),
            ));
        }

        let resources = FogResources::new(&gpu.device);
        let camera = CameraBuffer::new(&gpu.device);
        let scatter = ScatterPipeline::new(&gpu.device, &camera, resources.scene().bind_group_layout());
        let raymarch = RaymarchPipeline::new(&gpu.device);
        let composite = CompositePipeline::new(&gpu.device, target_format);

        Ok(Self {
            settings,
            resources,
            snapshot: SnapshotBuilder::new(),
            camera,
            scatter,
            raymarch,
            composite,
            time: 0.0,
        })
    }

    /// Request a rebuild of all fog resources before the next frame
    pub fn start(&mut self) {
        self.resources.start();
    }

    /// Suspend fog rendering until the next [`FogRenderer::start`]
    pub fn stop(&mut self) {
        self.resources.stop();
    }

    pub fn state(&self) -> LifecycleState {
        self.resources.state()
    }

    pub fn settings(&self) -> &FogSettings {
        &self.settings
    }

    /// Replace the fog settings and schedule a resource rebuild
    pub fn set_settings(&mut self, settings: FogSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings;
        self.resources.start();
        Ok(())
    }

    /// Live GPU handles owned by the fog pass
    pub fn allocation_count(&self) -> usize {
        self.resources.allocation_count()
    }

    /// Record and submit one fog frame over `target`.
    ///
    /// `shadow` optionally supplies the host renderer's screen-space shadow
    /// mask; without one the fog is lit unshadowed.
    pub fn frame(
        &mut self,
        gpu: &GpuContext,
        scene: &SceneContext,
        shadow: Option<&dyn ShadowSource>,
        target: &wgpu::TextureView,
        dt: f32,
    ) -> FrameStatus {
        match self.resources.state() {
            LifecycleState::Inactive => return FrameStatus::Inactive,
            LifecycleState::Refresh => {
                let light_count = scene.lights.len();
                let volume_count = scene.volumes.len();
                if let Err(err) = self.resources.refresh(&gpu.device, light_count, volume_count) {
                    log::warn!("fog refresh failed, skipping frame: {}", err);
                    return FrameStatus::Skipped;
                }
            }
            LifecycleState::Active => {}
        }

        self.time += dt;

        let Some(camera_uniform) = self.snapshot.build(scene) else {
            return FrameStatus::Skipped;
        };

        let resolution = self.settings.resolution();
        if let Err(err) = self.resources.ensure_texture_pair(&gpu.device, resolution) {
            log::warn!("fog volume allocation failed, skipping frame: {}", err);
            return FrameStatus::Skipped;
        }
        self.resources.ensure_dither(&gpu.device, &gpu.queue);
        self.resources.ensure_shadow_fallback(&gpu.device, &gpu.queue);

        // Entity buffer reallocation failure degrades to an empty scene as
        // long as an older bind group is still around to satisfy the layout.
        let mut light_count = self.snapshot.light_count();
        let mut volume_count = self.snapshot.volume_count();
        match self
            .resources
            .scene_mut()
            .ensure(&gpu.device, light_count as usize, volume_count as usize)
        {
            Ok(_) => {
                self.resources.scene_mut().upload(
                    &gpu.queue,
                    self.snapshot.lights(),
                    self.snapshot.volumes(),
                );
            }
            Err(err) => {
                if self.resources.scene().bind_group().is_some() {
                    log::warn!("fog entity buffers unavailable, rendering empty scene: {}", err);
                    light_count = 0;
                    volume_count = 0;
                } else {
                    log::warn!("fog entity buffers unavailable, skipping frame: {}", err);
                    return FrameStatus::Skipped;
                }
            }
        }

        self.camera.upload(&gpu.queue, &camera_uniform);

        let (Some(textures), Some(dither), Some(fallback)) = (
            self.resources.textures(),
            self.resources.dither(),
            self.resources.shadow_fallback(),
        ) else {
            return FrameStatus::Skipped;
        };
        let Some(scene_bind) = self.resources.scene().bind_group() else {
            return FrameStatus::Skipped;
        };

        let (shadows_enabled, shadow_view) = resolve_shadow(shadow, fallback);

        self.scatter.update_params(
            &gpu.queue,
            &ScatterParams {
                resolution: resolution.to_array(),
                time: self.time,
                jitter_distance: self.settings.jitter_distance,
                jitter_scale: self.settings.jitter_scale,
                temporal_strength: self.settings.temporal_strength,
                shadows_enabled: if shadows_enabled { 1 } else { 0 },
                light_count,
                volume_count,
                dither_size: dither.size(),
                view_distance: self.settings.view_distance,
            },
        );
        self.raymarch.update_params(
            &gpu.queue,
            &RaymarchParams {
                resolution: resolution.to_array(),
                _pad: 0,
            },
        );
        self.composite.update_params(
            &gpu.queue,
            &CompositeParams {
                fog_far: self.settings.view_distance,
                camera_far: camera_uniform.far,
                _pad: [0.0; 2],
            },
        );

        let scatter_input = self.scatter.create_input_bind_group(
            &gpu.device,
            textures.previous_view(),
            dither.view(),
            shadow_view,
        );
        let scatter_output = self
            .scatter
            .create_output_bind_group(&gpu.device, textures.current_view());
        let raymarch_volume = self
            .raymarch
            .create_volume_bind_group(&gpu.device, textures.current_view());
        let composite_bind = self
            .composite
            .create_bind_group(&gpu.device, textures.current_view());

        let scatter = &self.scatter;
        let raymarch = &self.raymarch;
        let composite = &self.composite;

        let mut graph = TaskGraph::new();
        let integrate = graph.add("fog_scatter", &[], |encoder| {
            scatter.dispatch(
                encoder,
                &scatter_input,
                scene_bind,
                &scatter_output,
                resolution,
                None,
            );
        });
        let march = graph.add("fog_raymarch", &[integrate], |encoder| {
            raymarch.dispatch(encoder, &raymarch_volume, resolution.x, resolution.y, None);
        });
        graph.add("fog_composite", &[march], |encoder| {
            composite.draw(encoder, target, &composite_bind, None);
        });

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("fog_frame_encoder"),
            });
        if let Err(err) = graph.execute(&mut encoder) {
            log::warn!("fog pass schedule rejected, skipping frame: {}", err);
            return FrameStatus::Skipped;
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));

        self.resources.swap_textures();
        FrameStatus::Rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::camera::Camera;
    use crate::fog::{FogKind, FogLight, FogVolume};
    use crate::scene::SceneContext;

    fn test_gpu() -> Option<GpuContext> {
        let gpu = GpuContext::new().expect("Failed to create GPU context");
        if !gpu.supports_inplace_raymarch() {
            eprintln!("skipping: adapter lacks read-write storage for the fog volume format");
            return None;
        }
        Some(gpu)
    }

    fn test_scene() -> SceneContext {
        let mut scene = SceneContext::new();

        let volume = scene.alloc_entity();
        scene.volumes.insert(
            volume,
            FogVolume {
                kind: FogKind::Global,
                density: 0.8,
                ..Default::default()
            },
        );

        let light = scene.alloc_entity();
        scene.lights.insert(light, FogLight::default());

        let camera = scene.alloc_entity();
        scene.cameras.insert(camera, Camera::default());
        scene.register_camera(camera);

        scene
    }

    fn small_settings() -> FogSettings {
        FogSettings {
            width: 32,
            height: 32,
            depth: 16,
            ..Default::default()
        }
    }

    fn test_target(device: &wgpu::Device, width: u32, height: u32) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fog_test_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    #[test]
    fn test_frame_renders_when_active() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let scene = test_scene();
        let (_, target) = test_target(&gpu.device, 64, 64);

        for _ in 0..3 {
            assert_eq!(
                renderer.frame(&gpu, &scene, None, &target, 0.016),
                FrameStatus::Rendered
            );
        }
        assert_eq!(renderer.state(), LifecycleState::Active);
    }

    #[test]
    fn test_stop_and_start_cycle() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let scene = test_scene();
        let (_, target) = test_target(&gpu.device, 64, 64);

        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Rendered
        );

        renderer.stop();
        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Inactive
        );
        assert_eq!(renderer.state(), LifecycleState::Inactive);

        renderer.start();
        assert_eq!(renderer.state(), LifecycleState::Refresh);
        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Rendered
        );
        assert_eq!(renderer.state(), LifecycleState::Active);
    }

    #[test]
    fn test_restart_does_not_leak_resources() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let scene = test_scene();
        let (_, target) = test_target(&gpu.device, 64, 64);

        renderer.frame(&gpu, &scene, None, &target, 0.016);
        let baseline = renderer.allocation_count();

        for _ in 0..3 {
            renderer.start();
            renderer.frame(&gpu, &scene, None, &target, 0.016);
        }
        assert_eq!(
            renderer.allocation_count(),
            baseline,
            "restart cycles must not accumulate GPU handles"
        );
    }

    #[test]
    fn test_missing_camera_skips_frame() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let (_, target) = test_target(&gpu.device, 64, 64);

        let mut scene = SceneContext::new();
        let volume = scene.alloc_entity();
        scene.volumes.insert(
            volume,
            FogVolume {
                kind: FogKind::Global,
                density: 0.8,
                ..Default::default()
            },
        );
        let camera = scene.alloc_entity();
        scene.cameras.insert(camera, Camera::default());
        scene.register_camera(camera);

        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Rendered
        );

        // The registered camera dying must skip the frame, not panic.
        scene.cameras.invalidate(camera);
        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Skipped
        );

        // A later frame with a valid camera recovers.
        let revived = scene.alloc_entity();
        scene.cameras.insert(revived, Camera::default());
        scene.register_camera(revived);
        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Rendered
        );
    }

    #[test]
    fn test_settings_change_resizes_volume() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let scene = test_scene();
        let (_, target) = test_target(&gpu.device, 64, 64);

        renderer.frame(&gpu, &scene, None, &target, 0.016);

        let resized = FogSettings {
            width: 40,
            height: 24,
            depth: 32,
            ..Default::default()
        };
        renderer.set_settings(resized).expect("settings are valid");
        assert_eq!(renderer.state(), LifecycleState::Refresh);
        assert_eq!(
            renderer.frame(&gpu, &scene, None, &target, 0.016),
            FrameStatus::Rendered
        );

        let textures = renderer.resources.textures().expect("volume pair allocated");
        assert_eq!(textures.resolution(), glam::UVec3::new(40, 24, 32));
    }

    #[test]
    fn test_frame_writes_fog_into_target() {
        let Some(gpu) = test_gpu() else { return };
        let mut renderer =
            FogRenderer::new(&gpu, small_settings(), wgpu::TextureFormat::Rgba8Unorm)
                .expect("Failed to create fog renderer");
        let scene = test_scene();
        let (texture, target) = test_target(&gpu.device, 64, 64);

        // A few frames let the temporal blend ramp the volume up.
        for _ in 0..4 {
            assert_eq!(
                renderer.frame(&gpu, &scene, None, &target, 0.016),
                FrameStatus::Rendered
            );
        }

        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("fog_test_readback"),
            size: 64 * 64 * 4,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(64 * 4),
                    rows_per_image: None,
                },
            },
            wgpu::Extent3d {
                width: 64,
                height: 64,
                depth_or_array_layers: 1,
            },
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .ok();
        rx.recv()
            .expect("map callback dropped")
            .expect("Failed to map readback buffer");

        let data = slice.get_mapped_range();
        let fogged = data.chunks_exact(4).any(|px| px[3] > 0);
        assert!(fogged, "dense global fog must composite nonzero coverage");
    }
}
