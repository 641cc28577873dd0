//! Headless fog demo — renders fog frames offscreen and reports coverage.
//!
//! Walks an observer back and forth between two sample fog regions so the
//! scene-wide fog continuously refades, then reads the final frame back.
//!
//! Usage: cargo run --release --bin fog_headless -- [OPTIONS]
//!
//! Options:
//!   --frames <N>      Frames to render (default: 120)
//!   --width <W>       Target width in pixels (default: 640)
//!   --height <H>      Target height in pixels (default: 360)
//!   --config <PATH>   Load fog settings from a JSON file

use std::path::PathBuf;

use glam::Vec3;

use aether::core::camera::Camera;
use aether::fog::{
    FogKind, FogLight, FogSettings, FogVolume, GlobalFogState, LightKind, ProximityObserver,
};
use aether::render::{FogRenderer, FrameStatus, GpuContext};
use aether::scene::{EntityId, SceneContext};

fn main() {
    aether::core::logging::init();

    let args: Vec<String> = std::env::args().collect();
    let frames = parse_usize_arg(&args, "--frames").unwrap_or(120);
    let width = parse_u32_arg(&args, "--width").unwrap_or(640);
    let height = parse_u32_arg(&args, "--height").unwrap_or(360);
    let settings = match parse_str_arg(&args, "--config") {
        Some(path) => {
            FogSettings::load(&PathBuf::from(path)).expect("Failed to load fog settings")
        }
        None => FogSettings::default(),
    };

    println!("=== Aether Headless Fog ===");
    println!(
        "Volume: {}x{}x{} froxels, {}m deep",
        settings.width, settings.height, settings.depth, settings.view_distance
    );
    println!("Target: {}x{}", width, height);
    println!("Frames: {}", frames);
    println!();

    let gpu = GpuContext::new().expect("Failed to create GPU context");
    let mut renderer = FogRenderer::new(&gpu, settings, wgpu::TextureFormat::Rgba8Unorm)
        .expect("Failed to create fog renderer");

    let (mut scene, driver, observer) = build_scene();
    let mut fog_state = GlobalFogState::new(driver);

    let target = gpu.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("fog_demo_target"),
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
    let target_view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let dt = 1.0 / 60.0;
    let mut rendered = 0usize;
    for frame in 0..frames {
        let t = frame as f32 * dt;

        // Drift between the warm hollow at +x and the cold basin at -x.
        let position = Vec3::new((t * 0.25).sin() * 35.0, 1.6, 0.0);
        scene.set_observer(
            observer,
            ProximityObserver {
                position,
                forward: Vec3::NEG_Z,
                fade_speed: 1.5,
            },
        );

        fog_state.advance(&mut scene, dt);

        match renderer.frame(&gpu, &scene, None, &target_view, dt) {
            FrameStatus::Rendered => rendered += 1,
            status => log::warn!("frame {} not rendered: {:?}", frame, status),
        }
    }

    let coverage = read_coverage(&gpu, &target, width, height);
    println!("Rendered {}/{} frames", rendered, frames);
    println!("Final fog coverage: {:.1}%", coverage * 100.0);
}

/// A small scene: global driver fog, two sample regions, a lit local bank.
fn build_scene() -> (SceneContext, EntityId, EntityId) {
    let mut scene = SceneContext::new();

    let driver = scene.alloc_entity();
    scene.volumes.insert(
        driver,
        FogVolume {
            kind: FogKind::Global,
            color: Vec3::new(0.7, 0.75, 0.8),
            density: 0.08,
            scatter: 0.9,
            ambient_density: 0.01,
            ..Default::default()
        },
    );

    let hollow = scene.alloc_entity();
    scene.volumes.insert(
        hollow,
        FogVolume {
            kind: FogKind::Sample,
            position: Vec3::new(30.0, 0.0, 0.0),
            color: Vec3::new(0.9, 0.5, 0.3),
            secondary_color: Vec3::new(0.6, 0.3, 0.2),
            density: 0.25,
            scatter: 0.8,
            ambient_density: 0.04,
            full_effect_radius: 10.0,
            falloff_radius: 25.0,
            ..Default::default()
        },
    );

    let basin = scene.alloc_entity();
    scene.volumes.insert(
        basin,
        FogVolume {
            kind: FogKind::Sample,
            position: Vec3::new(-30.0, 0.0, 0.0),
            color: Vec3::new(0.4, 0.55, 0.9),
            secondary_color: Vec3::new(0.3, 0.4, 0.7),
            density: 0.18,
            scatter: 0.95,
            ambient_density: 0.03,
            full_effect_radius: 10.0,
            falloff_radius: 25.0,
            ..Default::default()
        },
    );

    let bank = scene.alloc_entity();
    scene.volumes.insert(
        bank,
        FogVolume {
            kind: FogKind::Local,
            position: Vec3::new(0.0, 1.0, -20.0),
            size: Vec3::new(12.0, 4.0, 12.0),
            color: Vec3::ONE,
            density: 0.5,
            scatter: 0.85,
            ..Default::default()
        },
    );

    let sun = scene.alloc_entity();
    scene.lights.insert(
        sun,
        FogLight {
            kind: LightKind::Directional,
            direction: Vec3::new(-0.3, -1.0, -0.2).normalize(),
            color: Vec3::new(1.0, 0.95, 0.85),
            intensity: 1.2,
            ..Default::default()
        },
    );

    let lamp = scene.alloc_entity();
    scene.lights.insert(
        lamp,
        FogLight {
            kind: LightKind::Point,
            position: Vec3::new(0.0, 3.0, -20.0),
            color: Vec3::new(1.0, 0.7, 0.4),
            intensity: 4.0,
            range: 18.0,
            ..Default::default()
        },
    );

    let camera = scene.alloc_entity();
    scene.cameras.insert(
        camera,
        Camera::new(Vec3::new(0.0, 1.6, 10.0), 60.0, 16.0 / 9.0),
    );
    scene.register_camera(camera);

    let observer = scene.alloc_entity();
    scene.set_observer(observer, ProximityObserver::default());

    (scene, driver, observer)
}

/// Mean alpha of the target, read back through a staging buffer.
fn read_coverage(gpu: &GpuContext, target: &wgpu::Texture, width: u32, height: u32) -> f32 {
    let bytes_per_row = (width * 4 + 255) / 256 * 256;
    let buffer = gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("fog_demo_readback"),
        size: (bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: target,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: None,
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
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
    let mut total = 0u64;
    for row in 0..height {
        let start = (row * bytes_per_row) as usize;
        let end = start + (width * 4) as usize;
        total += data[start..end]
            .chunks_exact(4)
            .map(|px| px[3] as u64)
            .sum::<u64>();
    }
    total as f32 / (width as f32 * height as f32 * 255.0)
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_usize_arg(args: &[String], flag: &str) -> Option<usize> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.clone())
}
