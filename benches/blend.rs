use criterion::{criterion_group, criterion_main, Criterion, black_box};

use aether::core::camera::Camera;
use aether::fog::{blend_volumes, FogKind, FogLight, FogVolume, GlobalFogState, ProximityObserver};
use aether::render::SnapshotBuilder;
use aether::scene::SceneContext;

use glam::Vec3;

fn ring_of_samples(count: usize) -> Vec<FogVolume> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            let radius = 5.0 + (i % 7) as f32 * 4.0;
            FogVolume {
                kind: FogKind::Sample,
                position: Vec3::new(angle.cos(), 0.0, angle.sin()) * radius,
                full_effect_radius: 6.0,
                falloff_radius: 14.0,
                ..Default::default()
            }
        })
        .collect()
}

fn bench_blend_volumes_8(c: &mut Criterion) {
    let volumes = ring_of_samples(8);
    let observer = ProximityObserver::default();

    c.bench_function("blend_volumes_8", |b| {
        b.iter(|| blend_volumes(black_box(&volumes), black_box(&observer)));
    });
}

fn bench_blend_volumes_64(c: &mut Criterion) {
    let volumes = ring_of_samples(64);
    let observer = ProximityObserver::default();

    c.bench_function("blend_volumes_64", |b| {
        b.iter(|| blend_volumes(black_box(&volumes), black_box(&observer)));
    });
}

fn bench_blend_volumes_512(c: &mut Criterion) {
    let volumes = ring_of_samples(512);
    let observer = ProximityObserver::default();

    c.bench_function("blend_volumes_512", |b| {
        b.iter(|| blend_volumes(black_box(&volumes), black_box(&observer)));
    });
}

fn bench_blend_factor(c: &mut Criterion) {
    let volume = FogVolume {
        kind: FogKind::Sample,
        full_effect_radius: 6.0,
        falloff_radius: 14.0,
        ..Default::default()
    };

    c.bench_function("blend_factor", |b| {
        let mut frame = 0u32;
        b.iter(|| {
            frame += 1;
            let point = Vec3::new((frame as f32 * 0.1).sin() * 20.0, 0.0, 0.0);
            black_box(volume.blend_factor(black_box(point)));
        });
    });
}

fn bench_global_fade_advance(c: &mut Criterion) {
    let mut scene = SceneContext::new();

    let driver = scene.alloc_entity();
    scene.volumes.insert(
        driver,
        FogVolume {
            kind: FogKind::Global,
            density: 0.05,
            ..Default::default()
        },
    );
    for volume in ring_of_samples(64) {
        let id = scene.alloc_entity();
        scene.volumes.insert(id, volume);
    }
    let observer = scene.alloc_entity();
    scene.set_observer(observer, ProximityObserver::default());

    let mut state = GlobalFogState::new(driver);

    c.bench_function("global_fade_advance_64", |b| {
        b.iter(|| {
            state.advance(black_box(&mut scene), black_box(1.0 / 60.0));
        });
    });
}

fn bench_snapshot_build(c: &mut Criterion) {
    let mut scene = SceneContext::new();

    for volume in ring_of_samples(128) {
        let id = scene.alloc_entity();
        scene.volumes.insert(id, volume);
    }
    for i in 0..32 {
        let id = scene.alloc_entity();
        scene.lights.insert(
            id,
            FogLight {
                position: Vec3::new(i as f32 * 3.0, 2.0, 0.0),
                ..Default::default()
            },
        );
    }
    let camera = scene.alloc_entity();
    scene.cameras.insert(camera, Camera::default());
    scene.register_camera(camera);

    let mut snapshot = SnapshotBuilder::new();

    c.bench_function("snapshot_build_128v_32l", |b| {
        b.iter(|| {
            let camera = snapshot.build(black_box(&scene));
            black_box(camera);
        });
    });
}

criterion_group!(
    benches,
    bench_blend_volumes_8,
    bench_blend_volumes_64,
    bench_blend_volumes_512,
    bench_blend_factor,
    bench_global_fade_advance,
    bench_snapshot_build,
);
criterion_main!(benches);
