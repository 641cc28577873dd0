//! Ownership and refresh protocol for the fog pipeline's GPU resources

use crate::core::error::Error;
use crate::core::types::{Result, UVec3};
use crate::render::buffer::SceneBuffers;
use crate::render::shadow::ShadowFallback;
use crate::render::texture::{DitherTexture, VolumeTexturePair};

/// Tag stamped on volume textures this manager creates. Disposal destroys
/// only textures carrying it; substituted textures are merely released.
pub const FOG_TEXTURE_TAG: &str = "aether_fog_volume";

/// Pipeline activity state, driven by external start/stop signals
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// Fog rendering fully suspended
    Inactive,
    /// Resources are rebuilt on the next frame, which then renders
    Refresh,
    /// Rendering every frame
    Active,
}

/// Owner of every GPU resource behind the fog pipeline: the entity array
/// buffers, the double-buffered volume textures, and the small static
/// textures the integration kernel samples.
///
/// Buffers are recreated eagerly by [`refresh`]; textures are allocated
/// lazily by the `ensure_*` calls so a failed allocation one frame is
/// retried the next.
///
/// [`refresh`]: FogResources::refresh
pub struct FogResources {
    state: LifecycleState,
    scene: SceneBuffers,
    textures: Option<VolumeTexturePair>,
    dither: Option<DitherTexture>,
    shadow_fallback: Option<ShadowFallback>,
}

impl FogResources {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            state: LifecycleState::Active,
            scene: SceneBuffers::new(device),
            textures: None,
            dither: None,
            shadow_fallback: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Arm a one-shot resource rebuild, then rendering resumes
    pub fn start(&mut self) {
        self.state = LifecycleState::Refresh;
    }

    /// Suspend fog rendering. Owned resources stay valid, merely unused.
    pub fn stop(&mut self) {
        self.state = LifecycleState::Inactive;
    }

    /// Dispose everything, then recreate the entity buffers sized to the
    /// current live counts. Volume textures are recreated lazily by the
    /// next `ensure_texture_pair`. Idempotent: a second call produces the
    /// same buffer sizes and no extra live handles.
    pub fn refresh(
        &mut self,
        device: &wgpu::Device,
        light_count: usize,
        volume_count: usize,
    ) -> Result<()> {
        self.dispose();
        self.scene.ensure(device, light_count, volume_count)?;
        self.state = LifecycleState::Active;
        Ok(())
    }

    /// Allocate the ping-pong volume textures if missing or wrongly sized
    pub fn ensure_texture_pair(&mut self, device: &wgpu::Device, resolution: UVec3) -> Result<()> {
        if let Some(pair) = &self.textures {
            if pair.resolution() == resolution {
                return Ok(());
            }
            self.release_textures();
        }

        let limit = device.limits().max_texture_dimension_3d;
        if resolution.max_element() > limit {
            return Err(Error::Gpu(format!(
                "fog volume resolution {}x{}x{} exceeds 3D texture limit {}",
                resolution.x, resolution.y, resolution.z, limit
            )));
        }

        self.textures = Some(VolumeTexturePair::new(device, resolution, FOG_TEXTURE_TAG));
        Ok(())
    }

    /// Allocate and fill the dither texture on first use
    pub fn ensure_dither(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.dither.is_none() {
            self.dither = Some(DitherTexture::new(device, queue));
        }
    }

    /// Allocate the white shadow placeholder on first use
    pub fn ensure_shadow_fallback(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.shadow_fallback.is_none() {
            self.shadow_fallback = Some(ShadowFallback::new(device, queue));
        }
    }

    /// Replace the volume textures with a pair owned elsewhere. The old
    /// pair is destroyed only if this manager created it.
    pub fn adopt_textures(&mut self, pair: VolumeTexturePair) {
        self.release_textures();
        self.textures = Some(pair);
    }

    /// Release every owned resource. Safe to call when nothing is
    /// allocated; textures not carrying this manager's tag are dropped
    /// without being destroyed.
    pub fn dispose(&mut self) {
        self.scene.dispose();
        self.release_textures();
        if let Some(dither) = self.dither.take() {
            dither.destroy();
        }
        if let Some(fallback) = self.shadow_fallback.take() {
            fallback.destroy();
        }
    }

    fn release_textures(&mut self) {
        if let Some(pair) = self.textures.take() {
            if pair.tag() == FOG_TEXTURE_TAG {
                pair.destroy();
            }
        }
    }

    pub fn scene(&self) -> &SceneBuffers {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut SceneBuffers {
        &mut self.scene
    }

    pub fn textures(&self) -> Option<&VolumeTexturePair> {
        self.textures.as_ref()
    }

    /// End-of-frame role swap: `current` becomes next frame's `previous`
    pub fn swap_textures(&mut self) {
        if let Some(pair) = &mut self.textures {
            pair.swap();
        }
    }

    pub fn dither(&self) -> Option<&DitherTexture> {
        self.dither.as_ref()
    }

    pub fn shadow_fallback(&self) -> Option<&ShadowFallback> {
        self.shadow_fallback.as_ref()
    }

    /// Number of live GPU objects this manager has allocated and not yet
    /// released, for leak accounting in tests. Adopted textures are not
    /// counted because this manager did not create them.
    pub fn allocation_count(&self) -> usize {
        let own_textures = match &self.textures {
            Some(pair) if pair.tag() == FOG_TEXTURE_TAG => 2,
            _ => 0,
        };
        self.scene.allocation_count()
            + own_textures
            + self.dither.is_some() as usize
            + self.shadow_fallback.is_some() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_device() -> (wgpu::Device, wgpu::Queue) {
        device_with_limits(wgpu::Limits::default())
    }

    fn device_with_limits(limits: wgpu::Limits) -> (wgpu::Device, wgpu::Queue) {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .expect("Failed to find adapter");

        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("test_device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: Default::default(),
            trace: Default::default(),
        }))
        .expect("Failed to create device")
    }

    #[test]
    fn test_starts_active_and_signals_transition() {
        let (device, _queue) = test_device();
        let mut resources = FogResources::new(&device);
        assert_eq!(resources.state(), LifecycleState::Active);

        resources.start();
        assert_eq!(resources.state(), LifecycleState::Refresh);
        resources.stop();
        assert_eq!(resources.state(), LifecycleState::Inactive);
        resources.start();
        assert_eq!(resources.state(), LifecycleState::Refresh);
    }

    #[test]
    fn test_refresh_twice_is_idempotent() {
        let (device, queue) = test_device();
        let mut resources = FogResources::new(&device);
        resources.ensure_dither(&device, &queue);
        resources.ensure_texture_pair(&device, UVec3::new(8, 8, 8)).unwrap();

        resources.refresh(&device, 3, 2).unwrap();
        let lights = resources.scene().light_capacity();
        let volumes = resources.scene().volume_capacity();
        let live = resources.allocation_count();
        assert_eq!((lights, volumes), (3, 2));
        assert_eq!(resources.state(), LifecycleState::Active);

        resources.refresh(&device, 3, 2).unwrap();
        assert_eq!(resources.scene().light_capacity(), lights);
        assert_eq!(resources.scene().volume_capacity(), volumes);
        assert_eq!(resources.allocation_count(), live, "second refresh leaked handles");
    }

    #[test]
    fn test_zero_entities_still_get_capacity_one() {
        let (device, _queue) = test_device();
        let mut resources = FogResources::new(&device);
        resources.refresh(&device, 0, 0).unwrap();
        assert_eq!(resources.scene().light_capacity(), 1);
        assert_eq!(resources.scene().volume_capacity(), 1);
    }

    #[test]
    fn test_texture_pair_lazy_allocation_and_resize() {
        let (device, _queue) = test_device();
        let mut resources = FogResources::new(&device);
        assert!(resources.textures().is_none());

        resources.ensure_texture_pair(&device, UVec3::new(16, 8, 8)).unwrap();
        assert_eq!(resources.allocation_count(), 2);

        // Same resolution keeps the pair.
        resources.ensure_texture_pair(&device, UVec3::new(16, 8, 8)).unwrap();
        assert_eq!(resources.allocation_count(), 2);

        // A resolution change replaces it.
        resources.ensure_texture_pair(&device, UVec3::new(32, 8, 8)).unwrap();
        assert_eq!(resources.allocation_count(), 2);
        let pair = resources.textures().expect("pair must exist");
        assert_eq!(pair.resolution(), UVec3::new(32, 8, 8));
    }

    #[test]
    fn test_oversized_texture_request_is_reported() {
        let (device, _queue) = device_with_limits(wgpu::Limits {
            max_texture_dimension_3d: 64,
            ..Default::default()
        });
        let mut resources = FogResources::new(&device);
        let result = resources.ensure_texture_pair(&device, UVec3::new(128, 8, 8));
        assert!(result.is_err());
        assert!(resources.textures().is_none());

        // Failure leaves the manager usable; a smaller request succeeds.
        resources.ensure_texture_pair(&device, UVec3::new(32, 8, 8)).unwrap();
        assert!(resources.textures().is_some());
    }

    #[test]
    fn test_dispose_safe_when_empty() {
        let (device, _queue) = test_device();
        let mut resources = FogResources::new(&device);
        resources.dispose();
        resources.dispose();
        assert_eq!(resources.allocation_count(), 0);
    }

    #[test]
    fn test_adopted_textures_are_released_not_destroyed() {
        let (device, _queue) = test_device();
        let mut resources = FogResources::new(&device);
        resources.ensure_texture_pair(&device, UVec3::new(8, 8, 8)).unwrap();
        assert_eq!(resources.allocation_count(), 2);

        let external = VolumeTexturePair::new(&device, UVec3::new(8, 8, 8), "external_volume");
        resources.adopt_textures(external);
        assert_eq!(resources.allocation_count(), 0, "adopted pair is not ours to count");
        assert!(resources.textures().is_some());

        resources.dispose();
        assert!(resources.textures().is_none());
    }
}
