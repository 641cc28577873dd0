//! Shadow map access contract between the host renderer and the fog pass

use wgpu::{Device, Queue, Texture, TextureView};

/// Capability a host renderer implements to feed its shadow map into the
/// fog integration kernel. The kernel samples the map as a plain float
/// texture where 1.0 means fully lit.
pub trait ShadowSource {
    /// Whether a usable shadow map exists this frame
    fn shadows_available(&self) -> bool;

    /// The shadow map view, if one exists. Returning None while
    /// `shadows_available` is true is treated as unavailable.
    fn shadow_view(&self) -> Option<&TextureView>;
}

/// All-white 1x1 texture bound in place of a missing shadow map so the
/// kernel's sampling contract holds without a shadow pass.
pub struct ShadowFallback {
    texture: Texture,
    view: TextureView,
}

impl ShadowFallback {
    pub fn new(device: &Device, queue: &Queue) -> Self {
        let size = wgpu::Extent3d {
            width: 1,
            height: 1,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fog_shadow_fallback"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &[255u8],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(1),
                rows_per_image: Some(1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn destroy(self) {
        self.texture.destroy();
    }
}

/// Resolve the shadow binding for this frame: the host's map when it is
/// actually available, the fallback otherwise. The flag tells the kernel
/// whether occlusion sampling is meaningful.
pub fn resolve_shadow<'a>(
    source: Option<&'a dyn ShadowSource>,
    fallback: &'a ShadowFallback,
) -> (bool, &'a TextureView) {
    match source {
        Some(source) if source.shadows_available() => match source.shadow_view() {
            Some(view) => (true, view),
            None => (false, fallback.view()),
        },
        _ => (false, fallback.view()),
    }
}
