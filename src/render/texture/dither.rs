//! Dither pattern for breaking up froxel banding

use wgpu::{Device, Queue, Texture, TextureView};

/// Side length of the square dither texture in texels
pub const DITHER_SIZE: u32 = 64;

/// Interleaved gradient noise, Jimenez 2014. Returns a value in [0, 1).
pub fn interleaved_gradient_noise(x: u32, y: u32) -> f32 {
    let v = 52.982_92_f32 * (0.067_110_56 * x as f32 + 0.005_837_15 * y as f32).fract();
    v.fract()
}

/// Tiled screen-space dither texture sampled by the fog integration kernel
/// to decorrelate per-froxel jitter.
pub struct DitherTexture {
    texture: Texture,
    view: TextureView,
}

impl DitherTexture {
    /// Generate the pattern and upload it once
    pub fn new(device: &Device, queue: &Queue) -> Self {
        let mut data = vec![0u8; (DITHER_SIZE * DITHER_SIZE) as usize];
        for y in 0..DITHER_SIZE {
            for x in 0..DITHER_SIZE {
                let value = interleaved_gradient_noise(x, y);
                data[(y * DITHER_SIZE + x) as usize] = (value * 255.0).round() as u8;
            }
        }

        let size = wgpu::Extent3d {
            width: DITHER_SIZE,
            height: DITHER_SIZE,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fog_dither"),
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
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(DITHER_SIZE),
                rows_per_image: Some(DITHER_SIZE),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn size(&self) -> u32 {
        DITHER_SIZE
    }

    pub fn destroy(self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_in_unit_range() {
        for y in 0..DITHER_SIZE {
            for x in 0..DITHER_SIZE {
                let v = interleaved_gradient_noise(x, y);
                assert!((0.0..1.0).contains(&v), "noise({}, {}) = {} out of range", x, y, v);
            }
        }
    }

    #[test]
    fn test_noise_varies_between_neighbors() {
        // The pattern only breaks up banding if adjacent texels differ.
        let a = interleaved_gradient_noise(0, 0);
        let b = interleaved_gradient_noise(1, 0);
        let c = interleaved_gradient_noise(0, 1);
        assert!((a - b).abs() > 0.01);
        assert!((a - c).abs() > 0.01);
    }
}
