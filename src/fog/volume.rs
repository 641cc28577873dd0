//! Fog volume scene entities

use crate::core::types::Vec3;

/// Spatial behavior of a fog volume
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FogKind {
    /// Scene-wide ambient fog, unbounded
    #[default]
    Global,
    /// Fog bounded by the volume's box extents
    Local,
    /// Distance-falloff fog blended around the observer
    Sample,
}

impl FogKind {
    /// Kind code used in the GPU snapshot record
    pub fn code(self) -> u32 {
        match self {
            FogKind::Global => 0,
            FogKind::Local => 1,
            FogKind::Sample => 2,
        }
    }
}

/// A scene entity carrying fog appearance and density parameters.
///
/// The falloff fields (`full_effect_radius`, `falloff_radius`,
/// `effect_scalar`) only have meaning for [`FogKind::Sample`] volumes.
#[derive(Clone, Debug)]
pub struct FogVolume {
    pub kind: FogKind,
    /// World position of the volume center
    pub position: Vec3,
    /// Facing axis, used for the secondary-color blend
    pub forward: Vec3,
    /// Box extents for `Local` volumes
    pub size: Vec3,
    /// Primary fog color (linear RGB)
    pub color: Vec3,
    /// Color shown when the observer faces opposite the volume's facing
    pub secondary_color: Vec3,
    /// Volumetric fog density (0-1)
    pub density: f32,
    /// Scatter coefficient (0-1)
    pub scatter: f32,
    /// Density for the scene-wide scalar fog driven by this volume
    pub ambient_density: f32,
    /// Radius within which the effect is at full strength
    pub full_effect_radius: f32,
    /// Radius beyond which the effect falls off to zero
    pub falloff_radius: f32,
    /// Overall strength modifier for `Sample` contributions (0-1)
    pub effect_scalar: f32,
}

impl Default for FogVolume {
    fn default() -> Self {
        Self {
            kind: FogKind::Global,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            size: Vec3::ONE,
            color: Vec3::ONE,
            secondary_color: Vec3::ONE,
            density: 0.1,
            scatter: 0.9,
            ambient_density: 0.01,
            full_effect_radius: 5.0,
            falloff_radius: 10.0,
            effect_scalar: 1.0,
        }
    }
}

impl FogVolume {
    /// Blend factor (0 to `effect_scalar`) for a point, from the linear
    /// falloff between `full_effect_radius` and `falloff_radius`.
    pub fn blend_factor(&self, point: Vec3) -> f32 {
        let distance = self.position.distance(point);
        let falloff = if distance <= self.full_effect_radius {
            1.0
        } else if distance >= self.falloff_radius {
            0.0
        } else {
            1.0 - (distance - self.full_effect_radius) / (self.falloff_radius - self.full_effect_radius)
        };
        falloff * self.effect_scalar
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_codes() {
        assert_eq!(FogKind::Global.code(), 0);
        assert_eq!(FogKind::Local.code(), 1);
        assert_eq!(FogKind::Sample.code(), 2);
    }

    #[test]
    fn test_blend_factor_regions() {
        let volume = FogVolume {
            kind: FogKind::Sample,
            position: Vec3::ZERO,
            full_effect_radius: 5.0,
            falloff_radius: 10.0,
            effect_scalar: 1.0,
            ..Default::default()
        };

        assert_eq!(volume.blend_factor(Vec3::new(2.0, 0.0, 0.0)), 1.0);
        assert_eq!(volume.blend_factor(Vec3::new(5.0, 0.0, 0.0)), 1.0);
        assert_eq!(volume.blend_factor(Vec3::new(10.0, 0.0, 0.0)), 0.0);
        assert_eq!(volume.blend_factor(Vec3::new(25.0, 0.0, 0.0)), 0.0);

        let mid = volume.blend_factor(Vec3::new(7.5, 0.0, 0.0));
        assert!((mid - 0.5).abs() < 1e-6, "midpoint blend should be 0.5, got {}", mid);
    }

    #[test]
    fn test_blend_factor_scaled_by_effect_scalar() {
        let volume = FogVolume {
            kind: FogKind::Sample,
            effect_scalar: 0.25,
            ..Default::default()
        };
        assert!((volume.blend_factor(Vec3::ZERO) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_default_radii_ordered() {
        let volume = FogVolume::default();
        assert!(volume.full_effect_radius < volume.falloff_radius);
    }
}
