//! Light scene entities consumed by the fog integration pass

use crate::core::types::Vec3;

/// Light source categories understood by the scatter kernel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LightKind {
    #[default]
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Kind code used in the GPU snapshot record
    pub fn code(self) -> u32 {
        match self {
            LightKind::Directional => 0,
            LightKind::Point => 1,
            LightKind::Spot => 2,
        }
    }
}

/// A light participating in fog in-scattering
#[derive(Clone, Debug)]
pub struct FogLight {
    pub kind: LightKind,
    /// World position (ignored for directional lights)
    pub position: Vec3,
    /// Emission direction (directional and spot)
    pub direction: Vec3,
    /// Light color (linear RGB)
    pub color: Vec3,
    pub intensity: f32,
    /// Influence radius for point and spot lights
    pub range: f32,
    /// Full cone angle in radians (spot only)
    pub spot_angle: f32,
}

impl Default for FogLight {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            position: Vec3::ZERO,
            direction: Vec3::NEG_Y,
            color: Vec3::ONE,
            intensity: 1.0,
            range: 10.0,
            spot_angle: 30.0_f32.to_radians(),
        }
    }
}
