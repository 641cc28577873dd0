//! Distance-and-facing-weighted blending of fog volume parameters
//!
//! The engine is a pure function over the current fog-volume set: every
//! `Sample` volume in range contributes its parameters weighted by the
//! distance falloff, and the weighted result drives the ambient fog fade.

use crate::core::types::Vec3;
use crate::fog::volume::{FogKind, FogVolume};

/// The point of interest fog is blended around, typically a moving player
/// or camera rig.
#[derive(Clone, Copy, Debug)]
pub struct ProximityObserver {
    pub position: Vec3,
    pub forward: Vec3,
    /// Fade rate in units of blend-per-second, multiplied by frame delta
    pub fade_speed: f32,
}

impl Default for ProximityObserver {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            fade_speed: 1.0,
        }
    }
}

/// Result of blending all in-range `Sample` volumes.
///
/// `color`, `scatter` and `ambient_density` are weighted averages; `density`
/// is the raw weighted sum so that overlapping volumes stack. Dividing it by
/// `weight` would cancel the per-volume `effect_scalar` reduction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProximityBlend {
    pub color: Vec3,
    pub density: f32,
    pub scatter: f32,
    pub ambient_density: f32,
    /// Sum of all contributing blend factors
    pub weight: f32,
}

/// Blend every in-range `Sample` volume around the observer.
///
/// Returns `None` when no volume contributes (the caller falls back to its
/// default parameters). Deterministic in its inputs; volume order does not
/// affect the result.
pub fn blend_volumes<'a>(
    volumes: impl IntoIterator<Item = &'a FogVolume>,
    observer: &ProximityObserver,
) -> Option<ProximityBlend> {
    let mut color = Vec3::ZERO;
    let mut density = 0.0;
    let mut scatter = 0.0;
    let mut ambient_density = 0.0;
    let mut weight = 0.0;

    for volume in volumes {
        if volume.kind != FogKind::Sample {
            continue;
        }

        let blend = volume.blend_factor(observer.position);
        if blend <= 0.0 {
            continue;
        }

        // Remap the facing dot product from [-1, 1] to [0, 1] and pick the
        // effective color between the secondary and primary.
        let dot = volume.forward.dot(observer.forward);
        let facing = (dot + 1.0) / 2.0;
        let effective_color = volume.secondary_color.lerp(volume.color, facing);

        color += effective_color * blend;
        density += volume.density * blend;
        scatter += volume.scatter * blend;
        ambient_density += volume.ambient_density * blend;
        weight += blend;
    }

    if weight > 0.0 {
        Some(ProximityBlend {
            color: color / weight,
            density,
            scatter: scatter / weight,
            ambient_density: ambient_density / weight,
            weight,
        })
    } else {
        None
    }
}
