//! Scene-wide fog state and the per-frame ambient fade

use crate::core::types::Vec3;
use crate::fog::blend::{blend_volumes, ProximityBlend};
use crate::fog::volume::FogKind;
use crate::scene::{EntityId, SceneContext};

/// A full set of target fog parameters for the fade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FogTargets {
    pub color: Vec3,
    pub density: f32,
    pub scatter: f32,
    pub ambient_density: f32,
}

impl FogTargets {
    pub const ZERO: Self = Self {
        color: Vec3::ZERO,
        density: 0.0,
        scatter: 0.0,
        ambient_density: 0.0,
    };
}

impl From<ProximityBlend> for FogTargets {
    fn from(blend: ProximityBlend) -> Self {
        Self {
            color: blend.color,
            density: blend.density,
            scatter: blend.scatter,
            ambient_density: blend.ambient_density,
        }
    }
}

/// Current vs. default fog parameters for the scene-wide fog setting.
///
/// Bound to one driver volume (the `Global` volume whose live parameters the
/// fade writes back into). Defaults are captured from the driver and the
/// scene ambient scalar exactly once, on the first [`advance`] call, and
/// never recomputed.
///
/// [`advance`]: GlobalFogState::advance
#[derive(Clone, Debug)]
pub struct GlobalFogState {
    driver: EntityId,
    current: FogTargets,
    defaults: Option<FogTargets>,
    inert: bool,
}

impl GlobalFogState {
    /// Create the state bound to the driver volume's entity id
    pub fn new(driver: EntityId) -> Self {
        Self {
            driver,
            current: FogTargets::ZERO,
            defaults: None,
            inert: false,
        }
    }

    /// The driver volume's entity id
    pub fn driver(&self) -> EntityId {
        self.driver
    }

    /// Current eased parameters
    pub fn current(&self) -> &FogTargets {
        &self.current
    }

    /// Defaults captured at first activation, if captured yet
    pub fn defaults(&self) -> Option<&FogTargets> {
        self.defaults.as_ref()
    }

    /// Whether a missing or wrong-kind driver has permanently disabled the fade
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    /// Lerp every current field toward its target by `t`.
    ///
    /// `t` is expected to be `fade_speed * dt`; values outside [0, 1] are
    /// accepted and overshoot rather than clamping.
    pub fn fade_to(&mut self, target: &FogTargets, t: f32) {
        self.current.color = self.current.color.lerp(target.color, t);
        self.current.density = lerp(self.current.density, target.density, t);
        self.current.scatter = lerp(self.current.scatter, target.scatter, t);
        self.current.ambient_density = lerp(self.current.ambient_density, target.ambient_density, t);
    }

    /// Per-frame ambient update: blend `Sample` volumes around the active
    /// observer, fall back to the captured defaults when none contribute,
    /// ease toward the result, and write it back into the driver volume and
    /// the scene ambient scalar.
    ///
    /// A missing driver volume (or one that is neither `Global` nor `Sample`
    /// kind) is reported once, after which the state is permanently inert.
    pub fn advance(&mut self, scene: &mut SceneContext, dt: f32) {
        if self.inert {
            return;
        }

        let Some(volume) = scene.volumes.get(self.driver) else {
            log::error!(
                "ambient fog driver volume {:?} not found; fading disabled",
                self.driver
            );
            self.inert = true;
            return;
        };
        if !matches!(volume.kind, FogKind::Global | FogKind::Sample) {
            log::error!(
                "ambient fog driver volume {:?} must be Global or Sample kind; fading disabled",
                self.driver
            );
            self.inert = true;
            return;
        }

        if self.defaults.is_none() {
            let defaults = FogTargets {
                color: volume.color,
                density: volume.density,
                scatter: volume.scatter,
                ambient_density: scene.ambient_density,
            };
            self.defaults = Some(defaults);
            self.current = defaults;
        }

        let Some(observer) = scene.observer().copied() else {
            return;
        };

        let defaults = self.defaults.unwrap_or(FogTargets::ZERO);
        let target = blend_volumes(scene.volumes.iter(), &observer)
            .map(FogTargets::from)
            .unwrap_or(defaults);

        self.fade_to(&target, observer.fade_speed * dt);

        if let Some(volume) = scene.volumes.get_mut(self.driver) {
            volume.color = self.current.color;
            volume.density = self.current.density;
            volume.scatter = self.current.scatter;
        }
        scene.ambient_density = self.current.ambient_density;
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
