//! Fog domain model: volumes, lights, proximity blending, and the
//! scene-wide fade that eases ambient fog between authored zones.

pub mod blend;
pub mod config;
pub mod global;
pub mod light;
pub mod volume;

pub use blend::{blend_volumes, ProximityBlend, ProximityObserver};
pub use config::FogSettings;
pub use global::{FogTargets, GlobalFogState};
pub use light::{FogLight, LightKind};
pub use volume::{FogKind, FogVolume};
