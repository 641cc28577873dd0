//! Camera-centric volumetric fog for wgpu renderers
//!
//! A froxel volume is integrated over the scene's fog volumes and lights,
//! ray marched front to back, then composited over the host's color target.
//! Scene-wide fog continuously fades toward whichever sample volumes
//! surround the observer, so walking between regions reshades the world
//! without visible switches.

pub mod core;
pub mod fog;
pub mod render;
pub mod scene;

pub use crate::core::error::Error;
pub use crate::core::types::Result;
pub use fog::{FogKind, FogLight, FogSettings, FogVolume, GlobalFogState};
pub use render::{FogRenderer, FrameStatus, GpuContext, ShadowSource};
pub use scene::{EntityId, SceneContext};
