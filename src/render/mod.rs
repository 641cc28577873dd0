//! GPU rendering: context, resources, pipelines and the fog frame loop

pub mod buffer;
pub mod context;
pub mod dispatch;
pub mod graph;
pub mod lifecycle;
pub mod pipeline;
pub mod shadow;
pub mod snapshot;
pub mod texture;

pub use context::GpuContext;
pub use dispatch::{FogRenderer, FrameStatus};
pub use graph::{TaskGraph, TaskId};
pub use lifecycle::{FogResources, LifecycleState, FOG_TEXTURE_TAG};
pub use shadow::{ShadowFallback, ShadowSource};
pub use snapshot::SnapshotBuilder;
