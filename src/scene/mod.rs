//! Scene-side registration of fog entities

pub mod context;
pub mod pool;

pub use context::SceneContext;
pub use pool::{EntityId, EntityPool};
