//! GPU pipelines for the fog pass

mod composite;
mod raymarch;
mod scatter;

pub use composite::{CompositeParams, CompositePipeline};
pub use raymarch::{RaymarchParams, RaymarchPipeline};
pub use scatter::{ScatterParams, ScatterPipeline};
