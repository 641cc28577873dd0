//! Texture management for the fog volume

pub mod dither;
pub mod volume_pair;

pub use dither::{DitherTexture, DITHER_SIZE};
pub use volume_pair::{VolumeTexturePair, VOLUME_FORMAT};
