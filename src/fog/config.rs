//! Fog quality settings, serializable for presets

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::error::Error;
use crate::core::types::{Result, UVec3};

/// Froxel grid and march tuning for the volumetric pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogSettings {
    /// Froxel grid width in cells
    pub width: u32,
    /// Froxel grid height in cells
    pub height: u32,
    /// Froxel grid depth slices
    pub depth: u32,
    /// Distance in world units covered by the froxel grid
    pub view_distance: f32,
    /// World-space amplitude of the per-froxel sampling jitter
    pub jitter_distance: f32,
    /// Spatial frequency of the jitter pattern
    pub jitter_scale: f32,
    /// Previous-frame reprojection weight, 0 disables history
    pub temporal_strength: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            width: 160,             // ~12px per froxel at 1080p
            height: 90,
            depth: 128,
            view_distance: 70.0,    // world units
            jitter_distance: 2.0,
            jitter_scale: 3.1,
            temporal_strength: 0.75,
        }
    }
}

impl FogSettings {
    /// Froxel grid dimensions as a vector
    pub fn resolution(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Reject settings the dispatch path cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.depth == 0 {
            return Err(Error::Config(format!(
                "fog grid must be non-zero in every axis, got {}x{}x{}",
                self.width, self.height, self.depth
            )));
        }
        if self.view_distance <= 0.0 {
            return Err(Error::Config(format!(
                "fog view distance must be positive, got {}",
                self.view_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.temporal_strength) {
            return Err(Error::Config(format!(
                "temporal strength must be in [0, 1], got {}",
                self.temporal_strength
            )));
        }
        Ok(())
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize fog settings: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let settings: FogSettings = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("Failed to parse fog settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_valid() {
        let settings = FogSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.resolution(), UVec3::new(160, 90, 128));
    }

    #[test]
    fn test_validate_rejects_zero_axis() {
        let settings = FogSettings {
            depth: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_temporal_out_of_range() {
        let settings = FogSettings {
            temporal_strength: 1.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fog.json");

        let settings = FogSettings {
            width: 80,
            height: 45,
            depth: 64,
            view_distance: 120.0,
            ..Default::default()
        };
        settings.save(&path).unwrap();

        let loaded = FogSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fog.json");
        std::fs::write(&path, "{\"width\": 0").unwrap();
        assert!(FogSettings::load(&path).is_err());
    }
}
