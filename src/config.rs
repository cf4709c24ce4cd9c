//! Effect configuration.
//!
//! All knobs for a disintegration: particle budget, capture inset, session
//! duration, velocity ranges and the update strategy. Deserialisable from a
//! JSON file so the CLI and the viewer can share presets.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::animation::UpdateStrategy;

/// Inclusive sampling range for one velocity axis, in clip units per second.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VelocityRange {
    pub min: f32,
    pub max: f32,
}

impl VelocityRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Map a unit random value into this range.
    pub fn sample(&self, unit: f32) -> f32 {
        self.min + unit * (self.max - self.min)
    }
}

/// Configuration for one disintegration effect.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Requested upper bound on the particle count. The actual count is
    /// derived from tile area and only approximates this.
    pub max_tiles: u32,
    /// Margin in logical points applied to the captured region.
    pub inset: f32,
    /// Session duration in seconds; teardown fires on this, not on life.
    pub duration_secs: f32,
    /// Horizontal drift range. The default biases rightward.
    pub velocity_x: VelocityRange,
    /// Vertical drift range (clip space, Y up). The default biases slightly
    /// upward, so the effect reads as outward-and-up rather than radial.
    pub velocity_y: VelocityRange,
    /// Seed for the deterministic velocity RNG.
    pub seed: u64,
    /// Where per-frame position evaluation happens.
    pub strategy: UpdateStrategy,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            max_tiles: 50_000,
            inset: 20.0,
            duration_secs: 1.0,
            velocity_x: VelocityRange::new(0.05, 0.10),
            velocity_y: VelocityRange::new(-0.01, 0.03),
            seed: 0,
            strategy: UpdateStrategy::GpuUniform,
        }
    }
}

impl EffectConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let mut contents = String::new();
        File::open(path)
            .with_context(|| format!("failed to open config {:?}", path))?
            .read_to_string(&mut contents)?;
        let config: EffectConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants serde cannot express. A non-positive duration
    /// would make the life fade divide by zero.
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_secs > 0.0) {
            bail!(
                "duration_secs must be positive, got {}",
                self.duration_secs
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_velocity_ranges_match_drift_cone() {
        let config = EffectConfig::default();
        assert!(config.velocity_x.min > 0.0, "default drift is rightward");
        assert!(config.velocity_y.max > 0.0);
    }

    #[test]
    fn velocity_range_sample_endpoints() {
        let range = VelocityRange::new(-0.01, 0.03);
        assert!((range.sample(0.0) - -0.01).abs() < 1e-6);
        assert!((range.sample(1.0) - 0.03).abs() < 1e-6);
        assert!((range.sample(0.5) - 0.01).abs() < 1e-6);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EffectConfig = serde_json::from_str(r#"{"max_tiles": 2000}"#).unwrap();
        assert_eq!(config.max_tiles, 2000);
        assert!((config.duration_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        for duration in [0.0, -1.0, f32::NAN] {
            let config = EffectConfig {
                duration_secs: duration,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "duration {} must fail", duration);
        }
        assert!(EffectConfig::default().validate().is_ok());
    }

    #[test]
    fn loading_a_zero_duration_file_fails() {
        let dir = std::env::temp_dir();
        let path = dir.join("disintegrate_zero_duration.json");
        std::fs::write(&path, r#"{"duration_secs": 0.0}"#).unwrap();
        let result = EffectConfig::from_json_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }
}
