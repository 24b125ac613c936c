//! User-tunable tracking configuration, loaded from YAML.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::hand::PINCH_THRESHOLD;
use crate::tracking::{CombinerParams, DEADZONE, SmootherSettings};

/// Upper bound on the autorotate speed, in percent.
pub const MAX_AUTO_ROTATE_SPEED: u8 = 100;

/// Default proximity radius for labelling sub-parts, in world units.
pub const DEFAULT_LABEL_RADIUS: f64 = 1.5;

/// Configuration for a tracking session.
///
/// Missing YAML keys take their default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Rotate the object about y while a hand is visible.
    pub auto_rotate_enabled: bool,

    /// Autorotate speed in percent (`0..=100`).
    pub auto_rotate_speed_percent: u8,

    /// Object scale while visible with no zoom.
    pub base_object_scale: f64,

    /// Thumb-tip to index-tip distance below which the hand is pinched.
    pub pinch_threshold: f64,

    /// Dead band applied to the two-hand differential.
    pub deadzone: f64,

    /// Radius used by label proximity queries.
    pub label_radius: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            auto_rotate_enabled: false,
            auto_rotate_speed_percent: 20,
            base_object_scale: 1.0,
            pinch_threshold: PINCH_THRESHOLD,
            deadzone: DEADZONE,
            label_radius: DEFAULT_LABEL_RADIUS,
        }
    }
}

impl TrackingConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse tracking config")?;
        config.validated()
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config: Self = serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        config.validated()
    }

    /// Rejects non-finite or negative tunables; clamps the speed percent.
    pub fn validated(mut self) -> Result<Self> {
        let fields = [
            ("base_object_scale", self.base_object_scale),
            ("pinch_threshold", self.pinch_threshold),
            ("deadzone", self.deadzone),
            ("label_radius", self.label_radius),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                bail!("{} must be a finite non-negative number, got {}", name, value);
            }
        }

        self.auto_rotate_speed_percent = clamp_speed_percent(self.auto_rotate_speed_percent);
        Ok(self)
    }

    /// Returns `false` (with a warning) and keeps the old value when `scale`
    /// is negative or non-finite.
    pub fn set_base_object_scale(&mut self, scale: f64) -> bool {
        if !scale.is_finite() || scale < 0.0 {
            warn!("Ignoring invalid base object scale {}", scale);
            return false;
        }
        self.base_object_scale = scale;
        true
    }

    pub fn set_auto_rotate_speed(&mut self, percent: u8) {
        self.auto_rotate_speed_percent = clamp_speed_percent(percent);
    }

    pub fn combiner_params(&self) -> CombinerParams {
        CombinerParams {
            pinch_threshold: self.pinch_threshold,
            deadzone: self.deadzone,
        }
    }

    pub fn smoother_settings(&self) -> SmootherSettings {
        SmootherSettings {
            base_object_scale: self.base_object_scale,
            auto_rotate_enabled: self.auto_rotate_enabled,
            auto_rotate_speed_percent: f64::from(self.auto_rotate_speed_percent),
        }
    }
}

/// Clamps a speed percent to `0..=100`, warning when it was out of range.
pub fn clamp_speed_percent(percent: u8) -> u8 {
    if percent > MAX_AUTO_ROTATE_SPEED {
        warn!(
            "Autorotate speed {}% out of range, clamping to {}%",
            percent, MAX_AUTO_ROTATE_SPEED
        );
        MAX_AUTO_ROTATE_SPEED
    } else {
        percent
    }
}
