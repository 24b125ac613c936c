//! Temporal smoother: the single owner of the filtered object pose.
//!
//! Each render tick moves the held pose towards the latest [`HandFrame`]:
//! - scale eases exponentially towards `base * extra_scale` (or 0 when hidden)
//! - position follows only while pinched, with a distance-dependent gain
//! - rotation slerps towards `hand * offset`, where `offset` integrates the
//!   secondary-hand rotation rate and the autorotate speed over time
//!
//! Without a frame only the scale moves; position, rotation and both
//! accumulators are frozen.

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use tracing::trace;

use crate::geometry::{is_finite, lerp, quaternion_from_euler_xyz, slerp};

use super::frame::HandFrame;

/// Exponential approach rate of the scale, per second.
const SCALE_RATE: f64 = 5.0;
/// Gain applied to `extra_rotation` before integration.
const MANUAL_ROTATION_GAIN: f64 = 2.0;
/// Radians per second contributed by each percent of autorotate speed.
const AUTO_ROTATION_PER_PERCENT: f64 = 0.02;
/// Fixed slerp weight per tick.
const ROTATION_SMOOTHING: f64 = 0.1;

/// Distance above which the position gain is [`FAST_GAIN`].
const FAST_DISTANCE: f64 = 0.5;
/// Distance above which the position gain is [`MEDIUM_GAIN`].
const MEDIUM_DISTANCE: f64 = 0.1;
const FAST_GAIN: f64 = 0.4;
const MEDIUM_GAIN: f64 = 0.2;
const REST_GAIN: f64 = 0.05;

/// Per-tick inputs that come from configuration rather than detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmootherSettings {
    pub base_object_scale: f64,
    pub auto_rotate_enabled: bool,
    /// Autorotate speed in percent, `0..=100`.
    pub auto_rotate_speed_percent: f64,
}

impl Default for SmootherSettings {
    fn default() -> Self {
        Self {
            base_object_scale: 1.0,
            auto_rotate_enabled: false,
            auto_rotate_speed_percent: 20.0,
        }
    }
}

/// Filtered object pose plus the rotation accumulators.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedPose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    /// Always `>= 0`.
    pub scale: f64,
    /// Integrated secondary-hand rotation `(x, y)` in radians.
    pub manual_rotation: Vector2<f64>,
    /// Integrated autorotation about y in radians.
    pub auto_rotation_y: f64,
}

impl SmoothedPose {
    /// Session start: origin, identity rotation, collapsed scale.
    pub fn initial() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: 0.0,
            manual_rotation: Vector2::zeros(),
            auto_rotation_y: 0.0,
        }
    }

    /// Rotation offset from the accumulators: Euler `(manual.x, manual.y + auto, 0)`.
    pub fn rotation_offset(&self) -> UnitQuaternion<f64> {
        quaternion_from_euler_xyz(
            self.manual_rotation.x,
            self.manual_rotation.y + self.auto_rotation_y,
            0.0,
        )
    }
}

impl Default for SmoothedPose {
    fn default() -> Self {
        Self::initial()
    }
}

/// Position gain for a given distance to the target.
///
/// High gain when far (fast motion), low gain near rest to damp jitter.
#[inline]
pub fn position_gain(distance: f64) -> f64 {
    if distance > FAST_DISTANCE {
        FAST_GAIN
    } else if distance > MEDIUM_DISTANCE {
        MEDIUM_GAIN
    } else {
        REST_GAIN
    }
}

/// Stateful filter advancing a [`SmoothedPose`] once per render tick.
///
/// Frames must be fed in detection order; the adaptive position gain reads
/// the distance between the held pose and the newest target.
#[derive(Debug, Clone, Default)]
pub struct TemporalSmoother {
    pose: SmoothedPose,
}

impl TemporalSmoother {
    pub fn new() -> Self {
        Self {
            pose: SmoothedPose::initial(),
        }
    }

    /// Resume from a previously held pose.
    pub fn from_pose(pose: SmoothedPose) -> Self {
        Self { pose }
    }

    pub fn pose(&self) -> &SmoothedPose {
        &self.pose
    }

    /// Advance by `elapsed` seconds towards `target`.
    ///
    /// Negative or non-finite `elapsed` counts as zero.
    pub fn advance(
        &mut self,
        target: Option<&HandFrame>,
        is_visible: bool,
        elapsed: f64,
        settings: &SmootherSettings,
    ) -> &SmoothedPose {
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };

        self.advance_scale(target, is_visible, elapsed, settings);

        if let Some(frame) = target {
            if frame.is_pinched && is_visible {
                self.advance_position(&frame.position);
            }
            if is_visible {
                self.advance_rotation(frame, elapsed, settings);
            }
        }

        &self.pose
    }

    fn advance_scale(
        &mut self,
        target: Option<&HandFrame>,
        is_visible: bool,
        elapsed: f64,
        settings: &SmootherSettings,
    ) {
        let target_scale = if is_visible {
            let zoom = target.map_or(1.0, |f| f.extra_scale);
            settings.base_object_scale * zoom
        } else {
            0.0
        };
        if !target_scale.is_finite() {
            return;
        }

        // Clamped so a long tick lands on the target instead of overshooting.
        let gain = (elapsed * SCALE_RATE).min(1.0);
        let scale = self.pose.scale + (target_scale - self.pose.scale) * gain;
        self.pose.scale = scale.max(0.0);
    }

    fn advance_position(&mut self, target: &Vector3<f64>) {
        if !is_finite(target) {
            return;
        }
        let distance = (target - self.pose.position).norm();
        let gain = position_gain(distance);
        trace!(distance, gain, "position step");
        self.pose.position = lerp(&self.pose.position, target, gain);
    }

    fn advance_rotation(&mut self, frame: &HandFrame, elapsed: f64, settings: &SmootherSettings) {
        if let Some(extra) = frame.extra_rotation {
            if extra.iter().all(|c| c.is_finite()) {
                self.pose.manual_rotation += extra * elapsed * MANUAL_ROTATION_GAIN;
            }
        }
        if settings.auto_rotate_enabled {
            self.pose.auto_rotation_y +=
                elapsed * settings.auto_rotate_speed_percent * AUTO_ROTATION_PER_PERCENT;
        }

        // Hand first, then the accumulated offset.
        let target = frame.rotation * self.pose.rotation_offset();
        self.pose.rotation = slerp(&self.pose.rotation, &target, ROTATION_SMOOTHING);
    }
}
