//! Dual-hand combiner: merges the primary hand's pose with the secondary
//! hand's differential signals (pointer, extra rotation, zoom).

use nalgebra::{UnitQuaternion, Vector2, Vector3};

use crate::hand::{HandSample, INDEX_TIP, PINCH_THRESHOLD, compute_centroid, detect_pinch};

use super::frame::{HandFrame, MAX_EXTRA_SCALE, MIN_EXTRA_SCALE, WorldScaleContext};

/// Default dead band on the two-hand differential, per axis.
pub const DEADZONE: f64 = 0.2;

/// Gain applied to the hand-to-hand offset before the dead band.
const DIFFERENTIAL_GAIN: f64 = 2.0;
/// Gain applied to the part of the offset outside the dead band.
const ROTATION_GAIN: f64 = 2.0;
/// Inter-hand distance to zoom factor.
const ZOOM_GAIN: f64 = 3.0;

/// Thresholds used when building a [`HandFrame`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinerParams {
    pub pinch_threshold: f64,
    pub deadzone: f64,
}

impl Default for CombinerParams {
    fn default() -> Self {
        Self {
            pinch_threshold: PINCH_THRESHOLD,
            deadzone: DEADZONE,
        }
    }
}

/// What the secondary hand contributes to a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecondarySignals {
    pub pointer: Vector3<f64>,
    pub extra_rotation: Vector2<f64>,
    pub extra_scale: f64,
}

/// Suppresses `|component| <= deadzone`; outside, keeps the excess with
/// its sign and doubles it.
#[inline]
pub fn apply_deadzone(component: f64, deadzone: f64) -> f64 {
    if component.abs() > deadzone {
        (component.abs() - deadzone) * component.signum() * ROTATION_GAIN
    } else {
        0.0
    }
}

/// Zoom factor for an inter-hand distance, clamped to the extra-scale range.
#[inline]
pub fn zoom_from_distance(distance: f64) -> f64 {
    if !distance.is_finite() {
        return 1.0;
    }
    (distance * ZOOM_GAIN).clamp(MIN_EXTRA_SCALE, MAX_EXTRA_SCALE)
}

/// Signals from the secondary hand relative to the primary centroid.
///
/// The horizontal offset drives rotation about y and the vertical offset
/// rotation about x. Distance is measured in the image plane.
pub fn secondary_signals(
    primary_centroid: &Vector3<f64>,
    secondary: &HandSample,
    world_scale: &WorldScaleContext,
    deadzone: f64,
) -> SecondarySignals {
    let secondary_centroid = compute_centroid(secondary);
    let offset = (secondary_centroid - primary_centroid).xy();
    let differential = offset * DIFFERENTIAL_GAIN;

    SecondarySignals {
        pointer: world_scale.to_world(secondary.landmark(INDEX_TIP)),
        extra_rotation: Vector2::new(
            apply_deadzone(differential.y, deadzone),
            apply_deadzone(differential.x, deadzone),
        ),
        extra_scale: zoom_from_distance(offset.norm()),
    }
}

/// Builds the frame for this callback from the primary hand, its already
/// estimated `rotation`, and the optional secondary hand.
pub fn combine(
    primary: &HandSample,
    secondary: Option<&HandSample>,
    rotation: UnitQuaternion<f64>,
    world_scale: &WorldScaleContext,
    params: &CombinerParams,
) -> HandFrame {
    let centroid = compute_centroid(primary);
    let mut frame = HandFrame::single_hand(
        world_scale.to_world(&centroid),
        rotation,
        detect_pinch(primary, params.pinch_threshold),
    );

    if let Some(secondary) = secondary {
        let signals = secondary_signals(&centroid, secondary, world_scale, params.deadzone);
        frame.extra_rotation = Some(signals.extra_rotation);
        frame.extra_scale = signals.extra_scale;
        frame.secondary_pointer = Some(signals.pointer);
    }

    frame
}
