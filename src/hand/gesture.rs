//! Pinch gesture detection and the hand-center proxy.

use nalgebra::Vector3;

use super::landmarks::{HandSample, INDEX_MCP, INDEX_TIP, PINKY_MCP, THUMB_TIP, WRIST};

/// Thumb-tip to index-tip distance below which the hand is pinched.
/// Normalized camera-space units; hand size and camera distance are not
/// compensated.
pub const PINCH_THRESHOLD: f64 = 0.05;

/// Center of the palm: mean of wrist, index MCP and pinky MCP.
///
/// These three points are rigid on the palm, so the centroid does not drift
/// when the fingers flex.
pub fn compute_centroid(hand: &HandSample) -> Vector3<f64> {
    (hand.landmark(WRIST) + hand.landmark(INDEX_MCP) + hand.landmark(PINKY_MCP)) / 3.0
}

/// Euclidean thumb-tip / index-tip distance in landmark space.
#[inline]
pub fn pinch_distance(hand: &HandSample) -> f64 {
    (hand.landmark(THUMB_TIP) - hand.landmark(INDEX_TIP)).norm()
}

/// `true` when the pinch distance is strictly below `threshold`.
#[inline]
pub fn detect_pinch(hand: &HandSample, threshold: f64) -> bool {
    pinch_distance(hand) < threshold
}
