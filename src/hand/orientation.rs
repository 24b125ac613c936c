//! Single-hand orientation from three anatomical directions.
//!
//! The estimate is instantaneous: no filtering happens here. Smoothing is
//! done by [`crate::tracking::TemporalSmoother`].

use nalgebra::{Matrix3, UnitQuaternion};
use tracing::trace;

use crate::geometry::{basis_from_vectors, quaternion_from_basis};

use super::landmarks::{HandSample, INDEX_MCP, MIDDLE_MCP, PINKY_MCP, WRIST};

/// Hand basis in camera space: columns are `(side, up, forward)` with
/// `forward = wrist → middle MCP` and `side = index MCP → pinky MCP`.
///
/// `None` when landmarks coincide or the two directions are parallel.
pub fn hand_basis(hand: &HandSample) -> Option<Matrix3<f64>> {
    let forward = hand.landmark(MIDDLE_MCP) - hand.landmark(WRIST);
    let side = hand.landmark(PINKY_MCP) - hand.landmark(INDEX_MCP);
    basis_from_vectors(&forward, &side)
}

/// Orientation of the hand as a unit quaternion in camera space.
///
/// `None` signals degenerate geometry; callers hold the previous orientation
/// instead of propagating a NaN rotation.
pub fn estimate_orientation(hand: &HandSample) -> Option<UnitQuaternion<f64>> {
    let rotation = hand_basis(hand).and_then(|basis| quaternion_from_basis(&basis));
    if rotation.is_none() {
        trace!("Degenerate hand basis, no orientation this frame");
    }
    rotation
}
