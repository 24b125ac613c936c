//! Per-frame hand measurement handed from the combiner to the smoother.

use nalgebra::{UnitQuaternion, Vector2, Vector3};

/// Lower bound on the two-hand zoom factor.
pub const MIN_EXTRA_SCALE: f64 = 0.5;
/// Upper bound on the two-hand zoom factor.
pub const MAX_EXTRA_SCALE: f64 = 2.5;

/// Maps normalized image coordinates to world units.
///
/// Supplied by the viewport collaborator and replaced on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldScaleContext {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl WorldScaleContext {
    pub fn new(scale_x: f64, scale_y: f64) -> Self {
        Self { scale_x, scale_y }
    }

    /// World position of a normalized image point, mirrored in x for a
    /// front-facing camera. Depth is dropped (`z = 0`).
    #[inline]
    pub fn to_world(&self, normalized: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(
            (0.5 - normalized.x) * self.scale_x,
            (0.5 - normalized.y) * self.scale_y,
            0.0,
        )
    }
}

impl Default for WorldScaleContext {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

/// Measurement derived from one detector callback.
///
/// Transient: rebuilt every frame, no identity across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct HandFrame {
    /// Primary hand centroid in world units.
    pub position: Vector3<f64>,
    /// Primary hand orientation (camera space).
    pub rotation: UnitQuaternion<f64>,
    pub is_pinched: bool,
    /// Rotation rate requested by the secondary hand, `(x, y)` in rad/s
    /// before the smoother's gain. `None` without a secondary hand.
    pub extra_rotation: Option<Vector2<f64>>,
    /// Zoom factor, always within `[MIN_EXTRA_SCALE, MAX_EXTRA_SCALE]`.
    pub extra_scale: f64,
    /// Secondary index fingertip in world units.
    pub secondary_pointer: Option<Vector3<f64>>,
}

impl HandFrame {
    /// Frame for a single visible hand with no secondary input.
    pub fn single_hand(
        position: Vector3<f64>,
        rotation: UnitQuaternion<f64>,
        is_pinched: bool,
    ) -> Self {
        Self {
            position,
            rotation,
            is_pinched,
            extra_rotation: None,
            extra_scale: 1.0,
            secondary_pointer: None,
        }
    }
}
