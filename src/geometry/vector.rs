//! Vector primitives shared by the hand pipeline.
//!
//! nalgebra already provides `cross`, `dot` and `norm`; the helpers here add
//! the failure semantics the pipeline relies on: normalization reports a
//! degenerate (near zero-length) input instead of producing NaNs.

use nalgebra::Vector3;

/// Vectors shorter than this are treated as zero-length.
pub const DEGENERATE_LENGTH: f64 = 1e-9;

/// Normalize `v`, or `None` when `|v| ≈ 0` or any component is non-finite.
#[inline]
pub fn normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    if !is_finite(v) {
        return None;
    }
    v.try_normalize(DEGENERATE_LENGTH)
}

/// Normalize `v`, falling back to the zero vector when degenerate.
#[inline]
pub fn normalize_or_zero(v: &Vector3<f64>) -> Vector3<f64> {
    normalize(v).unwrap_or_else(Vector3::zeros)
}

/// Componentwise linear interpolation: `a + (b - a) * t`.
///
/// `t` is not clamped; callers pass gains already in `[0, 1]`.
#[inline]
pub fn lerp(a: &Vector3<f64>, b: &Vector3<f64>, t: f64) -> Vector3<f64> {
    a + (b - a) * t
}

/// True when every component is finite.
#[inline]
pub fn is_finite(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}
