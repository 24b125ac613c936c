//! Rotation primitives: basis construction, matrix-to-quaternion conversion,
//! Euler offsets and shortest-path spherical interpolation.
//!
//! Every function here is pure and NaN-guarded: degenerate input yields
//! `None` (or the unchanged start rotation for [`slerp`]) rather than a
//! poisoned quaternion.

use nalgebra::{Matrix3, Quaternion, UnitQuaternion, Vector3, Vector4};

use super::vector::{DEGENERATE_LENGTH, normalize};

/// Above this |cos(half angle)| two quaternions are treated as parallel and
/// interpolated linearly (then renormalized).
const SLERP_PARALLEL_THRESHOLD: f64 = 1.0 - 1e-6;

/// Builds the `(side, up, forward)` basis used for hand orientation.
///
/// `forward` and `side` are normalized independently; they are *not*
/// orthogonalized against each other. `up` is `-normalize(forward × side)`
/// (palm-facing convention). The matrix holds the three axes as columns.
///
/// Returns `None` if either input is zero-length or the two are parallel.
pub fn basis_from_vectors(forward: &Vector3<f64>, side: &Vector3<f64>) -> Option<Matrix3<f64>> {
    let forward = normalize(forward)?;
    let side = normalize(side)?;
    let normal = normalize(&forward.cross(&side))?;
    let up = -normal;

    Some(Matrix3::from_columns(&[side, up, forward]))
}

/// Converts a basis matrix (axes as columns) to a unit quaternion.
///
/// Uses the trace test first and otherwise branches on the largest diagonal
/// element, which keeps the square root well conditioned near trace = -1.
/// The raw result is normalized so that an approximately orthonormal basis
/// still yields a unit quaternion.
///
/// ```text
/// trace > 0       : s = 0.5 / sqrt(trace + 1),  w = 0.25 / s
/// m00 largest     : s = 2 sqrt(1 + m00 - m11 - m22),  x = 0.25 s
/// m11 largest     : s = 2 sqrt(1 + m11 - m00 - m22),  y = 0.25 s
/// otherwise       : s = 2 sqrt(1 + m22 - m00 - m11),  z = 0.25 s
/// ```
pub fn quaternion_from_basis(m: &Matrix3<f64>) -> Option<UnitQuaternion<f64>> {
    if !m.iter().all(|v| v.is_finite()) {
        return None;
    }

    let (m00, m01, m02) = (m[(0, 0)], m[(0, 1)], m[(0, 2)]);
    let (m10, m11, m12) = (m[(1, 0)], m[(1, 1)], m[(1, 2)]);
    let (m20, m21, m22) = (m[(2, 0)], m[(2, 1)], m[(2, 2)]);
    let trace = m00 + m11 + m22;

    let q = if trace > 0.0 {
        let s = 0.5 / (trace + 1.0).sqrt();
        Quaternion::new(0.25 / s, (m21 - m12) * s, (m02 - m20) * s, (m10 - m01) * s)
    } else if m00 > m11 && m00 > m22 {
        let s = 2.0 * (1.0 + m00 - m11 - m22).sqrt();
        Quaternion::new((m21 - m12) / s, 0.25 * s, (m01 + m10) / s, (m02 + m20) / s)
    } else if m11 > m22 {
        let s = 2.0 * (1.0 + m11 - m00 - m22).sqrt();
        Quaternion::new((m02 - m20) / s, (m01 + m10) / s, 0.25 * s, (m12 + m21) / s)
    } else {
        let s = 2.0 * (1.0 + m22 - m00 - m11).sqrt();
        Quaternion::new((m10 - m01) / s, (m02 + m20) / s, (m12 + m21) / s, 0.25 * s)
    };

    if !is_finite_quaternion(&q) || q.norm() < DEGENERATE_LENGTH {
        return None;
    }
    Some(UnitQuaternion::new_normalize(q))
}

/// Rotation for intrinsic X-Y-Z Euler angles (radians): `qx(x) * qy(y) * qz(z)`.
pub fn quaternion_from_euler_xyz(x: f64, y: f64, z: f64) -> UnitQuaternion<f64> {
    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x)
        * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y)
        * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z)
}

/// Shortest-path spherical interpolation from `from` towards `to`.
///
/// `t` is clamped to `[0, 1]`. The sign of `to` is flipped when needed so the
/// interpolation never takes the long way around the double cover. Nearly
/// parallel inputs fall back to normalized linear interpolation. If either
/// input is non-finite, `from` is returned unchanged.
pub fn slerp(from: &UnitQuaternion<f64>, to: &UnitQuaternion<f64>, t: f64) -> UnitQuaternion<f64> {
    if !is_finite_quaternion(from.quaternion()) || !is_finite_quaternion(to.quaternion()) {
        return *from;
    }
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    let a: Vector4<f64> = from.quaternion().coords;
    let mut b: Vector4<f64> = to.quaternion().coords;
    let mut cos_half = a.dot(&b);
    if cos_half < 0.0 {
        b = -b;
        cos_half = -cos_half;
    }

    let blended = if cos_half >= SLERP_PARALLEL_THRESHOLD {
        a.lerp(&b, t)
    } else {
        let half = cos_half.min(1.0).acos();
        let sin_half = half.sin();
        let wa = ((1.0 - t) * half).sin() / sin_half;
        let wb = (t * half).sin() / sin_half;
        a * wa + b * wb
    };

    let q = Quaternion::from(blended);
    if !is_finite_quaternion(&q) || q.norm() < DEGENERATE_LENGTH {
        return *from;
    }
    UnitQuaternion::new_normalize(q)
}

/// True when all four components are finite.
#[inline]
pub fn is_finite_quaternion(q: &Quaternion<f64>) -> bool {
    q.coords.iter().all(|c| c.is_finite())
}
