//! Geometry utilities: vector normalization, hand basis construction,
//! quaternion conversion and spherical interpolation.

pub mod rotation;
pub mod vector;

pub use rotation::{
    basis_from_vectors, is_finite_quaternion, quaternion_from_basis, quaternion_from_euler_xyz,
    slerp,
};
pub use vector::{DEGENERATE_LENGTH, is_finite, lerp, normalize, normalize_or_zero};
