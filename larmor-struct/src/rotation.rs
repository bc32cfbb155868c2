//! Optimal rotation between corresponding point sets.
//!
//! Implements Horn's closed-form quaternion method: the rotation minimizing
//! the sum of squared residuals between two centered, index-corresponding
//! point sets is the eigenvector belonging to the largest eigenvalue of a
//! symmetric 4x4 matrix built from the cross-covariance of the two sets.
//! There is no iterative refinement loop — the eigen-decomposition is the
//! exact solution.

use larmor_core::{LarmorError, Result};

use crate::linalg::{jacobi_eigen_4x4, Matrix4};
use crate::quat::Quaternion;
use crate::types::Point3D;

/// The unit quaternion `q` minimizing `Σ‖q·fromᵢ·q⁻¹ − ontoᵢ‖²`.
///
/// Both point sets are conventionally already centered so their centroids sit
/// at the origin; the result is then the optimal pure rotation of `from` onto
/// `onto`. See [`crate::align::align_optimally`] for the full
/// translate-then-rotate pipeline.
///
/// For degenerate geometry with two or more pairs (e.g. all points colinear)
/// the largest eigenvalue may be shared by several eigenvectors; the solver
/// returns one of them. Every such quaternion achieves the same minimal
/// residual, so the result is still an optimal rotation — just not a unique
/// one.
///
/// # Errors
///
/// `LengthMismatch` if the sets differ in length; `DegenerateGeometry` for
/// fewer than 2 point pairs.
pub fn optimal_rotation(from: &[Point3D], onto: &[Point3D]) -> Result<Quaternion> {
    if from.len() != onto.len() {
        return Err(LarmorError::LengthMismatch {
            left: from.len(),
            right: onto.len(),
        });
    }
    if from.len() < 2 {
        return Err(LarmorError::DegenerateGeometry(format!(
            "need at least 2 point pairs for a rotation, got {}",
            from.len()
        )));
    }

    // Cross-covariance M = Σ fromᵢ ontoᵢᵗ; s_xy = Σ fromᵢ.x * ontoᵢ.y
    let mut s_xx = 0.0;
    let mut s_xy = 0.0;
    let mut s_xz = 0.0;
    let mut s_yx = 0.0;
    let mut s_yy = 0.0;
    let mut s_yz = 0.0;
    let mut s_zx = 0.0;
    let mut s_zy = 0.0;
    let mut s_zz = 0.0;
    for (a, b) in from.iter().zip(onto) {
        s_xx += a.x * b.x;
        s_xy += a.x * b.y;
        s_xz += a.x * b.z;
        s_yx += a.y * b.x;
        s_yy += a.y * b.y;
        s_yz += a.y * b.z;
        s_zx += a.z * b.x;
        s_zy += a.z * b.y;
        s_zz += a.z * b.z;
    }

    // Horn's symmetric key matrix; its top eigenvector is the rotation.
    let n: Matrix4 = [
        [
            s_xx + s_yy + s_zz,
            s_yz - s_zy,
            s_zx - s_xz,
            s_xy - s_yx,
        ],
        [
            s_yz - s_zy,
            s_xx - s_yy - s_zz,
            s_xy + s_yx,
            s_zx + s_xz,
        ],
        [
            s_zx - s_xz,
            s_xy + s_yx,
            -s_xx + s_yy - s_zz,
            s_yz + s_zy,
        ],
        [
            s_xy - s_yx,
            s_zx + s_xz,
            s_yz + s_zy,
            -s_xx - s_yy + s_zz,
        ],
    ];

    let (vectors, values) = jacobi_eigen_4x4(&n);
    let mut best = 0;
    for k in 1..4 {
        if values[k] > values[best] {
            best = k;
        }
    }

    Ok(Quaternion::new(
        vectors[0][best],
        vectors[1][best],
        vectors[2][best],
        vectors[3][best],
    )
    .normalized())
}
