//! Unit quaternion rotations.
//!
//! Quaternions here always represent rotations: every constructor or
//! averaging step ends in normalization, so `‖q‖ = 1` holds after any public
//! operation. A quaternion and its negation encode the same rotation (the
//! double cover); operations that compare or average quaternions resolve the
//! sign explicitly via [`Quaternion::canonicalize_against`].

use larmor_core::{LarmorError, Result};

use crate::types::Point3D;

/// A unit quaternion representing a rotation.
///
/// Stored as (w, x, y, z) where w is the scalar part.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quaternion {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Quaternion {
    /// Create a new quaternion.
    pub fn new(w: f64, x: f64, y: f64, z: f64) -> Self {
        Self { w, x, y, z }
    }

    /// Identity quaternion (no rotation).
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotation of `angle` radians about `axis` (need not be unit length).
    pub fn from_axis_angle(axis: &Point3D, angle: f64) -> Self {
        let axis = axis.normalize();
        let half = angle / 2.0;
        let s = half.sin();
        Self {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
        .normalized()
    }

    /// Dot product of two quaternions.
    pub fn dot(&self, other: &Self) -> f64 {
        self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Quaternion magnitude.
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Unit quaternion in the same direction, or identity if the magnitude
    /// is (numerically) zero.
    pub fn normalized(&self) -> Self {
        let len = self.norm();
        if len < 1e-12 {
            Self::identity()
        } else {
            let inv = 1.0 / len;
            Self {
                w: self.w * inv,
                x: self.x * inv,
                y: self.y * inv,
                z: self.z * inv,
            }
        }
    }

    /// Negated quaternion (represents the same rotation).
    pub fn negated(&self) -> Self {
        Self {
            w: -self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Conjugate; for a unit quaternion, the inverse rotation.
    pub fn conjugate(&self) -> Self {
        Self {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Hamilton product `self * other` (apply `other` first, then `self`).
    pub fn multiply(&self, other: &Self) -> Self {
        Self {
            w: self.w * other.w - self.x * other.x - self.y * other.y - self.z * other.z,
            x: self.w * other.x + self.x * other.w + self.y * other.z - self.z * other.y,
            y: self.w * other.y - self.x * other.z + self.y * other.w + self.z * other.x,
            z: self.w * other.z + self.x * other.y - self.y * other.x + self.z * other.w,
        }
    }

    /// Rotation angle in radians, in `[0, π]`.
    pub fn angle(&self) -> f64 {
        2.0 * self.w.abs().clamp(-1.0, 1.0).acos()
    }

    /// Rotate a point: computes `q · p · q⁻¹`.
    pub fn rotate_point(&self, p: &Point3D) -> Point3D {
        let v = Point3D::new(self.x, self.y, self.z);
        let t = v.cross(p).scale(2.0);
        p.add(&t.scale(self.w)).add(&v.cross(&t))
    }

    /// Flip this quaternion's sign so its dot product with `reference` is
    /// non-negative.
    ///
    /// This resolves the double cover before summation or comparison: `q` and
    /// `−q` are the same rotation, but averaging antipodal representations
    /// without this step cancels them to a meaningless near-zero sum.
    pub fn canonicalize_against(&self, reference: &Self) -> Self {
        if self.dot(reference) < 0.0 {
            self.negated()
        } else {
            *self
        }
    }

    /// Average a set of rotations by sign-corrected component-wise summation.
    ///
    /// Every candidate is canonicalized against the first before summation,
    /// then the sum is normalized. Suitable for reconciling nearly-agreeing
    /// rotations (e.g. per-fragment alignments); widely-spread inputs have no
    /// meaningful mean.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for an empty slice; `DegenerateGeometry` if the
    /// sign-corrected sum is numerically zero (candidates cancel).
    pub fn average(quats: &[Quaternion]) -> Result<Quaternion> {
        let first = quats
            .first()
            .ok_or_else(|| LarmorError::EmptyInput("no quaternions to average".into()))?;
        let mut sum = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        for q in quats {
            let q = q.canonicalize_against(first);
            sum.w += q.w;
            sum.x += q.x;
            sum.y += q.y;
            sum.z += q.z;
        }
        if sum.norm() < 1e-9 {
            return Err(LarmorError::DegenerateGeometry(
                "quaternion candidates cancel; no meaningful average".into(),
            ));
        }
        Ok(sum.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn identity_rotation_is_noop() {
        let p = Point3D::new(1.0, 2.0, 3.0);
        let r = Quaternion::identity().rotate_point(&p);
        assert!((r.x - 1.0).abs() < 1e-12);
        assert!((r.y - 2.0).abs() < 1e-12);
        assert!((r.z - 3.0).abs() < 1e-12);
    }

    #[test]
    fn ninety_degrees_about_z() {
        let q = Quaternion::from_axis_angle(&Point3D::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let r = q.rotate_point(&Point3D::new(1.0, 0.0, 0.0));
        assert!(r.x.abs() < 1e-12);
        assert!((r.y - 1.0).abs() < 1e-12);
        assert!(r.z.abs() < 1e-12);
    }

    #[test]
    fn conjugate_inverts_rotation() {
        let q = Quaternion::from_axis_angle(&Point3D::new(1.0, 1.0, 0.0), 0.7);
        let p = Point3D::new(0.3, -1.2, 2.5);
        let back = q.conjugate().rotate_point(&q.rotate_point(&p));
        assert!(back.distance_to(&p) < 1e-12);
    }

    #[test]
    fn multiply_composes_rotations() {
        let qa = Quaternion::from_axis_angle(&Point3D::new(0.0, 0.0, 1.0), FRAC_PI_2);
        let qb = Quaternion::from_axis_angle(&Point3D::new(1.0, 0.0, 0.0), FRAC_PI_2);
        let p = Point3D::new(1.0, 0.0, 0.0);
        let composed = qb.multiply(&qa).rotate_point(&p);
        let stepwise = qb.rotate_point(&qa.rotate_point(&p));
        assert!(composed.distance_to(&stepwise) < 1e-12);
    }

    #[test]
    fn negation_is_same_rotation() {
        let q = Quaternion::from_axis_angle(&Point3D::new(0.3, 0.5, 0.8), 1.1);
        let p = Point3D::new(1.0, -2.0, 0.5);
        assert!(q.rotate_point(&p).distance_to(&q.negated().rotate_point(&p)) < 1e-12);
    }

    #[test]
    fn canonicalize_flips_antipodal() {
        let q = Quaternion::from_axis_angle(&Point3D::new(0.0, 1.0, 0.0), 0.4);
        let flipped = q.negated();
        let fixed = flipped.canonicalize_against(&q);
        assert!(fixed.dot(&q) > 0.0);
        assert!((fixed.w - q.w).abs() < 1e-12);
    }

    #[test]
    fn average_of_antipodal_copies() {
        // Same rotation, opposite signs: naive averaging would cancel to
        // zero; sign correction recovers the rotation.
        let q = Quaternion::from_axis_angle(&Point3D::new(0.0, 0.0, 1.0), 0.6);
        let avg = Quaternion::average(&[q, q.negated(), q, q.negated()]).unwrap();
        assert!(avg.canonicalize_against(&q).dot(&q) > 1.0 - 1e-12);
    }

    #[test]
    fn average_of_nearby_rotations() {
        let axis = Point3D::new(0.0, 0.0, 1.0);
        let quats = [
            Quaternion::from_axis_angle(&axis, 0.50),
            Quaternion::from_axis_angle(&axis, 0.52),
            Quaternion::from_axis_angle(&axis, 0.48),
        ];
        let avg = Quaternion::average(&quats).unwrap();
        let expected = Quaternion::from_axis_angle(&axis, 0.50);
        assert!(avg.canonicalize_against(&expected).dot(&expected) > 1.0 - 1e-4);
        assert!((avg.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn average_empty_fails() {
        assert!(Quaternion::average(&[]).is_err());
    }

    #[test]
    fn angle_of_known_rotation() {
        let q = Quaternion::from_axis_angle(&Point3D::new(1.0, 0.0, 0.0), PI / 3.0);
        assert!((q.angle() - PI / 3.0).abs() < 1e-12);
        // The negation encodes the same rotation and reports the same angle.
        assert!((q.negated().angle() - PI / 3.0).abs() < 1e-12);
    }
}
