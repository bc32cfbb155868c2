//! Coordinate geometry: distances, centroids, RMSD.

use larmor_core::{LarmorError, Result};

use crate::types::{AtomAddress, Point3D, Structure};

/// Euclidean distance between two points.
pub fn distance_points(p1: &Point3D, p2: &Point3D) -> f64 {
    p1.distance_to(p2)
}

/// Geometric centroid (unweighted mean position) of a slice of points.
pub fn centroid_points(points: &[Point3D]) -> Point3D {
    if points.is_empty() {
        return Point3D::zero();
    }
    let mut sum = Point3D::zero();
    for p in points {
        sum = sum.add(p);
    }
    sum.scale(1.0 / points.len() as f64)
}

/// Centroid of the addressed atom subset of a structure.
///
/// # Errors
///
/// `EmptyInput` for an empty address list; fails if any address is missing.
pub fn centroid_of(structure: &Structure, addrs: &[AtomAddress]) -> Result<Point3D> {
    if addrs.is_empty() {
        return Err(LarmorError::EmptyInput(
            "cannot compute centroid of empty address list".into(),
        ));
    }
    Ok(centroid_points(&structure.positions_of(addrs)?))
}

/// RMSD between two equal-length slices of points (no alignment, direct
/// comparison of current coordinates).
///
/// Callers wanting the *optimal* RMSD must align first; see
/// [`crate::align::align_optimally`].
pub fn rmsd_points(points1: &[Point3D], points2: &[Point3D]) -> Result<f64> {
    if points1.is_empty() {
        return Err(LarmorError::EmptyInput(
            "cannot compute RMSD of empty point sets".into(),
        ));
    }
    if points1.len() != points2.len() {
        return Err(LarmorError::LengthMismatch {
            left: points1.len(),
            right: points2.len(),
        });
    }
    let sum_sq: f64 = points1
        .iter()
        .zip(points2)
        .map(|(p, q)| {
            let d = p.sub(q);
            d.dot(&d)
        })
        .sum();
    Ok((sum_sq / points1.len() as f64).sqrt())
}

/// RMSD between the addressed subsets of two structures.
///
/// The address lists are index-corresponding: `addrs_a[i]` pairs with
/// `addrs_b[i]`. No alignment is performed.
pub fn rmsd(
    a: &Structure,
    b: &Structure,
    addrs_a: &[AtomAddress],
    addrs_b: &[AtomAddress],
) -> Result<f64> {
    if addrs_a.len() != addrs_b.len() {
        return Err(LarmorError::LengthMismatch {
            left: addrs_a.len(),
            right: addrs_b.len(),
        });
    }
    rmsd_points(&a.positions_of(addrs_a)?, &b.positions_of(addrs_b)?)
}
