//! Rigid-body alignment of one structure onto another.
//!
//! Alignment is two-phase: translate the mobile ("computed") structure so the
//! chosen atom subset's centroid sits at the origin, then rotate it in place
//! by the optimal rotation onto the stationary reference. The reference is
//! never mutated; the computed structure is mutated deliberately, because
//! ensemble-wide pairwise alignment cannot afford per-pair copies of every
//! coordinate.

use larmor_core::{LarmorError, Result};

use crate::geometry::{centroid_of, centroid_points};
use crate::quat::Quaternion;
use crate::rotation::optimal_rotation;
use crate::types::{AtomAddress, Point3D, Structure};

/// Translate `structure` so the centroid of the addressed subset is at the
/// origin. Returns the centroid that was subtracted, so callers can undo or
/// compose the translation.
pub fn center_structure(structure: &mut Structure, addrs: &[AtomAddress]) -> Result<Point3D> {
    let centroid = centroid_of(structure, addrs)?;
    structure.translate(&centroid.scale(-1.0));
    Ok(centroid)
}

/// Align `computed` onto `reference` using index-corresponding address lists,
/// mutating `computed` in place. Returns the applied rotation.
///
/// The reference is assumed **already centered** at the origin on
/// `addrs_ref`: callers performing repeated pairwise alignment against one
/// reference (e.g. the ensemble distance matrix) center it exactly once via
/// [`center_structure`] and reuse it across many alignments.
///
/// # Errors
///
/// `LengthMismatch` if the address lists differ in length; errors from
/// address resolution and the rotation optimizer propagate.
pub fn align_optimally(
    reference: &Structure,
    computed: &mut Structure,
    addrs_ref: &[AtomAddress],
    addrs_comp: &[AtomAddress],
) -> Result<Quaternion> {
    if addrs_ref.len() != addrs_comp.len() {
        return Err(LarmorError::LengthMismatch {
            left: addrs_ref.len(),
            right: addrs_comp.len(),
        });
    }

    center_structure(computed, addrs_comp)?;

    let comp_points = computed.positions_of(addrs_comp)?;
    let ref_points = reference.positions_of(addrs_ref)?;
    let q = optimal_rotation(&comp_points, &ref_points)?;
    computed.rotate(&q);
    Ok(q)
}

/// A pair of index-aligned address lists delimiting one rigid fragment
/// (e.g. a secondary-structure element).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FragmentMap {
    /// Addresses of the fragment in the reference structure.
    pub reference: Vec<AtomAddress>,
    /// Corresponding addresses in the computed structure.
    pub computed: Vec<AtomAddress>,
}

/// The locally optimal rotation of each fragment, computed independently.
///
/// Each fragment is centered on its own centroid pair before optimization, so
/// the rotations are pure (translation-free) and comparable.
pub fn fragment_rotations(
    reference: &Structure,
    computed: &Structure,
    fragments: &[FragmentMap],
) -> Result<Vec<Quaternion>> {
    let mut rotations = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if fragment.reference.len() != fragment.computed.len() {
            return Err(LarmorError::LengthMismatch {
                left: fragment.reference.len(),
                right: fragment.computed.len(),
            });
        }
        let ref_points = reference.positions_of(&fragment.reference)?;
        let comp_points = computed.positions_of(&fragment.computed)?;

        let ref_centroid = centroid_points(&ref_points);
        let comp_centroid = centroid_points(&comp_points);
        let ref_centered: Vec<_> = ref_points.iter().map(|p| p.sub(&ref_centroid)).collect();
        let comp_centered: Vec<_> = comp_points.iter().map(|p| p.sub(&comp_centroid)).collect();

        rotations.push(optimal_rotation(&comp_centered, &ref_centered)?);
    }
    Ok(rotations)
}

/// Align `computed` onto `reference` by reconciling independently-fitted
/// rigid fragments into one consensus rotation.
///
/// Each fragment's locally optimal rotation is computed via
/// [`fragment_rotations`], the candidates are averaged with explicit
/// double-cover sign correction ([`Quaternion::average`]), and the consensus
/// is applied to the whole computed structure about the centroid of the union
/// of fragment atoms. Returns the consensus rotation.
///
/// # Errors
///
/// `EmptyInput` if `fragments` is empty; per-fragment errors propagate.
pub fn align_fragments(
    reference: &Structure,
    computed: &mut Structure,
    fragments: &[FragmentMap],
) -> Result<Quaternion> {
    if fragments.is_empty() {
        return Err(LarmorError::EmptyInput(
            "no fragments to reconcile".into(),
        ));
    }

    let rotations = fragment_rotations(reference, computed, fragments)?;
    let consensus = Quaternion::average(&rotations)?;

    let all_computed: Vec<AtomAddress> = fragments
        .iter()
        .flat_map(|f| f.computed.iter().cloned())
        .collect();
    center_structure(computed, &all_computed)?;
    computed.rotate(&consensus);
    Ok(consensus)
}
