//! Ensemble analysis: pairwise distance matrices, clustering, and
//! coordinate statistics for sets of conformers.
//!
//! An ensemble is a slice of [`Structure`] models sharing one
//! address-correspondence list (NMR conformers of the same molecule). The
//! distance between two models is their optimal-alignment RMSD over that
//! list; the resulting matrix drives cluster assignment.

use larmor_core::{LarmorError, Result, Summarizable};

use crate::align::{align_optimally, center_structure};
use crate::geometry::rmsd;
use crate::types::{AtomAddress, Point3D, Structure};

/// Symmetric distance matrix stored in condensed upper-triangle form.
///
/// For `n` conformers the condensed vector has `n*(n-1)/2` elements; the
/// diagonal is zero by definition and only one triangle is ever computed,
/// since distance is symmetric.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DistanceMatrix {
    condensed: Vec<f64>,
    n: usize,
}

impl DistanceMatrix {
    /// Create from a pre-computed condensed distance vector.
    pub fn from_condensed(condensed: Vec<f64>, n: usize) -> Result<Self> {
        let expected = n * (n - 1) / 2;
        if condensed.len() != expected {
            return Err(LarmorError::InvalidInput(format!(
                "condensed length {} doesn't match n={} (expected {})",
                condensed.len(),
                n,
                expected
            )));
        }
        Ok(Self { condensed, n })
    }

    /// Get the distance between conformers `i` and `j`.
    ///
    /// Returns 0.0 when `i == j`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return 0.0;
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.condensed[self.index(a, b)]
    }

    /// Number of conformers.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Access the raw condensed storage.
    pub fn condensed(&self) -> &[f64] {
        &self.condensed
    }

    /// Map (i, j) where i < j to condensed index.
    fn index(&self, i: usize, j: usize) -> usize {
        // row i starts at position: i*n - i*(i+1)/2
        i * self.n - i * (i + 1) / 2 + (j - i - 1)
    }
}

impl Summarizable for DistanceMatrix {
    fn summary(&self) -> String {
        format!("DistanceMatrix: {}x{}", self.n, self.n)
    }
}

/// All-pairs optimal-alignment RMSD matrix for an ensemble.
///
/// For each row, a working copy of the row's conformer is centered once and
/// reused as the alignment reference for every later conformer — O(N²)
/// alignments, each linear in the number of addressed atoms. The input models
/// are never mutated; all motion happens on working copies.
///
/// With the `parallel` feature, rows are filled concurrently (each (i, j)
/// cell is independent).
///
/// # Errors
///
/// Needs at least 2 conformers and a non-empty address list; alignment
/// errors (missing addresses, degenerate geometry) propagate.
pub fn build_distance_matrix(
    ensemble: &[Structure],
    addrs: &[AtomAddress],
) -> Result<DistanceMatrix> {
    let n = ensemble.len();
    if n < 2 {
        return Err(LarmorError::InvalidInput(
            "need at least 2 conformers".into(),
        ));
    }
    if addrs.is_empty() {
        return Err(LarmorError::EmptyInput(
            "empty address-correspondence list".into(),
        ));
    }

    #[cfg(feature = "parallel")]
    let condensed = {
        use rayon::prelude::*;
        (0..n)
            .into_par_iter()
            .map(|i| matrix_row(ensemble, addrs, i))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<f64>>()
    };
    #[cfg(not(feature = "parallel"))]
    let condensed = {
        let mut condensed = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            condensed.extend(matrix_row(ensemble, addrs, i)?);
        }
        condensed
    };

    DistanceMatrix::from_condensed(condensed, n)
}

/// One condensed row: distances from conformer `i` to every conformer `j > i`.
fn matrix_row(ensemble: &[Structure], addrs: &[AtomAddress], i: usize) -> Result<Vec<f64>> {
    let n = ensemble.len();
    let mut reference = ensemble[i].clone();
    center_structure(&mut reference, addrs)?;

    let mut row = Vec::with_capacity(n - i - 1);
    for model in &ensemble[(i + 1)..] {
        let mut mobile = model.clone();
        align_optimally(&reference, &mut mobile, addrs, addrs)?;
        row.push(rmsd(&reference, &mobile, addrs, addrs)?);
    }
    Ok(row)
}

/// A similarity cluster: a representative (medoid) conformer and the members
/// assigned to it. `members` always contains the representative.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cluster {
    /// Index of the representative conformer.
    pub representative: usize,
    /// Indices of all member conformers, ascending.
    pub members: Vec<usize>,
}

impl Cluster {
    /// Number of members (including the representative).
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A cluster-assignment policy over a distance matrix.
///
/// Downstream code relies only on "one representative per cluster, every
/// member strictly within `min_rmsd` of it"; the selection order and
/// tie-breaks belong to the policy.
pub trait ClusterPolicy {
    /// Partition all conformer indices into clusters.
    fn assign(&self, matrix: &DistanceMatrix, min_rmsd: f64) -> Vec<Cluster>;
}

/// Greedy medoid clustering.
///
/// Repeatedly selects, among not-yet-assigned conformers, the one with the
/// smallest sum of distances to the other unassigned conformers (smallest
/// index on ties) as the next representative; its cluster is itself plus
/// every unassigned conformer strictly within `min_rmsd`. Membership is
/// strict, so `min_rmsd = 0` yields one singleton per conformer (even for
/// duplicate models) and `min_rmsd = +∞` yields a single cluster.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyMedoid;

impl ClusterPolicy for GreedyMedoid {
    fn assign(&self, matrix: &DistanceMatrix, min_rmsd: f64) -> Vec<Cluster> {
        let mut unassigned: Vec<usize> = (0..matrix.n()).collect();
        let mut clusters = Vec::new();

        while !unassigned.is_empty() {
            let mut best = unassigned[0];
            let mut best_sum = f64::INFINITY;
            for &candidate in &unassigned {
                let sum: f64 = unassigned
                    .iter()
                    .filter(|&&other| other != candidate)
                    .map(|&other| matrix.get(candidate, other))
                    .sum();
                // Strict < keeps the smallest index on ties.
                if sum < best_sum {
                    best_sum = sum;
                    best = candidate;
                }
            }

            let (members, rest): (Vec<usize>, Vec<usize>) = unassigned
                .into_iter()
                .partition(|&m| m == best || matrix.get(m, best) < min_rmsd);
            clusters.push(Cluster {
                representative: best,
                members,
            });
            unassigned = rest;
        }

        clusters
    }
}

/// Cluster an ensemble's distance matrix with the default greedy-medoid
/// policy.
pub fn cluster(matrix: &DistanceMatrix, min_rmsd: f64) -> Vec<Cluster> {
    cluster_with(matrix, min_rmsd, &GreedyMedoid)
}

/// Cluster with an explicit policy.
pub fn cluster_with(
    matrix: &DistanceMatrix,
    min_rmsd: f64,
    policy: &dyn ClusterPolicy,
) -> Vec<Cluster> {
    policy.assign(matrix, min_rmsd)
}

/// Per-address mean positions over a pre-aligned ensemble.
///
/// # Errors
///
/// `EmptyInput` for an empty ensemble or address list; missing addresses
/// fail fast.
pub fn mean_positions(ensemble: &[Structure], addrs: &[AtomAddress]) -> Result<Vec<Point3D>> {
    if ensemble.is_empty() {
        return Err(LarmorError::EmptyInput("empty ensemble".into()));
    }
    if addrs.is_empty() {
        return Err(LarmorError::EmptyInput(
            "empty address-correspondence list".into(),
        ));
    }

    let mut sums = vec![Point3D::zero(); addrs.len()];
    for model in ensemble {
        for (sum, p) in sums.iter_mut().zip(model.positions_of(addrs)?) {
            *sum = sum.add(&p);
        }
    }
    let inv = 1.0 / ensemble.len() as f64;
    Ok(sums.into_iter().map(|s| s.scale(inv)).collect())
}

/// Per-address root-mean-square fluctuation about the ensemble mean.
///
/// The standard per-atom precision report for a (pre-aligned) NMR ensemble:
/// `rmsf_k = sqrt(mean_over_models(‖p_mk − mean_k‖²))`.
pub fn per_address_rmsf(ensemble: &[Structure], addrs: &[AtomAddress]) -> Result<Vec<f64>> {
    let means = mean_positions(ensemble, addrs)?;

    let mut sum_sq = vec![0.0f64; addrs.len()];
    for model in ensemble {
        for ((acc, mean), p) in sum_sq
            .iter_mut()
            .zip(&means)
            .zip(model.positions_of(addrs)?)
        {
            let d = p.sub(mean);
            *acc += d.dot(&d);
        }
    }
    let inv = 1.0 / ensemble.len() as f64;
    Ok(sum_sq.into_iter().map(|s| (s * inv).sqrt()).collect())
}
