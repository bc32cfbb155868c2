//! Structure superposition and ensemble analysis for the Larmor NMR toolkit.
//!
//! - **Structure model** — Addressable atom positions in [`types`]
//! - **Quaternion math** — Rotations and sign-safe averaging in [`quat`]
//! - **Optimal rotation** — Horn's closed-form method in [`rotation`]
//! - **Alignment** — Centroid + rotation superposition in [`align`]
//! - **Geometry** — Distance, centroid, RMSD in [`geometry`]
//! - **Ensembles** — Distance matrices, clustering, RMSF in [`ensemble`]
//!
//! # Quick start
//!
//! ```
//! use larmor_struct::types::{Atom, Chain, Point3D, Residue, Structure};
//! use larmor_struct::{align_optimally, center_structure, rmsd};
//!
//! fn model(id: &str, points: &[(f64, f64, f64)]) -> Structure {
//!     let residues = points
//!         .iter()
//!         .enumerate()
//!         .map(|(i, &(x, y, z))| Residue {
//!             name: "GLY".into(),
//!             seq_num: i as i32 + 1,
//!             atoms: vec![Atom {
//!                 serial: i as u32 + 1,
//!                 name: "CA".into(),
//!                 coords: Point3D::new(x, y, z),
//!                 element: Some("C".into()),
//!                 temp_factor: 0.0,
//!             }],
//!         })
//!         .collect();
//!     Structure { id: id.into(), chains: vec![Chain::new('A', residues)] }
//! }
//!
//! // A centered tetrahedron and a copy translated by (5, 0, 0).
//! let mut reference = model(
//!     "REF",
//!     &[(1.0, 1.0, 1.0), (1.0, -1.0, -1.0), (-1.0, 1.0, -1.0), (-1.0, -1.0, 1.0)],
//! );
//! let mut computed = model(
//!     "MOB",
//!     &[(6.0, 1.0, 1.0), (6.0, -1.0, -1.0), (4.0, 1.0, -1.0), (4.0, -1.0, 1.0)],
//! );
//!
//! let addrs = reference.ca_addresses();
//! center_structure(&mut reference, &addrs)?;
//! align_optimally(&reference, &mut computed, &addrs, &addrs)?;
//! assert!(rmsd(&reference, &computed, &addrs, &addrs)? < 1e-9);
//! # Ok::<(), larmor_core::LarmorError>(())
//! ```

pub mod align;
pub mod ensemble;
pub mod geometry;
mod linalg;
pub mod quat;
pub mod rotation;
pub mod types;

pub use align::{
    align_fragments, align_optimally, center_structure, fragment_rotations, FragmentMap,
};
pub use ensemble::{
    build_distance_matrix, cluster, cluster_with, mean_positions, per_address_rmsf, Cluster,
    ClusterPolicy, DistanceMatrix, GreedyMedoid,
};
pub use geometry::{centroid_of, centroid_points, distance_points, rmsd, rmsd_points};
pub use quat::Quaternion;
pub use rotation::optimal_rotation;
pub use types::{Atom, AtomAddress, Chain, Point3D, Residue, Structure};

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn ca_structure(id: &str, points: &[Point3D]) -> Structure {
        let residues = points
            .iter()
            .enumerate()
            .map(|(i, p)| Residue {
                name: "GLY".into(),
                seq_num: i as i32 + 1,
                atoms: vec![Atom {
                    serial: i as u32 + 1,
                    name: "CA".into(),
                    coords: *p,
                    element: Some("C".into()),
                    temp_factor: 0.0,
                }],
            })
            .collect();
        Structure {
            id: id.into(),
            chains: vec![Chain::new('A', residues)],
        }
    }

    #[test]
    fn integration_superpose_and_cluster() {
        // Two tight conformations of an 6-point helix turn and one open one.
        let closed: Vec<Point3D> = (0..6)
            .map(|i| {
                let angle = i as f64 * 100.0_f64.to_radians();
                Point3D::new(2.3 * angle.cos(), 2.3 * angle.sin(), 1.5 * i as f64)
            })
            .collect();
        let open: Vec<Point3D> = closed.iter().map(|p| p.scale(2.0)).collect();

        let m0 = ca_structure("M0", &closed);
        let mut m1 = m0.clone();
        m1.translate(&Point3D::new(5.0, 0.0, 0.0));
        m1.rotate(&Quaternion::from_axis_angle(
            &Point3D::new(0.0, 0.0, 1.0),
            FRAC_PI_2,
        ));
        let m2 = ca_structure("M2", &open);

        let addrs = m0.ca_addresses();
        let ensemble = vec![m0, m1, m2];
        let matrix = build_distance_matrix(&ensemble, &addrs).unwrap();

        // Rigid motion vanishes; the opened conformation does not.
        assert!(matrix.get(0, 1) < 1e-9);
        assert!(matrix.get(0, 2) > 1.0);

        let clusters = cluster(&matrix, 0.5);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].members, vec![0, 1]);
        assert_eq!(clusters[1].members, vec![2]);

        // Precision statistics over the tight pair after alignment.
        let mut reference = ensemble[0].clone();
        center_structure(&mut reference, &addrs).unwrap();
        let mut mobile = ensemble[1].clone();
        align_optimally(&reference, &mut mobile, &addrs, &addrs).unwrap();
        let rmsf = per_address_rmsf(&[reference, mobile], &addrs).unwrap();
        assert!(rmsf.iter().all(|&f| f < 1e-9));
    }
}
