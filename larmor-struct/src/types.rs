//! Core types for macromolecular 3D structure representation.
//!
//! Structures are ordered, addressable collections of atom positions: every
//! atom is reachable through an [`AtomAddress`] (chain, residue, atom name),
//! and alignment operations mutate positions in place through the methods on
//! [`Structure`].

use std::fmt;

use larmor_core::{Annotated, ContentAddressable, Summarizable};
use sha2::{Digest, Sha256};

use crate::quat::Quaternion;

/// A point in 3D Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    /// Create a new point.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point3D) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Dot product.
    pub fn dot(&self, other: &Point3D) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product.
    pub fn cross(&self, other: &Point3D) -> Point3D {
        Point3D {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Vector magnitude.
    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Unit vector in the same direction, or zero if magnitude is zero.
    pub fn normalize(&self) -> Point3D {
        let n = self.norm();
        if n < 1e-15 {
            Point3D::zero()
        } else {
            Point3D {
                x: self.x / n,
                y: self.y / n,
                z: self.z / n,
            }
        }
    }

    /// Vector addition.
    pub fn add(&self, other: &Point3D) -> Point3D {
        Point3D {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Vector subtraction.
    pub fn sub(&self, other: &Point3D) -> Point3D {
        Point3D {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    /// Scalar multiplication.
    pub fn scale(&self, s: f64) -> Point3D {
        Point3D {
            x: self.x * s,
            y: self.y * s,
            z: self.z * s,
        }
    }
}

/// Composite address of one atom: chain id, residue sequence number, atom name.
///
/// Addresses are totally ordered and unique within one structure. Two address
/// lists being compared need not share addresses — only positional
/// correspondence matters (address *i* in one list pairs with address *i* in
/// the other).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomAddress {
    /// Single-character chain (subunit) identifier.
    pub chain: char,
    /// Residue sequence number within the chain.
    pub residue: i32,
    /// Atom name within the residue (e.g. "CA").
    pub atom: String,
}

impl AtomAddress {
    /// Create a new address.
    pub fn new(chain: char, residue: i32, atom: &str) -> Self {
        Self {
            chain,
            residue,
            atom: atom.into(),
        }
    }
}

impl fmt::Display for AtomAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.chain, self.residue, self.atom)
    }
}

/// A single atom in a macromolecular structure.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    /// Atom serial number.
    pub serial: u32,
    /// Atom name (e.g. "CA", "N", "CB").
    pub name: String,
    /// 3D coordinates in Angstroms.
    pub coords: Point3D,
    /// Element symbol.
    pub element: Option<String>,
    /// Temperature factor; NMR ensembles reuse this for per-atom precision.
    pub temp_factor: f64,
}

impl Atom {
    /// Whether this atom is a backbone atom (N, CA, C, O).
    pub fn is_backbone(&self) -> bool {
        let trimmed = self.name.trim();
        matches!(trimmed, "N" | "CA" | "C" | "O")
    }

    /// Whether this is an alpha carbon.
    pub fn is_alpha_carbon(&self) -> bool {
        self.name.trim() == "CA"
    }
}

/// A residue (amino acid or nucleotide) in a chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Residue {
    /// Three-letter residue name (e.g. "ALA", "GLY").
    pub name: String,
    /// Sequence number.
    pub seq_num: i32,
    /// Atoms belonging to this residue.
    pub atoms: Vec<Atom>,
}

impl Residue {
    /// Get an atom by name, returning the first match.
    pub fn get_atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name.trim() == name)
    }

    /// Get the alpha carbon atom.
    pub fn get_alpha_carbon(&self) -> Option<&Atom> {
        self.get_atom("CA")
    }
}

impl Annotated for Residue {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A polypeptide or polynucleotide chain.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Chain {
    /// Single-character chain identifier.
    pub id: char,
    /// Residues in this chain, in sequence order.
    pub residues: Vec<Residue>,
    /// String form of chain ID for trait impl.
    chain_id_str: String,
}

impl Chain {
    /// Create a new chain.
    pub fn new(id: char, residues: Vec<Residue>) -> Self {
        Self {
            id,
            residues,
            chain_id_str: format!("Chain {}", id),
        }
    }

    /// Number of residues.
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    /// Total number of atoms across all residues.
    pub fn atom_count(&self) -> usize {
        self.residues.iter().map(|r| r.atoms.len()).sum()
    }
}

impl Annotated for Chain {
    fn name(&self) -> &str {
        &self.chain_id_str
    }
}

/// A complete macromolecular structure (one or more chains).
///
/// The coordinate container is deliberately mutable: alignment and centering
/// move atoms in place rather than returning transformed copies, because
/// ensemble-wide pairwise alignment is performance sensitive.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Structure {
    /// PDB identifier or user-supplied name.
    pub id: String,
    /// Chains in this structure.
    pub chains: Vec<Chain>,
}

impl Structure {
    /// Number of chains.
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Total residues across all chains.
    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    /// Total atoms across all chains.
    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.atom_count()).sum()
    }

    /// Get a chain by its single-character ID.
    pub fn get_chain(&self, id: char) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    /// Position of the atom at `addr`, if present.
    pub fn position(&self, addr: &AtomAddress) -> Option<Point3D> {
        let chain = self.get_chain(addr.chain)?;
        let residue = chain.residues.iter().find(|r| r.seq_num == addr.residue)?;
        residue.get_atom(&addr.atom).map(|a| a.coords)
    }

    /// Mutable access to the position of the atom at `addr`.
    pub fn position_mut(&mut self, addr: &AtomAddress) -> Option<&mut Point3D> {
        let chain = self.chains.iter_mut().find(|c| c.id == addr.chain)?;
        let residue = chain
            .residues
            .iter_mut()
            .find(|r| r.seq_num == addr.residue)?;
        let atom = residue
            .atoms
            .iter_mut()
            .find(|a| a.name.trim() == addr.atom)?;
        Some(&mut atom.coords)
    }

    /// Gather positions for an ordered address list.
    ///
    /// # Errors
    ///
    /// Fails fast on the first address with no matching atom.
    pub fn positions_of(&self, addrs: &[AtomAddress]) -> larmor_core::Result<Vec<Point3D>> {
        addrs
            .iter()
            .map(|addr| {
                self.position(addr).ok_or_else(|| {
                    larmor_core::LarmorError::InvalidInput(format!("no atom at address {}", addr))
                })
            })
            .collect()
    }

    /// Addresses of all alpha carbons, in chain and sequence order.
    ///
    /// The usual correspondence list for backbone superposition of conformers
    /// that share a sequence.
    pub fn ca_addresses(&self) -> Vec<AtomAddress> {
        let mut addrs = Vec::new();
        for chain in &self.chains {
            for residue in &chain.residues {
                if residue.get_alpha_carbon().is_some() {
                    addrs.push(AtomAddress::new(chain.id, residue.seq_num, "CA"));
                }
            }
        }
        addrs
    }

    /// Geometric centroid of all atoms.
    pub fn centroid(&self) -> Point3D {
        let mut sum = Point3D::zero();
        let mut count = 0usize;
        for chain in &self.chains {
            for residue in &chain.residues {
                for atom in &residue.atoms {
                    sum = sum.add(&atom.coords);
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Point3D::zero();
        }
        sum.scale(1.0 / count as f64)
    }

    /// Translate every atom by `delta`, in place.
    pub fn translate(&mut self, delta: &Point3D) {
        for chain in &mut self.chains {
            for residue in &mut chain.residues {
                for atom in &mut residue.atoms {
                    atom.coords = atom.coords.add(delta);
                }
            }
        }
    }

    /// Rotate every atom about the origin by `q`, in place.
    pub fn rotate(&mut self, q: &Quaternion) {
        for chain in &mut self.chains {
            for residue in &mut chain.residues {
                for atom in &mut residue.atoms {
                    atom.coords = q.rotate_point(&atom.coords);
                }
            }
        }
    }
}

impl Annotated for Structure {
    fn name(&self) -> &str {
        &self.id
    }
}

impl Summarizable for Structure {
    fn summary(&self) -> String {
        format!(
            "Structure {} — {} chain(s), {} residue(s), {} atom(s)",
            self.id,
            self.chain_count(),
            self.residue_count(),
            self.atom_count(),
        )
    }
}

impl ContentAddressable for Structure {
    fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.id.as_bytes());
        for chain in &self.chains {
            hasher.update([chain.id as u8]);
            for residue in &chain.residues {
                hasher.update(residue.name.as_bytes());
                hasher.update(residue.seq_num.to_le_bytes());
                for atom in &residue.atoms {
                    hasher.update(atom.name.as_bytes());
                    hasher.update(atom.coords.x.to_le_bytes());
                    hasher.update(atom.coords.y.to_le_bytes());
                    hasher.update(atom.coords.z.to_le_bytes());
                }
            }
        }
        hex::encode(hasher.finalize())
    }
}
