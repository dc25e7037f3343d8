mod block_sparse;

pub use block_sparse::BlockSparseMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Basis set in which the rows and columns of a density matrix are expressed.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BasisType {
    Primary,
    AuxFit,
    AuxFitSoft,
}

impl fmt::Display for BasisType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &str = match self {
            BasisType::Primary => "ORB",
            BasisType::AuxFit => "AUX_FIT",
            BasisType::AuxFitSoft => "AUX_FIT_SOFT",
        };
        write!(f, "{}", name)
    }
}

/// Atom pairs within the interaction cutoff. Both orderings of a pair are stored,
/// so that the list can be used directly as the block pattern of a full matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborList {
    pub n_atoms: usize,
    pairs: Vec<(usize, usize)>,
}

impl NeighborList {
    /// Every atom is a neighbor of every other atom.
    pub fn full(n_atoms: usize) -> Self {
        let pairs: Vec<(usize, usize)> = (0..n_atoms)
            .flat_map(|i| (0..n_atoms).map(move |j| (i, j)))
            .collect();
        Self { n_atoms, pairs }
    }

    /// Build the list from explicit pairs. The on-site pairs (i, i) are always added.
    pub fn from_pairs(n_atoms: usize, pairs: &[(usize, usize)]) -> Self {
        let mut all: Vec<(usize, usize)> = (0..n_atoms).map(|i| (i, i)).collect();
        for &(i, j) in pairs.iter() {
            assert!(
                i < n_atoms && j < n_atoms,
                "neighbor pair ({}, {}) refers to an atom outside of 0..{}",
                i,
                j,
                n_atoms
            );
            all.push((i, j));
            all.push((j, i));
        }
        all.sort_unstable();
        all.dedup();
        Self { n_atoms, pairs: all }
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }
}
