use ndarray::prelude::*;
use std::fmt;

/// Set of atomic kinds whose one-center densities are stored in a `LocalRhoSet`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KindSet {
    Primary,
    AuxFit,
}

impl fmt::Display for KindSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KindSet::Primary => write!(f, "primary"),
            KindSet::AuxFit => write!(f, "aux_fit"),
        }
    }
}

/// One-center expansion coefficients of a single atom, one matrix per spin channel.
#[derive(Clone, Debug, Default)]
pub struct AtomicCoefficients {
    pub hard: Vec<Array2<f64>>,
    pub soft: Vec<Array2<f64>>,
}

/// Atom-centered correction container of the augmented (GAPW) basis treatment.
#[derive(Clone, Debug)]
pub struct LocalRhoSet {
    pub kinds: KindSet,
    /// Fraction of the on-site density that is represented by the soft part, per atom.
    pub soft_fraction: Vec<f64>,
    pub atoms: Vec<AtomicCoefficients>,
    /// Compensation charge of every atom: Σ_σ tr(hard - soft)
    pub rho0_mpole: Array1<f64>,
    /// Smooth zero-multipole term (total compensation charge).
    pub rho0_smooth: f64,
}

impl LocalRhoSet {
    pub fn new(kinds: KindSet, soft_fraction: Vec<f64>) -> Self {
        let n_atoms: usize = soft_fraction.len();
        Self {
            kinds,
            soft_fraction,
            atoms: vec![AtomicCoefficients::default(); n_atoms],
            rho0_mpole: Array1::zeros(n_atoms),
            rho0_smooth: 0.0,
        }
    }

    pub fn n_atoms(&self) -> usize {
        self.atoms.len()
    }
}
