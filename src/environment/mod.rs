mod density;
mod local_rho;
mod subgroup;

pub use density::DensityContainer;
pub use local_rho::{AtomicCoefficients, KindSet, LocalRhoSet};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
pub use subgroup::{resolve_task_list, SubgroupEnv, SubgroupEnvBuilder};

/// Handle of the processes that cooperate on one response calculation. Inside this
/// program the members of a group are the worker threads of the dense matrix algebra.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessGroup {
    pub name: String,
    pub size: usize,
}

impl ProcessGroup {
    pub fn new(name: &str, size: usize) -> Self {
        assert!(size > 0, "a process group needs at least one member");
        Self {
            name: String::from(name),
            size,
        }
    }
}

/// Treatment of the basis functions on the grid. It is set once per calculation.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BasisTreatment {
    /// The full density is collocated on the grids.
    Standard,
    /// Hard and soft atom-centered densities (GAPW).
    Gapw,
    /// Soft densities are used only for the exchange-correlation term (GAPW-XC).
    GapwXc,
}

impl BasisTreatment {
    pub fn is_augmented(&self) -> bool {
        !matches!(self, BasisTreatment::Standard)
    }
}

/// Integer tags that distinguish real from complex wavefunctions.
#[derive(Serialize_repr, Deserialize_repr, Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WavefunctionKind {
    Real = 1,
    Complex = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize)]
    struct Tagged {
        treatment: BasisTreatment,
        wavefunction: WavefunctionKind,
    }

    #[test]
    fn tags_are_read_from_toml() {
        let tagged: Tagged = toml::from_str("treatment = \"gapw_xc\"\nwavefunction = 2").unwrap();
        assert_eq!(tagged.treatment, BasisTreatment::GapwXc);
        assert_eq!(tagged.wavefunction, WavefunctionKind::Complex);
        assert!(tagged.treatment.is_augmented());
        assert!(!BasisTreatment::Standard.is_augmented());
    }
}
