use crate::environment::{BasisTreatment, LocalRhoSet, ProcessGroup, WavefunctionKind};
use crate::grid::{GridEnv, TaskList, TaskListKind};
use crate::matrices::NeighborList;
use derive_builder::Builder;
use ndarray::prelude::*;

/// Everything a response sub-group needs to build densities. The environment lives as
/// long as one response calculation. Apart from the atom-centered correction
/// container and the grid pool it is not changed by the density constructors.
#[derive(Builder, Clone, Debug)]
pub struct SubgroupEnv {
    /// Occupied MO coefficients (n_ao x n_occ) of every spin channel.
    pub mos_occ: Vec<Array2<f64>>,
    pub para_env: ProcessGroup,
    pub grid_env: GridEnv,
    pub neighbors: NeighborList,
    #[builder(default = "BasisTreatment::Standard")]
    pub basis_treatment: BasisTreatment,
    #[builder(default = "WavefunctionKind::Real")]
    pub wavefunction: WavefunctionKind,
    pub task_list_orb: TaskList,
    #[builder(default, setter(strip_option))]
    pub task_list_orb_soft: Option<TaskList>,
    #[builder(default, setter(strip_option))]
    pub task_list_aux_fit: Option<TaskList>,
    #[builder(default, setter(strip_option))]
    pub task_list_aux_fit_soft: Option<TaskList>,
    /// Projection operator from the primary into the auxiliary fitting basis
    /// (n_aux x n_ao). Only present if ADMM is used.
    #[builder(default, setter(strip_option))]
    pub admm_a: Option<Array2<f64>>,
    /// One-center densities of the primary basis (GAPW and GAPW-XC only).
    #[builder(default, setter(strip_option))]
    pub local_rho_set: Option<LocalRhoSet>,
}

impl SubgroupEnv {
    pub fn n_spins(&self) -> usize {
        self.mos_occ.len()
    }

    /// Number of primary basis functions.
    pub fn n_ao(&self) -> usize {
        self.mos_occ[0].nrows()
    }

    /// Returns the task list of the requested kind. A list that is passed in from outside
    /// takes precedence over the one stored in the environment.
    pub fn task_list<'a>(
        &'a self,
        kind: TaskListKind,
        external: Option<&'a TaskList>,
    ) -> &'a TaskList {
        let stored: Option<&TaskList> = match kind {
            TaskListKind::Orb => Some(&self.task_list_orb),
            TaskListKind::OrbSoft => self.task_list_orb_soft.as_ref(),
            TaskListKind::AuxFit => self.task_list_aux_fit.as_ref(),
            TaskListKind::AuxFitSoft => self.task_list_aux_fit_soft.as_ref(),
        };
        resolve_task_list(kind, stored, external)
    }
}

/// Fallback rule of the optional task lists: a supplied list of the requested kind
/// replaces the stored one, lists of other kinds are not used.
///
/// # Panics
/// If neither a matching supplied list nor a stored list exists.
pub fn resolve_task_list<'a>(
    kind: TaskListKind,
    stored: Option<&'a TaskList>,
    external: Option<&'a TaskList>,
) -> &'a TaskList {
    match (external.filter(|task_list| task_list.kind == kind), stored) {
        (Some(task_list), _) => task_list,
        (None, Some(task_list)) => task_list,
        (None, None) => panic!("{} has not been set up for this sub-group", kind),
    }
}
