use crate::matrices::{BasisType, NeighborList};
use std::fmt;

/// The four task lists a response sub-group can hold. They differ in the basis set
/// whose products are collocated and whether only the soft part of the basis
/// functions is used.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TaskListKind {
    Orb,
    OrbSoft,
    AuxFit,
    AuxFitSoft,
}

impl TaskListKind {
    pub fn basis(&self) -> BasisType {
        match self {
            TaskListKind::Orb | TaskListKind::OrbSoft => BasisType::Primary,
            TaskListKind::AuxFit => BasisType::AuxFit,
            TaskListKind::AuxFitSoft => BasisType::AuxFitSoft,
        }
    }

    pub fn is_soft(&self) -> bool {
        matches!(self, TaskListKind::OrbSoft | TaskListKind::AuxFitSoft)
    }
}

impl fmt::Display for TaskListKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &str = match self {
            TaskListKind::Orb => "task_list_orb",
            TaskListKind::OrbSoft => "task_list_orb_soft",
            TaskListKind::AuxFit => "task_list_aux_fit",
            TaskListKind::AuxFitSoft => "task_list_aux_fit_soft",
        };
        write!(f, "{}", name)
    }
}

/// Precomputed schedule of atom-pair work items for the collocation of a density matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskList {
    pub kind: TaskListKind,
    pub tasks: Vec<(usize, usize)>,
}

impl TaskList {
    /// One task per atom pair of the neighbor list.
    pub fn from_neighbor_list(kind: TaskListKind, neighbors: &NeighborList) -> Self {
        Self {
            kind,
            tasks: neighbors.pairs().to_vec(),
        }
    }

    pub fn basis(&self) -> BasisType {
        self.kind.basis()
    }

    pub fn is_soft(&self) -> bool {
        self.kind.is_soft()
    }
}
