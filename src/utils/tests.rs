//! Model system and recording collaborators that are shared by the tests of the
//! density constructors.
use crate::environment::*;
use crate::grid::{GridEnv, GridFieldPair, TaskList, TaskListKind};
use crate::matrices::{BasisType, BlockSparseMatrix, NeighborList};
use crate::response::{construct_aux_fit_density, construct_ground_state_density};
use crate::services::*;
use anyhow::Result;
use ndarray::prelude::*;
use std::cell::Cell;

pub use crate::defaults::SOFT_FRACTION;

/// Number of atoms of the model system. Every atom carries one primary and one
/// auxiliary basis function.
pub const N_ATOMS: usize = 2;
pub const BLK_SIZES: [usize; N_ATOMS] = [1, 1];
pub const N_POINTS: usize = 4;
pub const N_RECIP: usize = 3;

pub struct RecordingAlgebra {
    inner: GroupAlgebra,
    pub calls: Cell<usize>,
}

impl DenseAlgebra for RecordingAlgebra {
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: ArrayView2<f64>,
        b: ArrayView2<f64>,
        beta: f64,
        c: &mut Array2<f64>,
    ) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.gemm(trans_a, trans_b, alpha, a, b, beta, c)
    }
}

pub struct RecordingBridge {
    inner: BlockBridge,
    pub calls: Cell<usize>,
}

impl SparseDenseBridge for RecordingBridge {
    fn dense_to_sparse(
        &self,
        dense: ArrayView2<f64>,
        sparse: &mut BlockSparseMatrix,
        keep_sparsity: bool,
    ) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.dense_to_sparse(dense, sparse, keep_sparsity)
    }

    fn sparse_to_dense(&self, sparse: &BlockSparseMatrix, dense: &mut Array2<f64>) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        self.inner.sparse_to_dense(sparse, dense)
    }
}

pub struct RecordingGrid {
    inner: CollocationGrid,
    pub calls: Vec<(TaskListKind, BasisType, bool)>,
    pub fail: bool,
}

impl GridAccumulator for RecordingGrid {
    fn calculate_rho(
        &mut self,
        matrix: &BlockSparseMatrix,
        basis: BasisType,
        task_list: &TaskList,
        fields: &mut GridFieldPair,
        soft_valid: bool,
    ) -> Result<f64> {
        self.calls.push((task_list.kind, basis, soft_valid));
        if self.fail {
            return Err(ServiceError::new("collocation", String::from("task list rejected")).into());
        }
        self.inner
            .calculate_rho(matrix, basis, task_list, fields, soft_valid)
    }
}

pub struct RecordingAtomic {
    inner: OneCenterProjector,
    pub events: Vec<String>,
}

impl AtomicCorrection for RecordingAtomic {
    fn refresh_coefficients(
        &mut self,
        rho_ao: &[BlockSparseMatrix],
        local_rho_set: &mut LocalRhoSet,
        kinds: KindSet,
        neighbors: &NeighborList,
    ) -> Result<()> {
        self.events.push(format!("refresh {}", kinds));
        self.inner
            .refresh_coefficients(rho_ao, local_rho_set, kinds, neighbors)
    }

    fn prepare_augmentation(
        &mut self,
        local_rho_set: &mut LocalRhoSet,
        recompute_smooth: bool,
    ) -> Result<()> {
        self.events
            .push(format!("prepare smooth={}", recompute_smooth));
        self.inner
            .prepare_augmentation(local_rho_set, recompute_smooth)
    }
}

/// Two atoms with orthonormal basis functions that live on separate grid points, so
/// that the integrated charge equals the trace of the density matrix.
pub struct Model {
    pub env: SubgroupEnv,
    pub algebra: RecordingAlgebra,
    pub bridge: RecordingBridge,
    pub grid: RecordingGrid,
    pub atomic: RecordingAtomic,
}

impl Model {
    pub fn new(treatment: BasisTreatment, mos_occ: Vec<Array2<f64>>) -> Self {
        Self::with_neighbors(treatment, mos_occ, &[(0, 1)])
    }

    pub fn with_neighbors(
        treatment: BasisTreatment,
        mos_occ: Vec<Array2<f64>>,
        pairs: &[(usize, usize)],
    ) -> Self {
        let neighbors: NeighborList = NeighborList::from_pairs(N_ATOMS, pairs);
        let group: ProcessGroup = ProcessGroup::new("response", 2);
        let mut builder = SubgroupEnvBuilder::default();
        builder
            .mos_occ(mos_occ)
            .para_env(group.clone())
            .grid_env(GridEnv::new(N_POINTS, N_RECIP))
            .basis_treatment(treatment)
            .task_list_orb(TaskList::from_neighbor_list(TaskListKind::Orb, &neighbors))
            .task_list_orb_soft(TaskList::from_neighbor_list(TaskListKind::OrbSoft, &neighbors))
            .task_list_aux_fit(TaskList::from_neighbor_list(TaskListKind::AuxFit, &neighbors))
            .task_list_aux_fit_soft(TaskList::from_neighbor_list(
                TaskListKind::AuxFitSoft,
                &neighbors,
            ))
            .neighbors(neighbors);
        if treatment.is_augmented() {
            builder.local_rho_set(LocalRhoSet::new(
                KindSet::Primary,
                vec![SOFT_FRACTION; N_ATOMS],
            ));
        }
        let env: SubgroupEnv = builder.build().unwrap();

        let phi_orb: Array2<f64> = array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0], [0.0, 0.0]];
        let phi_aux: Array2<f64> = array![[0.0, 0.0], [0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let soft: f64 = SOFT_FRACTION.sqrt();
        let collocation: CollocationGrid = CollocationGrid::new(1.0)
            .with_table(BasisType::Primary, phi_orb.clone(), Some(soft * &phi_orb))
            .with_table(BasisType::AuxFit, phi_aux.clone(), Some(soft * &phi_aux));

        Self {
            env,
            algebra: RecordingAlgebra {
                inner: GroupAlgebra::new(group),
                calls: Cell::new(0),
            },
            bridge: RecordingBridge {
                inner: BlockBridge::default(),
                calls: Cell::new(0),
            },
            grid: RecordingGrid {
                inner: collocation,
                calls: Vec::new(),
                fail: false,
            },
            atomic: RecordingAtomic {
                inner: OneCenterProjector::default(),
                events: Vec::new(),
            },
        }
    }

    pub fn with_projection(mut self, admm_a: Array2<f64>) -> Self {
        self.env.admm_a = Some(admm_a);
        self
    }

    pub fn primary_density(&self) -> DensityContainer {
        DensityContainer::new(
            BasisType::Primary,
            &BLK_SIZES,
            &self.env.neighbors,
            self.env.n_spins(),
            &self.env.grid_env,
        )
    }

    pub fn aux_fit_density(&self) -> DensityContainer {
        DensityContainer::new(
            BasisType::AuxFit,
            &BLK_SIZES,
            &self.env.neighbors,
            self.env.n_spins(),
            &self.env.grid_env,
        )
    }

    pub fn ground_state(
        &mut self,
        rho_orb: &mut DensityContainer,
        rho_xc: Option<&mut DensityContainer>,
        is_rks_triplets: bool,
        work_matrix: &mut Array2<f64>,
    ) -> Result<()> {
        self.ground_state_with(rho_orb, rho_xc, is_rks_triplets, work_matrix, None, None)
    }

    pub fn ground_state_with(
        &mut self,
        rho_orb: &mut DensityContainer,
        rho_xc: Option<&mut DensityContainer>,
        is_rks_triplets: bool,
        work_matrix: &mut Array2<f64>,
        task_list_external: Option<&TaskList>,
        grid_env_external: Option<&mut GridEnv>,
    ) -> Result<()> {
        let mut services = Services {
            algebra: &self.algebra,
            bridge: &self.bridge,
            grid: &mut self.grid,
            atomic: &mut self.atomic,
        };
        construct_ground_state_density(
            &mut services,
            rho_orb,
            rho_xc,
            is_rks_triplets,
            &mut self.env,
            work_matrix,
            task_list_external,
            grid_env_external,
        )
    }

    /// Auxiliary-fit density with work matrices of the correct shape.
    pub fn aux_fit(
        &mut self,
        rho_orb_ao: &[BlockSparseMatrix],
        rho_aux_fit: &mut DensityContainer,
        local_rho_set_aux: Option<&mut LocalRhoSet>,
    ) -> Result<()> {
        let n_ao: usize = BLK_SIZES.iter().sum();
        let n_aux: usize = BLK_SIZES.iter().sum();
        let mut work = AuxFitWork {
            rho_orb: Array2::zeros((n_ao, n_ao)),
            rho_aux_fit: Array2::zeros((n_aux, n_aux)),
            aux_orb: Array2::zeros((n_aux, n_ao)),
        };
        self.aux_fit_with(rho_orb_ao, rho_aux_fit, local_rho_set_aux, &mut work, None)
    }

    pub fn aux_fit_with(
        &mut self,
        rho_orb_ao: &[BlockSparseMatrix],
        rho_aux_fit: &mut DensityContainer,
        local_rho_set_aux: Option<&mut LocalRhoSet>,
        work: &mut AuxFitWork,
        task_list_external: Option<&TaskList>,
    ) -> Result<()> {
        let mut services = Services {
            algebra: &self.algebra,
            bridge: &self.bridge,
            grid: &mut self.grid,
            atomic: &mut self.atomic,
        };
        construct_aux_fit_density(
            &mut services,
            rho_orb_ao,
            rho_aux_fit,
            local_rho_set_aux,
            &self.env,
            &mut work.rho_orb,
            &mut work.rho_aux_fit,
            &mut work.aux_orb,
            task_list_external,
        )
    }

    /// Number of calls made to the algebra, bridge, grid and one-center collaborators.
    pub fn collaborator_calls(&self) -> [usize; 4] {
        [
            self.algebra.calls.get(),
            self.bridge.calls.get(),
            self.grid.calls.len(),
            self.atomic.events.len(),
        ]
    }

    /// Runs `f`, which has to panic, and checks that no collaborator was called before.
    /// Returns the panic message.
    pub fn panics_before_any_call<F: FnOnce(&mut Model)>(&mut self, f: F) -> String {
        let before: [usize; 4] = self.collaborator_calls();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(self)));
        let message: String = match result {
            Ok(_) => panic!("the call did not panic"),
            Err(payload) => match payload.downcast_ref::<String>() {
                Some(message) => message.clone(),
                None => payload
                    .downcast_ref::<&str>()
                    .map(|message| message.to_string())
                    .unwrap_or_default(),
            },
        };
        assert_eq!(self.collaborator_calls(), before);
        message
    }
}

/// Dense work matrices of the auxiliary-fit density.
pub struct AuxFitWork {
    pub rho_orb: Array2<f64>,
    pub rho_aux_fit: Array2<f64>,
    pub aux_orb: Array2<f64>,
}

/// Dense copy of a block-sparse matrix.
pub fn dense(p: &BlockSparseMatrix) -> Array2<f64> {
    let mut d: Array2<f64> = Array2::zeros((p.nrows(), p.ncols()));
    BlockBridge::default().sparse_to_dense(p, &mut d).unwrap();
    d
}
