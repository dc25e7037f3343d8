use crate::environment::{DensityContainer, KindSet, LocalRhoSet, SubgroupEnv};
use crate::grid::{TaskList, TaskListKind};
use crate::matrices::BlockSparseMatrix;
use crate::response::logging::*;
use crate::services::{Services, Transpose};
use crate::utils::Timer;
use anyhow::Result;
use ndarray::prelude::*;

/// Project the primary-basis density into the auxiliary fitting basis of ADMM and
/// map it onto the grids.
///
/// With the projection operator A (n_aux x n_ao) every spin channel is transformed as
///     P_aux = A P A^T
/// using the dense work matrices `wfm_rho_orb` (n_ao x n_ao), `wfm_aux_orb` (n_aux x n_ao)
/// and `wfm_rho_aux_fit` (n_aux x n_aux), which are all overwritten. The result is copied
/// into the existing pattern of `rho_aux_fit` and collocated with the soft auxiliary
/// task list if the basis treatment is augmented, otherwise with the auxiliary task
/// list. For the augmented treatment the one-center densities of the auxiliary basis
/// in `local_rho_set_aux` are refreshed afterwards, the smooth compensation term is
/// not recomputed. `task_list_external` replaces the stored task list of the same kind.
///
/// # Panics
/// If the sub-group was set up without a projection operator (ADMM is not used), or if
/// the shapes of the arguments do not match. Nothing is computed in this case.
pub fn construct_aux_fit_density(
    services: &mut Services,
    rho_orb_ao: &[BlockSparseMatrix],
    rho_aux_fit: &mut DensityContainer,
    local_rho_set_aux: Option<&mut LocalRhoSet>,
    sub_env: &SubgroupEnv,
    wfm_rho_orb: &mut Array2<f64>,
    wfm_rho_aux_fit: &mut Array2<f64>,
    wfm_aux_orb: &mut Array2<f64>,
    task_list_external: Option<&TaskList>,
) -> Result<()> {
    let admm_a: &Array2<f64> = match sub_env.admm_a.as_ref() {
        Some(admm_a) => admm_a,
        None => panic!("the auxiliary density fitting (ADMM) has not been set up for this sub-group"),
    };
    let timer: Timer = Timer::start();
    let (n_aux, n_ao): (usize, usize) = admm_a.dim();
    let n_spins: usize = sub_env.n_spins();
    let augmented: bool = sub_env.basis_treatment.is_augmented();

    assert_eq!(
        rho_orb_ao.len(),
        n_spins,
        "number of primary density matrices does not match the number of spin channels"
    );
    assert_eq!(
        rho_aux_fit.n_spins(),
        n_spins,
        "number of auxiliary density matrices does not match the number of spin channels"
    );
    assert_eq!(wfm_rho_orb.dim(), (n_ao, n_ao), "work matrix has to be n_ao x n_ao");
    assert_eq!(wfm_aux_orb.dim(), (n_aux, n_ao), "work matrix has to be n_aux x n_ao");
    assert_eq!(
        wfm_rho_aux_fit.dim(),
        (n_aux, n_aux),
        "work matrix has to be n_aux x n_aux"
    );
    let local_rho_set_aux: Option<&mut LocalRhoSet> = match (augmented, local_rho_set_aux) {
        (true, None) => panic!("the one-center densities of the auxiliary basis are missing"),
        (true, local) => local,
        (false, _) => None,
    };
    let task_list: &TaskList = match augmented {
        true => sub_env.task_list(TaskListKind::AuxFitSoft, task_list_external),
        false => sub_env.task_list(TaskListKind::AuxFit, task_list_external),
    };

    print_density_init(
        "Auxiliary-fit density (ADMM)",
        n_spins,
        sub_env.basis_treatment,
        sub_env.wavefunction,
        &sub_env.para_env.name,
    );

    for ispin in 0..n_spins {
        services
            .bridge
            .sparse_to_dense(&rho_orb_ao[ispin], wfm_rho_orb)?;
        // A P
        services.algebra.gemm(
            Transpose::No,
            Transpose::No,
            1.0,
            admm_a.view(),
            wfm_rho_orb.view(),
            0.0,
            wfm_aux_orb,
        )?;
        // (A P) A^T
        services.algebra.gemm(
            Transpose::No,
            Transpose::Yes,
            1.0,
            wfm_aux_orb.view(),
            admm_a.view(),
            0.0,
            wfm_rho_aux_fit,
        )?;
        services.bridge.dense_to_sparse(
            wfm_rho_aux_fit.view(),
            &mut rho_aux_fit.rho_ao[ispin],
            true,
        )?;
        rho_aux_fit.tot_rho_r[ispin] = services.grid.calculate_rho(
            &rho_aux_fit.rho_ao[ispin],
            task_list.basis(),
            task_list,
            &mut rho_aux_fit.fields[ispin],
            task_list.is_soft(),
        )?;
        print_spin_charge(ispin, &task_list.kind.to_string(), rho_aux_fit.tot_rho_r[ispin]);
    }

    if let Some(local_rho_set) = local_rho_set_aux {
        services.atomic.refresh_coefficients(
            &rho_aux_fit.rho_ao,
            local_rho_set,
            KindSet::AuxFit,
            &sub_env.neighbors,
        )?;
        services.atomic.prepare_augmentation(local_rho_set, false)?;
    }

    print_density_end(rho_aux_fit, timer);
    Ok(())
}
