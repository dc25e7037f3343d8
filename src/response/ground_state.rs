use crate::environment::{
    resolve_task_list, BasisTreatment, DensityContainer, KindSet, LocalRhoSet, SubgroupEnv,
    WavefunctionKind,
};
use crate::grid::{GridEnv, GridFieldPair, TaskList, TaskListKind};
use crate::matrices::NeighborList;
use crate::response::logging::*;
use crate::services::{Services, Transpose};
use crate::utils::Timer;
use anyhow::Result;
use log::debug;
use ndarray::prelude::*;

/// Build the ground-state density of the response sub-group from the occupied MOs.
///
/// For every spin channel P = C_occ C_occ^T is formed in `work_matrix` (n_ao x n_ao) and
/// copied into the existing pattern of `rho_orb`; elements outside of the pattern are
/// dropped. A closed-shell singlet reference is scaled by two. The density is then
/// mapped onto the grids according to the basis treatment:
/// - standard: the primary task list is used.
/// - GAPW: the soft task list is used and the one-center densities of the sub-group are
///   refreshed, including the smooth compensation charge.
/// - GAPW-XC: the density is copied into `rho_xc`, collocated with the soft task list into
///   `rho_xc` and with the primary task list into a pool buffer that is copied back into
///   `rho_orb`. The one-center densities are refreshed without the smooth term.
///
/// `task_list_external` replaces the stored task list of the same kind and
/// `grid_env_external` replaces the grid environment of the sub-group.
///
/// # Panics
/// All operations are collective within the sub-group, so any inconsistency of the
/// arguments aborts the run before the first collaborator is called.
pub fn construct_ground_state_density(
    services: &mut Services,
    rho_orb: &mut DensityContainer,
    rho_xc: Option<&mut DensityContainer>,
    is_rks_triplets: bool,
    sub_env: &mut SubgroupEnv,
    work_matrix: &mut Array2<f64>,
    task_list_external: Option<&TaskList>,
    grid_env_external: Option<&mut GridEnv>,
) -> Result<()> {
    let timer: Timer = Timer::start();
    let n_spins: usize = sub_env.n_spins();
    let treatment: BasisTreatment = sub_env.basis_treatment;
    let wavefunction: WavefunctionKind = sub_env.wavefunction;

    assert!(n_spins > 0, "the sub-group holds no occupied orbitals");
    assert!(
        rho_orb.n_spins() > 0,
        "the ground-state density has to be allocated before it can be built"
    );
    assert_eq!(
        rho_orb.n_spins(),
        n_spins,
        "number of density matrices does not match the number of spin channels of the MOs"
    );
    assert_eq!(
        wavefunction,
        WavefunctionKind::Real,
        "the ground-state density can only be built from real MO coefficients"
    );
    let n_ao: usize = sub_env.n_ao();
    assert_eq!(
        work_matrix.dim(),
        (n_ao, n_ao),
        "work matrix has to be of shape n_ao x n_ao"
    );
    if treatment.is_augmented() {
        assert!(
            sub_env.local_rho_set.is_some(),
            "the one-center densities are required for the {:?} treatment",
            treatment
        );
    }
    let rho_xc: Option<&mut DensityContainer> = match treatment {
        BasisTreatment::GapwXc => {
            let rho_xc = rho_xc.expect("the GAPW-XC treatment requires a separate density");
            assert_eq!(rho_xc.n_spins(), n_spins);
            Some(rho_xc)
        }
        _ => None,
    };

    // the task lists are resolved before the first collective call
    let SubgroupEnv {
        mos_occ,
        para_env,
        grid_env,
        neighbors,
        task_list_orb,
        task_list_orb_soft,
        local_rho_set,
        ..
    } = sub_env;
    let task_list_orb: &TaskList =
        resolve_task_list(TaskListKind::Orb, Some(&*task_list_orb), task_list_external);
    let task_list_soft: Option<&TaskList> = match treatment {
        BasisTreatment::Standard => None,
        _ => Some(resolve_task_list(
            TaskListKind::OrbSoft,
            task_list_orb_soft.as_ref(),
            task_list_external,
        )),
    };
    let grid_env: &mut GridEnv = match grid_env_external {
        Some(external) => external,
        None => grid_env,
    };

    print_density_init(
        "Ground-state density",
        n_spins,
        treatment,
        wavefunction,
        &para_env.name,
    );

    for (ispin, mos) in mos_occ.iter().enumerate() {
        services.algebra.gemm(
            Transpose::No,
            Transpose::Yes,
            1.0,
            mos.view(),
            mos.view(),
            0.0,
            work_matrix,
        )?;
        services
            .bridge
            .dense_to_sparse(work_matrix.view(), &mut rho_orb.rho_ao[ispin], true)?;
    }
    // doubly occupied orbitals of a closed-shell singlet reference
    if n_spins == 1 && !is_rks_triplets {
        rho_orb.rho_ao[0].scale(2.0);
    }

    match (treatment, task_list_soft, rho_xc) {
        (BasisTreatment::Gapw, Some(task_list_soft), _) => {
            collocate(services, rho_orb, task_list_soft)?;
            refresh_local_densities(services, rho_orb, neighbors, local_rho_set.as_mut(), true)?;
        }
        (BasisTreatment::GapwXc, Some(task_list_soft), Some(rho_xc)) => {
            for ispin in 0..n_spins {
                rho_xc.rho_ao[ispin].copy_values_from(&rho_orb.rho_ao[ispin]);
                rho_xc.tot_rho_r[ispin] = services.grid.calculate_rho(
                    &rho_xc.rho_ao[ispin],
                    task_list_soft.basis(),
                    task_list_soft,
                    &mut rho_xc.fields[ispin],
                    task_list_soft.is_soft(),
                )?;
                print_spin_charge(ispin, &task_list_soft.kind.to_string(), rho_xc.tot_rho_r[ispin]);

                let mut buffer: GridFieldPair = grid_env.pool.create_pair();
                let charge: f64 = services.grid.calculate_rho(
                    &rho_xc.rho_ao[ispin],
                    task_list_orb.basis(),
                    task_list_orb,
                    &mut buffer,
                    task_list_orb.is_soft(),
                )?;
                rho_orb.fields[ispin].assign(&buffer);
                rho_orb.tot_rho_r[ispin] = charge;
                grid_env.pool.give_back(buffer);
                print_spin_charge(ispin, &task_list_orb.kind.to_string(), charge);
            }
            refresh_local_densities(services, rho_orb, neighbors, local_rho_set.as_mut(), false)?;
        }
        _ => {
            collocate(services, rho_orb, task_list_orb)?;
        }
    }

    print_density_end(rho_orb, timer);
    Ok(())
}

/// Collocate every spin channel of the density with one task list.
fn collocate(services: &mut Services, rho: &mut DensityContainer, task_list: &TaskList) -> Result<()> {
    for ((p, fields), tot) in rho
        .rho_ao
        .iter()
        .zip(rho.fields.iter_mut())
        .zip(rho.tot_rho_r.iter_mut())
    {
        *tot = services.grid.calculate_rho(
            p,
            task_list.basis(),
            task_list,
            fields,
            task_list.is_soft(),
        )?;
    }
    for (ispin, tot) in rho.tot_rho_r.iter().enumerate() {
        print_spin_charge(ispin, &task_list.kind.to_string(), *tot);
    }
    Ok(())
}

fn refresh_local_densities(
    services: &mut Services,
    rho_orb: &DensityContainer,
    neighbors: &NeighborList,
    local_rho_set: Option<&mut LocalRhoSet>,
    recompute_smooth: bool,
) -> Result<()> {
    if let Some(local_rho_set) = local_rho_set {
        services.atomic.refresh_coefficients(
            &rho_orb.rho_ao,
            local_rho_set,
            KindSet::Primary,
            neighbors,
        )?;
        services
            .atomic
            .prepare_augmentation(local_rho_set, recompute_smooth)?;
        debug!(
            "one-center densities of {} atoms refreshed",
            local_rho_set.n_atoms()
        );
    }
    Ok(())
}
