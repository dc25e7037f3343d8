use crate::environment::*;
use crate::grid::{GridEnv, TaskList, TaskListKind};
use crate::io::{read_matrix, Configuration, SystemConfig};
use crate::matrices::{BasisType, NeighborList};
use crate::response::{construct_aux_fit_density, construct_ground_state_density};
use crate::services::*;
use anyhow::{bail, Result};
use log::info;
use ndarray::prelude::*;
use std::convert::TryFrom;

/// Type that holds a response sub-group together with the collaborators that operate on
/// it. It is created once from the occupied MOs and the configuration and can then build
/// the ground-state and auxiliary-fit densities.
pub struct ResponseSystem {
    /// Type that holds all the input settings from the user.
    pub config: Configuration,
    pub env: SubgroupEnv,
    /// Number of primary basis functions of every atom.
    pub primary_blk_sizes: Vec<usize>,
    /// Number of auxiliary basis functions of every atom (ADMM only).
    pub aux_blk_sizes: Vec<usize>,
    pub algebra: GroupAlgebra,
    pub bridge: BlockBridge,
    pub grid: CollocationGrid,
    pub atomic: OneCenterProjector,
}

/// Densities that are produced by one run of the sub-group.
#[derive(Clone, Debug)]
pub struct ResponseDensities {
    pub rho_orb: DensityContainer,
    /// Separate density of the exchange-correlation term (GAPW-XC only).
    pub rho_xc: Option<DensityContainer>,
    pub rho_aux_fit: Option<DensityContainer>,
    /// One-center densities of the auxiliary basis (augmented ADMM only).
    pub local_rho_set_aux: Option<LocalRhoSet>,
}

impl TryFrom<(Vec<Array2<f64>>, Configuration)> for ResponseSystem {
    type Error = anyhow::Error;

    /// Creates a new [ResponseSystem] from the occupied MO coefficients of every spin
    /// channel and the global [Configuration]. The collocation tables and the ADMM
    /// projection operator are read from the files that are named in the configuration.
    fn try_from(input: (Vec<Array2<f64>>, Configuration)) -> Result<Self> {
        let (mos_occ, config) = input;
        let phi_orb: Array2<f64> = read_matrix(&config.grid.primary_collocation)?;
        let aux: Option<(Array2<f64>, Array2<f64>)> = if config.admm.use_admm {
            Some((
                read_matrix(&config.admm.projection)?,
                read_matrix(&config.grid.aux_collocation)?,
            ))
        } else {
            None
        };
        Self::from_parts(mos_occ, config, phi_orb, aux)
    }
}

impl ResponseSystem {
    /// Set up the sub-group from matrices that are already in memory. `aux` contains the
    /// projection operator (n_aux x n_ao) and the auxiliary collocation table
    /// (n_points x n_aux).
    pub fn from_parts(
        mos_occ: Vec<Array2<f64>>,
        config: Configuration,
        phi_orb: Array2<f64>,
        aux: Option<(Array2<f64>, Array2<f64>)>,
    ) -> Result<Self> {
        if mos_occ.is_empty() || mos_occ.len() > 2 {
            bail!("{} spin channels are not supported", mos_occ.len());
        }
        let n_ao: usize = mos_occ[0].nrows();
        if mos_occ.iter().any(|c| c.nrows() != n_ao) {
            bail!("the MO coefficients of the spin channels differ in the number of AOs");
        }
        if phi_orb.ncols() != n_ao {
            bail!(
                "the primary collocation table holds {} basis functions, but there are {} AOs",
                phi_orb.ncols(),
                n_ao
            );
        }
        if config.subgroup.group_size == 0 {
            bail!("the response sub-group needs at least one member");
        }
        let treatment: BasisTreatment = config.response.basis_treatment;
        if !(0.0..=1.0).contains(&config.system.soft_fraction) {
            bail!(
                "the soft fraction {} is outside of [0, 1]",
                config.system.soft_fraction
            );
        }

        if config.response.wavefunction != WavefunctionKind::Real {
            bail!("densities of complex wavefunctions are not supported");
        }

        let primary_blk_sizes: Vec<usize> =
            SystemConfig::block_sizes(&config.system.primary_block_sizes, n_ao)?;
        let n_atoms: usize = primary_blk_sizes.len();
        let neighbors: NeighborList = config.system.neighbor_list(n_atoms)?;

        let n_points: usize = phi_orb.nrows();
        let n_recip: usize = match config.grid.n_recip {
            0 => n_points,
            n if n <= n_points => n,
            n => bail!(
                "{} reciprocal-space components requested for a grid with {} points",
                n,
                n_points
            ),
        };
        let soft_scale: f64 = config.system.soft_fraction.sqrt();
        let mut grid: CollocationGrid = CollocationGrid::new(config.grid.dvol).with_table(
            BasisType::Primary,
            phi_orb.clone(),
            Some(soft_scale * &phi_orb),
        );

        let group: ProcessGroup = ProcessGroup::new("response", config.subgroup.group_size);
        let mut builder = SubgroupEnvBuilder::default();
        builder
            .mos_occ(mos_occ)
            .para_env(group.clone())
            .grid_env(GridEnv::new(n_points, n_recip))
            .basis_treatment(treatment)
            .wavefunction(config.response.wavefunction)
            .task_list_orb(TaskList::from_neighbor_list(TaskListKind::Orb, &neighbors));
        if treatment.is_augmented() {
            builder
                .task_list_orb_soft(TaskList::from_neighbor_list(
                    TaskListKind::OrbSoft,
                    &neighbors,
                ))
                .local_rho_set(LocalRhoSet::new(
                    KindSet::Primary,
                    vec![config.system.soft_fraction; n_atoms],
                ));
        }

        let mut aux_blk_sizes: Vec<usize> = Vec::new();
        if let Some((admm_a, phi_aux)) = aux {
            let n_aux: usize = admm_a.nrows();
            if admm_a.ncols() != n_ao {
                bail!(
                    "the projection operator has {} columns, but there are {} AOs",
                    admm_a.ncols(),
                    n_ao
                );
            }
            if phi_aux.dim() != (n_points, n_aux) {
                bail!(
                    "the auxiliary collocation table has shape {:?}, expected ({}, {})",
                    phi_aux.dim(),
                    n_points,
                    n_aux
                );
            }
            aux_blk_sizes = match (config.system.aux_block_sizes.is_empty(), n_atoms) {
                (true, 1) => vec![n_aux],
                (true, _) => bail!("the auxiliary block sizes are required for more than one atom"),
                (false, _) => SystemConfig::block_sizes(&config.system.aux_block_sizes, n_aux)?,
            };
            if aux_blk_sizes.len() != n_atoms {
                bail!(
                    "{} auxiliary blocks are given for {} atoms",
                    aux_blk_sizes.len(),
                    n_atoms
                );
            }
            grid = grid.with_table(
                BasisType::AuxFit,
                phi_aux.clone(),
                Some(soft_scale * &phi_aux),
            );
            builder
                .task_list_aux_fit(TaskList::from_neighbor_list(
                    TaskListKind::AuxFit,
                    &neighbors,
                ))
                .task_list_aux_fit_soft(TaskList::from_neighbor_list(
                    TaskListKind::AuxFitSoft,
                    &neighbors,
                ))
                .admm_a(admm_a);
        }
        let env: SubgroupEnv = builder.neighbors(neighbors).build()?;

        info!("{: <25} {}", "number of atoms:", n_atoms);
        info!("{: <25} {}", "number of AOs:", n_ao);
        info!("{: <25} {}", "grid points:", n_points);
        if !aux_blk_sizes.is_empty() {
            info!("{: <25} {}", "auxiliary functions:", aux_blk_sizes.iter().sum::<usize>());
        }

        Ok(Self {
            config,
            env,
            primary_blk_sizes,
            aux_blk_sizes,
            algebra: GroupAlgebra::new(group),
            bridge: BlockBridge::default(),
            grid,
            atomic: OneCenterProjector::default(),
        })
    }

    pub fn use_admm(&self) -> bool {
        self.env.admm_a.is_some()
    }

    fn density(&self, basis: BasisType) -> DensityContainer {
        let blk_sizes: &[usize] = match basis {
            BasisType::Primary => &self.primary_blk_sizes,
            _ => &self.aux_blk_sizes,
        };
        DensityContainer::new(
            basis,
            blk_sizes,
            &self.env.neighbors,
            self.env.n_spins(),
            &self.env.grid_env,
        )
    }

    /// Build the ground-state density and, if ADMM is used, its projection into the
    /// auxiliary fitting basis.
    pub fn run(&mut self) -> Result<ResponseDensities> {
        let n_ao: usize = self.env.n_ao();
        let treatment: BasisTreatment = self.env.basis_treatment;
        let mut rho_orb: DensityContainer = self.density(BasisType::Primary);
        let mut rho_xc: Option<DensityContainer> = match treatment {
            BasisTreatment::GapwXc => Some(self.density(BasisType::Primary)),
            _ => None,
        };
        let mut work_matrix: Array2<f64> = Array2::zeros((n_ao, n_ao));
        {
            let mut services = Services {
                algebra: &self.algebra,
                bridge: &self.bridge,
                grid: &mut self.grid,
                atomic: &mut self.atomic,
            };
            construct_ground_state_density(
                &mut services,
                &mut rho_orb,
                rho_xc.as_mut(),
                self.config.response.triplet,
                &mut self.env,
                &mut work_matrix,
                None,
                None,
            )?;
        }

        let mut rho_aux_fit: Option<DensityContainer> = None;
        let mut local_rho_set_aux: Option<LocalRhoSet> = None;
        if self.use_admm() {
            let n_aux: usize = self.aux_blk_sizes.iter().sum();
            let mut rho_aux: DensityContainer = self.density(BasisType::AuxFit);
            if treatment.is_augmented() {
                local_rho_set_aux = Some(LocalRhoSet::new(
                    KindSet::AuxFit,
                    vec![self.config.system.soft_fraction; self.aux_blk_sizes.len()],
                ));
            }
            let mut wfm_rho_aux_fit: Array2<f64> = Array2::zeros((n_aux, n_aux));
            let mut wfm_aux_orb: Array2<f64> = Array2::zeros((n_aux, n_ao));
            let mut services = Services {
                algebra: &self.algebra,
                bridge: &self.bridge,
                grid: &mut self.grid,
                atomic: &mut self.atomic,
            };
            construct_aux_fit_density(
                &mut services,
                &rho_orb.rho_ao,
                &mut rho_aux,
                local_rho_set_aux.as_mut(),
                &self.env,
                &mut work_matrix,
                &mut wfm_rho_aux_fit,
                &mut wfm_aux_orb,
                None,
            )?;
            rho_aux_fit = Some(rho_aux);
        }

        Ok(ResponseDensities {
            rho_orb,
            rho_xc,
            rho_aux_fit,
            local_rho_set_aux,
        })
    }

    /// Dense density matrices of all spin channels (n_spins x n x n).
    pub fn dense_densities(&self, density: &DensityContainer) -> Result<Array3<f64>> {
        let n: usize = density.rho_ao.first().map_or(0, |p| p.nrows());
        let mut dense: Array3<f64> = Array3::zeros((density.n_spins(), n, n));
        let mut work: Array2<f64> = Array2::zeros((n, n));
        for (ispin, p) in density.rho_ao.iter().enumerate() {
            self.bridge.sparse_to_dense(p, &mut work)?;
            dense.slice_mut(s![ispin, .., ..]).assign(&work);
        }
        Ok(dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;

    fn config(input: &str) -> Configuration {
        toml::from_str(input).unwrap()
    }

    fn orthonormal_grid() -> Array2<f64> {
        array![[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]]
    }

    #[test]
    fn closed_shell_density_on_a_single_center() {
        let c: Array2<f64> = array![[0.6], [0.8]];
        let mut system =
            ResponseSystem::from_parts(vec![c.clone()], config(""), orthonormal_grid(), None)
                .unwrap();
        assert_eq!(system.primary_blk_sizes, vec![2]);
        assert!(!system.use_admm());

        let densities = system.run().unwrap();

        let p: Array3<f64> = system.dense_densities(&densities.rho_orb).unwrap();
        let expected: Array2<f64> = 2.0 * c.dot(&c.t());
        assert!(p.slice(s![0, .., ..]).abs_diff_eq(&expected, 1e-14));
        assert!((densities.rho_orb.tot_rho_r[0] - 2.0).abs() < 1e-14);
        assert!(densities.rho_xc.is_none());
        assert!(densities.rho_aux_fit.is_none());
    }

    #[test]
    fn admm_projects_into_the_auxiliary_basis() {
        let c: Array2<f64> = array![[1.0], [0.0]];
        let admm_a: Array2<f64> = array![[0.0, 1.0], [1.0, 0.0]];
        let phi_aux: Array2<f64> = array![[0.0, 0.0], [0.0, 0.0], [1.0, 1.0]];
        let input: &str = r#"
            [system]
            primary_block_sizes = [1, 1]
            aux_block_sizes = [1, 1]
            [admm]
            use_admm = true
        "#;
        let mut system = ResponseSystem::from_parts(
            vec![c],
            config(input),
            orthonormal_grid(),
            Some((admm_a, phi_aux)),
        )
        .unwrap();
        assert!(system.use_admm());

        let densities = system.run().unwrap();

        let rho_aux = densities.rho_aux_fit.unwrap();
        let p_aux: Array3<f64> = system.dense_densities(&rho_aux).unwrap();
        assert!(p_aux
            .slice(s![0, .., ..])
            .abs_diff_eq(&array![[0.0, 0.0], [0.0, 2.0]], 1e-15));
        assert!((rho_aux.tot_rho_r[0] - 2.0).abs() < 1e-14);
        assert!(densities.local_rho_set_aux.is_none());
    }

    #[test]
    fn gapw_xc_keeps_a_separate_density() {
        let c: Array2<f64> = array![[1.0], [0.0]];
        let input: &str = r#"
            [response]
            basis_treatment = "gapw_xc"
            [system]
            primary_block_sizes = [1, 1]
            soft_fraction = 0.25
        "#;
        let mut system =
            ResponseSystem::from_parts(vec![c], config(input), orthonormal_grid(), None).unwrap();

        let densities = system.run().unwrap();

        let rho_xc = densities.rho_xc.unwrap();
        assert!((densities.rho_orb.tot_rho_r[0] - 2.0).abs() < 1e-14);
        assert!((rho_xc.tot_rho_r[0] - 0.5).abs() < 1e-14);
        let local = system.env.local_rho_set.as_ref().unwrap();
        assert!(local.rho0_mpole.abs_diff_eq(&array![1.5, 0.0], 1e-14));
    }

    #[test]
    fn inconsistent_input_is_rejected() {
        let c: Array2<f64> = array![[1.0], [0.0]];
        // collocation table for three AOs
        let phi: Array2<f64> = Array2::eye(3);
        assert!(ResponseSystem::from_parts(vec![c.clone()], config(""), phi, None).is_err());
        // block sizes that do not add up to the number of AOs
        let input: &str = "[system]\nprimary_block_sizes = [1, 2]";
        assert!(
            ResponseSystem::from_parts(vec![c.clone()], config(input), orthonormal_grid(), None)
                .is_err()
        );
        // complex wavefunctions
        let input: &str = "[response]\nwavefunction = 2";
        assert!(
            ResponseSystem::from_parts(vec![c.clone()], config(input), orthonormal_grid(), None)
                .is_err()
        );
        // alpha and beta with different numbers of AOs
        let beta: Array2<f64> = array![[1.0]];
        assert!(
            ResponseSystem::from_parts(vec![c, beta], config(""), orthonormal_grid(), None)
                .is_err()
        );
    }
}
