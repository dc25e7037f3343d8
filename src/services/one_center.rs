use crate::environment::{AtomicCoefficients, KindSet, LocalRhoSet};
use crate::matrices::{BlockSparseMatrix, NeighborList};
use crate::services::{AtomicCorrection, ServiceError};
use anyhow::Result;
use log::debug;
use ndarray::prelude::*;

/// Projects the on-site blocks of the density matrices onto the one-center densities.
/// The hard coefficients of atom A are the (A, A) block of P, the soft coefficients
/// are the hard ones scaled by the soft fraction of the atom.
#[derive(Clone, Debug, Default)]
pub struct OneCenterProjector {}

impl AtomicCorrection for OneCenterProjector {
    fn refresh_coefficients(
        &mut self,
        rho_ao: &[BlockSparseMatrix],
        local_rho_set: &mut LocalRhoSet,
        kinds: KindSet,
        neighbors: &NeighborList,
    ) -> Result<()> {
        if local_rho_set.kinds != kinds {
            return Err(ServiceError::new(
                "one-center densities",
                format!(
                    "container of the {} kinds cannot take coefficients of the {} kinds",
                    local_rho_set.kinds, kinds
                ),
            )
            .into());
        }
        if neighbors.n_atoms != local_rho_set.n_atoms() {
            return Err(ServiceError::new(
                "one-center densities",
                format!(
                    "neighbor list with {} atoms does not match {} atoms",
                    neighbors.n_atoms,
                    local_rho_set.n_atoms()
                ),
            )
            .into());
        }
        for (iatom, (atom, fraction)) in local_rho_set
            .atoms
            .iter_mut()
            .zip(local_rho_set.soft_fraction.iter())
            .enumerate()
        {
            let mut hard: Vec<Array2<f64>> = Vec::with_capacity(rho_ao.len());
            for p in rho_ao.iter() {
                let n: usize = p.row_blk_sizes()[iatom];
                hard.push(match p.block(iatom, iatom) {
                    Some(blk) => blk.to_owned(),
                    None => Array2::zeros((n, n)),
                });
            }
            let soft: Vec<Array2<f64>> = hard.iter().map(|h| *fraction * h).collect();
            *atom = AtomicCoefficients { hard, soft };
        }
        Ok(())
    }

    fn prepare_augmentation(
        &mut self,
        local_rho_set: &mut LocalRhoSet,
        recompute_smooth: bool,
    ) -> Result<()> {
        let mpole: Array1<f64> = local_rho_set
            .atoms
            .iter()
            .map(|atom| {
                atom.hard
                    .iter()
                    .zip(atom.soft.iter())
                    .map(|(h, s)| h.diag().sum() - s.diag().sum())
                    .sum::<f64>()
            })
            .collect();
        local_rho_set.rho0_mpole = mpole;
        if recompute_smooth {
            local_rho_set.rho0_smooth = local_rho_set.rho0_mpole.sum();
            debug!(
                "smooth compensation charge of the {} kinds: {:>18.12}",
                local_rho_set.kinds, local_rho_set.rho0_smooth
            );
        }
        Ok(())
    }
}
