use crate::grid::{GridEnv, GridFieldPair};
use crate::matrices::{BasisType, BlockSparseMatrix, NeighborList};

/// Electron density of all spin channels: the density matrices, their fields on the
/// real-space and reciprocal-space grids and the integrated charge of every channel.
#[derive(Clone, Debug)]
pub struct DensityContainer {
    pub rho_ao: Vec<BlockSparseMatrix>,
    pub fields: Vec<GridFieldPair>,
    pub tot_rho_r: Vec<f64>,
}

impl DensityContainer {
    /// Zero density with the pattern of the neighbor list for `n_spins` channels.
    pub fn new(
        basis: BasisType,
        blk_sizes: &[usize],
        neighbors: &NeighborList,
        n_spins: usize,
        grid_env: &GridEnv,
    ) -> Self {
        let rho_ao: Vec<BlockSparseMatrix> = (0..n_spins)
            .map(|ispin| {
                BlockSparseMatrix::from_neighbor_list(
                    &format!("DENSITY_{}_{}", basis, ispin + 1),
                    basis,
                    blk_sizes,
                    neighbors,
                )
            })
            .collect();
        let fields: Vec<GridFieldPair> = (0..n_spins)
            .map(|_| GridFieldPair::zeros(grid_env.n_real(), grid_env.n_recip()))
            .collect();
        Self {
            rho_ao,
            fields,
            tot_rho_r: vec![0.0; n_spins],
        }
    }

    pub fn n_spins(&self) -> usize {
        self.rho_ao.len()
    }

    /// Sum of the integrated charges of all spin channels.
    pub fn total_charge(&self) -> f64 {
        self.tot_rho_r.iter().sum()
    }
}
