use crate::grid::{GridFieldPair, TaskList};
use crate::matrices::{BasisType, BlockSparseMatrix};
use crate::services::{GridAccumulator, ServiceError};
use anyhow::Result;
use hashbrown::{HashMap, HashSet};
use log::trace;
use ndarray::prelude::*;
use ndarray_linalg::c64;
use std::f64::consts::PI;

/// Values of the basis functions of one basis set at the grid points.
#[derive(Clone, Debug)]
pub struct CollocationTable {
    /// n_points x n_basis
    pub hard: Array2<f64>,
    /// Soft part of the basis functions, the hard values are used if it is not given.
    pub soft: Option<Array2<f64>>,
}

/// Grid accumulation from precomputed collocation tables. The density on the grid
/// points is
///         ⎲    ⎲   P   φ (r) φ (r)
/// ρ(r) =  ⎳    ⎳    µν  µ     ν
///       (A,B) µ∈A,ν∈B
/// where (A, B) runs over the atom pairs that are part of the task list and of the
/// pattern of P. The reciprocal field is the discrete Fourier transform of ρ(r).
#[derive(Clone, Debug)]
pub struct CollocationGrid {
    tables: HashMap<BasisType, CollocationTable>,
    /// Quadrature weight of every grid point.
    pub dvol: f64,
}

impl CollocationGrid {
    pub fn new(dvol: f64) -> Self {
        Self {
            tables: HashMap::new(),
            dvol,
        }
    }

    /// Register the collocation table of a basis. The soft auxiliary basis uses the soft
    /// part of the table of the auxiliary basis.
    pub fn with_table(mut self, basis: BasisType, hard: Array2<f64>, soft: Option<Array2<f64>>) -> Self {
        self.tables.insert(basis, CollocationTable { hard, soft });
        self
    }

    fn phi(&self, basis: BasisType, soft_valid: bool) -> Result<ArrayView2<f64>> {
        let (key, soft): (BasisType, bool) = match basis {
            BasisType::AuxFitSoft => (BasisType::AuxFit, true),
            other => (other, soft_valid),
        };
        let table: &CollocationTable = self.tables.get(&key).ok_or_else(|| {
            ServiceError::new(
                "collocation",
                format!("no collocation table for basis {}", basis),
            )
        })?;
        Ok(match (soft, table.soft.as_ref()) {
            (true, Some(phi_soft)) => phi_soft.view(),
            _ => table.hard.view(),
        })
    }
}

impl GridAccumulator for CollocationGrid {
    fn calculate_rho(
        &mut self,
        matrix: &BlockSparseMatrix,
        basis: BasisType,
        task_list: &TaskList,
        fields: &mut GridFieldPair,
        soft_valid: bool,
    ) -> Result<f64> {
        if task_list.basis() != basis {
            return Err(ServiceError::new(
                "collocation",
                format!("{} cannot be used for basis {}", task_list.kind, basis),
            )
            .into());
        }
        let phi: ArrayView2<f64> = self.phi(basis, soft_valid)?;
        let n_points: usize = phi.nrows();
        if phi.ncols() != matrix.nrows() || matrix.nrows() != matrix.ncols() {
            return Err(ServiceError::new(
                "collocation",
                format!(
                    "{} ({} x {}) does not match the {} basis functions of {}",
                    matrix.name,
                    matrix.nrows(),
                    matrix.ncols(),
                    phi.ncols(),
                    basis
                ),
            )
            .into());
        }
        if fields.rho_r.len() != n_points || fields.rho_g.len() > n_points {
            return Err(ServiceError::new(
                "collocation",
                format!(
                    "grid with {} points cannot hold fields of size {} / {}",
                    n_points,
                    fields.rho_r.len(),
                    fields.rho_g.len()
                ),
            )
            .into());
        }

        let offsets: Vec<usize> = matrix.row_offsets();
        let tasks: HashSet<(usize, usize)> = task_list.tasks.iter().copied().collect();
        let mut rho_r: Array1<f64> = Array1::zeros(n_points);
        let mut n_done: usize = 0;
        for (&(i, j), blk) in matrix.blocks() {
            if !tasks.contains(&(i, j)) {
                continue;
            }
            let phi_i: ArrayView2<f64> = phi.slice(s![.., offsets[i]..offsets[i] + blk.nrows()]);
            let phi_j: ArrayView2<f64> = phi.slice(s![.., offsets[j]..offsets[j] + blk.ncols()]);
            rho_r += &(&phi_i.dot(blk) * &phi_j).sum_axis(Axis(1));
            n_done += 1;
        }
        trace!(
            "collocated {} of {} blocks of {} with {}",
            n_done,
            matrix.n_blocks(),
            matrix.name,
            task_list.kind
        );

        let n_recip: usize = fields.rho_g.len();
        let rho_g: Array1<c64> = Array1::from_shape_fn(n_recip, |k| {
            rho_r
                .iter()
                .enumerate()
                .map(|(x, val)| {
                    let arg: f64 = -2.0 * PI * (k * x) as f64 / n_points as f64;
                    c64::new(val * arg.cos(), val * arg.sin())
                })
                .sum()
        });

        let total: f64 = rho_r.sum() * self.dvol;
        fields.rho_r.assign(&rho_r);
        fields.rho_g.assign(&rho_g);
        Ok(total)
    }
}
