//! Interfaces of the collaborators that the density constructors orchestrate, together
//! with one in-process implementation of each of them.
mod algebra;
mod bridge;
mod collocation;
mod one_center;

use crate::environment::{KindSet, LocalRhoSet};
use crate::grid::{GridFieldPair, TaskList};
use crate::matrices::{BasisType, BlockSparseMatrix, NeighborList};
pub use algebra::GroupAlgebra;
use anyhow::Result;
pub use bridge::BlockBridge;
pub use collocation::CollocationGrid;
use ndarray::prelude::*;
pub use one_center::OneCenterProjector;
use std::fmt;

/// Operation that is applied to a matrix operand of a product.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transpose {
    No,
    Yes,
}

impl Transpose {
    pub fn apply<'a>(&self, m: ArrayView2<'a, f64>) -> ArrayView2<'a, f64> {
        match self {
            Transpose::No => m,
            Transpose::Yes => m.reversed_axes(),
        }
    }
}

/// Collective dense matrix algebra of a process sub-group.
pub trait DenseAlgebra {
    /// C = alpha * op(A) * op(B) + beta * C. For beta = 0 the content of C is overwritten.
    fn gemm(
        &self,
        trans_a: Transpose,
        trans_b: Transpose,
        alpha: f64,
        a: ArrayView2<f64>,
        b: ArrayView2<f64>,
        beta: f64,
        c: &mut Array2<f64>,
    ) -> Result<()>;
}

/// Conversion between block-sparse and dense matrices.
pub trait SparseDenseBridge {
    /// Copy the dense matrix into the block-sparse matrix. If `keep_sparsity` is set, only
    /// the existing blocks are filled and all other elements are dropped. Otherwise the
    /// pattern is rebuilt from the non-negligible blocks of the dense matrix.
    fn dense_to_sparse(
        &self,
        dense: ArrayView2<f64>,
        sparse: &mut BlockSparseMatrix,
        keep_sparsity: bool,
    ) -> Result<()>;

    /// Overwrite the dense matrix with the block-sparse matrix.
    fn sparse_to_dense(&self, sparse: &BlockSparseMatrix, dense: &mut Array2<f64>) -> Result<()>;
}

/// Collocation of density matrices on the real-space and reciprocal-space grids.
pub trait GridAccumulator {
    /// Map the density matrix onto the grid fields, using the basis functions of `basis`
    /// and the tasks of `task_list`. If `soft_valid` is set only the soft part of the
    /// basis functions is used. Returns the integrated charge.
    fn calculate_rho(
        &mut self,
        matrix: &BlockSparseMatrix,
        basis: BasisType,
        task_list: &TaskList,
        fields: &mut GridFieldPair,
        soft_valid: bool,
    ) -> Result<f64>;
}

/// One-center (atom-centered) densities of the augmented basis treatment.
pub trait AtomicCorrection {
    /// Recompute the one-center expansion coefficients from the density matrices.
    fn refresh_coefficients(
        &mut self,
        rho_ao: &[BlockSparseMatrix],
        local_rho_set: &mut LocalRhoSet,
        kinds: KindSet,
        neighbors: &NeighborList,
    ) -> Result<()>;

    /// Prepare the compensation densities. The smooth zero-multipole term is only
    /// recomputed if `recompute_smooth` is set.
    fn prepare_augmentation(
        &mut self,
        local_rho_set: &mut LocalRhoSet,
        recompute_smooth: bool,
    ) -> Result<()>;
}

/// The collaborators of one density construction.
pub struct Services<'a> {
    pub algebra: &'a dyn DenseAlgebra,
    pub bridge: &'a dyn SparseDenseBridge,
    pub grid: &'a mut dyn GridAccumulator,
    pub atomic: &'a mut dyn AtomicCorrection,
}

/// Error of one of the reference collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceError {
    pub service: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(service: &'static str, message: String) -> Self {
        Self { service, message }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.service, self.message)
    }
}

impl std::error::Error for ServiceError {}
