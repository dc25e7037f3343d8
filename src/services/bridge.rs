use crate::defaults::BLOCK_DROP_THRESHOLD;
use crate::matrices::BlockSparseMatrix;
use crate::services::{ServiceError, SparseDenseBridge};
use anyhow::Result;
use ndarray::prelude::*;

/// Copies between dense matrices and atom-pair block matrices.
#[derive(Clone, Debug)]
pub struct BlockBridge {
    /// Blocks whose largest absolute element is below this value are not added to a
    /// pattern that is rebuilt from a dense matrix.
    pub threshold: f64,
}

impl Default for BlockBridge {
    fn default() -> Self {
        Self {
            threshold: BLOCK_DROP_THRESHOLD,
        }
    }
}

fn check_shape(sparse: &BlockSparseMatrix, dim: (usize, usize)) -> Result<()> {
    if dim != (sparse.nrows(), sparse.ncols()) {
        return Err(ServiceError::new(
            "sparse/dense bridge",
            format!(
                "dense matrix {:?} does not match {} ({} x {})",
                dim,
                sparse.name,
                sparse.nrows(),
                sparse.ncols()
            ),
        )
        .into());
    }
    Ok(())
}

impl SparseDenseBridge for BlockBridge {
    fn dense_to_sparse(
        &self,
        dense: ArrayView2<f64>,
        sparse: &mut BlockSparseMatrix,
        keep_sparsity: bool,
    ) -> Result<()> {
        check_shape(sparse, dense.dim())?;
        let row_offsets: Vec<usize> = sparse.row_offsets();
        let col_offsets: Vec<usize> = sparse.col_offsets();
        let row_sizes: Vec<usize> = sparse.row_blk_sizes().to_vec();
        let col_sizes: Vec<usize> = sparse.col_blk_sizes().to_vec();

        if !keep_sparsity {
            sparse.clear_pattern();
            for (i, (r0, nr)) in row_offsets.iter().zip(row_sizes.iter()).enumerate() {
                for (j, (c0, nc)) in col_offsets.iter().zip(col_sizes.iter()).enumerate() {
                    let max: f64 = dense
                        .slice(s![*r0..r0 + nr, *c0..c0 + nc])
                        .iter()
                        .fold(0.0, |acc: f64, x| acc.max(x.abs()));
                    if max >= self.threshold {
                        sparse.add_block(i, j);
                    }
                }
            }
        }

        for (i, j) in sparse.pattern() {
            let (r0, c0) = (row_offsets[i], col_offsets[j]);
            let (nr, nc) = (row_sizes[i], col_sizes[j]);
            if let Some(mut blk) = sparse.block_mut(i, j) {
                blk.assign(&dense.slice(s![r0..r0 + nr, c0..c0 + nc]));
            }
        }
        Ok(())
    }

    fn sparse_to_dense(&self, sparse: &BlockSparseMatrix, dense: &mut Array2<f64>) -> Result<()> {
        check_shape(sparse, dense.dim())?;
        let row_offsets: Vec<usize> = sparse.row_offsets();
        let col_offsets: Vec<usize> = sparse.col_offsets();
        dense.fill(0.0);
        for (&(i, j), blk) in sparse.blocks() {
            let (r0, c0) = (row_offsets[i], col_offsets[j]);
            dense
                .slice_mut(s![r0..r0 + blk.nrows(), c0..c0 + blk.ncols()])
                .assign(blk);
        }
        Ok(())
    }
}
