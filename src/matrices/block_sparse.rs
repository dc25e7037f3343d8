use crate::matrices::{BasisType, NeighborList};
use hashbrown::HashMap;
use itertools::Itertools;
use ndarray::prelude::*;

/// Matrix that is stored as dense blocks of atom pairs. Only the blocks of pairs
/// that are part of the pattern exist, every other element is implicitly zero.
/// The rows and columns are partitioned into one block per atom.
#[derive(Clone, Debug)]
pub struct BlockSparseMatrix {
    pub name: String,
    pub basis: BasisType,
    row_blk_sizes: Vec<usize>,
    col_blk_sizes: Vec<usize>,
    blocks: HashMap<(usize, usize), Array2<f64>>,
}

impl BlockSparseMatrix {
    /// Create a matrix without any blocks.
    pub fn new(
        name: &str,
        basis: BasisType,
        row_blk_sizes: Vec<usize>,
        col_blk_sizes: Vec<usize>,
    ) -> Self {
        Self {
            name: String::from(name),
            basis,
            row_blk_sizes,
            col_blk_sizes,
            blocks: HashMap::new(),
        }
    }

    /// Create a square matrix whose pattern is given by the neighbor list. All blocks
    /// are initialized to zero.
    pub fn from_neighbor_list(
        name: &str,
        basis: BasisType,
        blk_sizes: &[usize],
        neighbors: &NeighborList,
    ) -> Self {
        assert_eq!(
            blk_sizes.len(),
            neighbors.n_atoms,
            "the number of block sizes has to match the number of atoms"
        );
        let mut matrix: Self = Self::new(name, basis, blk_sizes.to_vec(), blk_sizes.to_vec());
        for &(i, j) in neighbors.pairs().iter() {
            matrix.add_block(i, j);
        }
        matrix
    }

    /// Add a zero block for the atom pair (i, j) to the pattern. An existing block is kept.
    pub fn add_block(&mut self, i: usize, j: usize) {
        let shape: (usize, usize) = (self.row_blk_sizes[i], self.col_blk_sizes[j]);
        self.blocks
            .entry((i, j))
            .or_insert_with(|| Array2::zeros(shape));
    }

    /// Remove all blocks.
    pub fn clear_pattern(&mut self) {
        self.blocks.clear();
    }

    pub fn nrows(&self) -> usize {
        self.row_blk_sizes.iter().sum()
    }

    pub fn ncols(&self) -> usize {
        self.col_blk_sizes.iter().sum()
    }

    pub fn row_blk_sizes(&self) -> &[usize] {
        &self.row_blk_sizes
    }

    pub fn col_blk_sizes(&self) -> &[usize] {
        &self.col_blk_sizes
    }

    /// First row of every row block.
    pub fn row_offsets(&self) -> Vec<usize> {
        offsets(&self.row_blk_sizes)
    }

    /// First column of every column block.
    pub fn col_offsets(&self) -> Vec<usize> {
        offsets(&self.col_blk_sizes)
    }

    /// Sorted list of all atom pairs that have a block.
    pub fn pattern(&self) -> Vec<(usize, usize)> {
        self.blocks.keys().copied().sorted().collect()
    }

    pub fn n_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, i: usize, j: usize) -> Option<ArrayView2<f64>> {
        self.blocks.get(&(i, j)).map(|blk| blk.view())
    }

    pub fn block_mut(&mut self, i: usize, j: usize) -> Option<ArrayViewMut2<f64>> {
        self.blocks.get_mut(&(i, j)).map(|blk| blk.view_mut())
    }

    pub fn blocks(&self) -> impl Iterator<Item = (&(usize, usize), &Array2<f64>)> {
        self.blocks.iter()
    }

    /// Multiply every stored element by `alpha`.
    pub fn scale(&mut self, alpha: f64) {
        for blk in self.blocks.values_mut() {
            blk.mapv_inplace(|x| alpha * x);
        }
    }

    /// Copy the values of `other` into the existing blocks of this matrix. Blocks that are
    /// not part of the pattern of `other` are set to zero, blocks of `other` that are not
    /// part of this pattern are dropped.
    pub fn copy_values_from(&mut self, other: &BlockSparseMatrix) {
        assert_eq!(self.row_blk_sizes, other.row_blk_sizes);
        assert_eq!(self.col_blk_sizes, other.col_blk_sizes);
        for (key, blk) in self.blocks.iter_mut() {
            match other.blocks.get(key) {
                Some(source) => blk.assign(source),
                None => blk.fill(0.0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::AbsDiffEq;

    fn two_atoms() -> BlockSparseMatrix {
        let nl = NeighborList::from_pairs(2, &[]);
        BlockSparseMatrix::from_neighbor_list("P", BasisType::Primary, &[2, 1], &nl)
    }

    #[test]
    fn pattern_from_neighbor_list() {
        let p = two_atoms();
        assert_eq!(p.pattern(), vec![(0, 0), (1, 1)]);
        assert_eq!(p.nrows(), 3);
        assert_eq!(p.row_offsets(), vec![0, 2]);
        assert_eq!(p.block(0, 0).unwrap().dim(), (2, 2));
        assert!(p.block(0, 1).is_none());
    }

    #[test]
    fn copy_values_keeps_pattern() {
        let mut p = two_atoms();
        let mut q = BlockSparseMatrix::new("Q", BasisType::Primary, vec![2, 1], vec![2, 1]);
        q.add_block(0, 0);
        q.add_block(0, 1);
        q.block_mut(0, 0).unwrap().fill(3.0);
        q.block_mut(0, 1).unwrap().fill(5.0);
        p.block_mut(1, 1).unwrap().fill(7.0);

        p.copy_values_from(&q);

        assert_eq!(p.pattern(), vec![(0, 0), (1, 1)]);
        assert!(p
            .block(0, 0)
            .unwrap()
            .abs_diff_eq(&Array2::from_elem((2, 2), 3.0), 1e-15));
        assert_eq!(p.block(1, 1).unwrap()[[0, 0]], 0.0);
    }

    #[test]
    fn scale_multiplies_the_stored_blocks() {
        let mut p = two_atoms();
        p.block_mut(0, 0).unwrap().assign(&array![[1.0, 0.5], [0.5, 2.0]]);
        p.block_mut(1, 1).unwrap().fill(1.0);
        p.scale(2.0);
        assert!(p
            .block(0, 0)
            .unwrap()
            .abs_diff_eq(&array![[2.0, 1.0], [1.0, 4.0]], 1e-15));
        assert_eq!(p.block(1, 1).unwrap()[[0, 0]], 2.0);
        assert_eq!(p.pattern(), vec![(0, 0), (1, 1)]);
    }
}
