mod task_list;

use ndarray::prelude::*;
use ndarray_linalg::c64;
pub use task_list::{TaskList, TaskListKind};

/// Real-space and reciprocal-space representation of one scalar field (e.g. the
/// electron density of one spin channel).
#[derive(Clone, Debug, PartialEq)]
pub struct GridFieldPair {
    pub rho_r: Array1<f64>,
    pub rho_g: Array1<c64>,
}

impl GridFieldPair {
    pub fn zeros(n_real: usize, n_recip: usize) -> Self {
        Self {
            rho_r: Array1::zeros(n_real),
            rho_g: Array1::zeros(n_recip),
        }
    }

    pub fn assign(&mut self, other: &GridFieldPair) {
        self.rho_r.assign(&other.rho_r);
        self.rho_g.assign(&other.rho_g);
    }

    pub fn set_zero(&mut self) {
        self.rho_r.fill(0.0);
        self.rho_g.fill(c64::new(0.0, 0.0));
    }
}

/// Pool of grid buffers. Buffers that are given back are zeroed and handed out again
/// by the next request, so that no new memory is allocated for intermediate fields.
#[derive(Clone, Debug)]
pub struct GridPool {
    pub n_real: usize,
    pub n_recip: usize,
    free: Vec<GridFieldPair>,
}

impl GridPool {
    pub fn new(n_real: usize, n_recip: usize) -> Self {
        Self {
            n_real,
            n_recip,
            free: Vec::new(),
        }
    }

    /// Hand out a zeroed buffer.
    pub fn create_pair(&mut self) -> GridFieldPair {
        match self.free.pop() {
            Some(mut pair) => {
                pair.set_zero();
                pair
            }
            None => GridFieldPair::zeros(self.n_real, self.n_recip),
        }
    }

    pub fn give_back(&mut self, pair: GridFieldPair) {
        assert_eq!(pair.rho_r.len(), self.n_real, "buffer does not belong to this pool");
        assert_eq!(pair.rho_g.len(), self.n_recip, "buffer does not belong to this pool");
        self.free.push(pair);
    }

    pub fn n_free(&self) -> usize {
        self.free.len()
    }
}

/// Grid environment of a sub-group: the dimensions of the grids and the buffer pool.
#[derive(Clone, Debug)]
pub struct GridEnv {
    pub pool: GridPool,
}

impl GridEnv {
    pub fn new(n_real: usize, n_recip: usize) -> Self {
        Self {
            pool: GridPool::new(n_real, n_recip),
        }
    }

    pub fn n_real(&self) -> usize {
        self.pool.n_real
    }

    pub fn n_recip(&self) -> usize {
        self.pool.n_recip
    }
}
