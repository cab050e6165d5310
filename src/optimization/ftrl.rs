use num_traits::Float;

use super::{Optimizer, SparseIndex};
use crate::{
    error::Result,
    ops::{FtrlOp, SparseFtrlOp},
    params::FtrlParams,
};

/// An FTRL-proximal optimizer owning the `(n, z)` accumulators of its weights.
#[derive(Debug, Clone)]
pub struct Ftrl<T> {
    params: FtrlParams<T>,
    nz: Box<[T]>,
    parallel: bool,
}

impl<T: Float + Send + Sync> Ftrl<T> {
    /// Creates a new `Ftrl` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of weights this instance should hold accumulators for.
    /// * `params` - The hyperparameters of the update.
    ///
    /// # Returns
    /// A new `Ftrl` instance with zeroed accumulators.
    pub fn new(len: usize, params: FtrlParams<T>) -> Self {
        Self::from_accumulators(params, vec![T::zero(); len * 2])
    }

    /// Creates a new `Ftrl` optimizer resuming from previously saved accumulators.
    ///
    /// # Arguments
    /// * `params` - The hyperparameters of the update.
    /// * `nz` - The interleaved accumulators, two per weight.
    ///
    /// # Returns
    /// A new `Ftrl` instance.
    pub fn from_accumulators(params: FtrlParams<T>, nz: Vec<T>) -> Self {
        Self {
            params,
            nz: nz.into_boxed_slice(),
            parallel: false,
        }
    }

    /// Sets whether updates run across the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &FtrlParams<T> {
        &self.params
    }

    /// Returns the interleaved accumulators, `[n_0, z_0, n_1, z_1, ...]`.
    pub fn accumulators(&self) -> &[T] {
        &self.nz
    }

    /// Returns the amount of weights this optimizer holds accumulators for.
    pub fn len(&self) -> usize {
        self.nz.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nz.is_empty()
    }

    /// Updates only the rows of `weights` named by `indices`.
    ///
    /// # Arguments
    /// * `weights` - The flattened `[rows, block_size]` weight matrix.
    /// * `rows` - The first dimension of the weight matrix.
    /// * `indices` - The rows to update, repeated rows are updated once per occurrence.
    /// * `grad` - One block of gradients per index.
    ///
    /// # Returns
    /// A shape or index error, nothing is written in that case.
    pub fn update_rows<I: SparseIndex>(
        &mut self,
        weights: &mut [T],
        rows: usize,
        indices: &[I],
        grad: &[T],
    ) -> Result<()> {
        SparseFtrlOp::new(self.params)
            .parallel(self.parallel)
            .run(weights, &mut self.nz, rows, indices, grad)
    }
}

impl<T: Float + Send + Sync> Optimizer<T> for Ftrl<T> {
    fn update_weights(&mut self, grad: &[T], weights: &mut [T]) -> Result<()> {
        FtrlOp::new(self.params)
            .parallel(self.parallel)
            .run(weights, &mut self.nz, grad)
    }
}
