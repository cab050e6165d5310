//! Caller-facing FTRL operators.
//!
//! Both operators validate every buffer length (and, for the sparse one, every
//! index) before the first write, so a rejected call never leaves a partial update.

use log::debug;
use num_traits::Float;

use crate::{
    error::{FtrlErr, Result},
    optimization::{
        SparseIndex, ftrl_update, ftrl_update_into, ftrl_update_par, sparse_ftrl_update,
        sparse_ftrl_update_par,
    },
    params::FtrlParams,
};

/// How an operator's outputs relate to its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inplace {
    /// Outputs may share storage with the paired inputs.
    Allow,
    /// Outputs must share storage with the paired inputs.
    Enforce,
}

/// The registration shape of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpSchema {
    pub name: &'static str,
    pub inputs: usize,
    pub outputs: usize,
    pub inplace: Inplace,
    /// `(input, output)` pairs covered by `inplace`.
    pub aliases: &'static [(usize, usize)],
}

/// Inputs: weights, accumulators, gradients. Outputs: weights, accumulators.
pub const FTRL_SCHEMA: OpSchema = OpSchema {
    name: "Ftrl",
    inputs: 3,
    outputs: 2,
    inplace: Inplace::Allow,
    aliases: &[(0, 0), (1, 1)],
};

/// Inputs: weights, accumulators, indices, gradients. Outputs: weights, accumulators.
pub const SPARSE_FTRL_SCHEMA: OpSchema = OpSchema {
    name: "SparseFtrl",
    inputs: 4,
    outputs: 2,
    inplace: Inplace::Enforce,
    aliases: &[(0, 0), (1, 1)],
};

fn check_accumulators(weights: usize, nz: usize) -> Result<()> {
    if nz != weights * 2 {
        return Err(FtrlErr::AccumulatorLengthMismatch {
            got: nz,
            expected: weights * 2,
        });
    }

    Ok(())
}

fn check_dense(weights: usize, nz: usize, grad: usize) -> Result<()> {
    if grad != weights {
        return Err(FtrlErr::GradientLengthMismatch {
            got: grad,
            expected: weights,
        });
    }

    check_accumulators(weights, nz)
}

fn check_output(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(FtrlErr::OutputLengthMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}

/// Derives the block size of a weight matrix of `len` values split into `rows` rows.
///
/// # Returns
/// A `RowMismatch` error if `len` isn't an exact multiple of `rows`.
pub fn block_size(len: usize, rows: usize) -> Result<usize> {
    match len.checked_div(rows) {
        Some(block) if block * rows == len => Ok(block),
        None if len == 0 => Ok(0),
        _ => Err(FtrlErr::RowMismatch { len, rows }),
    }
}

/// The dense FTRL operator, updates every weight.
#[derive(Debug, Clone, Copy)]
pub struct FtrlOp<T> {
    params: FtrlParams<T>,
    parallel: bool,
}

impl<T: Float + Send + Sync> FtrlOp<T> {
    pub const SCHEMA: OpSchema = FTRL_SCHEMA;

    /// Creates a new sequential `FtrlOp`.
    ///
    /// # Arguments
    /// * `params` - The hyperparameters of every update run by this operator.
    ///
    /// # Returns
    /// A new `FtrlOp` instance.
    pub fn new(params: FtrlParams<T>) -> Self {
        Self {
            params,
            parallel: false,
        }
    }

    /// Sets whether coordinates are updated across the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &FtrlParams<T> {
        &self.params
    }

    /// Runs the update in place, outputs alias inputs `0 <-> 0` and `1 <-> 1`.
    ///
    /// # Arguments
    /// * `weights` - The weights to update.
    /// * `nz` - The interleaved accumulators, `2 * weights.len()` values.
    /// * `grad` - One gradient per weight.
    ///
    /// # Returns
    /// A length mismatch error if the buffers disagree, nothing is written in that case.
    pub fn run(&self, weights: &mut [T], nz: &mut [T], grad: &[T]) -> Result<()> {
        check_dense(weights.len(), nz.len(), grad.len())?;

        debug!(len = weights.len(), parallel = self.parallel; "running ftrl update");

        if self.parallel {
            ftrl_update_par(weights, nz, grad, &self.params);
        } else {
            ftrl_update(weights, nz, grad, &self.params);
        }

        Ok(())
    }

    /// Runs the update writing into separate output buffers.
    ///
    /// The outputs must already have the length of their inputs.
    ///
    /// # Returns
    /// A length mismatch error if any of the buffers disagree.
    pub fn run_into(
        &self,
        weights: &[T],
        nz: &[T],
        grad: &[T],
        out_weights: &mut [T],
        out_nz: &mut [T],
    ) -> Result<()> {
        check_dense(weights.len(), nz.len(), grad.len())?;
        check_output("weights", out_weights.len(), weights.len())?;
        check_output("accumulators", out_nz.len(), nz.len())?;

        debug!(len = weights.len(); "running out of place ftrl update");

        ftrl_update_into(weights, nz, grad, out_weights, out_nz, &self.params);
        Ok(())
    }
}

/// The sparse FTRL operator, updates only the rows named by an index list.
///
/// It only works in place: the weights and accumulators are taken as a single
/// mutable buffer each, there's no separate output.
#[derive(Debug, Clone, Copy)]
pub struct SparseFtrlOp<T> {
    params: FtrlParams<T>,
    parallel: bool,
}

impl<T: Float + Send + Sync> SparseFtrlOp<T> {
    pub const SCHEMA: OpSchema = SPARSE_FTRL_SCHEMA;

    /// Creates a new sequential `SparseFtrlOp`.
    ///
    /// # Arguments
    /// * `params` - The hyperparameters of every update run by this operator.
    ///
    /// # Returns
    /// A new `SparseFtrlOp` instance.
    pub fn new(params: FtrlParams<T>) -> Self {
        Self {
            params,
            parallel: false,
        }
    }

    /// Sets whether distinct rows may be updated across the rayon thread pool.
    ///
    /// Calls with repeated indices are always processed sequentially.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn params(&self) -> &FtrlParams<T> {
        &self.params
    }

    /// Runs the update over the rows named by `indices`.
    ///
    /// # Arguments
    /// * `weights` - The flattened `[rows, block_size]` weight matrix.
    /// * `nz` - The interleaved accumulators, `2 * weights.len()` values.
    /// * `rows` - The first dimension of the weight matrix.
    /// * `indices` - The rows to update, in order, repetitions allowed.
    /// * `grad` - `indices.len() * block_size` gradients, one block per index.
    ///
    /// # Returns
    /// A shape or index error, nothing is written in that case.
    pub fn run<I: SparseIndex>(
        &self,
        weights: &mut [T],
        nz: &mut [T],
        rows: usize,
        indices: &[I],
        grad: &[T],
    ) -> Result<()> {
        let block_size = block_size(weights.len(), rows)?;
        check_accumulators(weights.len(), nz.len())?;

        let expected = indices.len() * block_size;
        if grad.len() != expected {
            return Err(FtrlErr::GradientLengthMismatch {
                got: grad.len(),
                expected,
            });
        }

        debug!(
            rows = rows,
            block_size = block_size,
            indices = indices.len(),
            parallel = self.parallel;
            "running sparse ftrl update"
        );

        if self.parallel {
            sparse_ftrl_update_par(weights, nz, rows, indices, grad, &self.params)
        } else {
            sparse_ftrl_update(weights, nz, rows, indices, grad, &self.params)
        }
    }
}
