use std::collections::HashSet;

use log::{trace, warn};
use num_traits::Float;
use rayon::prelude::*;

use super::kernel::{ftrl_compute, ftrl_update};
use crate::{
    error::{FtrlErr, Result},
    params::FtrlParams,
};

/// An integer type usable as a row index for the sparse update.
pub trait SparseIndex: Copy + Send + Sync {
    /// Converts the index into a row, `None` if it's negative or doesn't fit in a `usize`.
    fn to_row(self) -> Option<usize>;

    /// The index as reported in errors.
    fn to_i128(self) -> i128;
}

macro_rules! impl_sparse_index {
    ($($t:ty),*) => {
        $(
            impl SparseIndex for $t {
                #[inline]
                fn to_row(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn to_i128(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

impl_sparse_index!(i32, i64, u32, u64, usize);

/// Resolves the index found at `position` into a row in `[0, rows)`.
#[inline]
fn resolve<I: SparseIndex>(position: usize, index: I, rows: usize) -> Result<usize> {
    match index.to_row() {
        Some(row) if row < rows => Ok(row),
        _ => Err(FtrlErr::IndexOutOfBounds {
            position,
            index: index.to_i128(),
            rows,
        }),
    }
}

/// Checks every index against `rows` without touching any buffer.
///
/// # Returns
/// An `IndexOutOfBounds` error for the first offending index.
pub fn check_indices<I: SparseIndex>(indices: &[I], rows: usize) -> Result<()> {
    indices
        .iter()
        .enumerate()
        .try_for_each(|(i, &idx)| resolve(i, idx, rows).map(|_| ()))
}

/// Updates the rows of `weights` named by `indices`, in place and in order.
///
/// `weights` is a row-major matrix of `rows` rows, each row a block of
/// `weights.len() / rows` columns, and `grad` holds one block per index. A row that
/// appears more than once is updated once per occurrence, each time starting from the
/// state the previous occurrence left behind.
///
/// All indices are checked before the first row is written.
///
/// # Arguments
/// * `weights` - The flattened weight matrix.
/// * `nz` - The interleaved accumulators, two per weight.
/// * `rows` - The amount of rows in the matrix.
/// * `indices` - The rows to update.
/// * `grad` - `indices.len() * block_size` gradients.
/// * `params` - The hyperparameters of the update.
///
/// # Returns
/// An `IndexOutOfBounds` error if any index falls outside the matrix.
///
/// # Panics
/// If the buffer lengths disagree with `rows` and `indices`, the operators in
/// `crate::ops` check those before calling.
pub fn sparse_ftrl_update<T, I>(
    weights: &mut [T],
    nz: &mut [T],
    rows: usize,
    indices: &[I],
    grad: &[T],
    params: &FtrlParams<T>,
) -> Result<()>
where
    T: Float,
    I: SparseIndex,
{
    let block_size = weights.len().checked_div(rows).unwrap_or(0);
    check_indices(indices, rows)?;

    for (i, &idx) in indices.iter().enumerate() {
        let row = resolve(i, idx, rows)?;

        if block_size == 1 {
            ftrl_compute(&mut weights[row], &mut nz[row * 2..row * 2 + 2], grad[i], params);
        } else {
            let x = row * block_size;
            ftrl_update(
                &mut weights[x..x + block_size],
                &mut nz[x * 2..(x + block_size) * 2],
                &grad[i * block_size..(i + 1) * block_size],
                params,
            );
        }
    }

    Ok(())
}

/// Parallel version of `sparse_ftrl_update`.
///
/// Rows are updated concurrently only when no index repeats. Otherwise the update
/// falls back to the sequential driver so repeated rows still chain in order.
///
/// # Returns
/// An `IndexOutOfBounds` error if any index falls outside the matrix.
pub fn sparse_ftrl_update_par<T, I>(
    weights: &mut [T],
    nz: &mut [T],
    rows: usize,
    indices: &[I],
    grad: &[T],
    params: &FtrlParams<T>,
) -> Result<()>
where
    T: Float + Send + Sync,
    I: SparseIndex,
{
    let block_size = weights.len().checked_div(rows).unwrap_or(0);
    if block_size == 0 {
        return sparse_ftrl_update(weights, nz, rows, indices, grad, params);
    }

    let mut seen = HashSet::with_capacity(indices.len());

    for (i, &idx) in indices.iter().enumerate() {
        let row = resolve(i, idx, rows)?;

        if !seen.insert(row) {
            warn!(row = row, position = i; "repeated row, falling back to sequential update");
            return sparse_ftrl_update(weights, nz, rows, indices, grad, params);
        }
    }

    let mut weight_rows: Vec<_> = weights.chunks_mut(block_size).map(Some).collect();
    let mut nz_rows: Vec<_> = nz.chunks_mut(block_size * 2).map(Some).collect();
    let mut jobs = Vec::with_capacity(indices.len());

    for (i, (&idx, g)) in indices.iter().zip(grad.chunks(block_size)).enumerate() {
        let row = resolve(i, idx, rows)?;

        // Rows are unique, each one is taken exactly once.
        if let (Some(w), Some(nz)) = (weight_rows[row].take(), nz_rows[row].take()) {
            jobs.push((w, nz, g));
        }
    }

    trace!(rows = jobs.len(), block_size = block_size; "updating rows in parallel");

    jobs.into_par_iter().for_each(|(w, nz, g)| ftrl_update(w, nz, g, params));

    Ok(())
}
