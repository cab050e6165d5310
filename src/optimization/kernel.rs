use num_traits::Float;
use rayon::prelude::*;

use crate::params::FtrlParams;

/// The amount of coordinates each rayon task updates in `ftrl_update_par`.
pub const PAR_CHUNK_SIZE: usize = 4096;

/// Three-way sign, zero maps to zero.
#[inline]
fn sgn<T: Float>(x: T) -> T {
    if x == T::zero() {
        T::zero()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::one()
    }
}

/// Computes one FTRL-proximal step for a single coordinate.
///
/// # Arguments
/// * `w` - The current weight.
/// * `n` - The cumulative sum of squared gradients.
/// * `z` - The signed running statistic.
/// * `g` - The gradient for this coordinate.
/// * `params` - The hyperparameters of the update.
///
/// # Returns
/// The updated `(w, n, z)` triplet.
#[inline]
pub fn ftrl_step<T: Float>(w: T, n: T, z: T, g: T, params: &FtrlParams<T>) -> (T, T, T) {
    let new_n = n + g * g;
    let sqrt_new_n = new_n.sqrt();
    let sigma = (sqrt_new_n - n.sqrt()) / params.alpha;
    let new_z = z + g - sigma * w;

    let new_w = if new_z.abs() > params.lambda1 {
        (params.lambda1 * sgn(new_z) - new_z)
            / ((params.beta + sqrt_new_n) / params.alpha + params.lambda2)
    } else {
        T::zero()
    };

    (new_w, new_n, new_z)
}

/// Applies `ftrl_step` in place to one weight and its interleaved `[n, z]` pair.
///
/// Every input is read before any output is written.
#[inline]
pub fn ftrl_compute<T: Float>(w: &mut T, nz: &mut [T], g: T, params: &FtrlParams<T>) {
    debug_assert_eq!(nz.len(), 2);

    let (new_w, new_n, new_z) = ftrl_step(*w, nz[0], nz[1], g, params);
    *w = new_w;
    nz[0] = new_n;
    nz[1] = new_z;
}

/// Updates every coordinate of `weights` in place.
///
/// Lengths are not checked in release builds, `nz` must hold `2 * weights.len()`
/// values and `grad` exactly `weights.len()`. Extra values are ignored.
///
/// # Arguments
/// * `weights` - The weights to update.
/// * `nz` - The interleaved accumulators, `nz[2i]` is `n_i` and `nz[2i + 1]` is `z_i`.
/// * `grad` - The gradient of each weight.
/// * `params` - The hyperparameters of the update.
pub fn ftrl_update<T: Float>(weights: &mut [T], nz: &mut [T], grad: &[T], params: &FtrlParams<T>) {
    debug_assert_eq!(grad.len(), weights.len());
    debug_assert_eq!(nz.len(), weights.len() * 2);

    weights
        .iter_mut()
        .zip(nz.chunks_exact_mut(2))
        .zip(grad)
        .for_each(|((w, nz), &g)| ftrl_compute(w, nz, g, params));
}

/// Out of place version of `ftrl_update`, the inputs are left untouched.
///
/// # Arguments
/// * `weights`, `nz`, `grad` - The current state and gradient, as in `ftrl_update`.
/// * `new_weights` - Where the updated weights are written.
/// * `new_nz` - Where the updated accumulators are written.
/// * `params` - The hyperparameters of the update.
pub fn ftrl_update_into<T: Float>(
    weights: &[T],
    nz: &[T],
    grad: &[T],
    new_weights: &mut [T],
    new_nz: &mut [T],
    params: &FtrlParams<T>,
) {
    debug_assert_eq!(grad.len(), weights.len());
    debug_assert_eq!(nz.len(), weights.len() * 2);
    debug_assert_eq!(new_weights.len(), weights.len());
    debug_assert_eq!(new_nz.len(), nz.len());

    new_weights
        .iter_mut()
        .zip(new_nz.chunks_exact_mut(2))
        .zip(weights.iter().zip(nz.chunks_exact(2)).zip(grad))
        .for_each(|((new_w, new_nz), ((&w, nz), &g))| {
            let (w, n, z) = ftrl_step(w, nz[0], nz[1], g, params);
            *new_w = w;
            new_nz[0] = n;
            new_nz[1] = z;
        });
}

/// Parallel version of `ftrl_update`.
///
/// Coordinates are independent, so the results are identical to the sequential driver.
pub fn ftrl_update_par<T>(weights: &mut [T], nz: &mut [T], grad: &[T], params: &FtrlParams<T>)
where
    T: Float + Send + Sync,
{
    debug_assert_eq!(grad.len(), weights.len());
    debug_assert_eq!(nz.len(), weights.len() * 2);

    weights
        .par_chunks_mut(PAR_CHUNK_SIZE)
        .zip(nz.par_chunks_mut(PAR_CHUNK_SIZE * 2))
        .zip(grad.par_chunks(PAR_CHUNK_SIZE))
        .for_each(|((w, nz), g)| ftrl_update(w, nz, g, params));
}
