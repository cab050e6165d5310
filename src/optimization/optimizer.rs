use crate::error::Result;

/// Defines the strategy for updating model parameters based on calculated gradients.
///
/// The `Optimizer` trait is responsible for the transition of weights from state `t` to `t+1`.
pub trait Optimizer<T> {
    /// Updates the provided slice of weights using the gradient.
    ///
    /// # Arguments
    /// * `grad` - The gradient corresponding to the `weights` slice.
    /// * `weights` - The weights to update in place.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad`, `weights` or the optimizer's state.
    fn update_weights(&mut self, grad: &[T], weights: &mut [T]) -> Result<()>;
}
