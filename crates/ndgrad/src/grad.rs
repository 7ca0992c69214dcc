//! Gradient helpers on top of [`autograd_grad`].

use crate::autodiff::{Tensor, autograd_grad};
use crate::error::TensorError;
use crate::scalar::c64;

/// First derivative of `output` with respect to `input`.
///
/// For a complex `output` the input must be complex as well; the primitive
/// is seeded with `1 + 0i` and the result conjugated, so a holomorphic
/// `f(z)` yields `f'(z)`. A real `output` uses the primitive's implicit seed.
///
/// # Errors
///
/// [`TensorError::ComplexMismatch`] for a complex output and a real input,
/// plus everything [`autograd_grad`] reports.
///
/// # Example
///
/// ```
/// use ndgrad::{autodiff::Tensor, c64, grad};
///
/// let z = Tensor::scalar(c64::new(1.0, 1.0)).requires_grad_(true).unwrap();
/// let f = z.mul(&z).unwrap();
/// assert_eq!(grad(&f, &z, false).unwrap().item_c64().unwrap(), c64::new(2.0, 2.0));
/// ```
pub fn grad(output: &Tensor, input: &Tensor, create_graph: bool) -> Result<Tensor, TensorError> {
    if !output.is_complex() {
        return autograd_grad(output, input, None, create_graph);
    }
    if !input.is_complex() {
        return Err(TensorError::ComplexMismatch {
            output: output.dtype(),
            input: input.dtype(),
        });
    }
    let seed = Tensor::scalar(c64::new(1.0, 0.0));
    Ok(autograd_grad(output, input, Some(&seed), create_graph)?.conj())
}

/// `n`-th derivative of `output` with respect to `input`.
///
/// Applies [`grad`] `n` times, keeping the graph each time; `n = 0` returns
/// `output` itself.
pub fn nth_grad(output: &Tensor, input: &Tensor, n: usize) -> Result<Tensor, TensorError> {
    (0..n).try_fold(output.clone(), |acc, _| grad(&acc, input, true))
}
