//! Reverse-mode automatic differentiation.
//!
//! A small define-by-run engine: every differentiable operation on a
//! [`Tensor`] that requires grad records a [`Node`] holding its backward
//! function and links to its inputs. [`autograd_grad`] walks that graph
//! from an output back to one input.
//!
//! # Architecture
//!
//! ```text
//! Tensor ──node──► Rc<Node> ──inputs──► Rc<Node> ...
//!                     │
//!                     ▼
//!              Box<dyn GradFn>   (MulBackward, ExpBackward, ...)
//! ```
//!
//! Backward functions are written with the same differentiable operations,
//! so a backward pass run with grad mode enabled (`create_graph = true`)
//! produces gradients that can be differentiated again.
//!
//! Complex tensors follow the conjugate convention: the gradient reported
//! for a holomorphic `f(z)` with seed `1` is `conj(f'(z))`.
//!
//! # Example
//!
//! ```
//! use ndgrad::autodiff::{Tensor, autograd_grad};
//!
//! let x = Tensor::scalar(3.0f64).requires_grad_(true).unwrap();
//! let y = x.mul(&x).unwrap();
//! let dy = autograd_grad(&y, &x, None, false).unwrap();
//! assert_eq!(dy.item_f64().unwrap(), 6.0);
//! ```

mod backward;
mod gradients;
mod graph;
mod ops;
mod tensor;

pub use backward::autograd_grad;
pub use gradients::Gradients;
pub use graph::{GradFn, Node, NodeId};
pub use tensor::Tensor;

use std::cell::Cell;

thread_local! {
    /// Whether operations currently record graph nodes.
    static GRAD_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Restores the previous grad mode when dropped.
struct GradModeGuard {
    prev: bool,
}

impl Drop for GradModeGuard {
    fn drop(&mut self) {
        GRAD_ENABLED.with(|enabled| enabled.set(self.prev));
    }
}

/// Run `f` with graph recording switched on or off.
pub(crate) fn with_grad_mode<F, R>(enabled: bool, f: F) -> R
where
    F: FnOnce() -> R,
{
    let prev = GRAD_ENABLED.with(|flag| flag.replace(enabled));
    let _guard = GradModeGuard { prev };
    f()
}

/// Execute a closure without gradient tracking.
///
/// ```
/// use ndgrad::autodiff::{Tensor, no_grad};
///
/// let x = Tensor::scalar(2.0f32).requires_grad_(true).unwrap();
/// let y = no_grad(|| x.mul(&x)).unwrap();
/// assert!(!y.requires_grad());
/// ```
pub fn no_grad<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    with_grad_mode(false, f)
}

/// Execute a closure with gradient tracking, even inside [`no_grad`].
pub fn enable_grad<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    with_grad_mode(true, f)
}

/// Check if gradient tracking is currently enabled.
pub fn is_grad_enabled() -> bool {
    GRAD_ENABLED.with(|enabled| enabled.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_grad_context() {
        assert!(is_grad_enabled());
        no_grad(|| assert!(!is_grad_enabled()));
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_nested_modes() {
        no_grad(|| {
            assert!(!is_grad_enabled());
            enable_grad(|| assert!(is_grad_enabled()));
            no_grad(|| assert!(!is_grad_enabled()));
            assert!(!is_grad_enabled());
        });
        assert!(is_grad_enabled());
    }

    #[test]
    fn test_mode_restored_after_panic() {
        let result = std::panic::catch_unwind(|| no_grad(|| panic!("boom")));
        assert!(result.is_err());
        assert!(is_grad_enabled());
    }
}
