//! Element-wise tensor kernels.
//!
//! These operate on plain [`DenseTensor`](crate::DenseTensor)s and record
//! nothing; the differentiable wrappers live in [`crate::autodiff`].

mod elementwise;

pub use elementwise::{apply_binary, apply_unary, broadcast_shape, conj, expand, sum};
