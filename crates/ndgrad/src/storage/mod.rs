//! Storage types for tensor data.
//!
//! Storage is always a flat vector; shape and strides live on the tensor.

mod dense;

pub use dense::Dense;
