//! ndgrad - annotation-driven tensor coercion and gradient helpers
//!
//! Functions declare, per parameter, whether an argument should become a
//! differentiable tensor or be passed through. Wrapped in a
//! [`TensorFn`](adapter::TensorFn), they accept plain numbers and nested
//! lists, and their bodies can differentiate the results with [`grad`] and
//! [`nth_grad`].
//!
//! # Architecture
//!
//! ```text
//! adapter    → Signature / TensorFn: bind, coerce, call, fall back
//! coerce     → to_tensor, to_tensors: Value → Tensor
//! grad       → grad, nth_grad
//! autodiff   → Tensor, recorded ops, autograd_grad
//! data       → TensorData: dtype dispatch over DenseTensor<T>
//! tensor     → DenseTensor<T>: column-major dense storage
//! ```
//!
//! # Example
//!
//! ```
//! use ndgrad::adapter::{CallArgs, Signature, Tag, TensorFn};
//! use ndgrad::grad;
//!
//! // d/dx (scale * x^3), x coerced to a float64 leaf that tracks gradients
//! let sig = Signature::builder()
//!     .param_str("x", "tensor, requires_grad, dtype=float64")
//!     .param_with_default("scale", [Tag::Any], 1.0)
//!     .build()
//!     .unwrap();
//! let slope = TensorFn::new(sig, |args| {
//!     let x = args.tensor("x")?;
//!     let y = x.powi(3).scale(args.f64("scale")?)?;
//!     Ok(grad(&y, x, false)?)
//! });
//!
//! let g = slope.call(&CallArgs::new().arg(2).kwarg("scale", 0.5)).unwrap();
//! assert_eq!(g.item_f64().unwrap(), 6.0);
//! ```

pub mod adapter;
pub mod autodiff;
pub mod coerce;
pub mod data;
pub mod error;
pub mod grad;
pub mod operations;
pub mod scalar;
pub mod storage;
pub mod strides;
pub mod tensor;
pub mod value;

pub use coerce::{CoerceOptions, to_tensor, to_tensors};
pub use data::TensorData;
pub use error::{CallError, TensorError};
pub use grad::{grad, nth_grad};
pub use scalar::{DType, Scalar, c32, c64};
pub use storage::Dense;
pub use tensor::DenseTensor;
pub use value::Value;
