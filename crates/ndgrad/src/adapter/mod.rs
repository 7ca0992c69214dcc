//! Annotation-driven argument coercion.
//!
//! A [`TensorFn`] wraps a function together with a [`Signature`]: the
//! function's parameter names, defaults and one annotation per parameter.
//! On every call the caller's arguments are bound to parameter names,
//! parameters annotated `tensor` are converted with
//! [`to_tensor`](crate::coerce::to_tensor), parameters annotated `any` are
//! passed through, and the function runs on the result.
//!
//! ```text
//! CallArgs ──bind──► BoundArgs ──coerce──► BoundArgs ──► target(&Arguments)
//!     │                                                        ▲
//!     └──────────────── on failure: warn, original args ───────┘
//! ```

mod annotation;
mod call;
mod signature;

pub use annotation::{Annotation, Tag, parse_tags};
pub use call::{Arguments, CallArgs, Invocation, TensorFn};
pub use signature::{BoundArgs, Param, Signature, SignatureBuilder};
