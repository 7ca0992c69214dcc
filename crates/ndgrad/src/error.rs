//! Error types for ndgrad.

use crate::scalar::DType;
use thiserror::Error;

/// Errors that can occur in tensor operations and differentiation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TensorError {
    /// Shape mismatch between data length and expected size.
    #[error("shape mismatch: expected {expected} elements, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Operands of a binary operation cannot be broadcast together.
    #[error("shapes {lhs:?} and {rhs:?} cannot be broadcast together")]
    BroadcastMismatch { lhs: Vec<usize>, rhs: Vec<usize> },

    /// Element type requested does not match the tensor's representation.
    #[error("dtype mismatch: expected {expected}, got {actual}")]
    DTypeMismatch { expected: DType, actual: DType },

    /// Unknown dtype name.
    #[error("unknown dtype '{0}'")]
    UnknownDType(String),

    /// A value cannot be turned into a tensor.
    #[error("cannot convert {kind} to a tensor")]
    InvalidValue { kind: String },

    /// Nested lists of unequal lengths.
    #[error("ragged nested sequence: expected length {expected} at depth {depth}, got {actual}")]
    RaggedValue {
        depth: usize,
        expected: usize,
        actual: usize,
    },

    /// Operation expects a tensor with a single element.
    #[error("expected a single-element tensor, got {len} elements")]
    NotAScalar { len: usize },

    /// `requires_grad` changes are only allowed on leaves.
    #[error("requires_grad can only be changed on leaf tensors")]
    NonLeafRequiresGrad,

    /// Differentiated output is not part of a computation graph.
    #[error("output does not require grad and has no grad_fn")]
    NoGradient,

    /// Differentiation input does not require grad.
    #[error("input tensor does not require grad")]
    InputNotTracked,

    /// Differentiation input never contributed to the output.
    #[error("input tensor was not used to compute the output")]
    UnusedInput,

    /// Implicit gradient seed requested for a non-scalar output.
    #[error("gradient can only be implicitly created for single-element outputs, got {len} elements")]
    NonScalarOutput { len: usize },

    /// Derivative of an integer power whose exponent cannot be lowered.
    #[error("cannot differentiate x^{exponent}: exponent out of range")]
    ExponentOverflow { exponent: i32 },

    /// Complex output differentiated with respect to a real input.
    #[error("input must be complex when the output is complex (output {output}, input {input})")]
    ComplexMismatch { output: DType, input: DType },
}

/// Errors raised while declaring or calling an annotated function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// A declared parameter carries no annotation.
    #[error(
        "parameter '{name}' is not annotated; annotate it with 'any' to leave it untouched"
    )]
    MissingAnnotation { name: String },

    /// An annotation names a parameter that is not declared.
    #[error("annotation for undeclared parameter '{name}'")]
    UnknownParameter { name: String },

    /// A parameter is declared twice.
    #[error("parameter '{name}' declared more than once")]
    DuplicateParameter { name: String },

    /// Tag sequence contains neither 'tensor' nor 'any'.
    #[error("unsupported annotation {tags} for parameter '{name}'; use 'any' to pass it through")]
    UnsupportedAnnotation { name: String, tags: String },

    /// Tag string that is not part of the annotation vocabulary.
    #[error("unknown annotation tag '{0}'")]
    UnknownTag(String),

    /// More positional arguments than declared parameters.
    #[error("takes {expected} positional arguments but {actual} were given")]
    TooManyPositional { expected: usize, actual: usize },

    /// Keyword argument that matches no parameter.
    #[error("got an unexpected keyword argument '{name}'")]
    UnexpectedKeyword { name: String },

    /// No value supplied and no default declared.
    #[error("missing required argument '{name}'")]
    MissingArgument { name: String },

    /// Argument present but of the wrong kind.
    #[error("argument '{name}' should be {expected}, got {actual}")]
    WrongType {
        name: String,
        expected: &'static str,
        actual: String,
    },

    /// Tensor failure while coercing or inside the target body.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// Failure reported by the wrapped function itself.
    #[error("{0}")]
    Target(String),
}
