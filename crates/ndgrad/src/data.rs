//! Dtype-erased tensor data.
//!
//! [`TensorData`] holds a [`DenseTensor`] of one of the supported element
//! types and dispatches kernels on the runtime [`DType`]. Binary kernels
//! promote mismatched operands first.

use crate::error::TensorError;
use crate::operations::{apply_binary, apply_unary, expand, sum};
use crate::scalar::{DType, Scalar, c32, c64};
use crate::tensor::DenseTensor;

/// A dense tensor of any supported element type.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float32(DenseTensor<f32>),
    Float64(DenseTensor<f64>),
    Complex64(DenseTensor<c32>),
    Complex128(DenseTensor<c64>),
}

/// Run `$body` with `$t` bound to the typed tensor inside `$data`.
macro_rules! dispatch {
    ($data:expr, $t:ident => $body:expr) => {
        match $data {
            TensorData::Float32($t) => $body,
            TensorData::Float64($t) => $body,
            TensorData::Complex64($t) => $body,
            TensorData::Complex128($t) => $body,
        }
    };
}

/// Like [`dispatch!`], rewrapping the result in the same variant.
macro_rules! dispatch_map {
    ($data:expr, $t:ident => $body:expr) => {
        match $data {
            TensorData::Float32($t) => TensorData::Float32($body),
            TensorData::Float64($t) => TensorData::Float64($body),
            TensorData::Complex64($t) => TensorData::Complex64($body),
            TensorData::Complex128($t) => TensorData::Complex128($body),
        }
    };
}

/// Element-wise unary kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    Neg,
    Conj,
    Exp,
    Sin,
    Cos,
    Powi(i32),
}

impl UnaryOp {
    fn apply<T: Scalar>(self, x: T) -> T {
        match self {
            UnaryOp::Neg => -x,
            UnaryOp::Conj => x.conj(),
            UnaryOp::Exp => x.exp(),
            UnaryOp::Sin => x.sin(),
            UnaryOp::Cos => x.cos(),
            UnaryOp::Powi(n) => x.powi(n),
        }
    }
}

/// Element-wise binary kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply<T: Scalar>(self, x: T, y: T) -> T {
        match self {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
        }
    }
}

impl TensorData {
    /// Zero-filled data of the given representation.
    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        match dtype {
            DType::Float32 => TensorData::Float32(DenseTensor::zeros(shape)),
            DType::Float64 => TensorData::Float64(DenseTensor::zeros(shape)),
            DType::Complex64 => TensorData::Complex64(DenseTensor::zeros(shape)),
            DType::Complex128 => TensorData::Complex128(DenseTensor::zeros(shape)),
        }
    }

    /// One-filled data of the given representation.
    pub fn ones(shape: &[usize], dtype: DType) -> Self {
        match dtype {
            DType::Float32 => TensorData::Float32(DenseTensor::ones(shape)),
            DType::Float64 => TensorData::Float64(DenseTensor::ones(shape)),
            DType::Complex64 => TensorData::Complex64(DenseTensor::ones(shape)),
            DType::Complex128 => TensorData::Complex128(DenseTensor::ones(shape)),
        }
    }

    /// Build data of `dtype` from column-major `c64` values.
    pub fn from_c64(values: Vec<c64>, shape: &[usize], dtype: DType) -> Result<Self, TensorError> {
        let wide = DenseTensor::from_vec(values, shape)?;
        Ok(TensorData::Complex128(wide).cast(dtype))
    }

    pub fn dtype(&self) -> DType {
        match self {
            TensorData::Float32(_) => DType::Float32,
            TensorData::Float64(_) => DType::Float64,
            TensorData::Complex64(_) => DType::Complex64,
            TensorData::Complex128(_) => DType::Complex128,
        }
    }

    pub fn shape(&self) -> &[usize] {
        dispatch!(self, t => t.shape())
    }

    pub fn len(&self) -> usize {
        dispatch!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the typed tensor, failing if the element type differs.
    pub fn typed<T: Scalar>(&self) -> Result<&DenseTensor<T>, TensorError> {
        T::from_data(self).ok_or(TensorError::DTypeMismatch {
            expected: T::DTYPE,
            actual: self.dtype(),
        })
    }

    /// Column-major values widened to `c64`.
    pub fn to_c64_vec(&self) -> Vec<c64> {
        dispatch!(self, t => t.data().iter().map(|x| x.to_c64()).collect())
    }

    /// Convert to another representation.
    ///
    /// Complex to real conversion keeps the real part and logs a warning
    /// when a non-zero imaginary part is discarded.
    pub fn cast(&self, dtype: DType) -> TensorData {
        if self.dtype() == dtype {
            return self.clone();
        }
        if self.dtype().is_complex() && !dtype.is_complex() {
            let lossy = self.to_c64_vec().iter().any(|z| z.im != 0.0);
            if lossy {
                log::warn!(
                    "casting {} to {} discards the imaginary part",
                    self.dtype(),
                    dtype
                );
            }
        }
        match dtype {
            DType::Float32 => TensorData::Float32(dispatch!(self, t => t.cast())),
            DType::Float64 => TensorData::Float64(dispatch!(self, t => t.cast())),
            DType::Complex64 => TensorData::Complex64(dispatch!(self, t => t.cast())),
            DType::Complex128 => TensorData::Complex128(dispatch!(self, t => t.cast())),
        }
    }

    pub fn unary(&self, op: UnaryOp) -> TensorData {
        dispatch_map!(self, t => apply_unary(t, |x| op.apply(x)))
    }

    /// Combine with `other`, promoting both to a common representation.
    pub fn binary(&self, other: &TensorData, op: BinaryOp) -> Result<TensorData, TensorError> {
        let dtype = self.dtype().promote(other.dtype());
        let lhs = self.cast(dtype);
        let rhs = other.cast(dtype);
        Ok(match (&lhs, &rhs) {
            (TensorData::Float32(a), TensorData::Float32(b)) => {
                TensorData::Float32(apply_binary(a, b, |x, y| op.apply(x, y))?)
            }
            (TensorData::Float64(a), TensorData::Float64(b)) => {
                TensorData::Float64(apply_binary(a, b, |x, y| op.apply(x, y))?)
            }
            (TensorData::Complex64(a), TensorData::Complex64(b)) => {
                TensorData::Complex64(apply_binary(a, b, |x, y| op.apply(x, y))?)
            }
            (TensorData::Complex128(a), TensorData::Complex128(b)) => {
                TensorData::Complex128(apply_binary(a, b, |x, y| op.apply(x, y))?)
            }
            _ => unreachable!("operands were cast to {dtype}"),
        })
    }

    /// Sum of all elements as rank-0 data.
    pub fn sum(&self) -> TensorData {
        dispatch_map!(self, t => sum(t))
    }

    /// Repeat single-element data over `shape`.
    pub fn expand(&self, shape: &[usize]) -> Result<TensorData, TensorError> {
        Ok(dispatch_map!(self, t => expand(t, shape)?))
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<TensorData, TensorError> {
        Ok(dispatch_map!(self, t => t.reshape(shape)?))
    }
}

impl<T: Scalar> From<DenseTensor<T>> for TensorData {
    fn from(tensor: DenseTensor<T>) -> Self {
        T::into_data(tensor)
    }
}
