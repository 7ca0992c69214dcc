//! Differentiable tensor operations and their backward functions.
//!
//! Binary operations accept equal shapes or a single-element operand, and
//! promote mismatched dtypes. Backward rules use the conjugate convention,
//! e.g. `z = a * b` sends `g * conj(b)` to `a`.

use super::graph::{GradFn, Node};
use super::is_grad_enabled;
use super::tensor::Tensor;
use crate::data::{BinaryOp, TensorData, UnaryOp};
use crate::error::TensorError;
use crate::scalar::{DType, c64};

/// Wrap `data` as the result of an operation on `inputs`, recording a node
/// when grad mode is on and any input requires grad.
fn record<F>(data: TensorData, inputs: &[&Tensor], grad_fn: F) -> Tensor
where
    F: FnOnce() -> Box<dyn GradFn>,
{
    if is_grad_enabled() && inputs.iter().any(|t| t.requires_grad()) {
        let edges = inputs.iter().map(|t| t.node().cloned()).collect();
        Tensor::from_parts(data, Some(Node::computed(grad_fn(), edges)))
    } else {
        Tensor::new(data)
    }
}

/// Bring a gradient back to an operand's shape and dtype, summing over a
/// broadcast operand.
fn fit(grad: Tensor, shape: &[usize], dtype: DType) -> Result<Tensor, TensorError> {
    let target_len: usize = shape.iter().product();
    let grad = if grad.shape() == shape {
        grad
    } else if grad.len() == target_len {
        grad.reshape(shape)?
    } else {
        grad.sum().reshape(shape)?
    };
    Ok(if grad.dtype() == dtype {
        grad
    } else {
        grad.to_dtype(dtype)
    })
}

impl Tensor {
    fn binary(&self, other: &Tensor, op: BinaryOp) -> Result<Tensor, TensorError> {
        let data = self.data().binary(other.data(), op)?;
        let (lhs, rhs) = (self, other);
        Ok(record(data, &[self, other], || match op {
            BinaryOp::Add => Box::new(AddBackward {
                lhs: Operand::meta(lhs),
                rhs: Operand::meta(rhs),
                negate_rhs: false,
            }),
            BinaryOp::Sub => Box::new(AddBackward {
                lhs: Operand::meta(lhs),
                rhs: Operand::meta(rhs),
                negate_rhs: true,
            }),
            BinaryOp::Mul => Box::new(MulBackward {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            }),
            BinaryOp::Div => Box::new(DivBackward {
                lhs: lhs.clone(),
                rhs: rhs.clone(),
            }),
        }))
    }

    fn unary(&self, op: UnaryOp) -> Tensor {
        let data = self.data().unary(op);
        record(data, &[self], || {
            Box::new(UnaryBackward {
                input: self.clone(),
                op,
            })
        })
    }

    /// Element-wise sum.
    pub fn add(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.binary(other, BinaryOp::Add)
    }

    /// Element-wise difference.
    pub fn sub(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.binary(other, BinaryOp::Sub)
    }

    /// Element-wise product.
    pub fn mul(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.binary(other, BinaryOp::Mul)
    }

    /// Element-wise quotient.
    pub fn div(&self, other: &Tensor) -> Result<Tensor, TensorError> {
        self.binary(other, BinaryOp::Div)
    }

    pub fn neg(&self) -> Tensor {
        self.unary(UnaryOp::Neg)
    }

    /// Complex conjugate (a copy for real tensors).
    pub fn conj(&self) -> Tensor {
        if !self.is_complex() {
            return self.clone();
        }
        self.unary(UnaryOp::Conj)
    }

    pub fn exp(&self) -> Tensor {
        self.unary(UnaryOp::Exp)
    }

    pub fn sin(&self) -> Tensor {
        self.unary(UnaryOp::Sin)
    }

    pub fn cos(&self) -> Tensor {
        self.unary(UnaryOp::Cos)
    }

    /// Element-wise integer power.
    pub fn powi(&self, n: i32) -> Tensor {
        self.unary(UnaryOp::Powi(n))
    }

    /// Multiply by a real constant.
    pub fn scale(&self, factor: f64) -> Result<Tensor, TensorError> {
        let constant = Tensor::new(TensorData::from_c64(
            vec![c64::new(factor, 0.0)],
            &[],
            self.dtype(),
        )?);
        self.mul(&constant)
    }

    /// Sum of all elements as a rank-0 tensor.
    pub fn sum(&self) -> Tensor {
        let data = self.data().sum();
        record(data, &[self], || {
            Box::new(SumBackward {
                shape: self.shape().to_vec(),
            })
        })
    }

    /// Repeat a single-element tensor over `shape`.
    pub fn expand(&self, shape: &[usize]) -> Result<Tensor, TensorError> {
        let data = self.data().expand(shape)?;
        Ok(record(data, &[self], || {
            Box::new(ExpandBackward {
                shape: self.shape().to_vec(),
            })
        }))
    }

    /// Same values, new shape.
    pub fn reshape(&self, shape: &[usize]) -> Result<Tensor, TensorError> {
        let data = self.data().reshape(shape)?;
        Ok(record(data, &[self], || {
            Box::new(ReshapeBackward {
                shape: self.shape().to_vec(),
            })
        }))
    }

    /// Convert to another representation.
    ///
    /// The cast is recorded, so gradients flow back through it; the
    /// tracking flag is inherited from `self`.
    pub fn to_dtype(&self, dtype: DType) -> Tensor {
        if self.dtype() == dtype {
            return self.clone();
        }
        let data = self.data().cast(dtype);
        record(data, &[self], || {
            Box::new(CastBackward {
                dtype: self.dtype(),
            })
        })
    }
}

/// Shape and dtype of an operand whose values the backward rule doesn't need.
#[derive(Debug)]
struct Operand {
    shape: Vec<usize>,
    dtype: DType,
}

impl Operand {
    fn meta(t: &Tensor) -> Self {
        Self {
            shape: t.shape().to_vec(),
            dtype: t.dtype(),
        }
    }
}

/// Backward of `a + b` and `a - b`.
#[derive(Debug)]
struct AddBackward {
    lhs: Operand,
    rhs: Operand,
    negate_rhs: bool,
}

impl GradFn for AddBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        let grad_lhs = fit(grad_output.clone(), &self.lhs.shape, self.lhs.dtype)?;
        let grad_rhs = if self.negate_rhs {
            grad_output.neg()
        } else {
            grad_output.clone()
        };
        let grad_rhs = fit(grad_rhs, &self.rhs.shape, self.rhs.dtype)?;
        Ok(vec![Some(grad_lhs), Some(grad_rhs)])
    }

    fn name(&self) -> &'static str {
        if self.negate_rhs {
            "SubBackward"
        } else {
            "AddBackward"
        }
    }
}

/// Backward of `a * b`.
#[derive(Debug)]
struct MulBackward {
    lhs: Tensor,
    rhs: Tensor,
}

impl GradFn for MulBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        let grad_lhs = grad_output.mul(&self.rhs.conj())?;
        let grad_rhs = grad_output.mul(&self.lhs.conj())?;
        Ok(vec![
            Some(fit(grad_lhs, self.lhs.shape(), self.lhs.dtype())?),
            Some(fit(grad_rhs, self.rhs.shape(), self.rhs.dtype())?),
        ])
    }

    fn name(&self) -> &'static str {
        "MulBackward"
    }
}

/// Backward of `a / b`.
#[derive(Debug)]
struct DivBackward {
    lhs: Tensor,
    rhs: Tensor,
}

impl GradFn for DivBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        // d(a/b)/db = -(a/b) / b
        let grad_lhs = grad_output.div(&self.rhs.conj())?;
        let quotient = self.lhs.div(&self.rhs)?;
        let grad_rhs = grad_lhs.mul(&quotient.conj())?.neg();
        Ok(vec![
            Some(fit(grad_lhs, self.lhs.shape(), self.lhs.dtype())?),
            Some(fit(grad_rhs, self.rhs.shape(), self.rhs.dtype())?),
        ])
    }

    fn name(&self) -> &'static str {
        "DivBackward"
    }
}

/// Backward of the element-wise unary kernels.
#[derive(Debug)]
struct UnaryBackward {
    input: Tensor,
    op: UnaryOp,
}

impl GradFn for UnaryBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        let x = &self.input;
        let grad = match self.op {
            UnaryOp::Neg => grad_output.neg(),
            UnaryOp::Conj => grad_output.conj(),
            UnaryOp::Exp => grad_output.mul(&x.exp().conj())?,
            UnaryOp::Sin => grad_output.mul(&x.cos().conj())?,
            UnaryOp::Cos => grad_output.mul(&x.sin().conj())?.neg(),
            UnaryOp::Powi(0) => return Ok(vec![None]),
            UnaryOp::Powi(n) => {
                let lowered = n
                    .checked_sub(1)
                    .ok_or(TensorError::ExponentOverflow { exponent: n })?;
                let slope = x.powi(lowered).scale(f64::from(n))?;
                grad_output.mul(&slope.conj())?
            }
        };
        Ok(vec![Some(grad)])
    }

    fn name(&self) -> &'static str {
        match self.op {
            UnaryOp::Neg => "NegBackward",
            UnaryOp::Conj => "ConjBackward",
            UnaryOp::Exp => "ExpBackward",
            UnaryOp::Sin => "SinBackward",
            UnaryOp::Cos => "CosBackward",
            UnaryOp::Powi(_) => "PowBackward",
        }
    }
}

/// Backward of `sum`: spread the scalar gradient over the input shape.
#[derive(Debug)]
struct SumBackward {
    shape: Vec<usize>,
}

impl GradFn for SumBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        Ok(vec![Some(grad_output.expand(&self.shape)?)])
    }

    fn name(&self) -> &'static str {
        "SumBackward"
    }
}

/// Backward of `expand`: collapse back to the single input element.
#[derive(Debug)]
struct ExpandBackward {
    shape: Vec<usize>,
}

impl GradFn for ExpandBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        Ok(vec![Some(grad_output.sum().reshape(&self.shape)?)])
    }

    fn name(&self) -> &'static str {
        "ExpandBackward"
    }
}

#[derive(Debug)]
struct ReshapeBackward {
    shape: Vec<usize>,
}

impl GradFn for ReshapeBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        Ok(vec![Some(grad_output.reshape(&self.shape)?)])
    }

    fn name(&self) -> &'static str {
        "ReshapeBackward"
    }
}

/// Backward of a dtype cast: cast the gradient back to the input dtype.
#[derive(Debug)]
struct CastBackward {
    dtype: DType,
}

impl GradFn for CastBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError> {
        Ok(vec![Some(grad_output.to_dtype(self.dtype))])
    }

    fn name(&self) -> &'static str {
        "CastBackward"
    }
}
