//! Tensor - dense data with optional gradient tracking.

use super::graph::{Node, NodeId};
use crate::data::TensorData;
use crate::error::TensorError;
use crate::scalar::{DType, Scalar, c64};
use crate::tensor::DenseTensor;
use std::fmt::{self, Debug};
use std::rc::Rc;

/// A tensor that may take part in automatic differentiation.
///
/// A tensor requires grad exactly when it carries a graph node: leaves get
/// a node through [`Tensor::requires_grad_`], results of differentiable
/// operations get one when any input requires grad.
///
/// ```
/// use ndgrad::autodiff::Tensor;
///
/// let a = Tensor::from_vec(vec![1.0f32, 2.0], &[2]).unwrap();
/// assert!(!a.requires_grad());
///
/// let a = a.requires_grad_(true).unwrap();
/// assert!(a.requires_grad());
/// assert!(a.is_leaf());
/// assert!(!a.detach().requires_grad());
/// ```
#[derive(Clone)]
pub struct Tensor {
    data: TensorData,
    node: Option<Rc<Node>>,
}

impl Tensor {
    /// Create a tensor that does not require grad.
    pub fn new(data: impl Into<TensorData>) -> Self {
        Self {
            data: data.into(),
            node: None,
        }
    }

    pub(crate) fn from_parts(data: TensorData, node: Option<Rc<Node>>) -> Self {
        Self { data, node }
    }

    /// Create from column-major data.
    pub fn from_vec<T: Scalar>(data: Vec<T>, shape: &[usize]) -> Result<Self, TensorError> {
        Ok(Self::new(DenseTensor::from_vec(data, shape)?))
    }

    /// Create a rank-0 tensor.
    pub fn scalar<T: Scalar>(value: T) -> Self {
        Self::new(DenseTensor::scalar(value))
    }

    pub fn zeros(shape: &[usize], dtype: DType) -> Self {
        Self::new(TensorData::zeros(shape, dtype))
    }

    pub fn ones(shape: &[usize], dtype: DType) -> Self {
        Self::new(TensorData::ones(shape, dtype))
    }

    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape(), self.dtype())
    }

    pub fn ones_like(&self) -> Self {
        Self::ones(self.shape(), self.dtype())
    }

    /// Set the gradient-tracking flag.
    ///
    /// # Errors
    ///
    /// Returns [`TensorError::NonLeafRequiresGrad`] when trying to stop
    /// tracking a tensor produced by a recorded operation; use
    /// [`Tensor::detach`] for that.
    pub fn requires_grad_(mut self, requires_grad: bool) -> Result<Self, TensorError> {
        let is_leaf = self.is_leaf();
        match (self.requires_grad(), requires_grad) {
            (false, true) => self.node = Some(Node::leaf()),
            (true, false) if is_leaf => self.node = None,
            (true, false) => return Err(TensorError::NonLeafRequiresGrad),
            _ => {}
        }
        Ok(self)
    }

    /// Check if this tensor requires gradient.
    pub fn requires_grad(&self) -> bool {
        self.node.is_some()
    }

    /// Check if this tensor was created by the user rather than an operation.
    pub fn is_leaf(&self) -> bool {
        self.node.as_ref().is_none_or(|n| n.is_leaf())
    }

    /// Name of the backward function that produced this tensor.
    pub fn grad_fn_name(&self) -> Option<&'static str> {
        self.node
            .as_ref()
            .and_then(|n| n.grad_fn())
            .map(|g| g.name())
    }

    pub fn node_id(&self) -> Option<NodeId> {
        self.node.as_ref().map(|n| n.id())
    }

    pub(crate) fn node(&self) -> Option<&Rc<Node>> {
        self.node.as_ref()
    }

    /// Detach from the computation graph, keeping the values.
    pub fn detach(&self) -> Self {
        Self::new(self.data.clone())
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn into_data(self) -> TensorData {
        self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Check if the values are complex.
    pub fn is_complex(&self) -> bool {
        self.dtype().is_complex()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Column-major values widened to `c64`.
    pub fn to_c64_vec(&self) -> Vec<c64> {
        self.data.to_c64_vec()
    }

    /// Column-major values as `f64`.
    ///
    /// # Errors
    ///
    /// Fails for complex tensors.
    pub fn to_f64_vec(&self) -> Result<Vec<f64>, TensorError> {
        if self.is_complex() {
            return Err(TensorError::DTypeMismatch {
                expected: DType::Float64,
                actual: self.dtype(),
            });
        }
        Ok(self.to_c64_vec().into_iter().map(|z| z.re).collect())
    }

    /// The single value of a one-element real tensor.
    pub fn item_f64(&self) -> Result<f64, TensorError> {
        self.ensure_single()?;
        Ok(self.to_f64_vec()?[0])
    }

    /// The single value of a one-element tensor, widened to `c64`.
    pub fn item_c64(&self) -> Result<c64, TensorError> {
        self.ensure_single()?;
        Ok(self.to_c64_vec()[0])
    }

    fn ensure_single(&self) -> Result<(), TensorError> {
        if self.len() != 1 {
            return Err(TensorError::NotAScalar { len: self.len() });
        }
        Ok(())
    }
}

impl Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("dtype", &self.dtype())
            .field("shape", &self.shape())
            .field("values", &self.to_c64_vec())
            .field("requires_grad", &self.requires_grad())
            .field("grad_fn", &self.grad_fn_name())
            .finish()
    }
}

impl<T: Scalar> From<DenseTensor<T>> for Tensor {
    fn from(tensor: DenseTensor<T>) -> Self {
        Tensor::new(tensor)
    }
}
