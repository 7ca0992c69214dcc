//! Typed n-dimensional dense array.
//!
//! `DenseTensor<ElT>` is the plain numeric container underneath the
//! differentiable [`crate::autodiff::Tensor`]. It knows nothing about
//! gradients.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::storage::Dense;
use crate::strides::{cartesian_to_linear, compute_strides};

/// A dense n-dimensional array in column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseTensor<ElT: Scalar> {
    storage: Dense<ElT>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<ElT: Scalar> DenseTensor<ElT> {
    /// Create a zero-initialized tensor.
    ///
    /// ```
    /// use ndgrad::DenseTensor;
    ///
    /// let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3, 4]);
    /// assert_eq!(t.shape(), &[2, 3, 4]);
    /// assert_eq!(t.len(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product();
        Self {
            storage: Dense::zeros(len),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        }
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        let mut t = Self::zeros(shape);
        t.fill(ElT::one());
        t
    }

    /// Create a rank-0 tensor holding one value.
    pub fn scalar(value: ElT) -> Self {
        Self {
            storage: Dense::from_vec(vec![value]),
            shape: Vec::new(),
            strides: Vec::new(),
        }
    }

    /// Create tensor from column-major data and shape.
    ///
    /// # Errors
    ///
    /// Returns `TensorError::ShapeMismatch` if data length doesn't match shape.
    ///
    /// ```
    /// use ndgrad::DenseTensor;
    ///
    /// let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
    /// assert_eq!(t.get(&[1, 0]), Some(&2.0));
    /// assert_eq!(t.get(&[0, 1]), Some(&3.0));
    /// ```
    pub fn from_vec(data: Vec<ElT>, shape: &[usize]) -> Result<Self, TensorError> {
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            storage: Dense::from_vec(data),
            shape: shape.to_vec(),
            strides: compute_strides(shape),
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    #[inline]
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    #[inline]
    pub fn data(&self) -> &[ElT] {
        self.storage.as_slice()
    }

    /// Get element by cartesian indices.
    ///
    /// Returns `None` if indices are out of bounds or of the wrong arity.
    pub fn get(&self, indices: &[usize]) -> Option<&ElT> {
        if indices.len() != self.ndim() {
            return None;
        }
        if indices.iter().zip(self.shape.iter()).any(|(&i, &d)| i >= d) {
            return None;
        }
        self.data().get(cartesian_to_linear(indices, &self.strides))
    }

    pub fn fill(&mut self, value: ElT) {
        self.storage.as_mut_slice().fill(value);
    }

    /// Return a copy with a new shape holding the same number of elements.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Self, TensorError> {
        let new_len: usize = new_shape.iter().product();
        if new_len != self.len() {
            return Err(TensorError::ShapeMismatch {
                expected: self.len(),
                actual: new_len,
            });
        }
        Ok(Self {
            storage: self.storage.clone(),
            shape: new_shape.to_vec(),
            strides: compute_strides(new_shape),
        })
    }

    /// Apply `f` element-wise, possibly changing the element type.
    pub fn map<U: Scalar>(&self, f: impl Fn(ElT) -> U) -> DenseTensor<U> {
        DenseTensor {
            storage: self.storage.map(f),
            shape: self.shape.clone(),
            strides: self.strides.clone(),
        }
    }

    /// Convert to another element type through `c64`.
    pub fn cast<U: Scalar>(&self) -> DenseTensor<U> {
        self.map(|x| U::from_c64(x.to_c64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{c32, c64};

    fn test_zeros_generic<T: Scalar>() {
        let t: DenseTensor<T> = DenseTensor::zeros(&[2, 3]);
        assert_eq!(t.shape(), &[2, 3]);
        assert_eq!(t.ndim(), 2);
        assert_eq!(t.len(), 6);
        assert_eq!(t.strides(), &[1, 2]);
        assert!(t.data().iter().all(|&x| x == T::zero()));
    }

    #[test]
    fn test_zeros_all_dtypes() {
        test_zeros_generic::<f32>();
        test_zeros_generic::<f64>();
        test_zeros_generic::<c32>();
        test_zeros_generic::<c64>();
    }

    #[test]
    fn test_from_vec_column_major() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        assert_eq!(t.get(&[0, 0]), Some(&1.0));
        assert_eq!(t.get(&[1, 0]), Some(&2.0));
        assert_eq!(t.get(&[0, 2]), Some(&5.0));
        assert_eq!(t.get(&[1, 2]), Some(&6.0));
    }

    #[test]
    fn test_from_vec_shape_mismatch() {
        let result = DenseTensor::<f64>::from_vec(vec![1.0, 2.0, 3.0], &[2, 3]);
        assert_eq!(
            result,
            Err(TensorError::ShapeMismatch {
                expected: 6,
                actual: 3
            })
        );
    }

    #[test]
    fn test_scalar_tensor() {
        let t = DenseTensor::scalar(4.0f32);
        assert_eq!(t.ndim(), 0);
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(&[]), Some(&4.0));
    }

    #[test]
    fn test_get_out_of_bounds() {
        let t: DenseTensor<f64> = DenseTensor::zeros(&[2, 3]);
        assert_eq!(t.get(&[2, 0]), None);
        assert_eq!(t.get(&[0]), None);
    }

    #[test]
    fn test_reshape() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]).unwrap();
        let r = t.reshape(&[3, 2]).unwrap();
        assert_eq!(r.shape(), &[3, 2]);
        assert_eq!(r.data(), t.data());
        assert!(t.reshape(&[5]).is_err());
        assert_eq!(DenseTensor::scalar(1.0f64).reshape(&[1]).unwrap().shape(), &[1]);
    }

    #[test]
    fn test_cast_real_to_complex_and_back() {
        let t = DenseTensor::from_vec(vec![1.5f32, -2.0], &[2]).unwrap();
        let z: DenseTensor<c64> = t.cast();
        assert_eq!(z.data(), &[c64::new(1.5, 0.0), c64::new(-2.0, 0.0)]);

        let w = DenseTensor::from_vec(vec![c64::new(3.0, 4.0)], &[1]).unwrap();
        let back: DenseTensor<f64> = w.cast();
        assert_eq!(back.data(), &[3.0]);
    }
}
