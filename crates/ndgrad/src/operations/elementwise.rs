//! Element-wise tensor operations.

use crate::error::TensorError;
use crate::scalar::Scalar;
use crate::tensor::DenseTensor;

/// Result shape of a binary element-wise operation.
///
/// Operands must have equal shapes, or one of them must hold a single
/// element, which is then broadcast against the other.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>, TensorError> {
    if lhs == rhs {
        return Ok(lhs.to_vec());
    }
    let lhs_len: usize = lhs.iter().product();
    let rhs_len: usize = rhs.iter().product();
    match (lhs_len, rhs_len) {
        (1, 1) if lhs.len() >= rhs.len() => Ok(lhs.to_vec()),
        (1, _) => Ok(rhs.to_vec()),
        (_, 1) => Ok(lhs.to_vec()),
        _ => Err(TensorError::BroadcastMismatch {
            lhs: lhs.to_vec(),
            rhs: rhs.to_vec(),
        }),
    }
}

/// Apply `f` to every element.
pub fn apply_unary<ElT: Scalar, F>(tensor: &DenseTensor<ElT>, f: F) -> DenseTensor<ElT>
where
    F: Fn(ElT) -> ElT,
{
    tensor.map(f)
}

/// Combine two tensors element-wise, broadcasting a single-element operand.
///
/// ```
/// use ndgrad::DenseTensor;
/// use ndgrad::operations::apply_binary;
///
/// let a = DenseTensor::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// let two = DenseTensor::scalar(2.0);
/// let c = apply_binary(&a, &two, |x, y| x * y).unwrap();
/// assert_eq!(c.data(), &[2.0, 4.0, 6.0]);
/// ```
pub fn apply_binary<ElT: Scalar, F>(
    a: &DenseTensor<ElT>,
    b: &DenseTensor<ElT>,
    f: F,
) -> Result<DenseTensor<ElT>, TensorError>
where
    F: Fn(ElT, ElT) -> ElT,
{
    let shape = broadcast_shape(a.shape(), b.shape())?;
    let data: Vec<ElT> = if a.len() == b.len() {
        a.data()
            .iter()
            .zip(b.data().iter())
            .map(|(&x, &y)| f(x, y))
            .collect()
    } else if a.len() == 1 {
        let x = a.data()[0];
        b.data().iter().map(|&y| f(x, y)).collect()
    } else {
        let y = b.data()[0];
        a.data().iter().map(|&x| f(x, y)).collect()
    };
    DenseTensor::from_vec(data, &shape)
}

/// Return a new tensor with element-wise complex conjugation.
///
/// For real tensors this is a copy.
pub fn conj<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    apply_unary(tensor, |x| x.conj())
}

/// Sum of all elements as a rank-0 tensor.
pub fn sum<ElT: Scalar>(tensor: &DenseTensor<ElT>) -> DenseTensor<ElT> {
    let total = tensor
        .data()
        .iter()
        .fold(ElT::zero(), |acc, &x| acc + x);
    DenseTensor::scalar(total)
}

/// Repeat a single-element tensor over `shape`.
pub fn expand<ElT: Scalar>(
    tensor: &DenseTensor<ElT>,
    shape: &[usize],
) -> Result<DenseTensor<ElT>, TensorError> {
    if tensor.len() != 1 {
        return Err(TensorError::NotAScalar { len: tensor.len() });
    }
    let mut out = DenseTensor::zeros(shape);
    out.fill(tensor.data()[0]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::c64;

    #[test]
    fn test_broadcast_shape() {
        assert_eq!(broadcast_shape(&[2, 3], &[2, 3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape(&[], &[2, 3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape(&[4], &[1]).unwrap(), vec![4]);
        assert_eq!(broadcast_shape(&[1], &[]).unwrap(), vec![1]);
        assert_eq!(broadcast_shape(&[], &[1]).unwrap(), vec![1]);
        assert!(broadcast_shape(&[2], &[3]).is_err());
    }

    #[test]
    fn test_apply_binary_same_shape() {
        let a = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let b = DenseTensor::from_vec(vec![3.0, 5.0], &[2]).unwrap();
        let c = apply_binary(&a, &b, |x, y| x - y).unwrap();
        assert_eq!(c.data(), &[-2.0, -3.0]);
    }

    #[test]
    fn test_apply_binary_scalar_lhs() {
        let a = DenseTensor::scalar(10.0);
        let b = DenseTensor::from_vec(vec![1.0, 2.0], &[2]).unwrap();
        let c = apply_binary(&a, &b, |x, y| x - y).unwrap();
        assert_eq!(c.shape(), &[2]);
        assert_eq!(c.data(), &[9.0, 8.0]);
    }

    #[test]
    fn test_apply_binary_mismatch() {
        let a = DenseTensor::<f64>::zeros(&[2]);
        let b = DenseTensor::<f64>::zeros(&[3]);
        assert!(matches!(
            apply_binary(&a, &b, |x, y| x + y),
            Err(TensorError::BroadcastMismatch { .. })
        ));
    }

    #[test]
    fn test_conj() {
        let t = DenseTensor::from_vec(vec![c64::new(1.0, 2.0), c64::new(3.0, -4.0)], &[2]).unwrap();
        let tc = conj(&t);
        assert_eq!(tc.data(), &[c64::new(1.0, -2.0), c64::new(3.0, 4.0)]);
    }

    #[test]
    fn test_sum_and_expand() {
        let t = DenseTensor::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let s = sum(&t);
        assert_eq!(s.shape(), &[] as &[usize]);
        assert_eq!(s.data(), &[10.0]);

        let e = expand(&s, &[3]).unwrap();
        assert_eq!(e.data(), &[10.0, 10.0, 10.0]);
        assert!(expand(&t, &[4]).is_err());
    }
}
