//! Converting argument values into tensors.

use crate::autodiff::Tensor;
use crate::data::TensorData;
use crate::error::TensorError;
use crate::scalar::{DType, c64};
use crate::strides::row_major_to_linear;
use crate::value::Value;

/// How a value is turned into a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoerceOptions {
    /// Target representation.
    pub dtype: DType,
    /// Cut the result from the computation graph.
    pub detach: bool,
    /// Track gradients on freshly constructed tensors.
    pub requires_grad: bool,
}

impl CoerceOptions {
    pub fn new(dtype: DType) -> Self {
        Self {
            dtype,
            ..Self::default()
        }
    }

    pub fn detach(mut self, detach: bool) -> Self {
        self.detach = detach;
        self
    }

    pub fn requires_grad(mut self, requires_grad: bool) -> Self {
        self.requires_grad = requires_grad;
        self
    }
}

/// Convert one value into a tensor.
///
/// An existing tensor is cast to `options.dtype` through a recorded cast, so
/// its tracking state carries over. Any other value builds a new tensor,
/// which then gets `options.requires_grad`. `options.detach` applies to both.
///
/// Nested lists are read in row-major order (the outermost list is the
/// first dimension) and stored column-major.
///
/// # Errors
///
/// [`TensorError::InvalidValue`] for strings, `None`, objects, empty lists
/// and tensors nested in lists; [`TensorError::RaggedValue`] for nested
/// lists of unequal lengths.
///
/// # Example
///
/// ```
/// use ndgrad::{CoerceOptions, DType, Value, to_tensor};
///
/// let v = Value::from(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
/// let t = to_tensor(&v, &CoerceOptions::new(DType::Float64)).unwrap();
/// assert_eq!(t.shape(), &[2, 3]);
/// assert_eq!(t.to_f64_vec().unwrap(), vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
/// ```
pub fn to_tensor(value: &Value, options: &CoerceOptions) -> Result<Tensor, TensorError> {
    let tensor = match value {
        Value::Tensor(t) => t.to_dtype(options.dtype),
        other => {
            let data = construct(other, options.dtype)?;
            Tensor::new(data).requires_grad_(options.requires_grad)?
        }
    };
    Ok(if options.detach {
        tensor.detach()
    } else {
        tensor
    })
}

/// Convert each value in turn.
///
/// The iterator is lazy: a value is converted when the iterator reaches it,
/// and values after a failure are still converted independently.
pub fn to_tensors<'a, I>(
    values: I,
    options: &'a CoerceOptions,
) -> impl Iterator<Item = Result<Tensor, TensorError>> + 'a
where
    I: IntoIterator<Item = &'a Value>,
    I::IntoIter: 'a,
{
    values.into_iter().map(move |v| to_tensor(v, options))
}

fn construct(value: &Value, dtype: DType) -> Result<TensorData, TensorError> {
    let mut shape = Vec::new();
    infer_shape(value, &mut shape)?;

    let mut row_major = Vec::with_capacity(shape.iter().product());
    flatten(value, &shape, 0, &mut row_major)?;

    let mut column_major = vec![c64::new(0.0, 0.0); row_major.len()];
    for (n, z) in row_major.into_iter().enumerate() {
        column_major[row_major_to_linear(n, &shape)] = z;
    }
    TensorData::from_c64(column_major, &shape, dtype)
}

/// Shape from the first element at every depth; consistency is checked
/// while flattening.
fn infer_shape(value: &Value, shape: &mut Vec<usize>) -> Result<(), TensorError> {
    match value {
        Value::List(items) => {
            let first = items.first().ok_or_else(|| TensorError::InvalidValue {
                kind: "empty list".into(),
            })?;
            shape.push(items.len());
            infer_shape(first, shape)
        }
        _ => Ok(()),
    }
}

fn flatten(
    value: &Value,
    shape: &[usize],
    depth: usize,
    out: &mut Vec<c64>,
) -> Result<(), TensorError> {
    match (value, shape.get(depth)) {
        (Value::List(items), Some(&expected)) => {
            if items.len() != expected {
                return Err(TensorError::RaggedValue {
                    depth,
                    expected,
                    actual: items.len(),
                });
            }
            items
                .iter()
                .try_for_each(|item| flatten(item, shape, depth + 1, out))
        }
        // A list where a number was expected.
        (Value::List(items), None) => Err(TensorError::RaggedValue {
            depth,
            expected: 0,
            actual: items.len(),
        }),
        // A number where a list was expected.
        (_, Some(&expected)) => Err(TensorError::RaggedValue {
            depth,
            expected,
            actual: 0,
        }),
        (Value::Tensor(_), None) if depth > 0 => Err(TensorError::InvalidValue {
            kind: "tensor nested in a list".into(),
        }),
        (leaf, None) => {
            let z = leaf.as_c64().ok_or_else(|| TensorError::InvalidValue {
                kind: leaf.kind().into(),
            })?;
            out.push(z);
            Ok(())
        }
    }
}
