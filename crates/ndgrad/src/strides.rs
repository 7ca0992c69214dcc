//! Stride computation utilities.
//!
//! Storage is column-major (Fortran order). Nested argument lists arrive in
//! row-major (outermost index first) order and are scattered through
//! [`row_major_to_linear`].

/// Compute column-major strides from shape.
///
/// For shape [d0, d1, d2, ...], returns strides [1, d0, d0*d1, ...].
///
/// ```
/// use ndgrad::strides::compute_strides;
///
/// assert_eq!(compute_strides(&[3, 4, 5]), vec![1, 3, 12]);
/// assert_eq!(compute_strides(&[]), Vec::<usize>::new());
/// ```
pub fn compute_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = Vec::with_capacity(shape.len());
    let mut stride = 1;
    for &dim in shape {
        strides.push(stride);
        stride *= dim;
    }
    strides
}

/// Convert cartesian indices to a linear storage offset.
#[inline]
pub fn cartesian_to_linear(indices: &[usize], strides: &[usize]) -> usize {
    indices
        .iter()
        .zip(strides.iter())
        .map(|(&idx, &stride)| idx * stride)
        .sum()
}

/// Map the `n`-th element of a row-major traversal to its column-major offset.
pub fn row_major_to_linear(mut n: usize, shape: &[usize]) -> usize {
    let strides = compute_strides(shape);
    let mut linear = 0;
    for (&dim, &stride) in shape.iter().zip(strides.iter()).rev() {
        linear += (n % dim) * stride;
        n /= dim;
    }
    linear
}
