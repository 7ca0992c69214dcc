//! Integration tests for the autodiff engine.
//!
//! Analytical gradients are checked against central differences.

mod common;

use approx::assert_relative_eq;
use common::{randn_f64, seeded};
use ndgrad::autodiff::{Tensor, autograd_grad, no_grad};
use ndgrad::{DType, TensorError};

/// Compute numerical gradient using central difference.
///
/// grad_i ≈ (f(x + eps*e_i) - f(x - eps*e_i)) / (2*eps)
fn numerical_gradient<F>(f: F, x: &[f64], eps: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + eps;
        x_minus[i] = x[i] - eps;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * eps);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }
    grad
}

fn random_input(len: usize, seed: u64) -> Vec<f64> {
    randn_f64(len, &mut seeded(seed))
}

fn leaf(values: &[f64]) -> Tensor {
    Tensor::from_vec(values.to_vec(), &[values.len()])
        .unwrap()
        .requires_grad_(true)
        .unwrap()
}

/// sum(sin(x) * exp(x) / (x^2 + 2) - cos(x))
fn loss(x: &Tensor) -> Result<Tensor, TensorError> {
    let two = Tensor::scalar(2.0f64);
    let numerator = x.sin().mul(&x.exp())?;
    let denominator = x.powi(2).add(&two)?;
    Ok(numerator.div(&denominator)?.sub(&x.cos())?.sum())
}

fn loss_f64(x: &[f64]) -> f64 {
    let t = Tensor::from_vec(x.to_vec(), &[x.len()]).unwrap();
    no_grad(|| loss(&t)).unwrap().item_f64().unwrap()
}

#[test]
fn test_numerical_gradient_composite() {
    let x_data = random_input(5, 42);
    let numerical = numerical_gradient(loss_f64, &x_data, 1e-6);

    let x = leaf(&x_data);
    let y = loss(&x).unwrap();
    let analytical = autograd_grad(&y, &x, None, false).unwrap();

    assert_eq!(analytical.shape(), &[5]);
    for (a, n) in analytical.to_f64_vec().unwrap().iter().zip(&numerical) {
        assert_relative_eq!(a, n, epsilon = 1e-6);
    }
}

#[test]
fn test_numerical_second_derivative() {
    // Diagonal of the Hessian via the gradient of sum(grad)
    let x_data = random_input(4, 7);
    let first = |x: &[f64]| -> Vec<f64> {
        let t = leaf(x);
        let y = loss(&t).unwrap();
        autograd_grad(&y, &t, None, false)
            .unwrap()
            .to_f64_vec()
            .unwrap()
    };

    let x = leaf(&x_data);
    let y = loss(&x).unwrap();
    let g = autograd_grad(&y, &x, None, true).unwrap();
    let seed = Tensor::ones(&[4], DType::Float64);
    let hessian_row_sums = autograd_grad(&g.sum(), &x, None, false).unwrap();
    let with_seed = autograd_grad(&g, &x, Some(&seed), false).unwrap();
    for (a, b) in hessian_row_sums
        .to_f64_vec()
        .unwrap()
        .iter()
        .zip(with_seed.to_f64_vec().unwrap())
    {
        assert_relative_eq!(*a, b, epsilon = 1e-12);
    }

    // The loss is separable, so the Hessian is diagonal
    for i in 0..4 {
        let component = |x: &[f64]| first(x)[i];
        let numerical = numerical_gradient(component, &x_data, 1e-5)[i];
        assert_relative_eq!(
            hessian_row_sums.to_f64_vec().unwrap()[i],
            numerical,
            epsilon = 1e-5
        );
    }
}

#[test]
fn test_broadcast_scalar_operand() {
    // y = sum(w * x): dy/dw = sum(x), dy/dx = w
    let x_data = [1.0, 2.0, 3.0];
    let x = leaf(&x_data);
    let w = Tensor::scalar(0.5f64).requires_grad_(true).unwrap();
    let y = w.mul(&x).unwrap().sum();

    let gw = autograd_grad(&y, &w, None, false).unwrap();
    assert_eq!(gw.shape(), &[] as &[usize]);
    assert_relative_eq!(gw.item_f64().unwrap(), 6.0);

    let gx = autograd_grad(&y, &x, None, false).unwrap();
    assert_eq!(gx.to_f64_vec().unwrap(), vec![0.5, 0.5, 0.5]);
}

#[test]
fn test_reshape_and_expand() {
    let x = Tensor::scalar(3.0f64).requires_grad_(true).unwrap();
    let y = x
        .expand(&[2, 3])
        .unwrap()
        .reshape(&[6])
        .unwrap()
        .mul(&Tensor::from_vec((1..=6).map(f64::from).collect(), &[6]).unwrap())
        .unwrap()
        .sum();
    let g = autograd_grad(&y, &x, None, false).unwrap();
    assert_relative_eq!(g.item_f64().unwrap(), 21.0);
}

#[test]
fn test_no_grad_records_nothing() {
    let x = Tensor::scalar(1.0f64).requires_grad_(true).unwrap();
    let y = no_grad(|| x.exp());
    assert!(!y.requires_grad());
    assert!(matches!(
        autograd_grad(&y, &x, None, false),
        Err(TensorError::NoGradient)
    ));
}

#[test]
fn test_mixed_precision_gradient() {
    let x = Tensor::from_vec(vec![0.25f32, -1.5], &[2])
        .unwrap()
        .requires_grad_(true)
        .unwrap();
    let y = x
        .to_dtype(DType::Float64)
        .powi(3)
        .sum();
    let g = autograd_grad(&y, &x, None, false).unwrap();
    assert_eq!(g.dtype(), DType::Float32);
    let g = g.to_f64_vec().unwrap();
    assert_relative_eq!(g[0], 3.0 * 0.0625, epsilon = 1e-6);
    assert_relative_eq!(g[1], 3.0 * 2.25, epsilon = 1e-6);
}
