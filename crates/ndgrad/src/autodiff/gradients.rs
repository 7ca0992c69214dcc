//! Gradient storage container.

use super::graph::NodeId;
use super::tensor::Tensor;
use crate::error::TensorError;
use std::collections::HashMap;

/// Container for gradients accumulated during a backward pass.
///
/// Keyed by [`NodeId`]; a node reached along several paths gets the sum of
/// the contributions. Accumulation uses the differentiable `add`, so it is
/// recorded when the backward pass builds a graph.
#[derive(Debug, Default)]
pub struct Gradients {
    grads: HashMap<NodeId, Tensor>,
}

impl Gradients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate gradient for a node.
    pub fn accumulate(&mut self, id: NodeId, grad: Tensor) -> Result<(), TensorError> {
        if let Some(existing) = self.grads.get_mut(&id) {
            *existing = existing.add(&grad)?;
        } else {
            self.grads.insert(id, grad);
        }
        Ok(())
    }

    /// Remove and return gradient (for passing to backward functions).
    pub fn remove(&mut self, id: NodeId) -> Option<Tensor> {
        self.grads.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked_id() -> NodeId {
        Tensor::scalar(0.0f64)
            .requires_grad_(true)
            .unwrap()
            .node_id()
            .unwrap()
    }

    #[test]
    fn test_gradients_new() {
        let mut grads = Gradients::new();
        assert!(grads.remove(tracked_id()).is_none());
    }

    #[test]
    fn test_accumulate_sums_contributions() {
        let mut grads = Gradients::new();
        let id = tracked_id();
        grads
            .accumulate(id, Tensor::from_vec(vec![1.0f64, 2.0, 3.0], &[3]).unwrap())
            .unwrap();
        grads
            .accumulate(id, Tensor::from_vec(vec![4.0f64, 5.0, 6.0], &[3]).unwrap())
            .unwrap();

        assert_eq!(
            grads.remove(id).unwrap().to_f64_vec().unwrap(),
            vec![5.0, 7.0, 9.0]
        );
        assert!(grads.remove(id).is_none());
    }

    #[test]
    fn test_accumulate_shape_mismatch() {
        let mut grads = Gradients::new();
        let id = tracked_id();
        grads.accumulate(id, Tensor::zeros(&[2], crate::DType::Float64)).unwrap();
        assert!(
            grads
                .accumulate(id, Tensor::zeros(&[3], crate::DType::Float64))
                .is_err()
        );
    }

    #[test]
    fn test_remove() {
        let mut grads = Gradients::new();
        let id = tracked_id();
        grads.accumulate(id, Tensor::scalar(1.0f32)).unwrap();
        assert!(grads.remove(id).is_some());
        assert!(grads.remove(id).is_none());
    }
}
