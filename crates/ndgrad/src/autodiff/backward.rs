//! Backward pass execution: the single-step gradient primitive.

use super::gradients::Gradients;
use super::graph::{Node, NodeId};
use super::tensor::Tensor;
use super::with_grad_mode;
use crate::error::TensorError;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Gradient of `output` with respect to `input`.
///
/// # Arguments
/// * `output` - Tensor produced by recorded operations
/// * `input` - Tensor that requires grad and was used to compute `output`
/// * `grad_output` - Seed for the vector-Jacobian product; `None` uses ones
///   and is only allowed for single-element outputs
/// * `create_graph` - Record the backward pass so the result can itself be
///   differentiated
///
/// # Errors
/// - [`TensorError::NoGradient`] if `output` is not part of a graph
/// - [`TensorError::InputNotTracked`] if `input` does not require grad
/// - [`TensorError::UnusedInput`] if `input` does not reach `output`
/// - [`TensorError::NonScalarOutput`] for an implicit seed on a multi-element output
/// - [`TensorError::ShapeMismatch`] if the seed size differs from the output size
///
/// # Example
///
/// ```
/// use ndgrad::autodiff::{Tensor, autograd_grad};
///
/// let x = Tensor::scalar(2.0f64).requires_grad_(true).unwrap();
/// let y = x.powi(3);
///
/// let dy = autograd_grad(&y, &x, None, true).unwrap();
/// assert_eq!(dy.item_f64().unwrap(), 12.0);
///
/// let d2y = autograd_grad(&dy, &x, None, false).unwrap();
/// assert_eq!(d2y.item_f64().unwrap(), 12.0);
/// ```
pub fn autograd_grad(
    output: &Tensor,
    input: &Tensor,
    grad_output: Option<&Tensor>,
    create_graph: bool,
) -> Result<Tensor, TensorError> {
    let root = output.node().ok_or(TensorError::NoGradient)?;
    let target = input.node().ok_or(TensorError::InputNotTracked)?.id();

    let seed = match grad_output {
        Some(seed) => {
            if seed.len() != output.len() {
                return Err(TensorError::ShapeMismatch {
                    expected: output.len(),
                    actual: seed.len(),
                });
            }
            seed.detach()
                .reshape(output.shape())?
                .to_dtype(output.dtype())
        }
        None => {
            if output.len() != 1 {
                return Err(TensorError::NonScalarOutput { len: output.len() });
            }
            output.ones_like()
        }
    };

    let order = nodes_leading_to(root, target)?;
    let relevant: HashSet<NodeId> = order.iter().map(|n| n.id()).collect();
    log::debug!(
        "backward from node {:?} to node {:?} visits {} nodes (create_graph = {})",
        root.id(),
        target,
        order.len(),
        create_graph
    );

    with_grad_mode(create_graph, || -> Result<Tensor, TensorError> {
        let mut gradients = Gradients::new();
        gradients.accumulate(root.id(), seed)?;

        for node in &order {
            // No gradient flowing to this node
            let Some(grad) = gradients.remove(node.id()) else {
                continue;
            };
            if node.id() == target {
                return Ok(grad.to_dtype(input.dtype()));
            }
            let Some(grad_fn) = node.grad_fn() else {
                continue;
            };
            let input_grads = grad_fn.backward(&grad)?;
            for (edge, input_grad) in node.inputs().iter().zip(input_grads) {
                if let (Some(next), Some(input_grad)) = (edge, input_grad) {
                    if relevant.contains(&next.id()) {
                        gradients.accumulate(next.id(), input_grad)?;
                    }
                }
            }
        }

        // Every path to the input was cut by a zero-derivative operation.
        Ok(input.zeros_like())
    })
}

/// Nodes reachable from `root` that lead to `target`, in topological order
/// (each node before the nodes it was computed from).
fn nodes_leading_to(root: &Rc<Node>, target: NodeId) -> Result<Vec<Rc<Node>>, TensorError> {
    let mut graph: DiGraph<Rc<Node>, ()> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();
    let mut stack = vec![Rc::clone(root)];
    index.insert(root.id(), graph.add_node(Rc::clone(root)));

    while let Some(node) = stack.pop() {
        // Nothing below the input can contribute to its gradient.
        if node.id() == target {
            continue;
        }
        let from = index[&node.id()];
        for next in node.inputs().iter().flatten() {
            let to = match index.get(&next.id()) {
                Some(&ix) => ix,
                None => {
                    let ix = graph.add_node(Rc::clone(next));
                    index.insert(next.id(), ix);
                    stack.push(Rc::clone(next));
                    ix
                }
            };
            graph.add_edge(from, to, ());
        }
    }

    let target_ix = *index.get(&target).ok_or(TensorError::UnusedInput)?;

    let mut leads_to_target = HashSet::new();
    let reversed = Reversed(&graph);
    let mut dfs = Dfs::new(reversed, target_ix);
    while let Some(ix) = dfs.next(reversed) {
        leads_to_target.insert(ix);
    }

    let order = toposort(&graph, None)
        .unwrap_or_else(|_| unreachable!("nodes only link to previously created nodes"));
    Ok(order
        .into_iter()
        .filter(|ix| leads_to_target.contains(ix))
        .map(|ix| Rc::clone(&graph[ix]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::{DType, c64};

    fn leaf(value: f64) -> Tensor {
        Tensor::scalar(value).requires_grad_(true).unwrap()
    }

    #[test]
    fn test_single_leaf_identity() {
        let x = leaf(3.0);
        let g = autograd_grad(&x, &x, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 1.0);
    }

    #[test]
    fn test_chain() {
        // y = 3 * (2 * x)
        let x = leaf(1.0);
        let y = x.scale(2.0).unwrap().scale(3.0).unwrap();
        let g = autograd_grad(&y, &x, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 6.0);
        assert!(!g.requires_grad());
    }

    #[test]
    fn test_diamond_accumulates() {
        // y = (x * x) + x, paths share x
        let x = leaf(2.0);
        let y = x.mul(&x).unwrap().add(&x).unwrap();
        let g = autograd_grad(&y, &x, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 5.0);
    }

    #[test]
    fn test_shared_intermediate_is_fully_accumulated() {
        // u = x * x; y = u * u + u  ->  dy/dx = (2u + 1) * 2x = 36 at x = 2
        let x = leaf(2.0);
        let u = x.mul(&x).unwrap();
        let y = u.mul(&u).unwrap().add(&u).unwrap();
        let g = autograd_grad(&y, &x, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 36.0);
    }

    #[test]
    fn test_gradient_wrt_intermediate() {
        let x = leaf(2.0);
        let u = x.mul(&x).unwrap();
        let y = u.scale(5.0).unwrap();
        let g = autograd_grad(&y, &u, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 5.0);
    }

    #[test]
    fn test_create_graph_records_result() {
        let x = leaf(2.0);
        let y = x.powi(3);
        let g = autograd_grad(&y, &x, None, true).unwrap();
        assert!(g.requires_grad());
        let g2 = autograd_grad(&g, &x, None, true).unwrap();
        assert_eq!(g2.item_f64().unwrap(), 12.0);
    }

    #[test]
    fn test_output_not_tracked() {
        let x = leaf(1.0);
        let y = Tensor::scalar(1.0f64);
        assert!(matches!(
            autograd_grad(&y, &x, None, false),
            Err(TensorError::NoGradient)
        ));
    }

    #[test]
    fn test_input_not_tracked() {
        let x = leaf(1.0);
        let y = x.exp();
        let plain = Tensor::scalar(1.0f64);
        assert!(matches!(
            autograd_grad(&y, &plain, None, false),
            Err(TensorError::InputNotTracked)
        ));
    }

    #[test]
    fn test_unused_input() {
        let x = leaf(1.0);
        let z = leaf(1.0);
        let y = x.exp();
        assert!(matches!(
            autograd_grad(&y, &z, None, false),
            Err(TensorError::UnusedInput)
        ));
    }

    #[test]
    fn test_non_scalar_output_needs_seed() {
        let x = Tensor::from_vec(vec![1.0f64, 2.0], &[2])
            .unwrap()
            .requires_grad_(true)
            .unwrap();
        let y = x.mul(&x).unwrap();
        assert!(matches!(
            autograd_grad(&y, &x, None, false),
            Err(TensorError::NonScalarOutput { len: 2 })
        ));

        let seed = Tensor::ones(&[2], DType::Float64);
        let g = autograd_grad(&y, &x, Some(&seed), false).unwrap();
        assert_eq!(g.to_f64_vec().unwrap(), vec![2.0, 4.0]);

        let bad_seed = Tensor::ones(&[3], DType::Float64);
        assert!(matches!(
            autograd_grad(&y, &x, Some(&bad_seed), false),
            Err(TensorError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_complex_conjugate_convention() {
        // f(z) = z^2, seed 1: result is conj(2z)
        let z = Tensor::scalar(c64::new(1.0, 1.0)).requires_grad_(true).unwrap();
        let f = z.mul(&z).unwrap();
        let g = autograd_grad(&f, &z, None, false).unwrap();
        assert_eq!(g.item_c64().unwrap(), c64::new(2.0, -2.0));
    }

    #[test]
    fn test_result_cast_to_input_dtype() {
        let x = Tensor::scalar(1.5f32).requires_grad_(true).unwrap();
        let y = x.mul(&Tensor::scalar(2.0f64)).unwrap();
        assert_eq!(y.dtype(), DType::Float64);
        let g = autograd_grad(&y, &x, None, false).unwrap();
        assert_eq!(g.dtype(), DType::Float32);
        assert_eq!(g.item_f64().unwrap(), 2.0);
    }

    #[test]
    fn test_zero_derivative_path() {
        let x = leaf(4.0);
        let y = x.powi(0);
        let g = autograd_grad(&y, &x, None, false).unwrap();
        assert_eq!(g.item_f64().unwrap(), 0.0);
    }
}
