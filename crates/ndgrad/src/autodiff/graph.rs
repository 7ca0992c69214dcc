//! Computation graph nodes for reverse-mode automatic differentiation.
//!
//! Nodes are reference-counted and point at the nodes of their inputs, so a
//! graph lives exactly as long as some tensor still refers to it.

use super::tensor::Tensor;
use crate::error::TensorError;
use std::cell::Cell;
use std::fmt::{self, Debug};
use std::rc::Rc;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(0) };
}

/// Unique identifier for a node in the computation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NEXT_ID.with(|id| {
            let current = id.get();
            id.set(current + 1);
            NodeId(current)
        })
    }

    /// Get the internal index.
    pub fn index(&self) -> u64 {
        self.0
    }
}

/// Backward function trait.
///
/// Computes the vector-Jacobian product of one operation. Implementations
/// build their results from differentiable tensor operations, so running
/// them with grad mode enabled records a graph for the next derivative.
pub trait GradFn: Debug {
    /// Given the gradient of the output, return one gradient per input in
    /// the order the inputs were recorded. `None` means no gradient flows.
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Option<Tensor>>, TensorError>;

    /// Human-readable name for debugging.
    fn name(&self) -> &'static str;
}

/// A node in the computation graph.
pub struct Node {
    id: NodeId,
    /// Backward function (None for leaf nodes).
    grad_fn: Option<Box<dyn GradFn>>,
    /// Nodes of the recorded inputs; `None` for inputs that did not require grad.
    inputs: Vec<Option<Rc<Node>>>,
}

impl Node {
    /// Create a leaf node (user-created tensor with requires_grad = true).
    pub(crate) fn leaf() -> Rc<Node> {
        Rc::new(Node {
            id: NodeId::next(),
            grad_fn: None,
            inputs: Vec::new(),
        })
    }

    /// Create a computed node with a backward function.
    pub(crate) fn computed(grad_fn: Box<dyn GradFn>, inputs: Vec<Option<Rc<Node>>>) -> Rc<Node> {
        Rc::new(Node {
            id: NodeId::next(),
            grad_fn: Some(grad_fn),
            inputs,
        })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn grad_fn(&self) -> Option<&dyn GradFn> {
        self.grad_fn.as_deref()
    }

    pub fn inputs(&self) -> &[Option<Rc<Node>>] {
        &self.inputs
    }

    pub fn is_leaf(&self) -> bool {
        self.grad_fn.is_none()
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("grad_fn", &self.grad_fn.as_ref().map(|g| g.name()))
            .field("num_inputs", &self.inputs.len())
            .finish()
    }
}
