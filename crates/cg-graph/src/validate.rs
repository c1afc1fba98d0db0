//! Graph validation logic.

use cg_core::NodeId;

use crate::builder::PendingNode;
use crate::error::{GraphError, GraphResult};

/// Check roots and input references, returning each node's bound inputs.
pub(crate) fn resolve_inputs(
    nodes: &[PendingNode],
    roots: &[NodeId],
) -> GraphResult<Vec<Vec<NodeId>>> {
    if roots.is_empty() {
        return Err(GraphError::NoRoots);
    }
    for &root in roots {
        if root.slot() >= nodes.len() {
            return Err(GraphError::UnknownNode { node: root });
        }
    }

    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let id = NodeId::from_index(i as u32);
            node.inputs
                .iter()
                .enumerate()
                .map(|(slot, input)| match input {
                    None => Err(GraphError::UninitializedInput { node: id, slot }),
                    Some(input) if input.slot() >= nodes.len() => {
                        Err(GraphError::UnknownNode { node: *input })
                    }
                    Some(input) => Ok(*input),
                })
                .collect::<GraphResult<Vec<NodeId>>>()
        })
        .collect()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Topological order produced by [`check_acyclic`].
#[derive(Debug, PartialEq)]
pub(crate) struct EvaluationOrder {
    /// Every node, inputs before the nodes reading them.
    pub(crate) order: Vec<NodeId>,
    /// Length of the prefix of `order` reachable from the roots.
    pub(crate) from_roots: usize,
}

/// Depth-first three-colour search over input edges.
///
/// Roots are searched first, then any node no root reaches, so a cycle
/// anywhere in the store is rejected. Reaching an in-progress node closes a
/// cycle; that node is reported. Nodes are emitted in post-order as they are
/// finished, which is an evaluation order.
pub(crate) fn check_acyclic(
    inputs: &[Vec<NodeId>],
    roots: &[NodeId],
) -> GraphResult<EvaluationOrder> {
    let mut marks = vec![Mark::Unvisited; inputs.len()];
    let mut order = Vec::with_capacity(inputs.len());
    let mut from_roots = 0;
    let starts = roots
        .iter()
        .map(|r| r.slot())
        .chain(0..inputs.len());

    // Explicit stack of (node, next input slot) keeps deep chains off the call stack.
    let mut stack: Vec<(usize, usize)> = Vec::new();
    for (n, start) in starts.enumerate() {
        if n == roots.len() {
            from_roots = order.len();
        }
        if marks[start] != Mark::Unvisited {
            continue;
        }
        marks[start] = Mark::InProgress;
        stack.push((start, 0));

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match inputs[node].get(next) {
                Some(input) => {
                    top.1 += 1;
                    let child = input.slot();
                    match marks[child] {
                        Mark::InProgress => {
                            return Err(GraphError::CycleDetected { node: *input });
                        }
                        Mark::Unvisited => {
                            marks[child] = Mark::InProgress;
                            stack.push((child, 0));
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    order.push(NodeId::from_index(node as u32));
                    stack.pop();
                }
            }
        }
    }
    Ok(EvaluationOrder { order, from_roots })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(indices: &[u32]) -> Vec<NodeId> {
        indices.iter().map(|&i| NodeId::from_index(i)).collect()
    }

    #[test]
    fn chain_is_acyclic() {
        // 2 <- 1 <- 0
        let inputs = vec![ids(&[1]), ids(&[2]), ids(&[])];
        assert!(check_acyclic(&inputs, &ids(&[0])).is_ok());
    }

    #[test]
    fn diamond_is_acyclic() {
        // 0 reads 1 and 2, both read 3
        let inputs = vec![ids(&[1, 2]), ids(&[3]), ids(&[3]), ids(&[])];
        assert!(check_acyclic(&inputs, &ids(&[0])).is_ok());
    }

    #[test]
    fn order_puts_inputs_first() {
        // 0 reads 1 and 2, both read 3; 4 is unreachable from root 0.
        let inputs = vec![ids(&[1, 2]), ids(&[3]), ids(&[3]), ids(&[]), ids(&[3])];
        let eval = check_acyclic(&inputs, &ids(&[0])).unwrap();
        assert_eq!(eval.order, ids(&[3, 1, 2, 0, 4]));
        assert_eq!(eval.from_roots, 4);
    }

    #[test]
    fn three_cycle_detected() {
        // A(0) -> B(1) -> C(2) -> A(0)
        let inputs = vec![ids(&[1]), ids(&[2]), ids(&[0])];
        assert_eq!(
            check_acyclic(&inputs, &ids(&[0])),
            Err(GraphError::CycleDetected {
                node: NodeId::from_index(0)
            })
        );
    }

    #[test]
    fn self_loop_detected() {
        let inputs = vec![ids(&[]), ids(&[1])];
        assert_eq!(
            check_acyclic(&inputs, &ids(&[0])),
            Err(GraphError::CycleDetected {
                node: NodeId::from_index(1)
            })
        );
    }

    #[test]
    fn unreachable_cycle_detected() {
        // Root 0 is a leaf; 1 and 2 form a cycle no root reaches.
        let inputs = vec![ids(&[]), ids(&[2]), ids(&[1])];
        assert!(matches!(
            check_acyclic(&inputs, &ids(&[0])),
            Err(GraphError::CycleDetected { .. })
        ));
    }
}
