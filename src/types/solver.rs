use thiserror::Error;

use super::expr::{Expr, TagReference};
use super::tag_index::TagIndex;

/// Structural failures raised by cached evaluation.
///
/// These indicate a corrupted solver order, not bad input data; a correctly
/// constructed order can never produce them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("malformed solver order: no nodes to evaluate")]
    EmptyOrder,

    #[error("malformed solver order: node {parent} references child {child} out of evaluation order")]
    OutOfOrderChild { parent: usize, child: usize },
}

#[derive(Debug, Clone)]
enum SolverNode {
    Unit(TagReference),
    And { left: usize, right: usize },
    Or { left: usize, right: usize },
    Not { operand: usize },
}

/// Preorder linearization of an [`Expr`] tree.
///
/// Built once per parsed expression and reused across evaluations: iterating
/// the sequence in reverse computes every node's value from children that
/// were already computed, so repeated evaluation of the same rule against
/// many inputs avoids re-walking the tree. Scratch state is allocated per
/// [`solve`](Self::solve) call, never stored on the shared nodes, so one
/// order can be solved concurrently from multiple threads.
#[derive(Debug, Clone)]
pub struct SolverOrder {
    nodes: Vec<SolverNode>,
}

impl SolverOrder {
    pub(crate) fn from_expr(expr: &Expr) -> Self {
        let mut nodes = Vec::new();
        flatten(expr, &mut nodes);
        Self { nodes }
    }

    /// Number of nodes in the linearized tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Evaluate bottom-up against a tag index.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] if the order is structurally corrupt (a node
    /// referencing a child that is not strictly later in preorder).
    pub fn solve(&self, index: &TagIndex) -> Result<bool, EvalError> {
        if self.nodes.is_empty() {
            return Err(EvalError::EmptyOrder);
        }

        let mut values = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate().rev() {
            values[i] = match node {
                SolverNode::Unit(reference) => reference.matches(index),
                SolverNode::And { left, right } => {
                    self.child_value(&values, i, *left)? && self.child_value(&values, i, *right)?
                }
                SolverNode::Or { left, right } => {
                    self.child_value(&values, i, *left)? || self.child_value(&values, i, *right)?
                }
                SolverNode::Not { operand } => !self.child_value(&values, i, *operand)?,
            };
        }

        // Preorder puts the root first.
        Ok(values[0])
    }

    fn child_value(&self, values: &[bool], parent: usize, child: usize) -> Result<bool, EvalError> {
        if child <= parent || child >= self.nodes.len() {
            return Err(EvalError::OutOfOrderChild { parent, child });
        }
        Ok(values[child])
    }
}

fn flatten(expr: &Expr, nodes: &mut Vec<SolverNode>) -> usize {
    let index = nodes.len();
    match expr {
        Expr::Unit(reference) => nodes.push(SolverNode::Unit(reference.clone())),
        Expr::And(a, b) => {
            // Child indices are patched once the subtrees are flattened.
            nodes.push(SolverNode::And { left: 0, right: 0 });
            let left = flatten(a, nodes);
            let right = flatten(b, nodes);
            nodes[index] = SolverNode::And { left, right };
        }
        Expr::Or(a, b) => {
            nodes.push(SolverNode::Or { left: 0, right: 0 });
            let left = flatten(a, nodes);
            let right = flatten(b, nodes);
            nodes[index] = SolverNode::Or { left, right };
        }
        Expr::Not(inner) => {
            nodes.push(SolverNode::Not { operand: 0 });
            let operand = flatten(inner, nodes);
            nodes[index] = SolverNode::Not { operand };
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use std::ops::Not as _;

    use super::*;
    use crate::types::expr::{scoped_tag, tag};

    #[test]
    fn preorder_length_counts_every_node() {
        let expr = tag("a").and(tag("b").or(tag("c")).not());
        // AND, a, NOT, OR, b, c
        assert_eq!(expr.solver_order().len(), 6);
    }

    #[test]
    fn solve_matches_recursive_solver() {
        let expr = tag("a").and(tag("b").or(scoped_tag("c", "f1")));
        let order = expr.solver_order();

        let cases = [
            TagIndex::new(),
            TagIndex::new().with_tag("a", &[]),
            TagIndex::new().with_tag("a", &[]).with_tag("b", &[]),
            TagIndex::new().with_tag("a", &[]).with_tag("c", &["f1.x"]),
            TagIndex::new().with_tag("a", &[]).with_tag("c", &["f2"]),
            TagIndex::new().with_tag("b", &[]).with_tag("c", &["f1"]),
        ];
        for index in &cases {
            assert_eq!(order.solve(index), Ok(expr.solve(index)));
        }
    }

    #[test]
    fn solve_single_unit() {
        let order = tag("a").solver_order();
        assert_eq!(order.solve(&TagIndex::new().with_tag("a", &[])), Ok(true));
        assert_eq!(order.solve(&TagIndex::new()), Ok(false));
    }

    #[test]
    fn solve_reuses_order_across_inputs() {
        let order = tag("x").or(tag("y")).solver_order();
        assert_eq!(order.solve(&TagIndex::new().with_tag("x", &[])), Ok(true));
        assert_eq!(order.solve(&TagIndex::new().with_tag("y", &[])), Ok(true));
        assert_eq!(order.solve(&TagIndex::new().with_tag("z", &[])), Ok(false));
    }
}
