// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Explicit mutation commands and ordered batches of them.
use crate::edge::Edge;

/// Single mutation command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Store an edge. `None` uses the engine clock.
    Add {
        /// Edge to store.
        edge: Edge,
        /// Explicit timestamp, if any.
        timestamp: Option<i64>,
    },
    /// Remove an edge if it is stored.
    Remove {
        /// Edge to remove.
        edge: Edge,
    },
}

impl Op {
    /// Edge this command targets.
    pub fn edge(&self) -> &Edge {
        match self {
            Self::Add { edge, .. } | Self::Remove { edge } => edge,
        }
    }
}

/// Ordered list of [`Op`]s executed as one transaction by
/// [`Hypergraph::batch_exec`](crate::Hypergraph::batch_exec).
///
/// ```
/// use hgraph_core::{Batch, Edge};
///
/// let a: Edge = "(is graphbrain/1 great/1)".parse()?;
/// let b: Edge = "(src graphbrain/1 (size graphbrain/1 -7.0))".parse()?;
/// let batch = Batch::new().add(a).add_at(b.clone(), 42).remove(b);
/// assert_eq!(batch.len(), 3);
/// # Ok::<(), hgraph_core::HgError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<Op>,
}

impl Batch {
    /// Empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an add stamped by the engine clock.
    pub fn add(mut self, edge: Edge) -> Self {
        self.ops.push(Op::Add {
            edge,
            timestamp: None,
        });
        self
    }

    /// Appends an add with an explicit timestamp.
    pub fn add_at(mut self, edge: Edge, timestamp: i64) -> Self {
        self.ops.push(Op::Add {
            edge,
            timestamp: Some(timestamp),
        });
        self
    }

    /// Appends a remove.
    pub fn remove(mut self, edge: Edge) -> Self {
        self.ops.push(Op::Remove { edge });
        self
    }

    /// Appends an arbitrary command.
    pub fn push(&mut self, op: Op) {
        self.ops.push(op);
    }

    /// Commands in execution order.
    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when the batch holds no commands.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl From<Vec<Op>> for Batch {
    fn from(ops: Vec<Op>) -> Self {
        Self { ops }
    }
}

impl FromIterator<Op> for Batch {
    fn from_iter<I: IntoIterator<Item = Op>>(iter: I) -> Self {
        Self {
            ops: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Batch {
    type Item = Op;
    type IntoIter = std::vec::IntoIter<Op>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// One edge or an ordered collection of edges, as accepted by
/// [`Hypergraph::add`](crate::Hypergraph::add) and
/// [`Hypergraph::remove`](crate::Hypergraph::remove).
pub trait IntoEdges {
    /// Flattens into edges in order.
    fn into_edges(self) -> Vec<Edge>;
}

impl IntoEdges for Edge {
    fn into_edges(self) -> Vec<Edge> {
        vec![self]
    }
}

impl IntoEdges for &Edge {
    fn into_edges(self) -> Vec<Edge> {
        vec![self.clone()]
    }
}

impl IntoEdges for Vec<Edge> {
    fn into_edges(self) -> Vec<Edge> {
        self
    }
}

impl IntoEdges for &[Edge] {
    fn into_edges(self) -> Vec<Edge> {
        self.to_vec()
    }
}

impl<const N: usize> IntoEdges for [Edge; N] {
    fn into_edges(self) -> Vec<Edge> {
        self.into()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn edge(s: &str) -> Edge {
        s.parse().unwrap()
    }

    #[test]
    fn builder_preserves_order() {
        let a = edge("(a b)");
        let b = edge("(c d)");
        let batch = Batch::new().add(a.clone()).remove(b.clone()).add_at(b.clone(), 9);
        let edges: Vec<&Edge> = batch.ops().iter().map(Op::edge).collect();
        assert_eq!(edges, vec![&a, &b, &b]);
        assert_eq!(
            batch.ops()[2],
            Op::Add {
                edge: b,
                timestamp: Some(9)
            }
        );
    }

    #[test]
    fn into_edges_accepts_single_and_many() {
        let a = edge("(a b)");
        let b = edge("(c d)");
        assert_eq!(a.clone().into_edges().len(), 1);
        assert_eq!((&a).into_edges().len(), 1);
        assert_eq!([a.clone(), b.clone()].into_edges(), vec![a.clone(), b.clone()]);
        assert_eq!(vec![b.clone(), a.clone()].as_slice().into_edges(), vec![b, a]);
    }
}
