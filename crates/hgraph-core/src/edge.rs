// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Hyperedges: ordered, non-empty sequences of atoms and nested edges.
use std::fmt;
use std::sync::Arc;

use crate::atom::Atom;
use crate::error::HgError;
use crate::ident::{make_edge_id, EdgeId};

/// One position of an edge: an atom or a nested edge.
///
/// `Item` is also the engine's notion of a *vertex*: anything that can sit at
/// the top level of a stored edge and therefore has a degree and a star.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Item {
    /// Leaf value.
    Atom(Atom),
    /// Nested hyperedge.
    Edge(Edge),
}

impl Item {
    /// Returns the atom when this item is one.
    pub fn as_atom(&self) -> Option<&Atom> {
        match self {
            Self::Atom(atom) => Some(atom),
            Self::Edge(_) => None,
        }
    }

    /// Returns the edge when this item is one.
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Self::Atom(_) => None,
            Self::Edge(edge) => Some(edge),
        }
    }

    /// Returns `true` for atoms.
    pub fn is_atom(&self) -> bool {
        matches!(self, Self::Atom(_))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Atom(atom) => atom.fmt(f),
            Self::Edge(edge) => edge.fmt(f),
        }
    }
}

impl From<Atom> for Item {
    fn from(atom: Atom) -> Self {
        Self::Atom(atom)
    }
}

impl From<Edge> for Item {
    fn from(edge: Edge) -> Self {
        Self::Edge(edge)
    }
}

impl From<&Edge> for Item {
    fn from(edge: &Edge) -> Self {
        Self::Edge(edge.clone())
    }
}

/// Immutable hyperedge.
///
/// The first item is the *connector*; the rest are *participants*. Equality is
/// positional and recursive: no participant is ever reordered. Items live
/// behind an `Arc`, so cloning an edge (or storing it inside another edge) is
/// cheap and never copies the tree.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    items: Arc<[Item]>,
}

impl Edge {
    /// Builds an edge from its items, connector first.
    ///
    /// # Errors
    /// Returns [`HgError::MalformedEdge`] when `items` is empty.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Result<Self, HgError> {
        let items: Arc<[Item]> = items.into_iter().collect();
        if items.is_empty() {
            return Err(HgError::malformed("edge must contain at least one item"));
        }
        Ok(Self { items })
    }

    /// First item, establishing the relation's semantics.
    pub fn connector(&self) -> &Item {
        // `new` rejects empty sequences, so index 0 always exists.
        &self.items[0]
    }

    /// Every item after the connector.
    pub fn participants(&self) -> &[Item] {
        &self.items[1..]
    }

    /// All items, connector first.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Number of items.
    pub fn arity(&self) -> usize {
        self.items.len()
    }

    /// Top-level items that are atoms, in position order.
    pub fn atoms(&self) -> impl Iterator<Item = &Atom> {
        self.items.iter().filter_map(Item::as_atom)
    }

    /// Returns a new edge with the item at `index` replaced.
    ///
    /// # Errors
    /// Returns [`HgError::MalformedEdge`] when `index` is out of range.
    pub fn with_item(&self, index: usize, item: impl Into<Item>) -> Result<Self, HgError> {
        if index >= self.items.len() {
            return Err(HgError::malformed(format!(
                "item index {index} out of range for arity {}",
                self.items.len()
            )));
        }
        let mut items = self.items.to_vec();
        items[index] = item.into();
        Self::new(items)
    }

    /// Content-derived identifier of this edge.
    pub fn id(&self) -> EdgeId {
        make_edge_id(self)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            item.fmt(f)?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge{self}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Item {
        match s.split_once('/') {
            Some((root, suffix)) => Item::Atom(Atom::symbol(root, Some(suffix)).unwrap()),
            None => Item::Atom(Atom::symbol(s, None).unwrap()),
        }
    }

    fn is_great() -> Edge {
        Edge::new([sym("is"), sym("graphbrain/1"), sym("great/1")]).unwrap()
    }

    #[test]
    fn empty_edge_is_malformed() {
        let err = Edge::new(Vec::new()).unwrap_err();
        assert!(matches!(err, HgError::MalformedEdge { .. }));
    }

    #[test]
    fn connector_and_participants() {
        let edge = is_great();
        assert_eq!(edge.connector(), &sym("is"));
        assert_eq!(edge.participants(), &[sym("graphbrain/1"), sym("great/1")]);
        assert_eq!(edge.arity(), 3);
    }

    #[test]
    fn single_item_edge_has_no_participants() {
        let edge = Edge::new([sym("alone")]).unwrap();
        assert!(edge.participants().is_empty());
        assert_eq!(edge.to_string(), "(alone)");
    }

    #[test]
    fn equality_is_positional() {
        let a = Edge::new([sym("is"), sym("a"), sym("b")]).unwrap();
        let b = Edge::new([sym("is"), sym("b"), sym("a")]).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn nested_rendering_is_canonical() {
        let inner = Edge::new([sym("size"), sym("graphbrain/1"), Item::Atom(Atom::float(-7.0))])
            .unwrap();
        let outer = Edge::new([sym("src"), sym("graphbrain/1"), Item::Edge(inner)]).unwrap();
        assert_eq!(outer.to_string(), "(src graphbrain/1 (size graphbrain/1 -7.0))");
    }

    #[test]
    fn with_item_leaves_original_untouched() {
        let edge = is_great();
        let edited = edge.with_item(2, Atom::symbol("awesome", Some("1")).unwrap()).unwrap();
        assert_eq!(edge.to_string(), "(is graphbrain/1 great/1)");
        assert_eq!(edited.to_string(), "(is graphbrain/1 awesome/1)");
        assert!(edge.with_item(3, Atom::int(1)).is_err());
    }

    #[test]
    fn atoms_skips_nested_edges() {
        let outer = Edge::new([sym("says"), sym("mary/1"), Item::Edge(is_great())]).unwrap();
        let atoms: Vec<String> = outer.atoms().map(ToString::to_string).collect();
        assert_eq!(atoms, vec!["says", "mary/1"]);
    }
}
