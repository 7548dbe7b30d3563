// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Edge-shaped query templates with wildcard positions.
use std::fmt;
use std::str::FromStr;

use crate::edge::{Edge, Item};
use crate::error::HgError;
use crate::parse::{self, Node};

/// Text token for [`PatternItem::Wildcard`].
pub const WILDCARD_TOKEN: &str = "*";

/// One position of a [`Pattern`].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum PatternItem {
    /// Matches any item.
    Wildcard,
    /// Matches only an item structurally equal to this one.
    Item(Item),
    /// Matches a nested edge that itself matches this pattern.
    Nested(Pattern),
}

impl PatternItem {
    fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Item(expected) => expected == item,
            Self::Nested(pattern) => item.as_edge().is_some_and(|edge| pattern.matches(edge)),
        }
    }
}

impl From<Item> for PatternItem {
    fn from(item: Item) -> Self {
        Self::Item(item)
    }
}

impl fmt::Display for PatternItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wildcard => f.write_str(WILDCARD_TOKEN),
            Self::Item(item) => item.fmt(f),
            Self::Nested(pattern) => pattern.fmt(f),
        }
    }
}

/// Query template with the shape of an edge.
///
/// A pattern matches an edge iff both have the same arity and every position
/// matches: wildcards match anything, literal items require structural
/// equality. There are no partial-arity matches.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Pattern {
    items: Vec<PatternItem>,
}

impl Pattern {
    /// Builds a pattern from its positions.
    ///
    /// # Errors
    /// Returns [`HgError::MalformedEdge`] when `items` is empty.
    pub fn new(items: impl IntoIterator<Item = PatternItem>) -> Result<Self, HgError> {
        let items: Vec<PatternItem> = items.into_iter().collect();
        if items.is_empty() {
            return Err(HgError::malformed("pattern must contain at least one item"));
        }
        Ok(Self { items })
    }

    /// Pattern of `arity` wildcards, matching every edge of that arity.
    ///
    /// # Errors
    /// Returns [`HgError::MalformedEdge`] when `arity` is zero.
    pub fn wildcards(arity: usize) -> Result<Self, HgError> {
        Self::new(std::iter::repeat_n(PatternItem::Wildcard, arity))
    }

    /// Positions of this pattern.
    pub fn items(&self) -> &[PatternItem] {
        &self.items
    }

    /// Number of positions.
    pub fn arity(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` when `edge` satisfies this pattern.
    pub fn matches(&self, edge: &Edge) -> bool {
        self.items.len() == edge.arity()
            && self
                .items
                .iter()
                .zip(edge.items())
                .all(|(pattern, item)| pattern.matches(item))
    }

    /// Concrete top-level items the engine can use to narrow a scan, in
    /// position order.
    pub(crate) fn literal_items(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter_map(|p| match p {
            PatternItem::Item(item) => Some(item),
            PatternItem::Wildcard | PatternItem::Nested(_) => None,
        })
    }
}

/// Free-function form of [`Pattern::matches`].
pub fn matches(pattern: &Pattern, edge: &Edge) -> bool {
    pattern.matches(edge)
}

impl From<&Edge> for Pattern {
    fn from(edge: &Edge) -> Self {
        Self {
            items: edge.items().iter().cloned().map(PatternItem::Item).collect(),
        }
    }
}

impl fmt::Display for Pattern {
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

fn pattern_item_from_node(node: &Node<'_>) -> Result<PatternItem, HgError> {
    match node {
        Node::Token { text, .. } if *text == WILDCARD_TOKEN => Ok(PatternItem::Wildcard),
        Node::Token { text, offset } => {
            parse::atom_from_token(text, *offset).map(|atom| PatternItem::Item(Item::Atom(atom)))
        }
        Node::List { .. } => {
            let nested = pattern_from_node(node)?;
            // A sub-pattern without wildcards is just a literal edge.
            if nested.items.iter().all(|p| matches!(p, PatternItem::Item(_))) {
                parse::edge_from_node(node).map(|edge| PatternItem::Item(Item::Edge(edge)))
            } else {
                Ok(PatternItem::Nested(nested))
            }
        }
    }
}

fn pattern_from_node(node: &Node<'_>) -> Result<Pattern, HgError> {
    match node {
        Node::List { children, .. } => Pattern::new(
            children
                .iter()
                .map(pattern_item_from_node)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Node::Token { .. } => Err(HgError::parse(node.offset(), "expected '('")),
    }
}

impl FromStr for Pattern {
    type Err = HgError;

    /// Parses canonical text where the token `*` marks a wildcard.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        pattern_from_node(&parse::parse_tree(s)?)
    }
}
