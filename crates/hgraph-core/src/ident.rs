// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use std::fmt;

use blake3::Hasher;

use crate::atom::{float_bits, Atom};
use crate::edge::{Edge, Item};

/// Canonical 256-bit hash.
pub type Hash = [u8; 32];

/// Content-derived identifier for an edge.
///
/// `EdgeId` is `blake3("edge:" || encoding)` where the encoding tags every
/// item with its kind and length-prefixes every string, so two edges share an
/// id exactly when they are structurally equal. Backends use it as the
/// storage key; logs use [`EdgeId::short`].
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub Hash);

impl EdgeId {
    /// Returns the canonical byte representation of this id.
    pub fn as_bytes(&self) -> &Hash {
        &self.0
    }

    /// First 8 bytes as lowercase hex.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.short())
    }
}

const TAG_EDGE: u8 = 0;
const TAG_SYMBOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;

/// Produces the identifier for an edge from its structure.
pub fn make_edge_id(edge: &Edge) -> EdgeId {
    let mut hasher = Hasher::new();
    hasher.update(b"edge:");
    encode_edge(&mut hasher, edge);
    EdgeId(hasher.finalize().into())
}

fn encode_edge(hasher: &mut Hasher, edge: &Edge) {
    hasher.update(&[TAG_EDGE]);
    encode_len(hasher, edge.arity());
    for item in edge.items() {
        match item {
            Item::Atom(atom) => encode_atom(hasher, atom),
            Item::Edge(inner) => encode_edge(hasher, inner),
        }
    }
}

fn encode_atom(hasher: &mut Hasher, atom: &Atom) {
    match atom {
        Atom::Symbol(symbol) => {
            hasher.update(&[TAG_SYMBOL]);
            encode_str(hasher, symbol.root());
            match symbol.suffix() {
                Some(suffix) => {
                    hasher.update(&[1]);
                    encode_str(hasher, suffix);
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
        Atom::Int(value) => {
            hasher.update(&[TAG_INT]);
            hasher.update(&value.to_le_bytes());
        }
        Atom::Float(value) => {
            hasher.update(&[TAG_FLOAT]);
            hasher.update(&float_bits(*value).to_le_bytes());
        }
    }
}

fn encode_str(hasher: &mut Hasher, text: &str) {
    encode_len(hasher, text.len());
    hasher.update(text.as_bytes());
}

fn encode_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

/// Thin wrapper around a transaction identifier.
///
/// The engine issues monotonically increasing identifiers starting at `1`;
/// zero is reserved.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct TxId(u64);

impl TxId {
    /// Constructs a `TxId` from a raw `u64` value.
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying raw value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn edge(items: Vec<Atom>) -> Edge {
        Edge::new(items.into_iter().map(Item::Atom)).unwrap()
    }

    fn sym(root: &str, suffix: Option<&str>) -> Atom {
        Atom::symbol_unchecked(root, suffix)
    }

    #[test]
    fn edge_id_is_domain_separated() {
        let e: Edge = "(is graphbrain/1 great/1)".parse().unwrap();
        let id = make_edge_id(&e);
        let plain: Hash = blake3::hash(b"(is graphbrain/1 great/1)").into();
        assert_ne!(id.0, plain);
        assert_eq!(id, make_edge_id(&e.to_string().parse::<Edge>().unwrap()));
        assert_eq!(id, e.id());
    }

    #[test]
    fn edges_with_equal_text_keep_distinct_ids() {
        let pairs = [
            (
                edge(vec![sym("a", None), Atom::int(7)]),
                edge(vec![sym("a", None), sym("7", None)]),
            ),
            (
                edge(vec![sym("x/y", Some("1"))]),
                edge(vec![sym("x", Some("y/1"))]),
            ),
            (
                edge(vec![sym("a b", None)]),
                edge(vec![sym("a", None), sym("b", None)]),
            ),
            (
                edge(vec![sym("a", None), Atom::float(7.0)]),
                edge(vec![sym("a", None), sym("7.0", None)]),
            ),
        ];
        for (left, right) in pairs {
            assert_eq!(left.to_string(), right.to_string());
            assert_ne!(left, right);
            assert_ne!(left.id(), right.id(), "{left} collided");
        }
    }

    #[test]
    fn nesting_is_part_of_the_id() {
        let flat: Edge = "(a b c)".parse().unwrap();
        let nested: Edge = "(a (b c))".parse().unwrap();
        let inner: Edge = "((a b) c)".parse().unwrap();
        assert_ne!(flat.id(), nested.id());
        assert_ne!(nested.id(), inner.id());
    }

    #[test]
    fn float_ids_follow_atom_identity() {
        let pos = edge(vec![sym("a", None), Atom::float(0.0)]);
        let neg = edge(vec![sym("a", None), Atom::float(-0.0)]);
        assert_ne!(pos.id(), neg.id());
        let nan = edge(vec![sym("a", None), Atom::float(f64::NAN)]);
        let neg_nan = edge(vec![sym("a", None), Atom::float(-f64::NAN)]);
        assert_eq!(nan, neg_nan);
        assert_eq!(nan.id(), neg_nan.id());
    }

    #[test]
    fn short_form_is_sixteen_hex_chars() {
        let id: EdgeId = "(a b)".parse::<Edge>().unwrap().id();
        assert_eq!(id.short().len(), 16);
        assert!(id.to_string().starts_with(&id.short()));
    }
}
