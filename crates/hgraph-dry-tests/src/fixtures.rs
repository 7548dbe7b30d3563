// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Text constructors for test values.
//!
//! These panic on malformed input; they are for literals in tests only.
#![allow(clippy::panic)]

use hgraph_core::{Atom, Edge, Item, Pattern};

/// Parses an edge literal such as `"(is graphbrain/1 great/1)"`.
pub fn edge(text: &str) -> Edge {
    text.parse()
        .unwrap_or_else(|err| panic!("bad edge literal {text:?}: {err}"))
}

/// Parses an atom or edge literal.
pub fn item(text: &str) -> Item {
    text.parse()
        .unwrap_or_else(|err| panic!("bad item literal {text:?}: {err}"))
}

/// Parses an atom literal such as `"graphbrain/1"` or `"-7.0"`.
pub fn atom(text: &str) -> Atom {
    text.parse()
        .unwrap_or_else(|err| panic!("bad atom literal {text:?}: {err}"))
}

/// Parses a pattern literal; `*` is the wildcard.
pub fn pattern(text: &str) -> Pattern {
    text.parse()
        .unwrap_or_else(|err| panic!("bad pattern literal {text:?}: {err}"))
}
