// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canonical text codec: parenthesized prefix notation.
//!
//! ```text
//! edge  := "(" item (ws item)* ")"
//! item  := edge | token
//! token := any run of bytes other than whitespace, "(" and ")"
//! ```
//!
//! A token is an integer when it parses as `i64`, a float when it looks
//! numeric (leading digit, or sign/dot followed by a digit) or is one of
//! `inf`, `+inf`, `-inf`, `NaN` and parses as `f64`, and a symbol otherwise.
//! Symbols split into root and suffix at the first `/`; tokens that make no
//! valid symbol (`x/`, `/x`, a bare `*`) are rejected. Rendering is the
//! `Display` impl of each type and `parse(render(x)) == x` for every value.
use std::str::FromStr;

use crate::atom::{numeric_atom, Atom};
use crate::edge::{Edge, Item};
use crate::error::HgError;

/// Nesting limit; deeper input is rejected instead of exhausting the stack.
pub const MAX_DEPTH: usize = 512;

/// Untyped syntax tree shared by the edge and pattern parsers.
#[derive(Debug)]
pub(crate) enum Node<'a> {
    Token { text: &'a str, offset: usize },
    List { children: Vec<Node<'a>>, offset: usize },
}

impl Node<'_> {
    pub(crate) fn offset(&self) -> usize {
        match self {
            Self::Token { offset, .. } | Self::List { offset, .. } => *offset,
        }
    }
}

/// Parses exactly one item (token or list) spanning all of `input`.
pub(crate) fn parse_tree(input: &str) -> Result<Node<'_>, HgError> {
    let mut cursor = Cursor { input, pos: 0 };
    cursor.skip_ws();
    let node = cursor.item(0)?;
    cursor.skip_ws();
    if cursor.pos != input.len() {
        return Err(HgError::parse(cursor.pos, "trailing input after item"));
    }
    Ok(node)
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn item(&mut self, depth: usize) -> Result<Node<'a>, HgError> {
        match self.peek() {
            None => Err(HgError::parse(self.pos, "unexpected end of input")),
            Some(b')') => Err(HgError::parse(self.pos, "unbalanced ')'")),
            Some(b'(') => self.list(depth + 1),
            Some(_) => Ok(self.token()),
        }
    }

    fn list(&mut self, depth: usize) -> Result<Node<'a>, HgError> {
        if depth > MAX_DEPTH {
            return Err(HgError::parse(self.pos, "nesting too deep"));
        }
        let offset = self.pos;
        self.pos += 1;
        let mut children = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(HgError::parse(self.pos, "missing ')'")),
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Node::List { children, offset });
                }
                Some(_) => children.push(self.item(depth)?),
            }
        }
    }

    fn token(&mut self) -> Node<'a> {
        let offset = self.pos;
        while self
            .peek()
            .is_some_and(|b| !b.is_ascii_whitespace() && b != b'(' && b != b')')
        {
            self.pos += 1;
        }
        Node::Token {
            text: &self.input[offset..self.pos],
            offset,
        }
    }
}

/// Interprets the token at `offset` as an atom.
pub(crate) fn atom_from_token(token: &str, offset: usize) -> Result<Atom, HgError> {
    if let Some(atom) = numeric_atom(token) {
        return Ok(atom);
    }
    let atom = match token.split_once('/') {
        Some((root, suffix)) => Atom::symbol(root, Some(suffix)),
        None => Atom::symbol(token, None),
    };
    atom.map_err(|err| HgError::parse(offset, err.to_string()))
}

pub(crate) fn item_from_node(node: &Node<'_>) -> Result<Item, HgError> {
    match node {
        Node::Token { text, offset } => atom_from_token(text, *offset).map(Item::Atom),
        Node::List { .. } => edge_from_node(node).map(Item::Edge),
    }
}

pub(crate) fn edge_from_node(node: &Node<'_>) -> Result<Edge, HgError> {
    match node {
        Node::List { children, .. } => {
            let items = children
                .iter()
                .map(item_from_node)
                .collect::<Result<Vec<_>, _>>()?;
            Edge::new(items)
        }
        Node::Token { offset, .. } => Err(HgError::parse(*offset, "expected '('")),
    }
}

impl FromStr for Edge {
    type Err = HgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        edge_from_node(&parse_tree(s)?)
    }
}

impl FromStr for Item {
    type Err = HgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        item_from_node(&parse_tree(s)?)
    }
}

impl FromStr for Atom {
    type Err = HgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_tree(s)? {
            Node::Token { text, offset } => atom_from_token(text, offset),
            Node::List { offset, .. } => Err(HgError::parse(offset, "expected an atom")),
        }
    }
}
