// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Leaf values of the hypergraph: symbols and numeric literals.
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::HgError;

/// Float tokens that `f64`'s `Debug` emits for non-finite values.
const NON_FINITE_TOKENS: [&str; 4] = ["inf", "+inf", "-inf", "NaN"];

/// Reads `token` as a number the way the text codec does: `i64` first, then
/// `f64` for tokens that look numeric or name a non-finite value.
pub(crate) fn numeric_atom(token: &str) -> Option<Atom> {
    if let Ok(value) = token.parse::<i64>() {
        return Some(Atom::Int(value));
    }
    if looks_numeric(token) || NON_FINITE_TOKENS.contains(&token) {
        return token.parse::<f64>().ok().map(Atom::Float);
    }
    None
}

fn looks_numeric(token: &str) -> bool {
    let bytes = token.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_digit() => true,
        Some(b'-' | b'+' | b'.') => bytes.get(1).is_some_and(|b| b.is_ascii_digit() || *b == b'.'),
        _ => false,
    }
}

fn is_separator(c: char) -> bool {
    c.is_ascii_whitespace() || c == '(' || c == ')'
}

/// Canonical bits: every NaN collapses to one value.
pub(crate) fn float_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

fn canonical_float(value: f64) -> f64 {
    f64::from_bits(float_bits(value))
}

/// Symbol atom: a root label plus an optional disambiguating suffix.
///
/// `graphbrain/1` has root `graphbrain` and suffix `1`; a bare `is` has no
/// suffix. The split happens at the first `/`, so the suffix itself may
/// contain further slashes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol {
    root: String,
    suffix: Option<String>,
}

impl Symbol {
    /// Root label shared by related symbols.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Disambiguating suffix, if any.
    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}/{suffix}", self.root),
            None => f.write_str(&self.root),
        }
    }
}

/// Leaf value of the hypergraph.
///
/// Atoms are plain values. Equality and hashing are structural and keep the
/// numeric kind apart: `Int(7)` and `Float(7.0)` are different atoms. Floats
/// are identified by their IEEE-754 bit pattern, so `0.0 != -0.0`; all NaNs
/// are one value, as they all render as `NaN`.
#[derive(Clone, Debug)]
pub enum Atom {
    /// Symbolic label (`root` or `root/suffix`).
    Symbol(Symbol),
    /// Signed integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
}

impl Atom {
    /// Builds a symbol atom from a root label and an optional suffix.
    ///
    /// The canonical text of the result must parse back to it, so the root
    /// may not be empty or hold `/`, whitespace or parentheses, and a bare
    /// root may not read as a number or as the wildcard `*`. A suffix must be
    /// non-empty and free of whitespace and parentheses.
    ///
    /// # Errors
    /// Returns [`HgError::MalformedAtom`] when a rule above is broken.
    pub fn symbol(root: impl Into<String>, suffix: Option<&str>) -> Result<Self, HgError> {
        let root = root.into();
        if root.is_empty() {
            return Err(HgError::malformed_atom("symbol root is empty"));
        }
        if root.contains(|c: char| c == '/' || is_separator(c)) {
            return Err(HgError::malformed_atom(format!(
                "symbol root {root:?} holds a separator"
            )));
        }
        match suffix {
            Some("") => return Err(HgError::malformed_atom("symbol suffix is empty")),
            Some(suffix) if suffix.contains(is_separator) => {
                return Err(HgError::malformed_atom(format!(
                    "symbol suffix {suffix:?} holds a separator"
                )));
            }
            Some(_) => {}
            None if root == "*" || numeric_atom(&root).is_some() => {
                return Err(HgError::malformed_atom(format!(
                    "bare symbol {root:?} would read back as a number or wildcard"
                )));
            }
            None => {}
        }
        Ok(Self::Symbol(Symbol {
            root,
            suffix: suffix.map(str::to_owned),
        }))
    }

    /// Symbol built without validation, for exercising identity code paths.
    #[cfg(test)]
    pub(crate) fn symbol_unchecked(root: &str, suffix: Option<&str>) -> Self {
        Self::Symbol(Symbol {
            root: root.to_owned(),
            suffix: suffix.map(str::to_owned),
        })
    }

    /// Builds an integer atom.
    pub fn int(value: i64) -> Self {
        Self::Int(value)
    }

    /// Builds a float atom.
    pub fn float(value: f64) -> Self {
        Self::Float(value)
    }

    /// Root label for symbols; numbers have none.
    pub fn root(&self) -> Option<&str> {
        match self {
            Self::Symbol(sym) => Some(sym.root()),
            Self::Int(_) | Self::Float(_) => None,
        }
    }

    /// Returns the symbol payload when this atom is a symbol.
    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Self::Symbol(sym) => Some(sym),
            Self::Int(_) | Self::Float(_) => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::Symbol(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
        }
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => float_bits(*a) == float_bits(*b),
            _ => false,
        }
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind_rank().hash(state);
        match self {
            Self::Symbol(sym) => sym.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => float_bits(*v).hash(state),
        }
    }
}

impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => canonical_float(*a).total_cmp(&canonical_float(*b)),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(sym) => sym.fmt(f),
            Self::Int(v) => write!(f, "{v}"),
            // `Debug` keeps the shortest round-trip form and always marks the
            // value as a float (`7.0`, `1e100`, `inf`, `NaN`).
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for Atom {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Atom {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}
