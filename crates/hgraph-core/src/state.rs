// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Current-graph indices, timestamp history, and the undo log that makes
//! every transaction reversible.
//!
//! Two stores with different lifecycles live side by side:
//! - the *current graph* (`stored`, `stars`, `roots`) is derived from the
//!   edges stored right now and shrinks on removal;
//! - the *history* maps every edge or atom ever added to its last add time.
//!   Removing an edge drops only that edge's own entry.
//!
//! Degree is never stored: it is the size of a star set, so
//! `degree(x) == |star(x)|` holds by construction.
use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::atom::Atom;
use crate::backend::{Change, ChangeSet, StoredGraph};
use crate::edge::{Edge, Item};
use crate::error::HgError;
use crate::pattern::Pattern;

/// Degree of one vertex, as handed to `f_all` callbacks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct VertexRecord {
    /// Atom or edge.
    pub vertex: Item,
    /// Number of stored edges holding `vertex` at their top level.
    pub degree: usize,
}

/// Degree of one atom.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AtomRecord {
    /// The atom.
    pub atom: Atom,
    /// Number of stored edges holding `atom` at their top level.
    pub degree: usize,
}

/// What applying one command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Added,
    Refreshed,
    Removed,
    Absent,
}

/// Inverse of one applied command.
#[derive(Debug)]
pub(crate) enum Undo {
    Inserted {
        edge: Edge,
        prev: Vec<(Item, Option<i64>)>,
    },
    Refreshed {
        prev: Vec<(Item, Option<i64>)>,
    },
    Removed {
        edge: Edge,
        timestamp: Option<i64>,
    },
    Cleared(Box<GraphState>),
}

/// Undo entries in application order.
#[derive(Debug, Default)]
pub(crate) struct UndoLog {
    entries: Vec<Undo>,
}

impl UndoLog {
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct GraphState {
    stored: FxHashSet<Edge>,
    stars: FxHashMap<Item, FxHashSet<Edge>>,
    roots: FxHashMap<String, BTreeSet<Atom>>,
    history: FxHashMap<Item, i64>,
}

fn symbol_root(item: &Item) -> Option<(&str, &Atom)> {
    let atom = item.as_atom()?;
    atom.root().map(|root| (root, atom))
}

impl GraphState {
    /// Rebuilds indices from what a backend holds.
    pub(crate) fn from_stored(graph: StoredGraph) -> Self {
        let mut state = Self::default();
        for (atom, ts) in graph.atoms {
            state.history.insert(Item::Atom(atom), ts);
        }
        for (edge, ts) in graph.edges {
            state.history.insert(Item::Edge(edge.clone()), ts);
            if state.stored.insert(edge.clone()) {
                state.link(&edge);
            }
        }
        state
    }

    // ── mutation ────────────────────────────────────────────────────────

    pub(crate) fn add(
        &mut self,
        edge: &Edge,
        timestamp: i64,
        undo: &mut UndoLog,
        changes: &mut ChangeSet,
    ) -> Outcome {
        let mut prev = Vec::with_capacity(1 + edge.arity());
        let key = Item::Edge(edge.clone());
        prev.push((key.clone(), self.history.insert(key, timestamp)));
        for atom in edge.atoms() {
            let key = Item::Atom(atom.clone());
            prev.push((key.clone(), self.history.insert(key, timestamp)));
            changes.push(Change::TouchAtom {
                atom: atom.clone(),
                timestamp,
            });
        }
        changes.push(Change::PutEdge {
            edge: edge.clone(),
            timestamp,
        });
        if self.stored.insert(edge.clone()) {
            self.link(edge);
            undo.entries.push(Undo::Inserted {
                edge: edge.clone(),
                prev,
            });
            Outcome::Added
        } else {
            undo.entries.push(Undo::Refreshed { prev });
            Outcome::Refreshed
        }
    }

    pub(crate) fn remove(
        &mut self,
        edge: &Edge,
        undo: &mut UndoLog,
        changes: &mut ChangeSet,
    ) -> Result<Outcome, HgError> {
        if !self.stored.remove(edge) {
            return Ok(Outcome::Absent);
        }
        let timestamp = self.history.remove(&Item::Edge(edge.clone()));
        undo.entries.push(Undo::Removed {
            edge: edge.clone(),
            timestamp,
        });
        self.unlink(edge)?;
        changes.push(Change::DeleteEdge { edge: edge.clone() });
        Ok(Outcome::Removed)
    }

    pub(crate) fn clear(&mut self, undo: &mut UndoLog, changes: &mut ChangeSet) {
        let prev = std::mem::take(self);
        undo.entries.push(Undo::Cleared(Box::new(prev)));
        changes.push(Change::Clear);
    }

    /// Reverts every entry of `undo`, newest first.
    ///
    /// Each entry checks that the state still looks the way the forward step
    /// left it; any mismatch is an [`HgError::AtomicityViolation`].
    pub(crate) fn rollback(&mut self, undo: UndoLog) -> Result<(), HgError> {
        for entry in undo.entries.into_iter().rev() {
            match entry {
                Undo::Inserted { edge, prev } => {
                    if !self.stored.remove(&edge) {
                        return Err(HgError::atomicity(format!(
                            "rollback of add {edge}: edge no longer stored"
                        )));
                    }
                    self.unlink(&edge)?;
                    self.restore(prev);
                }
                Undo::Refreshed { prev } => self.restore(prev),
                Undo::Removed { edge, timestamp } => {
                    if !self.stored.insert(edge.clone()) {
                        return Err(HgError::atomicity(format!(
                            "rollback of remove {edge}: edge already stored"
                        )));
                    }
                    self.link(&edge);
                    if let Some(ts) = timestamp {
                        self.history.insert(Item::Edge(edge), ts);
                    }
                }
                Undo::Cleared(prev) => *self = *prev,
            }
        }
        Ok(())
    }

    fn restore(&mut self, prev: Vec<(Item, Option<i64>)>) {
        for (key, ts) in prev.into_iter().rev() {
            match ts {
                Some(ts) => {
                    self.history.insert(key, ts);
                }
                None => {
                    self.history.remove(&key);
                }
            }
        }
    }

    fn link(&mut self, edge: &Edge) {
        for item in edge.items() {
            let star = self.stars.entry(item.clone()).or_default();
            let first = star.is_empty();
            star.insert(edge.clone());
            if first {
                if let Some((root, atom)) = symbol_root(item) {
                    self.roots
                        .entry(root.to_owned())
                        .or_default()
                        .insert(atom.clone());
                }
            }
        }
    }

    fn unlink(&mut self, edge: &Edge) -> Result<(), HgError> {
        let distinct: FxHashSet<&Item> = edge.items().iter().collect();
        for item in distinct {
            let Some(star) = self.stars.get_mut(item) else {
                return Err(HgError::atomicity(format!(
                    "star of {item} missing while unlinking {edge}"
                )));
            };
            if !star.remove(edge) {
                return Err(HgError::atomicity(format!(
                    "star of {item} does not hold {edge}"
                )));
            }
            if star.is_empty() {
                self.stars.remove(item);
                if let Some((root, atom)) = symbol_root(item) {
                    if let Some(atoms) = self.roots.get_mut(root) {
                        atoms.remove(atom);
                        if atoms.is_empty() {
                            self.roots.remove(root);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // ── queries ─────────────────────────────────────────────────────────

    pub(crate) fn exists(&self, item: &Item) -> bool {
        match item {
            Item::Edge(edge) => self.stored.contains(edge),
            Item::Atom(_) => self.stars.contains_key(item),
        }
    }

    pub(crate) fn degree(&self, item: &Item) -> usize {
        self.stars.get(item).map_or(0, FxHashSet::len)
    }

    pub(crate) fn star(&self, item: &Item) -> BTreeSet<Edge> {
        self.stars
            .get(item)
            .map(|star| star.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub(crate) fn symbols_with_root(&self, root: &str) -> BTreeSet<Atom> {
        self.roots.get(root).cloned().unwrap_or_default()
    }

    pub(crate) fn timestamp(&self, item: &Item) -> i64 {
        self.history.get(item).copied().unwrap_or(-1)
    }

    pub(crate) fn pattern2edges(&self, pattern: &Pattern) -> BTreeSet<Edge> {
        // Any literal top-level item must be in the star of every match, so
        // the smallest such star bounds the scan. A literal with no star
        // rules out every stored edge.
        let mut narrowest: Option<&FxHashSet<Edge>> = None;
        for item in pattern.literal_items() {
            match self.stars.get(item) {
                None => return BTreeSet::new(),
                Some(star) if narrowest.is_none_or(|n| star.len() < n.len()) => {
                    narrowest = Some(star);
                }
                Some(_) => {}
            }
        }
        narrowest
            .unwrap_or(&self.stored)
            .iter()
            .filter(|edge| pattern.matches(edge))
            .cloned()
            .collect()
    }

    pub(crate) fn atom_records(&self) -> Vec<AtomRecord> {
        self.stars
            .iter()
            .filter_map(|(item, star)| {
                item.as_atom().map(|atom| AtomRecord {
                    atom: atom.clone(),
                    degree: star.len(),
                })
            })
            .collect()
    }

    pub(crate) fn vertex_records(&self) -> Vec<VertexRecord> {
        let mut records: Vec<VertexRecord> = self
            .stars
            .iter()
            .map(|(item, star)| VertexRecord {
                vertex: item.clone(),
                degree: star.len(),
            })
            .collect();
        records.extend(
            self.stored
                .iter()
                .filter(|edge| !self.stars.contains_key(&Item::Edge((*edge).clone())))
                .map(|edge| VertexRecord {
                    vertex: Item::Edge(edge.clone()),
                    degree: 0,
                }),
        );
        records
    }

    pub(crate) fn edges(&self) -> BTreeSet<Edge> {
        self.stored.iter().cloned().collect()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.stored.len()
    }

    pub(crate) fn atom_count(&self) -> usize {
        self.stars.keys().filter(|item| item.is_atom()).count()
    }

    /// Recomputes every derived index from `stored` and compares.
    pub(crate) fn verify(&self) -> Result<(), HgError> {
        let mut stars: FxHashMap<&Item, FxHashSet<&Edge>> = FxHashMap::default();
        for edge in &self.stored {
            for item in edge.items() {
                stars.entry(item).or_default().insert(edge);
            }
            if !self.history.contains_key(&Item::Edge(edge.clone())) {
                return Err(HgError::atomicity(format!("stored edge {edge} has no timestamp")));
            }
        }
        if stars.len() != self.stars.len() {
            return Err(HgError::atomicity(format!(
                "{} vertices indexed, {} expected",
                self.stars.len(),
                stars.len()
            )));
        }
        for (item, expected) in &stars {
            let actual = self.stars.get(*item).map_or(0, FxHashSet::len);
            if actual != expected.len() {
                return Err(HgError::atomicity(format!(
                    "degree of {item} is {actual}, expected {}",
                    expected.len()
                )));
            }
        }
        let mut roots: FxHashMap<&str, BTreeSet<&Atom>> = FxHashMap::default();
        for item in stars.keys() {
            if let Some((root, atom)) = symbol_root(item) {
                roots.entry(root).or_default().insert(atom);
            }
        }
        let root_index_matches = roots.len() == self.roots.len()
            && roots.iter().all(|(root, atoms)| {
                self.roots
                    .get(*root)
                    .is_some_and(|actual| actual.iter().eq(atoms.iter().copied()))
            });
        if !root_index_matches {
            return Err(HgError::atomicity("root index out of step with stars"));
        }
        Ok(())
    }
}
