// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Storage port for the engine and its in-memory implementation.
//!
//! The engine owns its [`Backend`] handle; there is no process-wide
//! connection. Each transaction pings the backend and submits one
//! [`ChangeSet`]; retries happen at that boundary (see
//! [`RetryPolicy`](crate::RetryPolicy)). A backend must apply a changeset
//! all-or-nothing: on `Err` nothing from it may be visible in a later
//! [`Backend::load`].
//!
//! # Read Path
//!
//! The engine's in-memory indices answer every query; the backend is only
//! written on commit and read on [`Hypergraph::open`](crate::Hypergraph::open).
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::atom::Atom;
use crate::edge::Edge;
use crate::error::BackendError;
use crate::ident::EdgeId;

/// One durable effect of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Store (or refresh) an edge with its timestamp.
    PutEdge {
        /// Edge being stored.
        edge: Edge,
        /// Its most recent add time.
        timestamp: i64,
    },
    /// Forget a stored edge and its timestamp.
    DeleteEdge {
        /// Edge being removed.
        edge: Edge,
    },
    /// Record the most recent add time of an atom.
    TouchAtom {
        /// Atom seen at the top level of an added edge.
        atom: Atom,
        /// Its most recent add time.
        timestamp: i64,
    },
    /// Wipe all edges and all timestamp history.
    Clear,
}

/// Ordered list of changes committed as one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    /// Creates an empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a change.
    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    /// Changes in commit order.
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Returns `true` when there is nothing to commit.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns `true` if any change touches `edge`.
    pub fn touches_edge(&self, edge: &Edge) -> bool {
        self.changes.iter().any(|change| match change {
            Change::PutEdge { edge: e, .. } | Change::DeleteEdge { edge: e } => e == edge,
            Change::TouchAtom { .. } | Change::Clear => false,
        })
    }
}

/// Everything a backend holds, as read back by [`Backend::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredGraph {
    /// Stored edges with their timestamps.
    pub edges: Vec<(Edge, i64)>,
    /// Timestamp history of atoms.
    pub atoms: Vec<(Atom, i64)>,
}

/// Durable storage behind a [`Hypergraph`](crate::Hypergraph).
pub trait Backend: Send + Sync {
    /// Health check performed before every commit attempt.
    fn ping(&self) -> Result<(), BackendError>;

    /// Applies `changes` atomically.
    fn commit(&self, changes: &ChangeSet) -> Result<(), BackendError>;

    /// Reads back every stored edge and atom timestamp.
    fn load(&self) -> Result<StoredGraph, BackendError>;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn ping(&self) -> Result<(), BackendError> {
        (**self).ping()
    }

    fn commit(&self, changes: &ChangeSet) -> Result<(), BackendError> {
        (**self).commit(changes)
    }

    fn load(&self) -> Result<StoredGraph, BackendError> {
        (**self).load()
    }
}

/// Thread-safe in-memory backend.
///
/// Clones share the same tables, so a test can keep a handle while the engine
/// owns another. [`set_available`](MemoryBackend::set_available) simulates an
/// outage: while unavailable, `ping`, `commit` and `load` fail with
/// [`BackendError::Unreachable`] and the tables stay untouched.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    edges: BTreeMap<EdgeId, (Edge, i64)>,
    atoms: FxHashMap<Atom, i64>,
    offline: bool,
    commit_count: usize,
}

impl MemoryBackend {
    /// Creates an empty, available backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Marks the backend reachable or unreachable.
    pub fn set_available(&self, available: bool) {
        self.lock().offline = !available;
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> usize {
        self.lock().commit_count
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Stored timestamp of `edge`, if it is stored.
    pub fn edge_timestamp(&self, edge: &Edge) -> Option<i64> {
        self.lock().edges.get(&edge.id()).map(|(_, ts)| *ts)
    }

    /// Recorded timestamp of `atom`, if any.
    pub fn atom_timestamp(&self, atom: &Atom) -> Option<i64> {
        self.lock().atoms.get(atom).copied()
    }
}

impl Backend for MemoryBackend {
    fn ping(&self) -> Result<(), BackendError> {
        if self.lock().offline {
            return Err(BackendError::Unreachable("memory backend offline".into()));
        }
        Ok(())
    }

    fn commit(&self, changes: &ChangeSet) -> Result<(), BackendError> {
        let mut inner = self.lock();
        if inner.offline {
            return Err(BackendError::Unreachable("memory backend offline".into()));
        }
        for change in changes.changes() {
            match change {
                Change::PutEdge { edge, timestamp } => {
                    let id = edge.id();
                    trace!(edge = %id.short(), timestamp, "put edge");
                    inner.edges.insert(id, (edge.clone(), *timestamp));
                }
                Change::DeleteEdge { edge } => {
                    let id = edge.id();
                    trace!(edge = %id.short(), "delete edge");
                    inner.edges.remove(&id);
                }
                Change::TouchAtom { atom, timestamp } => {
                    inner.atoms.insert(atom.clone(), *timestamp);
                }
                Change::Clear => {
                    inner.edges.clear();
                    inner.atoms.clear();
                }
            }
        }
        inner.commit_count += 1;
        Ok(())
    }

    fn load(&self) -> Result<StoredGraph, BackendError> {
        let inner = self.lock();
        if inner.offline {
            return Err(BackendError::Unreachable("memory backend offline".into()));
        }
        let mut atoms: Vec<(Atom, i64)> = inner
            .atoms
            .iter()
            .map(|(atom, ts)| (atom.clone(), *ts))
            .collect();
        atoms.sort();
        Ok(StoredGraph {
            edges: inner.edges.values().cloned().collect(),
            atoms,
        })
    }
}
