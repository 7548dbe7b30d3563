// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The hypergraph engine: transactional mutations over shared indices.
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::atom::Atom;
use crate::backend::{Backend, ChangeSet, MemoryBackend};
use crate::batch::{Batch, IntoEdges, Op};
use crate::config::EngineConfig;
use crate::edge::{Edge, Item};
use crate::error::{BackendError, HgError};
use crate::ident::TxId;
use crate::pattern::Pattern;
use crate::state::{AtomRecord, GraphState, Outcome, UndoLog, VertexRecord};

/// Summary of a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    /// Transaction identifier.
    pub tx: TxId,
    /// Edges that became stored.
    pub added: usize,
    /// Already-stored edges whose timestamps were refreshed.
    pub refreshed: usize,
    /// Edges that stopped being stored.
    pub removed: usize,
}

/// Hypergraph store.
///
/// All state sits behind one `RwLock`. A mutation holds the write guard from
/// its first index change until the backend has accepted the changeset (or
/// until the rollback has finished), so readers only ever see whole
/// transactions. Queries share the read guard and never fail.
///
/// ```
/// use hgraph_core::{Edge, Hypergraph, Item};
///
/// let hg = Hypergraph::new();
/// let edge: Edge = "(is graphbrain/1 great/1)".parse()?;
/// hg.add_at(&edge, 123456789)?;
/// let atom: Item = "graphbrain/1".parse()?;
/// assert_eq!(hg.degree(&atom), 1);
/// hg.remove(&edge)?;
/// assert_eq!(hg.degree(&atom), 0);
/// assert_eq!(hg.timestamp(&atom), 123456789);
/// # Ok::<(), hgraph_core::HgError>(())
/// ```
pub struct Hypergraph<B: Backend = MemoryBackend> {
    backend: B,
    config: EngineConfig,
    state: RwLock<GraphState>,
    tx_counter: AtomicU64,
}

impl Hypergraph<MemoryBackend> {
    /// Empty engine over a fresh [`MemoryBackend`] with default config.
    pub fn new() -> Self {
        Self::with_backend(MemoryBackend::new(), EngineConfig::default())
    }
}

impl Default for Hypergraph<MemoryBackend> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Backend> Hypergraph<B> {
    /// Empty engine over `backend`. Whatever the backend already holds is
    /// ignored; use [`open`](Self::open) to resume from it.
    pub fn with_backend(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            config,
            state: RwLock::new(GraphState::default()),
            tx_counter: AtomicU64::new(0),
        }
    }

    /// Engine whose indices are rebuilt from what `backend` holds.
    ///
    /// # Errors
    /// Returns [`HgError::BackendUnavailable`] if the backend cannot be read.
    #[instrument(skip(backend, config))]
    pub fn open(backend: B, config: EngineConfig) -> Result<Self, HgError> {
        let stored = backend
            .load()
            .map_err(|source| HgError::BackendUnavailable {
                attempts: 1,
                source,
            })?;
        info!(
            edges = stored.edges.len(),
            atoms = stored.atoms.len(),
            "rebuilding indices from backend"
        );
        let engine = Self::with_backend(backend, config);
        *engine.write_state()? = GraphState::from_stored(stored);
        Ok(engine)
    }

    /// Backend handle owned by this engine.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ── mutations ───────────────────────────────────────────────────────

    /// Stores one or more edges stamped with the engine clock.
    ///
    /// Re-adding a stored edge leaves the indices untouched and refreshes the
    /// timestamps of the edge and of its top-level atoms.
    pub fn add(&self, edges: impl IntoEdges) -> Result<TxReceipt, HgError> {
        let timestamp = self.config.clock.now();
        self.add_at(edges, timestamp)
    }

    /// Stores one or more edges with an explicit timestamp.
    pub fn add_at(&self, edges: impl IntoEdges, timestamp: i64) -> Result<TxReceipt, HgError> {
        self.transact(
            edges
                .into_edges()
                .into_iter()
                .map(|edge| Op::Add {
                    edge,
                    timestamp: Some(timestamp),
                })
                .collect(),
        )
    }

    /// Removes one or more edges. Edges that are not stored are skipped.
    pub fn remove(&self, edges: impl IntoEdges) -> Result<TxReceipt, HgError> {
        self.transact(
            edges
                .into_edges()
                .into_iter()
                .map(|edge| Op::Remove { edge })
                .collect(),
        )
    }

    /// Applies every command of `batch` as one atomic transaction.
    ///
    /// Either all commands take effect or, if the backend refuses the
    /// changeset, none do and [`HgError::BackendUnavailable`] is returned.
    pub fn batch_exec(&self, batch: impl Into<Batch>) -> Result<TxReceipt, HgError> {
        self.transact(batch.into().into_iter().collect())
    }

    /// Clears the current graph and the whole timestamp history.
    #[instrument(skip(self))]
    pub fn destroy(&self) -> Result<TxReceipt, HgError> {
        let mut state = self.write_state()?;
        let tx = self.next_tx();
        let removed = state.edge_count();
        let mut undo = UndoLog::default();
        let mut changes = ChangeSet::new();
        state.clear(&mut undo, &mut changes);
        self.finish(&mut state, tx, undo, &changes)?;
        info!(%tx, removed, "store destroyed");
        Ok(TxReceipt {
            tx,
            added: 0,
            refreshed: 0,
            removed,
        })
    }

    #[instrument(skip(self, ops), fields(ops = ops.len()))]
    fn transact(&self, ops: Vec<Op>) -> Result<TxReceipt, HgError> {
        let mut state = self.write_state()?;
        let tx = self.next_tx();
        let mut receipt = TxReceipt {
            tx,
            added: 0,
            refreshed: 0,
            removed: 0,
        };
        let mut undo = UndoLog::default();
        let mut changes = ChangeSet::new();
        for op in &ops {
            let outcome = match op {
                Op::Add { edge, timestamp } => {
                    let ts = timestamp.unwrap_or_else(|| self.config.clock.now());
                    Ok(state.add(edge, ts, &mut undo, &mut changes))
                }
                Op::Remove { edge } => state.remove(edge, &mut undo, &mut changes),
            };
            match outcome {
                Ok(Outcome::Added) => receipt.added += 1,
                Ok(Outcome::Refreshed) => receipt.refreshed += 1,
                Ok(Outcome::Removed) => receipt.removed += 1,
                Ok(Outcome::Absent) => {}
                Err(err) => {
                    error!(%tx, %err, "index drift while applying transaction");
                    Self::roll_back(&mut state, tx, undo)?;
                    return Err(err);
                }
            }
        }
        if changes.is_empty() {
            debug!(%tx, "nothing to commit");
            return Ok(receipt);
        }
        self.finish(&mut state, tx, undo, &changes)?;
        debug!(
            %tx,
            added = receipt.added,
            refreshed = receipt.refreshed,
            removed = receipt.removed,
            "transaction committed"
        );
        Ok(receipt)
    }

    /// Commits `changes` or, failing that, rolls `state` back.
    fn finish(
        &self,
        state: &mut GraphState,
        tx: TxId,
        undo: UndoLog,
        changes: &ChangeSet,
    ) -> Result<(), HgError> {
        match self.commit_with_retry(tx, changes) {
            Ok(()) => Ok(()),
            Err((attempts, source)) => {
                Self::roll_back(state, tx, undo)?;
                Err(HgError::BackendUnavailable { attempts, source })
            }
        }
    }

    fn roll_back(state: &mut GraphState, tx: TxId, undo: UndoLog) -> Result<(), HgError> {
        warn!(%tx, entries = undo.len(), "rolling back transaction");
        state.rollback(undo).map_err(|err| {
            error!(%tx, %err, "rollback failed");
            err
        })
    }

    fn commit_with_retry(&self, tx: TxId, changes: &ChangeSet) -> Result<(), (u32, BackendError)> {
        let max = self.config.retry.attempts();
        let mut attempt = 1;
        loop {
            match self
                .backend
                .ping()
                .and_then(|()| self.backend.commit(changes))
            {
                Ok(()) => return Ok(()),
                Err(err) if attempt < max => {
                    warn!(%tx, attempt, max, %err, "backend commit failed; retrying");
                    if self.config.retry.backoff_ms > 0 {
                        std::thread::sleep(Duration::from_millis(self.config.retry.backoff_ms));
                    }
                    attempt += 1;
                }
                Err(err) => {
                    warn!(%tx, attempt, %err, "backend commit failed; giving up");
                    return Err((attempt, err));
                }
            }
        }
    }

    fn next_tx(&self) -> TxId {
        TxId::from_raw(self.tx_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, GraphState>, HgError> {
        self.state.write().map_err(|_| {
            HgError::atomicity("state lock poisoned by a panic inside a transaction")
        })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    // ── queries ─────────────────────────────────────────────────────────

    /// `true` iff `item` is a stored edge, or an atom at the top level of
    /// some stored edge.
    pub fn exists(&self, item: &Item) -> bool {
        self.read_state().exists(item)
    }

    /// Number of stored edges holding `item` at their top level.
    pub fn degree(&self, item: &Item) -> usize {
        self.read_state().degree(item)
    }

    /// Stored edges holding `item` at their top level.
    pub fn star(&self, item: &Item) -> BTreeSet<Edge> {
        self.read_state().star(item)
    }

    /// Symbol atoms with root `root` and degree > 0.
    pub fn symbols_with_root(&self, root: &str) -> BTreeSet<Atom> {
        self.read_state().symbols_with_root(root)
    }

    /// Last add time of `item`, or `-1`.
    ///
    /// Edges answer `-1` once removed; atoms keep their last value until
    /// [`destroy`](Self::destroy).
    pub fn timestamp(&self, item: &Item) -> i64 {
        self.read_state().timestamp(item)
    }

    /// Every stored edge matching `pattern`.
    pub fn pattern2edges(&self, pattern: &Pattern) -> BTreeSet<Edge> {
        self.read_state().pattern2edges(pattern)
    }

    /// Applies `f` to an [`AtomRecord`] for every atom with degree > 0.
    ///
    /// Records are captured when this is called; the returned iterator is
    /// lazy in `f`, finite, unordered, and consumed once.
    pub fn f_all<R, F>(&self, f: F) -> impl Iterator<Item = R>
    where
        F: FnMut(AtomRecord) -> R,
    {
        let records = self.read_state().atom_records();
        records.into_iter().map(f)
    }

    /// Like [`f_all`](Self::f_all) over every vertex: atoms with degree > 0,
    /// every stored edge (degree may be 0), and sub-edges with degree > 0.
    pub fn f_all_vertices<R, F>(&self, f: F) -> impl Iterator<Item = R>
    where
        F: FnMut(VertexRecord) -> R,
    {
        let records = self.read_state().vertex_records();
        records.into_iter().map(f)
    }

    /// Snapshot of every stored edge.
    pub fn edges(&self) -> BTreeSet<Edge> {
        self.read_state().edges()
    }

    /// Number of stored edges.
    pub fn edge_count(&self) -> usize {
        self.read_state().edge_count()
    }

    /// Number of atoms with degree > 0.
    pub fn atom_count(&self) -> usize {
        self.read_state().atom_count()
    }

    /// Recomputes the derived indices and reports the first inconsistency.
    pub fn verify_indices(&self) -> Result<(), HgError> {
        self.read_state().verify()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::{ClockConfig, RetryPolicy};

    fn edge(s: &str) -> Edge {
        s.parse().unwrap()
    }

    #[test]
    fn tx_ids_start_at_one_and_increase() {
        let hg = Hypergraph::new();
        let a = hg.add(edge("(a b)")).unwrap();
        let b = hg.remove(edge("(a b)")).unwrap();
        assert_eq!(a.tx.value(), 1);
        assert_eq!(b.tx.value(), 2);
    }

    #[test]
    fn fixed_clock_stamps_adds() {
        let config = EngineConfig {
            clock: ClockConfig::Fixed(77),
            ..EngineConfig::default()
        };
        let hg = Hypergraph::with_backend(MemoryBackend::new(), config);
        let e = edge("(is a b)");
        hg.add(&e).unwrap();
        assert_eq!(hg.timestamp(&Item::Edge(e)), 77);
    }

    #[test]
    fn open_keeps_edges_that_render_alike() {
        let head = Item::Atom(Atom::symbol("a", None).unwrap());
        let int = Edge::new([head.clone(), Item::Atom(Atom::int(7))]).unwrap();
        let text = Edge::new([head, Item::Atom(Atom::symbol_unchecked("7", None))]).unwrap();
        let backend = MemoryBackend::new();
        let hg = Hypergraph::with_backend(backend.clone(), EngineConfig::default());
        hg.add(vec![int.clone(), text.clone()]).unwrap();
        assert_eq!(backend.edge_count(), 2);
        hg.remove(&int).unwrap();

        let reopened = Hypergraph::open(backend, EngineConfig::default()).unwrap();
        assert!(reopened.exists(&Item::Edge(text)));
        assert!(!reopened.exists(&Item::Edge(int)));
        assert_eq!(reopened.edge_count(), 1);
    }

    #[test]
    fn noop_remove_skips_backend() {
        let backend = MemoryBackend::new();
        let hg = Hypergraph::with_backend(backend.clone(), EngineConfig::default());
        let receipt = hg.remove(edge("(never stored)")).unwrap();
        assert_eq!(receipt.removed, 0);
        assert_eq!(backend.commit_count(), 0);
    }

    #[test]
    fn retries_stop_at_policy_limit() {
        let backend = MemoryBackend::new();
        backend.set_available(false);
        let config = EngineConfig {
            retry: RetryPolicy {
                max_attempts: 4,
                backoff_ms: 0,
            },
            ..EngineConfig::default()
        };
        let hg = Hypergraph::with_backend(backend, config);
        match hg.add(edge("(a b)")).unwrap_err() {
            HgError::BackendUnavailable { attempts, .. } => assert_eq!(attempts, 4),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hg.edge_count(), 0);
    }
}
