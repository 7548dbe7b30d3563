// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fault-injecting backend for atomicity and retry tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hgraph_core::{Backend, BackendError, ChangeSet, Edge, MemoryBackend, StoredGraph};

/// [`MemoryBackend`] wrapper that refuses chosen commits.
///
/// Two triggers are available and may be combined:
/// - [`fail_next`](FlakyBackend::fail_next) rejects the next `n` commit
///   attempts, then recovers;
/// - [`poison_edge`](FlakyBackend::poison_edge) rejects every changeset that
///   touches a given edge until cleared.
///
/// Rejected commits leave the wrapped store untouched. Clones share state.
#[derive(Clone, Default)]
pub struct FlakyBackend {
    store: MemoryBackend,
    faults: Arc<Mutex<Faults>>,
}

#[derive(Default)]
struct Faults {
    fail_remaining: u32,
    poisoned: Option<Edge>,
    attempts: usize,
    rejected: usize,
}

impl FlakyBackend {
    /// Healthy backend with an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rejects the next `n` commit attempts.
    pub fn fail_next(&self, n: u32) {
        self.faults().fail_remaining = n;
    }

    /// Rejects every changeset touching `edge`; `None` clears the trigger.
    pub fn poison_edge(&self, edge: Option<Edge>) {
        self.faults().poisoned = edge;
    }

    /// Commit attempts seen, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.faults().attempts
    }

    /// Commit attempts rejected.
    pub fn rejected(&self) -> usize {
        self.faults().rejected
    }

    /// The wrapped store, for inspecting what was durably committed.
    pub fn store(&self) -> &MemoryBackend {
        &self.store
    }
}

impl Backend for FlakyBackend {
    fn ping(&self) -> Result<(), BackendError> {
        self.store.ping()
    }

    fn commit(&self, changes: &ChangeSet) -> Result<(), BackendError> {
        {
            let mut faults = self.faults();
            faults.attempts += 1;
            if faults.fail_remaining > 0 {
                faults.fail_remaining -= 1;
                faults.rejected += 1;
                return Err(BackendError::Unreachable("injected outage".into()));
            }
            if faults
                .poisoned
                .as_ref()
                .is_some_and(|edge| changes.touches_edge(edge))
            {
                faults.rejected += 1;
                return Err(BackendError::CommitRejected("poisoned edge".into()));
            }
        }
        self.store.commit(changes)
    }

    fn load(&self) -> Result<StoredGraph, BackendError> {
        self.store.load()
    }
}
