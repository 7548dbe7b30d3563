// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for the hypergraph engine.
//!
//! Query operations never fail: "not found" is answered with a neutral value
//! (`0`, an empty set, `-1`). Only malformed input and backend trouble surface
//! as errors, and only [`HgError::BackendUnavailable`] is worth retrying.

use thiserror::Error;

/// Failure reported by a [`Backend`](crate::Backend) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backing store could not be reached.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// The backing store was reached but refused the changeset.
    #[error("commit rejected: {0}")]
    CommitRejected(String),
}

/// Errors surfaced by the engine and the text codec.
#[derive(Debug, Error)]
pub enum HgError {
    /// Structurally invalid edge or pattern (e.g. an empty item sequence).
    #[error("[HG_MALFORMED_EDGE] {reason}")]
    MalformedEdge {
        /// What was wrong with the input.
        reason: String,
    },
    /// Atom whose canonical text would not parse back to itself.
    #[error("[HG_MALFORMED_ATOM] {reason}")]
    MalformedAtom {
        /// What was wrong with the input.
        reason: String,
    },
    /// Canonical text could not be parsed.
    #[error("[HG_PARSE] at byte {offset}: {reason}")]
    Parse {
        /// Byte offset into the input where parsing stopped.
        offset: usize,
        /// What the parser expected.
        reason: String,
    },
    /// The backend could not be reached or committed to. The engine has rolled
    /// back every partial effect; the whole call may be retried.
    #[error("[HG_BACKEND_UNAVAILABLE] after {attempts} attempt(s): {source}")]
    BackendUnavailable {
        /// Number of commit attempts made before giving up.
        attempts: u32,
        /// Last error returned by the backend.
        #[source]
        source: BackendError,
    },
    /// A failed transaction could not be rolled back cleanly. Fatal.
    #[error("[HG_ATOMICITY_VIOLATION] {reason}")]
    AtomicityViolation {
        /// Which invariant was found broken.
        reason: String,
    },
}

impl HgError {
    /// Returns `true` when the failed call can be retried from scratch.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::BackendUnavailable { .. })
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEdge {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed_atom(reason: impl Into<String>) -> Self {
        Self::MalformedAtom {
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(offset: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn atomicity(reason: impl Into<String>) -> Self {
        Self::AtomicityViolation {
            reason: reason.into(),
        }
    }
}
