// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! hgraph-core: hypergraph storage and query engine.
//!
//! Atoms (symbols and numbers) and recursively nested edges are plain values
//! with structural equality. A [`Hypergraph`] stores edges, keeps the
//! degree/star/root indices consistent with every mutation, records a
//! timestamp history that outlives edge removal, and answers wildcard
//! [`Pattern`] queries. Mutations, bulk calls and [`Batch`]es are atomic
//! against a pluggable [`Backend`].
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod atom;
mod backend;
mod batch;
/// Engine configuration and the config storage port.
pub mod config;
mod edge;
mod engine;
mod error;
mod ident;
mod parse;
mod pattern;
mod state;

/// Leaf values.
pub use atom::{Atom, Symbol};
/// Storage port and in-memory backend.
pub use backend::{Backend, Change, ChangeSet, MemoryBackend, StoredGraph};
/// Mutation commands.
pub use batch::{Batch, IntoEdges, Op};
pub use config::{ClockConfig, EngineConfig, RetryPolicy};
/// Hyperedges and their items.
pub use edge::{Edge, Item};
/// The engine.
pub use engine::{Hypergraph, TxReceipt};
pub use error::{BackendError, HgError};
/// Content-derived identifiers.
pub use ident::{make_edge_id, EdgeId, Hash, TxId};
pub use parse::MAX_DEPTH;
/// Query templates.
pub use pattern::{matches, Pattern, PatternItem, WILDCARD_TOKEN};
/// Per-vertex records handed to `f_all` callbacks.
pub use state::{AtomRecord, VertexRecord};
