// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for hgraph crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`backend`] - Fault-injecting backend wrapper
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`fixtures`] - Text constructors for atoms, items, edges and patterns

pub mod backend;
pub mod config;
pub mod fixtures;

// Re-export commonly used items at crate root for convenience
pub use backend::FlakyBackend;
pub use config::InMemoryConfigStore;
pub use fixtures::{atom, edge, item, pattern};
