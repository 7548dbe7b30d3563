// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! hgraph CLI entrypoint.
//!
//! Loads canonical edge text from `--input` files into an in-memory
//! [`Hypergraph`] with one bulk add, then answers a single query.
//!
//! # Usage
//! ```text
//! hgraph [--verbose] [--config-dir DIR] --input FILE <command>
//! ```
//!
//! Exits with code `0` on success and non-zero with the error chain on stderr
//! otherwise.

#![deny(rust_2018_idioms)]
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
    clippy::dbg_macro
)]
// The CLI is expected to print to stdout/stderr.
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, Table};
use hgraph_config_fs::FsConfigStore;
use hgraph_core::config::ConfigService;
use hgraph_core::{Edge, EngineConfig, Hypergraph, Item, Pattern, VertexRecord};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hgraph", author, version, about = "Query a hypergraph built from edge files")]
struct Cli {
    /// Log at debug level (overrides the default `info`; RUST_LOG still wins)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Directory holding engine.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    /// Edge file to load, one edge per line (repeatable)
    #[arg(short, long = "input", global = true)]
    inputs: Vec<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stored edge count and indexed atom count
    Stats,
    /// Edges matching a pattern; `*` is the wildcard
    Query {
        /// Pattern such as `(is * great/1)`
        pattern: String,
    },
    /// Edges holding an item at their top level
    Star {
        /// Atom or edge literal
        item: String,
    },
    /// Number of edges holding an item at their top level
    Degree {
        /// Atom or edge literal
        item: String,
    },
    /// Live symbols sharing a root
    Roots {
        /// Root label, e.g. `graphbrain`
        root: String,
    },
    /// Every vertex with its degree
    Vertices,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))?,
        )
        .init();

    let config = load_config(cli.config_dir.as_deref())?;
    let hg = Hypergraph::with_backend(hgraph_core::MemoryBackend::new(), config);
    let edges = load_edges(&cli.inputs)?;
    let receipt = hg.add(edges).context("loading edges")?;
    info!(
        tx = %receipt.tx,
        added = receipt.added,
        refreshed = receipt.refreshed,
        "edges loaded"
    );

    for line in run(&hg, &cli.command)? {
        println!("{line}");
    }
    Ok(())
}

fn load_config(dir: Option<&Path>) -> Result<EngineConfig> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(dir)
            .with_context(|| format!("opening config dir {}", dir.display()))?,
        None => FsConfigStore::new().context("opening platform config dir")?,
    };
    debug!(dir = %store.base().display(), "reading engine config");
    EngineConfig::load_or_default(&ConfigService::new(store)).context("reading engine config")
}

/// Parses every non-blank, non-comment line of `paths` as an edge.
fn load_edges(paths: &[PathBuf]) -> Result<Vec<Edge>> {
    let mut edges = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let edge: Edge = line
                .parse()
                .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
            edges.push(edge);
        }
        debug!(file = %path.display(), total = edges.len(), "parsed edge file");
    }
    Ok(edges)
}

/// Answers `command` as output lines.
fn run(hg: &Hypergraph, command: &Command) -> Result<Vec<String>> {
    let lines = match command {
        Command::Stats => vec![
            format!("edges: {}", hg.edge_count()),
            format!("atoms: {}", hg.atom_count()),
        ],
        Command::Query { pattern } => {
            let pattern: Pattern = pattern.parse().context("parsing pattern")?;
            to_lines(hg.pattern2edges(&pattern))
        }
        Command::Star { item } => to_lines(hg.star(&parse_item(item)?)),
        Command::Degree { item } => vec![hg.degree(&parse_item(item)?).to_string()],
        Command::Roots { root } => to_lines(hg.symbols_with_root(root)),
        Command::Vertices => {
            let mut records: Vec<VertexRecord> = hg.f_all_vertices(|r| r).collect();
            records.sort();
            vec![vertex_table(&records).to_string()]
        }
    };
    Ok(lines)
}

fn parse_item(text: &str) -> Result<Item> {
    text.parse()
        .with_context(|| format!("parsing item {text:?}"))
}

fn to_lines<T: ToString>(values: impl IntoIterator<Item = T>) -> Vec<String> {
    values.into_iter().map(|v| ToString::to_string(&v)).collect()
}

fn vertex_table(records: &[VertexRecord]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Vertex", "Degree"]);
    for record in records {
        table.add_row(vec![
            Cell::new(&record.vertex),
            Cell::new(record.degree).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}
