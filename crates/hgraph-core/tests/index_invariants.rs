// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
//! Randomised mutation sequences against the index laws.

use std::collections::BTreeSet;

use proptest::prelude::*;

use hgraph_core::{Atom, Edge, Hypergraph, Item, Pattern};

/// Root and suffix alphabet that includes separators, digits and signs.
const TEXTY: &str = "[a-z0-9/()* .+-]{0,6}";

fn atom_strategy() -> impl Strategy<Value = Atom> {
    prop_oneof![
        (prop::sample::select(vec!["gb", "mary", "is", "size"]), 0u8..3).prop_filter_map(
            "valid symbol",
            |(root, n)| Atom::symbol(root, (n > 0).then(|| n.to_string()).as_deref()).ok()
        ),
        (-3i64..3).prop_map(Atom::int),
        (-3i32..3).prop_map(|v| Atom::float(f64::from(v))),
    ]
}

/// Atoms drawn from the whole value space, including text that only just
/// avoids reading as a number and the non-finite floats.
fn wild_atom_strategy() -> impl Strategy<Value = Atom> {
    prop_oneof![
        (TEXTY, prop::option::of(TEXTY)).prop_filter_map("valid symbol", |(root, suffix)| {
            Atom::symbol(root, suffix.as_deref()).ok()
        }),
        any::<i64>().prop_map(Atom::int),
        any::<f64>().prop_map(Atom::float),
        prop::sample::select(vec![f64::INFINITY, f64::NEG_INFINITY, f64::NAN, -0.0])
            .prop_map(Atom::float),
    ]
}

fn edge_strategy() -> impl Strategy<Value = Edge> {
    edges_of(atom_strategy())
}

fn edges_of(atoms: impl Strategy<Value = Atom> + 'static) -> impl Strategy<Value = Edge> {
    let leaf = atoms.prop_map(Item::Atom);
    let item = leaf.prop_recursive(2, 12, 3, |inner| {
        prop::collection::vec(inner, 1..4).prop_filter_map("non-empty", |items| {
            Edge::new(items).ok().map(Item::Edge)
        })
    });
    prop::collection::vec(item, 1..4)
        .prop_filter_map("non-empty", |items| Edge::new(items).ok())
}

#[derive(Debug, Clone)]
enum Step {
    Add(Edge, i64),
    Remove(usize),
}

fn steps() -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(
        prop_oneof![
            (edge_strategy(), 0i64..100).prop_map(|(e, ts)| Step::Add(e, ts)),
            any::<usize>().prop_map(Step::Remove),
        ],
        1..40,
    )
}

fn apply(hg: &Hypergraph, steps: &[Step]) -> Vec<Edge> {
    let mut seen = Vec::new();
    for step in steps {
        match step {
            Step::Add(e, ts) => {
                hg.add_at(e, *ts).expect("add");
                seen.push(e.clone());
            }
            Step::Remove(i) if !seen.is_empty() => {
                hg.remove(&seen[i % seen.len()]).expect("remove");
            }
            Step::Remove(_) => {}
        }
    }
    seen
}

proptest! {
    #[test]
    fn degree_equals_star_size(steps in steps()) {
        let hg = Hypergraph::new();
        let seen = apply(&hg, &steps);
        hg.verify_indices().expect("indices consistent");
        for e in &seen {
            for it in e.items() {
                prop_assert_eq!(hg.degree(it), hg.star(it).len());
                for holder in hg.star(it) {
                    prop_assert!(holder.items().contains(it));
                    prop_assert!(hg.exists(&holder.into()));
                }
            }
        }
    }

    #[test]
    fn root_index_matches_live_symbols(steps in steps()) {
        let hg = Hypergraph::new();
        apply(&hg, &steps);
        let live: Vec<Atom> = hg.f_all(|r| r.atom).collect();
        for root in ["gb", "mary", "is", "size"] {
            let expected: BTreeSet<Atom> = live
                .iter()
                .filter(|a| a.root() == Some(root))
                .cloned()
                .collect();
            prop_assert_eq!(hg.symbols_with_root(root), expected);
        }
    }

    #[test]
    fn removed_edges_lose_timestamp_but_atoms_keep_theirs(e in edge_strategy(), ts in 0i64..1_000) {
        let hg = Hypergraph::new();
        hg.add_at(&e, ts).expect("add");
        prop_assert!(hg.exists(&e.clone().into()));
        prop_assert_eq!(hg.timestamp(&e.clone().into()), ts);
        hg.remove(&e).expect("remove");
        prop_assert!(!hg.exists(&e.clone().into()));
        prop_assert_eq!(hg.timestamp(&e.clone().into()), -1);
        for a in e.atoms() {
            prop_assert_eq!(hg.timestamp(&a.clone().into()), ts);
        }
    }

    #[test]
    fn full_wildcard_selects_by_arity(steps in steps(), arity in 1usize..4) {
        let hg = Hypergraph::new();
        apply(&hg, &steps);
        let expected: BTreeSet<Edge> =
            hg.edges().into_iter().filter(|e| e.arity() == arity).collect();
        let pattern = Pattern::wildcards(arity).expect("arity > 0");
        prop_assert_eq!(hg.pattern2edges(&pattern), expected);
    }

    #[test]
    fn literal_pattern_finds_only_itself(steps in steps()) {
        let hg = Hypergraph::new();
        apply(&hg, &steps);
        for e in hg.edges() {
            prop_assert_eq!(hg.pattern2edges(&Pattern::from(&e)), BTreeSet::from([e]));
        }
    }

    #[test]
    fn canonical_text_round_trips(e in edges_of(wild_atom_strategy())) {
        let text = e.to_string();
        let parsed: Edge = text.parse().expect("canonical text parses");
        prop_assert_eq!(parsed.id(), e.id());
        prop_assert_eq!(parsed, e);
    }

    #[test]
    fn symbol_constructor_agrees_with_the_text_codec(
        root in TEXTY,
        suffix in prop::option::of(TEXTY),
    ) {
        let text = match &suffix {
            Some(suffix) => format!("{root}/{suffix}"),
            None => root.clone(),
        };
        match Atom::symbol(root.as_str(), suffix.as_deref()) {
            Ok(atom) => {
                prop_assert_eq!(atom.to_string(), text.clone());
                prop_assert_eq!(text.parse::<Atom>().ok(), Some(atom));
            }
            Err(_) => {
                let same = text.parse::<Atom>().ok().is_some_and(|atom| {
                    atom.as_symbol().is_some_and(|s| {
                        s.root() == root && s.suffix() == suffix.as_deref()
                    })
                });
                prop_assert!(!same, "rejected {:?} that reads back as itself", text);
            }
        }
    }
}
