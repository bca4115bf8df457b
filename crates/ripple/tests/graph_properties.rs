//! Property-based tests for graph construction and propagation order.

use proptest::prelude::*;
use ripple::config::PropagationOrder;
use ripple::domain::{Declarations, PropertyDecl, PropertyName};
use ripple::error::Error;
use ripple::graph::DependencyGraph;
use std::collections::{HashMap, HashSet};

/// Parent lists for `n` properties named `P0..Pn`. Indices `n` and `n + 1`
/// name properties that are never declared.
fn parent_lists() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..8).prop_flat_map(|n| {
        prop::collection::vec(prop::collection::vec(0..n + 2, 0..4), n)
    })
}

fn declarations(parents: &[Vec<usize>]) -> Declarations {
    parents
        .iter()
        .enumerate()
        .map(|(i, list)| PropertyDecl::derived(format!("P{i}"), list.iter().map(|p| format!("P{p}"))))
        .collect()
}

fn without_self_loops(parents: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
    parents
        .into_iter()
        .enumerate()
        .map(|(i, list)| list.into_iter().filter(|&p| p != i).collect())
        .collect()
}

fn reachable(graph: &DependencyGraph, start: &str) -> HashSet<PropertyName> {
    let mut adjacency: HashMap<PropertyName, Vec<PropertyName>> = HashMap::new();
    for (from, to) in graph.edges() {
        adjacency.entry(from).or_default().push(to);
    }

    let mut seen = HashSet::new();
    let mut stack = vec![PropertyName::from(start)];
    while let Some(node) = stack.pop() {
        for next in adjacency.get(&node).into_iter().flatten() {
            if seen.insert(next.clone()) {
                stack.push(next.clone());
            }
        }
    }
    seen.remove(start);
    seen
}

proptest! {
    #[test]
    fn build_fails_exactly_when_a_property_lists_itself(parents in parent_lists()) {
        let has_self_loop = parents.iter().enumerate().any(|(i, list)| list.contains(&i));
        let result = DependencyGraph::build(&declarations(&parents));

        if has_self_loop {
            prop_assert!(
                matches!(result, Err(Error::SelfDependency { .. })),
                "expected SelfDependency, got {:?}",
                result
            );
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn every_reachable_property_fires_exactly_once(parents in parent_lists()) {
        let decls = declarations(&without_self_loops(parents));
        let graph = DependencyGraph::build(&decls).unwrap();

        for node in graph.nodes() {
            let start = node.name().as_str();
            let expected = reachable(&graph, start);

            for order in [PropagationOrder::BreadthFirst, PropagationOrder::Topological] {
                let fired = graph.propagation_order(start, order);
                let unique: HashSet<PropertyName> = fired.iter().cloned().collect();

                prop_assert_eq!(unique.len(), fired.len(), "duplicate notification under {}", order);
                prop_assert!(!unique.contains(start), "trigger re-notified under {}", order);
                prop_assert_eq!(&unique, &expected, "wrong dependents under {}", order);
            }
        }
    }

    #[test]
    fn topological_order_respects_edges_when_acyclic(parents in parent_lists()) {
        let decls = declarations(&without_self_loops(parents));
        let graph = DependencyGraph::build(&decls).unwrap();
        prop_assume!(graph.cycles().is_empty());

        let edges = graph.edges();
        for node in graph.nodes() {
            let fired = graph.propagation_order(node.name().as_str(), PropagationOrder::Topological);
            let position: HashMap<&PropertyName, usize> =
                fired.iter().enumerate().map(|(i, name)| (name, i)).collect();

            for (from, to) in &edges {
                if let (Some(a), Some(b)) = (position.get(from), position.get(to)) {
                    prop_assert!(a < b, "{} fired after its dependent {}", from, to);
                }
            }
        }
    }

    #[test]
    fn topological_order_respects_edges_between_cycles(parents in parent_lists()) {
        let decls = declarations(&without_self_loops(parents));
        let graph = DependencyGraph::build(&decls).unwrap();

        let mut cycle_of: HashMap<PropertyName, usize> = HashMap::new();
        for (id, cycle) in graph.cycles().into_iter().enumerate() {
            for name in cycle {
                cycle_of.insert(name, id);
            }
        }
        let same_cycle = |a: &PropertyName, b: &PropertyName| {
            matches!((cycle_of.get(a), cycle_of.get(b)), (Some(x), Some(y)) if x == y)
        };

        let edges = graph.edges();
        for node in graph.nodes() {
            let fired = graph.propagation_order(node.name().as_str(), PropagationOrder::Topological);
            let position: HashMap<&PropertyName, usize> =
                fired.iter().enumerate().map(|(i, name)| (name, i)).collect();

            for (from, to) in &edges {
                if same_cycle(from, to) {
                    continue;
                }
                if let (Some(a), Some(b)) = (position.get(from), position.get(to)) {
                    prop_assert!(
                        a < b,
                        "{} fired after its dependent {} from {}",
                        from,
                        to,
                        node.name()
                    );
                }
            }
        }
    }

    #[test]
    fn rebuilding_yields_identical_structure(parents in parent_lists()) {
        let decls = declarations(&without_self_loops(parents));
        let first = DependencyGraph::build(&decls).unwrap();
        let second = DependencyGraph::build(&decls).unwrap();

        prop_assert_eq!(first.edges(), second.edges());
        prop_assert_eq!(first.to_string(), second.to_string());
    }
}

#[test]
fn unknown_only_parents_build_isolated_nodes() {
    let graph = DependencyGraph::build(&declarations(&[vec![5], vec![]])).unwrap();
    assert!(graph.contains("P0"));
    assert_eq!(graph.edge_count(), 0);
}
