//! Propagation orders over a built dependency graph.
//!
//! Both functions call `fire` exactly once for every node reachable from
//! `start`, never for `start` itself, and terminate on cycles.

use crate::domain::PropertyName;
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

/// Breadth-first propagation.
///
/// The visited set is seeded with `start` so the trigger is never
/// re-notified, and the queue with its direct dependents. A node is marked
/// when it is dequeued, so a node reached along several paths sits in the
/// queue more than once but fires only the first time.
///
/// Fires in order of distance from the trigger. For fan-in over paths of
/// unequal length a dependent can fire before one of its own dependencies;
/// use [`topological`] when that matters.
pub(super) fn breadth_first(
    graph: &DiGraph<PropertyName, ()>,
    start: NodeIndex,
    mut fire: impl FnMut(NodeIndex),
) {
    let mut visited = HashSet::from([start]);
    let mut queue: VecDeque<NodeIndex> = graph.neighbors(start).collect();

    while let Some(next) = queue.pop_front() {
        if !visited.insert(next) {
            continue;
        }

        fire(next);
        queue.extend(graph.neighbors(next).filter(|d| !visited.contains(d)));
    }
}

/// Topological propagation.
///
/// Orders the subgraph reachable from `start`, excluding `start`. Nodes that
/// share a cycle are condensed into one component and Kahn's algorithm runs
/// over the components, so every node fires after all of its dependencies
/// outside its own cycle. Ties between ready components go to the one
/// discovered first by a breadth-first walk, and the members of a component
/// fire in discovery order.
pub(super) fn topological(
    graph: &DiGraph<PropertyName, ()>,
    start: NodeIndex,
    mut fire: impl FnMut(NodeIndex),
) {
    let mut discovered = Vec::new();
    let mut bfs = Bfs::new(graph, start);
    while let Some(node) = bfs.next(graph) {
        if node != start {
            discovered.push(node);
        }
    }

    let rank: HashMap<NodeIndex, usize> = discovered
        .iter()
        .enumerate()
        .map(|(pos, &node)| (node, pos))
        .collect();

    // Node `pos` of `reached` stands for `discovered[pos]`. Edges leaving the
    // trigger do not count; it has already changed.
    let mut reached: DiGraph<(), ()> = DiGraph::with_capacity(discovered.len(), 0);
    for _ in &discovered {
        reached.add_node(());
    }
    for (pos, &node) in discovered.iter().enumerate() {
        for dependent in graph.neighbors(node) {
            if let Some(&dep_pos) = rank.get(&dependent) {
                reached.update_edge(NodeIndex::new(pos), NodeIndex::new(dep_pos), ());
            }
        }
    }

    // Component ids follow the discovery rank of each component's first member.
    let mut components: Vec<Vec<usize>> = algo::tarjan_scc(&reached)
        .into_iter()
        .map(|component| {
            let mut members: Vec<usize> = component.into_iter().map(NodeIndex::index).collect();
            members.sort_unstable();
            members
        })
        .collect();
    components.sort_unstable_by_key(|members| members[0]);

    let mut component_of = vec![0usize; discovered.len()];
    for (id, members) in components.iter().enumerate() {
        for &pos in members {
            component_of[pos] = id;
        }
    }

    let mut in_degree = vec![0usize; components.len()];
    for edge in reached.raw_edges() {
        let from = component_of[edge.source().index()];
        let to = component_of[edge.target().index()];
        if from != to {
            in_degree[to] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(id, _)| Reverse(id))
        .collect();

    while let Some(Reverse(id)) = ready.pop() {
        for &pos in &components[id] {
            fire(discovered[pos]);
        }

        for &pos in &components[id] {
            for dependent in reached.neighbors(NodeIndex::new(pos)) {
                let target = component_of[dependent.index()];
                if target == id {
                    continue;
                }
                in_degree[target] -= 1;
                if in_degree[target] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Walk = fn(&DiGraph<PropertyName, ()>, NodeIndex, &mut dyn FnMut(NodeIndex));

    struct Fixture {
        graph: DiGraph<PropertyName, ()>,
        nodes: HashMap<&'static str, NodeIndex>,
    }

    impl Fixture {
        fn new(edges: &[(&'static str, &'static str)]) -> Self {
            let mut graph = DiGraph::new();
            let mut nodes = HashMap::new();
            for &(from, to) in edges {
                for name in [from, to] {
                    nodes
                        .entry(name)
                        .or_insert_with(|| graph.add_node(PropertyName::from(name)));
                }
                graph.update_edge(nodes[from], nodes[to], ());
            }
            Self { graph, nodes }
        }

        fn run(&self, start: &str, walk: Walk) -> Vec<String> {
            let mut fired = Vec::new();
            walk(&self.graph, self.nodes[start], &mut |node| {
                fired.push(self.graph[node].to_string());
            });
            fired
        }
    }

    fn bfs(graph: &DiGraph<PropertyName, ()>, start: NodeIndex, fire: &mut dyn FnMut(NodeIndex)) {
        breadth_first(graph, start, fire);
    }

    fn topo(graph: &DiGraph<PropertyName, ()>, start: NodeIndex, fire: &mut dyn FnMut(NodeIndex)) {
        topological(graph, start, fire);
    }

    fn position(fired: &[String], name: &str) -> usize {
        fired
            .iter()
            .position(|n| n == name)
            .unwrap_or_else(|| panic!("{name} did not fire: {fired:?}"))
    }

    #[test]
    fn test_bfs_diamond_fires_each_once() {
        let fixture = Fixture::new(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        let fired = fixture.run("A", bfs);

        assert_eq!(fired.len(), 3);
        assert!(position(&fired, "D") > position(&fired, "B"));
        assert!(position(&fired, "D") > position(&fired, "C"));
    }

    #[test]
    fn test_bfs_unequal_fan_in_fires_by_distance() {
        // A -> B -> C -> D and A -> D: D is one hop away, C two.
        let fixture = Fixture::new(&[("A", "B"), ("B", "C"), ("C", "D"), ("A", "D")]);
        let fired = fixture.run("A", bfs);

        assert_eq!(fired.len(), 3);
        assert!(position(&fired, "D") < position(&fired, "C"));
    }

    #[test]
    fn test_topological_unequal_fan_in_waits_for_dependencies() {
        let fixture = Fixture::new(&[("A", "B"), ("B", "C"), ("C", "D"), ("A", "D")]);
        let fired = fixture.run("A", topo);

        assert_eq!(fired, vec!["B", "C", "D"]);
    }

    #[test]
    fn test_cycle_through_trigger_skips_trigger() {
        let fixture = Fixture::new(&[("A", "B"), ("B", "A"), ("A", "C")]);

        let walks: [Walk; 2] = [bfs, topo];
        for walk in walks {
            let mut fired = fixture.run("A", walk);
            fired.sort();
            assert_eq!(fired, vec!["B", "C"]);
        }
    }

    #[test]
    fn test_topological_releases_cycle_not_containing_trigger() {
        // T -> X, X <-> Y, Y -> Z
        let fixture = Fixture::new(&[("T", "X"), ("X", "Y"), ("Y", "X"), ("Y", "Z")]);
        let fired = fixture.run("T", topo);

        assert_eq!(fired, vec!["X", "Y", "Z"]);
    }

    #[test]
    fn test_topological_holds_cycle_dependents_until_cycle_fires() {
        // Z depends on the trigger and on Y, which only fires once the
        // X <-> Y cycle is released through W.
        let fixture = Fixture::new(&[
            ("T", "Z"),
            ("Y", "Z"),
            ("T", "W"),
            ("W", "X"),
            ("Y", "X"),
            ("X", "Y"),
        ]);
        let fired = fixture.run("T", topo);

        assert_eq!(fired, vec!["W", "X", "Y", "Z"]);
    }

    #[test]
    fn test_topological_orders_chain_of_cycles() {
        // A -> {B <-> C} -> {D <-> E} -> F, with a shortcut A -> F.
        let fixture = Fixture::new(&[
            ("A", "B"),
            ("B", "C"),
            ("C", "B"),
            ("C", "D"),
            ("D", "E"),
            ("E", "D"),
            ("E", "F"),
            ("A", "F"),
        ]);
        let fired = fixture.run("A", topo);

        assert_eq!(fired, vec!["B", "C", "D", "E", "F"]);
    }

    #[test]
    fn test_leaf_trigger_fires_nothing() {
        let fixture = Fixture::new(&[("A", "B")]);
        assert!(fixture.run("B", bfs).is_empty());
        assert!(fixture.run("B", topo).is_empty());
    }
}
