//! Property dependency graph built from declarations using petgraph.
//!
//! # Edge Direction Convention
//!
//! Edges point from a **dependency to its dependent**: if `Total` is derived
//! from `Subtotal`, the graph holds the edge `Subtotal -> Total`. A node's
//! outgoing neighbours are therefore exactly the properties that must be
//! re-notified when it changes.
//!
//! # Construction
//!
//! [`DependencyGraph::build`] walks the declarations depth-first. A node is
//! inserted into the name map *before* its parents are visited, so a chain of
//! declarations that loops back to a node still being initialised finds the
//! node already present and returns. This is what makes construction
//! terminate on cyclic declarations.
//!
//! - Parent names matching no declared property are skipped.
//! - Repeated parents collapse into one edge.
//! - A property that resolves to itself as a parent is rejected with
//!   [`Error::SelfDependency`].
//!
//! Only properties that declare dependencies, or are referenced as a
//! dependency, become nodes. The graph is never mutated after `build`.

mod traversal;

use crate::config::PropagationOrder;
use crate::domain::{Declarations, PropertyDecl, PropertyName};
use crate::error::{Error, Result};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

/// Immutable dependency graph for one host type.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Nodes hold property names; edges run dependency -> dependent.
    graph: DiGraph<PropertyName, ()>,

    /// Exactly one node per distinct property name.
    node_map: HashMap<PropertyName, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph for a declaration table.
    ///
    /// # Errors
    ///
    /// - `Error::SelfDependency` if a property depends on itself
    /// - `Error::EmptyPropertyName` if a graph node would have an empty name
    pub fn build(decls: &Declarations) -> Result<Self> {
        let mut graph = Self::default();

        for decl in decls.iter().filter(|d| d.has_dependencies()) {
            graph.initialize(decl, decls)?;
        }

        debug!(
            nodes = graph.len(),
            edges = graph.edge_count(),
            "Built dependency graph"
        );
        Ok(graph)
    }

    fn initialize(&mut self, decl: &PropertyDecl, decls: &Declarations) -> Result<NodeIndex> {
        if let Some(&node) = self.node_map.get(decl.name.as_str()) {
            return Ok(node);
        }
        if decl.name.is_empty() {
            return Err(Error::EmptyPropertyName);
        }

        // Insert before recursing: a cycle back to this property must find it here.
        let node = self.graph.add_node(decl.name.clone());
        self.node_map.insert(decl.name.clone(), node);

        for parent in &decl.depends_on {
            let Some(parent_decl) = decls.get(parent.as_str()) else {
                debug!(
                    property = %decl.name,
                    parent = %parent,
                    "Ignoring dependency on undeclared property"
                );
                continue;
            };

            let parent_node = self.initialize(parent_decl, decls)?;
            self.add_dependent(parent_node, node)?;
        }

        Ok(node)
    }

    fn add_dependent(&mut self, dependency: NodeIndex, dependent: NodeIndex) -> Result<()> {
        if dependency == dependent {
            return Err(Error::SelfDependency {
                property: self.graph[dependent].to_string(),
            });
        }
        // update_edge never adds a parallel edge, so dependents behave as a set.
        self.graph.update_edge(dependency, dependent, ());
        Ok(())
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of dependency -> dependent edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether a node exists for this property
    pub fn contains(&self, name: &str) -> bool {
        self.node_map.contains_key(name)
    }

    /// Look up the node for a property
    pub fn node(&self, name: &str) -> Option<DependencyNode<'_>> {
        self.node_map
            .get(name)
            .map(|&index| DependencyNode { graph: self, index })
    }

    /// Iterate all nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = DependencyNode<'_>> {
        self.graph
            .node_indices()
            .map(move |index| DependencyNode { graph: self, index })
    }

    /// All edges as sorted `(dependency, dependent)` pairs.
    ///
    /// Two graphs built from the same declarations return equal lists.
    pub fn edges(&self) -> Vec<(PropertyName, PropertyName)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(from, to)| (self.graph[from].clone(), self.graph[to].clone()))
            .collect();
        edges.sort();
        edges
    }

    /// Groups of properties that depend on each other in a cycle.
    ///
    /// Cycles are legal; this is informational. Each group is sorted, and the
    /// groups are sorted by their first name.
    pub fn cycles(&self) -> Vec<Vec<PropertyName>> {
        let mut cycles: Vec<Vec<PropertyName>> = algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut names: Vec<_> = component
                    .into_iter()
                    .map(|index| self.graph[index].clone())
                    .collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Properties notified, in firing order, when `name` changes.
    ///
    /// `name` itself is never included. Unknown names yield an empty list.
    pub fn propagation_order(&self, name: &str, order: PropagationOrder) -> Vec<PropertyName> {
        let mut fired = Vec::new();
        self.visit_affected(name, order, |affected| fired.push(affected.clone()));
        fired
    }

    /// Invoke `fire` once per property reachable from `name`.
    ///
    /// Returns `false`, without firing, if `name` has no node.
    pub(crate) fn visit_affected(
        &self,
        name: &str,
        order: PropagationOrder,
        mut fire: impl FnMut(&PropertyName),
    ) -> bool {
        let Some(&start) = self.node_map.get(name) else {
            return false;
        };

        let graph = &self.graph;
        match order {
            PropagationOrder::BreadthFirst => {
                traversal::breadth_first(graph, start, |node| fire(&graph[node]));
            }
            PropagationOrder::Topological => {
                traversal::topological(graph, start, |node| fire(&graph[node]));
            }
        }
        true
    }
}

impl fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut nodes: Vec<_> = self.nodes().collect();
        nodes.sort_by(|a, b| a.name().cmp(b.name()));

        write!(f, "[")?;
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{node}")?;
        }
        write!(f, "]")
    }
}

/// A property node borrowed from a [`DependencyGraph`].
#[derive(Debug, Clone, Copy)]
pub struct DependencyNode<'g> {
    graph: &'g DependencyGraph,
    index: NodeIndex,
}

impl<'g> DependencyNode<'g> {
    /// Property name
    pub fn name(&self) -> &'g PropertyName {
        &self.graph.graph[self.index]
    }

    /// Properties derived from this one (no ordering guarantee)
    pub fn dependents(&self) -> impl Iterator<Item = DependencyNode<'g>> + 'g {
        let graph = self.graph;
        graph
            .graph
            .neighbors(self.index)
            .map(move |index| DependencyNode { graph, index })
    }

    /// Number of direct dependents
    pub fn dependent_count(&self) -> usize {
        self.graph.graph.neighbors(self.index).count()
    }

    /// Sorted names of the direct dependents
    pub fn dependent_names(&self) -> Vec<&'g PropertyName> {
        let mut names: Vec<_> = self.dependents().map(|d| d.name()).collect();
        names.sort();
        names
    }
}

impl PartialEq for DependencyNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.graph, other.graph) && self.index == other.index
    }
}

impl Eq for DependencyNode<'_> {}

impl fmt::Display for DependencyNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dependents: Vec<&str> = self
            .dependent_names()
            .into_iter()
            .map(PropertyName::as_str)
            .collect();
        write!(f, "{}({})", self.name(), dependents.join(","))
    }
}
