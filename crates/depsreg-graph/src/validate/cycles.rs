//! Dependency cycle detection using `petgraph`.
//!
//! Nodes are package ids, edges point from a package to each declared
//! dependency. Traversal visits roots in id order and neighbours in id
//! order so findings are reproducible.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use depsreg_common::manifest::Manifest;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

/// An ordered cycle; the first id is repeated at the end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cycle {
    /// Package ids along the cycle.
    pub path: Vec<String>,
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path.join(" -> "))
    }
}

/// Directed graph of package ids.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: BTreeMap<String, NodeIndex>,
    roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the graph from manifests. Every manifest id becomes a
    /// traversal root; several versions of one id merge their edges.
    #[must_use]
    pub fn from_manifests<'a, I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a Manifest>,
    {
        let mut graph = Self::new();
        for manifest in manifests {
            let from = graph.add_package(&manifest.id);
            for dep in manifest.dependencies.keys() {
                let to = graph.node(dep);
                graph.add_dependency(from, to);
            }
        }
        graph
    }

    fn node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.to_string());
        let _ = self.nodes.insert(id.to_string(), idx);
        idx
    }

    /// Adds a package that will be used as a traversal root.
    pub fn add_package(&mut self, id: &str) -> NodeIndex {
        let idx = self.node(id);
        if !self.roots.contains(&idx) {
            self.roots.push(idx);
        }
        idx
    }

    /// Adds the edge `dependent -> dependency` unless it already exists.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependent, dependency, ());
    }

    /// Checks whether any cycle exists.
    #[must_use]
    pub fn is_cyclic(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }

    fn sorted_neighbors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut next: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        next.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));
        next
    }

    /// Depth-first search reporting at most one cycle per unvisited root.
    ///
    /// Nodes visited under an earlier root are not explored again, so a
    /// graph with several overlapping cycles may yield fewer findings than
    /// it has cycles.
    #[must_use]
    pub fn find_cycles(&self) -> Vec<Cycle> {
        if !self.is_cyclic() {
            return Vec::new();
        }
        let mut roots = self.roots.clone();
        roots.sort_by(|a, b| self.graph[*a].cmp(&self.graph[*b]));

        let mut visited = HashSet::new();
        let mut cycles = Vec::new();
        for root in roots {
            if visited.contains(&root) {
                continue;
            }
            let mut on_stack = HashSet::new();
            let mut path = Vec::new();
            if let Some(cycle) = self.visit(root, &mut visited, &mut on_stack, &mut path) {
                tracing::debug!(cycle = %cycle, "dependency cycle found");
                cycles.push(cycle);
            }
        }
        cycles
    }

    fn visit(
        &self,
        node: NodeIndex,
        visited: &mut HashSet<NodeIndex>,
        on_stack: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> Option<Cycle> {
        let _ = visited.insert(node);
        let _ = on_stack.insert(node);
        path.push(node);

        for next in self.sorted_neighbors(node) {
            if !visited.contains(&next) {
                if let Some(cycle) = self.visit(next, visited, on_stack, path) {
                    return Some(cycle);
                }
            } else if on_stack.contains(&next) {
                if let Some(start) = path.iter().position(|n| *n == next) {
                    let ids = path[start..]
                        .iter()
                        .chain(std::iter::once(&next))
                        .map(|n| self.graph[*n].clone())
                        .collect();
                    return Some(Cycle { path: ids });
                }
            }
        }

        let _ = on_stack.remove(&node);
        let _ = path.pop();
        None
    }
}

/// Builds the dependency graph of `manifests` and reports its cycles.
pub fn detect_cycles<'a, I>(manifests: I) -> Vec<Cycle>
where
    I: IntoIterator<Item = &'a Manifest>,
{
    DependencyGraph::from_manifests(manifests).find_cycles()
}
