//! Similarity graph and connected-component clustering

use std::collections::{HashMap, HashSet};

/// Undirected graph over concept ids.
///
/// Nodes live in an arena indexed by insertion order; edges are adjacency lists
/// of arena indices, with a set of `(low, high)` index pairs so repeated edges
/// are rejected in constant time. Built fresh per analysis run.
#[derive(Debug, Clone, Default)]
pub struct SimilarityGraph {
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    adjacency: Vec<Vec<usize>>,
    edges: HashSet<(usize, usize)>,
}

impl SimilarityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node if absent and returns its arena index.
    pub fn add_node(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        self.adjacency.push(Vec::new());
        idx
    }

    /// Connects two nodes, adding them if needed. Self-loops and repeated
    /// edges are ignored.
    pub fn add_edge(&mut self, a: &str, b: &str) {
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        if ia == ib || !self.edges.insert((ia.min(ib), ia.max(ib))) {
            return;
        }
        self.adjacency[ia].push(ib);
        self.adjacency[ib].push(ia);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Connected components with more than one member.
    ///
    /// Traversal is iterative with an explicit stack, so depth is bounded by
    /// memory rather than the call stack. Components are discovered in node
    /// insertion order, then sorted by size descending (stable, so equal sizes
    /// keep discovery order). Members are sorted lexicographically.
    pub fn clusters(&self) -> Vec<Vec<String>> {
        let mut visited = vec![false; self.nodes.len()];
        let mut clusters = Vec::new();

        for start in 0..self.nodes.len() {
            if visited[start] || self.adjacency[start].is_empty() {
                continue;
            }

            let mut component = Vec::new();
            let mut stack = vec![start];
            visited[start] = true;
            while let Some(node) = stack.pop() {
                component.push(self.nodes[node].clone());
                for &next in &self.adjacency[node] {
                    if !visited[next] {
                        visited[next] = true;
                        stack.push(next);
                    }
                }
            }

            if component.len() > 1 {
                component.sort();
                clusters.push(component);
            }
        }

        clusters.sort_by_key(|c| std::cmp::Reverse(c.len()));
        clusters
    }
}
