//! The in-memory Graph: a bidirectional adjacency store built from a node
//! collection's `connections`.

use cortex_core::Node;
use cortex_error::{Error, Result};
use indexmap::IndexMap;
use std::collections::{HashSet, VecDeque};

/// Insertion-ordered, duplicate-tolerant bidirectional adjacency graph.
///
/// Both maps are kept in lock-step: `add_edge(a, b, w)` appends `(b, w)` to
/// `forward_adj[a]` and `(a, w)` to `reverse_adj[b]`, and ensures both `a`
/// and `b` exist as keys in both maps even if one end has no edges of its
/// own yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    forward_adj: IndexMap<String, Vec<(String, u8)>>,
    reverse_adj: IndexMap<String, Vec<(String, u8)>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a node collection: every node becomes a key (even
    /// with no outgoing connections), and every connection becomes an edge.
    pub fn from_nodes(nodes: &[Node]) -> Self {
        let mut graph = Graph::new();
        for node in nodes {
            graph.ensure_node(&node.id);
        }
        for node in nodes {
            for (conn_type, conns) in &node.connections {
                for conn in conns {
                    let _ = conn_type;
                    graph.add_edge(&node.id, &conn.target_id, conn.weight);
                }
            }
        }
        graph
    }

    /// Ensures `id` exists as a key in both adjacency maps, with no edges.
    pub fn ensure_node(&mut self, id: &str) {
        self.forward_adj.entry(id.to_string()).or_default();
        self.reverse_adj.entry(id.to_string()).or_default();
    }

    /// Appends a directed edge `a -> b`. Duplicate edges are allowed and
    /// each counts separately in degree/edge-count queries.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: u8) {
        self.forward_adj
            .entry(a.to_string())
            .or_default()
            .push((b.to_string(), weight));
        self.ensure_node(b);
        self.reverse_adj
            .entry(b.to_string())
            .or_default()
            .push((a.to_string(), weight));
        self.ensure_node(a);
    }

    pub fn get_adjacent(&self, id: &str) -> &[(String, u8)] {
        self.forward_adj.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn get_incoming(&self, id: &str) -> &[(String, u8)] {
        self.reverse_adj.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.get_adjacent(a).iter().any(|(t, _)| t == b)
    }

    pub fn degree(&self, id: &str) -> usize {
        self.get_adjacent(id).len()
    }

    pub fn in_degree(&self, id: &str) -> usize {
        self.get_incoming(id).len()
    }

    pub fn node_count(&self) -> usize {
        self.forward_adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward_adj.values().map(|v| v.len()).sum()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.forward_adj.contains_key(id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.forward_adj.keys().map(|s| s.as_str())
    }

    pub(crate) fn forward_entries(&self) -> impl Iterator<Item = (&str, &[(String, u8)])> {
        self.forward_adj.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// BFS from `start`, returning every reachable node with its distance
    /// (in edges) from `start`. Visited is marked on enqueue, so a node
    /// appears exactly once, at its first-discovered (shortest) level.
    pub fn bfs(&self, start: &str) -> Vec<(String, usize)> {
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.to_string());
        let mut out = vec![(start.to_string(), 0)];
        let mut queue = VecDeque::new();
        queue.push_back((start.to_string(), 0usize));
        while let Some((cur, level)) = queue.pop_front() {
            for (next, _) in self.get_adjacent(&cur) {
                if visited.insert(next.clone()) {
                    out.push((next.clone(), level + 1));
                    queue.push_back((next.clone(), level + 1));
                }
            }
        }
        out
    }

    /// Recursive post-order DFS from `start`: a node is marked visited the
    /// first time it's touched, and appended to the result after all of its
    /// descendants.
    pub fn dfs(&self, start: &str) -> Vec<String> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.dfs_visit(start, &mut visited, &mut out);
        out
    }

    fn dfs_visit(&self, node: &str, visited: &mut HashSet<String>, out: &mut Vec<String>) {
        if !visited.insert(node.to_string()) {
            return;
        }
        for (next, _) in self.get_adjacent(node) {
            self.dfs_visit(next, visited, out);
        }
        out.push(node.to_string());
    }

    /// BFS-based shortest path by edge count, reconstructed via a
    /// parent-backpointer map.
    pub fn shortest_path(&self, start: &str, end: &str) -> Result<Vec<String>> {
        if start == end {
            return Ok(vec![start.to_string()]);
        }
        let mut visited: HashSet<String> = HashSet::new();
        visited.insert(start.to_string());
        let mut parent: IndexMap<String, String> = IndexMap::new();
        let mut queue = VecDeque::new();
        queue.push_back(start.to_string());

        while let Some(cur) = queue.pop_front() {
            for (next, _) in self.get_adjacent(&cur) {
                if visited.insert(next.clone()) {
                    parent.insert(next.clone(), cur.clone());
                    if next == end {
                        return Ok(reconstruct(&parent, end));
                    }
                    queue.push_back(next.clone());
                }
            }
        }

        Err(Error::PathNotFound {
            from: start.to_string(),
            to: end.to_string(),
        })
    }
}

fn reconstruct(parent: &IndexMap<String, String>, end: &str) -> Vec<String> {
    let mut path = vec![end.to_string()];
    let mut cursor = end.to_string();
    while let Some(p) = parent.get(&cursor) {
        path.push(p.clone());
        cursor = p.clone();
    }
    path.reverse();
    path
}
