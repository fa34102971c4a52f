//! Deterministic breadth-first spanning tree over the mind-map graph.
//!
//! Both full layouts walk the same tree: BFS from the root, neighbors visited
//! in case-insensitive lexicographic order (ties by exact id). Nodes that are
//! not reachable from the root are left out.

use std::collections::{HashMap, VecDeque};

use crate::graph::{MindMapGraph, NodeId};

#[derive(Debug, Clone)]
pub struct SpanningTree {
    children: HashMap<NodeId, Vec<NodeId>>,
    depth: HashMap<NodeId, usize>,
}

impl SpanningTree {
    /// Build the tree rooted at `root`. Returns `None` if `root` is not in the graph.
    pub fn bfs(graph: &MindMapGraph, root: &NodeId) -> Option<Self> {
        if !graph.contains(root) {
            return None;
        }

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut depth = HashMap::new();
        depth.insert(root.clone(), 0);

        let mut queue = VecDeque::from([root.clone()]);
        while let Some(current) = queue.pop_front() {
            let level = depth[&current];
            // neighbors() is already sorted by sibling order, so each
            // children list comes out sorted too
            for nb in graph.neighbors(&current) {
                if depth.contains_key(nb) {
                    continue;
                }
                depth.insert(nb.clone(), level + 1);
                children.entry(current.clone()).or_default().push(nb.clone());
                queue.push_back(nb.clone());
            }
        }

        Some(Self { children, depth })
    }

    /// Children of `id` in sibling order. Empty for leaves and unknown ids.
    pub fn children(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of nodes reachable from the root, root included.
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2D;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn build(nodes: &[&str], edges: &[(&str, &str)]) -> MindMapGraph {
        let mut g = MindMapGraph::new();
        for n in nodes {
            g.add_node(id(n), Point2D::default()).unwrap();
        }
        for (a, b) in edges {
            g.add_edge(&id(a), &id(b)).unwrap();
        }
        g
    }

    #[test]
    fn test_unknown_root() {
        let g = build(&["a"], &[]);
        assert!(SpanningTree::bfs(&g, &id("zz")).is_none());
    }

    #[test]
    fn test_children_sorted_case_insensitive() {
        let g = build(
            &["root", "beta", "Alpha", "gamma"],
            &[("root", "gamma"), ("root", "beta"), ("root", "Alpha")],
        );
        let tree = SpanningTree::bfs(&g, &id("root")).unwrap();
        assert_eq!(tree.children(&id("root")), &[id("Alpha"), id("beta"), id("gamma")]);
        assert!(tree.children(&id("beta")).is_empty());
    }

    #[test]
    fn test_cycle_becomes_tree() {
        // Triangle: c is reached from a first, so the b-c edge is dropped
        let g = build(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let tree = SpanningTree::bfs(&g, &id("a")).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.children(&id("a")), &[id("b"), id("c")]);
        assert!(tree.children(&id("b")).is_empty());
        assert!(tree.children(&id("c")).is_empty());
    }

    #[test]
    fn test_unreachable_nodes_excluded() {
        let g = build(&["a", "b", "island"], &[("a", "b")]);
        let tree = SpanningTree::bfs(&g, &id("a")).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.children(&id("a")), &[id("b")]);
        assert!(tree.children(&id("island")).is_empty());
    }
}
