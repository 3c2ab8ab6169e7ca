//! Arena-backed RRT* tree
//!
//! All nodes live in one insertion-ordered `Vec`; parent and child links are
//! indices into it. Mutation goes through [`Tree::insert`] and
//! [`Tree::rewire`] only, so the parent/child lists always agree.

use crate::common::{Configuration, Point2D};
use crate::path_planning::steering::distance;

/// Stable handle of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Tree node
#[derive(Debug, Clone)]
pub struct Node {
    pub config: Configuration,
    /// Accumulated cost from the root, valid as of this node's last insert or rewire
    pub cost: f64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Sampled edge curve from the parent, empty for the root
    curve: Vec<Point2D>,
}

impl Node {
    fn new(config: Configuration) -> Self {
        Node {
            config,
            cost: 0.0,
            parent: None,
            children: Vec::new(),
            curve: Vec::new(),
        }
    }

    pub fn position(&self) -> Point2D {
        self.config.position
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn curve(&self) -> &[Point2D] {
        &self.curve
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    last_node: NodeId,
}

impl Tree {
    /// Create a tree holding only the root at `start`.
    pub fn new(start: Configuration) -> Self {
        let mut tree = Tree {
            nodes: Vec::new(),
            last_node: NodeId(0),
        };
        tree.initialize_root(start);
        tree
    }

    /// Drop every node and start over from a fresh root.
    pub fn initialize_root(&mut self, start: Configuration) {
        self.nodes.clear();
        self.nodes.push(Node::new(start));
        self.last_node = NodeId(0);
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn last_node(&self) -> NodeId {
        self.last_node
    }

    /// Node count, root included; a tree is never empty.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn cost(&self, id: NodeId) -> f64 {
        self.nodes[id.0].cost
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Add `config` as a child of `parent`; it becomes the last node.
    ///
    /// `edge_cost` is the path cost of the connecting edge and `curve` its
    /// sampled geometry.
    pub fn insert(
        &mut self,
        parent: NodeId,
        config: Configuration,
        edge_cost: f64,
        curve: Vec<Point2D>,
    ) -> NodeId {
        assert!(parent.0 < self.nodes.len(), "insert under unknown node {:?}", parent);

        let id = NodeId(self.nodes.len());
        let mut node = Node::new(config);
        node.parent = Some(parent);
        node.cost = self.nodes[parent.0].cost + edge_cost;
        node.curve = curve;

        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        self.last_node = id;
        id
    }

    /// Move `node` under `new_parent` with cost `new_cost`.
    ///
    /// Descendant costs are left untouched; see [`Tree::propagate_cost`].
    ///
    /// # Panics
    /// If `node` is the root, is missing from its parent's child list, or if
    /// `new_parent` lies in the subtree of `node`.
    pub fn rewire(&mut self, node: NodeId, new_parent: NodeId, new_cost: f64, curve: Vec<Point2D>) {
        assert!(node.0 < self.nodes.len(), "rewire of unknown node {:?}", node);
        assert!(new_parent.0 < self.nodes.len(), "rewire under unknown node {:?}", new_parent);
        let old_parent = match self.nodes[node.0].parent {
            Some(p) => p,
            None => panic!("the root cannot be rewired"),
        };
        assert!(
            !self.is_ancestor_or_self(node, new_parent),
            "rewiring {:?} under {:?} would create a cycle",
            node,
            new_parent
        );
        let siblings = &mut self.nodes[old_parent.0].children;
        let before = siblings.len();
        siblings.retain(|&child| child != node);
        assert_eq!(
            before,
            siblings.len() + 1,
            "{:?} missing from the child list of {:?}",
            node,
            old_parent
        );

        let entry = &mut self.nodes[node.0];
        entry.parent = Some(new_parent);
        entry.cost = new_cost;
        entry.curve = curve;
        self.nodes[new_parent.0].children.push(node);
    }

    /// Recompute costs of every descendant of `node` from their parents,
    /// using `edge_cost` for each parent-child edge. Returns the number of
    /// nodes updated.
    pub fn propagate_cost<F>(&mut self, node: NodeId, edge_cost: F) -> usize
    where
        F: Fn(&Configuration, &Configuration) -> f64,
    {
        let mut updated = 0;
        let mut stack = vec![node];
        while let Some(parent) = stack.pop() {
            let parent_cost = self.nodes[parent.0].cost;
            let parent_config = self.nodes[parent.0].config;
            let children = self.nodes[parent.0].children.clone();
            for child in children {
                let entry = &mut self.nodes[child.0];
                entry.cost = parent_cost + edge_cost(&parent_config, &entry.config);
                updated += 1;
                stack.push(child);
            }
        }
        updated
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        let mut steps = 0;
        loop {
            if node == ancestor {
                return true;
            }
            match self.nodes[node.0].parent {
                Some(parent) => node = parent,
                None => return false,
            }
            steps += 1;
            assert!(steps <= self.nodes.len(), "parent chain of {:?} contains a cycle", node);
        }
    }

    /// Node closest to `point`; ties keep the earliest inserted node.
    pub fn nearest(&self, point: &Point2D) -> NodeId {
        let mut min_dist = f64::INFINITY;
        let mut nearest = self.root();

        for (i, node) in self.nodes.iter().enumerate() {
            let dist = distance(point, &node.config.position);
            if dist < min_dist {
                min_dist = dist;
                nearest = NodeId(i);
            }
        }

        nearest
    }

    /// All nodes strictly within `radius` of `point`, in insertion order.
    pub fn near(&self, point: &Point2D, radius: f64) -> Vec<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| distance(point, &node.config.position) < radius)
            .map(|(i, _)| NodeId(i))
            .collect()
    }

    /// Nodes from `start` up to and including the root.
    pub fn path_to_root(&self, start: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            path.push(id);
            assert!(path.len() <= self.nodes.len(), "parent chain of {:?} contains a cycle", start);
            current = self.nodes[id.0].parent;
        }
        path
    }

    /// Check the rooted-tree invariants: only the root lacks a parent, every
    /// other node sits in exactly its parent's child list, and every parent
    /// chain reaches the root.
    pub fn is_well_formed(&self) -> bool {
        let n = self.nodes.len();
        if n == 0 || self.nodes[0].parent.is_some() {
            return false;
        }

        let mut listed = vec![0usize; n];
        for (i, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                if child.0 >= n || self.nodes[child.0].parent != Some(NodeId(i)) {
                    return false;
                }
                listed[child.0] += 1;
            }
        }
        if listed[0] != 0 || listed[1..].iter().any(|&count| count != 1) {
            return false;
        }

        (1..n).all(|start| {
            let mut current = NodeId(start);
            for _ in 0..n {
                match self.nodes[current.0].parent {
                    Some(parent) => current = parent,
                    None => return current == self.root(),
                }
            }
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::steering::path_cost;

    fn point(x: f64, y: f64) -> Configuration {
        Configuration::point(x, y)
    }

    fn add(tree: &mut Tree, parent: NodeId, config: Configuration) -> NodeId {
        let cost = path_cost(&tree.node(parent).config, &config);
        tree.insert(parent, config, cost, Vec::new())
    }

    #[test]
    fn test_root_initialization() {
        let tree = Tree::new(point(1.0, 2.0));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.last_node(), tree.root());
        assert_eq!(tree.cost(tree.root()), 0.0);
        assert!(tree.node(tree.root()).parent().is_none());
        assert!(tree.is_well_formed());
    }

    #[test]
    fn test_insert_links_and_costs() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let a = add(&mut tree, root, point(3.0, 4.0));
        let b = add(&mut tree, a, point(3.0, 7.0));

        assert_eq!(tree.last_node(), b);
        assert_eq!(tree.node(a).parent(), Some(tree.root()));
        assert_eq!(tree.node(tree.root()).children(), &[a]);
        assert!((tree.cost(a) - 5.0).abs() < 1e-12);
        assert!((tree.cost(b) - 8.0).abs() < 1e-12);
        assert_eq!(tree.path_to_root(b), vec![b, a, tree.root()]);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn test_rewire_moves_child_without_propagation() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let detour = add(&mut tree, root, point(0.0, 5.0));
        let a = add(&mut tree, detour, point(5.0, 5.0));
        let leaf = add(&mut tree, a, point(8.0, 5.0));
        let shortcut = add(&mut tree, root, point(4.0, 3.0));

        let stale_leaf_cost = tree.cost(leaf);
        let new_cost = tree.cost(shortcut) + path_cost(&tree.node(shortcut).config, &tree.node(a).config);
        tree.rewire(a, shortcut, new_cost, Vec::new());

        assert_eq!(tree.node(a).parent(), Some(shortcut));
        assert!(tree.node(detour).children().is_empty());
        assert_eq!(tree.node(shortcut).children(), &[a]);
        assert!((tree.cost(a) - new_cost).abs() < 1e-12);
        // descendant keeps its old cost until someone propagates
        assert_eq!(tree.cost(leaf), stale_leaf_cost);
        assert!(tree.is_well_formed());

        let updated = tree.propagate_cost(a, path_cost);
        assert_eq!(updated, 1);
        assert!((tree.cost(leaf) - (new_cost + 3.0)).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn test_rewire_into_own_subtree_panics() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let a = add(&mut tree, root, point(1.0, 0.0));
        let b = add(&mut tree, a, point(2.0, 0.0));
        tree.rewire(a, b, 0.0, Vec::new());
    }

    #[test]
    #[should_panic(expected = "root")]
    fn test_rewire_root_panics() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let a = add(&mut tree, root, point(1.0, 0.0));
        tree.rewire(root, a, 0.0, Vec::new());
    }

    #[test]
    fn test_nearest_ties_keep_first() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let left = add(&mut tree, root, point(-1.0, 5.0));
        let _right = add(&mut tree, root, point(1.0, 5.0));
        assert_eq!(tree.nearest(&Point2D::new(0.0, 5.0)), left);
        assert_eq!(tree.nearest(&Point2D::new(0.0, -3.0)), tree.root());
    }

    #[test]
    fn test_near_is_strict_and_ordered() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        let a = add(&mut tree, root, point(3.0, 0.0));
        let b = add(&mut tree, a, point(6.0, 0.0));
        let _far = add(&mut tree, b, point(9.0, 0.0));

        let near = tree.near(&Point2D::new(3.0, 0.0), 3.0);
        assert_eq!(near, vec![a]);
        let near = tree.near(&Point2D::new(3.0, 0.0), 3.0 + 1e-9);
        assert_eq!(near, vec![tree.root(), a, b]);
    }

    #[test]
    fn test_reinitialize_drops_nodes() {
        let mut tree = Tree::new(point(0.0, 0.0));
        let root = tree.root();
        add(&mut tree, root, point(1.0, 0.0));
        tree.initialize_root(point(5.0, 5.0));
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(tree.root()).position(), Point2D::new(5.0, 5.0));
        assert!(tree.node(tree.root()).children().is_empty());
    }
}
