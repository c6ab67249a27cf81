//! Scene hierarchy tree
//!
//! Nodes form a tree of named entities. Each node carries a short name and a
//! long name, the `::`-separated path from the root. The tree stores grouping
//! only: transforms are world-space and traversal never propagates them.

use crate::ecs::Entity;
use crate::scene::dictionary::Dictionary;
use crate::scene::{SceneError, SceneResult};

/// Separator between path segments in a long name
pub const PATH_SEPARATOR: &str = "::";

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct TreeNode {
    name: String,
    long_name: String,
    entity: Entity,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// Creates a root node; its long name is its short name.
    pub fn root(entity: Entity, name: impl Into<String>) -> Self {
        let name = name.into();
        let long_name = name.clone();
        Self {
            name,
            long_name,
            entity,
            children: Vec::new(),
        }
    }

    /// Short name of this node
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full `::`-separated path from the root
    pub fn long_name(&self) -> &str {
        &self.long_name
    }

    /// Entity this node refers to
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Child nodes in insertion order
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// Appends a child under this node and registers it in the dictionary.
    ///
    /// The child's long name is this node's long name joined with `name`.
    /// Fails with [`SceneError::DuplicateName`] if that long name is already
    /// registered; the tree is left unchanged in that case.
    pub fn add_child(
        &mut self,
        entity: Entity,
        name: impl Into<String>,
        dictionary: &mut Dictionary,
    ) -> SceneResult<&mut TreeNode> {
        let name = name.into();
        let long_name = format!("{}{}{}", self.long_name, PATH_SEPARATOR, name);
        dictionary.insert(long_name.clone(), entity)?;
        self.children.push(TreeNode {
            name,
            long_name,
            entity,
            children: Vec::new(),
        });
        Ok(self
            .children
            .last_mut()
            .unwrap_or_else(|| unreachable!("child pushed above")))
    }

    /// Appends a child under the node at `parent_path`.
    ///
    /// `parent_path` is a long name; the root's own long name addresses the
    /// root. Fails with [`SceneError::NoSuchNode`] when no node has that path.
    pub fn add_child_at(
        &mut self,
        parent_path: &str,
        entity: Entity,
        name: impl Into<String>,
        dictionary: &mut Dictionary,
    ) -> SceneResult<&mut TreeNode> {
        let parent = self
            .find_mut(parent_path)
            .ok_or_else(|| SceneError::NoSuchNode(parent_path.to_string()))?;
        parent.add_child(entity, name, dictionary)
    }

    /// Finds the node with the given long name.
    pub fn find(&self, long_name: &str) -> Option<&TreeNode> {
        if self.long_name == long_name {
            return Some(self);
        }
        // A node's long name prefixes all of its descendants' long names, so
        // subtrees that do not prefix the target can be skipped.
        if !long_name.starts_with(self.long_name.as_str()) {
            return None;
        }
        self.children.iter().find_map(|child| child.find(long_name))
    }

    /// Finds the node with the given long name, mutably.
    pub fn find_mut(&mut self, long_name: &str) -> Option<&mut TreeNode> {
        if self.long_name == long_name {
            return Some(self);
        }
        if !long_name.starts_with(self.long_name.as_str()) {
            return None;
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(long_name))
    }

    /// Number of nodes in this subtree, including this node
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }
}

/// Visits every node depth-first, parents before children.
///
/// `visit` receives the node and its depth below the starting node. Children
/// are visited in insertion order. Transforms are not combined along the way;
/// every entity's transform is already world-space.
pub fn traverse<F>(node: &TreeNode, visit: &mut F)
where
    F: FnMut(&TreeNode, usize),
{
    traverse_depth(node, 0, visit);
}

fn traverse_depth<F>(node: &TreeNode, depth: usize, visit: &mut F)
where
    F: FnMut(&TreeNode, usize),
{
    visit(node, depth);
    for child in &node.children {
        traverse_depth(child, depth + 1, visit);
    }
}

/// Logs the subtree under `node`, one line per node, indented by depth.
pub fn log_tree(node: &TreeNode) {
    traverse(node, &mut |node, depth| {
        log::debug!(
            "{:indent$}{} [{}]",
            "",
            node.name(),
            node.entity(),
            indent = depth * 2
        );
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Registry;

    fn registry_with(n: usize) -> (Registry, Vec<Entity>) {
        let mut registry = Registry::new();
        let entities = (0..n)
            .map(|_| registry.create().unwrap())
            .collect::<Vec<_>>();
        (registry, entities)
    }

    #[test]
    fn test_long_names_follow_the_path_from_the_root() {
        let (_registry, e) = registry_with(3);
        let mut dictionary = Dictionary::new();
        let mut root = TreeNode::root(e[0], "scene");

        let group = root.add_child(e[1], "lights", &mut dictionary).unwrap();
        assert_eq!(group.long_name(), "scene::lights");
        group.add_child(e[2], "point0", &mut dictionary).unwrap();

        assert_eq!(
            root.find("scene::lights::point0").unwrap().entity(),
            e[2]
        );
    }

    #[test]
    fn test_duplicate_sibling_name_is_rejected_and_tree_unchanged() {
        let (_registry, e) = registry_with(3);
        let mut dictionary = Dictionary::new();
        let mut root = TreeNode::root(e[0], "scene");

        root.add_child(e[1], "lava", &mut dictionary).unwrap();
        let result = root.add_child(e[2], "lava", &mut dictionary);

        assert!(matches!(result, Err(SceneError::DuplicateName(_))));
        assert_eq!(root.children().len(), 1);
        assert_eq!(dictionary.retrieve("scene::lava"), Some(e[1]));
    }

    #[test]
    fn test_add_child_at_unknown_parent_fails() {
        let (_registry, e) = registry_with(2);
        let mut dictionary = Dictionary::new();
        let mut root = TreeNode::root(e[0], "scene");

        let result = root.add_child_at("scene::missing", e[1], "x", &mut dictionary);
        assert!(matches!(result, Err(SceneError::NoSuchNode(_))));
    }

    #[test]
    fn test_traverse_is_depth_first_parents_before_children() {
        let (_registry, e) = registry_with(5);
        let mut dictionary = Dictionary::new();
        let mut root = TreeNode::root(e[0], "scene");
        {
            let a = root.add_child(e[1], "a", &mut dictionary).unwrap();
            a.add_child(e[2], "a0", &mut dictionary).unwrap();
            a.add_child(e[3], "a1", &mut dictionary).unwrap();
        }
        root.add_child(e[4], "b", &mut dictionary).unwrap();

        let mut order = Vec::new();
        traverse(&root, &mut |node, depth| {
            order.push((node.name().to_string(), depth));
        });

        let expected = [
            ("scene", 0),
            ("a", 1),
            ("a0", 2),
            ("a1", 2),
            ("b", 1),
        ];
        let expected: Vec<(String, usize)> = expected
            .iter()
            .map(|(n, d)| ((*n).to_string(), *d))
            .collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_node_count_covers_the_whole_subtree() {
        let (_registry, e) = registry_with(4);
        let mut dictionary = Dictionary::new();
        let mut root = TreeNode::root(e[0], "scene");
        let a = root.add_child(e[1], "a", &mut dictionary).unwrap();
        a.add_child(e[2], "a0", &mut dictionary).unwrap();
        root.add_child(e[3], "b", &mut dictionary).unwrap();

        assert_eq!(root.node_count(), 4);
    }
}
