//! The named tree both walkers produce and the differ consumes.

use std::collections::BTreeMap;

/// A node in a tree of field names.
///
/// The template walker and the shape walker both build one of these, rooted at
/// a node named after [`CompareOptions::root_name`](crate::CompareOptions::root_name).
/// Children are keyed by name and kept sorted, so every traversal is
/// lexicographic and deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTree {
    name: String,
    children: BTreeMap<String, FieldTree>,
}

impl FieldTree {
    /// Create a node with no children.
    pub fn new(name: impl Into<String>) -> Self {
        FieldTree {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }

    /// The node's own name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The child called `name`, if registered.
    pub fn child(&self, name: &str) -> Option<&FieldTree> {
        self.children.get(name)
    }

    /// Children in lexicographic order.
    pub fn children(&self) -> impl Iterator<Item = &FieldTree> {
        self.children.values()
    }

    /// Whether the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The child called `name`, created if it does not exist yet.
    ///
    /// Registering the same name twice returns the node created the first time.
    pub fn child_or_insert(&mut self, name: &str) -> &mut FieldTree {
        self.children
            .entry(name.to_string())
            .or_insert_with(|| FieldTree::new(name))
    }

    /// Descend through `path`, creating every missing segment, and return the
    /// last node. An empty path returns `self`.
    pub fn insert_path<'p>(&mut self, path: impl IntoIterator<Item = &'p str>) -> &mut FieldTree {
        path.into_iter()
            .fold(self, |node, segment| node.child_or_insert(segment))
    }

    /// Every registered path below this node, dotted (`Address.City`), in
    /// depth-first lexicographic order. The node's own name is not included.
    pub fn paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths("", &mut out);
        out
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        for child in self.children.values() {
            let path = if prefix.is_empty() {
                child.name.clone()
            } else {
                format!("{prefix}.{}", child.name)
            };
            out.push(path.clone());
            child.collect_paths(&path, out);
        }
    }
}
