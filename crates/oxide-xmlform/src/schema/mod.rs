//! Schema document tree.
//!
//! The schema is held in an arena of nodes addressed by [`NodeId`]. Nodes
//! keep parent and child indices; ancestor name chains are recomputed on
//! every lookup so that merges and replacements never leave stale state.
//! Detached nodes stay in the arena, unreachable from the root, until
//! [`SchemaTree::compact`] rebuilds it.

mod parse;
mod selector;
mod write;

pub use parse::MAX_DEPTH;
pub use selector::Selector;

/// Tag of the document root.
pub const FORM: &str = "form";
/// Tag of a (possibly named) group container.
pub const FIELDS: &str = "fields";
/// Tag of a fieldset declaration.
pub const FIELDSET: &str = "fieldset";
/// Tag of a single field.
pub const FIELD: &str = "field";

/// Index of a node in a [`SchemaTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An ordered element tree with a single root.
#[derive(Debug, Clone)]
pub struct SchemaTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SchemaTree {
    /// Creates a tree containing only a root element with the given tag.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![NodeData::new(root_tag)],
            root: NodeId(0),
        }
    }

    /// Creates an empty `<form>` document.
    pub fn empty_form() -> Self {
        Self::new(FORM)
    }

    /// Returns the root element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a read-only view of a node.
    pub fn element(&self, id: NodeId) -> Element<'_> {
        Element { tree: self, id }
    }

    /// Creates a detached element. Attach it with [`append_child`](Self::append_child).
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.nodes.push(NodeData::new(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Appends a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Unlinks a node (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|child| *child != id);
        }
    }

    /// Puts `new` at the position of `old` and detaches `old`.
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        self.detach(new);
        let Some(parent) = self.nodes[old.0].parent.take() else {
            return;
        };
        if let Some(slot) = self.nodes[parent.0]
            .children
            .iter_mut()
            .find(|child| **child == old)
        {
            *slot = new;
        }
        self.nodes[new.0].parent = Some(parent);
    }

    /// Deep-copies a subtree of another tree into this arena, detached.
    pub fn import(&mut self, source: &SchemaTree, id: NodeId) -> NodeId {
        let copy = self.copy_node(source, id);
        let mut stack: Vec<(NodeId, NodeId)> = vec![(id, copy)];
        while let Some((original, parent)) = stack.pop() {
            for child in source.children(original) {
                let child_copy = self.copy_node(source, *child);
                self.append_child(parent, child_copy);
                stack.push((*child, child_copy));
            }
        }
        copy
    }

    fn copy_node(&mut self, source: &SchemaTree, id: NodeId) -> NodeId {
        let data = &source.nodes[id.0];
        let copy = self.create_element(data.tag.clone());
        self.nodes[copy.0].attributes = data.attributes.clone();
        self.nodes[copy.0].text = data.text.clone();
        copy
    }

    /// Returns the number of nodes held in the arena, detached ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Rebuilds the arena from the root, dropping detached nodes.
    ///
    /// Node ids taken before the call are invalidated.
    pub fn compact(&mut self) {
        if self.descendants(self.root).len() + 1 == self.nodes.len() {
            return;
        }
        let mut tree = SchemaTree::new(self.tag(self.root));
        let root = tree.root();
        tree.nodes[root.0].attributes = std::mem::take(&mut self.nodes[self.root.0].attributes);
        tree.nodes[root.0].text = std::mem::take(&mut self.nodes[self.root.0].text);
        for child in self.children(self.root).to_vec() {
            let copy = tree.import(self, child);
            tree.append_child(root, copy);
        }
        *self = tree;
    }

    /// Returns the tag name of a node.
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    /// Returns an attribute value.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns all attributes in declaration order.
    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.nodes[id.0].attributes
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let value = value.into();
        let attributes = &mut self.nodes[id.0].attributes;
        match attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value,
            None => attributes.push((name.to_string(), value)),
        }
    }

    /// Returns the text content of a node.
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Replaces the text content of a node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    /// Returns the parent of a node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Returns the children of a node in order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Returns whether a node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|ancestor| ancestor == self.root)
    }

    /// Iterates the ancestors of a node, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |node| self.parent(*node))
    }

    /// Returns the descendants of a node in document order, excluding itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    /// Returns a node followed by its descendants in document order.
    pub fn descendants_or_self(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        out.extend(self.descendants(id));
        out
    }

    /// Returns whether a node is a `<field>` with the given name.
    pub fn is_field_named(&self, id: NodeId, name: &str) -> bool {
        self.tag(id) == FIELD && self.attr(id, "name") == Some(name)
    }

    /// Returns whether a node is a `<fields>` container with a name attribute.
    pub fn is_named_group(&self, id: NodeId) -> bool {
        self.tag(id) == FIELDS && self.attr(id, "name").is_some()
    }

    /// Names of the named `<fields>` ancestors of a node, outermost first.
    pub fn group_path(&self, id: NodeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .ancestors(id)
            .filter(|ancestor| self.tag(*ancestor) == FIELDS)
            .filter_map(|ancestor| self.attr(ancestor, "name"))
            .collect();
        names.reverse();
        names
    }

    /// Like [`group_path`](Self::group_path) but includes the node itself
    /// when it is a named group.
    pub fn group_path_or_self(&self, id: NodeId) -> Vec<&str> {
        let mut names = self.group_path(id);
        if self.tag(id) == FIELDS {
            if let Some(name) = self.attr(id, "name") {
                names.push(name);
            }
        }
        names
    }

    /// Returns whether any ancestor is a named `<fields>` container.
    pub fn has_named_group_ancestor(&self, id: NodeId) -> bool {
        self.ancestors(id)
            .any(|ancestor| self.is_named_group(ancestor))
    }

    /// Returns the dot-joined group path of a node, or `None` when ungrouped.
    pub fn group_of(&self, id: NodeId) -> Option<String> {
        let path = self.group_path(id);
        if path.is_empty() {
            None
        } else {
            Some(path.join("."))
        }
    }
}

/// A borrowed view of one node in a [`SchemaTree`].
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    tree: &'a SchemaTree,
    id: NodeId,
}

impl<'a> Element<'a> {
    /// Returns the node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the owning tree.
    pub fn tree(&self) -> &'a SchemaTree {
        self.tree
    }

    /// Returns the tag name.
    pub fn tag(&self) -> &'a str {
        self.tree.tag(self.id)
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.tree.attr(self.id, name)
    }

    /// Returns an attribute value, treating an empty string as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&'a str> {
        self.attr(name).filter(|value| !value.is_empty())
    }

    /// Returns whether an attribute is set to a truthy value
    /// (anything but empty, `0` or `false`).
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.attr(name), Some(value) if !matches!(value, "" | "0" | "false"))
    }

    /// Returns all attributes in declaration order.
    pub fn attributes(&self) -> &'a [(String, String)] {
        self.tree.attributes(self.id)
    }

    /// Returns the `name` attribute, or an empty string.
    pub fn name(&self) -> &'a str {
        self.attr("name").unwrap_or_default()
    }

    /// Returns the text content.
    pub fn text(&self) -> &'a str {
        self.tree.text(self.id)
    }

    /// Returns the submitted value of an `<option>`: its `value` attribute,
    /// or else its untranslated text.
    pub fn option_value(&self) -> &'a str {
        self.attr("value").unwrap_or_else(|| self.text().trim())
    }

    /// Returns the child elements with the given tag.
    pub fn children_named(&self, tag: &'a str) -> impl Iterator<Item = Element<'a>> + 'a {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .filter(move |child| tree.tag(**child) == tag)
            .map(move |child| tree.element(*child))
    }

    /// Returns the dot-joined group path, or `None` when ungrouped.
    pub fn group(&self) -> Option<String> {
        self.tree.group_of(self.id)
    }

    /// Returns the data key of a field: group path plus name.
    pub fn key(&self) -> String {
        match self.group() {
            Some(group) => format!("{group}.{}", self.name()),
            None => self.name().to_string(),
        }
    }
}
