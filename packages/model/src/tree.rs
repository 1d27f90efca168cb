//! Arena-backed document tree.
//!
//! Every structural edit goes through [`Document`], which enforces the
//! containment rules of [`NodeKind`] and validates attributes against the
//! kind's schema. Removed nodes leave a tombstone so stale ids resolve to
//! `None` instead of aliasing a newer node.

use crate::attributes::{self, Attributes, CELL, ROWSPAN};
use crate::error::{ModelError, ModelResult};
use crate::kind::NodeKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle to a node in a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    attributes: Attributes,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn empty(kind: NodeKind, parent: Option<NodeId>, children: Vec<NodeId>) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            text: String::new(),
            parent,
            children,
        }
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Host document holding paragraphs and tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl Document {
    /// Document with a single empty paragraph
    pub fn new() -> Self {
        let root = NodeId(0);
        let paragraph = NodeId(1);
        Self {
            nodes: vec![
                Some(Node::empty(NodeKind::Root, None, vec![paragraph])),
                Some(Node::empty(NodeKind::Paragraph, Some(root), Vec::new())),
            ],
            root,
        }
    }

    /// Document with a bare root
    pub fn without_content() -> Self {
        Self {
            nodes: vec![Some(Node::empty(NodeKind::Root, None, Vec::new()))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Like [`Document::get`], but missing nodes are an error
    pub fn node(&self, id: NodeId) -> ModelResult<&Node> {
        self.get(id).ok_or(ModelError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> ModelResult<&mut Node> {
        self.get_mut(id).ok_or(ModelError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.get(id).map(Node::kind)
    }

    pub fn is_kind(&self, id: NodeId, kind: NodeKind) -> bool {
        self.kind(id) == Some(kind)
    }

    /// Error unless `id` exists and is a `kind`
    pub fn expect_kind(&self, id: NodeId, kind: NodeKind) -> ModelResult<()> {
        let found = self.node(id)?.kind;
        if found == kind {
            Ok(())
        } else {
            Err(ModelError::wrong_kind(id, kind, found))
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Create a detached node with a validated attribute set
    pub fn create(&mut self, kind: NodeKind, attributes: Attributes) -> ModelResult<NodeId> {
        for (key, value) in &attributes {
            if !kind.accepts_attribute(key) {
                return Err(ModelError::unknown_attribute(kind, key.as_str()));
            }
            attributes::validate_value(key, value)?;
        }

        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::empty(kind, None, Vec::new());
        node.attributes = attributes;
        self.nodes.push(Some(node));
        Ok(id)
    }

    /// Create a detached text line (paragraph or block)
    pub fn create_text(
        &mut self,
        kind: NodeKind,
        text: &str,
        attributes: Attributes,
    ) -> ModelResult<NodeId> {
        if text.contains('\n') {
            return Err(ModelError::LineBreakInText(kind));
        }
        let id = self.create(kind, attributes)?;
        if let Some(node) = self.get_mut(id) {
            node.text = text.to_string();
        }
        Ok(id)
    }

    /// Create a detached cell together with its first, empty content block
    pub fn create_cell(&mut self, attributes: Attributes, content_id: &str) -> ModelResult<NodeId> {
        let cell = self.create(NodeKind::Cell, attributes)?;
        let block = self.create_text(
            NodeKind::Block,
            "",
            attributes::from_pairs([(CELL, content_id)]),
        )?;
        self.append(cell, block)?;
        Ok(cell)
    }

    // ------------------------------------------------------------------
    // Attachment
    // ------------------------------------------------------------------

    fn check_attach(&self, parent: NodeId, child: NodeId) -> ModelResult<()> {
        let parent_kind = self.node(parent)?.kind;
        let child_node = self.node(child)?;

        if child_node.parent.is_some() {
            return Err(ModelError::AlreadyAttached(child));
        }
        if !parent_kind.can_contain(child_node.kind) {
            return Err(ModelError::Containment {
                parent: parent_kind,
                child: child_node.kind,
            });
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(ModelError::Cycle { parent, child });
            }
            cursor = self.parent(current);
        }

        Ok(())
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) -> ModelResult<()> {
        let len = self.children(parent).len();
        self.insert(parent, len, child)
    }

    /// Attach `child` at `index` (clamped) among `parent`'s children
    pub fn insert(&mut self, parent: NodeId, index: usize, child: NodeId) -> ModelResult<()> {
        self.check_attach(parent, child)?;

        let parent_node = self.node_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        Ok(())
    }

    pub fn insert_before(&mut self, reference: NodeId, child: NodeId) -> ModelResult<()> {
        let (parent, index) = self.position(reference)?;
        self.insert(parent, index, child)
    }

    pub fn insert_after(&mut self, reference: NodeId, child: NodeId) -> ModelResult<()> {
        let (parent, index) = self.position(reference)?;
        self.insert(parent, index + 1, child)
    }

    /// Parent and index of an attached node
    fn position(&self, id: NodeId) -> ModelResult<(NodeId, usize)> {
        let parent = self.parent(id).ok_or(ModelError::NodeNotFound(id))?;
        let index = self
            .index_in_parent(id)
            .ok_or(ModelError::NodeNotFound(id))?;
        Ok((parent, index))
    }

    /// Unlink a node from its parent, keeping its subtree alive
    pub fn detach(&mut self, id: NodeId) -> ModelResult<()> {
        if id == self.root {
            return Err(ModelError::RootRemoval);
        }
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_node) = self.get_mut(parent) {
                parent_node.children.retain(|c| *c != id);
            }
        }
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Detach a node and drop it with all descendants
    pub fn remove(&mut self, id: NodeId) -> ModelResult<()> {
        self.detach(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(current.index()).and_then(Option::take) {
                stack.extend(node.children);
            }
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> ModelResult<()> {
        let children = self.children(from).to_vec();
        for child in children {
            self.detach(child)?;
            self.append(to, child)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&str> {
        self.get(id).and_then(|node| node.attribute(key))
    }

    /// Span attribute (`colspan` / `rowspan`) as stored, at least 1
    pub fn span(&self, id: NodeId, key: &str) -> usize {
        self.get(id)
            .map(|node| attributes::span(&node.attributes, key))
            .unwrap_or(1)
    }

    pub fn set_attribute(&mut self, id: NodeId, key: &str, value: impl Into<String>) -> ModelResult<()> {
        let value = value.into();
        self.check_attribute(id, key, &value)?;
        self.node_mut(id)?.attributes.insert(key.to_string(), value);
        Ok(())
    }

    /// Check a key and value against the node's schema without storing it
    pub fn check_attribute(&self, id: NodeId, key: &str, value: &str) -> ModelResult<()> {
        let kind = self.node(id)?.kind;
        if !kind.accepts_attribute(key) {
            return Err(ModelError::unknown_attribute(kind, key));
        }
        attributes::validate_value(key, value)
    }

    pub fn remove_attribute(&mut self, id: NodeId, key: &str) -> ModelResult<Option<String>> {
        Ok(self.node_mut(id)?.attributes.remove(key))
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(Node::text)
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) -> ModelResult<()> {
        let node = self.node_mut(id)?;
        if !node.kind.has_text() {
            return Err(ModelError::wrong_kind(id, NodeKind::Block, node.kind));
        }
        if text.contains('\n') {
            return Err(ModelError::LineBreakInText(node.kind));
        }
        node.text = text.to_string();
        Ok(())
    }

    /// Formats of a node, filtered to its kind's schema.
    ///
    /// A cell's `rowspan` is reported net of the empty placeholder rows that
    /// directly follow its row.
    pub fn formats(&self, id: NodeId) -> Attributes {
        let Some(node) = self.get(id) else {
            return Attributes::new();
        };

        let mut formats: Attributes = node
            .attributes
            .iter()
            .filter(|(key, _)| node.kind.accepts_attribute(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        if node.kind == NodeKind::Cell && formats.contains_key(ROWSPAN) {
            let effective = self.effective_rowspan(id);
            formats.insert(ROWSPAN.to_string(), effective.to_string());
        }

        formats
    }

    /// Stored rowspan minus the empty rows it has already absorbed
    pub fn effective_rowspan(&self, cell: NodeId) -> usize {
        let stored = self.span(cell, ROWSPAN);
        let Some(mut row) = self.parent(cell) else {
            return stored;
        };

        let mut absorbed = 0;
        while absorbed + 1 < stored {
            match self.next_sibling(row) {
                Some(next) if self.is_kind(next, NodeKind::Row) && self.children(next).is_empty() => {
                    absorbed += 1;
                    row = next;
                }
                _ => break,
            }
        }

        stored - absorbed
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(Node::children).unwrap_or(&[])
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Nearest node of `kind`, starting at `id` itself
    pub fn closest(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if self.is_kind(current, kind) {
                return Some(current);
            }
            cursor = self.parent(current);
        }
        None
    }

    /// Pre-order descendants, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub fn descendants_of_kind(&self, id: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.is_kind(*d, kind))
            .collect()
    }

    fn child_of_kind(&self, id: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.is_kind(*c, kind))
    }

    pub fn column_group(&self, table: NodeId) -> Option<NodeId> {
        self.child_of_kind(table, NodeKind::ColumnGroup)
    }

    pub fn body(&self, table: NodeId) -> Option<NodeId> {
        self.child_of_kind(table, NodeKind::Body)
    }

    /// Rows of a table's body, empty when the body is missing
    pub fn rows(&self, table: NodeId) -> &[NodeId] {
        self.body(table)
            .map(|body| self.children(body))
            .unwrap_or(&[])
    }

    /// Tables directly under the root
    pub fn tables(&self) -> Vec<NodeId> {
        self.children(self.root)
            .iter()
            .copied()
            .filter(|c| self.is_kind(*c, NodeKind::Table))
            .collect()
    }

    /// Every cell of a table, in document order
    pub fn cells(&self, table: NodeId) -> Vec<NodeId> {
        self.rows(table)
            .iter()
            .flat_map(|row| self.children(*row).iter().copied())
            .collect()
    }

    // ------------------------------------------------------------------
    // Lengths and offsets
    // ------------------------------------------------------------------

    /// Length in document units: text lines count their newline, columns are
    /// embeds of length 1, containers sum their children.
    pub fn len(&self, id: NodeId) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };
        match node.kind {
            NodeKind::Paragraph | NodeKind::Block => node.text.chars().count() + 1,
            NodeKind::Column => 1,
            _ => node.children.iter().map(|c| self.len(*c)).sum(),
        }
    }

    pub fn document_len(&self) -> usize {
        self.len(self.root)
    }

    /// Offset of a node's first line; `None` for missing or detached nodes
    pub fn offset(&self, id: NodeId) -> Option<usize> {
        self.get(id)?;
        let mut offset = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            for sibling in self.children(parent) {
                if *sibling == current {
                    break;
                }
                offset += self.len(*sibling);
            }
            current = parent;
        }
        (current == self.root).then_some(offset)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
