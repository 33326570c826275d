//! Node arena and ordered sibling operations.
//!
//! Nodes are indices into a thread-local arena. A node's parent and its
//! ordered children are stored on the node; sibling queries are answered from
//! the parent's child list.
//!
//! Insertions into and removals from a connected parent are recorded in the
//! [`mutation`](super::mutation) queue.

use std::cell::RefCell;

use super::mutation::{self, Mutation};
use crate::error::{Error, Result};
use crate::types::{NodeId, NodeKind, Overflow};

// =============================================================================
// Storage
// =============================================================================

#[derive(Debug, Default, Clone)]
pub(super) struct Style {
    pub overflow_y: Overflow,
    pub height: Option<f64>,
    pub client_height: Option<f64>,
    pub scroll_top: f64,
}

#[derive(Debug)]
pub(super) struct NodeData {
    pub kind: NodeKind,
    pub data: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub style: Style,
}

impl NodeData {
    fn new(kind: NodeKind, data: String) -> Self {
        Self {
            kind,
            data,
            parent: None,
            children: Vec::new(),
            style: Style::default(),
        }
    }
}

pub(super) struct Document {
    nodes: Vec<Option<NodeData>>,
}

const ROOT: NodeId = NodeId(0);

impl Document {
    fn new() -> Self {
        Self {
            nodes: vec![Some(NodeData::new(NodeKind::Document, String::new()))],
        }
    }

    fn create(&mut self, kind: NodeKind, data: String) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(NodeData::new(kind, data)));
        id
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeData> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Error::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Error::UnknownNode(id))
    }

    fn is_connected(&self, id: NodeId) -> bool {
        let mut iter = Some(id);
        while let Some(current) = iter {
            if current == ROOT {
                return true;
            }
            iter = self.node(current).ok().and_then(|n| n.parent);
        }
        false
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut iter = Some(node);
        while let Some(current) = iter {
            if current == ancestor {
                return true;
            }
            iter = self.node(current).ok().and_then(|n| n.parent);
        }
        false
    }

    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Ok(node) = self.node(current) else { continue };
            out.push(current);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Unlink `child` from its parent, recording the removal if it was connected.
    fn unlink(&mut self, child: NodeId) -> Result<()> {
        let Some(parent) = self.node(child)?.parent else {
            return Ok(());
        };
        let connected = self.is_connected(parent);
        let snapshot = if connected {
            self.descendants(child)
        } else {
            Vec::new()
        };

        self.node_mut(parent)?.children.retain(|&c| c != child);
        self.node_mut(child)?.parent = None;

        if connected {
            mutation::record(Mutation::Removed(snapshot));
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        let position = match reference {
            Some(r) => self
                .node(parent)?
                .children
                .iter()
                .position(|&c| c == r)
                .ok_or(Error::NotAChild { parent, child: r })?,
            None => self.node(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);

        if self.is_connected(parent) {
            mutation::record(Mutation::Inserted(child));
        }
        Ok(())
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        let parent_kind = self.node(parent)?.kind.clone();
        if !parent_kind.is_container() {
            return Err(Error::LeafNode(parent, parent_kind));
        }
        let child_kind = self.node(child)?.kind.clone();
        if child_kind == NodeKind::Document || self.is_inclusive_ancestor(child, parent) {
            return Err(Error::HierarchyRequest { parent, child });
        }
        if let Some(r) = reference {
            if self.node(r)?.parent != Some(parent) {
                return Err(Error::NotAChild { parent, child: r });
            }
            if r == child {
                return Ok(());
            }
        }

        if child_kind == NodeKind::Fragment {
            let moved = std::mem::take(&mut self.node_mut(child)?.children);
            for node in &moved {
                self.node_mut(*node)?.parent = None;
            }
            for node in moved {
                self.link(parent, node, reference)?;
            }
            return Ok(());
        }

        self.unlink(child)?;
        self.link(parent, child, reference)
    }
}

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::new());
}

pub(super) fn with_document<R>(f: impl FnOnce(&Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&doc.borrow()))
}

pub(super) fn with_document_mut<R>(f: impl FnOnce(&mut Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&mut doc.borrow_mut()))
}

// =============================================================================
// Creation
// =============================================================================

/// The document root. Nodes are connected when their ancestor chain reaches it.
pub fn document() -> NodeId {
    ROOT
}

/// Create a detached element.
pub fn create_element(tag: &str) -> NodeId {
    with_document_mut(|doc| doc.create(NodeKind::Element(tag.to_string()), String::new()))
}

/// Create a detached text node.
pub fn create_text(text: &str) -> NodeId {
    with_document_mut(|doc| doc.create(NodeKind::Text, text.to_string()))
}

/// Create a detached comment node.
pub fn create_comment(text: &str) -> NodeId {
    with_document_mut(|doc| doc.create(NodeKind::Comment, text.to_string()))
}

/// Create an empty fragment.
pub fn create_fragment() -> NodeId {
    with_document_mut(|doc| doc.create(NodeKind::Fragment, String::new()))
}

// =============================================================================
// Queries
// =============================================================================

/// Whether the handle points to a live node.
pub fn exists(id: NodeId) -> bool {
    with_document(|doc| doc.node(id).is_ok())
}

pub fn kind(id: NodeId) -> Result<NodeKind> {
    with_document(|doc| Ok(doc.node(id)?.kind.clone()))
}

/// Whether the node is a comment. Returns false for unknown nodes.
pub fn is_comment(id: NodeId) -> bool {
    with_document(|doc| matches!(doc.node(id), Ok(n) if n.kind == NodeKind::Comment))
}

/// Character data of a text or comment node, empty for other kinds.
pub fn text(id: NodeId) -> Result<String> {
    with_document(|doc| Ok(doc.node(id)?.data.clone()))
}

/// Replace the character data of a text or comment node.
pub fn set_text(id: NodeId, text: &str) -> Result<()> {
    with_document_mut(|doc| {
        let node = doc.node_mut(id)?;
        if node.kind.is_container() {
            return Err(Error::HierarchyRequest { parent: id, child: id });
        }
        node.data = text.to_string();
        Ok(())
    })
}

/// Parent of a node, `None` for detached roots and unknown nodes.
pub fn parent(id: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.node(id).ok().and_then(|n| n.parent))
}

/// Children of a node in order. Empty for unknown nodes.
pub fn children(id: NodeId) -> Vec<NodeId> {
    with_document(|doc| doc.node(id).map(|n| n.children.clone()).unwrap_or_default())
}

pub fn first_child(id: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.node(id).ok().and_then(|n| n.children.first().copied()))
}

pub fn last_child(id: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.node(id).ok().and_then(|n| n.children.last().copied()))
}

pub fn next_sibling(id: NodeId) -> Option<NodeId> {
    sibling(id, 1)
}

pub fn previous_sibling(id: NodeId) -> Option<NodeId> {
    sibling(id, -1)
}

fn sibling(id: NodeId, offset: isize) -> Option<NodeId> {
    with_document(|doc| {
        let parent = doc.node(id).ok()?.parent?;
        let siblings = &doc.node(parent).ok()?.children;
        let position = siblings.iter().position(|&c| c == id)?;
        let target = position.checked_add_signed(offset)?;
        siblings.get(target).copied()
    })
}

/// Ancestors from the parent up to the detached root or the document.
pub fn ancestors(id: NodeId) -> Vec<NodeId> {
    with_document(|doc| {
        let mut out = Vec::new();
        let mut iter = doc.node(id).ok().and_then(|n| n.parent);
        while let Some(current) = iter {
            out.push(current);
            iter = doc.node(current).ok().and_then(|n| n.parent);
        }
        out
    })
}

/// The node and all its descendants in document order.
pub fn descendants(id: NodeId) -> Vec<NodeId> {
    with_document(|doc| doc.descendants(id))
}

/// Whether the node is part of the document.
pub fn is_connected(id: NodeId) -> bool {
    with_document(|doc| doc.is_connected(id))
}

/// Whether `node` is `ancestor` or one of its descendants.
pub fn contains(ancestor: NodeId, node: NodeId) -> bool {
    with_document(|doc| doc.is_inclusive_ancestor(ancestor, node))
}

// =============================================================================
// Mutation
// =============================================================================

/// Insert `child` into `parent` before `reference`, or at the end when `None`.
///
/// A fragment moves its children, leaving the fragment empty. A node that
/// already has a parent is moved.
pub fn insert_before(parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
    with_document_mut(|doc| doc.insert_before(parent, child, reference))
}

pub fn append_child(parent: NodeId, child: NodeId) -> Result<()> {
    insert_before(parent, child, None)
}

/// Remove `child` from `parent`.
pub fn remove_child(parent: NodeId, child: NodeId) -> Result<()> {
    with_document_mut(|doc| {
        if doc.node(child)?.parent != Some(parent) {
            return Err(Error::NotAChild { parent, child });
        }
        doc.unlink(child)
    })
}

/// Remove a node from whatever parent it has. No-op for parentless nodes.
pub fn detach(id: NodeId) -> Result<()> {
    with_document_mut(|doc| doc.unlink(id))
}

/// Detach the node and free it together with its descendants.
///
/// Returns the freed handles in document order.
pub fn discard(id: NodeId) -> Result<Vec<NodeId>> {
    if id == ROOT {
        return Err(Error::HierarchyRequest { parent: id, child: id });
    }
    let freed = with_document_mut(|doc| {
        doc.unlink(id)?;
        let freed = doc.descendants(id);
        for node in &freed {
            doc.nodes[node.0] = None;
        }
        Ok::<_, Error>(freed)
    })?;
    for node in &freed {
        super::events::clear_listeners(*node);
    }
    Ok(freed)
}

// =============================================================================
// Serialization
// =============================================================================

/// Render a subtree as markup. Comments are included.
pub fn to_markup(id: NodeId) -> String {
    let mut out = String::new();
    with_document(|doc| write_markup(doc, id, &mut out));
    out
}

fn write_markup(doc: &Document, id: NodeId, out: &mut String) {
    let Ok(node) = doc.node(id) else { return };
    match &node.kind {
        NodeKind::Text => out.push_str(&node.data),
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&node.data);
            out.push_str("-->");
        }
        NodeKind::Element(tag) => {
            out.push('<');
            out.push_str(tag);
            out.push('>');
            for child in &node.children {
                write_markup(doc, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
        NodeKind::Document | NodeKind::Fragment => {
            for child in &node.children {
                write_markup(doc, *child, out);
            }
        }
    }
}

/// Concatenated text of all text nodes in the subtree, comments excluded.
pub fn text_content(id: NodeId) -> String {
    with_document(|doc| {
        doc.descendants(id)
            .into_iter()
            .filter_map(|n| doc.node(n).ok())
            .filter(|n| n.kind == NodeKind::Text)
            .map(|n| n.data.as_str())
            .collect()
    })
}

// =============================================================================
// Reset (for testing)
// =============================================================================

/// Drop every node and start from an empty document.
pub fn reset_document() {
    with_document_mut(|doc| *doc = Document::new());
    mutation::clear_records();
    super::events::reset_listeners();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_siblings() {
        reset_document();

        let div = create_element("div");
        let a = create_text("a");
        let b = create_text("b");
        append_child(div, a).unwrap();
        append_child(div, b).unwrap();

        assert_eq!(children(div), vec![a, b]);
        assert_eq!(next_sibling(a), Some(b));
        assert_eq!(previous_sibling(b), Some(a));
        assert_eq!(next_sibling(b), None);
        assert_eq!(parent(a), Some(div));
    }

    #[test]
    fn test_fragment_insert_moves_children() {
        reset_document();

        let div = create_element("div");
        let tail = create_text("z");
        append_child(div, tail).unwrap();

        let frag = create_fragment();
        let x = create_text("x");
        let y = create_text("y");
        append_child(frag, x).unwrap();
        append_child(frag, y).unwrap();

        insert_before(div, frag, Some(tail)).unwrap();
        assert_eq!(children(div), vec![x, y, tail]);
        assert!(children(frag).is_empty());
        assert_eq!(text_content(div), "xyz");
    }

    #[test]
    fn test_move_between_parents() {
        reset_document();

        let a = create_element("a");
        let b = create_element("b");
        let t = create_text("t");
        append_child(a, t).unwrap();
        append_child(b, t).unwrap();

        assert!(children(a).is_empty());
        assert_eq!(children(b), vec![t]);
    }

    #[test]
    fn test_rejects_cycles_and_leaf_parents() {
        reset_document();

        let outer = create_element("div");
        let inner = create_element("span");
        append_child(outer, inner).unwrap();

        assert_eq!(
            append_child(inner, outer),
            Err(Error::HierarchyRequest { parent: inner, child: outer })
        );

        let t = create_text("t");
        assert!(matches!(append_child(t, inner), Err(Error::LeafNode(_, NodeKind::Text))));
    }

    #[test]
    fn test_reference_must_be_child() {
        reset_document();

        let div = create_element("div");
        let stray = create_text("stray");
        let t = create_text("t");

        assert_eq!(
            insert_before(div, t, Some(stray)),
            Err(Error::NotAChild { parent: div, child: stray })
        );
    }

    #[test]
    fn test_connected_records() {
        reset_document();

        let div = create_element("div");
        let t = create_text("t");
        append_child(div, t).unwrap();
        assert_eq!(mutation::pending_records(), 0);

        append_child(document(), div).unwrap();
        assert!(is_connected(t));
        assert_eq!(mutation::take_record(), Some(Mutation::Inserted(div)));

        remove_child(document(), div).unwrap();
        assert!(!is_connected(t));
        assert_eq!(mutation::take_record(), Some(Mutation::Removed(vec![div, t])));
    }

    #[test]
    fn test_discard_frees_subtree() {
        reset_document();

        let div = create_element("div");
        let t = create_text("t");
        append_child(div, t).unwrap();

        let freed = discard(div).unwrap();
        assert_eq!(freed, vec![div, t]);
        assert!(!exists(t));
        assert_eq!(kind(t), Err(Error::UnknownNode(t)));
    }

    #[test]
    fn test_markup() {
        reset_document();

        let ul = create_element("ul");
        let li = create_element("li");
        append_child(li, create_text("one")).unwrap();
        append_child(ul, create_comment(" (( ")).unwrap();
        append_child(ul, li).unwrap();

        assert_eq!(to_markup(ul), "<ul><!-- (( --><li>one</li></ul>");
    }
}
