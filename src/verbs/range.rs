//! Sentinel ranges - a pair of comments bracketing managed content.
//!
//! ```text
//! <!-- (( --> item item item <!-- )) -->
//! ```
//!
//! Both markers always share a parent: either the live parent next to the
//! holder's placeholder, or the fragment that stores the content while the
//! holder is away.

use crate::dom;
use crate::error::{Error, Result};
use crate::types::NodeId;

pub const BEGIN_MARKER: &str = " (( ";
pub const END_MARKER: &str = " )) ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentinelRange {
    begin: NodeId,
    end: NodeId,
}

impl SentinelRange {
    /// Create both markers, detached.
    pub fn new() -> Self {
        Self {
            begin: dom::create_comment(BEGIN_MARKER),
            end: dom::create_comment(END_MARKER),
        }
    }

    pub fn begin(&self) -> NodeId {
        self.begin
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    fn broken(&self) -> Error {
        Error::BrokenRange {
            begin: self.begin,
            end: self.end,
        }
    }

    /// The shared parent of both markers.
    pub fn parent(&self) -> Result<NodeId> {
        match (dom::parent(self.begin), dom::parent(self.end)) {
            (Some(a), Some(b)) if a == b => Ok(a),
            _ => Err(self.broken()),
        }
    }

    /// Whether the range sits directly after `anchor`.
    pub fn follows(&self, anchor: NodeId) -> bool {
        dom::next_sibling(anchor) == Some(self.begin)
    }

    /// Nodes strictly between the markers, in order.
    pub fn contents(&self) -> Result<Vec<NodeId>> {
        self.parent()?;
        let mut out = Vec::new();
        let mut iter = dom::next_sibling(self.begin);
        while let Some(node) = iter {
            if node == self.end {
                return Ok(out);
            }
            out.push(node);
            iter = dom::next_sibling(node);
        }
        Err(self.broken())
    }

    /// Put both markers into `container`, around whatever it holds.
    pub(crate) fn bracket(&self, container: NodeId) -> Result<()> {
        let first = dom::first_child(container);
        dom::insert_before(container, self.begin, first)?;
        dom::append_child(container, self.end)
    }

    /// Insert `node` (a fragment moves its children) just before the end marker.
    pub fn insert_before_end(&self, node: NodeId) -> Result<()> {
        let parent = self.parent()?;
        dom::insert_before(parent, node, Some(self.end))
    }

    /// Remove `start` and everything after it up to the end marker.
    ///
    /// Returns the removed nodes, still alive, in order.
    pub fn remove_from(&self, start: NodeId) -> Result<Vec<NodeId>> {
        let parent = self.parent()?;
        if start == self.end {
            return Ok(Vec::new());
        }
        let mut doomed = Vec::new();
        let mut iter = Some(start);
        while let Some(node) = iter {
            if node == self.end {
                break;
            }
            if node == self.begin {
                return Err(self.broken());
            }
            doomed.push(node);
            iter = dom::next_sibling(node);
        }
        if iter.is_none() {
            return Err(self.broken());
        }
        for node in &doomed {
            dom::remove_child(parent, *node)?;
        }
        Ok(doomed)
    }

    /// Remove everything between the markers. Returns the removed nodes.
    pub fn clear(&self) -> Result<Vec<NodeId>> {
        self.parent()?;
        match dom::next_sibling(self.begin) {
            Some(first) => self.remove_from(first),
            None => Err(self.broken()),
        }
    }

    /// Clear, then insert `node` if given. Returns the removed nodes.
    pub fn replace(&self, node: Option<NodeId>) -> Result<Vec<NodeId>> {
        let removed = self.clear()?;
        if let Some(node) = node {
            self.insert_before_end(node)?;
        }
        Ok(removed)
    }

    /// Move both markers and the content into a new fragment.
    pub fn extract(&self) -> Result<NodeId> {
        let mut nodes = vec![self.begin];
        nodes.extend(self.contents()?);
        nodes.push(self.end);

        let fragment = dom::create_fragment();
        for node in nodes {
            dom::append_child(fragment, node)?;
        }
        Ok(fragment)
    }

    /// Move the whole range into `parent` before `reference`.
    pub fn move_before(&self, parent: NodeId, reference: Option<NodeId>) -> Result<()> {
        let fragment = self.extract()?;
        dom::insert_before(parent, fragment, reference)?;
        dom::discard(fragment)?;
        Ok(())
    }
}

impl Default for SentinelRange {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(items: &[&str]) -> (NodeId, SentinelRange, Vec<NodeId>) {
        let host = dom::create_element("ul");
        let range = SentinelRange::new();
        range.bracket(host).unwrap();
        let nodes: Vec<NodeId> = items.iter().map(|t| dom::create_text(t)).collect();
        for node in &nodes {
            range.insert_before_end(*node).unwrap();
        }
        (host, range, nodes)
    }

    fn texts_of(nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|n| dom::text(*n).unwrap()).collect()
    }

    #[test]
    fn test_contents_in_order() {
        dom::reset_document();
        let (host, range, nodes) = filled(&["a", "b", "c"]);
        assert_eq!(range.contents().unwrap(), nodes);
        assert_eq!(range.parent().unwrap(), host);
        assert_eq!(dom::text_content(host), "abc");
    }

    #[test]
    fn test_remove_from_keeps_prefix() {
        dom::reset_document();
        let (host, range, nodes) = filled(&["a", "b", "c"]);
        assert_eq!(range.remove_from(nodes[1]).unwrap(), nodes[1..].to_vec());
        assert_eq!(dom::text_content(host), "a");
        assert!(range.remove_from(range.end()).unwrap().is_empty());
        assert!(dom::parent(nodes[2]).is_none());
    }

    #[test]
    fn test_replace_and_clear() {
        dom::reset_document();
        let (host, range, _) = filled(&["a", "b"]);
        let removed = range.replace(Some(dom::create_text("z"))).unwrap();
        assert_eq!(dom::text_content(host), "z");
        assert_eq!(texts_of(&removed), vec!["a", "b"]);
        range.clear().unwrap();
        assert!(range.contents().unwrap().is_empty());
    }

    #[test]
    fn test_extract_and_move() {
        dom::reset_document();
        let (host, range, nodes) = filled(&["a"]);
        let before = dom::create_text("x");
        dom::insert_before(host, before, Some(range.begin())).unwrap();

        let fragment = range.extract().unwrap();
        assert_eq!(dom::children(host), vec![before]);
        assert_eq!(dom::children(fragment), vec![range.begin(), nodes[0], range.end()]);

        let other = dom::create_element("ol");
        range.move_before(other, None).unwrap();
        assert_eq!(range.parent().unwrap(), other);
        assert_eq!(range.contents().unwrap(), nodes);
    }

    #[test]
    fn test_split_markers_are_broken() {
        dom::reset_document();
        let (_, range, _) = filled(&["a"]);
        dom::detach(range.end()).unwrap();
        assert!(matches!(range.contents(), Err(Error::BrokenRange { .. })));
        assert!(matches!(range.clear(), Err(Error::BrokenRange { .. })));
    }
}
