//! Computed style and scroll geometry.
//!
//! Geometry follows a stacked block model: a node with an explicit height
//! occupies that height, any other node occupies the sum of its children.
//! This is enough to answer the one question the verbs ask: how far is the
//! bottom of a scroll container from its visible area.

use super::tree::{with_document, with_document_mut, Document};
use crate::error::Result;
use crate::types::{NodeId, Overflow};

// =============================================================================
// Overflow
// =============================================================================

pub fn set_overflow_y(id: NodeId, overflow: Overflow) -> Result<()> {
    with_document_mut(|doc| {
        doc.node_mut(id)?.style.overflow_y = overflow;
        Ok(())
    })
}

/// Computed `overflow-y`. Unknown nodes report `Visible`.
pub fn overflow_y(id: NodeId) -> Overflow {
    with_document(|doc| doc.node(id).map(|n| n.style.overflow_y).unwrap_or_default())
}

// =============================================================================
// Heights
// =============================================================================

/// Fix the outer height of a node.
pub fn set_height(id: NodeId, height: f64) -> Result<()> {
    with_document_mut(|doc| {
        doc.node_mut(id)?.style.height = Some(height.max(0.0));
        Ok(())
    })
}

/// Fix the visible height of a scroll container.
pub fn set_client_height(id: NodeId, height: f64) -> Result<()> {
    with_document_mut(|doc| {
        doc.node_mut(id)?.style.client_height = Some(height.max(0.0));
        Ok(())
    })
}

fn outer_height(doc: &Document, id: NodeId) -> f64 {
    let Ok(node) = doc.node(id) else { return 0.0 };
    match node.style.height {
        Some(height) => height,
        None => content_height(doc, id),
    }
}

fn content_height(doc: &Document, id: NodeId) -> f64 {
    doc.node(id)
        .map(|n| n.children.iter().map(|&c| outer_height(doc, c)).sum())
        .unwrap_or(0.0)
}

/// Visible height: the explicit client height, or the outer height.
pub fn client_height(id: NodeId) -> f64 {
    with_document(|doc| {
        doc.node(id)
            .ok()
            .and_then(|n| n.style.client_height)
            .unwrap_or_else(|| outer_height(doc, id))
    })
}

/// Total scrollable height, never less than the client height.
pub fn scroll_height(id: NodeId) -> f64 {
    let content = with_document(|doc| content_height(doc, id));
    content.max(client_height(id))
}

// =============================================================================
// Scroll Offset
// =============================================================================

pub fn scroll_top(id: NodeId) -> f64 {
    with_document(|doc| doc.node(id).map(|n| n.style.scroll_top).unwrap_or(0.0))
}

/// Set the vertical scroll offset, clamped to the scrollable range.
pub fn set_scroll_top(id: NodeId, top: f64) -> Result<()> {
    let max = (scroll_height(id) - client_height(id)).max(0.0);
    with_document_mut(|doc| {
        doc.node_mut(id)?.style.scroll_top = top.clamp(0.0, max);
        Ok(())
    })
}

/// Unrendered distance between the visible bottom and the content bottom.
pub fn distance_to_bottom(id: NodeId) -> f64 {
    scroll_height(id) - (client_height(id) + scroll_top(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{append_child, create_element, reset_document};

    #[test]
    fn test_stacked_heights() {
        reset_document();

        let list = create_element("div");
        set_client_height(list, 100.0).unwrap();
        for _ in 0..4 {
            let row = create_element("p");
            set_height(row, 30.0).unwrap();
            append_child(list, row).unwrap();
        }

        assert_eq!(client_height(list), 100.0);
        assert_eq!(scroll_height(list), 120.0);
        assert_eq!(distance_to_bottom(list), 20.0);
    }

    #[test]
    fn test_scroll_height_at_least_client() {
        reset_document();

        let list = create_element("div");
        set_client_height(list, 100.0).unwrap();
        assert_eq!(scroll_height(list), 100.0);
        assert_eq!(distance_to_bottom(list), 0.0);
    }

    #[test]
    fn test_scroll_top_is_clamped() {
        reset_document();

        let list = create_element("div");
        set_client_height(list, 50.0).unwrap();
        let row = create_element("p");
        set_height(row, 80.0).unwrap();
        append_child(list, row).unwrap();

        set_scroll_top(list, 500.0).unwrap();
        assert_eq!(scroll_top(list), 30.0);
        set_scroll_top(list, -4.0).unwrap();
        assert_eq!(scroll_top(list), 0.0);
    }

    #[test]
    fn test_overflow_default() {
        reset_document();

        let div = create_element("div");
        assert_eq!(overflow_y(div), Overflow::Visible);
        set_overflow_y(div, Overflow::Auto).unwrap();
        assert_eq!(overflow_y(div), Overflow::Auto);
    }
}
