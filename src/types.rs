//! Core types shared across the crate.

use std::fmt;

// =============================================================================
// Node Handles
// =============================================================================

/// Handle to a node of the thread-local document.
///
/// Handles are never reused: once a node is discarded its id stays dead and
/// every operation on it fails with [`Error::UnknownNode`](crate::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// The root of the thread-local document. There is exactly one.
    Document,
    /// Element with a tag name.
    Element(String),
    /// Text node.
    Text,
    /// Comment node, used for placeholders and markers.
    Comment,
    /// Detached container whose children move out when it is inserted.
    Fragment,
}

impl NodeKind {
    /// Whether nodes of this kind can hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment
        )
    }
}

// =============================================================================
// Style
// =============================================================================

/// Computed `overflow-y` of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    #[default]
    Visible,
    Hidden,
    Scroll,
    Auto,
}

// =============================================================================
// Listener Options (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Options for [`add_event_listener`](crate::dom::add_event_listener).
    ///
    /// Combine with bitwise OR: `ListenerOptions::CAPTURE | ListenerOptions::ONCE`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ListenerOptions: u8 {
        const NONE = 0;
        /// Run before listeners registered without CAPTURE.
        const CAPTURE = 1 << 0;
        /// Remove the listener after its first call.
        const ONCE = 1 << 1;
        /// The listener promises not to cancel the event.
        const PASSIVE = 1 << 2;
    }
}

// =============================================================================
// Callback Types
// =============================================================================

/// Function returned by subscriptions. Call it to stop observing.
pub type Unsubscribe = Box<dyn FnOnce()>;
