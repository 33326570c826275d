//! Error type shared by the document, controllers and verbs.

use crate::types::{NodeId, NodeKind};

/// Errors raised by domic operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The handle does not point to a live node (never created or discarded).
    #[error("node {0} does not exist or was discarded")]
    UnknownNode(NodeId),

    /// A reference node passed to a sibling operation is not a child of the parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// Expected parent
        parent: NodeId,
        /// Node that was not found among its children
        child: NodeId,
    },

    /// Inserting the node would make it its own ancestor, or move the document.
    #[error("cannot insert {child} into {parent}")]
    HierarchyRequest {
        /// Target parent
        parent: NodeId,
        /// Node being inserted
        child: NodeId,
    },

    /// Text and comment nodes cannot hold children.
    #[error("node {0} of kind {1:?} cannot have children")]
    LeafNode(NodeId, NodeKind),

    /// Lifecycle hooks were run on a controller that was never bound.
    #[error("controller is not bound to a node")]
    Unbound,

    /// `bind_to_node` was called a second time.
    #[error("controller is already bound to node {0}")]
    AlreadyBound(NodeId),

    /// A virtual holder was used before `render`.
    #[error("virtual holder `{0}` has not been rendered")]
    NotRendered(String),

    /// The placeholder of a holder is expected to sit in a parent.
    #[error("placeholder {0} is not attached to a parent")]
    Detached(NodeId),

    /// Scroll repetition needs a scrollable ancestor.
    #[error("scroll repeat needs an ancestor with overflow-y: auto")]
    NoScrollContainer,

    /// The begin and end markers of a range no longer share a parent.
    #[error("sentinel range {begin}..{end} is broken")]
    BrokenRange {
        /// Opening marker
        begin: NodeId,
        /// Closing marker
        end: NodeId,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
