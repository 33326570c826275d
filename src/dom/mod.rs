//! Document - the node tree controllers and verbs operate on.
//!
//! The document is a thread-local arena of nodes addressed by [`NodeId`]:
//!
//! ```text
//! #0 Document
//! ├── #1 <div>            (overflow-y: auto, client height 400)
//! │   ├── #4 <!-- repeat: -->
//! │   ├── #5 <!-- (( -->
//! │   ├── #7 <!--repeat-0-->
//! │   ├── #6 <li>
//! │   └── #8 <!-- )) -->
//! ```
//!
//! - [`tree`] - creation, ordered sibling operations, serialization
//! - [`layout`] - `overflow-y` and scroll geometry
//! - [`events`] - listeners and dispatch
//! - [`mutation`] - connection records consumed by the mount driver
//!
//! [`NodeId`]: crate::NodeId

pub mod events;
pub mod layout;
pub mod mutation;
pub mod tree;

pub use events::{
    add_event_listener, dispatch_event, listener_count, remove_event_listener, Event, Listener,
    ListenerId,
};
pub use layout::{
    client_height, distance_to_bottom, overflow_y, scroll_height, scroll_top, set_client_height,
    set_height, set_overflow_y, set_scroll_top,
};
pub use mutation::{pending_records, take_record, Mutation};
pub use tree::{
    ancestors, append_child, children, contains, create_comment, create_element,
    create_fragment, create_text, descendants, detach, discard, document, exists, first_child,
    insert_before, is_comment, is_connected, kind, last_child, next_sibling, parent,
    previous_sibling, remove_child, reset_document, set_text, text, text_content, to_markup,
};
