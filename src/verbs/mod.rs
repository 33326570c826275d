//! Verbs - components that manage a run of sibling nodes.
//!
//! - [`holder`] - placeholder plus sentinel range, the base of every verb
//! - [`repeater`] - one node per item of an observable sequence
//! - [`displayer`] - conditional content
//! - [`writer`] - observable text
//!
//! Each verb has a helper that builds the component, renders it and returns
//! the placeholder to insert:
//!
//! ```ignore
//! let todos = Observable::new(vec!["write docs".to_string()]);
//! let list = dom::create_element("ul");
//! dom::append_child(list, repeat(&todos, |todo, _| {
//!     let li = dom::create_element("li");
//!     dom::append_child(li, dom::create_text(todo)).ok();
//!     li
//! })?)?;
//! ```

pub mod displayer;
pub mod holder;
pub mod range;
pub mod repeater;
pub mod writer;

pub use displayer::{display, display_if, display_unless, DisplayContent, Displayer, Truthy};
pub use holder::VirtualHolder;
pub use range::SentinelRange;
pub use repeater::{
    repeat, repeat_observed, repeat_scroll, repeat_scroll_observed, RenderItem, RepeatOptions,
    Repeater, DEFAULT_SCROLL_BUFFER_SIZE, SCROLL_THRESHOLD,
};
pub use writer::{write, Writer};
