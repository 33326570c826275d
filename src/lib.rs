//! # domic
//!
//! Reactive bindings between observable values and document nodes.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals): every
//! writable [`Observable`] keeps its value in a signal.
//!
//! ## Architecture
//!
//! Controllers are attached to nodes and carry mount/unmount/render hooks.
//! The mount driver turns document connection changes into hook runs, and
//! the verbs use those hooks to keep a run of sibling nodes in sync with
//! observable state:
//!
//! ```text
//! Observable change → observer (subscribed while mounted) → update_children / draw
//! Tree insert/remove → connection record → mount::settle → onmount / onunmount
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Core types (NodeId, NodeKind, Overflow, ListenerOptions)
//! - [`dom`] - Arena document: tree, scroll geometry, events, connection records
//! - [`observable`] - Observable values, derived views, change descriptors
//! - [`controller`] - Controllers, the node registry, components
//! - [`verbs`] - VirtualHolder, Repeater, Displayer, Writer
//! - [`decorators`] - Hooks and listeners for plain nodes
//! - [`mount`] - Mount driver
//! - [`scheduler`] - Animation-frame queue

pub mod controller;
pub mod decorators;
pub mod dom;
pub mod error;
pub mod mount;
pub mod observable;
pub mod scheduler;
pub mod types;
pub mod verbs;

// Re-export commonly used items
pub use types::*;

pub use error::{Error, Result};

pub use observable::{merge2, merge3, Change, Observable, ObserveOptions};

pub use controller::{
    attach, bind_to_node, controllers_of, find, fragment, render_component, Component,
    Controlled, Controller, DefaultController,
};

pub use verbs::{
    display, display_if, display_unless, repeat, repeat_observed, repeat_scroll,
    repeat_scroll_observed, write, DisplayContent, Displayer, RepeatOptions, Repeater,
    SentinelRange, Truthy, VirtualHolder, Writer,
};

pub use mount::{settle, tick, MountHandle};

pub use scheduler::{cancel_animation_frame, request_animation_frame, FrameHandle};
