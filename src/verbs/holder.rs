//! Virtual holders - components that manage content without a wrapper element.
//!
//! A holder renders to a placeholder comment. Its content lives in a
//! [`SentinelRange`] that follows the placeholder while mounted:
//!
//! ```text
//! <!-- repeat: --><!-- (( -->...<!-- )) -->
//! ```
//!
//! Mounting moves the range next to the placeholder. When the placeholder
//! leaves its parent, the range is pulled back into a fragment on the next
//! animation frame, so a remove-then-reinsert within one frame keeps the
//! content where it is.

use std::cell::Cell;
use std::rc::Rc;

use super::range::SentinelRange;
use crate::controller::{Component, Controlled, Controller};
use crate::dom;
use crate::error::{Error, Result};
use crate::mount;
use crate::scheduler::{request_animation_frame, FrameHandle};
use crate::types::NodeId;

// =============================================================================
// Holder State
// =============================================================================

pub(crate) struct HolderState {
    name: String,
    placeholder: Cell<Option<NodeId>>,
    range: Cell<Option<SentinelRange>>,
    saved: Cell<Option<NodeId>>,
    pending: Cell<Option<FrameHandle>>,
    generation: Cell<u64>,
}

impl HolderState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            placeholder: Cell::new(None),
            range: Cell::new(None),
            saved: Cell::new(None),
            pending: Cell::new(None),
            generation: Cell::new(0),
        }
    }

    fn not_rendered(&self) -> Error {
        Error::NotRendered(self.name.clone())
    }

    pub(crate) fn placeholder(&self) -> Result<NodeId> {
        self.placeholder.get().ok_or_else(|| self.not_rendered())
    }

    pub(crate) fn range(&self) -> Result<SentinelRange> {
        self.range.get().ok_or_else(|| self.not_rendered())
    }

    /// Create the placeholder and park `children` inside a fresh range.
    pub(crate) fn render(&self, children: Option<NodeId>) -> Result<NodeId> {
        let saved = dom::create_fragment();
        if let Some(children) = children {
            dom::append_child(saved, children)?;
        }
        let range = SentinelRange::new();
        range.bracket(saved)?;

        let placeholder = dom::create_comment(&format!(" {}: ", self.name));
        self.range.set(Some(range));
        self.saved.set(Some(saved));
        self.placeholder.set(Some(placeholder));
        Ok(placeholder)
    }

    /// Replace everything between the markers, wherever the range lives.
    ///
    /// Returns the removed nodes, unmounted but not freed.
    pub(crate) fn update_children(&self, node: Option<NodeId>) -> Result<Vec<NodeId>> {
        let range = self.range()?;
        let removed = range.replace(node)?;
        tracing::trace!(target: "domic", holder = %self.name, removed = removed.len(), "children replaced");
        mount::settle()?;
        Ok(removed)
    }

    fn mount(&self) -> Result<()> {
        self.generation.set(self.generation.get() + 1);
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }

        let placeholder = self.placeholder()?;
        let range = self.range()?;
        let parent = dom::parent(placeholder).ok_or(Error::Detached(placeholder))?;
        let next = dom::next_sibling(placeholder);

        if let Some(saved) = self.saved.take() {
            dom::insert_before(parent, saved, next)?;
            dom::discard(saved)?;
            tracing::debug!(target: "domic", holder = %self.name, %placeholder, "range attached");
        } else if !range.follows(placeholder) {
            range.move_before(parent, next)?;
            tracing::debug!(target: "domic", holder = %self.name, %placeholder, "range moved to placeholder");
        }
        Ok(())
    }

    fn unmount(this: &Rc<Self>) -> Result<()> {
        let placeholder = this.placeholder()?;
        if dom::parent(placeholder).is_some() {
            return Ok(());
        }
        if let Some(previous) = this.pending.take() {
            previous.cancel();
        }

        let generation = this.generation.get();
        let weak = Rc::downgrade(this);
        let handle = request_animation_frame(move || {
            let Some(state) = weak.upgrade() else { return };
            state.pending.set(None);
            if let Err(err) = state.extract(generation) {
                tracing::error!(target: "domic", holder = %state.name, %err, "failed to extract range");
            }
        });
        this.pending.set(Some(handle));
        Ok(())
    }

    fn extract(&self, generation: u64) -> Result<()> {
        if self.generation.get() != generation || self.saved.get().is_some() {
            return Ok(());
        }
        let placeholder = self.placeholder()?;
        if dom::parent(placeholder).is_some() {
            return Ok(());
        }
        let fragment = self.range()?.extract()?;
        self.saved.set(Some(fragment));
        tracing::debug!(target: "domic", holder = %self.name, "range extracted");
        Ok(())
    }

    /// Free the range along with its content. Called once the placeholder
    /// is gone for good.
    fn discard(&self) -> Result<()> {
        self.generation.set(self.generation.get() + 1);
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        let Some(range) = self.range.get() else {
            return Ok(());
        };
        // Freed already when the range sat inside the discarded subtree
        if !dom::exists(range.begin()) {
            self.saved.set(None);
            return Ok(());
        }
        let container = match self.saved.take() {
            Some(saved) => saved,
            None => range.extract()?,
        };
        tracing::debug!(target: "domic", holder = %self.name, "range discarded");
        mount::discard(container)
    }

    pub(crate) fn saved(&self) -> Option<NodeId> {
        self.saved.get()
    }

    pub(crate) fn is_attached(&self) -> bool {
        self.saved.get().is_none() && self.placeholder.get().is_some()
    }
}

// =============================================================================
// VirtualHolder
// =============================================================================

/// Component owning a sentinel range next to its placeholder.
pub struct VirtualHolder {
    controller: Controller,
    state: Rc<HolderState>,
}

impl VirtualHolder {
    /// A holder whose placeholder reads ` {name}: `.
    pub fn new(name: &str) -> Self {
        let state = Rc::new(HolderState::new(name));
        let controller = Controller::new();

        let s = state.clone();
        controller.on_mount(move || s.mount());
        let s = state.clone();
        controller.on_unmount(move || HolderState::unmount(&s));

        Self { controller, state }
    }

    pub(crate) fn state(&self) -> &Rc<HolderState> {
        &self.state
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn placeholder(&self) -> Result<NodeId> {
        self.state.placeholder()
    }

    pub fn range(&self) -> Result<SentinelRange> {
        self.state.range()
    }

    /// Managed nodes between the markers.
    pub fn contents(&self) -> Result<Vec<NodeId>> {
        self.state.range()?.contents()
    }

    /// The fragment holding the range while away from the placeholder.
    pub fn saved_children(&self) -> Option<NodeId> {
        self.state.saved()
    }

    /// Whether the range has been placed next to the placeholder.
    pub fn is_attached(&self) -> bool {
        self.state.is_attached()
    }

    /// Replace the managed content with `node`, or clear it.
    ///
    /// The previous content is detached and left to the caller.
    pub fn update_children(&self, node: Option<NodeId>) -> Result<()> {
        self.state.update_children(node).map(|_| ())
    }
}

impl Controlled for VirtualHolder {
    fn controller(&self) -> &Controller {
        &self.controller
    }

    fn discard(&self) -> Result<()> {
        self.state.discard()
    }
}

impl Component for VirtualHolder {
    fn render(self: Rc<Self>, children: Option<NodeId>) -> Result<NodeId> {
        self.state.render(children)
    }
}
