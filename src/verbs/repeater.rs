//! Repeater - renders one node per item of an observable sequence.
//!
//! Items are rendered lazily and appended in order. Each item is preceded by
//! a position marker comment so the list can be cut at any index:
//!
//! ```text
//! <!-- (( --><!--repeat-0--><li>a</li><!--repeat-1--><li>b</li><!-- )) -->
//! ```
//!
//! When the sequence changes, rendered items that still match the new
//! sequence stay; the list grows or shrinks at the tail. A sequence that
//! disagrees with what has been rendered is rebuilt from scratch.
//!
//! With [`RepeatOptions::scroll`], items are rendered in batches while the
//! nearest `overflow-y: auto` ancestor is less than [`SCROLL_THRESHOLD`]
//! pixels from its bottom, and again on every scroll event.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::holder::{HolderState, VirtualHolder};
use super::range::SentinelRange;
use crate::controller::{render_component, Component, Controlled, Controller};
use crate::dom::{self, ListenerId};
use crate::error::{Error, Result};
use crate::mount;
use crate::observable::{Change, Observable, ObserveOptions};
use crate::types::{ListenerOptions, NodeId, NodeKind, Overflow};

/// Distance from the bottom of the scroll container, in pixels, below which
/// more items are rendered.
pub const SCROLL_THRESHOLD: f64 = 500.0;

/// Items rendered per batch in scroll mode.
pub const DEFAULT_SCROLL_BUFFER_SIZE: usize = 10;

// =============================================================================
// Options
// =============================================================================

/// Rendering options for a [`Repeater`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatOptions {
    /// Render in batches driven by the scroll container.
    pub scroll: bool,
    /// Items per batch in scroll mode.
    pub scroll_buffer_size: usize,
}

impl Default for RepeatOptions {
    fn default() -> Self {
        Self {
            scroll: false,
            scroll_buffer_size: DEFAULT_SCROLL_BUFFER_SIZE,
        }
    }
}

impl RepeatOptions {
    /// Scroll mode with the default batch size.
    pub fn scrolling() -> Self {
        Self {
            scroll: true,
            ..Self::default()
        }
    }

    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.scroll_buffer_size = size;
        self
    }
}

/// How an item is turned into a node.
pub enum RenderItem<T: Clone + PartialEq + 'static> {
    /// Receives the item value.
    Value(Rc<dyn Fn(&T, usize) -> NodeId>),
    /// Receives a two-way view of the item slot in the source sequence.
    Observed(Rc<dyn Fn(Observable<Option<T>>, usize) -> NodeId>),
}

impl<T: Clone + PartialEq + 'static> Clone for RenderItem<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Value(f) => Self::Value(f.clone()),
            Self::Observed(f) => Self::Observed(f.clone()),
        }
    }
}

// =============================================================================
// Repeat State
// =============================================================================

struct RepeatState<T: Clone + PartialEq + 'static> {
    holder: Rc<HolderState>,
    source: Observable<Vec<T>>,
    render: RenderItem<T>,
    options: RepeatOptions,
    lst: RefCell<Vec<T>>,
    positions: RefCell<Vec<NodeId>>,
    scroll_parent: Cell<Option<NodeId>>,
    listener: Cell<Option<ListenerId>>,
}

impl<T: Clone + PartialEq + 'static> RepeatState<T> {
    fn reset(&self, lst: Vec<T>) -> Result<()> {
        *self.lst.borrow_mut() = lst;
        self.positions.borrow_mut().clear();
        let removed = self.holder.update_children(None)?;
        mount::discard_all(&removed)
    }

    /// Render the next unrendered item. Returns its marker and node.
    fn render_next(&self) -> Option<(NodeId, NodeId)> {
        let index = self.positions.borrow().len();
        let item = self.lst.borrow().get(index).cloned()?;

        let marker = dom::create_comment(&format!("repeat-{index}"));
        self.positions.borrow_mut().push(marker);

        // No borrow held: the render function may read the source
        let node = match &self.render {
            RenderItem::Value(render) => render(&item, index),
            RenderItem::Observed(render) => render(self.source.item(index), index),
        };
        Some((marker, node))
    }

    /// Append the next item with its marker to `container`. False when done.
    fn append_next(&self, container: NodeId) -> Result<bool> {
        let Some((marker, node)) = self.render_next() else {
            return Ok(false);
        };
        dom::append_child(container, marker)?;
        dom::append_child(container, node)?;
        if dom::kind(node)? == NodeKind::Fragment {
            dom::discard(node)?;
        }
        Ok(true)
    }

    /// Render the next unrendered item into a fragment with its marker.
    fn next(&self) -> Result<Option<NodeId>> {
        let fragment = dom::create_fragment();
        if self.append_next(fragment)? {
            Ok(Some(fragment))
        } else {
            dom::discard(fragment)?;
            Ok(None)
        }
    }

    /// Move a batch into the range and free its fragment.
    fn flush_batch(range: SentinelRange, batch: NodeId) -> Result<()> {
        range.insert_before_end(batch)?;
        dom::discard(batch)?;
        Ok(())
    }

    /// Bring the rendered items in line with the snapshot. Returns items added.
    fn draw(&self) -> Result<usize> {
        let placeholder = self.holder.placeholder()?;
        if dom::parent(placeholder).is_none() {
            return Ok(0);
        }
        let range = self.holder.range()?;

        let rendered = self.positions.borrow().len();
        let total = self.lst.borrow().len();

        if total < rendered {
            let start = self.positions.borrow()[total];
            let removed = range.remove_from(start)?;
            self.positions.borrow_mut().truncate(total);
            tracing::trace!(target: "domic", removed = rendered - total, "repeat shrunk");
            mount::settle()?;
            mount::discard_all(&removed)?;
            return Ok(0);
        }
        if total == rendered {
            return Ok(0);
        }

        let added = if self.options.scroll {
            self.draw_batches(range)?
        } else {
            let fragment = dom::create_fragment();
            let mut added = 0;
            while self.append_next(fragment)? {
                added += 1;
            }
            Self::flush_batch(range, fragment)?;
            added
        };
        tracing::trace!(target: "domic", added, "repeat grew");
        mount::settle()?;
        Ok(added)
    }

    fn draw_batches(&self, range: SentinelRange) -> Result<usize> {
        let Some(container) = self.scroll_parent.get() else {
            return Ok(0);
        };
        let batch = self.options.scroll_buffer_size.max(1);

        let mut added = 0;
        while dom::distance_to_bottom(container) < SCROLL_THRESHOLD {
            let fragment = dom::create_fragment();
            let mut count = 0;
            let mut exhausted = false;
            while count < batch {
                if !self.append_next(fragment)? {
                    exhausted = true;
                    break;
                }
                count += 1;
            }
            Self::flush_batch(range, fragment)?;
            added += count;
            if exhausted {
                break;
            }
        }
        Ok(added)
    }

    fn on_sequence(&self, list: &[T], change: Change) -> Result<()> {
        if !change.value_changed() {
            return Ok(());
        }
        let keeps_rendered = {
            let lst = self.lst.borrow();
            let keep = self.positions.borrow().len().min(list.len());
            lst[..keep] == list[..keep]
        };

        if keeps_rendered {
            *self.lst.borrow_mut() = list.to_vec();
            if change.is_initial() {
                self.draw()?;
            }
        } else {
            tracing::debug!(target: "domic", len = list.len(), "sequence replaced, rebuilding");
            self.reset(list.to_vec())?;
            self.draw()?;
        }
        Ok(())
    }

    fn setup_scrolling(this: &Rc<Self>) -> Result<()> {
        if !this.options.scroll {
            return Ok(());
        }
        let placeholder = this.holder.placeholder()?;
        let container = dom::ancestors(placeholder)
            .into_iter()
            .find(|&node| {
                matches!(dom::kind(node), Ok(NodeKind::Element(_)))
                    && dom::overflow_y(node) == Overflow::Auto
            })
            .ok_or(Error::NoScrollContainer)?;

        let weak = Rc::downgrade(this);
        let listener = dom::add_event_listener(
            container,
            "scroll",
            move |_| {
                let Some(state) = weak.upgrade() else { return };
                if let Err(err) = state.draw() {
                    tracing::error!(target: "domic", %err, "scroll draw failed");
                }
            },
            ListenerOptions::PASSIVE,
        )?;
        this.scroll_parent.set(Some(container));
        this.listener.set(Some(listener));
        tracing::debug!(target: "domic", %container, "scroll container attached");
        Ok(())
    }

    fn teardown_scrolling(&self) {
        if let (Some(container), Some(listener)) = (self.scroll_parent.take(), self.listener.take()) {
            dom::remove_event_listener(container, listener);
        }
    }
}

// =============================================================================
// Repeater
// =============================================================================

/// Component rendering a node per item of `Observable<Vec<T>>`.
pub struct Repeater<T: Clone + PartialEq + 'static> {
    holder: VirtualHolder,
    state: Rc<RepeatState<T>>,
}

impl<T: Clone + PartialEq + 'static> Repeater<T> {
    /// Render each item from its value.
    pub fn new<F>(source: Observable<Vec<T>>, render: F, options: RepeatOptions) -> Self
    where
        F: Fn(&T, usize) -> NodeId + 'static,
    {
        Self::with_render(source, RenderItem::Value(Rc::new(render)), options)
    }

    /// Render each item from a two-way view of its slot.
    pub fn observed<F>(source: Observable<Vec<T>>, render: F, options: RepeatOptions) -> Self
    where
        F: Fn(Observable<Option<T>>, usize) -> NodeId + 'static,
    {
        Self::with_render(source, RenderItem::Observed(Rc::new(render)), options)
    }

    pub fn with_render(source: Observable<Vec<T>>, render: RenderItem<T>, options: RepeatOptions) -> Self {
        let holder = VirtualHolder::new("repeat");
        let state = Rc::new(RepeatState {
            holder: holder.state().clone(),
            source,
            render,
            options,
            lst: RefCell::new(Vec::new()),
            positions: RefCell::new(Vec::new()),
            scroll_parent: Cell::new(None),
            listener: Cell::new(None),
        });

        // After the holder's own hooks: the range must be in place first
        let s = state.clone();
        holder.controller().on_mount(move || RepeatState::setup_scrolling(&s));
        let s = state.clone();
        holder.controller().on_unmount(move || {
            s.teardown_scrolling();
            Ok(())
        });

        Self { holder, state }
    }

    /// Replace the snapshot and drop every rendered item.
    pub fn reset(&self, lst: Vec<T>) -> Result<()> {
        self.state.reset(lst)
    }

    /// Render the next item, or `None` when all are rendered.
    pub fn next(&self) -> Result<Option<NodeId>> {
        self.state.next()
    }

    /// Grow or shrink the rendered items to match the snapshot.
    pub fn draw(&self) -> Result<usize> {
        self.state.draw()
    }

    /// Index of the last rendered item.
    pub fn index(&self) -> Option<usize> {
        self.state.positions.borrow().len().checked_sub(1)
    }

    pub fn rendered_count(&self) -> usize {
        self.state.positions.borrow().len()
    }

    /// Position marker comments, one per rendered item.
    pub fn positions(&self) -> Vec<NodeId> {
        self.state.positions.borrow().clone()
    }

    /// The sequence as last seen.
    pub fn snapshot(&self) -> Vec<T> {
        self.state.lst.borrow().clone()
    }

    pub fn options(&self) -> RepeatOptions {
        self.state.options
    }

    /// The scroll container found on mount (scroll mode only).
    pub fn scroll_container(&self) -> Option<NodeId> {
        self.state.scroll_parent.get()
    }

    pub fn holder(&self) -> &VirtualHolder {
        &self.holder
    }
}

impl<T: Clone + PartialEq + 'static> Controlled for Repeater<T> {
    fn controller(&self) -> &Controller {
        self.holder.controller()
    }

    fn discard(&self) -> Result<()> {
        self.state.positions.borrow_mut().clear();
        self.holder.discard()
    }
}

impl<T: Clone + PartialEq + 'static> Component for Repeater<T> {
    fn render(self: Rc<Self>, children: Option<NodeId>) -> Result<NodeId> {
        let s = self.state.clone();
        self.controller().observe(
            &self.state.source,
            move |list, change| {
                if let Err(err) = s.on_sequence(list, change) {
                    tracing::error!(target: "domic", %err, "repeat update failed");
                }
            },
            ObserveOptions::default(),
        );

        let s = self.state.clone();
        self.controller().observe(
            &self.state.source.length(),
            move |_, change| {
                if !change.value_changed() {
                    return;
                }
                if let Err(err) = s.draw() {
                    tracing::error!(target: "domic", %err, "repeat draw failed");
                }
            },
            ObserveOptions::updates_only(),
        );

        self.holder.state().render(children)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Repeat `render` over `source`, returning the placeholder.
pub fn repeat<T, F>(source: &Observable<Vec<T>>, render: F) -> Result<NodeId>
where
    T: Clone + PartialEq + 'static,
    F: Fn(&T, usize) -> NodeId + 'static,
{
    let repeater = Rc::new(Repeater::new(source.clone(), render, RepeatOptions::default()));
    render_component(&repeater, None)
}

/// Like [`repeat`], but `render` gets a two-way view of each item.
pub fn repeat_observed<T, F>(source: &Observable<Vec<T>>, render: F) -> Result<NodeId>
where
    T: Clone + PartialEq + 'static,
    F: Fn(Observable<Option<T>>, usize) -> NodeId + 'static,
{
    let repeater = Rc::new(Repeater::observed(source.clone(), render, RepeatOptions::default()));
    render_component(&repeater, None)
}

/// Scroll-driven [`repeat`]. `buffer_size` defaults to [`DEFAULT_SCROLL_BUFFER_SIZE`].
pub fn repeat_scroll<T, F>(source: &Observable<Vec<T>>, render: F, buffer_size: Option<usize>) -> Result<NodeId>
where
    T: Clone + PartialEq + 'static,
    F: Fn(&T, usize) -> NodeId + 'static,
{
    let options = RepeatOptions::scrolling().with_buffer_size(buffer_size.unwrap_or(DEFAULT_SCROLL_BUFFER_SIZE));
    let repeater = Rc::new(Repeater::new(source.clone(), render, options));
    render_component(&repeater, None)
}

/// Scroll-driven [`repeat_observed`].
pub fn repeat_scroll_observed<T, F>(
    source: &Observable<Vec<T>>,
    render: F,
    buffer_size: Option<usize>,
) -> Result<NodeId>
where
    T: Clone + PartialEq + 'static,
    F: Fn(Observable<Option<T>>, usize) -> NodeId + 'static,
{
    let options = RepeatOptions::scrolling().with_buffer_size(buffer_size.unwrap_or(DEFAULT_SCROLL_BUFFER_SIZE));
    let repeater = Rc::new(Repeater::observed(source.clone(), render, options));
    render_component(&repeater, None)
}
