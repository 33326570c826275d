//! Displayer - shows one of two contents depending on a condition.
//!
//! The condition, the display content and the fallback are merged into one
//! observable; any change recomputes what sits in the holder's range.
//!
//! Nodes built by a `Render` content belong to the displayer and are discarded
//! once they leave the range. A `Node` content stays owned by the caller.
//!
//! ```ignore
//! let logged_in = Observable::new(false);
//! let node = display_if(
//!     &logged_in,
//!     Observable::constant(DisplayContent::render(|_: &bool| dom::create_text("welcome back"))),
//!     Some(Observable::constant(DisplayContent::node(login_form))),
//! )?;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::holder::{HolderState, VirtualHolder};
use crate::controller::{render_component, Component, Controlled, Controller};
use crate::dom;
use crate::error::Result;
use crate::mount;
use crate::observable::{merge3, Observable, ObserveOptions};
use crate::types::{NodeId, NodeKind};

// =============================================================================
// Truthiness
// =============================================================================

/// Whether a condition value counts as "on".
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for () {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl<T> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.is_some()
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for &str {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

macro_rules! truthy_int {
    ($($t:ty),*) => {
        $(impl Truthy for $t {
            fn is_truthy(&self) -> bool {
                *self != 0
            }
        })*
    };
}

truthy_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

// =============================================================================
// Display Content
// =============================================================================

/// What a displayer shows: a node built from the condition value, or a fixed node.
pub enum DisplayContent<C> {
    Render(Rc<dyn Fn(&C) -> NodeId>),
    Node(NodeId),
}

impl<C> DisplayContent<C> {
    pub fn render(f: impl Fn(&C) -> NodeId + 'static) -> Self {
        Self::Render(Rc::new(f))
    }

    pub fn node(node: NodeId) -> Self {
        Self::Node(node)
    }

    /// The node to show, and whether it was built here.
    fn resolve(&self, condition: &C) -> (NodeId, bool) {
        match self {
            Self::Render(f) => (f(condition), true),
            Self::Node(node) => (*node, false),
        }
    }
}

impl<C> Clone for DisplayContent<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Render(f) => Self::Render(f.clone()),
            Self::Node(node) => Self::Node(*node),
        }
    }
}

impl<C> PartialEq for DisplayContent<C> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Render(a), Self::Render(b)) => Rc::ptr_eq(a, b),
            (Self::Node(a), Self::Node(b)) => a == b,
            _ => false,
        }
    }
}

impl<C> From<NodeId> for DisplayContent<C> {
    fn from(node: NodeId) -> Self {
        Self::Node(node)
    }
}

impl<C> std::fmt::Debug for DisplayContent<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(_) => f.write_str("Render(..)"),
            Self::Node(node) => write!(f, "Node({node})"),
        }
    }
}

// =============================================================================
// Displayer
// =============================================================================

pub struct Displayer<C: Truthy + Clone + PartialEq + 'static> {
    holder: VirtualHolder,
    condition: Observable<C>,
    has_condition: bool,
    display: Observable<DisplayContent<C>>,
    otherwise: Observable<Option<DisplayContent<C>>>,
}

impl Displayer<()> {
    /// Always show `display`.
    pub fn always(display: Observable<DisplayContent<()>>) -> Self {
        Self::build(Observable::constant(()), false, display, None)
    }
}

impl<C: Truthy + Clone + PartialEq + 'static> Displayer<C> {
    /// Show `display` while `condition` is truthy, `otherwise` (or nothing) else.
    pub fn when(
        condition: Observable<C>,
        display: Observable<DisplayContent<C>>,
        otherwise: Option<Observable<DisplayContent<C>>>,
    ) -> Self {
        Self::build(condition, true, display, otherwise)
    }

    fn build(
        condition: Observable<C>,
        has_condition: bool,
        display: Observable<DisplayContent<C>>,
        otherwise: Option<Observable<DisplayContent<C>>>,
    ) -> Self {
        let otherwise = match otherwise {
            Some(otherwise) => otherwise.map(|content| Some(content.clone())),
            None => Observable::constant(None),
        };
        Self {
            holder: VirtualHolder::new("display"),
            condition,
            has_condition,
            display,
            otherwise,
        }
    }

    pub fn holder(&self) -> &VirtualHolder {
        &self.holder
    }

    /// The content the current inputs select, resolved to a node.
    fn select(
        has_condition: bool,
        condition: &C,
        display: &DisplayContent<C>,
        otherwise: &Option<DisplayContent<C>>,
    ) -> Option<(NodeId, bool)> {
        if has_condition && !condition.is_truthy() {
            otherwise.as_ref().map(|content| content.resolve(condition))
        } else {
            Some(display.resolve(condition))
        }
    }

    /// Swap the selected node into the range and free the built nodes it replaced.
    fn show(
        holder: &HolderState,
        built: &RefCell<Vec<NodeId>>,
        selected: Option<(NodeId, bool)>,
    ) -> Result<()> {
        let removed = holder.update_children(selected.map(|(node, _)| node))?;
        let previous = built.take();
        // a render function may hand back the node it built last time
        let stale: Vec<NodeId> = removed
            .into_iter()
            .filter(|node| previous.contains(node) && dom::parent(*node).is_none())
            .collect();
        mount::discard_all(&stale)?;

        if let Some((node, true)) = selected {
            // a rendered fragment is empty once its children moved into the range
            if dom::kind(node)? == NodeKind::Fragment {
                dom::discard(node)?;
            }
            *built.borrow_mut() = holder.range()?.contents()?;
        }
        Ok(())
    }
}

impl<C: Truthy + Clone + PartialEq + 'static> Controlled for Displayer<C> {
    fn controller(&self) -> &Controller {
        self.holder.controller()
    }

    fn discard(&self) -> Result<()> {
        self.holder.discard()
    }
}

impl<C: Truthy + Clone + PartialEq + 'static> Component for Displayer<C> {
    fn render(self: Rc<Self>, children: Option<NodeId>) -> Result<NodeId> {
        let inputs = merge3(&self.condition, &self.display, &self.otherwise);
        let holder = self.holder.state().clone();
        let has_condition = self.has_condition;
        let built = RefCell::new(Vec::new());

        self.controller().observe(
            &inputs,
            move |(condition, display, otherwise), change| {
                if !change.value_changed() {
                    return;
                }
                let selected = Self::select(has_condition, condition, display, otherwise);
                if let Err(err) = Self::show(&holder, &built, selected) {
                    tracing::error!(target: "domic", %err, "display update failed");
                }
            },
            ObserveOptions::default(),
        );

        self.holder.state().render(children)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Show `display` unconditionally.
pub fn display(display: Observable<DisplayContent<()>>) -> Result<NodeId> {
    render_component(&Rc::new(Displayer::always(display)), None)
}

/// Show `display` while `condition` is truthy, else `otherwise`.
pub fn display_if<C>(
    condition: &Observable<C>,
    display: Observable<DisplayContent<C>>,
    otherwise: Option<Observable<DisplayContent<C>>>,
) -> Result<NodeId>
where
    C: Truthy + Clone + PartialEq + 'static,
{
    render_component(&Rc::new(Displayer::when(condition.clone(), display, otherwise)), None)
}

/// Show `display` while `condition` is falsy, else `otherwise`.
///
/// Render functions receive the negated condition.
pub fn display_unless<C>(
    condition: &Observable<C>,
    display: Observable<DisplayContent<bool>>,
    otherwise: Option<Observable<DisplayContent<bool>>>,
) -> Result<NodeId>
where
    C: Truthy + Clone + PartialEq + 'static,
{
    let negated = condition.map(|value| !value.is_truthy());
    render_component(&Rc::new(Displayer::when(negated, display, otherwise)), None)
}
