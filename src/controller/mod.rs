//! Controllers - lifecycle state bound to a node.
//!
//! A [`Controller`] holds three ordered hook lists (mount, unmount, render)
//! and is bound to exactly one node. Any type that owns a controller and
//! implements [`Controlled`] can be bound; the node-to-controller table lives
//! in [`registry`].
//!
//! # Observation follows presence
//!
//! [`Controller::observe`] registers a subscription that starts when the node
//! is mounted and stops when it is unmounted:
//!
//! ```ignore
//! let ctrl = Rc::new(Controller::new());
//! ctrl.observe(&title, move |value, _| { dom::set_text(text, value).ok(); }, ObserveOptions::default());
//! bind_to_node(&ctrl, text)?;
//! mount::mount(dom::document(), text)?; // subscribes, writes the current title
//! mount::unmount(text)?;                // unsubscribes
//! ```

mod component;
mod registry;

pub use component::{fragment, render_component, Component};
pub use registry::{
    attach, bind_to_node, controllers_of, erase, find, find_on_node, has_controllers,
    reset_controllers, DefaultController,
};

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::observable::{Change, Observable, ObserveOptions};
use crate::types::{NodeId, Unsubscribe};

/// Lifecycle callback. Errors stop the remaining hooks of the same run.
pub type Hook = Rc<dyn Fn() -> Result<()>>;

/// Anything that owns a [`Controller`] and can be bound to a node.
pub trait Controlled: Any {
    fn controller(&self) -> &Controller;

    /// Called when the bound node is discarded, before the controller is
    /// erased. Components holding nodes outside their own subtree free them
    /// here.
    fn discard(&self) -> Result<()> {
        Ok(())
    }
}

/// Lifecycle state bound to one node.
#[derive(Default)]
pub struct Controller {
    node: Cell<Option<NodeId>>,
    mounted: Cell<bool>,
    onmount: RefCell<Vec<Hook>>,
    onunmount: RefCell<Vec<Hook>>,
    onrender: RefCell<Vec<Hook>>,
}

impl Controlled for Controller {
    fn controller(&self) -> &Controller {
        self
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bound node, if any.
    pub fn node(&self) -> Option<NodeId> {
        self.node.get()
    }

    /// The bound node, or [`Error::Unbound`].
    pub fn bound_node(&self) -> Result<NodeId> {
        self.node.get().ok_or(Error::Unbound)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub(crate) fn set_node(&self, node: NodeId) -> Result<()> {
        if let Some(existing) = self.node.get() {
            return Err(Error::AlreadyBound(existing));
        }
        self.node.set(Some(node));
        Ok(())
    }

    // =========================================================================
    // Hook Registration
    // =========================================================================

    /// Run `hook` on every mount. If already mounted it also runs right away.
    pub fn on_mount(&self, hook: impl Fn() -> Result<()> + 'static) -> &Self {
        let hook: Hook = Rc::new(hook);
        self.onmount.borrow_mut().push(hook.clone());
        if self.mounted.get() {
            if let Err(err) = hook() {
                tracing::error!(target: "domic", %err, "mount hook added to a mounted controller failed");
            }
        }
        self
    }

    /// Run `hook` on every unmount.
    pub fn on_unmount(&self, hook: impl Fn() -> Result<()> + 'static) -> &Self {
        self.onunmount.borrow_mut().push(Rc::new(hook));
        self
    }

    /// Run `hook` once the component's node has been rendered and bound.
    pub fn on_render(&self, hook: impl Fn() -> Result<()> + 'static) -> &Self {
        self.onrender.borrow_mut().push(Rc::new(hook));
        self
    }

    /// Observe `source` while mounted.
    ///
    /// Subscribes on every mount and unsubscribes on every unmount, so at
    /// most one subscription per call exists at any time.
    pub fn observe<T, F>(&self, source: &Observable<T>, observer: F, options: ObserveOptions) -> &Self
    where
        T: Clone + PartialEq + 'static,
        F: Fn(&T, Change) + 'static,
    {
        let active: Rc<RefCell<Option<Unsubscribe>>> = Rc::new(RefCell::new(None));
        let observer = Rc::new(observer);

        let slot = active.clone();
        let source = source.clone();
        self.on_mount(move || {
            let previous = slot.borrow_mut().take();
            if let Some(stop) = previous {
                stop();
            }
            let observer = observer.clone();
            let stop = source.subscribe(move |value, change| observer(value, change), options);
            *slot.borrow_mut() = Some(stop);
            Ok(())
        });

        self.on_unmount(move || {
            let stop = active.borrow_mut().take();
            if let Some(stop) = stop {
                stop();
            }
            Ok(())
        });

        self
    }

    /// Number of (mount, unmount, render) hooks.
    pub fn hook_counts(&self) -> (usize, usize, usize) {
        (
            self.onmount.borrow().len(),
            self.onunmount.borrow().len(),
            self.onrender.borrow().len(),
        )
    }

    // =========================================================================
    // Hook Execution
    // =========================================================================

    /// Run mount hooks in registration order. No-op when already mounted.
    pub fn run_mount(&self) -> Result<()> {
        let node = self.bound_node()?;
        if self.mounted.replace(true) {
            return Ok(());
        }
        tracing::trace!(target: "domic", %node, "mount");
        run_hooks(&self.onmount)
    }

    /// Run unmount hooks in registration order. No-op when not mounted.
    pub fn run_unmount(&self) -> Result<()> {
        let node = self.bound_node()?;
        if !self.mounted.replace(false) {
            return Ok(());
        }
        tracing::trace!(target: "domic", %node, "unmount");
        run_hooks(&self.onunmount)
    }

    /// Run render hooks in registration order.
    pub fn run_render(&self) -> Result<()> {
        self.bound_node()?;
        run_hooks(&self.onrender)
    }
}

fn run_hooks(hooks: &RefCell<Vec<Hook>>) -> Result<()> {
    // Clone out so hooks may register further hooks
    let hooks: Vec<Hook> = hooks.borrow().clone();
    for hook in hooks {
        hook()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    #[test]
    fn test_hooks_require_binding() {
        let ctrl = Controller::new();
        assert_eq!(ctrl.run_mount(), Err(Error::Unbound));
        assert_eq!(ctrl.run_render(), Err(Error::Unbound));
    }

    #[test]
    fn test_set_node_once() {
        dom::reset_document();
        let a = dom::create_element("a");
        let b = dom::create_element("b");

        let ctrl = Controller::new();
        ctrl.set_node(a).unwrap();
        assert_eq!(ctrl.set_node(b), Err(Error::AlreadyBound(a)));
        assert_eq!(ctrl.node(), Some(a));
    }

    #[test]
    fn test_hooks_alternate() {
        dom::reset_document();
        let node = dom::create_element("div");
        let ctrl = Controller::new();
        ctrl.set_node(node).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        ctrl.on_mount(move || {
            l.borrow_mut().push("mount");
            Ok(())
        });
        let l = log.clone();
        ctrl.on_unmount(move || {
            l.borrow_mut().push("unmount");
            Ok(())
        });

        ctrl.run_mount().unwrap();
        ctrl.run_mount().unwrap();
        ctrl.run_unmount().unwrap();
        ctrl.run_unmount().unwrap();
        assert_eq!(*log.borrow(), vec!["mount", "unmount"]);
    }

    #[test]
    fn test_observe_registers_matched_pair() {
        let ctrl = Controller::new();
        let obs = Observable::new(0);
        ctrl.observe(&obs, |_, _| {}, ObserveOptions::default());
        assert_eq!(ctrl.hook_counts(), (1, 1, 0));
    }

    #[test]
    fn test_observe_only_while_mounted() {
        dom::reset_document();
        let node = dom::create_element("div");
        let ctrl = Controller::new();
        ctrl.set_node(node).unwrap();

        let obs = Observable::new(0);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        ctrl.observe(&obs, move |v, _| s.borrow_mut().push(*v), ObserveOptions::default());

        obs.set(1);
        assert!(seen.borrow().is_empty());

        ctrl.run_mount().unwrap();
        obs.set(2);
        ctrl.run_unmount().unwrap();
        obs.set(3);
        ctrl.run_mount().unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_failing_hook_stops_the_run() {
        dom::reset_document();
        let node = dom::create_element("div");
        let ctrl = Controller::new();
        ctrl.set_node(node).unwrap();

        let reached = Rc::new(Cell::new(false));
        ctrl.on_mount(|| Err(Error::NoScrollContainer));
        let r = reached.clone();
        ctrl.on_mount(move || {
            r.set(true);
            Ok(())
        });

        assert_eq!(ctrl.run_mount(), Err(Error::NoScrollContainer));
        assert!(!reached.get());
        assert!(ctrl.is_mounted());
    }

    #[test]
    fn test_late_mount_hook_runs_immediately() {
        dom::reset_document();
        let node = dom::create_element("div");
        let ctrl = Controller::new();
        ctrl.set_node(node).unwrap();
        ctrl.run_mount().unwrap();

        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        ctrl.on_mount(move || {
            r.set(true);
            Ok(())
        });
        assert!(ran.get());
    }
}
