//! Decorators - lifecycle hooks, observation and listeners for plain nodes.
//!
//! Hooks go through the node's [`DefaultController`], created on first use.
//!
//! ```ignore
//! let badge = dom::create_element("span");
//! decorators::observe(badge, &unread, |node, count, _| {
//!     dom::set_text(dom::first_child(node).unwrap_or(node), &count.to_string()).ok();
//! }, ObserveOptions::default())?;
//! decorators::on(badge, "click", |_| println!("clicked"), ListenerOptions::NONE)?;
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::{Controlled, DefaultController};
use crate::dom::{self, Event, ListenerId};
use crate::error::Result;
use crate::observable::{Change, Observable, ObserveOptions};
use crate::types::{ListenerOptions, NodeId};

/// Run `f` every time `node` is mounted.
pub fn on_mount(node: NodeId, f: impl Fn(NodeId) -> Result<()> + 'static) -> Result<()> {
    DefaultController::get(node)?.controller().on_mount(move || f(node));
    Ok(())
}

/// Run `f` the first time `node` is mounted only.
pub fn on_first_mount(node: NodeId, f: impl FnOnce(NodeId) -> Result<()> + 'static) -> Result<()> {
    let once = RefCell::new(Some(f));
    DefaultController::get(node)?.controller().on_mount(move || {
        let f = once.borrow_mut().take();
        match f {
            Some(f) => f(node),
            None => Ok(()),
        }
    });
    Ok(())
}

/// Run `f` every time `node` is unmounted.
pub fn on_unmount(node: NodeId, f: impl Fn(NodeId) -> Result<()> + 'static) -> Result<()> {
    DefaultController::get(node)?.controller().on_unmount(move || f(node));
    Ok(())
}

/// Add `f` to the render hooks of `node`.
///
/// A plain node is rendered already, so `f` also runs right away. It runs
/// again each time the node's render hooks run.
pub fn on_render(node: NodeId, f: impl Fn(NodeId) -> Result<()> + 'static) -> Result<()> {
    let f = Rc::new(f);
    let hook = f.clone();
    DefaultController::get(node)?.controller().on_render(move || hook(node));
    f(node)
}

/// Observe `source` while `node` is mounted.
pub fn observe<T>(
    node: NodeId,
    source: &Observable<T>,
    observer: impl Fn(NodeId, &T, Change) + 'static,
    options: ObserveOptions,
) -> Result<()>
where
    T: Clone + PartialEq + 'static,
{
    DefaultController::get(node)?
        .controller()
        .observe(source, move |value, change| observer(node, value, change), options);
    Ok(())
}

/// Listen for `event` on `node`.
pub fn on(
    node: NodeId,
    event: &str,
    handler: impl Fn(&Event) + 'static,
    options: ListenerOptions,
) -> Result<ListenerId> {
    dom::add_event_listener(node, event, handler, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::mount;
    use std::cell::Cell;

    #[test]
    fn test_mount_hooks() {
        mount::reset();
        let node = dom::create_element("div");
        let mounts = Rc::new(Cell::new(0));
        let firsts = Rc::new(Cell::new(0));
        let unmounts = Rc::new(Cell::new(0));

        let m = mounts.clone();
        on_mount(node, move |_| {
            m.set(m.get() + 1);
            Ok(())
        })
        .unwrap();
        let f = firsts.clone();
        on_first_mount(node, move |_| {
            f.set(f.get() + 1);
            Ok(())
        })
        .unwrap();
        let u = unmounts.clone();
        on_unmount(node, move |_| {
            u.set(u.get() + 1);
            Ok(())
        })
        .unwrap();

        for _ in 0..2 {
            mount::mount(dom::document(), node).unwrap();
            mount::unmount(node).unwrap();
        }
        assert_eq!((mounts.get(), firsts.get(), unmounts.get()), (2, 1, 2));
    }

    #[test]
    fn test_observe_follows_presence() {
        mount::reset();
        let node = dom::create_text("");
        let value = Observable::new("a".to_string());
        observe(
            node,
            &value,
            |node, v, _| {
                dom::set_text(node, v).unwrap();
            },
            ObserveOptions::default(),
        )
        .unwrap();

        mount::mount(dom::document(), node).unwrap();
        assert_eq!(dom::text(node).unwrap(), "a");

        mount::unmount(node).unwrap();
        value.set("b".into());
        assert_eq!(dom::text(node).unwrap(), "a");

        mount::mount(dom::document(), node).unwrap();
        assert_eq!(dom::text(node).unwrap(), "b");
    }

    #[test]
    fn test_hook_on_connected_node_runs_now() {
        mount::reset();
        let node = dom::create_element("div");
        mount::mount(dom::document(), node).unwrap();

        let ran = Rc::new(Cell::new(false));
        let r = ran.clone();
        on_mount(node, move |_| {
            r.set(true);
            Ok(())
        })
        .unwrap();
        assert!(ran.get());
    }

    #[test]
    fn test_on_render_registers_hook() {
        mount::reset();
        let node = dom::create_element("div");
        let runs = Rc::new(Cell::new(0));
        let r = runs.clone();
        on_render(node, move |_| {
            r.set(r.get() + 1);
            Ok(())
        })
        .unwrap();
        assert_eq!(runs.get(), 1);

        let ctrl = DefaultController::get(node).unwrap();
        assert_eq!(ctrl.controller().hook_counts(), (0, 0, 1));
        ctrl.controller().run_render().unwrap();
        assert_eq!(runs.get(), 2);

        let gone = dom::create_element("p");
        mount::discard(gone).unwrap();
        assert_eq!(on_render(gone, |_| Ok(())), Err(Error::UnknownNode(gone)));
    }

    #[test]
    fn test_on_attaches_listener() {
        mount::reset();
        let node = dom::create_element("button");
        let clicks = Rc::new(Cell::new(0));
        let c = clicks.clone();
        on(node, "click", move |_| c.set(c.get() + 1), ListenerOptions::NONE).unwrap();

        dom::dispatch_event(node, "click").unwrap();
        assert_eq!(clicks.get(), 1);
    }
}
