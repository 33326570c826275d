//! Event listeners.
//!
//! Listeners live in a side table keyed by node. Dispatch targets a single
//! node: listeners registered with `CAPTURE` run first, then the rest, each
//! group in registration order. No borrow is held while a listener runs, so a
//! listener may add or remove listeners or mutate the tree.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::types::{ListenerOptions, NodeId};

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
}

/// Listener callback (Rc so dispatch can clone it out of the table).
pub type Listener = Rc<dyn Fn(&Event)>;

struct Registered {
    id: ListenerId,
    event: String,
    handler: Listener,
    options: ListenerOptions,
}

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    by_node: HashMap<NodeId, Vec<Registered>>,
}

thread_local! {
    static LISTENERS: RefCell<ListenerTable> = RefCell::new(ListenerTable::default());
}

/// Register a listener for `event` on `node`.
pub fn add_event_listener<F>(
    node: NodeId,
    event: &str,
    handler: F,
    options: ListenerOptions,
) -> Result<ListenerId>
where
    F: Fn(&Event) + 'static,
{
    if !super::exists(node) {
        return Err(Error::UnknownNode(node));
    }
    Ok(LISTENERS.with(|table| {
        let mut table = table.borrow_mut();
        let id = ListenerId(table.next_id);
        table.next_id += 1;
        table.by_node.entry(node).or_default().push(Registered {
            id,
            event: event.to_string(),
            handler: Rc::new(handler),
            options,
        });
        id
    }))
}

/// Remove a listener. Returns false if it was not registered on `node`.
pub fn remove_event_listener(node: NodeId, id: ListenerId) -> bool {
    LISTENERS.with(|table| {
        let mut table = table.borrow_mut();
        let Some(list) = table.by_node.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|l| l.id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            table.by_node.remove(&node);
        }
        removed
    })
}

fn is_registered(node: NodeId, id: ListenerId) -> bool {
    LISTENERS.with(|table| {
        table
            .borrow()
            .by_node
            .get(&node)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    })
}

/// Number of listeners for `event` on `node`.
pub fn listener_count(node: NodeId, event: &str) -> usize {
    LISTENERS.with(|table| {
        table
            .borrow()
            .by_node
            .get(&node)
            .map(|list| list.iter().filter(|l| l.event == event).count())
            .unwrap_or(0)
    })
}

/// Deliver `event` to the listeners of `target`. Returns how many ran.
pub fn dispatch_event(target: NodeId, event: &str) -> Result<usize> {
    if !super::exists(target) {
        return Err(Error::UnknownNode(target));
    }

    let mut matching: Vec<(ListenerId, Listener, ListenerOptions)> = LISTENERS.with(|table| {
        table
            .borrow()
            .by_node
            .get(&target)
            .map(|list| {
                list.iter()
                    .filter(|l| l.event == event)
                    .map(|l| (l.id, l.handler.clone(), l.options))
                    .collect()
            })
            .unwrap_or_default()
    });
    // Stable: keeps registration order inside each group.
    matching.sort_by_key(|(_, _, options)| !options.contains(ListenerOptions::CAPTURE));

    let payload = Event {
        name: event.to_string(),
        target,
    };
    let mut ran = 0;
    for (id, handler, options) in matching {
        if !is_registered(target, id) {
            continue;
        }
        if options.contains(ListenerOptions::ONCE) {
            remove_event_listener(target, id);
        }
        handler(&payload);
        ran += 1;
    }
    Ok(ran)
}

pub(super) fn clear_listeners(node: NodeId) {
    LISTENERS.with(|table| {
        table.borrow_mut().by_node.remove(&node);
    });
}

pub(super) fn reset_listeners() {
    LISTENERS.with(|table| *table.borrow_mut() = ListenerTable::default());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{create_element, reset_document};
    use std::cell::Cell;

    #[test]
    fn test_dispatch_order_capture_first() {
        reset_document();

        let node = create_element("div");
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        add_event_listener(node, "scroll", move |_| l1.borrow_mut().push("bubble"), ListenerOptions::NONE).unwrap();
        let l2 = log.clone();
        add_event_listener(node, "scroll", move |_| l2.borrow_mut().push("capture"), ListenerOptions::CAPTURE).unwrap();

        assert_eq!(dispatch_event(node, "scroll").unwrap(), 2);
        assert_eq!(*log.borrow(), vec!["capture", "bubble"]);
    }

    #[test]
    fn test_once_listener() {
        reset_document();

        let node = create_element("div");
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        add_event_listener(node, "click", move |_| c.set(c.get() + 1), ListenerOptions::ONCE).unwrap();

        dispatch_event(node, "click").unwrap();
        dispatch_event(node, "click").unwrap();
        assert_eq!(count.get(), 1);
        assert_eq!(listener_count(node, "click"), 0);
    }

    #[test]
    fn test_remove_listener() {
        reset_document();

        let node = create_element("div");
        let id = add_event_listener(node, "click", |_| {}, ListenerOptions::NONE).unwrap();
        assert!(remove_event_listener(node, id));
        assert!(!remove_event_listener(node, id));
        assert_eq!(dispatch_event(node, "click").unwrap(), 0);
    }

    #[test]
    fn test_listener_removed_during_dispatch_is_skipped() {
        reset_document();

        let node = create_element("div");
        let second_ran = Rc::new(Cell::new(false));
        let victim: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));

        let v = victim.clone();
        add_event_listener(
            node,
            "click",
            move |ev| {
                if let Some(id) = v.get() {
                    remove_event_listener(ev.target, id);
                }
            },
            ListenerOptions::NONE,
        )
        .unwrap();
        let s = second_ran.clone();
        let id = add_event_listener(node, "click", move |_| s.set(true), ListenerOptions::NONE).unwrap();
        victim.set(Some(id));

        assert_eq!(dispatch_event(node, "click").unwrap(), 1);
        assert!(!second_ran.get());
    }
}
