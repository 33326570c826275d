//! Node-to-controller table.
//!
//! Each node may carry any number of controllers, kept in binding order. The
//! table holds the controllers strongly; [`erase`] releases them when a node
//! is discarded.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{Controlled, Controller};
use crate::dom;
use crate::error::{Error, Result};
use crate::types::NodeId;

struct Entry {
    type_id: TypeId,
    instance: Rc<dyn Any>,
    lifecycle: Rc<dyn Controlled>,
}

thread_local! {
    static CONTROLLERS: RefCell<HashMap<NodeId, Vec<Entry>>> = RefCell::new(HashMap::new());
}

// =============================================================================
// Binding
// =============================================================================

/// Bind `controlled` to `node` and append it to the node's controllers.
///
/// A controller binds once. If the node is already connected the controller
/// is mounted right away, since no connection record will announce it.
pub fn bind_to_node<C: Controlled>(controlled: &Rc<C>, node: NodeId) -> Result<()> {
    if !dom::exists(node) {
        return Err(Error::UnknownNode(node));
    }
    controlled.controller().set_node(node)?;

    CONTROLLERS.with(|table| {
        table.borrow_mut().entry(node).or_default().push(Entry {
            type_id: TypeId::of::<C>(),
            instance: controlled.clone() as Rc<dyn Any>,
            lifecycle: controlled.clone() as Rc<dyn Controlled>,
        });
    });
    tracing::trace!(target: "domic", %node, kind = std::any::type_name::<C>(), "controller bound");

    if dom::is_connected(node) {
        controlled.controller().run_mount()?;
    }
    Ok(())
}

/// Bind several auxiliary controllers to `node`, in order.
pub fn attach<C: Controlled>(node: NodeId, controllers: impl IntoIterator<Item = Rc<C>>) -> Result<()> {
    for controlled in controllers {
        bind_to_node(&controlled, node)?;
    }
    Ok(())
}

/// Release every controller attached to `nodes`.
pub fn erase(nodes: &[NodeId]) {
    CONTROLLERS.with(|table| {
        let mut table = table.borrow_mut();
        for node in nodes {
            table.remove(node);
        }
    });
}

/// Clear the table (for testing).
pub fn reset_controllers() {
    // Take first: dropping controllers may run arbitrary drop code
    let old = CONTROLLERS.with(|table| std::mem::take(&mut *table.borrow_mut()));
    drop(old);
}

// =============================================================================
// Lookup
// =============================================================================

/// Controllers of `node`, in binding order.
pub fn controllers_of(node: NodeId) -> Vec<Rc<dyn Controlled>> {
    CONTROLLERS.with(|table| {
        table
            .borrow()
            .get(&node)
            .map(|list| list.iter().map(|e| e.lifecycle.clone()).collect())
            .unwrap_or_default()
    })
}

pub fn has_controllers(node: NodeId) -> bool {
    CONTROLLERS.with(|table| table.borrow().get(&node).is_some_and(|list| !list.is_empty()))
}

/// First controller of type `C` on `node` itself.
pub fn find_on_node<C: Controlled>(node: NodeId) -> Option<Rc<C>> {
    let instance = CONTROLLERS.with(|table| {
        table.borrow().get(&node).and_then(|list| {
            list.iter()
                .find(|e| e.type_id == TypeId::of::<C>())
                .map(|e| e.instance.clone())
        })
    })?;
    instance.downcast::<C>().ok()
}

/// Nearest controller of type `C` on `node` or one of its ancestors.
pub fn find<C: Controlled>(node: NodeId) -> Option<Rc<C>> {
    std::iter::once(node)
        .chain(dom::ancestors(node))
        .find_map(find_on_node::<C>)
}

// =============================================================================
// Default Controller
// =============================================================================

/// Controller created on demand for plain nodes (used by the decorators).
#[derive(Default)]
pub struct DefaultController {
    controller: Controller,
}

impl Controlled for DefaultController {
    fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl DefaultController {
    /// The default controller of `node`, created and bound if missing.
    pub fn get(node: NodeId) -> Result<Rc<Self>> {
        if let Some(existing) = find_on_node::<Self>(node) {
            return Ok(existing);
        }
        let created = Rc::new(Self::default());
        bind_to_node(&created, node)?;
        Ok(created)
    }
}
