//! Components - controllers that produce their own node.

use std::rc::Rc;

use super::{bind_to_node, Controlled};
use crate::dom;
use crate::error::Result;
use crate::types::NodeId;

/// A controller that renders a node.
///
/// `render` registers hooks and returns the node the component is bound to.
/// [`render_component`] drives the full sequence.
pub trait Component: Controlled + Sized {
    fn render(self: Rc<Self>, children: Option<NodeId>) -> Result<NodeId>;
}

/// Render `component`, bind it to the produced node, then run render hooks.
///
/// ```ignore
/// let holder = Rc::new(VirtualHolder::new("panel"));
/// let placeholder = render_component(&holder, Some(body))?;
/// mount::mount(root, placeholder)?;
/// ```
pub fn render_component<C: Component>(component: &Rc<C>, children: Option<NodeId>) -> Result<NodeId> {
    let node = component.clone().render(children)?;
    bind_to_node(component, node)?;
    component.controller().run_render()?;
    Ok(node)
}

/// Fragment wrapping `children`, or an empty one.
pub fn fragment(children: Option<NodeId>) -> Result<NodeId> {
    let frag = dom::create_fragment();
    if let Some(children) = children {
        dom::append_child(frag, children)?;
    }
    Ok(frag)
}
