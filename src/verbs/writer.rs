//! Writer - a text node that follows an observable.

use std::fmt::Display;
use std::rc::Rc;

use crate::controller::{render_component, Component, Controlled, Controller};
use crate::dom;
use crate::error::Result;
use crate::observable::{Observable, ObserveOptions};
use crate::types::NodeId;

pub struct Writer<T: Display + Clone + PartialEq + 'static> {
    controller: Controller,
    source: Observable<T>,
}

impl<T: Display + Clone + PartialEq + 'static> Writer<T> {
    pub fn new(source: Observable<T>) -> Self {
        Self {
            controller: Controller::new(),
            source,
        }
    }
}

impl<T: Display + Clone + PartialEq + 'static> Controlled for Writer<T> {
    fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl<T: Display + Clone + PartialEq + 'static> Component for Writer<T> {
    fn render(self: Rc<Self>, _children: Option<NodeId>) -> Result<NodeId> {
        let node = dom::create_text("");
        self.controller.observe(
            &self.source,
            move |value, change| {
                if !change.value_changed() {
                    return;
                }
                if let Err(err) = dom::set_text(node, &value.to_string()) {
                    tracing::error!(target: "domic", %err, "text update failed");
                }
            },
            ObserveOptions::default(),
        );
        Ok(node)
    }
}

/// Text node showing the current value of `source` while mounted.
pub fn write<T: Display + Clone + PartialEq + 'static>(source: &Observable<T>) -> Result<NodeId> {
    render_component(&Rc::new(Writer::new(source.clone())), None)
}
