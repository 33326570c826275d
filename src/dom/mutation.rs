//! Connection records.
//!
//! Every time a node enters or leaves the connected document the tree queues a
//! record here. The mount driver drains the queue in order and turns records
//! into controller lifecycle calls.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::types::NodeId;

/// A change of connectedness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// The node was inserted under a connected parent.
    Inserted(NodeId),
    /// A connected subtree was removed. Holds the subtree in document order,
    /// captured at the moment of removal.
    Removed(Vec<NodeId>),
}

thread_local! {
    static RECORDS: RefCell<VecDeque<Mutation>> = RefCell::new(VecDeque::new());
}

pub(crate) fn record(mutation: Mutation) {
    RECORDS.with(|records| records.borrow_mut().push_back(mutation));
}

/// Pop the oldest pending record.
pub fn take_record() -> Option<Mutation> {
    RECORDS.with(|records| records.borrow_mut().pop_front())
}

/// Number of records waiting to be processed.
pub fn pending_records() -> usize {
    RECORDS.with(|records| records.borrow().len())
}

pub(crate) fn clear_records() {
    RECORDS.with(|records| records.borrow_mut().clear());
}
