//! Mount driver - turns connection records into lifecycle hooks.
//!
//! The document queues a record whenever a subtree enters or leaves a
//! connected parent. [`settle`] drains the queue:
//!
//! ```text
//! Inserted(node)  -> every unmounted controller in node's subtree mounts
//! Removed(nodes)  -> every mounted controller in the snapshot unmounts
//! ```
//!
//! Hooks may mutate the tree; the records they produce are drained by the
//! same `settle` call. The verbs settle after every change they make to
//! their range, so components rendered by an observer are mounted before the
//! observer returns. Frame callbacks queued by unmount hooks run on [`tick`].
//!
//! # Example
//!
//! ```ignore
//! use domic::{dom, mount};
//!
//! let handle = mount::mount(dom::document(), app)?;
//! mount::tick()?;
//! handle.unmount()?;
//! ```

use std::cell::Cell;

use crate::controller::{self, controllers_of};
use crate::dom::{self, Mutation};
use crate::error::Result;
use crate::scheduler;
use crate::types::NodeId;

thread_local! {
    static SETTLING: Cell<bool> = const { Cell::new(false) };
}

struct SettleGuard;

impl Drop for SettleGuard {
    fn drop(&mut self) {
        SETTLING.with(|s| s.set(false));
    }
}

// =============================================================================
// Settle
// =============================================================================

/// Deliver queued connection records. Returns how many were processed.
///
/// Re-entrant calls (from inside a hook) return `Ok(0)`; the outer call picks
/// up their records. On error the remaining records stay queued.
pub fn settle() -> Result<usize> {
    if SETTLING.with(|s| s.replace(true)) {
        return Ok(0);
    }
    let _guard = SettleGuard;

    let mut processed = 0;
    while let Some(record) = dom::take_record() {
        processed += 1;
        match record {
            Mutation::Removed(nodes) => {
                for node in nodes {
                    for controlled in controllers_of(node) {
                        let controller = controlled.controller();
                        if controller.is_mounted() {
                            controller.run_unmount()?;
                        }
                    }
                }
            }
            Mutation::Inserted(root) => {
                if !dom::is_connected(root) {
                    continue;
                }
                for node in dom::descendants(root) {
                    // An earlier hook may have moved it out again
                    if !dom::is_connected(node) {
                        continue;
                    }
                    for controlled in controllers_of(node) {
                        let controller = controlled.controller();
                        if !controller.is_mounted() {
                            controller.run_mount()?;
                        }
                    }
                }
            }
        }
    }
    if processed > 0 {
        tracing::trace!(target: "domic", processed, "settled connection records");
    }
    Ok(processed)
}

// =============================================================================
// Mount / Unmount
// =============================================================================

/// A node mounted with [`mount`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountHandle {
    node: NodeId,
}

impl MountHandle {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Detach the node and run unmount hooks.
    pub fn unmount(self) -> Result<()> {
        unmount(self.node)
    }
}

/// Append `node` to `parent` and settle.
pub fn mount(parent: NodeId, node: NodeId) -> Result<MountHandle> {
    insert(parent, node, None)?;
    Ok(MountHandle { node })
}

/// Insert `node` before `reference` (or at the end) and settle.
pub fn insert(parent: NodeId, node: NodeId, reference: Option<NodeId>) -> Result<()> {
    dom::insert_before(parent, node, reference)?;
    settle()?;
    Ok(())
}

/// Detach `node` and settle. The node stays alive and can be reinserted.
pub fn unmount(node: NodeId) -> Result<()> {
    dom::detach(node)?;
    settle()?;
    Ok(())
}

/// Detach, settle, then free the subtree and its controllers.
///
/// Controllers of freed nodes get [`Controlled::discard`] before they are
/// erased, so components can free what they keep outside the subtree.
pub fn discard(node: NodeId) -> Result<()> {
    unmount(node)?;
    let freed = dom::discard(node)?;
    tracing::debug!(target: "domic", %node, freed = freed.len(), "discarded subtree");

    let mut outcome = Ok(());
    for &freed_node in &freed {
        for controlled in controllers_of(freed_node) {
            if let Err(err) = controlled.discard() {
                outcome = outcome.and(Err(err));
            }
        }
    }
    controller::erase(&freed);
    outcome
}

/// [`discard`] each node in turn.
pub fn discard_all(nodes: &[NodeId]) -> Result<()> {
    for &node in nodes {
        discard(node)?;
    }
    Ok(())
}

/// Settle, run one animation frame, settle again. Returns frame callbacks run.
pub fn tick() -> Result<usize> {
    settle()?;
    let ran = scheduler::run_animation_frame();
    settle()?;
    Ok(ran)
}

/// Reset the document, controllers and scheduler (for testing).
pub fn reset() {
    dom::reset_document();
    controller::reset_controllers();
    scheduler::reset_scheduler();
}
