//! Animation-frame scheduler.
//!
//! Work that must wait for the next paint opportunity is queued here and run
//! by [`run_animation_frame`]. Callbacks requested while a frame runs are
//! deferred to the following frame.
//!
//! # Example
//!
//! ```ignore
//! use domic::scheduler::{request_animation_frame, run_animation_frame};
//!
//! let handle = request_animation_frame(|| println!("painted"));
//! // Changed our mind
//! handle.cancel();
//! assert_eq!(run_animation_frame(), 0);
//! ```

use std::cell::RefCell;

// =============================================================================
// Frame Queue
// =============================================================================

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    callbacks: Vec<(u64, Box<dyn FnOnce()>)>,
}

thread_local! {
    static FRAME_QUEUE: RefCell<FrameQueue> = RefCell::new(FrameQueue::default());
}

/// Handle to a queued frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping the handle makes the callback impossible to cancel"]
pub struct FrameHandle(u64);

impl FrameHandle {
    /// Cancel the callback. Returns false if it already ran or was cancelled.
    pub fn cancel(self) -> bool {
        cancel_animation_frame(self)
    }

    /// Whether the callback is still waiting for a frame.
    pub fn is_pending(self) -> bool {
        FRAME_QUEUE.with(|queue| queue.borrow().callbacks.iter().any(|(id, _)| *id == self.0))
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Queue `callback` for the next animation frame.
pub fn request_animation_frame(callback: impl FnOnce() + 'static) -> FrameHandle {
    FRAME_QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let id = queue.next_id;
        queue.next_id += 1;
        queue.callbacks.push((id, Box::new(callback)));
        FrameHandle(id)
    })
}

/// Remove a queued callback.
pub fn cancel_animation_frame(handle: FrameHandle) -> bool {
    FRAME_QUEUE.with(|queue| {
        let mut queue = queue.borrow_mut();
        let before = queue.callbacks.len();
        queue.callbacks.retain(|(id, _)| *id != handle.0);
        queue.callbacks.len() != before
    })
}

/// Run every callback queued before this call. Returns how many ran.
pub fn run_animation_frame() -> usize {
    let frame = FRAME_QUEUE.with(|queue| std::mem::take(&mut queue.borrow_mut().callbacks));
    let count = frame.len();
    if count > 0 {
        tracing::trace!(target: "domic", count, "running animation frame");
    }
    for (_, callback) in frame {
        callback();
    }
    count
}

/// Number of callbacks waiting for a frame.
pub fn pending_frames() -> usize {
    FRAME_QUEUE.with(|queue| queue.borrow().callbacks.len())
}

/// Drop every queued callback (for testing).
pub fn reset_scheduler() {
    FRAME_QUEUE.with(|queue| *queue.borrow_mut() = FrameQueue::default());
}
