//! # Frame Scheduling
//!
//! Commits are deferred to the next frame so that a burst of synchronous
//! notifications produces a single visible update. A scheduler only has
//! to run a task once at some later point and be able to cancel it.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

/// A task run at the next frame.
pub type FrameTask = Box<dyn FnOnce()>;

/// Identifier of a requested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(pub i32);

/// Deferred execution primitive.
pub trait FrameScheduler {
    /// Run `task` at the next frame boundary.
    fn request_frame(&self, task: FrameTask) -> FrameId;

    /// Drop a requested task that has not run yet. Unknown ids are ignored.
    fn cancel_frame(&self, id: FrameId);
}

/// Runs every task immediately, for hosts without a frame loop.
#[derive(Debug, Default)]
pub struct ImmediateFrames {
    next_id: Cell<i32>,
}

impl ImmediateFrames {
    /// Create the scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for ImmediateFrames {
    fn request_frame(&self, task: FrameTask) -> FrameId {
        let id = self.next_id.get().wrapping_add(1);
        self.next_id.set(id);
        task();
        FrameId(id)
    }

    fn cancel_frame(&self, _id: FrameId) {}
}

/// Queues tasks until [`ManualFrames::run_frame`] is called.
///
/// Useful for custom render loops and for deterministic tests.
#[derive(Default)]
pub struct ManualFrames {
    next_id: Cell<i32>,
    queue: RefCell<VecDeque<(FrameId, FrameTask)>>,
    cancelled: Cell<usize>,
}

impl fmt::Debug for ManualFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualFrames")
            .field("pending", &self.pending())
            .field("cancelled", &self.cancelled.get())
            .finish_non_exhaustive()
    }
}

impl ManualFrames {
    /// Create the scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tasks waiting for the next frame.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Number of tasks cancelled so far.
    #[must_use]
    pub fn cancelled(&self) -> usize {
        self.cancelled.get()
    }

    /// Run the tasks queued before this call. Returns how many ran.
    ///
    /// Tasks requested while the frame runs wait for the next frame.
    pub fn run_frame(&self) -> usize {
        let tasks: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let count = tasks.len();
        for (_, task) in tasks {
            task();
        }
        count
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&self, task: FrameTask) -> FrameId {
        let id = FrameId(self.next_id.get().wrapping_add(1));
        self.next_id.set(id.0);
        self.queue.borrow_mut().push_back((id, task));
        id
    }

    fn cancel_frame(&self, id: FrameId) {
        let mut queue = self.queue.borrow_mut();
        let before = queue.len();
        queue.retain(|(queued, _)| *queued != id);
        if queue.len() != before {
            self.cancelled.set(self.cancelled.get() + 1);
        }
    }
}
