//! Event Loop
//!
//! Microtask queue standing in for the host's end-of-turn boundary.
//! Attribute batches are flushed from here; `Runtime::flush` drains it.

use std::collections::{HashSet, VecDeque};
use std::fmt;

/// Microtask identifier, used to cancel a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

/// Queued callback
pub type Microtask = Box<dyn FnOnce()>;

/// Single-threaded microtask queue
#[derive(Default)]
pub struct EventLoop {
    /// Microtask queue (attribute batches, deferred callbacks)
    microtasks: VecDeque<(TaskId, Microtask)>,
    /// Tasks cancelled before they ran
    cancelled: HashSet<TaskId>,
    next_task_id: u64,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a microtask
    pub fn queue_microtask(&mut self, task: Microtask) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;
        self.microtasks.push_back((id, task));
        id
    }

    /// Cancel a queued task; returns false if it already ran or is unknown
    pub fn cancel(&mut self, id: TaskId) -> bool {
        if self.microtasks.iter().any(|(queued, _)| *queued == id) {
            self.cancelled.insert(id)
        } else {
            false
        }
    }

    /// Pop the next runnable task, skipping cancelled ones
    pub fn pop_microtask(&mut self) -> Option<Microtask> {
        while let Some((id, task)) = self.microtasks.pop_front() {
            if !self.cancelled.remove(&id) {
                return Some(task);
            }
        }
        None
    }

    /// Number of queued tasks that will still run
    pub fn pending(&self) -> usize {
        self.microtasks.len() - self.cancelled.len()
    }

    /// Check if there's pending work
    pub fn has_pending_work(&self) -> bool {
        self.pending() > 0
    }

    /// Drop every queued task
    pub fn clear(&mut self) {
        self.microtasks.clear();
        self.cancelled.clear();
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("pending", &self.pending())
            .field("next_task_id", &self.next_task_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_microtask_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut loop_ = EventLoop::new();
        for i in 0..3 {
            let log = Rc::clone(&log);
            loop_.queue_microtask(Box::new(move || log.borrow_mut().push(i)));
        }
        assert_eq!(loop_.pending(), 3);

        while let Some(task) = loop_.pop_microtask() {
            task();
        }
        assert_eq!(*log.borrow(), [0, 1, 2]);
        assert!(!loop_.has_pending_work());
    }

    #[test]
    fn test_cancel() {
        let ran = Rc::new(RefCell::new(false));
        let mut loop_ = EventLoop::new();
        let id = {
            let ran = Rc::clone(&ran);
            loop_.queue_microtask(Box::new(move || *ran.borrow_mut() = true))
        };

        assert!(loop_.cancel(id));
        assert!(!loop_.cancel(id));
        assert_eq!(loop_.pending(), 0);
        assert!(loop_.pop_microtask().is_none());
        assert!(!*ran.borrow());
        assert!(!loop_.cancel(id));
    }
}
