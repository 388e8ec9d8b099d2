//! Shared task queue
//!
//! Holds the ordered batch of pending tasks and hands them out to workers.
//! Each task is delivered at most once; the queue never re-delivers, so
//! retry (if any) is the task's own responsibility.

use std::collections::VecDeque;

use parking_lot::Mutex;

use super::runner::TaskFn;

/// Ordered queue of pending tasks, safe to drain from multiple workers.
///
/// Each entry carries the index of its original position in the batch;
/// that index determines where the task's outcome lands in the final
/// result sequence.
pub struct TaskQueue<T> {
    inner: Mutex<VecDeque<(usize, TaskFn<T>)>>,
}

impl<T> TaskQueue<T> {
    /// Build a queue from a batch, preserving submission order.
    pub fn new(tasks: Vec<TaskFn<T>>) -> Self {
        let inner = tasks.into_iter().enumerate().collect();
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Take the next pending task, or `None` when the queue is drained.
    ///
    /// The mutex guarantees no two workers ever receive the same entry.
    pub fn pop(&self) -> Option<(usize, TaskFn<T>)> {
        self.inner.lock().pop_front()
    }

    /// Number of tasks still waiting for dispatch.
    pub fn pending(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether all tasks have been handed out.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::super::runner::task_fn;
    use super::*;

    fn noop_task(value: u32) -> TaskFn<u32> {
        task_fn(move || async move { Ok(Some(value)) })
    }

    #[test]
    fn test_pop_preserves_order() {
        let queue = TaskQueue::new(vec![noop_task(0), noop_task(1), noop_task(2)]);

        assert_eq!(queue.pending(), 3);
        let (first, _) = queue.pop().unwrap();
        let (second, _) = queue.pop().unwrap();
        let (third, _) = queue.pop().unwrap();
        assert_eq!((first, second, third), (0, 1, 2));
        assert!(queue.pop().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_empty_queue() {
        let queue: TaskQueue<u32> = TaskQueue::new(Vec::new());
        assert!(queue.is_empty());
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_concurrent_pop_is_at_most_once() {
        use std::sync::Arc;

        let queue = Arc::new(TaskQueue::new((0..100).map(noop_task).collect()));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let queue = Arc::clone(&queue);
            handles.push(std::thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some((index, _)) = queue.pop() {
                    seen.push(index);
                }
                seen
            }));
        }

        let mut all: Vec<usize> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        all.sort_unstable();
        // Every index delivered exactly once across all workers
        assert_eq!(all, (0..100).collect::<Vec<_>>());
    }
}
