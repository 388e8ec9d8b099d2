//! Live progress counter
//!
//! Tracks completed/total counts for a running batch and renders them to
//! stderr. Purely observational: the counter never influences scheduling
//! or outcomes.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

/// Completed/total counter for a batch in flight.
///
/// `completed` only ever grows and never exceeds `total`; it equals
/// `total` exactly when the batch is done.
pub struct ProgressCounter {
    total: usize,
    completed: AtomicUsize,
    // Serializes terminal writes so counter refreshes don't interleave
    render_lock: Mutex<()>,
}

impl ProgressCounter {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            render_lock: Mutex::new(()),
        }
    }

    /// Record one finished item and return the new completed count.
    pub fn complete_one(&self) -> usize {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug_assert!(done <= self.total);
        done
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_done(&self) -> bool {
        self.completed() == self.total
    }

    /// Redraw the `[completed/total]` counter in place.
    pub fn render(&self) {
        let _guard = self.render_lock.lock();
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r[{}/{}] checked", self.completed(), self.total);
        let _ = stderr.flush();
    }

    /// Terminate the counter line once the batch is complete.
    pub fn finish(&self) {
        let _guard = self.render_lock.lock();
        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr);
        let _ = stderr.flush();
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
