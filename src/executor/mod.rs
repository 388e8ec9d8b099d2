//! Batch lookup executor
//!
//! Runs a batch of independent async lookups with bounded concurrency:
//! - Shared task queue with at-most-once dispatch
//! - Worker pool capped at the configured concurrency budget
//! - Per-item outcome collection, re-ordered to submission order
//! - Optional live progress counter

mod progress;
mod queue;
mod runner;

pub use progress::*;
pub use queue::*;
pub use runner::*;
