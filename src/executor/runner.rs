//! Worker pool and outcome collection
//!
//! Two executor variants share one contract: drain a batch through a
//! bounded pool of workers and return one outcome per task, aligned to
//! submission order. `SimpleExecutor` is headless; `ProgressExecutor`
//! additionally refreshes a live counter on every completion.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::progress::ProgressCounter;
use super::queue::TaskQueue;

/// Default number of lookups in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// A deferred lookup: invoked once by a worker, yields a value, nothing,
/// or an error. Arguments are bound into the closure by the caller, so
/// the executor never sees their shape.
pub type TaskFn<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<Option<T>>> + Send + 'static>;

/// Wrap an async closure into a [`TaskFn`].
pub fn task_fn<T, F, Fut>(f: F) -> TaskFn<T>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Option<T>>> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

// ─────────────────────────────────────────────────────────────────
// Outcome
// ─────────────────────────────────────────────────────────────────

/// Terminal state of one task in a batch.
///
/// `Empty` means the task completed but found nothing worth keeping;
/// it is a normal result, not a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Empty,
    Failed(String),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }

    /// Collapse to the caller-visible shape: the value, or absence.
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Empty | Outcome::Failed(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Executor Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for a batch executor, fixed for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum tasks in flight simultaneously
    pub concurrency: usize,

    /// Render a live completed/total counter
    pub progress: bool,

    /// Per-task deadline; `None` lets a hung task hold its slot forever
    pub task_timeout: Option<Duration>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            progress: true,
            task_timeout: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Executor variants
// ─────────────────────────────────────────────────────────────────

/// Common contract for both executor variants.
#[async_trait]
pub trait BatchExecutor<T: Send + 'static>: Send + Sync {
    /// Run the whole batch and return one outcome per task, in
    /// submission order.
    async fn run(&self, tasks: Vec<TaskFn<T>>) -> Result<Vec<Outcome<T>>>;
}

/// Headless executor for batch/scripted use.
pub struct SimpleExecutor {
    config: ExecutorConfig,
}

impl SimpleExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<T: Send + 'static> BatchExecutor<T> for SimpleExecutor {
    async fn run(&self, tasks: Vec<TaskFn<T>>) -> Result<Vec<Outcome<T>>> {
        run_pool(tasks, &self.config, None).await
    }
}

/// Executor with a live `[completed/total]` counter on stderr.
pub struct ProgressExecutor {
    config: ExecutorConfig,
}

impl ProgressExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl<T: Send + 'static> BatchExecutor<T> for ProgressExecutor {
    async fn run(&self, tasks: Vec<TaskFn<T>>) -> Result<Vec<Outcome<T>>> {
        let counter = Arc::new(ProgressCounter::new(tasks.len()));
        counter.render();
        run_pool(tasks, &self.config, Some(counter)).await
    }
}

/// Pick the executor variant for the given configuration.
pub fn executor_for<T: Send + 'static>(config: ExecutorConfig) -> Box<dyn BatchExecutor<T>> {
    if config.progress {
        Box::new(ProgressExecutor::new(config))
    } else {
        Box::new(SimpleExecutor::new(config))
    }
}

// ─────────────────────────────────────────────────────────────────
// Worker pool
// ─────────────────────────────────────────────────────────────────

/// Drain a batch through a bounded worker pool.
///
/// Workers pull from the shared queue so a fast task frees its slot
/// immediately; nothing is statically partitioned. Each `(index, outcome)`
/// pair flows back over a channel and is written into its slot exactly
/// once, restoring submission order regardless of completion order.
async fn run_pool<T: Send + 'static>(
    tasks: Vec<TaskFn<T>>,
    config: &ExecutorConfig,
    counter: Option<Arc<ProgressCounter>>,
) -> Result<Vec<Outcome<T>>> {
    let total = tasks.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let queue = Arc::new(TaskQueue::new(tasks));
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<(usize, Outcome<T>)>(total);

    let workers = config.concurrency.max(1).min(total);
    let task_timeout = config.task_timeout;
    debug!(total, workers, "Starting lookup batch");

    let mut handles = Vec::with_capacity(workers);
    for worker_id in 0..workers {
        let queue = Arc::clone(&queue);
        let outcome_tx = outcome_tx.clone();
        handles.push(tokio::spawn(async move {
            while let Some((index, task)) = queue.pop() {
                let outcome = invoke(index, task, task_timeout).await;
                if outcome_tx.send((index, outcome)).await.is_err() {
                    // Collector is gone; stop pulling work
                    break;
                }
            }
            debug!(worker_id, "Worker drained queue");
        }));
    }
    drop(outcome_tx);

    let mut slots: Vec<Option<Outcome<T>>> = (0..total).map(|_| None).collect();
    let mut received = 0usize;
    while let Some((index, outcome)) = outcome_rx.recv().await {
        debug_assert!(slots[index].is_none(), "outcome slot written twice");
        slots[index] = Some(outcome);
        received += 1;
        if let Some(counter) = &counter {
            counter.complete_one();
            counter.render();
        }
    }

    for handle in handles {
        handle
            .await
            .map_err(|e| Error::Internal(format!("lookup worker aborted: {e}")))?;
    }

    if let Some(counter) = &counter {
        counter.finish();
    }

    if received != total {
        return Err(Error::Internal(format!(
            "collected {received} of {total} outcomes"
        )));
    }

    slots
        .into_iter()
        .map(|slot| slot.ok_or_else(|| Error::Internal("missing outcome slot".to_string())))
        .collect()
}

/// Invoke one task, isolating its failure modes.
///
/// An error, a panic, or (when configured) a timeout becomes a `Failed`
/// outcome for this index only; the worker keeps going.
async fn invoke<T>(index: usize, task: TaskFn<T>, task_timeout: Option<Duration>) -> Outcome<T> {
    // The closure call itself may panic, not just the future it returns
    let future = match std::panic::catch_unwind(AssertUnwindSafe(task)) {
        Ok(future) => future,
        Err(payload) => {
            let message = panic_message(payload);
            warn!(index, panic = %message, "Lookup task panicked");
            return Outcome::Failed(message);
        }
    };

    let guarded = AssertUnwindSafe(future).catch_unwind();
    let result = match task_timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(result) => result,
            Err(_) => {
                warn!(index, timeout_secs = limit.as_secs(), "Lookup timed out");
                return Outcome::Failed(format!("timed out after {}s", limit.as_secs()));
            }
        },
        None => guarded.await,
    };

    match result {
        Ok(Ok(Some(value))) => Outcome::Success(value),
        Ok(Ok(None)) => Outcome::Empty,
        Ok(Err(e)) => {
            warn!(index, error = %e, "Lookup failed");
            Outcome::Failed(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload);
            warn!(index, panic = %message, "Lookup task panicked");
            Outcome::Failed(message)
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "task panicked".to_string()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    use super::*;

    fn config(concurrency: usize) -> ExecutorConfig {
        ExecutorConfig {
            concurrency,
            progress: false,
            task_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_empty_batch_returns_immediately() {
        let executor = SimpleExecutor::new(config(4));
        let outcomes: Vec<Outcome<u32>> = executor.run(Vec::new()).await.unwrap();
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn test_output_aligned_with_input_order() {
        // Reverse the natural completion order: earlier items sleep longer
        let tasks: Vec<TaskFn<usize>> = (0..6)
            .map(|i| {
                task_fn(move || async move {
                    tokio::time::sleep(Duration::from_millis(60 - (i as u64) * 10)).await;
                    Ok(Some(i * 100))
                })
            })
            .collect();

        let executor = SimpleExecutor::new(config(6));
        let outcomes = executor.run(tasks).await.unwrap();

        assert_eq!(outcomes.len(), 6);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(*outcome, Outcome::Success(i * 100));
        }
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        // Batch of 5, budget 2, item at index 2 always fails
        let tasks: Vec<TaskFn<usize>> = (0..5)
            .map(|i| {
                task_fn(move || async move {
                    if i == 2 {
                        Err(Error::Internal("boom".to_string()))
                    } else {
                        Ok(Some(i))
                    }
                })
            })
            .collect();

        let executor = SimpleExecutor::new(config(2));
        let outcomes = executor.run(tasks).await.unwrap();

        assert_eq!(outcomes.len(), 5);
        assert!(outcomes[2].is_failed());
        for i in [0, 1, 3, 4] {
            assert_eq!(outcomes[i], Outcome::Success(i));
        }
    }

    #[tokio::test]
    async fn test_panic_is_isolated() {
        let tasks: Vec<TaskFn<u32>> = vec![
            task_fn(|| async { Ok(Some(1)) }),
            task_fn(|| async { panic!("exploded") }),
            task_fn(|| async { Ok(Some(3)) }),
        ];

        let executor = SimpleExecutor::new(config(3));
        let outcomes = executor.run(tasks).await.unwrap();

        assert_eq!(outcomes[0], Outcome::Success(1));
        assert_eq!(outcomes[1], Outcome::Failed("exploded".to_string()));
        assert_eq!(outcomes[2], Outcome::Success(3));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_a_failure() {
        let tasks: Vec<TaskFn<u32>> = vec![
            task_fn(|| async { Ok(Some(7)) }),
            task_fn(|| async { Ok(None) }),
        ];

        let executor = SimpleExecutor::new(config(2));
        let outcomes = executor.run(tasks).await.unwrap();

        assert!(outcomes[0].is_success());
        assert!(outcomes[1].is_empty());
        assert!(!outcomes[1].is_failed());
        assert_eq!(outcomes[1].clone().into_option(), None);
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let active = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<TaskFn<u32>> = (0..12)
            .map(|_| {
                let active = Arc::clone(&active);
                let high_water = Arc::clone(&high_water);
                task_fn(move || async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(Some(0))
                })
            })
            .collect();

        let executor = SimpleExecutor::new(config(3));
        let outcomes = executor.run(tasks).await.unwrap();

        assert_eq!(outcomes.len(), 12);
        assert!(
            high_water.load(Ordering::SeqCst) <= 3,
            "more than 3 tasks were in flight at once"
        );
    }

    #[tokio::test]
    async fn test_budget_one_runs_strictly_serially() {
        let active = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));
        let started = Instant::now();

        let tasks: Vec<TaskFn<u32>> = (0..10)
            .map(|_| {
                let active = Arc::clone(&active);
                let high_water = Arc::clone(&high_water);
                task_fn(move || async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    Ok(Some(0))
                })
            })
            .collect();

        let executor = SimpleExecutor::new(config(1));
        let outcomes = executor.run(tasks).await.unwrap();

        assert_eq!(outcomes.len(), 10);
        assert_eq!(high_water.load(Ordering::SeqCst), 1);
        // Wall time is the sum of latencies, not the max
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_task_timeout_converts_hang_to_failure() {
        let tasks: Vec<TaskFn<u32>> = vec![
            task_fn(|| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Some(1))
            }),
            task_fn(|| async { Ok(Some(2)) }),
        ];

        let executor = SimpleExecutor::new(ExecutorConfig {
            concurrency: 2,
            progress: false,
            task_timeout: Some(Duration::from_millis(50)),
        });
        let outcomes = executor.run(tasks).await.unwrap();

        match &outcomes[0] {
            Outcome::Failed(message) => assert!(message.contains("timed out")),
            other => panic!("expected timeout failure, got {:?}", other),
        }
        assert_eq!(outcomes[1], Outcome::Success(2));
    }

    #[tokio::test]
    async fn test_progress_variant_matches_simple_semantics() {
        let build = || -> Vec<TaskFn<usize>> {
            (0..8)
                .map(|i| {
                    task_fn(move || async move {
                        if i % 3 == 0 {
                            Ok(None)
                        } else {
                            Ok(Some(i))
                        }
                    })
                })
                .collect()
        };

        let simple = SimpleExecutor::new(config(4)).run(build()).await.unwrap();
        let progress = ProgressExecutor::new(ExecutorConfig {
            concurrency: 4,
            progress: true,
            task_timeout: None,
        })
        .run(build())
        .await
        .unwrap();

        assert_eq!(simple, progress);
    }

    #[test]
    fn test_executor_config_default() {
        let config = ExecutorConfig::default();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert!(config.progress);
        assert!(config.task_timeout.is_none());
    }

    #[tokio::test]
    async fn test_factory_selects_variant() {
        let simple = executor_for::<u32>(ExecutorConfig {
            concurrency: 2,
            progress: false,
            task_timeout: None,
        });
        let tasks: Vec<TaskFn<u32>> = vec![task_fn(|| async { Ok(Some(5)) })];
        let outcomes = simple.run(tasks).await.unwrap();
        assert_eq!(outcomes, vec![Outcome::Success(5)]);
    }
}
