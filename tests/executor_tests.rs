//! Executor integration tests
//!
//! Exercises the batch executor through the public trait the way the
//! check command uses it: a batch of closures over shared state, a
//! bounded pool, and outcomes aligned to submission order.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// The crate is a binary, so pull the executor in by path
#[path = "../src/error.rs"]
mod error;
#[path = "../src/executor/mod.rs"]
mod executor;

use error::Error;
use executor::{executor_for, task_fn, ExecutorConfig, Outcome, TaskFn};

fn config(concurrency: usize, progress: bool) -> ExecutorConfig {
    ExecutorConfig {
        concurrency,
        progress,
        task_timeout: None,
    }
}

#[tokio::test]
async fn mixed_batch_keeps_submission_order() {
    // Outcomes of all three kinds, finishing out of order
    let tasks: Vec<TaskFn<String>> = (0..9)
        .map(|i| {
            task_fn(move || async move {
                tokio::time::sleep(Duration::from_millis((9 - i) as u64 * 5)).await;
                match i % 3 {
                    0 => Ok(Some(format!("record-{i}"))),
                    1 => Ok(None),
                    _ => Err(Error::Execution(format!("boom-{i}"))),
                }
            })
        })
        .collect();

    let executor = executor_for::<String>(config(4, false));
    let outcomes = executor.run(tasks).await.unwrap();

    assert_eq!(outcomes.len(), 9);
    for (i, outcome) in outcomes.iter().enumerate() {
        match i % 3 {
            0 => assert_eq!(*outcome, Outcome::Success(format!("record-{i}"))),
            1 => assert_eq!(*outcome, Outcome::Empty),
            _ => assert_eq!(*outcome, Outcome::Failed(format!("boom-{i}"))),
        }
    }
}

#[tokio::test]
async fn large_batch_with_small_budget_completes() {
    let completed = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<TaskFn<usize>> = (0..200)
        .map(|i| {
            let completed = Arc::clone(&completed);
            task_fn(move || async move {
                completed.fetch_add(1, Ordering::SeqCst);
                Ok(Some(i))
            })
        })
        .collect();

    let executor = executor_for::<usize>(config(3, false));
    let outcomes = executor.run(tasks).await.unwrap();

    assert_eq!(outcomes.len(), 200);
    assert_eq!(completed.load(Ordering::SeqCst), 200);
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(*outcome, Outcome::Success(i));
    }
}

#[tokio::test]
async fn budget_larger_than_batch_is_fine() {
    let tasks: Vec<TaskFn<u32>> = (0..3).map(|i| task_fn(move || async move { Ok(Some(i)) })).collect();

    let executor = executor_for::<u32>(config(64, false));
    let outcomes = executor.run(tasks).await.unwrap();
    assert_eq!(
        outcomes,
        vec![Outcome::Success(0), Outcome::Success(1), Outcome::Success(2)]
    );
}

#[tokio::test]
async fn progress_variant_returns_identical_outcomes() {
    let build = || -> Vec<TaskFn<u32>> {
        (0..20)
            .map(|i| {
                task_fn(move || async move {
                    if i % 4 == 3 {
                        Err(Error::Execution("nope".to_string()))
                    } else if i % 2 == 0 {
                        Ok(Some(i))
                    } else {
                        Ok(None)
                    }
                })
            })
            .collect()
    };

    let plain = executor_for::<u32>(config(5, false))
        .run(build())
        .await
        .unwrap();
    let with_progress = executor_for::<u32>(config(5, true))
        .run(build())
        .await
        .unwrap();

    assert_eq!(plain, with_progress);
}

#[tokio::test]
async fn timeout_fails_only_the_slow_item() {
    let tasks: Vec<TaskFn<u32>> = vec![
        task_fn(|| async { Ok(Some(1)) }),
        task_fn(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some(2))
        }),
        task_fn(|| async { Ok(Some(3)) }),
    ];

    let executor = executor_for::<u32>(ExecutorConfig {
        concurrency: 3,
        progress: false,
        task_timeout: Some(Duration::from_millis(100)),
    });
    let outcomes = executor.run(tasks).await.unwrap();

    assert_eq!(outcomes[0], Outcome::Success(1));
    assert!(outcomes[1].is_failed());
    assert_eq!(outcomes[2], Outcome::Success(3));
}
