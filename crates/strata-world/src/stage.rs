//! Parallel stage execution.
//!
//! A stage fans a batch of independent work items out over a scoped pool of
//! named threads fed from a crossbeam channel, so items are picked up in the
//! order they were queued. Each worker checks the cycle token before taking
//! an item; the first error stops the rest of the batch.

use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::unbounded;

use crate::cancel::CycleToken;

/// How a stage ended.
#[derive(Debug)]
pub enum StageOutcome<R> {
    /// Every item ran; results are in completion order.
    Completed(Vec<R>),
    /// The cycle was superseded or the world closed mid-stage.
    Cancelled,
}

impl<R> StageOutcome<R> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Worker count for a configured value; `0` means one per spare core.
pub fn worker_count(configured: usize) -> usize {
    if configured > 0 {
        configured
    } else {
        num_cpus::get().saturating_sub(2).max(1)
    }
}

/// Runs `work` over every item on up to `workers` threads.
///
/// Returns the first error any worker hit. Cancellation wins over results:
/// if the token was cancelled at any point the outcome is
/// [`StageOutcome::Cancelled`], even when every item happened to finish.
pub fn run_stage<T, R, E, F>(
    name: &str,
    items: Vec<T>,
    workers: usize,
    token: &CycleToken,
    work: F,
) -> Result<StageOutcome<R>, E>
where
    T: Send,
    R: Send,
    E: Send,
    F: Fn(T) -> Result<R, E> + Sync,
{
    if token.is_cancelled() {
        return Ok(StageOutcome::Cancelled);
    }
    if items.is_empty() {
        return Ok(StageOutcome::Completed(Vec::new()));
    }

    let total = items.len();
    let workers = workers.clamp(1, total);
    let (tx, rx) = unbounded();
    for item in items {
        // The receiver is alive until the scope below ends.
        let _ = tx.send(item);
    }
    drop(tx);

    let failed = AtomicBool::new(false);
    let drain = || -> Result<Vec<R>, E> {
        let mut results = Vec::new();
        while !token.is_cancelled() && !failed.load(Ordering::Acquire) {
            let Ok(item) = rx.recv() else {
                break;
            };
            match work(item) {
                Ok(result) => results.push(result),
                Err(err) => {
                    failed.store(true, Ordering::Release);
                    return Err(err);
                }
            }
        }
        Ok(results)
    };

    let outcomes: Vec<Result<Vec<R>, E>> = std::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for i in 0..workers {
            let spawned = std::thread::Builder::new()
                .name(format!("{name}-worker-{i}"))
                .spawn_scoped(scope, &drain);
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(err) => tracing::warn!(stage = name, "Could not spawn worker: {err}"),
            }
        }
        if handles.is_empty() {
            return vec![drain()];
        }
        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(outcome) => outcome,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut results = Vec::with_capacity(total);
    for outcome in outcomes {
        results.extend(outcome?);
    }
    if token.is_cancelled() {
        tracing::debug!(stage = name, "Stage cancelled");
        return Ok(StageOutcome::Cancelled);
    }
    tracing::trace!(stage = name, items = results.len(), workers, "Stage completed");
    Ok(StageOutcome::Completed(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_all_items_processed() {
        let token = CancellationToken::new().begin_cycle();
        let outcome = run_stage("test", (0..100).collect(), 4, &token, |n: i32| {
            Ok::<_, ()>(n * 2)
        })
        .unwrap();
        let StageOutcome::Completed(mut results) = outcome else {
            panic!("stage should complete");
        };
        results.sort();
        assert_eq!(results, (0..100).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_batch_completes() {
        let token = CancellationToken::new().begin_cycle();
        let outcome = run_stage("test", Vec::<u8>::new(), 4, &token, |_| Ok::<u8, ()>(0)).unwrap();
        assert!(matches!(outcome, StageOutcome::Completed(v) if v.is_empty()));
    }

    #[test]
    fn test_single_worker_keeps_queue_order() {
        let token = CancellationToken::new().begin_cycle();
        let outcome = run_stage("ordered", vec![3, 1, 2], 1, &token, |n: i32| Ok::<_, ()>(n)).unwrap();
        assert!(matches!(outcome, StageOutcome::Completed(v) if v == vec![3, 1, 2]));
    }

    #[test]
    fn test_first_error_aborts_batch() {
        let token = CancellationToken::new().begin_cycle();
        let ran = AtomicUsize::new(0);
        let result = run_stage("failing", (0..1000).collect(), 1, &token, |n: i32| {
            ran.fetch_add(1, Ordering::SeqCst);
            if n == 3 { Err("boom") } else { Ok(n) }
        });
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_cancelled_before_start() {
        let owner = CancellationToken::new();
        let token = owner.begin_cycle();
        owner.begin_cycle();
        let outcome = run_stage("stale", vec![1], 2, &token, |n: i32| Ok::<_, ()>(n)).unwrap();
        assert!(outcome.is_cancelled());
    }

    #[test]
    fn test_cancel_mid_stage_stops_workers() {
        let owner = CancellationToken::new();
        let token = owner.begin_cycle();
        let ran = AtomicUsize::new(0);
        let outcome = run_stage("cancel", (0..1000).collect(), 1, &token, |n: i32| {
            ran.fetch_add(1, Ordering::SeqCst);
            if n == 10 {
                owner.cancel_current();
            }
            Ok::<_, ()>(n)
        })
        .unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(ran.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn test_worker_count_defaults_to_spare_cores() {
        assert_eq!(worker_count(3), 3);
        assert!(worker_count(0) >= 1);
    }
}
