//! Sequential batches of concurrent tasks.
//!
//! Tasks are split into consecutive batches of `batch_size`. Every task in a
//! batch runs concurrently and the whole batch resolves before the next one
//! starts, so at most `batch_size` tasks are ever in flight. A task that
//! fails or panics leaves `None` in its slot and never affects its siblings.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use beanfeed_core::AppConfig;
use futures::future::join_all;
use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::error::AggregateError;

#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: usize,
    inter_batch_delay: Duration,
}

impl BatchScheduler {
    /// A `batch_size` of zero is treated as one.
    #[must_use]
    pub fn new(batch_size: usize, inter_batch_delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            inter_batch_delay,
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(
            config.batch_size,
            Duration::from_millis(config.inter_batch_delay_ms),
        )
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Runs `tasks` batch by batch and returns one slot per task, in input
    /// order. Tasks are lazy futures; none starts before its batch does.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::Cancelled`] when `cancel` fires. The batch in
    /// flight at that moment is dropped and no later batch starts.
    pub async fn run<T, E, Fut>(
        &self,
        tasks: Vec<Fut>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Option<T>>, AggregateError>
    where
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let total_tasks = tasks.len();
        let total_batches = total_tasks.div_ceil(self.batch_size);
        let cancelled = |completed_batches| AggregateError::Cancelled {
            completed_batches,
            total_batches,
        };

        let mut results = Vec::with_capacity(total_tasks);
        let mut pending = tasks.into_iter();

        for batch_index in 0..total_batches {
            if cancel.is_cancelled() {
                return Err(cancelled(batch_index));
            }

            if batch_index > 0 && !self.inter_batch_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.inter_batch_delay) => {}
                    () = cancel.cancelled() => return Err(cancelled(batch_index)),
                }
            }

            let batch: Vec<_> = pending
                .by_ref()
                .take(self.batch_size)
                .map(|task| AssertUnwindSafe(task).catch_unwind())
                .collect();

            let outcomes = tokio::select! {
                outcomes = join_all(batch) => outcomes,
                () = cancel.cancelled() => return Err(cancelled(batch_index)),
            };

            for (offset, outcome) in outcomes.into_iter().enumerate() {
                let task_index = batch_index * self.batch_size + offset;
                let slot = match outcome {
                    Ok(Ok(value)) => Some(value),
                    Ok(Err(e)) => {
                        tracing::warn!(task_index, error = %e, "batch task failed");
                        None
                    }
                    Err(payload) => {
                        tracing::warn!(
                            task_index,
                            panic = panic_message(payload.as_ref()),
                            "batch task panicked"
                        );
                        None
                    }
                };
                results.push(slot);
            }

            tracing::debug!(
                batch = batch_index + 1,
                total_batches,
                "batch complete"
            );
        }

        Ok(results)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn never_exceeds_batch_size_in_flight() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..11u64)
            .map(|i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5 + i % 3)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<u64, String>(i)
                }
            })
            .collect();

        let scheduler = BatchScheduler::new(4, Duration::ZERO);
        let results = scheduler
            .run(tasks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(peak.load(Ordering::SeqCst), 4);
        let values: Vec<u64> = results.into_iter().map(Option::unwrap).collect();
        assert_eq!(values, (0..11).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn next_batch_waits_for_every_task_of_previous_batch() {
        let events = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<_> = (0..6u64)
            .map(|i| {
                let events = Arc::clone(&events);
                async move {
                    events.lock().unwrap().push(format!("start {i}"));
                    // Task 0 is the slowest in the first batch.
                    let delay = if i == 0 { 30 } else { 1 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    events.lock().unwrap().push(format!("end {i}"));
                    Ok::<(), String>(())
                }
            })
            .collect();

        BatchScheduler::new(3, Duration::ZERO)
            .run(tasks, &CancellationToken::new())
            .await
            .unwrap();

        let events = events.lock().unwrap();
        let end_0 = events.iter().position(|e| e == "end 0").unwrap();
        let start_3 = events.iter().position(|e| e == "start 3").unwrap();
        assert!(end_0 < start_3, "batch 2 started early: {events:?}");
    }

    async fn flaky(i: u32) -> Result<u32, String> {
        match i {
            1 => Err("upstream 503".to_string()),
            2 => panic!("boom"),
            _ => Ok(i),
        }
    }

    #[tokio::test]
    async fn failing_and_panicking_tasks_become_none() {
        let tasks: Vec<_> = (0..4).map(flaky).collect();

        let results = BatchScheduler::new(4, Duration::ZERO)
            .run(tasks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results, vec![Some(0), None, None, Some(3)]);
    }

    #[tokio::test]
    async fn empty_task_list_yields_empty_results() {
        let tasks: Vec<std::future::Ready<Result<(), String>>> = Vec::new();
        let results = BatchScheduler::new(5, Duration::ZERO)
            .run(tasks, &CancellationToken::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_next_batch() {
        let started = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let started = Arc::clone(&started);
                let cancel = cancel.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    cancel.cancel();
                    Ok::<(), String>(())
                }
            })
            .collect();

        let err = BatchScheduler::new(2, Duration::ZERO)
            .run(tasks, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AggregateError::Cancelled {
                total_batches: 2,
                ..
            }
        ));
        assert_eq!(started.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        assert_eq!(BatchScheduler::new(0, Duration::ZERO).batch_size(), 1);
    }
}
