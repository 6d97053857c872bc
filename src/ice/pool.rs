//! Bounded fan-out / join over a rayon thread pool.
//!
//! Each task owns one pre-assigned slot of the response vector, so results land
//! in grid order no matter which worker finishes first. The join waits for the
//! whole batch; a failing task records its error in its own slot and never
//! stops its siblings. Panics are caught per task.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::AppError;

pub struct TaskPool {
    pool: ThreadPool,
}

/// Result of one joined batch.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// One slot per task; `NaN` where the task failed.
    pub responses: Vec<f64>,
    /// Failed tasks by slot index, in ascending order.
    pub failures: Vec<(usize, AppError)>,
}

impl BatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// The responses, or the lowest-indexed failure.
    pub fn into_result(self) -> Result<Vec<f64>, AppError> {
        match self.failures.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.responses),
        }
    }
}

impl TaskPool {
    /// `workers = None` sizes the pool to the available cores.
    pub fn new(workers: Option<usize>) -> Result<Self, AppError> {
        if workers == Some(0) {
            return Err(AppError::invalid("Worker count must be >= 1."));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.unwrap_or(0))
            .thread_name(|i| format!("ice-worker-{i}"))
            .build()
            .map_err(|e| AppError::invalid(format!("Failed to build worker pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run every task, blocking until all have finished.
    ///
    /// At most `workers()` tasks run at once; the rest wait in the pool queue.
    pub fn run_all<T, F>(&self, tasks: &[T], run: F) -> BatchOutcome
    where
        T: Sync,
        F: Fn(&T) -> Result<f64, AppError> + Sync + Send,
    {
        let mut responses = vec![f64::NAN; tasks.len()];
        let mut errors: Vec<Option<AppError>> = vec![None; tasks.len()];

        self.pool.install(|| {
            responses
                .par_iter_mut()
                .zip(errors.par_iter_mut())
                .zip(tasks.par_iter())
                .for_each(|((slot, error), task)| match catch_unwind(AssertUnwindSafe(|| run(task))) {
                    Ok(Ok(v)) => *slot = v,
                    Ok(Err(e)) => *error = Some(e),
                    Err(panic) => {
                        *error = Some(AppError::scoring(format!(
                            "Scoring task panicked: {}",
                            panic_message(panic.as_ref())
                        )))
                    }
                });
        });

        let failures = errors
            .into_iter()
            .enumerate()
            .filter_map(|(i, e)| e.map(|e| (i, e)))
            .collect();
        BatchOutcome { responses, failures }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use crate::error::ErrorKind;

    #[test]
    fn responses_keep_dispatch_order_despite_completion_order() {
        let pool = TaskPool::new(Some(4)).unwrap();
        let tasks: Vec<u64> = (0..8).collect();
        // Earlier tasks sleep longer, so they finish last.
        let out = pool.run_all(&tasks, |&i| {
            std::thread::sleep(Duration::from_millis((8 - i) * 5));
            Ok(i as f64 * 10.0)
        });
        assert!(out.is_ok());
        assert_eq!(out.responses, vec![0.0, 10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
    }

    #[test]
    fn failures_do_not_stop_siblings() {
        let pool = TaskPool::new(Some(2)).unwrap();
        let ran = AtomicUsize::new(0);
        let tasks: Vec<usize> = (0..6).collect();
        let out = pool.run_all(&tasks, |&i| {
            ran.fetch_add(1, Ordering::SeqCst);
            if i == 1 || i == 4 {
                Err(AppError::scoring(format!("bad point {i}")))
            } else {
                Ok(i as f64)
            }
        });
        assert_eq!(ran.load(Ordering::SeqCst), 6);
        assert_eq!(out.failures.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(out.responses[5], 5.0);
        assert!(out.responses[1].is_nan());
        assert_eq!(out.into_result().unwrap_err().message(), "bad point 1");
    }

    #[test]
    fn panics_become_scoring_failures() {
        let pool = TaskPool::new(Some(2)).unwrap();
        let out = pool.run_all(&[0usize, 1], |&i| {
            if i == 1 {
                panic!("model exploded");
            }
            Ok(1.0)
        });
        let (idx, err) = &out.failures[0];
        assert_eq!(*idx, 1);
        assert_eq!(err.kind(), ErrorKind::ScoringFailure);
        assert!(err.message().contains("model exploded"));
    }

    #[test]
    fn concurrency_is_bounded_by_worker_count() {
        let pool = TaskPool::new(Some(2)).unwrap();
        assert_eq!(pool.workers(), 2);
        let in_flight = AtomicUsize::new(0);
        let peak = AtomicUsize::new(0);
        let tasks: Vec<usize> = (0..10).collect();
        pool.run_all(&tasks, |_| {
            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(5));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(0.0)
        });
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn zero_workers_is_invalid() {
        assert!(TaskPool::new(Some(0)).is_err());
    }
}
