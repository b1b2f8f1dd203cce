//! Parallel execution of independent scheduling runs.
//!
//! Every run owns its scheduler state, so runs share nothing but the (copied) configuration. A
//! fixed pool of named worker threads pulls `(index, scenario)` jobs from one channel and pushes
//! `(index, result)` back on another; results are re-assembled in submission order.

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::report::{evaluate, Evaluation};
use crate::scenario::Scenario;
use crossbeam_channel::unbounded;
use std::thread;
use tracing::debug;

/// Evaluate every scenario on up to `workers` threads.
///
/// # Returns
/// One result per scenario, in the order the scenarios were given. A configuration error in one
/// scenario does not affect the others.
///
/// # Errors
/// Fails as a whole only if a worker thread cannot be spawned or panics.
pub fn run_batch(
    scenarios: Vec<Scenario>,
    config: &SchedulerConfig,
    workers: usize,
) -> Result<Vec<Result<Evaluation>>> {
    let total = scenarios.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, total);

    let (job_tx, job_rx) = unbounded::<(usize, Scenario)>();
    let (result_tx, result_rx) = unbounded::<(usize, Result<Evaluation>)>();
    for job in scenarios.into_iter().enumerate() {
        // The receiver is alive, so sending cannot fail.
        let _ = job_tx.send(job);
    }
    // Workers stop once the queue is drained.
    drop(job_tx);

    let mut handles = Vec::with_capacity(workers);
    for worker in 0..workers {
        let jobs = job_rx.clone();
        let results = result_tx.clone();
        let config = *config;
        let handle = thread::Builder::new()
            .name(format!("slice-sched-{worker}"))
            .spawn(move || {
                for (index, scenario) in jobs.iter() {
                    debug!(worker, index, "evaluating scenario");
                    if results.send((index, evaluate(&scenario, &config))).is_err() {
                        break;
                    }
                }
            })?;
        handles.push(handle);
    }
    drop(result_tx);

    for (worker, handle) in handles.into_iter().enumerate() {
        handle.join().map_err(|_| Error::WorkerPanicked(worker))?;
    }

    let mut ordered: Vec<Option<Result<Evaluation>>> = (0..total).map(|_| None).collect();
    for (index, result) in result_rx.iter() {
        ordered[index] = Some(result);
    }
    Ok(ordered.into_iter().flatten().collect())
}
