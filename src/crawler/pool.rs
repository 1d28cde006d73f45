//! Fixed-size pool of scoped worker threads

use crate::HarvestError;
use std::thread;
use tracing::Span;

/// Runs `work` on `workers` threads and waits for all of them
///
/// Each worker receives its index and runs inside a `worker` span parented
/// to `parent`. Workers borrow from the caller's stack, so shared queues and
/// sinks need no reference counting.
///
/// # Returns
///
/// * `Ok(Vec<R>)` - One result per worker, in worker order
/// * `Err(HarvestError)` - The first worker error, or `WorkerPanicked`
pub fn run_pool<R, W>(
    pool: &'static str,
    workers: usize,
    parent: &Span,
    work: W,
) -> Result<Vec<R>, HarvestError>
where
    W: Fn(usize) -> Result<R, HarvestError> + Sync,
    R: Send,
{
    let work = &work;
    let outcomes = thread::scope(|scope| -> Result<Vec<_>, HarvestError> {
        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let span = tracing::info_span!(parent: parent, "worker", pool, worker = index);
            let handle = thread::Builder::new()
                .name(format!("{}-{}", pool, index))
                .spawn_scoped(scope, move || {
                    let _entered = span.enter();
                    work(index)
                })?;
            handles.push(handle);
        }

        Ok(handles
            .into_iter()
            .enumerate()
            .map(|(index, handle)| {
                handle.join().unwrap_or_else(|_| {
                    tracing::error!("Worker {} of the {} pool panicked", index, pool);
                    Err(HarvestError::WorkerPanicked {
                        pool,
                        worker: index,
                    })
                })
            })
            .collect())
    })?;

    outcomes.into_iter().collect()
}
