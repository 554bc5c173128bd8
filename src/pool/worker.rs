//! Bounded-concurrency job runner.
//!
//! A [`WorkerPool`] owns a fixed set of worker threads. [`WorkerPool::run`] starts one loop per
//! worker over a shared job stream; every loop pulls a [`Job`], waits for a start slot from the
//! pool's shared [`RateLimit`], runs it and emits a [`JobResult`]. Results arrive in completion
//! order. The result stream disconnects only after every worker has exited, which makes
//! disconnection the single "no more results" signal.
//!
//! Once the [`CancelToken`] fires, workers stop taking new work. Jobs already buffered in the
//! stream are answered with a cancellation result each, so a closed job stream always yields one
//! result per job.
//!
//! Every run gets its own worker threads. Overlapping runs on one pool, or on clones of it, share
//! only the rate limiter.

use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::Arc,
};

use crossbeam_channel::{Receiver, Sender, select, unbounded};

use crate::{
    foundation::error::{RigError, RigResult},
    pool::{
        cancel::CancelToken,
        limiter::{RateLimit, RateLimiter},
    },
};

type JobFn<T> = Box<dyn FnOnce(&CancelToken) -> RigResult<T> + Send + 'static>;

/// A unit of work identified by `id`.
pub struct Job<T> {
    pub id: u64,
    exec: JobFn<T>,
}

impl<T> Job<T> {
    /// Wrap `exec`. The closure receives the pool's cancellation token and may poll it.
    pub fn new(
        id: u64,
        exec: impl FnOnce(&CancelToken) -> RigResult<T> + Send + 'static,
    ) -> Self {
        Self {
            id,
            exec: Box::new(exec),
        }
    }
}

impl<T> std::fmt::Debug for Job<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish_non_exhaustive()
    }
}

/// Outcome of one [`Job`].
#[derive(Debug)]
pub struct JobResult<T> {
    pub id: u64,
    pub outcome: RigResult<T>,
}

/// Fixed-size worker pool with an optional global start rate.
#[derive(Clone, Debug)]
pub struct WorkerPool {
    name: String,
    workers: usize,
    limiter: Arc<RateLimiter>,
}

impl WorkerPool {
    pub fn new(workers: usize, limit: RateLimit) -> RigResult<Self> {
        Self::named("pool", workers, limit)
    }

    /// Pool whose threads and log events carry `name`.
    pub fn named(name: impl Into<String>, workers: usize, limit: RateLimit) -> RigResult<Self> {
        let name = name.into();
        if workers == 0 {
            return Err(RigError::validation(format!(
                "pool '{name}' needs at least one worker"
            )));
        }
        let limiter = RateLimiter::new(limit)?;
        Ok(Self {
            name,
            workers,
            limiter: Arc::new(limiter),
        })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Start the workers over `jobs`. The run ends when `jobs` disconnects and is drained, or
    /// when `cancel` fires.
    ///
    /// The run owns `workers` fresh threads, so a job may itself start a run on the same pool.
    ///
    /// After cancellation a producer should stop sending. A job sent after the last worker's
    /// final sweep but before that worker exits is accepted by the channel and never answered;
    /// once the result stream has ended every `send` fails.
    pub fn run<T: Send + 'static>(
        &self,
        cancel: &CancelToken,
        jobs: Receiver<Job<T>>,
    ) -> RigResult<PoolRun<T>> {
        let thread_prefix = self.name.clone();
        let threads = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(move |i| format!("{thread_prefix}-{i}"))
            .build()
            .map_err(|e| RigError::resource(format!("failed to build worker threads: {e}")))?;

        let (results_tx, results_rx) = unbounded();
        for worker in 0..self.workers {
            let ctx = WorkerCtx {
                pool: self.name.clone(),
                worker,
                jobs: jobs.clone(),
                results: results_tx.clone(),
                cancel: cancel.clone(),
                limiter: Arc::clone(&self.limiter),
            };
            threads.spawn(move || ctx.run());
        }
        tracing::debug!(pool = %self.name, workers = self.workers, "pool started");

        Ok(PoolRun {
            results: results_rx,
            _threads: threads,
        })
    }

    /// Run a fixed batch of jobs and collect every result.
    pub fn run_all<T: Send + 'static>(
        &self,
        cancel: &CancelToken,
        jobs: Vec<Job<T>>,
    ) -> RigResult<Vec<JobResult<T>>> {
        let expected = jobs.len();
        let (tx, rx) = unbounded();
        for job in jobs {
            // The receiver is alive in this scope, so sending cannot fail.
            let _ = tx.send(job);
        }
        drop(tx);

        let results: Vec<JobResult<T>> = self.run(cancel, rx)?.collect();
        tracing::debug!(
            pool = %self.name,
            expected,
            received = results.len(),
            "pool drained"
        );
        Ok(results)
    }
}

/// Handle to a running pool. Iterates results until every worker has exited.
pub struct PoolRun<T> {
    results: Receiver<JobResult<T>>,
    // Dropping the pool lets its threads exit once their loops return.
    _threads: rayon::ThreadPool,
}

impl<T> PoolRun<T> {
    /// The raw result stream, for callers that want to `select!` on it.
    pub fn results(&self) -> &Receiver<JobResult<T>> {
        &self.results
    }
}

impl<T> Iterator for PoolRun<T> {
    type Item = JobResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.results.recv().ok()
    }
}

struct WorkerCtx<T> {
    pool: String,
    worker: usize,
    jobs: Receiver<Job<T>>,
    results: Sender<JobResult<T>>,
    cancel: CancelToken,
    limiter: Arc<RateLimiter>,
}

impl<T> WorkerCtx<T> {
    fn run(self) {
        tracing::trace!(pool = %self.pool, worker = self.worker, "worker started");
        loop {
            let job = select! {
                recv(self.cancel.done()) -> _ => break,
                recv(self.jobs) -> msg => match msg {
                    Ok(job) => job,
                    Err(_) => {
                        tracing::trace!(pool = %self.pool, worker = self.worker, "job stream closed");
                        return;
                    }
                },
            };

            let id = job.id;
            let outcome = self.execute(job);
            if let Err(e) = &outcome
                && !e.is_cancelled()
            {
                tracing::warn!(pool = %self.pool, job = id, error = %e, "job failed");
            }
            if self.results.send(JobResult { id, outcome }).is_err() {
                tracing::debug!(pool = %self.pool, worker = self.worker, "result stream dropped");
                return;
            }
        }

        self.drain_cancelled();
    }

    #[tracing::instrument(level = "trace", skip_all, fields(pool = %self.pool, job = job.id))]
    fn execute(&self, job: Job<T>) -> RigResult<T> {
        self.cancel.check(&format!("job {} not started", job.id))?;
        self.limiter.acquire(&self.cancel)?;

        let cancel = &self.cancel;
        let exec = job.exec;
        catch_unwind(AssertUnwindSafe(|| exec(cancel))).unwrap_or_else(|_| {
            Err(RigError::resource(format!("job {} panicked", job.id)))
        })
    }

    /// Answer every job already waiting in the stream with a cancellation result.
    fn drain_cancelled(&self) {
        let mut drained = 0usize;
        while let Ok(job) = self.jobs.try_recv() {
            let outcome = Err(RigError::cancelled(format!("job {} not started", job.id)));
            if self.results.send(JobResult { id: job.id, outcome }).is_err() {
                break;
            }
            drained += 1;
        }
        tracing::debug!(
            pool = %self.pool,
            worker = self.worker,
            drained,
            "worker stopped on cancellation"
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/worker.rs"]
mod tests;
