//! Worker pool and scheduling
//!
//! One partition per worker, all dispatched up front, then a single join.
//! Each worker runs inside `catch_unwind`, so a panicking partition turns
//! into a `PartitionFailure` for that partition only. Workers share
//! nothing mutable except the cancel flag.

use crate::partition::{default_worker_count, Partition};
use ivmsmooth_core::{Error, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::ops::Range;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// How many workers to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    /// One worker on the calling thread
    Sequential,
    /// Available cores minus one
    #[default]
    Parallel,
    /// Exactly this many workers
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Number of workers, and so of partitions, this mode asks for
    pub fn worker_count(&self) -> usize {
        match self {
            ProcessingMode::Sequential => 1,
            ProcessingMode::Parallel => default_worker_count(),
            ProcessingMode::ParallelWith(n) => (*n).max(1),
        }
    }
}

/// Strategy for parallel execution
pub trait ParallelStrategy {
    /// Map a function over indices and collect results in index order
    fn par_map<T, F>(&self, range: Range<usize>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    fn par_map<T, F>(&self, range: Range<usize>, f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => Ok(range.map(f).collect()),
            ProcessingMode::Parallel => Ok(range.into_par_iter().map(f).collect()),
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads((*threads).max(1))
                    .thread_name(|i| format!("ivmsmooth-worker-{}", i))
                    .build()
                    .map_err(|e| Error::Other(format!("failed to build thread pool: {}", e)))?;
                Ok(pool.install(|| range.into_par_iter().map(f).collect()))
            }
        }
    }
}

/// Get the number of available CPU cores
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}

/// Shared cancellation flag.
///
/// Cancelling stops workers at their next feature and makes the pool
/// discard every partial result.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What one worker produced for its partition
#[derive(Debug)]
pub struct PartitionRun<T> {
    pub index: usize,
    pub range: Range<usize>,
    /// `Err` holds a `PartitionFailure`
    pub outcome: Result<T>,
}

/// Runs one job per partition and joins them
#[derive(Debug, Clone, Default)]
pub struct WorkerPool {
    mode: ProcessingMode,
    cancel: CancelToken,
}

impl WorkerPool {
    pub fn new(mode: ProcessingMode) -> Self {
        Self {
            mode,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run `work` over every partition, one worker each, and wait for all.
    ///
    /// Results come back in partition order whatever order the workers
    /// finished in. Empty partitions, errors and panics are reported per
    /// partition and never stop the siblings. If the token is cancelled at
    /// any point the whole run returns [`Error::Cancelled`].
    pub fn run<T, F>(&self, partitions: Vec<Partition>, work: F) -> Result<Vec<PartitionRun<T>>>
    where
        T: Send,
        F: Fn(&Partition, &CancelToken) -> Result<T> + Sync + Send,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let strategy = match self.mode {
            ProcessingMode::Sequential => ProcessingMode::Sequential,
            _ => ProcessingMode::ParallelWith(partitions.len()),
        };
        debug!(partitions = partitions.len(), ?strategy, "dispatching partitions");

        let runs = strategy.par_map(0..partitions.len(), |i| {
            let partition = &partitions[i];
            PartitionRun {
                index: partition.index,
                range: partition.range.clone(),
                outcome: self.run_one(partition, &work),
            }
        })?;

        // Barrier passed: every worker is done
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(runs)
    }

    fn run_one<T, F>(&self, partition: &Partition, work: &F) -> Result<T>
    where
        F: Fn(&Partition, &CancelToken) -> Result<T>,
    {
        let failure = |reason: String| {
            warn!(partition = partition.index, %reason, "partition failed");
            Error::PartitionFailure {
                partition: partition.index,
                reason,
            }
        };

        if partition.is_empty() {
            return Err(failure("partition is empty".to_string()));
        }

        match catch_unwind(AssertUnwindSafe(|| work(partition, &self.cancel))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(Error::Cancelled)) => Err(Error::Cancelled),
            Ok(Err(e)) => Err(failure(e.to_string())),
            Err(payload) => Err(failure(format!("worker panicked: {}", panic_message(&*payload)))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
