//! Splits per-index work over `[0, size)` across the rayon thread pool.

use std::ops::Range;

use rayon::prelude::*;
use tracing::trace;

/// Default threshold for exponentiation-class work.
pub const EXP_THREAD_THRESHOLD: usize = 100;
/// Default threshold for multiplication-class work.
pub const MUL_THREAD_THRESHOLD: usize = 1000;

/// Partitions an index range into contiguous chunks, one per thread.
///
/// With a positive `threshold` and `size <= threshold` the work runs as a
/// single chunk on the calling thread. Otherwise the range is split into
/// `min(threads, size)` chunks of `size / chunks` indices, the last chunk
/// taking the remainder.
#[derive(Debug, Clone, Copy)]
pub struct ArrayWorker {
    size: usize,
    threshold: usize,
}

impl ArrayWorker {
    pub fn new(size: usize, threshold: usize) -> Self {
        ArrayWorker { size, threshold }
    }

    pub fn is_parallel(&self) -> bool {
        self.size > 0 && !(self.threshold > 0 && self.size <= self.threshold)
    }

    pub fn chunks(&self) -> Vec<Range<usize>> {
        if !self.is_parallel() {
            return vec![0..self.size];
        }
        let cores = rayon::current_num_threads().min(self.size).max(1);
        let per_core = self.size / cores;
        (0..cores)
            .map(|i| {
                let start = i * per_core;
                let end = if i + 1 == cores { self.size } else { start + per_core };
                start..end
            })
            .collect()
    }

    /// Runs `work` on every chunk and returns the results in chunk order.
    pub fn run<T, F>(&self, work: F) -> Vec<T>
    where
        T: Send,
        F: Fn(Range<usize>) -> T + Sync + Send,
    {
        let chunks = self.chunks();
        if chunks.len() == 1 {
            return chunks.into_iter().map(work).collect();
        }
        trace!(size = self.size, chunks = chunks.len(), threshold = self.threshold, "dispatching worker");
        chunks.into_par_iter().map(work).collect()
    }

    /// Like [`ArrayWorker::run`], but every chunk may fail.
    ///
    /// All chunks run to completion. If any failed, the error of the first
    /// failing chunk is returned and all partial results are discarded.
    pub fn try_run<T, E, F>(&self, work: F) -> Result<Vec<T>, E>
    where
        T: Send,
        E: Send,
        F: Fn(Range<usize>) -> Result<T, E> + Sync + Send,
    {
        self.run(work).into_iter().collect()
    }

    /// Maps every index and concatenates the per-chunk outputs.
    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        self.run(|range| range.map(&f).collect::<Vec<_>>())
            .into_iter()
            .flatten()
            .collect()
    }

    /// Maps every index with a fallible function. See [`ArrayWorker::try_run`].
    pub fn try_map<T, E, F>(&self, f: F) -> Result<Vec<T>, E>
    where
        T: Send,
        E: Send,
        F: Fn(usize) -> Result<T, E> + Sync + Send,
    {
        let parts = self.try_run(|range| range.map(&f).collect::<Result<Vec<_>, E>>())?;
        Ok(parts.into_iter().flatten().collect())
    }
}

/// Ceiling of the binary logarithm; `log2c(0) == log2c(1) == 0`.
pub fn log2c(value: usize) -> usize {
    if value <= 1 {
        0
    } else {
        (usize::BITS - (value - 1).leading_zeros()) as usize
    }
}
