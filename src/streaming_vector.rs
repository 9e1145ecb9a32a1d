//! A per-worker append-only buffer for phases that produce large lists
//! without knowing the final size up front (coarsening contraction lists,
//! move logs).
//!
//! `spec.md` §4.4 describes per-CPU buffers indexed by `sched_getcpu`; this
//! crate substitutes `rayon`'s own worker index
//! (`rayon::current_thread_index`), which is stable for the lifetime of a
//! rayon task the same way `sched_getcpu` is assumed stable for the
//! lifetime of a single `stream` call (§4.4's only safety requirement). Per
//! `spec.md` §9's design note, "any bounded multi-producer log that
//! preserves per-producer order" is an acceptable substitute, so each
//! worker's buffer is guarded by an uncontended `Mutex` rather than raw
//! per-CPU pointers — only the worker that owns an index ever locks it.

use rayon::prelude::*;
use std::sync::Mutex;

/// A per-worker append-only buffer. `copy_parallel`/`copy_sequential`
/// collapse it into one contiguous `Vec<T>`.
pub struct StreamingVector<T> {
    buffers: Vec<Mutex<Vec<T>>>,
}

impl<T: Send> StreamingVector<T> {
    /// Allocates one buffer per current rayon worker thread.
    pub fn new() -> Self {
        let workers = rayon::current_num_threads().max(1);
        Self {
            buffers: (0..workers).map(|_| Mutex::new(Vec::new())).collect(),
        }
    }

    fn local_index() -> usize {
        rayon::current_thread_index().unwrap_or(0)
    }

    /// Appends `value` to the buffer of the calling worker.
    pub fn stream(&self, value: T) {
        let idx = Self::local_index() % self.buffers.len();
        self.buffers[idx].lock().unwrap().push(value);
    }

    pub fn clear_sequential(&mut self) {
        for buf in &mut self.buffers {
            buf.get_mut().unwrap().clear();
        }
    }

    pub fn clear_parallel(&mut self) {
        self.buffers.par_iter_mut().for_each(|buf| {
            buf.get_mut().unwrap().clear();
        });
    }

    fn sizes(&self) -> Vec<usize> {
        self.buffers.iter().map(|b| b.lock().unwrap().len()).collect()
    }
}

impl<T: Send + Clone> StreamingVector<T> {
    /// Produces one contiguous sequence with a single thread: a local
    /// prefix sum over buffer sizes followed by a sequential copy.
    pub fn copy_sequential(&self) -> Vec<T> {
        let total: usize = self.sizes().iter().sum();
        let mut out = Vec::with_capacity(total);
        for buf in &self.buffers {
            out.extend(buf.lock().unwrap().iter().cloned());
        }
        out
    }

    /// The parallel counterpart: the same prefix sum, then a parallel
    /// `memcpy`-equivalent into disjoint slices of a single allocation, the
    /// same `split_at_mut`-based fan-out `coupe`'s multi-jagged splitter
    /// uses to hand out disjoint sub-slices to parallel workers.
    pub fn copy_parallel(&self) -> Vec<T>
    where
        T: Default,
    {
        let sizes = self.sizes();
        let total: usize = sizes.iter().sum();
        let mut out = vec![T::default(); total];

        let mut offsets = Vec::with_capacity(sizes.len());
        let mut running = 0usize;
        for &s in &sizes {
            offsets.push(running);
            running += s;
        }

        let mut remaining: &mut [T] = &mut out;
        let mut slices = Vec::with_capacity(sizes.len());
        for &s in &sizes {
            let (head, tail) = remaining.split_at_mut(s);
            slices.push(head);
            remaining = tail;
        }

        slices
            .into_par_iter()
            .zip(self.buffers.par_iter())
            .for_each(|(slot, buf)| {
                let buf = buf.lock().unwrap();
                slot.clone_from_slice(&buf);
            });

        out
    }
}

impl<T: Send> Default for StreamingVector<T> {
    fn default() -> Self {
        Self::new()
    }
}
