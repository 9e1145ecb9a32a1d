//! A mutable `NodeId -> BlockId`-shaped vector used as feedback between
//! coarsening and initial partitioning.
//!
//! Both the sequential and parallel `compactify` paths must agree bit for
//! bit (P4); the parallel path follows the classic presence-bitmap +
//! prefix-sum + write-back shape, the same three-pass structure
//! `coupe::algorithms::multi_jagged` uses to turn a permutation into
//! contiguous sub-slices (sort, then a single parallel scan, then a
//! parallel write-back).

use rayon::prelude::*;

/// A block-ID sequence, one entry per node, not required to be dense.
pub struct Clustering {
    cluster: Vec<usize>,
}

impl Clustering {
    pub fn new(n: usize) -> Self {
        Self { cluster: vec![0; n] }
    }

    pub fn from_vec(cluster: Vec<usize>) -> Self {
        Self { cluster }
    }

    pub fn len(&self) -> usize {
        self.cluster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cluster.is_empty()
    }

    pub fn get(&self, i: usize) -> usize {
        self.cluster[i]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.cluster
    }

    /// Sets `cluster[i] = i` for every `i`, in parallel: the starting point
    /// before any coarsening contractions have been recorded.
    pub fn assign_singleton(&mut self) {
        self.cluster
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, c)| *c = i);
    }

    /// Relabels every cluster id to the dense range `[0, m)`, preserving the
    /// relative order in which ids first appear. Returns `m`, the number of
    /// distinct ids found.
    ///
    /// `upper_bound` must be `>=` every value currently present in the
    /// clustering.
    pub fn compactify_sequential(&mut self, upper_bound: usize) -> usize {
        let mut seen = vec![false; upper_bound + 1];
        for &c in &self.cluster {
            seen[c] = true;
        }
        let mut relabel = vec![0usize; upper_bound + 1];
        let mut next = 0usize;
        for (old, &present) in seen.iter().enumerate() {
            if present {
                relabel[old] = next;
                next += 1;
            }
        }
        for c in self.cluster.iter_mut() {
            *c = relabel[*c];
        }
        next
    }

    /// The parallel counterpart of [`Self::compactify_sequential`]: a
    /// presence bitmap of size `upper_bound + 1`, a parallel prefix sum over
    /// it, then a parallel write-back. Must produce identical output to the
    /// sequential path on every input (P4).
    pub fn compactify_parallel(&mut self, upper_bound: usize) -> usize {
        let mut present = vec![false; upper_bound + 1];
        for &c in &self.cluster {
            present[c] = true;
        }

        // Parallel prefix sum over the presence bitmap: relabel[i] is the
        // number of present ids strictly before i.
        let counts: Vec<usize> = present.par_iter().map(|&p| p as usize).collect();
        let mut relabel = vec![0usize; upper_bound + 1];
        let chunk_len = (counts.len() / rayon::current_num_threads().max(1)).max(1);
        let chunk_sums: Vec<usize> = counts
            .par_chunks(chunk_len)
            .map(|chunk| chunk.iter().sum())
            .collect();
        let mut chunk_offsets = vec![0usize; chunk_sums.len()];
        let mut running = 0usize;
        for (i, &s) in chunk_sums.iter().enumerate() {
            chunk_offsets[i] = running;
            running += s;
        }
        relabel
            .par_chunks_mut(chunk_len)
            .zip(counts.par_chunks(chunk_len))
            .zip(chunk_offsets.par_iter())
            .for_each(|((relabel_chunk, counts_chunk), &offset)| {
                let mut running = offset;
                for (r, &c) in relabel_chunk.iter_mut().zip(counts_chunk) {
                    *r = running;
                    running += c;
                }
            });

        let total = running;
        self.cluster.par_iter_mut().for_each(|c| {
            *c = relabel[*c];
        });
        total
    }
}
