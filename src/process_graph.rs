//! The Steiner-tree oracle used to score the `process_mapping` objective.
//!
//! `ProcessGraph` stores a small weighted graph on `k` nodes (the target
//! communication topology), precomputes all-pairs shortest paths at
//! construction time, and optionally precomputes exact Steiner-tree weights
//! for small connectivity sets via the Dreyfus–Wagner dynamic program.
//! Larger connectivity sets fall back to a minimum spanning tree of the
//! metric completion, the classical 2-approximation.

use crate::Weight;
use itertools::iproduct;
use rayon::prelude::*;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

const INF: Weight = Weight::MAX / 4;

/// A connectivity set is encoded as a bitmask over the `k` nodes of the
/// process graph. `spec.md` §9 leaves the exact encoding unspecified ("any
/// bijection from sorted connectivity sets... to dense integer keys works");
/// the bitmask is a simpler bijection than the mixed-radix key `spec.md`
/// §4.3 sketches and needs no extra bookkeeping for "trailing" slots.
type ConnectivitySetKey = u64;

fn encode(connectivity_set: &[usize]) -> ConnectivitySetKey {
    connectivity_set.iter().fold(0u64, |mask, &b| mask | (1 << b))
}

/// The target communication topology for the `process_mapping` objective.
pub struct ProcessGraph {
    k: usize,
    /// Row-major `k*k` all-pairs shortest path matrix.
    apsp: Vec<Weight>,
    steiner_cache: HashMap<ConnectivitySetKey, Weight>,
    max_precomputed_connectivity: usize,
}

thread_local! {
    static MST_HEAP: RefCell<BinaryHeap<Reverse<(Weight, usize)>>> =
        RefCell::new(BinaryHeap::new());
}

impl ProcessGraph {
    /// Builds `G_P` from a weighted edge list on `num_blocks` nodes and
    /// computes all-pairs shortest paths via a data-parallel
    /// Floyd–Warshall: each of the `k` relaxation rounds updates all rows in
    /// parallel, reading only the round's pivot row.
    pub fn new(num_blocks: usize, edges: &[(usize, usize, Weight)]) -> Self {
        let k = num_blocks;
        let mut apsp = vec![INF; k * k];
        for i in 0..k {
            apsp[i * k + i] = 0;
        }
        for &(u, v, w) in edges {
            let cell = &mut apsp[u * k + v];
            if w < *cell {
                *cell = w;
            }
            let cell = &mut apsp[v * k + u];
            if w < *cell {
                *cell = w;
            }
        }

        for pivot in 0..k {
            let pivot_row: Vec<Weight> = apsp[pivot * k..pivot * k + k].to_vec();
            apsp.par_chunks_mut(k).enumerate().for_each(|(i, row)| {
                let via_pivot = row[pivot];
                if via_pivot >= INF {
                    return;
                }
                for j in 0..k {
                    let candidate = via_pivot + pivot_row[j];
                    if candidate < row[j] {
                        row[j] = candidate;
                    }
                }
            });
        }

        Self {
            k,
            apsp,
            steiner_cache: HashMap::new(),
            max_precomputed_connectivity: 1,
        }
    }

    pub fn num_blocks(&self) -> usize {
        self.k
    }

    /// Shortest-path distance between two blocks.
    pub fn distance(&self, i: usize, j: usize) -> Weight {
        self.apsp[i * self.k + j]
    }

    /// Enumerates every connectivity set `C` with `2 <= |C| <= max_connectivity`
    /// and stores its optimal Steiner-tree weight, via Dreyfus–Wagner, as
    /// long as the running entry count stays within `max_entries` (default
    /// `1e8` per `spec.md` §5). Stops precomputing further connectivity
    /// sizes (not the whole table) once the budget would be exceeded;
    /// subsequent queries for the skipped sizes fall through to the
    /// 2-approximation path.
    pub fn precompute_distances(&mut self, max_connectivity: usize, max_entries: usize) {
        if self.k == 0 {
            return;
        }
        // dp[mask][v]: minimum weight of a tree connecting every block in
        // `mask` together with `v`. Built up by popcount of `mask`.
        let mut dp: HashMap<ConnectivitySetKey, Vec<Weight>> = HashMap::new();
        for t in 0..self.k {
            let mask = 1u64 << t;
            dp.insert(mask, (0..self.k).map(|v| self.distance(t, v)).collect());
        }

        let mut size = 2usize;
        while size <= max_connectivity {
            let masks_of_size: Vec<u64> = (0u64..(1u64 << self.k))
                .filter(|m| m.count_ones() as usize == size)
                .collect();
            if masks_of_size.is_empty() {
                break;
            }
            if self.steiner_cache.len() + masks_of_size.len() > max_entries {
                break;
            }

            for &mask in &masks_of_size {
                let mut row = vec![INF; self.k];
                // Merge: split mask into two non-empty disjoint submasks.
                let mut sub = (mask - 1) & mask;
                while sub != 0 {
                    let complement = mask & !sub;
                    if let (Some(left), Some(right)) = (dp.get(&sub), dp.get(&complement)) {
                        for v in 0..self.k {
                            let candidate = left[v] + right[v];
                            if candidate < row[v] {
                                row[v] = candidate;
                            }
                        }
                    }
                    sub = (sub - 1) & mask;
                }
                // Relax against the full APSP matrix: dp[mask][v] can also
                // route through any intermediate node u.
                let base = row.clone();
                for (u, v) in iproduct!(0..self.k, 0..self.k) {
                    let candidate = base[u] + self.distance(u, v);
                    if candidate < row[v] {
                        row[v] = candidate;
                    }
                }

                let best = *row.iter().min().unwrap_or(&INF);
                self.steiner_cache.insert(mask, best);
                dp.insert(mask, row);
            }

            self.max_precomputed_connectivity = size;
            size += 1;
        }
    }

    /// The Steiner-tree weight of connectivity set `C` on `G_P`.
    ///
    /// `|C| == 1` is always `0`; `|C| == 2` is the exact shortest-path
    /// distance. For larger `C` within the precomputed range this is the
    /// exact optimum (P5); otherwise it is the weight of a minimum spanning
    /// tree of the metric completion restricted to `C`, a 2-approximation.
    pub fn distance_of(&self, connectivity_set: &[usize]) -> Weight {
        match connectivity_set.len() {
            0 => 0,
            1 => 0,
            2 => self.distance(connectivity_set[0], connectivity_set[1]),
            n if n <= self.max_precomputed_connectivity => {
                let key = encode(connectivity_set);
                match self.steiner_cache.get(&key) {
                    Some(&w) => w,
                    None => self.mst_approximation(connectivity_set),
                }
            }
            _ => self.mst_approximation(connectivity_set),
        }
    }

    /// Prim's algorithm on the metric completion of `G_P` restricted to
    /// `connectivity_set`, using a thread-local heap so repeated calls from
    /// the objective evaluator (one per hyperedge, potentially many in
    /// parallel) do not allocate a fresh priority queue each time.
    fn mst_approximation(&self, connectivity_set: &[usize]) -> Weight {
        if connectivity_set.len() <= 1 {
            return 0;
        }
        MST_HEAP.with(|heap_cell| {
            let mut heap = heap_cell.borrow_mut();
            heap.clear();

            let mut in_tree = vec![false; connectivity_set.len()];
            let mut total = 0;
            in_tree[0] = true;
            let mut remaining = connectivity_set.len() - 1;
            for (idx, &other) in connectivity_set.iter().enumerate().skip(1) {
                let w = self.distance(connectivity_set[0], other);
                heap.push(Reverse((w, idx)));
            }

            while remaining > 0 {
                let Reverse((w, idx)) = match heap.pop() {
                    Some(entry) => entry,
                    None => break,
                };
                if in_tree[idx] {
                    continue;
                }
                in_tree[idx] = true;
                total += w;
                remaining -= 1;
                for (other_idx, &other) in connectivity_set.iter().enumerate() {
                    if !in_tree[other_idx] {
                        let w = self.distance(connectivity_set[idx], other);
                        heap.push(Reverse((w, other_idx)));
                    }
                }
            }

            total
        })
    }
}
