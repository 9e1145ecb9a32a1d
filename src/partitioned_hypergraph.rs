//! The mutable partitioning state shared by every concurrent mover.
//!
//! Every derived array (`part`, `part_weight`, `part_size`, `pin_count`) is a
//! boxed slice of atomics, one cell per node/block/edge-block pair, grounded
//! in `vigna-webgraph-rs`'s `LabelStore` (`algo/src/llp/label_store.rs`):
//! that structure keeps one atomic volume per label so concurrent label
//! updates never need a lock. Here every field is already atomic (no `Cell`
//! is needed, unlike `LabelStore`'s non-atomic label array), so
//! `PartitionedHypergraph` is `Send + Sync` without an `unsafe impl`.

use crate::hypergraph::{HyperedgeId, Hypergraph, NodeId};
use crate::Weight;
use rayon::prelude::*;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

/// A block identifier in `[0, k)`.
pub type BlockId = u32;

/// The sentinel denoting "unassigned", used only before
/// [`PartitionedHypergraph::initialize_partition`] has been called.
pub const INVALID_BLOCK: BlockId = u32::MAX;

/// Wraps a [`Hypergraph`] with the mutable node→block assignment and its
/// three derived statistics.
///
/// A fresh instance has every node unassigned; the caller fills `part` via
/// [`Self::set_only_node_part`] and commits with a single
/// [`Self::initialize_partition`] call; after that, [`Self::change_node_part`]
/// is the only mutator and is safe to call concurrently from many threads.
/// At every point after commit, every node belongs to exactly one block, and
/// `part_weight`/`part_size`/`pin_count` stay consistent with `part`.
pub struct PartitionedHypergraph<'hg> {
    hg: &'hg Hypergraph,
    k: u32,
    part: Box<[AtomicU32]>,
    part_weight: Box<[AtomicI64]>,
    part_size: Box<[AtomicU32]>,
    /// Flat, edge-major: `pin_count[e * k + b]`.
    pin_count: Box<[AtomicU32]>,
}

impl<'hg> PartitionedHypergraph<'hg> {
    /// `O(n + m*k)` initialization: `part[v] = INVALID`, every derived
    /// counter zeroed.
    pub fn new(hg: &'hg Hypergraph, k: u32) -> Self {
        let n = hg.num_nodes();
        let m = hg.num_hyperedges();
        let part = (0..n).map(|_| AtomicU32::new(INVALID_BLOCK)).collect();
        let part_weight = (0..k).map(|_| AtomicI64::new(0)).collect();
        let part_size = (0..k).map(|_| AtomicU32::new(0)).collect();
        let pin_count = (0..m * k as usize).map(|_| AtomicU32::new(0)).collect();
        Self {
            hg,
            k,
            part,
            part_weight,
            part_size,
            pin_count,
        }
    }

    pub fn hypergraph(&self) -> &Hypergraph {
        self.hg
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn num_nodes(&self) -> usize {
        self.hg.num_nodes()
    }

    /// Unchecked initial assignment. Precondition: `part[v]` is still
    /// `INVALID`. Does not touch derived state; callers must call
    /// [`Self::initialize_partition`] exactly once after filling every node.
    ///
    /// Calling this twice on the same node is a contract violation, not a
    /// recoverable error: it would silently corrupt `part_weight`/`part_size`
    /// once committed, so it is checked unconditionally rather than only in
    /// debug builds.
    pub fn set_only_node_part(&self, v: NodeId, block: BlockId) {
        let previous = self.part[v].swap(block, Ordering::Relaxed);
        assert_eq!(
            previous, INVALID_BLOCK,
            "set_only_node_part called twice on node {v}"
        );
    }

    /// Recomputes `part_weight`, `part_size` and `pin_count` from scratch,
    /// in parallel, from the current `part` array. Idempotent as long as
    /// `part` is unchanged (R2).
    pub fn initialize_partition(&self) {
        tracing::debug!(nodes = self.num_nodes(), k = self.k, "initialize_partition");

        for w in self.part_weight.iter() {
            w.store(0, Ordering::Relaxed);
        }
        for s in self.part_size.iter() {
            s.store(0, Ordering::Relaxed);
        }
        for c in self.pin_count.iter() {
            c.store(0, Ordering::Relaxed);
        }

        (0..self.num_nodes()).into_par_iter().for_each(|v| {
            let b = self.part[v].load(Ordering::Relaxed);
            assert_ne!(b, INVALID_BLOCK, "node {v} was never assigned a part");
            self.part_weight[b as usize].fetch_add(self.hg.node_weight(v), Ordering::Relaxed);
            self.part_size[b as usize].fetch_add(1, Ordering::Relaxed);
        });

        (0..self.hg.num_hyperedges()).into_par_iter().for_each(|e| {
            for &v in self.hg.pins(e) {
                let b = self.part[v].load(Ordering::Relaxed);
                self.pin_count[e * self.k as usize + b as usize].fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    pub fn part_id(&self, v: NodeId) -> BlockId {
        self.part[v].load(Ordering::Relaxed)
    }

    pub fn part_weight(&self, block: BlockId) -> Weight {
        self.part_weight[block as usize].load(Ordering::Relaxed)
    }

    pub fn part_size(&self, block: BlockId) -> u32 {
        self.part_size[block as usize].load(Ordering::Relaxed)
    }

    pub fn pin_count_in_part(&self, e: HyperedgeId, block: BlockId) -> u32 {
        self.pin_count[e * self.k as usize + block as usize].load(Ordering::Relaxed)
    }

    /// Applies `f` to every node under a data-parallel scheduler.
    pub fn do_parallel_for_all_nodes<F>(&self, f: F)
    where
        F: Fn(NodeId) + Sync,
    {
        (0..self.num_nodes()).into_par_iter().for_each(f);
    }

    /// An atomic, linearizable move of `v` from block `from` to block `to`.
    ///
    /// 1. CAS `part[v]` from `from` to `to`; on failure (lost race) returns
    ///    `false` with no side effect.
    /// 2. On success, publishes the weight/size deltas and, for every
    ///    incident edge, the pin-count deltas, each as an independent atomic
    ///    add/sub. The whole move is not a single critical section: for a
    ///    fixed edge, the sequence of `pin_count` updates from all successful
    ///    moves touching it is equivalent to some serial interleaving — not
    ///    a global lock, but still a consistent end state once every
    ///    concurrent mover has returned.
    pub fn change_node_part(&self, v: NodeId, from: BlockId, to: BlockId) -> bool {
        if self.part[v]
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let w = self.hg.node_weight(v);
        self.part_weight[from as usize].fetch_sub(w, Ordering::Relaxed);
        self.part_weight[to as usize].fetch_add(w, Ordering::Relaxed);
        self.part_size[from as usize].fetch_sub(1, Ordering::Relaxed);
        self.part_size[to as usize].fetch_add(1, Ordering::Relaxed);

        for &e in self.hg.incident(v) {
            self.pin_count[e * self.k as usize + from as usize].fetch_sub(1, Ordering::Relaxed);
            self.pin_count[e * self.k as usize + to as usize].fetch_add(1, Ordering::Relaxed);
        }

        true
    }

    /// Builds the sub-hypergraph of `block` (see [`Hypergraph::extract`])
    /// from a consistent snapshot of the current `part` array.
    pub fn extract(
        &self,
        block: BlockId,
        cut_net_splitting: bool,
        stable: bool,
    ) -> (Hypergraph, Vec<Option<NodeId>>) {
        tracing::trace!(block, cut_net_splitting, "extract");
        let snapshot: Vec<BlockId> = self
            .part
            .iter()
            .map(|p| p.load(Ordering::Relaxed))
            .collect();
        self.hg.extract(&snapshot, block, cut_net_splitting, stable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hypergraph::Hyperedge;
    use proptest::prelude::*;
    use std::thread;

    fn s1_hypergraph() -> Hypergraph {
        Hypergraph::new(
            vec![1; 7],
            vec![
                Hyperedge { weight: 1, pins: vec![0, 2] },
                Hyperedge { weight: 1, pins: vec![0, 1, 3, 4] },
                Hyperedge { weight: 1, pins: vec![3, 4, 6] },
                Hyperedge { weight: 1, pins: vec![2, 5, 6] },
            ],
        )
    }

    fn s1_partitioned(hg: &Hypergraph) -> PartitionedHypergraph<'_> {
        let phg = PartitionedHypergraph::new(hg, 3);
        let assignment = [0u32, 0, 0, 1, 1, 2, 2];
        for (v, &b) in assignment.iter().enumerate() {
            phg.set_only_node_part(v, b);
        }
        phg.initialize_partition();
        phg
    }

    #[test]
    fn s1_derived_state_matches_spec() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        assert_eq!(phg.part_weight(0), 3);
        assert_eq!(phg.part_weight(1), 2);
        assert_eq!(phg.part_weight(2), 2);

        assert_eq!(phg.part_size(0), 3);
        assert_eq!(phg.part_size(1), 2);
        assert_eq!(phg.part_size(2), 2);

        // edge 1 = {0,1,3,4}: 2 pins in block 0 (0,1), 2 pins in block 1 (3,4)
        assert_eq!(phg.pin_count_in_part(1, 0), 2);
        assert_eq!(phg.pin_count_in_part(1, 1), 2);
        assert_eq!(phg.pin_count_in_part(1, 2), 0);
    }

    #[test]
    fn p1_and_p2_hold_after_initialize() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        let total_weight: Weight = (0..phg.k()).map(|b| phg.part_weight(b)).sum();
        assert_eq!(total_weight, hg.total_weight());
        let total_size: u32 = (0..phg.k()).map(|b| phg.part_size(b)).sum();
        assert_eq!(total_size as usize, hg.num_nodes());

        for e in 0..hg.num_hyperedges() {
            for b in 0..phg.k() {
                let expected = hg
                    .pins(e)
                    .iter()
                    .filter(|&&v| phg.part_id(v) == b)
                    .count() as u32;
                assert_eq!(phg.pin_count_in_part(e, b), expected);
            }
        }
    }

    #[test]
    fn r1_move_and_revert_restores_state() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        let before_weight: Vec<Weight> = (0..phg.k()).map(|b| phg.part_weight(b)).collect();
        let before_pins: Vec<u32> = (0..hg.num_hyperedges())
            .flat_map(|e| (0..phg.k()).map(move |b| (e, b)))
            .map(|(e, b)| phg.pin_count_in_part(e, b))
            .collect();

        assert!(phg.change_node_part(0, 0, 1));
        assert!(phg.change_node_part(0, 1, 0));

        let after_weight: Vec<Weight> = (0..phg.k()).map(|b| phg.part_weight(b)).collect();
        let after_pins: Vec<u32> = (0..hg.num_hyperedges())
            .flat_map(|e| (0..phg.k()).map(move |b| (e, b)))
            .map(|(e, b)| phg.pin_count_in_part(e, b))
            .collect();

        assert_eq!(before_weight, after_weight);
        assert_eq!(before_pins, after_pins);
    }

    #[test]
    fn s2_concurrent_moves_on_distinct_nodes_both_succeed() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        thread::scope(|scope| {
            let t1 = scope.spawn(|| phg.change_node_part(3, 1, 2));
            let t2 = scope.spawn(|| phg.change_node_part(6, 2, 0));
            assert!(t1.join().unwrap());
            assert!(t2.join().unwrap());
        });

        // edge 2 = {3,4,6}
        assert_eq!(phg.pin_count_in_part(2, 0), 1);
        assert_eq!(phg.pin_count_in_part(2, 1), 1);
        assert_eq!(phg.pin_count_in_part(2, 2), 1);
    }

    #[test]
    fn s3_concurrent_moves_on_same_node_exactly_one_wins() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        let (r1, r2) = thread::scope(|scope| {
            let t1 = scope.spawn(|| phg.change_node_part(0, 0, 1));
            let t2 = scope.spawn(|| phg.change_node_part(0, 0, 2));
            (t1.join().unwrap(), t2.join().unwrap())
        });

        assert_ne!(r1, r2, "exactly one of the two racing moves must succeed");

        let total_weight: Weight = (0..phg.k()).map(|b| phg.part_weight(b)).sum();
        assert_eq!(total_weight, 7);

        let winner_block = if r1 { 1 } else { 2 };
        assert_eq!(phg.part_id(0), winner_block);
    }

    #[test]
    fn r4_concurrent_moves_on_distinct_nodes_preserve_invariants() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);

        let moves = [(3u32, 1u32, 2u32), (5, 2, 1), (1, 0, 2)];
        thread::scope(|scope| {
            for &(v, from, to) in &moves {
                scope.spawn(move || assert!(phg.change_node_part(v as usize, from, to)));
            }
        });

        let total_weight: Weight = (0..phg.k()).map(|b| phg.part_weight(b)).sum();
        assert_eq!(total_weight, hg.total_weight());
        for e in 0..hg.num_hyperedges() {
            for b in 0..phg.k() {
                let expected = hg
                    .pins(e)
                    .iter()
                    .filter(|&&v| phg.part_id(v) == b)
                    .count() as u32;
                assert_eq!(phg.pin_count_in_part(e, b), expected);
            }
        }
    }

    #[test]
    fn changing_to_the_same_from_that_has_already_moved_fails() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);
        assert!(phg.change_node_part(0, 0, 1));
        // node 0 is no longer in block 0, so a second "from 0" move must lose
        assert!(!phg.change_node_part(0, 0, 2));
    }

    #[test]
    #[should_panic(expected = "called twice")]
    fn set_only_node_part_twice_is_a_contract_violation() {
        let hg = s1_hypergraph();
        let phg = PartitionedHypergraph::new(&hg, 2);
        phg.set_only_node_part(0, 0);
        phg.set_only_node_part(0, 1);
    }

    #[test]
    fn r2_initialize_partition_is_idempotent() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);
        let before: Vec<Weight> = (0..phg.k()).map(|b| phg.part_weight(b)).collect();
        phg.initialize_partition();
        let after: Vec<Weight> = (0..phg.k()).map(|b| phg.part_weight(b)).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn extract_cut_net_splitting_matches_hypergraph_extract() {
        let hg = s1_hypergraph();
        let phg = s1_partitioned(&hg);
        let (sub, mapping) = phg.extract(1, true, true);
        assert_eq!(sub.num_nodes(), 2);
        assert!(mapping[3].is_some());
        assert!(mapping[0].is_none());
    }

    /// A random hypergraph of 2..20 nodes, 0..8 hyperedges with 2..4 raw
    /// pins each (deduplicated and dropped if that leaves fewer than 2),
    /// paired with a random initial assignment into 1..5 blocks.
    fn arb_partitioned_instance() -> impl Strategy<Value = (Hypergraph, Vec<BlockId>, u32)> {
        (2usize..20, 1u32..5).prop_flat_map(|(n, k)| {
            let node_weights = prop::collection::vec(1i64..10, n);
            let raw_edges = prop::collection::vec(
                (1i64..5, prop::collection::vec(0usize..n, 2..=4)),
                0..8,
            );
            let assignment = prop::collection::vec(0..k, n);
            (node_weights, raw_edges, assignment, Just(k))
        })
        .prop_map(|(node_weights, raw_edges, assignment, k)| {
            let edges = raw_edges
                .into_iter()
                .filter_map(|(weight, mut pins)| {
                    pins.sort_unstable();
                    pins.dedup();
                    if pins.len() >= 2 {
                        Some(Hyperedge { weight, pins })
                    } else {
                        None
                    }
                })
                .collect();
            (Hypergraph::new(node_weights, edges), assignment, k)
        })
    }

    proptest! {
        /// P1/P2: for any hypergraph and any initial assignment,
        /// `initialize_partition` derives `part_weight`/`part_size`/
        /// `pin_count` that exactly match a from-scratch recomputation off
        /// `part`, not just the fixed `s1_hypergraph` fixture used above.
        #[test]
        fn p1_and_p2_hold_for_random_hypergraphs_and_partitions(
            (hg, assignment, k) in arb_partitioned_instance()
        ) {
            let phg = PartitionedHypergraph::new(&hg, k);
            for (v, &b) in assignment.iter().enumerate() {
                phg.set_only_node_part(v, b);
            }
            phg.initialize_partition();

            let total_weight: Weight = (0..k).map(|b| phg.part_weight(b)).sum();
            prop_assert_eq!(total_weight, hg.total_weight());
            let total_size: u32 = (0..k).map(|b| phg.part_size(b)).sum();
            prop_assert_eq!(total_size as usize, hg.num_nodes());

            for e in 0..hg.num_hyperedges() {
                for b in 0..k {
                    let expected = hg
                        .pins(e)
                        .iter()
                        .filter(|&&v| phg.part_id(v) == b)
                        .count() as u32;
                    prop_assert_eq!(phg.pin_count_in_part(e, b), expected);
                }
            }
        }
    }
}
