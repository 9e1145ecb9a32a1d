//! The external `multilevel::partition` collaborator.
//!
//! `spec.md` §9 states the only contract the recursive-bipartitioning driver
//! relies on: given a [`Hypergraph`] and a bisection [`Context`] (`k = 2`),
//! the collaborator returns a [`PartitionedHypergraph`] where every node is
//! assigned and the balance constraint is honored "to the best effort of the
//! bisector". Coarsening, initial partitioning and refinement — the actual
//! content of that collaborator — are out of scope for this crate; it is
//! named here only as a trait so the driver can be built and tested against
//! a stand-in.

use crate::context::Context;
use crate::hypergraph::Hypergraph;
use crate::partitioned_hypergraph::PartitionedHypergraph;

/// A 2-way bisection primitive. The driver calls this once per recursion
/// level with `ctx.k == 2`.
pub trait Bisector: Sync {
    fn partition<'hg>(&self, hg: &'hg Hypergraph, ctx: &Context) -> PartitionedHypergraph<'hg>;
}

/// A contract-checking stand-in bisector for this crate's own tests: visits
/// nodes from heaviest to lightest and greedily assigns each to whichever
/// block is furthest below its share of `ctx.perfect_balance_part_weights`
/// (or an even 1:1 share if the context carries no targets). Keeps both
/// blocks within the requested balance as long as no single node's weight
/// exceeds the imbalance allowance; does not attempt to minimize any cut.
///
/// `spec.md` §4.2's P3 explicitly calls for testing the driver "by stubbing"
/// the bisector; this is that stub.
pub struct GreedyBalancedStub;

impl Bisector for GreedyBalancedStub {
    fn partition<'hg>(&self, hg: &'hg Hypergraph, ctx: &Context) -> PartitionedHypergraph<'hg> {
        assert_eq!(ctx.k, 2, "GreedyBalancedStub only bisects");

        let targets = if ctx.perfect_balance_part_weights.len() == 2 {
            [
                ctx.perfect_balance_part_weights[0].max(1) as f64,
                ctx.perfect_balance_part_weights[1].max(1) as f64,
            ]
        } else {
            [1.0, 1.0]
        };

        let mut order: Vec<usize> = (0..hg.num_nodes()).collect();
        order.sort_by_key(|&v| std::cmp::Reverse(hg.node_weight(v)));

        let phg = PartitionedHypergraph::new(hg, 2);
        let mut weight = [0i64, 0i64];
        for v in order {
            let share0 = weight[0] as f64 / targets[0];
            let share1 = weight[1] as f64 / targets[1];
            let target = if share0 <= share1 { 0 } else { 1 };
            phg.set_only_node_part(v, target as u32);
            weight[target] += hg.node_weight(v);
        }
        phg.initialize_partition();
        phg
    }
}
